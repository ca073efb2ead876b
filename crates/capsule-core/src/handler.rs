//! Adapts plain Rust functions into task bodies that take positional JSON arguments.
//!
//! Any `Fn(A1, .., An) -> Result<R, E>` with up to four parameters qualifies,
//! provided every `Ai` can be decoded from JSON, `R` can be encoded to JSON
//! and `E` converts into [`BoxError`].
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::BoxError;

/// Failure of a locally executed task body.
#[derive(Debug)]
pub enum HandlerError {
    /// Arguments did not match the function signature.
    Args(String),
    /// The body itself returned an error.
    Failed(BoxError),
}

/// A function that can be registered as a task.
///
/// `Args` is a marker (the parameter tuple) that keeps the per-arity
/// implementations apart; callers never name it.
pub trait Handler<Args>: Send + Sync + 'static {
    /// Number of positional arguments the body expects.
    fn arity(&self) -> usize;

    fn call(&self, args: Vec<Value>) -> Result<Value, HandlerError>;
}

/// Type-erased task body stored in the registry.
pub(crate) type TaskFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, HandlerError> + Send + Sync>;

pub(crate) fn erase<H, Args>(handler: H) -> TaskFn
where
    H: Handler<Args>,
    Args: 'static,
{
    Arc::new(move |args| handler.call(args))
}

fn decode<T: DeserializeOwned>(index: usize, value: Option<Value>) -> Result<T, HandlerError> {
    serde_json::from_value(value.unwrap_or(Value::Null))
        .map_err(|e| HandlerError::Args(format!("argument {index}: {e}")))
}

fn encode<R: Serialize>(out: R) -> Result<Value, HandlerError> {
    serde_json::to_value(out).map_err(|e| HandlerError::Failed(Box::new(e)))
}

macro_rules! impl_handler {
    ($n:expr; $($idx:tt $ty:ident),*) => {
        impl<F, R, E, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: Serialize,
            E: Into<BoxError>,
            $($ty: DeserializeOwned,)*
        {
            fn arity(&self) -> usize {
                $n
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, args: Vec<Value>) -> Result<Value, HandlerError> {
                if args.len() != $n {
                    return Err(HandlerError::Args(format!(
                        "expected {} argument(s), got {}",
                        $n,
                        args.len()
                    )));
                }
                let mut args = args.into_iter();
                $(
                    let $ty: $ty = decode($idx, args.next())?;
                )*
                let out = (self)($($ty),*).map_err(|e| HandlerError::Failed(e.into()))?;
                encode(out)
            }
        }
    };
}

impl_handler!(0;);
impl_handler!(1; 0 A1);
impl_handler!(2; 0 A1, 1 A2);
impl_handler!(3; 0 A1, 1 A2, 2 A3);
impl_handler!(4; 0 A1, 1 A2, 2 A3, 3 A4);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    fn run<H: Handler<Args>, Args>(h: H, args: Vec<Value>) -> Result<Value, HandlerError> {
        h.call(args)
    }

    #[test]
    fn two_argument_function() {
        let add = |a: i64, b: i64| Ok::<_, Infallible>(a + b);
        assert_eq!(Handler::<(i64, i64)>::arity(&add), 2);
        assert_eq!(run(add, vec![json!(5), json!(3)]).unwrap(), json!(8));
    }

    #[test]
    fn zero_argument_function() {
        let hello = || Ok::<_, Infallible>("hello");
        assert_eq!(run(hello, vec![]).unwrap(), json!("hello"));
    }

    #[test]
    fn wrong_arity_is_reported() {
        let add = |a: i64, b: i64| Ok::<_, Infallible>(a + b);
        let err = run(add, vec![json!(1)]).unwrap_err();
        assert!(matches!(err, HandlerError::Args(msg) if msg.contains("expected 2")));
    }

    #[test]
    fn undecodable_argument_is_reported() {
        let double = |x: i64| Ok::<_, Infallible>(x * 2);
        let err = run(double, vec![json!("nope")]).unwrap_err();
        assert!(matches!(err, HandlerError::Args(msg) if msg.starts_with("argument 0")));
    }

    #[test]
    fn body_error_is_kept() {
        let fail = |_: String| Err::<(), _>(std::io::Error::other("disk full"));
        let err = run(fail, vec![json!("x")]).unwrap_err();
        match err {
            HandlerError::Failed(e) => assert_eq!(e.to_string(), "disk full"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
