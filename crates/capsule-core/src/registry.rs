use std::{collections::HashMap, fmt, sync::Arc};

use capsule_model::TaskConfig;
use serde_json::Value;
use tracing::{trace, warn};

use crate::{
    error::CoreError,
    handler::{Handler, HandlerError, TaskFn, erase},
};

/// A task body together with its normalized configuration.
pub struct TaskRegistration {
    config: TaskConfig,
    arity: usize,
    func: TaskFn,
}

impl TaskRegistration {
    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Run the body in-process with positional JSON arguments.
    pub fn call_local(&self, args: Vec<Value>) -> Result<Value, CoreError> {
        (self.func)(args).map_err(|e| match e {
            HandlerError::Args(reason) => CoreError::Args {
                name: self.name().to_string(),
                reason,
            },
            HandlerError::Failed(err) => CoreError::Handler(err),
        })
    }
}

impl fmt::Debug for TaskRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistration")
            .field("config", &self.config)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name → task mapping filled during the load phase.
///
/// Registration needs `&mut self`; once loading is over the registry is
/// frozen behind an `Arc` and only read. Re-registering a name replaces the
/// entry (last write wins) but keeps its original position in [`TaskRegistry::names`].
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<TaskRegistration>>,
    order: Vec<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the task registered under `config.name()`.
    ///
    /// Returns the registration that was replaced, if any.
    pub fn register<H, Args>(
        &mut self,
        config: TaskConfig,
        handler: H,
    ) -> Option<Arc<TaskRegistration>>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let name = config.name().to_string();
        let registration = Arc::new(TaskRegistration {
            arity: handler.arity(),
            func: erase(handler),
            config,
        });

        let previous = self.tasks.insert(name.clone(), registration);
        match &previous {
            Some(_) => {
                warn!(target: "capsule.core.registry", task = %name, "task re-registered; previous definition replaced")
            }
            None => {
                trace!(target: "capsule.core.registry", task = %name, "task registered");
                self.order.push(name);
            }
        }
        previous
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<TaskRegistration>, CoreError> {
        self.tasks
            .get(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TaskRegistration>> {
        self.tasks.get(name)
    }

    pub fn config(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.get(name).map(|r| r.config())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The task registered first, if any.
    pub fn first(&self) -> Option<&Arc<TaskRegistration>> {
        self.order.first().and_then(|name| self.tasks.get(name))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_model::{Compute, TaskOptions};
    use serde_json::json;
    use std::convert::Infallible;

    fn cfg(opts: TaskOptions) -> TaskConfig {
        opts.normalize().unwrap()
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = TaskRegistry::new();
        reg.register(
            cfg(TaskOptions::new("double").compute("low")),
            |x: i64| Ok::<_, Infallible>(x * 2),
        );

        let task = reg.lookup("double").unwrap();
        assert_eq!(task.name(), "double");
        assert_eq!(task.arity(), 1);
        assert_eq!(task.config().compute(), &Compute::Low);
        assert_eq!(task.call_local(vec![json!(21)]).unwrap(), json!(42));
    }

    #[test]
    fn lookup_of_unknown_name_fails() {
        let reg = TaskRegistry::new();
        let err = reg.lookup("missing").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = TaskRegistry::new();
        let first = reg.register(cfg(TaskOptions::new("t").compute("low")), || {
            Ok::<_, Infallible>(1)
        });
        assert!(first.is_none());

        let replaced = reg.register(cfg(TaskOptions::new("t").compute("high")), || {
            Ok::<_, Infallible>(2)
        });
        assert!(replaced.is_some());

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.config("t").unwrap().compute(), &Compute::High);
        assert_eq!(reg.lookup("t").unwrap().call_local(vec![]).unwrap(), json!(2));
    }

    #[test]
    fn names_keep_first_registration_order() {
        let mut reg = TaskRegistry::new();
        reg.register(cfg(TaskOptions::new("b")), || Ok::<_, Infallible>(()));
        reg.register(cfg(TaskOptions::new("a")), || Ok::<_, Infallible>(()));
        reg.register(cfg(TaskOptions::new("b")), || Ok::<_, Infallible>(()));

        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(reg.first().unwrap().name(), "b");
    }

    #[test]
    fn argument_mismatch_is_tagged_with_task_name() {
        let mut reg = TaskRegistry::new();
        reg.register(cfg(TaskOptions::new("add")), |a: i64, b: i64| {
            Ok::<_, Infallible>(a + b)
        });

        let err = reg.lookup("add").unwrap().call_local(vec![]).unwrap_err();
        assert_eq!(err.task_name(), Some("add"));
        assert!(matches!(err, CoreError::Args { .. }));
    }
}
