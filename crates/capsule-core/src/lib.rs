pub mod error;
pub use error::{BoxError, CoreError};

pub mod handler;
pub use handler::Handler;

pub mod registry;
pub use registry::{TaskRegistration, TaskRegistry};

pub mod bridge;
pub use bridge::{BridgeClient, HostBridge, HostCallError};

pub mod dispatch;
pub use dispatch::{Dispatcher, ExecutionMode, TaskOutput};

pub mod app;
pub use app::{App, AppBuilder, TaskHandle};

pub mod entry;
pub use entry::EntryPoint;

mod loopback;
pub use loopback::LoopbackHost;

pub use capsule_model as model;
pub use serde_json;

/// Build a positional argument list from JSON-compatible expressions.
///
/// ```
/// let args = capsule_core::args!(5, "x", [1, 2]);
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::serde_json::json!($arg)),*]
    };
}

pub mod prelude {
    pub use crate::args;
    pub use crate::{App, AppBuilder, CoreError, ExecutionMode, HostBridge, TaskHandle, TaskOutput};
    pub use capsule_model::{Compute, TaskConfig, TaskOptions};
}
