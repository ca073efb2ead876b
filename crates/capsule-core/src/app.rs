use std::sync::Arc;

use capsule_model::{TaskConfig, TaskOptions};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::{
    bridge::HostBridge,
    dispatch::{Dispatcher, ExecutionMode, TaskOutput},
    entry::EntryPoint,
    error::CoreError,
    handler::Handler,
    registry::TaskRegistry,
};

/// Load-phase builder: collects task definitions before any call is made.
#[derive(Debug, Default)]
pub struct AppBuilder {
    registry: TaskRegistry,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `options` and register `handler` under its name.
    pub fn task<H, Args>(mut self, options: TaskOptions, handler: H) -> Result<Self, CoreError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.register(options, handler)?;
        Ok(self)
    }

    pub fn register<H, Args>(
        &mut self,
        options: TaskOptions,
        handler: H,
    ) -> Result<&TaskConfig, CoreError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let config = options.normalize()?;
        let name = config.name().to_string();
        self.registry.register(config, handler);
        self.registry
            .config(&name)
            .ok_or(CoreError::NotFound(name))
    }

    /// Freeze the registry and run every call in-process.
    pub fn build_local(self) -> App {
        self.finish(Dispatcher::local)
    }

    /// Freeze the registry and route every call through `host`.
    pub fn build_sandboxed(self, host: Arc<dyn HostBridge>) -> App {
        self.finish(|registry| Dispatcher::sandboxed(registry, host))
    }

    /// Freeze the registry; the mode follows from whether a host is present.
    pub fn build(self, host: Option<Arc<dyn HostBridge>>) -> App {
        self.finish(|registry| Dispatcher::probe(registry, host))
    }

    fn finish(self, make: impl FnOnce(Arc<TaskRegistry>) -> Dispatcher) -> App {
        let dispatcher = make(Arc::new(self.registry));
        info!(
            target: "capsule.core.app",
            mode = %dispatcher.mode(),
            tasks = dispatcher.registry().len(),
            "task registry loaded"
        );
        App { dispatcher }
    }
}

/// A loaded set of tasks bound to one execution mode.
pub struct App {
    dispatcher: Dispatcher,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.dispatcher.mode()
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Callable handle for a registered task.
    pub fn task(&self, name: &str) -> Result<TaskHandle<'_>, CoreError> {
        let config = self.registry().lookup(name)?.config();
        Ok(TaskHandle {
            dispatcher: &self.dispatcher,
            config,
        })
    }

    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<TaskOutput, CoreError> {
        self.dispatcher.dispatch(name, args)
    }

    /// Host-facing entry point over the same registry.
    pub fn entry_point(&self) -> EntryPoint {
        EntryPoint::new(Arc::clone(self.registry()))
    }
}

/// Stand-in for the decorated function: same arguments, same result.
#[derive(Clone, Copy)]
pub struct TaskHandle<'a> {
    dispatcher: &'a Dispatcher,
    config: &'a TaskConfig,
}

impl<'a> TaskHandle<'a> {
    pub fn name(&self) -> &'a str {
        self.config.name()
    }

    pub fn config(&self) -> &'a TaskConfig {
        self.config
    }

    pub fn call(&self, args: Vec<Value>) -> Result<TaskOutput, CoreError> {
        self.dispatcher.dispatch(self.name(), args)
    }

    /// Call and decode the output into `R`.
    pub fn invoke<R: DeserializeOwned>(&self, args: Vec<Value>) -> Result<R, CoreError> {
        let value = self.call(args)?.into_value();
        serde_json::from_value(value).map_err(|e| CoreError::Decode {
            name: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use std::{convert::Infallible, fmt};

    #[derive(Debug, PartialEq)]
    struct Overflow;

    impl fmt::Display for Overflow {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("overflow")
        }
    }

    impl std::error::Error for Overflow {}

    fn app() -> App {
        App::builder()
            .task(TaskOptions::new("add_task").compute("LOW"), |a: i64, b: i64| {
                Ok::<_, Infallible>(a + b)
            })
            .unwrap()
            .task(TaskOptions::new("checked"), |a: u8, b: u8| {
                a.checked_add(b).ok_or(Overflow)
            })
            .unwrap()
            .build_local()
    }

    #[test]
    fn local_call_matches_plain_function() {
        let app = app();
        assert_eq!(app.mode(), ExecutionMode::Local);

        let add = app.task("add_task").unwrap();
        assert_eq!(add.invoke::<i64>(args![5, 3]).unwrap(), 8);
    }

    #[test]
    fn local_error_propagates_unchanged() {
        let app = app();
        let err = app.task("checked").unwrap().call(args![200, 100]).unwrap_err();

        match err {
            CoreError::Handler(e) => assert_eq!(e.downcast_ref::<Overflow>(), Some(&Overflow)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn handle_for_unknown_task_fails() {
        assert!(matches!(app().task("ghost"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn empty_name_is_a_config_error() {
        let err = App::builder()
            .task(TaskOptions::new(""), || Ok::<_, Infallible>(()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn decode_mismatch_is_reported() {
        let app = app();
        let err = app
            .task("add_task")
            .unwrap()
            .invoke::<String>(args![1, 2])
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }
}
