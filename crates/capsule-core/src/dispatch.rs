use std::{fmt, sync::Arc};

use capsule_model::{ResponseOutcome, ScheduleRequest};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::{
    bridge::{BridgeClient, HostBridge},
    error::CoreError,
    registry::{TaskRegistration, TaskRegistry},
};

/// Where task calls run. Chosen once, before the first call, and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Call the task body directly in this process.
    Local,
    /// Route every call through the host bridge.
    Sandboxed,
}

impl ExecutionMode {
    /// `Sandboxed` when a host entry point is available, `Local` otherwise.
    pub fn probe(host: Option<&dyn HostBridge>) -> Self {
        match host {
            Some(_) => ExecutionMode::Sandboxed,
            None => ExecutionMode::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Local => "local",
            ExecutionMode::Sandboxed => "sandboxed",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value produced by one task call.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// A JSON value: the body's return value, or the `result` of an envelope.
    Value(Value),
    /// The host answered with something that is not a JSON envelope, kept verbatim.
    /// Covers text that is not JSON and JSON that is not an object (`42`, `"hi"`).
    Raw(String),
}

impl TaskOutput {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            TaskOutput::Value(v) => Some(v),
            TaskOutput::Raw(_) => None,
        }
    }

    /// Collapse into a JSON value; raw text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            TaskOutput::Value(v) => v,
            TaskOutput::Raw(s) => Value::String(s),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, TaskOutput::Raw(_))
    }
}

enum Route {
    Local,
    Sandboxed(BridgeClient),
}

/// Per-call decision point: run the body here or send it through the bridge.
pub struct Dispatcher {
    registry: Arc<TaskRegistry>,
    route: Route,
}

impl Dispatcher {
    pub fn local(registry: Arc<TaskRegistry>) -> Self {
        Self {
            registry,
            route: Route::Local,
        }
    }

    pub fn sandboxed(registry: Arc<TaskRegistry>, host: Arc<dyn HostBridge>) -> Self {
        Self {
            registry,
            route: Route::Sandboxed(BridgeClient::new(host)),
        }
    }

    /// Pick the mode from whether a host entry point was found.
    pub fn probe(registry: Arc<TaskRegistry>, host: Option<Arc<dyn HostBridge>>) -> Self {
        let dispatcher = match host {
            Some(host) => Self::sandboxed(registry, host),
            None => Self::local(registry),
        };
        debug!(target: "capsule.core.dispatch", mode = %dispatcher.mode(), "execution mode resolved");
        dispatcher
    }

    pub fn mode(&self) -> ExecutionMode {
        match self.route {
            Route::Local => ExecutionMode::Local,
            Route::Sandboxed(_) => ExecutionMode::Sandboxed,
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    #[instrument(level = "debug", skip(self, args), fields(mode = %self.mode(), argc = args.len()))]
    pub fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<TaskOutput, CoreError> {
        let task = self.registry.lookup(name)?;
        match &self.route {
            Route::Local => task.call_local(args).map(TaskOutput::Value),
            Route::Sandboxed(bridge) => Self::dispatch_remote(bridge, task, args),
        }
    }

    fn dispatch_remote(
        bridge: &BridgeClient,
        task: &TaskRegistration,
        args: Vec<Value>,
    ) -> Result<TaskOutput, CoreError> {
        let request = ScheduleRequest::new(task.config(), args);
        let raw = bridge.call(&request).map_err(|e| CoreError::Host {
            name: task.name().to_string(),
            cause: e.to_string(),
        })?;

        match ResponseOutcome::parse(&raw) {
            ResponseOutcome::Result(value) => Ok(TaskOutput::Value(value)),
            ResponseOutcome::Error(message) => {
                debug!(target: "capsule.core.dispatch", task = task.name(), %message, "task reported failure");
                Err(CoreError::Task {
                    name: task.name().to_string(),
                    message,
                })
            }
            ResponseOutcome::Raw(text) => {
                trace!(target: "capsule.core.dispatch", task = task.name(), "host returned non-envelope text");
                Ok(TaskOutput::Raw(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::HostCallError;
    use capsule_model::TaskOptions;
    use serde_json::json;
    use std::convert::Infallible;

    struct FixedHost(&'static str);

    impl HostBridge for FixedHost {
        fn schedule_task(&self, _: &str, _: &str, _: &str) -> Result<String, HostCallError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenHost;

    impl HostBridge for BrokenHost {
        fn schedule_task(&self, _: &str, _: &str, _: &str) -> Result<String, HostCallError> {
            Err("disk full".into())
        }
    }

    fn registry() -> Arc<TaskRegistry> {
        let mut reg = TaskRegistry::new();
        reg.register(
            TaskOptions::new("add").normalize().unwrap(),
            |a: i64, b: i64| Ok::<_, Infallible>(a + b),
        );
        Arc::new(reg)
    }

    fn sandboxed(reply: &'static str) -> Dispatcher {
        Dispatcher::sandboxed(registry(), Arc::new(FixedHost(reply)))
    }

    #[test]
    fn probe_without_host_is_local() {
        assert_eq!(ExecutionMode::probe(None), ExecutionMode::Local);
        let d = Dispatcher::probe(registry(), None);
        assert_eq!(d.mode(), ExecutionMode::Local);
    }

    #[test]
    fn probe_with_host_is_sandboxed() {
        assert_eq!(ExecutionMode::probe(Some(&BrokenHost)), ExecutionMode::Sandboxed);
        let d = Dispatcher::probe(registry(), Some(Arc::new(BrokenHost)));
        assert_eq!(d.mode(), ExecutionMode::Sandboxed);
    }

    #[test]
    fn local_mode_runs_body() {
        let d = Dispatcher::local(registry());
        let out = d.dispatch("add", vec![json!(5), json!(3)]).unwrap();
        assert_eq!(out, TaskOutput::Value(json!(8)));
    }

    #[test]
    fn unknown_task_is_not_found() {
        let d = Dispatcher::local(registry());
        assert!(matches!(
            d.dispatch("nope", vec![]),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn result_envelope_is_unwrapped() {
        let out = sandboxed(r#"{"result": {"x": 1}}"#)
            .dispatch("add", vec![json!(1), json!(2)])
            .unwrap();
        assert_eq!(out, TaskOutput::Value(json!({"x": 1})));
    }

    #[test]
    fn error_envelope_fails_with_task_name() {
        let err = sandboxed(r#"{"error": "bad input"}"#)
            .dispatch("add", vec![])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad input"));
        assert!(msg.contains("add"));
        assert!(matches!(err, CoreError::Task { .. }));
    }

    #[test]
    fn missing_result_key_is_null() {
        let out = sandboxed(r#"{}"#).dispatch("add", vec![]).unwrap();
        assert_eq!(out, TaskOutput::Value(Value::Null));
    }

    #[test]
    fn non_json_reply_is_returned_raw() {
        let out = sandboxed("hello from host").dispatch("add", vec![]).unwrap();
        assert_eq!(out, TaskOutput::Raw("hello from host".into()));
        assert_eq!(out.into_value(), json!("hello from host"));
    }

    #[test]
    fn non_object_json_is_returned_raw() {
        let out = sandboxed("42").dispatch("add", vec![]).unwrap();
        assert_eq!(out, TaskOutput::Raw("42".into()));

        let out = sandboxed(r#""hi""#).dispatch("add", vec![]).unwrap();
        assert_eq!(out, TaskOutput::Raw(r#""hi""#.into()));
    }

    #[test]
    fn host_failure_is_a_transport_error() {
        let d = Dispatcher::sandboxed(registry(), Arc::new(BrokenHost));
        let err = d.dispatch("add", vec![]).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "task add failed: Host call failed: disk full");
    }
}
