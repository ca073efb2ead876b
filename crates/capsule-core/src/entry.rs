use std::sync::Arc;

use capsule_model::{Envelope, MAIN_TASK};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::registry::{TaskRegistration, TaskRegistry};

/// Payload the host passes when it starts a task instance.
#[derive(Debug, Default, Deserialize)]
struct EntryArgs {
    #[serde(default)]
    task_name: Option<String>,
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default)]
    kwargs: Map<String, Value>,
}

/// Callee side of the host protocol: what runs inside a fresh task instance.
///
/// The host calls [`EntryPoint::run`] with `{"task_name", "args", "kwargs"}`.
/// The requested task is resolved as follows:
/// 1. the task named `task_name` (default `main`);
/// 2. otherwise the task named `main`;
/// 3. otherwise the first task that was registered.
///
/// Calls are positional; keyword arguments are accepted and ignored.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    registry: Arc<TaskRegistry>,
}

impl EntryPoint {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, requested: &str) -> Option<&Arc<TaskRegistration>> {
        self.registry
            .get(requested)
            .or_else(|| self.registry.get(MAIN_TASK))
            .or_else(|| self.registry.first())
    }

    /// Run one task and return its `{"result": ..}` envelope, or the failure message.
    #[instrument(level = "debug", skip_all)]
    pub fn run(&self, args_json: &str) -> Result<String, String> {
        let input: EntryArgs =
            serde_json::from_str(args_json).map_err(|e| format!("invalid task arguments: {e}"))?;
        let requested = input.task_name.as_deref().unwrap_or(MAIN_TASK);

        let task = self.resolve(requested).ok_or_else(|| {
            let available: Vec<_> = self.registry.names().collect();
            format!(
                "no task '{requested}' and no main task found; available tasks: [{}]",
                available.join(", ")
            )
        })?;
        if task.name() != requested {
            debug!(target: "capsule.core.entry", requested, resolved = task.name(), "falling back to another task");
        }
        if !input.kwargs.is_empty() {
            debug!(target: "capsule.core.entry", count = input.kwargs.len(), "ignoring keyword arguments");
        }

        let value = task.call_local(input.args).map_err(|e| e.to_string())?;
        Ok(Envelope::Result(value).to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_model::TaskOptions;
    use std::convert::Infallible;

    fn entry(with_main: bool) -> EntryPoint {
        let mut reg = TaskRegistry::new();
        reg.register(TaskOptions::new("greet").normalize().unwrap(), |name: String| {
            Ok::<_, Infallible>(format!("Hello, {name}!"))
        });
        reg.register(TaskOptions::new("nothing").normalize().unwrap(), || {
            Ok::<_, Infallible>(())
        });
        if with_main {
            reg.register(TaskOptions::new("main").normalize().unwrap(), || {
                Ok::<_, Infallible>("main ran")
            });
        }
        EntryPoint::new(Arc::new(reg))
    }

    #[test]
    fn runs_requested_task() {
        let out = entry(true)
            .run(r#"{"task_name":"greet","args":["Ada"],"kwargs":{}}"#)
            .unwrap();
        assert_eq!(out, r#"{"result":"Hello, Ada!"}"#);
    }

    #[test]
    fn unit_result_is_null() {
        let out = entry(true).run(r#"{"task_name":"nothing"}"#).unwrap();
        assert_eq!(out, r#"{"result":null}"#);
    }

    #[test]
    fn missing_name_runs_main() {
        let out = entry(true).run(r#"{}"#).unwrap();
        assert_eq!(out, r#"{"result":"main ran"}"#);
    }

    #[test]
    fn unknown_name_falls_back_to_main_then_first() {
        let out = entry(true).run(r#"{"task_name":"ghost"}"#).unwrap();
        assert_eq!(out, r#"{"result":"main ran"}"#);

        let err = entry(false).run(r#"{"task_name":"ghost"}"#).unwrap_err();
        // first registered task is `greet`, which needs one argument
        assert!(err.contains("greet"), "{err}");
    }

    #[test]
    fn empty_registry_lists_nothing() {
        let ep = EntryPoint::new(Arc::new(TaskRegistry::new()));
        let err = ep.run(r#"{"task_name":"x"}"#).unwrap_err();
        assert!(err.contains("available tasks: []"));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = entry(true).run("not json").unwrap_err();
        assert!(err.starts_with("invalid task arguments"));
    }
}
