use capsule_model::Envelope;
use serde_json::{Value, json};
use tracing::trace;

use crate::{
    bridge::{HostBridge, HostCallError},
    entry::EntryPoint,
};

/// In-process host: answers `schedule_task` by running the task through an
/// [`EntryPoint`] on the calling thread.
///
/// Useful to exercise the sandboxed path end to end without a real sandbox.
/// The config JSON is accepted and ignored.
#[derive(Debug, Clone)]
pub struct LoopbackHost {
    entry: EntryPoint,
}

impl LoopbackHost {
    pub fn new(entry: EntryPoint) -> Self {
        Self { entry }
    }
}

impl HostBridge for LoopbackHost {
    fn schedule_task(
        &self,
        name: &str,
        args_json: &str,
        _config_json: &str,
    ) -> Result<String, HostCallError> {
        let args: Value = serde_json::from_str(args_json)
            .map_err(|e| HostCallError::new(format!("invalid args json: {e}")))?;
        let payload = json!({ "task_name": name, "args": args, "kwargs": {} });

        trace!(target: "capsule.core.loopback", task = name, "running task in-process");
        Ok(match self.entry.run(&payload.to_string()) {
            Ok(envelope) => envelope,
            Err(message) => Envelope::Error(message).to_json(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TaskRegistry;
    use capsule_model::TaskOptions;
    use std::{convert::Infallible, sync::Arc};

    fn host() -> LoopbackHost {
        let mut reg = TaskRegistry::new();
        reg.register(TaskOptions::new("mul").normalize().unwrap(), |a: i64, b: i64| {
            Ok::<_, Infallible>(a * b)
        });
        reg.register(TaskOptions::new("fail").normalize().unwrap(), || {
            Err::<(), _>("nope")
        });
        LoopbackHost::new(EntryPoint::new(Arc::new(reg)))
    }

    #[test]
    fn returns_result_envelope() {
        let out = host().schedule_task("mul", "[6,7]", "{}").unwrap();
        assert_eq!(out, r#"{"result":42}"#);
    }

    #[test]
    fn task_failure_becomes_error_envelope() {
        let out = host().schedule_task("fail", "[]", "{}").unwrap();
        assert_eq!(out, r#"{"error":"nope"}"#);
    }

    #[test]
    fn malformed_args_fail_the_call() {
        let err = host().schedule_task("mul", "[6,", "{}").unwrap_err();
        assert!(err.cause().starts_with("invalid args json"));
    }
}
