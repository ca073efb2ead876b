use std::sync::Arc;

use capsule_model::{Envelope, ScheduleRequest, TaskConfig};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// The sandbox host's scheduling entry point.
///
/// Implementations forward one invocation to the host and return its JSON
/// envelope (`{"result": ..}` or `{"error": ".."}`). An `Err` means the entry
/// point itself failed, not the task.
pub trait HostBridge: Send + Sync {
    fn schedule_task(
        &self,
        name: &str,
        args_json: &str,
        config_json: &str,
    ) -> Result<String, HostCallError>;
}

/// Failure of the foreign call itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostCallError(String);

impl HostCallError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }

    pub fn cause(&self) -> &str {
        &self.0
    }
}

impl From<String> for HostCallError {
    fn from(cause: String) -> Self {
        Self(cause)
    }
}

impl From<&str> for HostCallError {
    fn from(cause: &str) -> Self {
        Self(cause.to_string())
    }
}

/// Synchronous client around a single [`HostBridge`] entry point.
///
/// Holds no state between calls.
#[derive(Clone)]
pub struct BridgeClient {
    host: Arc<dyn HostBridge>,
}

impl BridgeClient {
    pub fn new(host: Arc<dyn HostBridge>) -> Self {
        Self { host }
    }

    /// Send a request and return the raw envelope, keeping transport failures apart.
    pub fn call(&self, request: &ScheduleRequest) -> Result<String, HostCallError> {
        let args_json = request
            .args_json()
            .map_err(|e| HostCallError::new(format!("encode args: {e}")))?;
        let config_json = request
            .config_json()
            .map_err(|e| HostCallError::new(format!("encode config: {e}")))?;

        trace!(target: "capsule.core.bridge", task = %request.name, args = %args_json, "schedule_task");
        self.host
            .schedule_task(&request.name, &args_json, &config_json)
            .inspect_err(|e| {
                debug!(target: "capsule.core.bridge", task = %request.name, cause = %e, "host call failed")
            })
    }

    /// Schedule a task and always return an envelope string.
    ///
    /// A failing host call is folded into `{"error": "Host call failed: <cause>"}`.
    pub fn schedule(&self, name: &str, args: Vec<Value>, config: &TaskConfig) -> String {
        let mut request = ScheduleRequest::new(config, args);
        request.name = name.to_string();
        match self.call(&request) {
            Ok(envelope) => envelope,
            Err(e) => Envelope::Error(format!("Host call failed: {e}")).to_json(),
        }
    }
}
