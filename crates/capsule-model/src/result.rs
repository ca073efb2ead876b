use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured result printed by the task-hosting binary as its last line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerResult {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    pub execution: ExecutionInfo,
}

impl RunnerResult {
    /// `success` must be `true` exactly when `error` is absent.
    pub fn is_consistent(&self) -> bool {
        self.success == self.error.is_none()
    }

    pub fn into_result(self) -> Result<Value, ErrorInfo> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub error_type: String,
    pub message: String,
}

/// Execution metadata reported by the host. `fuel_consumed` is opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionInfo {
    pub task_name: String,
    pub duration_ms: u64,
    pub retries: u32,
    pub fuel_consumed: u64,
}
