use serde::{Deserialize, Serialize};

use crate::{Compute, EnvVars};

/// Retry count the host applies when a task does not set one.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Canonical, immutable configuration of a registered task.
///
/// Built through [`crate::TaskOptions::normalize`]. Optional fields that were
/// not supplied are left out of the serialized form entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    name: String,
    #[serde(default)]
    compute: Compute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env_vars: Option<EnvVars>,
}

impl TaskConfig {
    pub(crate) fn from_parts(
        name: String,
        compute: Compute,
        ram: Option<String>,
        timeout: Option<String>,
        max_retries: Option<u32>,
        env_vars: Option<EnvVars>,
    ) -> Self {
        Self {
            name,
            compute,
            ram,
            timeout,
            max_retries,
            env_vars,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compute(&self) -> &Compute {
        &self.compute
    }

    /// RAM limit such as `"512MB"` or `"2GB"`.
    pub fn ram(&self) -> Option<&str> {
        self.ram.as_deref()
    }

    /// Timeout such as `"30s"`, `"5m"` or `"1500ms"`.
    pub fn timeout(&self) -> Option<&str> {
        self.timeout.as_deref()
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Retry count after applying the host default.
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn env_vars(&self) -> Option<&EnvVars> {
        self.env_vars.as_ref()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
