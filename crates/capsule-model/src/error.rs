use thiserror::Error;

/// Malformed task configuration input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("task name must not be empty")]
    EmptyName,
    #[error("invalid env_vars: {0}")]
    InvalidEnvVars(String),
    #[error("invalid value for '{field}': expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("task options must be an object")]
    NotAnObject,
}
