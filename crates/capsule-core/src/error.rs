use capsule_model::ConfigError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("task not found: {0}")]
    NotFound(String),

    /// The host answered with an `error` envelope.
    #[error("task {name} failed: {message}")]
    Task { name: String, message: String },

    /// The host entry point itself could not be called.
    #[error("task {name} failed: Host call failed: {cause}")]
    Host { name: String, cause: String },

    #[error("invalid arguments for task {name}: {reason}")]
    Args { name: String, reason: String },

    #[error("cannot decode result of task {name}: {reason}")]
    Decode { name: String, reason: String },

    /// Error returned by the task body when running locally, passed through untouched.
    #[error(transparent)]
    Handler(BoxError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Name of the task the error belongs to, when known.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            CoreError::NotFound(name) => Some(name),
            CoreError::Task { name, .. }
            | CoreError::Host { name, .. }
            | CoreError::Args { name, .. }
            | CoreError::Decode { name, .. } => Some(name),
            CoreError::Handler(_) | CoreError::Config(_) => None,
        }
    }

    /// `true` when the failure happened on the way to the host rather than inside the task.
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Host { .. })
    }
}
