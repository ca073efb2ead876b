//! Wire and configuration types shared by the task bridge and the process runner.

mod compute;
pub use compute::Compute;

mod env;
pub use env::{EnvVars, EnvVarsInput};

mod error;
pub use error::ConfigError;

mod config;
pub use config::{DEFAULT_MAX_RETRIES, TaskConfig};

mod options;
pub use options::TaskOptions;

mod envelope;
pub use envelope::{Envelope, ResponseOutcome, ScheduleRequest};

mod result;
pub use result::{ErrorInfo, ExecutionInfo, RunnerResult};

/// Name of the task the host falls back to when none is requested.
pub const MAIN_TASK: &str = "main";
