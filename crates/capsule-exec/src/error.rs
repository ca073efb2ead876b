use std::path::PathBuf;

use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("task file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error(
        "binary not found: {binary}; install the capsule CLI and make sure it is on PATH (or set CAPSULE_BIN)"
    )]
    BinaryNotFound { binary: String },
    #[error("{0}")]
    ProcessExecution(String),
    #[error("failed to parse runner output: {reason}\noutput:\n{output}")]
    OutputParse { reason: String, output: String },
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(String),
}

impl ExecError {
    /// `true` for a missing task file or a missing binary.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExecError::FileNotFound { .. } | ExecError::BinaryNotFound { .. }
        )
    }
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}
