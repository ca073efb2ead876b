mod error;
pub use error::{ExecError, ExecResult};

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::{DEFAULT_BINARY, ProcessRunner, RunOptions};

#[cfg(feature = "proc")]
mod util;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    #[cfg(feature = "proc")]
    pub use crate::{ProcessRunner, RunOptions};
}
