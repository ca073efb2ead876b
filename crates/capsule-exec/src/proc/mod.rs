use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use capsule_model::{EnvVars, RunnerResult};
use tracing::{debug, instrument, trace};

use crate::{
    error::{ExecError, ExecResult},
    util::{cmd_program, invocation_args, resolve_task_file},
};

mod output;
pub use output::parse_output;

/// Binary invoked when none is configured.
pub const DEFAULT_BINARY: &str = "capsule";
/// Environment variable that overrides the binary path.
pub const BINARY_ENV: &str = "CAPSULE_BIN";

/// One invocation of the task-hosting binary.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Task file, absolute or relative to `cwd`.
    pub file: PathBuf,
    /// Extra arguments appended after `--json`.
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub binary: String,
    /// Applied to the child on top of the inherited environment.
    pub env: EnvVars,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            args: Vec::new(),
            cwd: None,
            binary: DEFAULT_BINARY.to_string(),
            env: EnvVars::new(),
        }
    }
}

impl RunOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(key, value);
        self
    }

    /// Use `$CAPSULE_BIN` as the binary when it is set and not empty.
    pub fn binary_from_env(self) -> Self {
        match std::env::var(BINARY_ENV) {
            Ok(bin) if !bin.trim().is_empty() => self.binary(bin),
            _ => self,
        }
    }
}

/// Runs tasks by spawning the task-hosting binary as a child process.
///
/// Stateless: concurrent [`ProcessRunner::run`] calls spawn independent
/// children. The child is killed if the returned future is dropped.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    #[instrument(level = "debug", skip(self, opts), fields(file = %opts.file.display(), binary = %opts.binary))]
    pub async fn run(&self, opts: &RunOptions) -> ExecResult<RunnerResult> {
        if let Some(cwd) = &opts.cwd {
            require_path(cwd).await?;
        }
        let file = resolve_task_file(&opts.file, opts.cwd.as_deref())?;
        require_path(&file).await?;

        let args = invocation_args(&file, &opts.args);
        trace!(target: "capsule.exec.proc", program = %opts.binary, ?args, "spawn");

        let mut cmd = cmd_program(&opts.binary, &args);
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in opts.env.iter() {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let out = cmd.output().await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExecError::BinaryNotFound {
                binary: opts.binary.clone(),
            },
            _ => ExecError::Spawn(e.to_string()),
        })?;

        if !out.status.success() && out.stdout.is_empty() {
            debug!(target: "capsule.exec.proc", status = %out.status, "process failed without output");
            return Err(ExecError::ProcessExecution(if out.stderr.is_empty() {
                "Unknown error".to_string()
            } else {
                String::from_utf8_lossy(&out.stderr).into_owned()
            }));
        }

        let result = parse_output(&String::from_utf8_lossy(&out.stdout))?;
        debug!(
            target: "capsule.exec.proc",
            task = %result.execution.task_name,
            success = result.success,
            duration_ms = result.execution.duration_ms,
            "run finished"
        );
        Ok(result)
    }
}

/// `FileNotFound` when `path` is absent; other lookup failures are `Io`.
async fn require_path(path: &Path) -> ExecResult<()> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ExecError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ExecError::Io(format!("{}: {e}", path.display()))),
    }
}

/// Run a task with a default [`ProcessRunner`].
pub async fn run(opts: &RunOptions) -> ExecResult<RunnerResult> {
    ProcessRunner::new().run(opts).await
}
