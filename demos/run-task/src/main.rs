use anyhow::Context;
use tracing::{error, info};

use capsule_exec::{ExecError, prelude::*};
use capsule_observe::{LoggerConfig, logger_init};

/// Usage: run-task <file> [extra args..]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig::from_env()?)?;

    let mut argv = std::env::args().skip(1);
    let file = argv.next().context("usage: run-task <file> [args..]")?;
    let opts = RunOptions::new(file).args(argv).binary_from_env();
    info!(binary = %opts.binary, file = %opts.file.display(), "running task");

    match ProcessRunner::new().run(&opts).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e @ ExecError::BinaryNotFound { .. }) => {
            error!("{e}");
            std::process::exit(127);
        }
        Err(e) => Err(e.into()),
    }
}
