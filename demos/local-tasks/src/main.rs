use std::{convert::Infallible, sync::Arc};

use tracing::{info, warn};

use capsule_core::{LoopbackHost, prelude::*};
use capsule_observe::{LoggerConfig, logger_init};

fn tasks() -> anyhow::Result<AppBuilder> {
    let builder = App::builder()
        .task(
            TaskOptions::new("add_task").compute("LOW").ram("64MB"),
            |a: i64, b: i64| Ok::<_, Infallible>(a + b),
        )?
        .task(
            TaskOptions::new("greet")
                .timeout_ms(500)
                .env_vars([("GREETING", "Hello")]),
            |name: String| Ok::<_, Infallible>(format!("Hello, {name}!")),
        )?
        .task(TaskOptions::new("divide").max_retries(0), |a: f64, b: f64| {
            if b == 0.0 {
                Err("division by zero")
            } else {
                Ok(a / b)
            }
        })?;
    Ok(builder)
}

fn run_all(app: &App) -> anyhow::Result<()> {
    let sum = app.task("add_task")?.invoke::<i64>(args![5, 3])?;
    info!(mode = %app.mode(), "add_task(5, 3) = {sum}");

    let greet = app.task("greet")?;
    let greeting = greet.invoke::<String>(args!["Ada"])?;
    info!(
        mode = %app.mode(),
        timeout = greet.config().timeout().unwrap_or("-"),
        "greet = {greeting}"
    );

    match app.call("divide", args![1.0, 0.0]) {
        Ok(out) => info!(mode = %app.mode(), ?out, "divide succeeded"),
        Err(e) => warn!(mode = %app.mode(), "divide failed: {e}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig::from_env()?)?;

    // 1) No host: bodies run in this process.
    let local = tasks()?.build_local();
    run_all(&local)?;

    // 2) Same tasks routed through an in-process host.
    let host = Arc::new(LoopbackHost::new(local.entry_point()));
    let sandboxed = tasks()?.build_sandboxed(host);
    run_all(&sandboxed)?;

    Ok(())
}
