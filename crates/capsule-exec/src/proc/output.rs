use capsule_model::RunnerResult;

use crate::error::{ExecError, ExecResult};

/// Parse the runner's stdout: only the last non-empty line is the result,
/// everything before it is progress output.
pub fn parse_output(stdout: &str) -> ExecResult<RunnerResult> {
    let parse_err = |reason: String| ExecError::OutputParse {
        reason,
        output: stdout.to_string(),
    };

    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .ok_or_else(|| parse_err("no output".to_string()))?;

    let result: RunnerResult =
        serde_json::from_str(line).map_err(|e| parse_err(format!("invalid json: {e}")))?;

    if !result.is_consistent() {
        return Err(parse_err(format!(
            "success={} disagrees with error={}",
            result.success,
            if result.error.is_some() { "set" } else { "null" }
        )));
    }
    Ok(result)
}
