//! Bounded external command execution.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::reload::ReloadError;

/// Run `program` with `args`, returning its stdout.
///
/// The child is killed if it is still running after `limit`. A non-zero exit
/// becomes [`ReloadError::ExecFailed`] carrying the captured stderr, or
/// stdout when stderr is empty.
pub async fn run_command(program: &str, args: &[&str], limit: Duration) -> Result<String, ReloadError> {
    let command = render(program, args);
    tracing::debug!(command = %command, "Running command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(limit, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ReloadError::ExecFailed {
                command,
                output: e.to_string(),
            })
        }
        Err(_) => {
            tracing::warn!(command = %command, limit = ?limit, "Command timed out");
            return Err(ReloadError::Timeout(limit));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let captured = match stderr.trim() {
        "" => stdout.trim().to_string(),
        s => s.to_string(),
    };
    let captured = if captured.is_empty() {
        output.status.to_string()
    } else {
        captured
    };

    tracing::warn!(command = %command, status = %output.status, output = %captured, "Command failed");
    Err(ReloadError::ExecFailed {
        command,
        output: captured,
    })
}

fn render(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
