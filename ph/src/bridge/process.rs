//! External process execution shared by the script targets

use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::ScriptError;

/// Largest output kept from a single process
const MAX_OUTPUT_BYTES: usize = 1_000_000;

/// Run a program to completion and capture its stdout
///
/// A non-zero exit is an error carrying stderr. Trailing newlines are
/// stripped from the output.
pub(crate) async fn run(mut command: Command, program: &str, timeout_ms: Option<u64>) -> Result<String, ScriptError> {
    debug!(%program, ?timeout_ms, "process::run: called");
    command.kill_on_drop(true);

    let output = match timeout_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), command.output()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%program, "process::run: timed out");
                return Err(ScriptError::Timeout { timeout_ms: ms });
            }
        },
        None => command.output().await,
    };

    let output = output.map_err(|source| {
        debug!(%program, %source, "process::run: failed to spawn");
        ScriptError::Spawn {
            program: program.to_string(),
            source,
        }
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(stdout_len = %stdout.len(), stderr_len = %stderr.len(), status = ?output.status, "process::run: completed");

    if !output.status.success() {
        return Err(ScriptError::NonZeroExit {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    let mut text = stdout.trim_end_matches(['\n', '\r']).to_string();
    if text.len() > MAX_OUTPUT_BYTES {
        debug!("process::run: truncating long output");
        let mut cut = MAX_OUTPUT_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    Ok(text)
}
