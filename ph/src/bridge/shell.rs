//! POSIX shell execution

use tokio::process::Command;

use super::process;
use crate::error::ScriptError;

/// Run `script` with `bin -c`, optionally with an explicit `PATH`
pub(super) async fn run(
    bin: &str,
    script: &str,
    path: Option<&str>,
    timeout_ms: Option<u64>,
) -> Result<String, ScriptError> {
    let mut cmd = Command::new(bin);
    cmd.arg("-c").arg(script);
    if let Some(path) = path {
        cmd.env("PATH", path);
    }
    process::run(cmd, bin, timeout_ms).await
}

/// Ask a login shell for its `PATH`
pub(super) async fn login_path(shell: &str) -> Result<String, ScriptError> {
    let mut cmd = Command::new(shell);
    cmd.args(["-l", "-c", "printf %s \"$PATH\""]);
    process::run(cmd, shell, Some(5_000)).await
}
