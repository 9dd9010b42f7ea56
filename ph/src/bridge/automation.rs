//! System automation scripting through `osascript`

use tokio::process::Command;

use super::process;
use crate::error::ScriptError;

const OSASCRIPT: &str = "osascript";

#[derive(Debug, Clone, Copy)]
pub(super) enum Dialect {
    AppleScript,
    JavaScript,
}

pub(super) async fn run(script: &str, dialect: Dialect, timeout_ms: Option<u64>) -> Result<String, ScriptError> {
    let mut cmd = Command::new(OSASCRIPT);
    if let Dialect::JavaScript = dialect {
        cmd.args(["-l", "JavaScript"]);
    }
    cmd.arg("-e").arg(script);
    process::run(cmd, OSASCRIPT, timeout_ms).await
}
