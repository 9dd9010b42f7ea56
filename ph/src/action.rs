//! Action scripts - automation run after a response is produced
//!
//! The script sees the response in an AppleScript variable named `response`.
//! A failure here is reported to the user, not swallowed.

use tracing::{debug, info};

use crate::bridge::ScriptBridge;
use crate::browser::escape_applescript;
use crate::error::{ActionScriptFailure, ScriptError};

/// Title shown when an action script fails
pub const FAILURE_TITLE: &str = "Action script failed";

/// Prefix `script` with the `response` variable
pub fn prepare(script: &str, response: &str) -> String {
    format!("set response to \"{}\"\n{script}", escape_applescript(response))
}

/// Run an action script against a finished response
pub async fn run_action_script(
    bridge: &ScriptBridge,
    script: &str,
    response: &str,
) -> Result<String, ActionScriptFailure> {
    debug!(script_len = script.len(), response_len = response.len(), "run_action_script: called");

    if !cfg!(target_os = "macos") {
        return Err(failure(ScriptError::Sandbox("action scripts need macOS".to_string())));
    }

    let output = bridge.applescript(&prepare(script, response)).await.map_err(failure)?;
    info!("Action script completed");
    Ok(output)
}

fn failure(source: ScriptError) -> ActionScriptFailure {
    ActionScriptFailure {
        title: FAILURE_TITLE.to_string(),
        source,
    }
}
