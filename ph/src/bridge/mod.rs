//! Script execution bridge
//!
//! Directive bodies run on one of four targets, picked by directive name:
//!
//! - `as` / `applescript` - system automation scripting (`osascript`)
//! - `jxa` - the automation host in JavaScript mode (`osascript -l JavaScript`)
//! - `shell` - a POSIX shell, `/bin/sh` unless the token names another binary
//! - `js` - an in-process Rhai sandbox with a fixed table of host functions
//!
//! Scripts are handed to the interpreter as a single argv entry, never
//! through another shell, so no quoting or escaping is applied to them.

mod automation;
mod process;
mod sandbox;
mod shell;

use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::ScriptConfig;
use crate::directive::Scope;
use crate::error::ScriptError;

pub use sandbox::SANDBOX_FUNCTIONS;

/// Where a script body is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTarget {
    AppleScript,
    Jxa,
    Shell,
    Sandbox,
}

impl ExecutionTarget {
    /// Target for a script directive name
    pub fn for_directive(name: &str) -> Option<Self> {
        match name {
            "as" | "applescript" => Some(Self::AppleScript),
            "jxa" => Some(Self::Jxa),
            "shell" => Some(Self::Shell),
            "js" => Some(Self::Sandbox),
            _ => None,
        }
    }
}

/// Runs script bodies and captures their output
///
/// Cheap to clone; the login `PATH` lookup is shared between clones and
/// performed at most once.
#[derive(Debug, Clone)]
pub struct ScriptBridge {
    settings: Arc<ScriptConfig>,
    login_path: Arc<OnceCell<Option<String>>>,
}

impl ScriptBridge {
    pub fn new(settings: ScriptConfig) -> Self {
        debug!(?settings, "ScriptBridge::new: called");
        Self {
            settings: Arc::new(settings),
            login_path: Arc::new(OnceCell::new()),
        }
    }

    pub fn settings(&self) -> &ScriptConfig {
        &self.settings
    }

    /// Run `script` on `target`
    ///
    /// `bin` only applies to the shell target. The sandbox needs `scope` to
    /// call back into other directives.
    pub async fn run(
        &self,
        target: ExecutionTarget,
        script: &str,
        bin: Option<&str>,
        scope: &Scope<'_>,
    ) -> Result<String, ScriptError> {
        debug!(?target, script_len = script.len(), ?bin, "ScriptBridge::run: called");
        match target {
            ExecutionTarget::AppleScript => self.applescript(script).await,
            ExecutionTarget::Jxa => self.jxa(script).await,
            ExecutionTarget::Shell => self.shell(script, bin).await,
            ExecutionTarget::Sandbox => sandbox::evaluate(script, scope).await,
        }
    }

    /// Run an automation script
    pub async fn applescript(&self, script: &str) -> Result<String, ScriptError> {
        debug!("ScriptBridge::applescript: called");
        automation::run(script, automation::Dialect::AppleScript, self.settings.process_timeout_ms).await
    }

    /// Run an automation script in the JavaScript dialect
    pub async fn jxa(&self, script: &str) -> Result<String, ScriptError> {
        debug!("ScriptBridge::jxa: called");
        automation::run(script, automation::Dialect::JavaScript, self.settings.process_timeout_ms).await
    }

    /// Run a shell script under `bin` (or the configured default shell)
    pub async fn shell(&self, script: &str, bin: Option<&str>) -> Result<String, ScriptError> {
        let bin = bin.filter(|b| !b.is_empty()).unwrap_or(&self.settings.default_shell);
        debug!(%bin, "ScriptBridge::shell: called");

        let path = if self.settings.export_login_path {
            self.login_path().await
        } else {
            None
        };
        shell::run(bin, script, path.as_deref(), self.settings.process_timeout_ms).await
    }

    /// Run `program args...` directly and capture stdout
    pub async fn command(&self, program: &str, args: &[&str]) -> Result<String, ScriptError> {
        debug!(%program, ?args, "ScriptBridge::command: called");
        let mut cmd = Command::new(program);
        cmd.args(args);
        process::run(cmd, program, self.settings.process_timeout_ms).await
    }

    /// The login shell's `PATH`, fetched once
    async fn login_path(&self) -> Option<String> {
        self.login_path
            .get_or_init(|| async {
                let login_shell = &self.settings.login_shell;
                debug!(%login_shell, "ScriptBridge::login_path: querying login shell");
                match shell::login_path(login_shell).await {
                    Ok(path) if !path.is_empty() => Some(path),
                    Ok(_) => None,
                    Err(e) => {
                        debug!(error = %e, "ScriptBridge::login_path: lookup failed");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> ScriptBridge {
        ScriptBridge::new(ScriptConfig {
            default_shell: "sh".to_string(),
            login_shell: "sh".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_target_for_directive() {
        assert_eq!(ExecutionTarget::for_directive("as"), Some(ExecutionTarget::AppleScript));
        assert_eq!(ExecutionTarget::for_directive("applescript"), Some(ExecutionTarget::AppleScript));
        assert_eq!(ExecutionTarget::for_directive("jxa"), Some(ExecutionTarget::Jxa));
        assert_eq!(ExecutionTarget::for_directive("shell"), Some(ExecutionTarget::Shell));
        assert_eq!(ExecutionTarget::for_directive("js"), Some(ExecutionTarget::Sandbox));
        assert_eq!(ExecutionTarget::for_directive("python"), None);
    }

    #[tokio::test]
    async fn test_shell_default_binary() {
        let out = bridge().shell("printf 'a b'", None).await.unwrap();
        assert_eq!(out, "a b");
    }

    #[tokio::test]
    async fn test_shell_explicit_binary() {
        let out = bridge().shell("echo $0", Some("sh")).await.unwrap();
        assert_eq!(out, "sh");
    }

    #[tokio::test]
    async fn test_shell_failure_is_error() {
        assert!(bridge().shell("exit 1", None).await.is_err());
    }

    #[tokio::test]
    async fn test_shell_with_login_path() {
        let bridge = ScriptBridge::new(ScriptConfig {
            default_shell: "sh".to_string(),
            login_shell: "sh".to_string(),
            export_login_path: true,
            ..Default::default()
        });
        let out = bridge.shell("printf %s \"$PATH\"", None).await.unwrap();
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn test_command() {
        let out = bridge().command("echo", &["one", "two"]).await.unwrap();
        assert_eq!(out, "one two");
    }
}
