//! Script directives: `{{as:...}}`, `{{applescript:...}}`, `{{jxa:...}}`, `{{shell bin:...}}`, `{{js:...}}`

use async_trait::async_trait;
use tracing::debug;

use super::require_macos;
use crate::bridge::ExecutionTarget;
use crate::browser;
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// Script directive names and descriptions, in evaluation order
pub(super) const SCRIPT_DIRECTIVES: &[(&str, &str)] = &[
    ("as", "Output of an automation script"),
    ("applescript", "Output of an automation script"),
    ("jxa", "Output of an automation script in JavaScript"),
    ("shell", "Stdout of a shell script; the first argument picks the shell"),
    ("js", "Result of a sandboxed script, or of page JavaScript with target=\"browser\""),
];

/// `target=` value meaning "whichever browser is in front"
const FRONTMOST_BROWSER: &str = "browser";

pub struct ScriptDirective {
    name: &'static str,
    description: &'static str,
}

impl ScriptDirective {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }

    /// Run `script` as page JavaScript in the browser named by `target`
    async fn run_in_browser(&self, target: &str, script: &str, scope: &Scope<'_>) -> Result<String, DirectiveError> {
        require_macos("browser JavaScript")?;
        let app = if target == FRONTMOST_BROWSER {
            match scope.context.text("currentAppName").filter(|n| !n.is_empty()) {
                Some(name) => name,
                None => scope.env.provider().frontmost_application().await?.name,
            }
        } else {
            target.to_string()
        };
        debug!(%app, "ScriptDirective::run_in_browser: called");

        let wrapped = browser::javascript_script(&app, script)
            .ok_or_else(|| DirectiveError::unavailable(format!("{app} is not a supported browser")))?;
        Ok(scope.env.bridge().applescript(&wrapped).await?)
    }
}

#[async_trait]
impl Directive for ScriptDirective {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let target = ExecutionTarget::for_directive(self.name)
            .ok_or_else(|| DirectiveError::malformed(self.name, "no execution target"))?;
        let script = token.body();
        if script.trim().is_empty() {
            return Err(DirectiveError::malformed(self.name, "empty script"));
        }
        debug!(?target, len = script.len(), "ScriptDirective::apply: called");

        if target == ExecutionTarget::Sandbox
            && let Some(browser_target) = token.args.get("target")
        {
            let out = self.run_in_browser(browser_target, script, scope).await?;
            return Ok(DirectiveOutput::text(out));
        }
        if matches!(target, ExecutionTarget::AppleScript | ExecutionTarget::Jxa) {
            require_macos(self.name)?;
        }

        let bin = token.args.positional(0);
        let out = scope.env.bridge().run(target, script, bin, scope).await?;
        Ok(DirectiveOutput::text(out))
    }
}
