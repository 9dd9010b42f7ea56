//! Directives that interact with the user: alerts, dialogs, speech

use async_trait::async_trait;
use tracing::debug;

use super::require_macos;
use crate::browser::escape_applescript;
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// `{{alert title="...":message}}`
pub struct Alert;

impl Alert {
    fn script(title: &str, message: &str, timeout_secs: u64) -> String {
        format!(
            "display alert \"{}\" message \"{}\" giving up after {timeout_secs}",
            escape_applescript(title),
            escape_applescript(message)
        )
    }
}

#[async_trait]
impl Directive for Alert {
    fn name(&self) -> &str {
        "alert"
    }

    fn description(&self) -> &str {
        "Show an alert and wait for it to be dismissed"
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("Alert::apply: called");
        require_macos("alert")?;
        let title = token.args.get("title").unwrap_or("Alert");
        let timeout = scope.env.bridge().settings().dialog_timeout_secs;
        scope
            .env
            .bridge()
            .applescript(&Self::script(title, token.body(), timeout))
            .await?;
        Ok(DirectiveOutput::empty())
    }
}

/// `{{dialog title="..." default="...":prompt}}`
pub struct Dialog;

impl Dialog {
    fn script(title: &str, prompt: &str, default: &str, timeout_secs: u64) -> String {
        format!(
            "text returned of (display dialog \"{}\" with title \"{}\" default answer \"{}\" giving up after {timeout_secs})",
            escape_applescript(prompt),
            escape_applescript(title),
            escape_applescript(default)
        )
    }
}

#[async_trait]
impl Directive for Dialog {
    fn name(&self) -> &str {
        "dialog"
    }

    fn description(&self) -> &str {
        "Ask the user for text and return what they typed"
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("Dialog::apply: called");
        require_macos("dialog")?;
        let title = token.args.get("title").unwrap_or("Input");
        let default = token.args.get("default").unwrap_or("");
        let timeout = scope.env.bridge().settings().dialog_timeout_secs;
        let answer = scope
            .env
            .bridge()
            .applescript(&Self::script(title, token.body(), default, timeout))
            .await?;
        Ok(DirectiveOutput::text(answer))
    }
}

/// `{{say voice="..." speed="..." pitch="...":text}}`
pub struct Say;

impl Say {
    /// Arguments for the `say` command
    fn arguments(token: &Token) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(voice) = token.args.get("voice") {
            args.push("-v".to_string());
            args.push(voice.to_string());
        }
        if let Some(speed) = token.args.get("speed").filter(|s| s.parse::<u32>().is_ok()) {
            args.push("-r".to_string());
            args.push(speed.to_string());
        }
        let text = match token.args.get("pitch").filter(|p| p.parse::<u32>().is_ok()) {
            Some(pitch) => format!("[[pbas {pitch}]] {}", token.body()),
            None => token.body().to_string(),
        };
        args.push(text);
        args
    }
}

#[async_trait]
impl Directive for Say {
    fn name(&self) -> &str {
        "say"
    }

    fn description(&self) -> &str {
        "Speak text aloud"
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("Say::apply: called");
        require_macos("say")?;
        if token.body().trim().is_empty() {
            return Err(DirectiveError::malformed("say", "nothing to say"));
        }
        let args = Self::arguments(token);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        scope.env.bridge().command("say", &args).await?;
        Ok(DirectiveOutput::empty())
    }
}
