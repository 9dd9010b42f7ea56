//! Directives reading desktop state through the context provider

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::require_macos;
use crate::browser;
use crate::context::{INPUT_KEY, SELECTED_FILES_KEY};
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// Largest file `selectedFileContents` will inline
const MAX_INLINE_FILE_BYTES: u64 = 256 * 1024;

/// `{{clipboardText}}`
pub struct ClipboardText;

#[async_trait]
impl Directive for ClipboardText {
    fn name(&self) -> &str {
        "clipboardText"
    }

    fn description(&self) -> &str {
        "Current clipboard text"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["clipboardText"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("ClipboardText::apply: called");
        let text = scope.env.provider().clipboard_text().await?;
        Ok(DirectiveOutput::keyed("clipboardText", text))
    }
}

/// `{{selectedText}}`
pub struct SelectedText;

#[async_trait]
impl Directive for SelectedText {
    fn name(&self) -> &str {
        "selectedText"
    }

    fn description(&self) -> &str {
        "Text selected in the frontmost application"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["selectedText"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("SelectedText::apply: called");
        let text = scope.env.provider().selected_text().await?;
        Ok(DirectiveOutput::keyed("selectedText", text))
    }
}

/// Selected paths: from the context when seeded, else from the provider
async fn selected_paths(scope: &Scope<'_>) -> Result<Vec<String>, DirectiveError> {
    if scope.context.is_resolved(SELECTED_FILES_KEY) {
        return Ok(scope.context.selected_files());
    }
    Ok(scope.env.provider().selected_files().await?)
}

/// `{{selectedFiles}}`
pub struct SelectedFiles;

#[async_trait]
impl Directive for SelectedFiles {
    fn name(&self) -> &str {
        "selectedFiles"
    }

    fn description(&self) -> &str {
        "Comma-separated paths of the files selected in the file manager"
    }

    fn result_keys(&self) -> &[&'static str] {
        &[SELECTED_FILES_KEY]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("SelectedFiles::apply: called");
        let paths = selected_paths(scope).await?;
        Ok(DirectiveOutput::keyed(SELECTED_FILES_KEY, paths.join(", ")))
    }
}

/// `{{selectedFileContents}}`
pub struct SelectedFileContents;

#[async_trait]
impl Directive for SelectedFileContents {
    fn name(&self) -> &str {
        "selectedFileContents"
    }

    fn description(&self) -> &str {
        "Text of each selected file, headed by its path"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["selectedFileContents"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("SelectedFileContents::apply: called");
        let paths = selected_paths(scope).await?;

        let mut sections = Vec::new();
        for path in &paths {
            match read_text_file(Path::new(path)).await {
                Some(text) => sections.push(format!("{path}:\n{text}")),
                None => debug!(%path, "SelectedFileContents::apply: skipping unreadable or binary file"),
            }
        }

        Ok(DirectiveOutput::keyed("selectedFileContents", sections.join("\n\n"))
            .with_field(SELECTED_FILES_KEY, paths.join(", ")))
    }
}

async fn read_text_file(path: &Path) -> Option<String> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if !meta.is_file() || meta.len() > MAX_INLINE_FILE_BYTES {
        return None;
    }
    let bytes = tokio::fs::read(path).await.ok()?;
    String::from_utf8(bytes).ok()
}

/// `{{currentApplication}}`
pub struct CurrentApplication;

#[async_trait]
impl Directive for CurrentApplication {
    fn name(&self) -> &str {
        "currentApplication"
    }

    fn description(&self) -> &str {
        "Name of the frontmost application"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["currentAppName", "currentAppPath"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("CurrentApplication::apply: called");
        let app = scope.env.provider().frontmost_application().await?;
        Ok(DirectiveOutput::keyed("currentAppName", app.name).with_field("currentAppPath", app.path))
    }
}

/// Frontmost application name, from the context when already resolved
async fn current_app_name(scope: &Scope<'_>) -> Result<String, DirectiveError> {
    if let Some(name) = scope.context.text("currentAppName").filter(|n| !n.is_empty()) {
        return Ok(name);
    }
    Ok(scope.env.provider().frontmost_application().await?.name)
}

/// `{{currentURL}}`
pub struct CurrentUrl;

#[async_trait]
impl Directive for CurrentUrl {
    fn name(&self) -> &str {
        "currentURL"
    }

    fn description(&self) -> &str {
        "URL of the active tab when a browser is in front"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["currentURL"]
    }

    fn dependencies(&self) -> &[&'static str] {
        &["currentApplication"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let app = current_app_name(scope).await?;
        debug!(%app, "CurrentUrl::apply: called");
        let url = scope.env.provider().browser_url(&app).await?;
        Ok(DirectiveOutput::keyed("currentURL", url))
    }
}

/// `{{currentTabText}}`
pub struct CurrentTabText;

#[async_trait]
impl Directive for CurrentTabText {
    fn name(&self) -> &str {
        "currentTabText"
    }

    fn description(&self) -> &str {
        "Visible text of the active browser tab"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["currentTabText"]
    }

    fn dependencies(&self) -> &[&'static str] {
        &["currentApplication"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        require_macos("currentTabText")?;
        let app = current_app_name(scope).await?;
        debug!(%app, "CurrentTabText::apply: called");
        let script = browser::javascript_script(&app, "document.body.innerText")
            .ok_or_else(|| DirectiveError::unavailable(format!("{app} is not a supported browser")))?;
        let text = scope.env.bridge().applescript(&script).await?;
        Ok(DirectiveOutput::keyed("currentTabText", text))
    }
}

/// `{{input}}`
pub struct Input;

#[async_trait]
impl Directive for Input {
    fn name(&self) -> &str {
        INPUT_KEY
    }

    fn description(&self) -> &str {
        "Text the user typed into the host"
    }

    fn result_keys(&self) -> &[&'static str] {
        &[INPUT_KEY]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("Input::apply: called");
        if scope.context.is_resolved(INPUT_KEY)
            && let Some(text) = scope.context.text(INPUT_KEY)
        {
            return Ok(DirectiveOutput::text(text));
        }
        let text = scope.env.provider().user_input().await?;
        Ok(DirectiveOutput::keyed(INPUT_KEY, text))
    }
}

/// Values only the caller can supply, and what they hold
pub(super) const SEEDED: &[(&str, &str)] = &[
    ("previousCommand", "Name of the previously run command"),
    ("previousPrompt", "Prompt of the previous run"),
    ("previousResponse", "Response of the previous run"),
];

/// A directive whose value comes only from the seed context
///
/// Seeded tokens are replaced before the pass starts; reaching `apply`
/// means the caller did not supply the value.
pub struct Seeded {
    name: &'static str,
    description: &'static str,
    keys: [&'static str; 1],
}

impl Seeded {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            keys: [name],
        }
    }
}

#[async_trait]
impl Directive for Seeded {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn result_keys(&self) -> &[&'static str] {
        &self.keys
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(name = %self.name, "Seeded::apply: called");
        scope
            .context
            .text(self.name)
            .map(DirectiveOutput::text)
            .ok_or_else(|| DirectiveError::unavailable(format!("{} was not supplied", self.name)))
    }
}
