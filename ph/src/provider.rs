//! Context provider - live desktop state read by informational directives
//!
//! The host owns clipboard, selection and frontmost-application state. The
//! engine only reads it through [`ContextProvider`].

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::bridge::ScriptBridge;
use crate::browser;
use crate::error::ProviderError;

/// The application in front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub path: String,
}

/// Source of desktop state
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn clipboard_text(&self) -> Result<String, ProviderError>;

    async fn write_clipboard(&self, text: &str) -> Result<(), ProviderError>;

    /// Text selected in the frontmost application
    async fn selected_text(&self) -> Result<String, ProviderError>;

    /// Paths selected in the file manager
    async fn selected_files(&self) -> Result<Vec<String>, ProviderError>;

    async fn frontmost_application(&self) -> Result<Application, ProviderError>;

    /// URL of the active tab of `browser`
    async fn browser_url(&self, browser: &str) -> Result<String, ProviderError>;

    /// Text the user typed into the host's input field
    async fn user_input(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("user input"))
    }
}

/// Provider backed by the operating system's own tools
///
/// macOS uses `pbpaste`/`pbcopy` and automation scripts; elsewhere the
/// clipboard goes through `wl-paste`/`xclip` and the rest is unsupported.
#[derive(Debug, Clone)]
pub struct SystemContextProvider {
    bridge: ScriptBridge,
}

impl SystemContextProvider {
    pub fn new(bridge: ScriptBridge) -> Self {
        Self { bridge }
    }

    fn is_macos() -> bool {
        cfg!(target_os = "macos")
    }
}

const SELECTED_TEXT_SCRIPT: &str = r#"
set previousClipboard to the clipboard
set the clipboard to ""
tell application "System Events" to keystroke "c" using command down
delay 0.1
set selectedText to the clipboard as text
set the clipboard to previousClipboard
return selectedText"#;

const SELECTED_FILES_SCRIPT: &str = r#"
set paths to {}
tell application "Finder"
    repeat with f in (get selection as alias list)
        set end of paths to POSIX path of f
    end repeat
end tell
set AppleScript's text item delimiters to linefeed
return paths as text"#;

const FRONTMOST_APP_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to first application process whose frontmost is true
    return (name of frontApp) & linefeed & (POSIX path of (file of frontApp as alias))
end tell"#;

#[async_trait]
impl ContextProvider for SystemContextProvider {
    async fn clipboard_text(&self) -> Result<String, ProviderError> {
        debug!("SystemContextProvider::clipboard_text: called");
        if Self::is_macos() {
            return Ok(self.bridge.command("pbpaste", &[]).await?);
        }
        match self.bridge.command("wl-paste", &["--no-newline"]).await {
            Ok(text) => Ok(text),
            Err(_) => Ok(self.bridge.command("xclip", &["-selection", "clipboard", "-o"]).await?),
        }
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), ProviderError> {
        debug!(len = text.len(), "SystemContextProvider::write_clipboard: called");
        if !Self::is_macos() {
            return Err(ProviderError::Unsupported("clipboard writes"));
        }
        let script = format!("set the clipboard to \"{}\"", browser::escape_applescript(text));
        self.bridge.applescript(&script).await?;
        Ok(())
    }

    async fn selected_text(&self) -> Result<String, ProviderError> {
        debug!("SystemContextProvider::selected_text: called");
        if !Self::is_macos() {
            return Err(ProviderError::Unsupported("selected text"));
        }
        Ok(self.bridge.applescript(SELECTED_TEXT_SCRIPT).await?)
    }

    async fn selected_files(&self) -> Result<Vec<String>, ProviderError> {
        debug!("SystemContextProvider::selected_files: called");
        if !Self::is_macos() {
            return Err(ProviderError::Unsupported("file selection"));
        }
        let listing = self.bridge.applescript(SELECTED_FILES_SCRIPT).await?;
        Ok(listing.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    async fn frontmost_application(&self) -> Result<Application, ProviderError> {
        debug!("SystemContextProvider::frontmost_application: called");
        if !Self::is_macos() {
            return Err(ProviderError::Unsupported("frontmost application"));
        }
        let out = self.bridge.applescript(FRONTMOST_APP_SCRIPT).await?;
        let mut lines = out.lines();
        Ok(Application {
            name: lines.next().unwrap_or_default().to_string(),
            path: lines.next().unwrap_or_default().to_string(),
        })
    }

    async fn browser_url(&self, app: &str) -> Result<String, ProviderError> {
        debug!(%app, "SystemContextProvider::browser_url: called");
        let Some(script) = browser::url_script(app) else {
            return Err(ProviderError::Unsupported("URL lookup outside a browser"));
        };
        Ok(self.bridge.applescript(&script).await?)
    }
}

/// Provider holding fixed values
///
/// Used by hosts that already know the state and by tests. Counts clipboard
/// reads so callers can check how often a directive ran.
#[derive(Debug, Default)]
pub struct StaticContextProvider {
    clipboard: Mutex<Option<String>>,
    selected_text: Option<String>,
    selected_files: Vec<String>,
    application: Option<Application>,
    url: Option<String>,
    input: Option<String>,
    clipboard_reads: AtomicUsize,
}

impl StaticContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipboard(self, text: impl Into<String>) -> Self {
        if let Ok(mut clipboard) = self.clipboard.lock() {
            *clipboard = Some(text.into());
        }
        self
    }

    pub fn with_selected_text(mut self, text: impl Into<String>) -> Self {
        self.selected_text = Some(text.into());
        self
    }

    pub fn with_selected_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selected_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_application(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.application = Some(Application {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Number of clipboard reads so far
    pub fn clipboard_reads(&self) -> usize {
        self.clipboard_reads.load(Ordering::SeqCst)
    }

    /// Last text written to (or seeded into) the clipboard
    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.lock().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl ContextProvider for StaticContextProvider {
    async fn clipboard_text(&self) -> Result<String, ProviderError> {
        self.clipboard_reads.fetch_add(1, Ordering::SeqCst);
        self.clipboard().ok_or(ProviderError::Unsupported("clipboard"))
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), ProviderError> {
        let mut clipboard = self
            .clipboard
            .lock()
            .map_err(|_| ProviderError::Unsupported("clipboard writes"))?;
        *clipboard = Some(text.to_string());
        Ok(())
    }

    async fn selected_text(&self) -> Result<String, ProviderError> {
        self.selected_text.clone().ok_or(ProviderError::Unsupported("selected text"))
    }

    async fn selected_files(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.selected_files.clone())
    }

    async fn frontmost_application(&self) -> Result<Application, ProviderError> {
        self.application
            .clone()
            .ok_or(ProviderError::Unsupported("frontmost application"))
    }

    async fn browser_url(&self, _browser: &str) -> Result<String, ProviderError> {
        self.url.clone().ok_or(ProviderError::Unsupported("browser URL"))
    }

    async fn user_input(&self) -> Result<String, ProviderError> {
        self.input.clone().ok_or(ProviderError::Unsupported("user input"))
    }
}
