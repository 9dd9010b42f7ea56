//! Error types for directive evaluation and script execution

use thiserror::Error;

/// Failures inside a single directive
///
/// None of these escape a substitution call: the engine logs them and
/// substitutes an empty string, so the rest of the template still renders.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// The value the directive reads is not there (no clipboard, no browser, no selection)
    #[error("Lookup unavailable: {0}")]
    LookupUnavailable(String),

    /// The token matched but lacks a required piece (body, argument)
    #[error("Malformed directive {name}: {reason}")]
    Malformed { name: String, reason: String },

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] eyre::Report),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DirectiveError {
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::LookupUnavailable(what.into())
    }

    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is an expected, silent miss rather than a failure
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::LookupUnavailable(_) | Self::Malformed { .. } | Self::Provider(ProviderError::Unsupported(_))
        )
    }
}

/// Failures of an external or sandboxed script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit { program: String, code: i32, stderr: String },

    #[error("Script timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Sandboxed script failed: {0}")]
    Sandbox(String),

    #[error("Script task failed: {0}")]
    Join(String),
}

/// Failures of the context provider (clipboard, selection, frontmost app)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// An action script failed after a response was produced
///
/// Unlike directive errors this one is shown to the user.
#[derive(Debug, Error)]
#[error("{title}: {source}")]
pub struct ActionScriptFailure {
    pub title: String,
    #[source]
    pub source: ScriptError,
}

impl ActionScriptFailure {
    /// Full text to put on the clipboard when the user asks to copy the error
    pub fn details(&self) -> String {
        format!("{}\n\n{}", self.title, self.source)
    }
}
