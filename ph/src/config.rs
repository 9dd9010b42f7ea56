//! Placeholders configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Script bridge settings
    pub scripts: ScriptConfig,

    /// Persistent variable storage
    pub store: StoreConfig,

    /// Network access for url/weather/location directives
    pub network: NetworkConfig,

    /// Substitution engine limits
    pub engine: EngineConfig,

    /// User-defined placeholders
    pub custom: Vec<CustomPlaceholder>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .placeholders.yml
        let local_config = PathBuf::from(".placeholders.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/placeholders/placeholders.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("placeholders").join("placeholders.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => p.clone(),
            None => {
                let local = PathBuf::from(".placeholders.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()?.join("placeholders").join("placeholders.yml")
                }
            }
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Script bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Shell used by `{{shell:...}}` when no binary is given
    #[serde(rename = "default-shell")]
    pub default_shell: String,

    /// Export the login shell's PATH into shell scripts
    #[serde(rename = "export-login-path")]
    pub export_login_path: bool,

    /// Shell asked for the login PATH
    #[serde(rename = "login-shell")]
    pub login_shell: String,

    /// Wall-clock limit for sandboxed scripts
    #[serde(rename = "sandbox-timeout-ms")]
    pub sandbox_timeout_ms: u64,

    /// Operation limit for sandboxed scripts (0 = unlimited)
    #[serde(rename = "sandbox-max-operations")]
    pub sandbox_max_operations: u64,

    /// How long alerts and dialogs wait for the user
    #[serde(rename = "dialog-timeout-secs")]
    pub dialog_timeout_secs: u64,

    /// Optional limit for external processes (unset = wait forever)
    #[serde(rename = "process-timeout-ms")]
    pub process_timeout_ms: Option<u64>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            default_shell: "/bin/sh".to_string(),
            export_login_path: false,
            login_shell: std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string()),
            sandbox_timeout_ms: 1000,
            sandbox_max_operations: 0,
            dialog_timeout_secs: 30,
            process_timeout_ms: None,
        }
    }
}

/// Persistent variable storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding variables and counters
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: varstore::config::default_store_path(),
        }
    }
}

/// Network access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Allow directives to reach the network
    pub enabled: bool,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// User agent sent with requests
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Responses larger than this are rejected
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 30_000,
            user_agent: format!("placeholders/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 1_000_000,
        }
    }
}

/// Substitution engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluations of one directive before the engine gives up on it
    #[serde(rename = "max-passes-per-directive")]
    pub max_passes_per_directive: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes_per_directive: 1000,
        }
    }
}

/// A user-defined placeholder
///
/// `value` is a replacement template: `$1`..`$9` are positional arguments and
/// `$body` is the token body. It may contain other directive tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPlaceholder {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub constant: bool,
}
