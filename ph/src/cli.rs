//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// ph - placeholder substitution for AI prompts
#[derive(Parser)]
#[command(
    name = "ph",
    about = "Render prompt templates with live placeholder values",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a template and print the result
    Render {
        /// Template text (reads --file or stdin when omitted)
        template: Option<String>,

        /// Read the template from a file
        #[arg(short, long, conflicts_with = "template")]
        file: Option<PathBuf>,

        /// Seed a context value
        #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,

        /// Comma-separated selected file paths
        #[arg(long, value_name = "PATHS")]
        selected_files: Option<String>,

        /// Print the final context as JSON after the text
        #[arg(long)]
        show_context: bool,
    },

    /// List registered directives
    Directives {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run an action script against a response
    Action {
        /// Script text, or a path to a script file
        #[arg(short, long)]
        script: String,

        /// The response the script acts on
        #[arg(short, long)]
        response: String,

        /// Put the error details on the clipboard when the script fails
        #[arg(long)]
        copy_error: bool,
    },
}

/// Parse `KEY=VALUE`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_key_value: called");
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Expected KEY=VALUE, got '{}'", s)),
    }
}

/// Result of checking a script interpreter
pub struct ToolCheck {
    pub name: &'static str,
    pub path: Option<String>,
}

impl ToolCheck {
    /// Look a program up on PATH
    pub fn check(name: &'static str) -> Self {
        debug!(name, "ToolCheck::check: called");
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("command -v {name}"))
            .output();

        let path = match output {
            Ok(output) if output.status.success() => {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!found.is_empty()).then_some(found)
            }
            _ => None,
        };
        debug!(name, ?path, "ToolCheck::check: done");
        Self { name, path }
    }
}

/// Check the interpreters the script directives call
pub fn check_script_tools() -> Vec<ToolCheck> {
    debug!("check_script_tools: called");
    vec![ToolCheck::check("osascript"), ToolCheck::check("sh"), ToolCheck::check("say")]
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("placeholders")
        .join("logs")
        .join("placeholders.log")
}

/// Generate the after_help text with interpreter checks
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Script Interpreters:\n");
    for tool in check_script_tools() {
        let icon = if tool.path.is_some() { "\u{2705}" } else { "\u{274C}" };
        let location = tool.path.as_deref().unwrap_or("not found");
        help.push_str(&format!("  {} {:<10} {}\n", icon, tool.name, location));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for listings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_render() {
        let cli = Cli::parse_from(["ph", "render", "hello {{date}}", "-s", "input=hi", "--show-context"]);
        match cli.command {
            Command::Render {
                template,
                set,
                show_context,
                ..
            } => {
                assert_eq!(template.as_deref(), Some("hello {{date}}"));
                assert_eq!(set, vec![("input".to_string(), "hi".to_string())]);
                assert!(show_context);
            }
            other => panic!("expected Render, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_render_file() {
        let cli = Cli::parse_from(["ph", "render", "--file", "prompt.txt", "--selected-files", "a.png,b.txt"]);
        assert!(matches!(
            cli.command,
            Command::Render {
                file: Some(_),
                selected_files: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_directives_json() {
        let cli = Cli::parse_from(["ph", "directives", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Command::Directives {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_cli_parse_action() {
        let cli = Cli::parse_from(["ph", "action", "-s", "return response", "-r", "text", "--copy-error"]);
        assert!(matches!(cli.command, Command::Action { copy_error: true, .. }));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["ph", "-l", "debug", "directives", "-c", "/tmp/ph.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ph.yml")));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path_location() {
        assert!(get_log_path().ends_with("placeholders/logs/placeholders.log"));
    }
}
