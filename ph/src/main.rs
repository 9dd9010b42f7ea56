//! ph - placeholder substitution
//!
//! CLI entry point for rendering templates and inspecting directives.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context as _, Result};
use serde_json::json;
use tracing::{debug, info};

use placeholders::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use placeholders::config::Config;
use placeholders::context::SELECTED_FILES_KEY;
use placeholders::registry::{Registry, Tier};
use placeholders::{
    Context, ContextProvider, DirectiveRef, Environment, ScriptBridge, SubstitutionEngine, SystemContextProvider, custom,
    run_action_script,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here yet; the subscriber is not installed
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(custom = config.custom.len(), store = %config.store.path.display(), "Loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Render {
            template,
            file,
            set,
            selected_files,
            show_context,
        } => {
            debug!(?file, seeds = set.len(), "main: matched Render command");
            let template = read_template(template, file)?;
            cmd_render(&config, &template, set, selected_files, show_context).await
        }
        Command::Directives { format } => {
            debug!(%format, "main: matched Directives command");
            cmd_directives(&config, format)
        }
        Command::Action {
            script,
            response,
            copy_error,
        } => {
            debug!(copy_error, "main: matched Action command");
            cmd_action(&config, &script, &response, copy_error).await
        }
    }
}

/// Template from the argument, a file, or stdin
fn read_template(template: Option<String>, file: Option<PathBuf>) -> Result<String> {
    debug!(has_template = template.is_some(), ?file, "read_template: called");
    if let Some(template) = template {
        return Ok(template);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path).context(format!("Failed to read template {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read template from stdin")?;
    Ok(buf)
}

/// Render one template and print it
async fn cmd_render(
    config: &Config,
    template: &str,
    seeds: Vec<(String, String)>,
    selected_files: Option<String>,
    show_context: bool,
) -> Result<()> {
    debug!(template_len = template.len(), "cmd_render: called");
    let env = Environment::from_config(config)?;
    let engine = SubstitutionEngine::new(env).with_limits(config.engine.clone());
    let custom = custom::from_config(&config.custom);

    let mut seed: Context = seeds.into_iter().collect();
    if let Some(files) = selected_files {
        seed.insert(SELECTED_FILES_KEY, files);
    }

    let rendered = engine.bulk_apply(template, seed, &custom).await;
    println!("{}", rendered.text);

    if show_context {
        let context = serde_json::to_string_pretty(&rendered.context).context("Failed to serialize context")?;
        eprintln!("{}", "Context:".bold());
        eprintln!("{}", context);
    }
    Ok(())
}

/// List built-in and configured directives
fn cmd_directives(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(%format, "cmd_directives: called");
    let registry = Registry::builtin();
    let custom = custom::from_config(&config.custom);

    let mut rows: Vec<(Tier, &DirectiveRef)> = custom.iter().map(|d| (Tier::Custom, d)).collect();
    rows.extend(registry.iter());

    match format {
        OutputFormat::Json => {
            let listing: Vec<_> = rows
                .iter()
                .map(|(tier, d)| {
                    json!({
                        "name": d.name(),
                        "tier": tier.to_string(),
                        "description": d.description(),
                        "resultKeys": d.result_keys(),
                        "dependencies": d.dependencies(),
                        "constant": d.constant(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            let mut current = None;
            for (tier, directive) in rows {
                if current != Some(tier) {
                    println!("\n{}", tier.to_string().bold());
                    current = Some(tier);
                }
                let mut flags = Vec::new();
                if directive.constant() {
                    flags.push("constant".to_string());
                }
                if !directive.dependencies().is_empty() {
                    flags.push(format!("after {}", directive.dependencies().join(", ")));
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join("; ")).dimmed().to_string()
                };
                println!("  {:<22} {}{}", directive.name().green(), directive.description(), flags);
            }
        }
    }
    Ok(())
}

/// Run an action script, reporting failure to the user
async fn cmd_action(config: &Config, script: &str, response: &str, copy_error: bool) -> Result<()> {
    debug!(copy_error, "cmd_action: called");
    let script = if std::path::Path::new(script).is_file() {
        fs::read_to_string(script).context(format!("Failed to read action script {}", script))?
    } else {
        script.to_string()
    };

    let bridge = ScriptBridge::new(config.scripts.clone());
    match run_action_script(&bridge, &script, response).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.title.red().bold());
            eprintln!("{}", failure.source);
            if copy_error {
                let provider = SystemContextProvider::new(bridge);
                match provider.write_clipboard(&failure.details()).await {
                    Ok(()) => eprintln!("{}", "Error copied to clipboard".dimmed()),
                    Err(e) => eprintln!("{} {}", "Could not copy error:".yellow(), e),
                }
            }
            std::process::exit(1);
        }
    }
}
