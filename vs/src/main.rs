use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use varstore::VariableStore;
use varstore::cli::{Cli, Command};
use varstore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("varstore starting with {}", store_path.display());
    let store = VariableStore::open(&store_path)?;

    match cli.command {
        Command::List => {
            let vars = store.list()?;
            if vars.is_empty() {
                println!("No variables found");
            } else {
                for var in vars {
                    println!(
                        "{} = {} {}",
                        var.name.cyan(),
                        var.value,
                        format!("(initial: {})", var.initial_value).dimmed()
                    );
                }
            }
        }
        Command::Get { name } => {
            println!("{}", store.get(&name)?);
        }
        Command::Set { name, value } => {
            store.set(&name, &value)?;
            println!("{} Set {}", "✓".green(), name.cyan());
        }
        Command::Reset { name } => {
            let value = store.reset(&name)?;
            println!("{}", value);
        }
        Command::Delete { name } => {
            store.delete(&name)?;
            println!("{} Deleted {}", "✓".green(), name);
        }
        Command::Increment { id } => {
            println!("{}", store.increment(&id)?);
        }
        Command::Decrement { id } => {
            println!("{}", store.decrement(&id)?);
        }
    }

    Ok(())
}
