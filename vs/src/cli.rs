//! CLI argument parsing for varstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vs")]
#[command(author, version, about = "Persistent variables and counters for placeholder templates", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the store file (overrides config)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all variables, least recently set first
    List,

    /// Print a variable's value (empty if unset)
    Get {
        /// Variable name
        #[arg(required = true)]
        name: String,
    },

    /// Create or update a variable
    Set {
        /// Variable name
        #[arg(required = true)]
        name: String,

        /// New value
        #[arg(required = true)]
        value: String,
    },

    /// Restore a variable to the value it was created with
    Reset {
        /// Variable name
        #[arg(required = true)]
        name: String,
    },

    /// Delete a variable
    Delete {
        /// Variable name
        #[arg(required = true)]
        name: String,
    },

    /// Add one to a counter and print the new value
    Increment {
        /// Counter identifier
        #[arg(required = true)]
        id: String,
    },

    /// Subtract one from a counter and print the new value
    Decrement {
        /// Counter identifier
        #[arg(required = true)]
        id: String,
    },
}
