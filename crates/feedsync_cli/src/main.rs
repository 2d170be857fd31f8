//! feedsync CLI
//!
//! Command-line tools for feedsync cache files.
//!
//! # Commands
//!
//! - `inspect` - Display cache statistics
//! - `dump` - List cached items
//! - `show-all` - Promote staged items
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// feedsync cache tools.
#[derive(Parser)]
#[command(name = "feedsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the cache file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display cache statistics
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List cached items, newest first
    Dump {
        /// List staged items instead of visible ones
        #[arg(long)]
        hidden: bool,

        /// Maximum number of items to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Make every staged item visible
    ShowAll,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Cache path required for inspect")?;
            commands::inspect::run(&path, format).await?;
        }
        Commands::Dump {
            hidden,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Cache path required for dump")?;
            commands::dump::run(&path, hidden, limit, format).await?;
        }
        Commands::ShowAll => {
            let path = cli.path.ok_or("Cache path required for show-all")?;
            commands::show_all::run(&path).await?;
        }
        Commands::Version => {
            println!("feedsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
