//! # MenuRank CLI Module
//!
//! ## Available Commands
//!
//! - `categories` - List categories in an export file
//! - `view` - Show the ordered view of one category
//! - `reorder` - Reorder a category and write the patched file
//! - `server` - Start the HTTP server

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use menurank_core::{MenuRankError, primitives::DOWNLOAD_FILENAME};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// MenuRank - per-category display ranking for product export files
#[derive(Parser, Debug)]
#[command(name = "menurank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Configuration file (default: ./menurank.toml if present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List categories with entry counts
    Categories {
        /// Export document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show a category in display order
    View {
        /// Export document
        #[arg(short, long)]
        file: PathBuf,

        /// Category path, e.g. "SKLEP\Kurtki\Zimowe"
        #[arg(short, long)]
        category: String,
    },

    /// Reorder a category and write the patched document
    Reorder {
        /// Export document
        #[arg(short, long)]
        file: PathBuf,

        /// Category path
        #[arg(short, long)]
        category: String,

        /// New top-to-bottom order as comma-separated entry ids
        #[arg(long)]
        order: String,

        /// Priority given to the first entry (overrides config)
        #[arg(short, long)]
        base: Option<i64>,

        /// Output file
        #[arg(short, long, default_value = DOWNLOAD_FILENAME)]
        output: PathBuf,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Document to load at startup
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MenuRankError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Categories { file } => cmd_categories(&config, &file, json_mode),
        Commands::View { file, category } => cmd_view(&config, &file, &category, json_mode),
        Commands::Reorder {
            file,
            category,
            order,
            base,
            output,
        } => cmd_reorder(&config, &file, &category, &order, base, &output, json_mode),
        Commands::Server { host, port, file } => {
            cmd_server(&config, host, port, file.as_deref()).await
        }
    }
}
