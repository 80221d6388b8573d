//! CLI module for Enkel.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Enkel - question answering over a PDF or Wikipedia
///
/// Answers one question at a time from a single PDF or a Wikipedia search.
/// The name "Enkel" is the Norwegian/Scandinavian word for "simple."
#[derive(Parser, Debug)]
#[command(name = "enkel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about a PDF or Wikipedia
    Ask {
        /// The question to ask
        question: String,

        /// Where to look for the answer (document, wikipedia)
        #[arg(short, long, default_value = "document")]
        source: String,

        /// PDF to answer from (defaults to the single file in the upload directory)
        #[arg(short, long)]
        file: Option<String>,

        /// Chat model to use for the answer
        #[arg(short, long)]
        model: Option<String>,

        /// Number of context chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start the web interface
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Log filter used when `RUST_LOG` is unset.
///
/// `-v` flags override the configured level: one for info, two for debug, more for trace.
pub fn default_log_filter(verbose: u8, configured: &str) -> String {
    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("enkel={}", level)
}
