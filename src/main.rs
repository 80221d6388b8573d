//! Enkel CLI entry point.

use anyhow::Result;
use clap::Parser;
use enkel::cli::{commands, default_log_filter, Cli, Commands};
use enkel::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // OPENAI_API_KEY may live in a .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            default_log_filter(cli.verbose, &settings.general.log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Ask {
            question,
            source,
            file,
            model,
            top_k,
        } => {
            commands::run_ask(question, source, file.clone(), model.clone(), *top_k, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
