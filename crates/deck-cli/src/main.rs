mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use deck_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Publish {
            plan,
            folder,
            review,
            json,
        } => commands::publish::handle(&config, plan, folder, review, json).await,
        cli::Commands::Resume {
            batch,
            approve,
            reject,
            json,
        } => commands::resume::handle(&config, batch, approve, reject, json).await,
        cli::Commands::Status { batch } => commands::status::handle(&config, batch).await,
        cli::Commands::Verify {
            folder,
            count,
            manifest,
        } => commands::verify::handle(&config, folder, count, manifest).await,
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config),
    }
}
