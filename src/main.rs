//! stress-lens - Main Entry Point

use clap::Parser;
use stress_lens::cli::{cmd_categories, cmd_insights, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stress_lens=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, config, json } => {
            cmd_train(&data, config.as_deref(), json)?;
        }
        Commands::Predict { data, config, input } => {
            cmd_predict(&data, config.as_deref(), input.into())?;
        }
        Commands::Categories { data } => {
            cmd_categories(&data)?;
        }
        Commands::Insights { data, json } => {
            cmd_insights(&data, json)?;
        }
    }

    Ok(())
}
