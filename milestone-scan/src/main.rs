use anyhow::Result;
use clap::Parser;
use milestone_core::ExtractorConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Initialize tracing with appropriate verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = ExtractorConfig::load_or_default(cli.config.as_deref())?;

    // Process commands
    match cli.command {
        Commands::Extract(args) => {
            info!("Extract command: {:?}", args);
            cli::commands::extract::execute(args, config)?;
        }
        Commands::Validate(args) => {
            info!("Validate command: {:?}", args);
            cli::commands::validate::execute(args, config)?;
        }
        Commands::Capabilities => {
            info!("Capabilities command");
            cli::commands::capabilities::execute(config)?;
        }
        Commands::Timeline(args) => {
            info!("Timeline command: {:?}", args);
            cli::commands::timeline::execute(args, config)?;
        }
    }

    Ok(())
}
