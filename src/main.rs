use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use ibrood::cli::{self, Cli, Command};
use ibrood::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env();

    match args.command {
        Command::Serve { bind } => cli::run_serve(&config, bind).await,
        Command::Analyze { kind } => cli::run_analyze(&config, kind).await,
        Command::History { command } => cli::run_history(&config, command),
        Command::Health => cli::run_health(&config),
        Command::Seed => cli::run_seed(&config),
    }
}
