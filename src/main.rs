#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use parley::Config;
use parley::app::dispatch::dispatch;
use parley::cli::commands::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_or_init()?;
    config.apply_env_overrides();
    config.validate()?;
    dispatch(cli, config).await
}
