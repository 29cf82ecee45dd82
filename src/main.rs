//! Social Confidence terminal front end

mod app;
mod cli;
mod commands;
mod config;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::App;
use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli);
    tracing::debug!(data_dir = %config.data_dir.display(), endpoint = %config.endpoint, "starting");

    let mut app = App::open(&config, cli.system_scheme).await?;
    if let Err(e) = commands::run(&mut app, cli.command).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
