mod app;
mod board;
mod config;
mod error;
mod game;
mod menu;
mod message;
mod provider;
mod runtime;
mod session;
mod snake;
mod term;
mod view;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::message::Exit;
use crate::provider::RosterProvider;

/// Snake, except the food is pods and eating them deletes them.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML config file (defaults to $PODSNAKE_CONFIG, then built-in settings)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match start(args).await {
        Ok(exit) => ExitCode::from(exit.code() as u8),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn start(args: Args) -> Result<Exit> {
    let path = config::resolve_path(args.config);
    let config = Config::load(path.as_deref()).context("failed to load configuration")?;
    init_tracing(&config)?;

    let label = path.as_ref().map_or_else(|| "built-in defaults".to_owned(), |p| p.display().to_string());
    info!(config = %label, cluster = %config.cluster, "starting podsnake");

    runtime::run::<RosterProvider>(config, label).await
}

/// The terminal belongs to the game, so logs only go somewhere when the config
/// names a file for them.
fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };

    let file = File::create(path).with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(err) = installed {
        debug!(%err, "keeping the tracing subscriber already in place");
    }
    Ok(())
}
