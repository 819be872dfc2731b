use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, Error};
use strategy::{StrategyFileConfig, StrategySet};
use subscriber::BarSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::ConnectionRefused(url)) => {
            error!(%url, "No bar stream reachable. Start the publisher first.");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Trend bot stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> common::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    let strategy_file = match &cfg.strategy_config_path {
        Some(path) => StrategyFileConfig::load(path)?,
        None => StrategyFileConfig::single_trend(),
    };

    // ── Strategies ────────────────────────────────────────────────────────────
    let mut strategies = StrategySet::from_config(&strategy_file, cfg.initial_cash)?;
    info!(count = strategies.len(), "Start trading...");

    // ── Stream ────────────────────────────────────────────────────────────────
    let subscription = BarSubscriber::new(&cfg.stream_url())?.connect().await?;
    let session = subscription
        .run(|bar| {
            strategies.on_bar(&bar);
        })
        .await?;

    info!(
        received = session.received,
        malformed = session.malformed,
        termination = ?session.termination,
        "Bar stream ended"
    );
    strategies.report();
    Ok(())
}
