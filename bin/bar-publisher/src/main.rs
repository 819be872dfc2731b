use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::Config;
use publisher::{AppState, Publisher, SubscriberRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // ── Listener ──────────────────────────────────────────────────────────────
    let listener = match TcpListener::bind(cfg.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %cfg.bind_address(), error = %e, "Failed to bind stream listener");
            return ExitCode::FAILURE;
        }
    };

    let registry = SubscriberRegistry::new();
    let server = tokio::spawn(publisher::serve(
        AppState {
            registry: registry.clone(),
        },
        listener,
    ));

    // ── Replay ────────────────────────────────────────────────────────────────
    let publisher = Publisher::new(registry.clone(), cfg.interval);
    let replay = async {
        let path = cfg.resolve_dataset()?;
        publisher.replay(path).await
    };

    tokio::select! {
        outcome = replay => match outcome {
            Ok(summary) => {
                let closed = registry.close_all().await;
                info!(?summary, closed, "Replay finished, subscriber connections closed");
            }
            Err(e) => {
                error!(error = %e, "Dataset not available, nothing was streamed");
                server.abort();
                return ExitCode::FAILURE;
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
            server.abort();
            return ExitCode::SUCCESS;
        }
    }

    // No more bars to send; keep the endpoint up until interrupted.
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received. Exiting.");
    server.abort();
    ExitCode::SUCCESS
}
