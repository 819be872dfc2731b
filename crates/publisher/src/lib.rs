pub mod publisher;
pub mod registry;
pub mod routes;
pub mod source;

pub use publisher::{paced_bars, PublishSummary, Publisher};
pub use registry::{SubscriberId, SubscriberRegistry};
pub use source::BarSource;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use common::Result;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: SubscriberRegistry,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .with_state(state)
}

/// Accept subscriber connections on `listener` until the task is dropped.
pub async fn serve(state: AppState, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Bar stream listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
