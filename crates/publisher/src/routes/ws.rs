use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::registry::SubscriberRegistry;
use crate::AppState;

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/", get(ws_bars_handler))
}

/// WebSocket endpoint streaming one JSON bar per text frame.
async fn ws_bars_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state.registry))
}

async fn handle_ws(socket: WebSocket, registry: SubscriberRegistry) {
    let (id, mut bar_rx) = registry.subscribe().await;
    let subscribers = registry.len().await;
    info!(%id, subscribers, "Subscriber connected");

    let (mut sink, mut stream) = socket.split();

    // Writer: forwards broadcast bars until the registry lets go of us.
    let mut writer = tokio::spawn(async move {
        while let Some(message) = bar_rx.recv().await {
            if sink.send(Message::Text(message)).await.is_err() {
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    // Reader: only watches for the client going away.
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Close(_) => break,
                other => debug!(?other, "Ignoring client message"),
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    registry.unregister(id).await;
    let subscribers = registry.len().await;
    info!(%id, subscribers, "Subscriber disconnected");
}
