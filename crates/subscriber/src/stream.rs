use std::io;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

use common::{Bar, Error, Result};

/// How a session with the publisher ended. Both are normal terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The publisher closed the stream.
    ConnectionClosed,
    /// The connection dropped without a closing handshake.
    ConnectionReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Bars decoded and handed to the callback.
    pub received: u64,
    /// Messages dropped because they were not bars.
    pub malformed: u64,
    pub termination: Termination,
}

/// Client side of the bar stream.
///
/// A single `connect` either yields a live `Subscription` or fails; there
/// is no retry here. Reconnect policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct BarSubscriber {
    url: Url,
}

impl BarSubscriber {
    pub fn new(address: &str) -> Result<Self> {
        let url = Url::parse(address)
            .map_err(|e| Error::InvalidConfig(format!("invalid stream address '{address}': {e}")))?;
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Open the WebSocket. Nothing listening is `ConnectionRefused`.
    pub async fn connect(&self) -> Result<Subscription> {
        info!(url = %self.url, "Connecting to bar stream");
        match connect_async(self.url.as_str()).await {
            Ok((ws, _)) => {
                info!(url = %self.url, "Connected to bar stream");
                Ok(Subscription {
                    url: self.url.clone(),
                    ws,
                })
            }
            Err(WsError::Io(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                error!(url = %self.url, "Connection refused");
                Err(Error::ConnectionRefused(self.url.to_string()))
            }
            Err(e) => Err(Error::WebSocket(e.to_string())),
        }
    }
}

/// An open stream of bars.
pub struct Subscription {
    url: Url,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Subscription {
    /// Receive loop. Each bar is decoded and passed to `on_bar`, and the next
    /// message is not read until `on_bar` returns. Malformed messages are
    /// dropped. Returns once the publisher closes the stream.
    pub async fn run<F>(mut self, mut on_bar: F) -> Result<SessionSummary>
    where
        F: FnMut(Bar),
    {
        let mut received = 0u64;
        let mut malformed = 0u64;

        let termination = loop {
            let message = match self.ws.next().await {
                None => break Termination::ConnectionClosed,
                Some(Ok(message)) => message,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    break Termination::ConnectionClosed
                }
                Some(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake))) => {
                    break Termination::ConnectionReset
                }
                Some(Err(WsError::Io(e))) if is_disconnect(&e) => {
                    break Termination::ConnectionReset
                }
                Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
            };

            match message {
                Message::Text(text) => match Bar::from_message(&text) {
                    Ok(bar) => {
                        received += 1;
                        on_bar(bar);
                    }
                    Err(e) => {
                        malformed += 1;
                        warn!(error = %e, "Dropping message");
                    }
                },
                Message::Binary(bytes) => {
                    malformed += 1;
                    warn!(len = bytes.len(), "Dropping binary message");
                }
                Message::Close(frame) => {
                    debug!(?frame, "Close frame received");
                    let _ = self.ws.close(None).await;
                    break Termination::ConnectionClosed;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        };

        match termination {
            Termination::ConnectionClosed => {
                warn!(url = %self.url, received, malformed, "Connection closed")
            }
            Termination::ConnectionReset => {
                warn!(url = %self.url, received, malformed, "Connection reset by publisher")
            }
        }
        Ok(SessionSummary {
            received,
            malformed,
            termination,
        })
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// Connect to `address` and feed every bar to `on_bar` until the stream ends.
pub async fn subscribe<F>(address: &str, on_bar: F) -> Result<SessionSummary>
where
    F: FnMut(Bar),
{
    BarSubscriber::new(address)?.connect().await?.run(on_bar).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparsable_address() {
        assert!(matches!(
            BarSubscriber::new("not a url"),
            Err(Error::InvalidConfig(_))
        ));
        let sub = BarSubscriber::new("ws://127.0.0.1:12300/").unwrap();
        assert_eq!(sub.url().port(), Some(12300));
    }

    #[test]
    fn disconnect_kinds() {
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
