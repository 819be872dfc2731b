use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// Outgoing messages for one connection. Unbounded so the fan-out never
/// waits on a slow socket.
pub type SubscriberTx = mpsc::UnboundedSender<String>;
pub type SubscriberRx = mpsc::UnboundedReceiver<String>;

/// The set of currently connected stream consumers.
///
/// Each member is the sending half of a channel drained by that
/// connection's socket writer. Cloning the registry shares the same set.
/// Once `close_all` has run the stream is over: later registrations have
/// their channel closed on arrival.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    members: Arc<RwLock<HashMap<SubscriberId, SubscriberTx>>>,
    closed: Arc<AtomicBool>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection's channel to the set. After `close_all` the sender
    /// is dropped instead, so the connection ends straight away.
    pub async fn register(&self, tx: SubscriberTx) -> SubscriberId {
        let id = Uuid::new_v4();
        let mut members = self.members.write().await;
        if self.closed.load(Ordering::Acquire) {
            debug!(%id, "Stream already finished, closing new subscriber");
            return id;
        }
        members.insert(id, tx);
        debug!(%id, "Subscriber registered");
        id
    }

    /// Create a channel, register its sender and hand back the receiver.
    pub async fn subscribe(&self) -> (SubscriberId, SubscriberRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.register(tx).await;
        (id, rx)
    }

    /// Remove a member. Returns false if it was already gone.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.members.write().await.remove(&id).is_some();
        if removed {
            debug!(%id, "Subscriber unregistered");
        }
        removed
    }

    /// True once `close_all` has ended the stream.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Members at this instant. Later joins and leaves do not affect it.
    pub async fn snapshot(&self) -> Vec<(SubscriberId, SubscriberTx)> {
        self.members
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// Send `message` to every member of the current snapshot.
    ///
    /// A failed send only affects its own subscriber, which is dropped from
    /// the set. Returns the number of subscribers the message was queued for.
    pub async fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, tx) in self.snapshot().await {
            if tx.send(message.to_owned()).is_ok() {
                delivered += 1;
            } else {
                gone.push(id);
            }
        }
        if !gone.is_empty() {
            let mut members = self.members.write().await;
            for id in gone {
                members.remove(&id);
                debug!(%id, "Dropped subscriber with closed channel");
            }
        }
        delivered
    }

    /// Drop every member and refuse later ones. Connection writers see their
    /// channel close and shut their sockets down cleanly. Returns how many
    /// were removed.
    pub async fn close_all(&self) -> usize {
        let mut members = self.members.write().await;
        self.closed.store(true, Ordering::Release);
        let count = members.len();
        members.clear();
        count
    }
}
