//! Fans deployment updates out to the agents subscribed to a deployment.
//!
//! A publish is a full round trip: [`Broadcaster::send`] hands the message to
//! every subscriber and only completes once each subscriber has acknowledged
//! it on its response channel (or has gone away). Both channels hold a single
//! message, so a subscriber can never have more than one update outstanding.

use crate::{FileMeta, NginxPlusAction};
use ahash::AHashMap as HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

/// An update published to every agent of a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastMessage {
    /// Apply the given set of files.
    ConfigApply {
        files: Vec<FileMeta>,
        config_version: String,
    },

    /// Call the NGINX Plus API.
    ApiRequest(NginxPlusAction),
}

/// The subscriber's side of a subscription.
#[derive(Debug)]
pub struct SubscriberChannels {
    pub id: Uuid,

    /// Receives published messages. Closed when the broadcaster is closed.
    pub listen: mpsc::Receiver<BroadcastMessage>,

    /// Acknowledges the most recently received message.
    pub response: mpsc::Sender<()>,
}

#[derive(Debug, Default)]
pub struct Broadcaster {
    listeners: Mutex<Listeners>,
}

#[derive(Debug, Default)]
struct Listeners {
    by_id: HashMap<Uuid, Listener>,

    /// Once closed, new subscribers are handed an already-closed listen
    /// channel.
    closed: bool,
}

#[derive(Clone, Debug)]
struct Listener {
    listen: mpsc::Sender<BroadcastMessage>,
    responses: Arc<tokio::sync::Mutex<mpsc::Receiver<()>>>,
}

// === impl Broadcaster ===

impl Broadcaster {
    pub fn subscribe(&self) -> SubscriberChannels {
        let id = Uuid::new_v4();
        let (listen_tx, listen_rx) = mpsc::channel(1);
        let (response_tx, response_rx) = mpsc::channel(1);
        let mut listeners = self.listeners.lock();
        if listeners.closed {
            trace!(%id, "Subscribed to a closed broadcaster");
        } else {
            listeners.by_id.insert(
                id,
                Listener {
                    listen: listen_tx,
                    responses: Arc::new(tokio::sync::Mutex::new(response_rx)),
                },
            );
            trace!(%id, "Subscribed");
        }
        SubscriberChannels {
            id,
            listen: listen_rx,
            response: response_tx,
        }
    }

    pub fn cancel_subscription(&self, id: Uuid) {
        if self.listeners.lock().by_id.remove(&id).is_some() {
            trace!(%id, "Subscription canceled");
        }
    }

    /// Publishes a message to all current subscribers and waits for each of
    /// them to acknowledge it.
    ///
    /// Returns false if there were no subscribers.
    pub async fn send(&self, msg: BroadcastMessage) -> bool {
        let listeners = self
            .listeners
            .lock()
            .by_id
            .values()
            .cloned()
            .collect::<Vec<_>>();
        if listeners.is_empty() {
            return false;
        }

        futures::future::join_all(listeners.into_iter().map(|l| l.deliver(msg.clone()))).await;
        true
    }

    /// Drops all subscriptions, closing each subscriber's listen channel.
    /// Later subscriptions are closed as soon as they are made.
    pub fn close(&self) {
        let mut listeners = self.listeners.lock();
        listeners.closed = true;
        listeners.by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().by_id.is_empty()
    }
}

// === impl Listener ===

impl Listener {
    async fn deliver(self, msg: BroadcastMessage) {
        if self.listen.send(msg).await.is_err() {
            // The subscriber is gone.
            return;
        }
        // `None` means the subscriber went away without acknowledging.
        let _ = self.responses.lock().await.recv().await;
    }
}
