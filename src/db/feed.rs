//! Change feed behind collection snapshot listeners.
//!
//! Every committed write publishes a `ChangeEvent` on a broadcast channel.
//! A `Subscription` filters that channel down to one collection. Active
//! subscriptions are tracked by id so they can be cancelled one at a time
//! or all at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::models::enums::Collection;

/// Broadcast buffer. Slow listeners past this many events get a resync.
const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// Events were dropped; the listener should reload the full snapshot.
    Resync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub id: Option<String>,
}

type ListenerMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<()>>>>;

pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    listeners: ListenerMap,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            listeners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is not an error: nobody is listening yet.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, collection: Collection) -> Subscription {
        let id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        if let Ok(mut map) = self.listeners.lock() {
            map.insert(id, cancel_tx);
        }
        tracing::debug!(subscription = %id, collection = collection.as_str(), "Listener attached");
        Subscription {
            id,
            collection,
            events: self.tx.subscribe(),
            cancelled: cancel_rx,
            finished: false,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Cancel one subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: &Uuid) -> bool {
        match self.listeners.lock() {
            Ok(mut map) => map.remove(id).is_some(),
            Err(_) => false,
        }
    }

    /// Cancel every active subscription. Returns how many were cancelled.
    pub fn unsubscribe_all(&self) -> usize {
        match self.listeners.lock() {
            Ok(mut map) => {
                let n = map.len();
                map.clear();
                if n > 0 {
                    tracing::info!(count = n, "All listeners detached");
                }
                n
            }
            Err(_) => 0,
        }
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// A live listener on one collection.
///
/// Dropping the subscription detaches it from the registry.
pub struct Subscription {
    pub id: Uuid,
    collection: Collection,
    events: broadcast::Receiver<ChangeEvent>,
    cancelled: oneshot::Receiver<()>,
    finished: bool,
    listeners: ListenerMap,
}

impl Subscription {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Wait for the next change to this collection.
    ///
    /// Returns `None` once the subscription has been cancelled or the
    /// store has been dropped.
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        if self.finished {
            return None;
        }
        loop {
            tokio::select! {
                _ = &mut self.cancelled => {
                    self.finished = true;
                    return None;
                }
                received = self.events.recv() => match received {
                    Ok(event) if event.collection == self.collection => return Some(event),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(subscription = %self.id, skipped, "Listener lagged, forcing resync");
                        return Some(ChangeEvent {
                            collection: self.collection,
                            kind: ChangeKind::Resync,
                            id: None,
                        });
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        self.finished = true;
                        return None;
                    }
                },
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut map) = self.listeners.lock() {
            map.remove(&self.id);
        }
    }
}
