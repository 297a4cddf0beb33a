//! Live-query fan-out.
//!
//! Producer tasks listen to the store's change feed, re-read the store, and
//! publish full snapshots into a watch channel. Consumers treat every
//! emission as the authoritative current state: snapshots are monotonic in
//! store time and intermediate states may be coalesced. Cancellation is
//! explicit, and dropping a handle stops the producer too.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Conversation, Message};
use crate::store::{ChatStore, StoreEvent};

/// Handle to a live snapshot stream.
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone> LiveQuery<T> {
    pub(crate) fn new(rx: watch::Receiver<T>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Latest snapshot, without waiting.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next snapshot. Returns None once the producer has
    /// stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Stops delivery. Idempotent; also happens on drop.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct Fanout {
    store: Arc<dyn ChatStore>,
}

impl Fanout {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Full ordered message list of one conversation, re-delivered on every
    /// change.
    pub async fn subscribe_messages(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<LiveQuery<Vec<Message>>> {
        // Subscribe before the initial read so no change can fall between.
        let mut events = self.store.events();
        let initial = self.store.messages(conversation_id).await?;
        let (tx, rx) = watch::channel(initial);
        let store = Arc::clone(&self.store);
        let task = tokio::spawn(async move {
            loop {
                let refresh = tokio::select! {
                    _ = tx.closed() => break,
                    event = events.recv() => match event {
                        Ok(StoreEvent::MessagesChanged { conversation_id: id }) => {
                            id == conversation_id
                        }
                        Ok(_) => false,
                        // On lag, resync unconditionally; the re-read is
                        // authoritative.
                        Err(RecvError::Lagged(_)) => true,
                        Err(RecvError::Closed) => break,
                    },
                };
                if !refresh {
                    continue;
                }
                if let Ok(snapshot) = store.messages(conversation_id).await {
                    tx.send_replace(snapshot);
                }
            }
        });
        Ok(LiveQuery::new(rx, task))
    }

    /// Live list of the user's conversations, ordered by `updated_at`
    /// descending.
    pub async fn subscribe_conversations(
        &self,
        user_id: Uuid,
    ) -> AppResult<LiveQuery<Vec<Conversation>>> {
        let mut events = self.store.events();
        let initial = self.store.conversations_for_user(user_id).await?;
        let (tx, rx) = watch::channel(initial);
        let store = Arc::clone(&self.store);
        let task = tokio::spawn(async move {
            loop {
                let refresh = tokio::select! {
                    _ = tx.closed() => break,
                    event = events.recv() => match event {
                        Ok(StoreEvent::ConversationChanged { .. }) => true,
                        Ok(_) => false,
                        Err(RecvError::Lagged(_)) => true,
                        Err(RecvError::Closed) => break,
                    },
                };
                if !refresh {
                    continue;
                }
                if let Ok(snapshot) = store.conversations_for_user(user_id).await {
                    tx.send_replace(snapshot);
                }
            }
        });
        Ok(LiveQuery::new(rx, task))
    }
}
