use std::cmp::max;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::fanout::LiveQuery;
use crate::store::{ChatStore, StoreEvent};

/// True when `signaled_at` is still inside the freshness window at `now`.
pub fn is_fresh(signaled_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(signaled_at).num_milliseconds() < window.as_millis() as i64
}

/// Ephemeral typing signals: a per-conversation map of userId to the moment
/// of their last keystroke. Entries are overwritten or removed, never
/// historized, and consumers apply the freshness window themselves even when
/// an entry is still stored.
pub struct PresenceService {
    store: Arc<dyn ChatStore>,
    window: Duration,
}

impl PresenceService {
    pub fn new(store: Arc<dyn ChatStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records or clears the user's typing signal. A keystroke refreshes the
    /// window; a send or explicit stop removes the entry.
    pub async fn set_typing(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        is_typing: bool,
    ) -> AppResult<()> {
        let signaled_at = is_typing.then(Utc::now);
        self.store.set_typing(conversation_id, user_id, signaled_at).await
    }

    /// One-shot evaluation of "anyone but `self_user` typing right now".
    pub async fn anyone_typing(&self, conversation_id: Uuid, self_user: Uuid) -> AppResult<bool> {
        let conversation = self
            .store
            .conversation(conversation_id)
            .await?
            .ok_or(AppError::NotFound("conversation"))?;
        let now = Utc::now();
        Ok(conversation
            .typing
            .iter()
            .any(|(user, at)| *user != self_user && is_fresh(*at, now, self.window)))
    }

    /// Boolean stream: true while any participant other than `self_user` has
    /// a fresh typing signal. A periodic re-check flips the value back to
    /// false once the window passes without new signals, independently of
    /// whether the stale entry is still stored.
    pub async fn subscribe_typing(
        &self,
        conversation_id: Uuid,
        self_user: Uuid,
    ) -> AppResult<LiveQuery<bool>> {
        let initial = self.anyone_typing(conversation_id, self_user).await?;
        let (tx, rx) = watch::channel(initial);
        let store = Arc::clone(&self.store);
        let window = self.window;
        let mut events = store.events();
        let period = max(window / 2, Duration::from_millis(50));

        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    event = events.recv() => match event {
                        Ok(StoreEvent::ConversationChanged { conversation_id: id })
                            if id == conversation_id => {}
                        Ok(_) => continue,
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                    _ = tick.tick() => {}
                }

                let now = Utc::now();
                let typing = match store.conversation(conversation_id).await {
                    Ok(Some(conversation)) => conversation
                        .typing
                        .iter()
                        .any(|(user, at)| *user != self_user && is_fresh(*at, now, window)),
                    _ => false,
                };
                tx.send_if_modified(|state| {
                    if *state != typing {
                        *state = typing;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Ok(LiveQuery::new(rx, task))
    }

    /// Background sweep removing typing entries that have been stale for a
    /// full extra window, so a crashed client cannot pin "typing" forever.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let window = self.window;
        let grace = chrono::Duration::milliseconds((window.as_millis() as i64) * 2);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(max(window, Duration::from_millis(250)));
            loop {
                tick.tick().await;
                let cutoff = Utc::now() - grace;
                match store.clear_stale_typing(cutoff).await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "swept stale typing signals"),
                    Err(e) => debug!(error = %e, "typing sweep failed"),
                }
            }
        })
    }
}
