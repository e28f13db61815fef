//! Session store with per-session write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::error;

use fareflow_core::domain::session::{SessionContext, SlotUpdate};

use crate::repositories::{RepositoryError, SessionRepository};

/// Front door for conversation state. Concurrent turns on the same session
/// serialize through a per-session lock so slot merges never interleave;
/// different sessions proceed independently.
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    ttl_secs: u64,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>, ttl_secs: u64) -> Self {
        Self { repository, ttl_secs, locks: Mutex::new(HashMap::new()) }
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(session_id.to_owned()).or_default())
    }

    /// Removes the lock entry once no task holds or waits on it. Anonymous
    /// requests mint fresh session ids, so entries must not outlive the turn
    /// that created them.
    fn evict_idle_lock(&self, session_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.get(session_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(session_id);
        }
    }

    /// Loads the session, merges the update in, and persists the result.
    /// When the backing store is unavailable the turn still gets a usable
    /// context built from the update alone, so a chat degrades rather than
    /// failing outright.
    pub async fn merge(&self, session_id: &str, update: &SlotUpdate) -> SessionContext {
        let lock = self.session_lock(session_id);
        let context = {
            let _guard = lock.lock().await;
            match self.repository.get(session_id).await {
                Ok(loaded) => {
                    let mut context = loaded.unwrap_or_default();
                    context.apply(update);
                    if let Err(err) =
                        self.repository.put(session_id, &context, self.ttl_secs).await
                    {
                        error!(
                            event_name = "session.save_failed",
                            session_id = %session_id,
                            error = %err,
                            "context changes will not survive this turn"
                        );
                    }
                    context
                }
                Err(err) => {
                    error!(
                        event_name = "session.load_failed",
                        session_id = %session_id,
                        error = %err,
                        "serving this turn from the update alone"
                    );
                    SessionContext::from_update(update)
                }
            }
        };
        drop(lock);
        self.evict_idle_lock(session_id);
        context
    }

    /// Re-loads the session under its lock, applies `mutate` to the stored
    /// context, and persists the result. Every write goes through the same
    /// lock as [`merge`](Self::merge), so slots merged by a concurrent turn
    /// are never overwritten by a stale snapshot.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> SessionContext
    where
        F: FnOnce(&mut SessionContext),
    {
        let lock = self.session_lock(session_id);
        let context = {
            let _guard = lock.lock().await;
            match self.repository.get(session_id).await {
                Ok(loaded) => {
                    let mut context = loaded.unwrap_or_default();
                    mutate(&mut context);
                    if let Err(err) =
                        self.repository.put(session_id, &context, self.ttl_secs).await
                    {
                        error!(
                            event_name = "session.save_failed",
                            session_id = %session_id,
                            error = %err,
                            "context changes will not survive this turn"
                        );
                    }
                    context
                }
                Err(err) => {
                    error!(
                        event_name = "session.load_failed",
                        session_id = %session_id,
                        error = %err,
                        "changes apply to a fresh context and are not persisted"
                    );
                    let mut context = SessionContext::default();
                    mutate(&mut context);
                    context
                }
            }
        };
        drop(lock);
        self.evict_idle_lock(session_id);
        context
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<SessionContext>, RepositoryError> {
        self.repository.get(session_id).await
    }

    pub async fn clear(&self, session_id: &str) -> Result<(), RepositoryError> {
        let lock = self.session_lock(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.repository.delete(session_id).await
        };
        drop(lock);
        self.evict_idle_lock(session_id);
        result
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
