use async_trait::async_trait;
use thiserror::Error;

use fareflow_core::domain::session::SessionContext;

pub mod session;

pub use session::{InMemorySessionRepository, SqlSessionRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session `{session_id}` holds unreadable context: {source}")]
    Corrupt {
        session_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence seam for conversation state. `put` stamps a fresh expiry on
/// every write, so any activity on a session keeps it alive.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<SessionContext>, RepositoryError>;

    async fn put(
        &self,
        session_id: &str,
        context: &SessionContext,
        ttl_secs: u64,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, session_id: &str) -> Result<(), RepositoryError>;
}
