//! Session storage backends.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

use fareflow_core::domain::session::SessionContext;

use super::{RepositoryError, SessionRepository};
use crate::DbPool;

/// SQLite-backed sessions. Context is stored as a JSON document; expired
/// rows are invisible to readers and swept opportunistically.
pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Removes rows past their expiry. Callers decide the cadence.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn get(&self, session_id: &str) -> Result<Option<SessionContext>, RepositoryError> {
        let row = sqlx::query(
            "SELECT context FROM sessions WHERE session_id = ? AND expires_at > ?",
        )
        .bind(session_id)
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let raw: String = row.get("context");
                let context =
                    serde_json::from_str(&raw).map_err(|source| RepositoryError::Corrupt {
                        session_id: session_id.to_owned(),
                        source,
                    })?;
                Ok(Some(context))
            }
        }
    }

    async fn put(
        &self,
        session_id: &str,
        context: &SessionContext,
        ttl_secs: u64,
    ) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(context).map_err(|source| RepositoryError::Corrupt {
            session_id: session_id.to_owned(),
            source,
        })?;
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs as i64);

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, context, expires_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (session_id) DO UPDATE SET
                context = excluded.context,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(raw)
        .bind(expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// HashMap-backed sessions for tests and single-process demos.
#[derive(Default)]
pub struct InMemorySessionRepository {
    entries: RwLock<HashMap<String, (SessionContext, DateTime<Utc>)>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, session_id: &str) -> Result<Option<SessionContext>, RepositoryError> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(session_id).and_then(|(context, expires_at)| {
            (*expires_at > Utc::now()).then(|| context.clone())
        }))
    }

    async fn put(
        &self,
        session_id: &str,
        context: &SessionContext,
        ttl_secs: u64,
    ) -> Result<(), RepositoryError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(session_id.to_owned(), (context.clone(), expires_at));
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(session_id);
        Ok(())
    }
}
