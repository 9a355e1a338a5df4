//! Session store.
//!
//! `SessionStore` is the `get`/`put`/`list` contract any backing store must
//! satisfy. It makes no atomicity promise across calls: read-modify-write
//! serialization per session is the lifecycle manager's job.

use crate::errors::SessionError;
use crate::models::Session;
use common::types::SessionId;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

/// Keyed collection of session records.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id.
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionError>;

    /// Insert or replace a session, keyed by `session.id`.
    async fn put(&self, session: Session) -> Result<(), SessionError>;

    /// All sessions, ordered by scheduled start then id.
    async fn list(&self) -> Result<Vec<Session>, SessionError>;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    #[instrument(skip_all, name = "session.repo.get", fields(session_id = %id))]
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    #[instrument(skip_all, name = "session.repo.put", fields(session_id = %session.id))]
    async fn put(&self, session: Session) -> Result<(), SessionError> {
        self.sessions.write().await.insert(session.id, session);
        Ok(())
    }

    #[instrument(skip_all, name = "session.repo.list")]
    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        let mut sessions: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.scheduled_start
                .cmp(&b.scheduled_start)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sessions)
    }
}
