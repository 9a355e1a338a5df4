//! Session lifecycle manager.
//!
//! Owns every transition of a session record:
//!
//! - `create`: new `SCHEDULED` session
//! - `join`: gate check, then `IN_PROGRESS`; `actual_start` set once
//! - `end`: `COMPLETED` from any state; `actual_end` set once
//! - `list_recordings`: descriptors for ended, recorded sessions
//!
//! Mutations are read-modify-write against the [`SessionStore`] under a
//! per-session lock, so concurrent joins observe a single first transition.
//! Locks exist only for known sessions and are dropped from the table once
//! no caller holds them. A failed operation never writes.

use crate::config::Config;
use crate::errors::SessionError;
use crate::models::{
    CreateSessionRequest, ParticipantRole, RecordingDescriptor, Session, SessionFeatures,
    SessionStatus, DEFAULT_SESSION_TITLE,
};
use crate::observability::metrics;
use crate::repositories::SessionStore;
use crate::services::access_gate::{authorize, AccessDecision};
use crate::services::ids::{
    duration_minutes, generate_access_secret, join_url_for, recording_url_for, IdGenerator,
};
use chrono::Duration;
use common::clock::Clock;
use common::types::SessionId;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Settings the lifecycle manager derives from service configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Base for join links.
    pub join_base_url: String,
    /// Base for recording links.
    pub recording_base_url: String,
    /// Length of a session when no end is supplied.
    pub default_duration: Duration,
    /// How long a recording stays available after it is listed.
    pub recording_retention: Duration,
}

impl From<&Config> for LifecycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            join_base_url: config.join_base_url.clone(),
            recording_base_url: config.recording_base_url.clone(),
            default_duration: Duration::minutes(config.default_session_minutes),
            recording_retention: Duration::days(config.recording_retention_days),
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub session: Session,
    pub role: ParticipantRole,
    /// True only for the call that moved the session into `IN_PROGRESS`.
    pub first_join: bool,
}

/// Result of an end call.
#[derive(Debug, Clone)]
pub struct EndOutcome {
    pub session: Session,
    /// True only for the call that set `actual_end`.
    pub first_end: bool,
}

/// Coordinates session transitions over a store, a clock, and an id source.
pub struct LifecycleManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    settings: LifecycleSettings,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding read-modify-write of one session.
    async fn lock_for(&self, id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the table entry for `id` unless another caller still holds it.
    async fn release_lock(&self, id: SessionId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the table, one in `lock`.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Create a new scheduled session.
    ///
    /// # Errors
    ///
    /// - `BadRequest` if request fields are malformed
    /// - `InvalidSchedule` if the end is not after the start
    #[instrument(skip_all, name = "session.lifecycle.create")]
    pub async fn create(&self, request: CreateSessionRequest) -> Result<Session, SessionError> {
        let start = Instant::now();
        let result = self.create_inner(request).await;
        record("create", &result, start);
        result
    }

    async fn create_inner(&self, request: CreateSessionRequest) -> Result<Session, SessionError> {
        request
            .validate()
            .map_err(|msg| SessionError::BadRequest(msg.to_string()))?;

        let now = self.clock.now();
        let scheduled_start = request.scheduled_start.unwrap_or(now);
        let scheduled_end = match request.scheduled_end {
            Some(end) => end,
            None => scheduled_start
                .checked_add_signed(self.settings.default_duration)
                .ok_or_else(|| {
                    SessionError::InvalidSchedule("scheduledStart is out of range".to_string())
                })?,
        };

        if scheduled_end <= scheduled_start {
            warn!(
                target: "session.services.lifecycle",
                scheduled_start = %scheduled_start,
                scheduled_end = %scheduled_end,
                "Rejected session with non-positive duration"
            );
            return Err(SessionError::InvalidSchedule(
                "scheduledEnd must be after scheduledStart".to_string(),
            ));
        }

        let id = SessionId(self.ids.generate()?);
        let host_id = match request.host_id {
            Some(host_id) => host_id.trim().to_string(),
            None => self.ids.generate()?.to_string(),
        };
        let participant_ids: BTreeSet<String> = request
            .participant_ids
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let access_secret = match request.access_secret {
            Some(secret) => secret,
            None => generate_access_secret()?,
        };
        let recording_enabled = request.recording_enabled.unwrap_or(true);
        let title = request
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());

        let session = Session {
            id,
            features: SessionFeatures::compute(recording_enabled, participant_ids.len()),
            host_id,
            participant_ids,
            title,
            description: request.description,
            scheduled_start,
            scheduled_end,
            actual_start: None,
            actual_end: None,
            status: SessionStatus::Scheduled,
            recording_enabled,
            recording_url: None,
            access_secret,
            join_url: join_url_for(&self.settings.join_base_url, id),
            created_at: now,
            updated_at: now,
        };

        self.store.put(session.clone()).await?;

        info!(
            target: "session.services.lifecycle",
            session_id = %session.id,
            invitees = session.participant_ids.len(),
            recording_enabled = session.recording_enabled,
            "Session created"
        );

        Ok(session)
    }

    /// Join a session as its host or an invitee.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    /// - `AccessDenied` carrying the gate's reason
    #[instrument(skip_all, name = "session.lifecycle.join", fields(session_id = %id))]
    pub async fn join(&self, id: SessionId, caller_id: &str) -> Result<JoinOutcome, SessionError> {
        let start = Instant::now();
        let result = self.join_inner(id, caller_id).await;
        record("join", &result, start);
        result
    }

    async fn join_inner(&self, id: SessionId, caller_id: &str) -> Result<JoinOutcome, SessionError> {
        self.load(id).await?;

        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.join_locked(id, caller_id).await
        };
        self.release_lock(id, lock).await;
        result
    }

    async fn join_locked(&self, id: SessionId, caller_id: &str) -> Result<JoinOutcome, SessionError> {
        let mut session = self.load(id).await?;
        let now = self.clock.now();

        let role = match authorize(&session, caller_id, now) {
            AccessDecision::Granted(role) => role,
            AccessDecision::Denied(reason) => {
                metrics::record_access_denial(reason.label());
                debug!(
                    target: "session.services.lifecycle",
                    session_id = %id,
                    reason = reason.as_str(),
                    "Join denied"
                );
                return Err(SessionError::AccessDenied(reason.as_str().to_string()));
            }
        };

        let first_join = session.actual_start.is_none();
        if first_join {
            session.actual_start = Some(now);
        }
        session.status = SessionStatus::InProgress;
        session.updated_at = now;

        self.store.put(session.clone()).await?;

        info!(
            target: "session.services.lifecycle",
            session_id = %id,
            role = role.as_str(),
            first_join,
            "Session joined"
        );

        Ok(JoinOutcome {
            session,
            role,
            first_join,
        })
    }

    /// End a session from any state. Calling it again keeps the first
    /// `actual_end`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    #[instrument(skip_all, name = "session.lifecycle.end", fields(session_id = %id))]
    pub async fn end(&self, id: SessionId) -> Result<EndOutcome, SessionError> {
        let start = Instant::now();
        let result = self.end_inner(id).await;
        record("end", &result, start);
        result
    }

    async fn end_inner(&self, id: SessionId) -> Result<EndOutcome, SessionError> {
        self.load(id).await?;

        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.end_locked(id).await
        };
        self.release_lock(id, lock).await;
        result
    }

    async fn end_locked(&self, id: SessionId) -> Result<EndOutcome, SessionError> {
        let mut session = self.load(id).await?;
        let now = self.clock.now();

        let first_end = session.actual_end.is_none();
        if first_end {
            session.actual_end = Some(now);
        }
        session.status = SessionStatus::Completed;
        if session.recording_enabled && session.recording_url.is_none() {
            session.recording_url = Some(recording_url_for(
                &self.settings.recording_base_url,
                session.id,
            ));
        }
        session.updated_at = now;

        self.store.put(session.clone()).await?;

        info!(
            target: "session.services.lifecycle",
            session_id = %id,
            first_end,
            recorded = session.recording_url.is_some(),
            "Session ended"
        );

        Ok(EndOutcome { session, first_end })
    }

    /// Recordings available for a session.
    ///
    /// Empty unless recording is enabled and the session has ended.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    #[instrument(skip_all, name = "session.lifecycle.list_recordings", fields(session_id = %id))]
    pub async fn list_recordings(
        &self,
        id: SessionId,
    ) -> Result<Vec<RecordingDescriptor>, SessionError> {
        let start = Instant::now();
        let result = self.list_recordings_inner(id).await;
        record("list_recordings", &result, start);
        result
    }

    async fn list_recordings_inner(
        &self,
        id: SessionId,
    ) -> Result<Vec<RecordingDescriptor>, SessionError> {
        let session = self.load(id).await?;

        if !session.recording_enabled || session.actual_end.is_none() {
            return Ok(Vec::new());
        }

        let Some(recording_url) = session.recording_url else {
            return Ok(Vec::new());
        };

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.settings.recording_retention)
            .ok_or_else(|| {
                SessionError::Internal("recording expiry is out of range".to_string())
            })?;

        Ok(vec![RecordingDescriptor {
            recording_url,
            duration_minutes: duration_minutes(session.actual_start, session.actual_end),
            expires_at,
        }])
    }

    /// Fetch a session.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    pub async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        self.load(id).await
    }

    /// All sessions, ordered by scheduled start.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list(&self) -> Result<Vec<Session>, SessionError> {
        self.store.list().await
    }

    async fn load(&self, id: SessionId) -> Result<Session, SessionError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(format!("Session {id} not found")))
    }
}

fn record<T>(operation: &str, result: &Result<T, SessionError>, start: Instant) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::record_lifecycle_operation(operation, status, start.elapsed());
}
