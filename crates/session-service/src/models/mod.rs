//! Session service models.
//!
//! `Session` and `NotificationPayload` are the only shapes that cross the
//! service boundary. Both serialize with camelCase field names.

use chrono::{DateTime, Utc};
use common::types::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default title applied when a creation request omits one.
pub const DEFAULT_SESSION_TITLE: &str = "Virtual Session";

/// Maximum title length (characters, after trimming).
pub const MAX_SESSION_TITLE_LENGTH: usize = 200;

/// Maximum description length (characters).
pub const MAX_SESSION_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum number of invitees on one session.
pub const MAX_PARTICIPANT_IDS: usize = 500;

/// Maximum length of a caller-supplied access secret.
pub const MAX_ACCESS_SECRET_LENGTH: usize = 256;

/// Invitee count above which breakout rooms are enabled.
pub const BREAKOUT_ROOMS_THRESHOLD: usize = 4;

// ============================================================================
// Session
// ============================================================================

/// Session status.
///
/// `Completed` and `Ended` are equivalent terminal states. Lifecycle
/// transitions only ever produce `Completed`; `Ended` is accepted on
/// records that arrive from elsewhere and is treated identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, nobody has joined yet.
    Scheduled,

    /// At least one authorized caller has joined.
    InProgress,

    /// Ended through the lifecycle `end` transition.
    Completed,

    /// Terminal alias of `Completed`.
    Ended,
}

impl SessionStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Ended => "ENDED",
        }
    }

    /// Whether no further transition is defined from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Ended)
    }
}

/// Role a caller holds within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Host,
    Participant,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "host",
            ParticipantRole::Participant => "participant",
        }
    }
}

/// Feature flags computed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeatures {
    pub audio: bool,
    pub video: bool,
    pub screen_share: bool,
    pub chat: bool,
    pub recording: bool,
    pub breakout_rooms: bool,
}

impl SessionFeatures {
    /// Base flags unioned with the recording setting, plus breakout rooms
    /// when there are more than four invitees.
    pub fn compute(recording_enabled: bool, invitee_count: usize) -> Self {
        Self {
            audio: true,
            video: true,
            screen_share: true,
            chat: true,
            recording: recording_enabled,
            breakout_rooms: invitee_count > BREAKOUT_ROOMS_THRESHOLD,
        }
    }
}

/// A scheduled or in-progress virtual session.
///
/// Written only by the lifecycle manager. `access_secret` is redacted in
/// Debug output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier, immutable.
    pub id: SessionId,

    /// Creating/owning participant.
    pub host_id: String,

    /// Invited participants, de-duplicated.
    pub participant_ids: BTreeSet<String>,

    pub title: String,

    pub description: Option<String>,

    pub scheduled_start: DateTime<Utc>,

    /// Always strictly after `scheduled_start`.
    pub scheduled_end: DateTime<Utc>,

    /// Set once, by the first successful join.
    pub actual_start: Option<DateTime<Utc>>,

    /// Set once, by the first end.
    pub actual_end: Option<DateTime<Utc>>,

    pub status: SessionStatus,

    /// Fixed at creation.
    pub recording_enabled: bool,

    /// Populated on transition into a terminal state when recording is enabled.
    pub recording_url: Option<String>,

    /// Join credential, constant for the session's life.
    pub access_secret: String,

    /// Link participants use to reach the session.
    pub join_url: String,

    pub features: SessionFeatures,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("host_id", &self.host_id)
            .field("participant_ids", &self.participant_ids)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("scheduled_start", &self.scheduled_start)
            .field("scheduled_end", &self.scheduled_end)
            .field("actual_start", &self.actual_start)
            .field("actual_end", &self.actual_end)
            .field("status", &self.status)
            .field("recording_enabled", &self.recording_enabled)
            .field("recording_url", &self.recording_url)
            .field("access_secret", &"[REDACTED]")
            .field("join_url", &self.join_url)
            .field("features", &self.features)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Session {
    pub fn is_host(&self, caller_id: &str) -> bool {
        self.host_id == caller_id
    }

    /// Host or invited participant.
    pub fn is_member(&self, caller_id: &str) -> bool {
        self.is_host(caller_id) || self.participant_ids.contains(caller_id)
    }

    /// Role of a member. Callers must check membership first.
    pub fn role_of(&self, caller_id: &str) -> ParticipantRole {
        if self.is_host(caller_id) {
            ParticipantRole::Host
        } else {
            ParticipantRole::Participant
        }
    }

    /// Host plus invitees, de-duplicated and ordered.
    pub fn everyone(&self) -> BTreeSet<String> {
        let mut all = self.participant_ids.clone();
        all.insert(self.host_id.clone());
        all
    }
}

// ============================================================================
// Recordings
// ============================================================================

/// Describes one available recording of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingDescriptor {
    pub recording_url: String,

    /// `None` when the session never started.
    pub duration_minutes: Option<i64>,

    /// When the recording stops being available.
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Notifications
// ============================================================================

/// Lifecycle events that produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Created,
    Starting,
    Ended,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Created => "created",
            LifecycleEvent::Starting => "starting",
            LifecycleEvent::Ended => "ended",
        }
    }
}

/// Notification kind carried on each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SessionInvitation,
    SessionStarting,
    SessionEnded,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SessionInvitation => "session_invitation",
            NotificationKind::SessionStarting => "session_starting",
            NotificationKind::SessionEnded => "session_ended",
        }
    }
}

/// Event-specific notification data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationData {
    /// Sent for `created` and `starting`.
    #[serde(rename_all = "camelCase")]
    Join {
        session_id: SessionId,
        join_url: String,
        access_secret: String,
        scheduled_start: DateTime<Utc>,
    },

    /// Sent for `ended`. Nullable fields serialize as `null`.
    #[serde(rename_all = "camelCase")]
    Summary {
        session_id: SessionId,
        recording_url: Option<String>,
        duration_minutes: Option<i64>,
    },
}

/// A notification ready to hand to an external transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub recipient_ids: BTreeSet<String>,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

// ============================================================================
// HTTP API Models
// ============================================================================

/// Readiness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Session store status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request to create a session.
///
/// Every field is optional; see the lifecycle manager for defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub host_id: Option<String>,

    #[serde(default)]
    pub participant_ids: Vec<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,

    #[serde(default)]
    pub scheduled_end: Option<DateTime<Utc>>,

    #[serde(default)]
    pub recording_enabled: Option<bool>,

    #[serde(default)]
    pub access_secret: Option<String>,
}

impl CreateSessionRequest {
    /// Validate field shapes. Schedule ordering is checked by the lifecycle
    /// manager once defaults are applied.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(host_id) = &self.host_id {
            if host_id.trim().is_empty() {
                return Err("Host ID must not be blank");
            }
        }

        if let Some(title) = &self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err("Title must not be blank");
            }
            if title.chars().count() > MAX_SESSION_TITLE_LENGTH {
                return Err("Title must be at most 200 characters");
            }
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_SESSION_DESCRIPTION_LENGTH {
                return Err("Description must be at most 2000 characters");
            }
        }

        if self.participant_ids.len() > MAX_PARTICIPANT_IDS {
            return Err("Too many participants");
        }

        if let Some(secret) = &self.access_secret {
            if secret.is_empty() {
                return Err("Access secret must not be empty");
            }
            if secret.len() > MAX_ACCESS_SECRET_LENGTH {
                return Err("Access secret must be at most 256 bytes");
            }
        }

        Ok(())
    }
}

/// Request to join a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinSessionRequest {
    pub caller_id: String,
}

/// Single-session response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// Session listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

/// Response to a successful join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub session: Session,

    pub role: ParticipantRole,

    /// Signed session token.
    pub token: String,

    /// Token lifetime in seconds.
    pub expires_in: u32,
}

/// Recording listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingListResponse {
    pub recordings: Vec<RecordingDescriptor>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample_session() -> Session {
        let start = Utc.with_ymd_and_hms(2030, 3, 4, 15, 0, 0).unwrap();
        Session {
            id: SessionId(Uuid::nil()),
            host_id: "h1".to_string(),
            participant_ids: ["p1".to_string(), "p2".to_string()].into_iter().collect(),
            title: "Algebra review".to_string(),
            description: None,
            scheduled_start: start,
            scheduled_end: start + chrono::Duration::hours(1),
            actual_start: None,
            actual_end: None,
            status: SessionStatus::Scheduled,
            recording_enabled: true,
            recording_url: None,
            access_secret: "s3cr3t-value".to_string(),
            join_url: "https://sessions.example.org/join/x".to_string(),
            features: SessionFeatures::compute(true, 2),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let parsed: SessionStatus = serde_json::from_str("\"ENDED\"").unwrap();
        assert_eq!(parsed, SessionStatus::Ended);
        assert_eq!(SessionStatus::Completed.as_str(), "COMPLETED");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SessionStatus::Scheduled.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Ended.is_terminal());
    }

    #[test]
    fn test_features_breakout_threshold() {
        assert!(!SessionFeatures::compute(true, 4).breakout_rooms);
        assert!(SessionFeatures::compute(true, 5).breakout_rooms);
        assert!(!SessionFeatures::compute(false, 0).recording);
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let json = serde_json::to_value(sample_session()).unwrap();
        assert_eq!(json["hostId"], "h1");
        assert_eq!(json["status"], "SCHEDULED");
        assert_eq!(json["participantIds"], serde_json::json!(["p1", "p2"]));
        assert_eq!(json["features"]["breakoutRooms"], false);
        assert_eq!(json["features"]["screenShare"], true);
        assert!(json["actualStart"].is_null());
        assert!(json["recordingUrl"].is_null());
    }

    #[test]
    fn test_session_debug_redacts_access_secret() {
        let debug_output = format!("{:?}", sample_session());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("s3cr3t-value"));
    }

    #[test]
    fn test_roles_and_membership() {
        let session = sample_session();
        assert!(session.is_member("h1"));
        assert!(session.is_member("p2"));
        assert!(!session.is_member("stranger"));
        assert_eq!(session.role_of("h1"), ParticipantRole::Host);
        assert_eq!(session.role_of("p1"), ParticipantRole::Participant);
        assert_eq!(session.everyone().len(), 3);
    }

    #[test]
    fn test_summary_data_serializes_nulls() {
        let data = NotificationData::Summary {
            session_id: SessionId(Uuid::nil()),
            recording_url: None,
            duration_minutes: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json["recordingUrl"].is_null());
        assert!(json["durationMinutes"].is_null());
        assert!(json.get("sessionId").is_some());
    }

    #[test]
    fn test_create_request_defaults_from_empty_body() {
        let request: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.host_id.is_none());
        assert!(request.participant_ids.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_unknown_fields() {
        let result: Result<CreateSessionRequest, _> =
            serde_json::from_str(r#"{"hostId":"h1","roomSize":12}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let blank_title = CreateSessionRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank_title.validate(), Err("Title must not be blank"));

        let long_title = CreateSessionRequest {
            title: Some("x".repeat(MAX_SESSION_TITLE_LENGTH + 1)),
            ..Default::default()
        };
        assert!(long_title.validate().is_err());

        let empty_secret = CreateSessionRequest {
            access_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(empty_secret.validate().is_err());

        let blank_host = CreateSessionRequest {
            host_id: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_host.validate().is_err());
    }

    #[test]
    fn test_join_request_camel_case() {
        let request: JoinSessionRequest =
            serde_json::from_str(r#"{"callerId":"p1"}"#).unwrap();
        assert_eq!(request.caller_id, "p1");
    }
}
