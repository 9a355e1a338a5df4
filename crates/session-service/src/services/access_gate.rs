//! Access gate for join and control actions.
//!
//! Pure predicate over a session, a caller, and an instant. Rules are
//! evaluated in a fixed order and the first match wins:
//!
//! 1. terminal status -> "session ended"
//! 2. caller is neither host nor invitee -> "access denied"
//! 3. before `scheduled_start` -> "not started yet"
//! 4. after `scheduled_end` -> "session window elapsed"
//! 5. otherwise granted, as host or participant
//!
//! Status precedes membership so a finished session reveals nothing about
//! roles; membership precedes timing so an uninvited caller learns nothing
//! about the schedule. Both window bounds are inclusive.

use crate::models::{ParticipantRole, Session};
use chrono::{DateTime, Utc};

/// Why the gate refused a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    SessionEnded,
    NotInvited,
    NotStartedYet,
    WindowElapsed,
}

impl DenialReason {
    /// Reason string returned to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::SessionEnded => "session ended",
            DenialReason::NotInvited => "access denied",
            DenialReason::NotStartedYet => "not started yet",
            DenialReason::WindowElapsed => "session window elapsed",
        }
    }

    /// Bounded metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            DenialReason::SessionEnded => "session_ended",
            DenialReason::NotInvited => "not_invited",
            DenialReason::NotStartedYet => "not_started",
            DenialReason::WindowElapsed => "window_elapsed",
        }
    }
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(ParticipantRole),
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }

    /// Denial reason string, if denied.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Granted(_) => None,
            AccessDecision::Denied(reason) => Some(reason.as_str()),
        }
    }
}

/// Decide whether `caller_id` may join or control `session` at `now`.
pub fn authorize(session: &Session, caller_id: &str, now: DateTime<Utc>) -> AccessDecision {
    if session.status.is_terminal() {
        return AccessDecision::Denied(DenialReason::SessionEnded);
    }

    if !session.is_member(caller_id) {
        return AccessDecision::Denied(DenialReason::NotInvited);
    }

    if now < session.scheduled_start {
        return AccessDecision::Denied(DenialReason::NotStartedYet);
    }

    if now > session.scheduled_end {
        return AccessDecision::Denied(DenialReason::WindowElapsed);
    }

    AccessDecision::Granted(session.role_of(caller_id))
}
