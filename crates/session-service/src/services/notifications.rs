//! Notification composition and the delivery seam.
//!
//! [`compose`] is pure: it maps a session and a lifecycle event to the
//! payloads that should go out. Delivery belongs to whatever implements
//! [`NotificationSink`]; the default sink only logs.

use crate::models::{LifecycleEvent, NotificationData, NotificationKind, NotificationPayload, Session};
use crate::services::ids::duration_minutes;
use std::collections::BTreeSet;
use tracing::info;

/// Compose the notifications for `event` on `session`.
///
/// Recipients:
/// - `created`: invitees only
/// - `starting`, `ended`: host and invitees
///
/// Returns an empty list when there is nobody to notify.
pub fn compose(session: &Session, event: LifecycleEvent) -> Vec<NotificationPayload> {
    let recipient_ids: BTreeSet<String> = match event {
        LifecycleEvent::Created => session.participant_ids.clone(),
        LifecycleEvent::Starting | LifecycleEvent::Ended => session.everyone(),
    };

    if recipient_ids.is_empty() {
        return Vec::new();
    }

    let payload = match event {
        LifecycleEvent::Created => NotificationPayload {
            kind: NotificationKind::SessionInvitation,
            recipient_ids,
            title: format!("You're invited: {}", session.title),
            message: format!(
                "You have been invited to \"{}\" starting at {}.",
                session.title,
                session.scheduled_start.to_rfc3339()
            ),
            data: join_data(session),
        },
        LifecycleEvent::Starting => NotificationPayload {
            kind: NotificationKind::SessionStarting,
            recipient_ids,
            title: format!("Starting now: {}", session.title),
            message: format!("\"{}\" has started. Join using the link provided.", session.title),
            data: join_data(session),
        },
        LifecycleEvent::Ended => NotificationPayload {
            kind: NotificationKind::SessionEnded,
            recipient_ids,
            title: format!("Session ended: {}", session.title),
            message: match &session.recording_url {
                Some(_) => format!("\"{}\" has ended. A recording is available.", session.title),
                None => format!("\"{}\" has ended.", session.title),
            },
            data: NotificationData::Summary {
                session_id: session.id,
                recording_url: session.recording_url.clone(),
                duration_minutes: duration_minutes(session.actual_start, session.actual_end),
            },
        },
    };

    vec![payload]
}

fn join_data(session: &Session) -> NotificationData {
    NotificationData::Join {
        session_id: session.id,
        join_url: session.join_url.clone(),
        access_secret: session.access_secret.clone(),
        scheduled_start: session.scheduled_start,
    }
}

/// Receives composed payloads for delivery.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, payloads: Vec<NotificationPayload>);
}

/// Sink that records each payload as a structured log event.
///
/// Payload data is not logged; it carries the access secret.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait::async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn publish(&self, payloads: Vec<NotificationPayload>) {
        for payload in payloads {
            info!(
                target: "session.services.notifications",
                kind = payload.kind.as_str(),
                recipients = payload.recipient_ids.len(),
                title = %payload.title,
                "Notification composed"
            );
        }
    }
}

/// Mock sinks for testing.
pub mod mock {
    use super::*;
    use tokio::sync::Mutex;

    /// Sink that keeps every payload it receives.
    #[derive(Debug, Default)]
    pub struct CollectingNotificationSink {
        payloads: Mutex<Vec<NotificationPayload>>,
    }

    impl CollectingNotificationSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of everything published so far.
        pub async fn payloads(&self) -> Vec<NotificationPayload> {
            self.payloads.lock().await.clone()
        }

        /// Payloads of a single kind.
        pub async fn of_kind(&self, kind: NotificationKind) -> Vec<NotificationPayload> {
            self.payloads
                .lock()
                .await
                .iter()
                .filter(|p| p.kind == kind)
                .cloned()
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl NotificationSink for CollectingNotificationSink {
        async fn publish(&self, payloads: Vec<NotificationPayload>) {
            self.payloads.lock().await.extend(payloads);
        }
    }
}
