//! Service layer for the session service.
//!
//! # Components
//!
//! - `access_gate` - pure join authorization
//! - `ids` - identifier, secret, and link generation
//! - `lifecycle` - session transitions over the store
//! - `notifications` - payload composition and delivery seam
//! - `session_tokens` - signed tokens handed out on join

pub mod access_gate;
pub mod ids;
pub mod lifecycle;
pub mod notifications;
pub mod session_tokens;

pub use access_gate::{authorize, AccessDecision, DenialReason};
pub use ids::{CsprngIdGenerator, IdGenerator};
pub use lifecycle::{EndOutcome, JoinOutcome, LifecycleManager, LifecycleSettings};
pub use notifications::{compose, NotificationSink, TracingNotificationSink};
pub use session_tokens::{IssuedToken, SessionTokenIssuer};
// Test doubles exposed for integration tests
#[allow(unused_imports)]
pub use ids::mock::SequentialIdGenerator;
#[allow(unused_imports)]
pub use notifications::mock::CollectingNotificationSink;
