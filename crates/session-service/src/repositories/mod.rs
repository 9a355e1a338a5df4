//! Repository layer for the session service.
//!
//! The session store is the only persistence seam. Records are keyed by
//! session id; the lifecycle manager is its only writer.

pub mod sessions;

pub use sessions::{InMemorySessionStore, SessionStore};
