//! Session handlers.
//!
//! - `POST /api/v1/sessions` - Create a session
//! - `GET /api/v1/sessions` - List sessions
//! - `GET /api/v1/sessions/{id}` - Fetch a session
//! - `POST /api/v1/sessions/{id}/join` - Join and receive a session token
//! - `POST /api/v1/sessions/{id}/end` - End a session
//! - `GET /api/v1/sessions/{id}/recordings` - List recordings
//!
//! Lifecycle notifications are published after the transition is stored:
//! `created` on every create, `starting` on the first join only, `ended` on
//! the first end only.

use crate::errors::SessionError;
use crate::models::{
    CreateSessionRequest, JoinSessionRequest, JoinSessionResponse, LifecycleEvent,
    RecordingListResponse, Session, SessionListResponse, SessionResponse,
};
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::compose;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use common::types::SessionId;
use std::sync::Arc;
use tracing::{info, instrument};

fn parse_session_id(raw: &str) -> Result<SessionId, SessionError> {
    raw.parse()
        .map_err(|_| SessionError::BadRequest("Invalid session id".to_string()))
}

/// Compose and hand off notifications for `event`.
async fn notify(state: &AppState, session: &Session, event: LifecycleEvent) {
    let payloads = compose(session, event);
    for payload in &payloads {
        metrics::record_notification(payload.kind.as_str());
    }
    state.notifier.publish(payloads).await;
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, SessionError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| SessionError::BadRequest(rejection.body_text()))
}

/// Handler for POST /api/v1/sessions
///
/// # Response
///
/// - 201 Created: `{ session }`
/// - 400 Bad Request: malformed body or `INVALID_SCHEDULE`
#[instrument(skip_all, name = "session.handlers.create")]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), SessionError> {
    let request = body(payload)?;
    let session = state.lifecycle.create(request).await?;

    notify(&state, &session, LifecycleEvent::Created).await;

    info!(target: "session.handlers.sessions", session_id = %session.id, "Created session");

    Ok((StatusCode::CREATED, Json(SessionResponse { session })))
}

/// Handler for GET /api/v1/sessions
#[instrument(skip_all, name = "session.handlers.list")]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionListResponse>, SessionError> {
    let sessions = state.lifecycle.list().await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// Handler for GET /api/v1/sessions/{id}
#[instrument(skip_all, name = "session.handlers.get", fields(session_id = %id))]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, SessionError> {
    let session = state.lifecycle.get(parse_session_id(&id)?).await?;
    Ok(Json(SessionResponse { session }))
}

/// Handler for POST /api/v1/sessions/{id}/join
///
/// # Response
///
/// - 200 OK: `{ session, role, token, expiresIn }`
/// - 403 Forbidden: `ACCESS_DENIED` with the gate's reason as message
/// - 404 Not Found: unknown session
///
/// The `IN_PROGRESS` transition and its start notification are committed
/// before the token is signed. A signing failure returns 500 with the session
/// already started; joining again is idempotent and issues a fresh token.
#[instrument(skip_all, name = "session.handlers.join", fields(session_id = %id))]
pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<JoinSessionRequest>, JsonRejection>,
) -> Result<Json<JoinSessionResponse>, SessionError> {
    let id = parse_session_id(&id)?;
    let request = body(payload)?;
    let caller_id = request.caller_id.trim();
    if caller_id.is_empty() {
        return Err(SessionError::BadRequest(
            "callerId must not be blank".to_string(),
        ));
    }

    let outcome = state.lifecycle.join(id, caller_id).await?;

    // Committed: announce the start even if signing below fails.
    if outcome.first_join {
        notify(&state, &outcome.session, LifecycleEvent::Starting).await;
    }

    let issued = state
        .token_issuer
        .issue(caller_id, id, outcome.role, state.clock.now())?;

    Ok(Json(JoinSessionResponse {
        session: outcome.session,
        role: outcome.role,
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// Handler for POST /api/v1/sessions/{id}/end
#[instrument(skip_all, name = "session.handlers.end", fields(session_id = %id))]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, SessionError> {
    let outcome = state.lifecycle.end(parse_session_id(&id)?).await?;

    if outcome.first_end {
        notify(&state, &outcome.session, LifecycleEvent::Ended).await;
    }

    Ok(Json(SessionResponse {
        session: outcome.session,
    }))
}

/// Handler for GET /api/v1/sessions/{id}/recordings
#[instrument(skip_all, name = "session.handlers.recordings", fields(session_id = %id))]
pub async fn list_recordings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecordingListResponse>, SessionError> {
    let recordings = state.lifecycle.list_recordings(parse_session_id(&id)?).await?;
    Ok(Json(RecordingListResponse { recordings }))
}
