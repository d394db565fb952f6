use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::edits::Editable;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::profile::Profile;
use crate::session::registry::SessionRegistry;
use crate::session::{
    CloseReport, EditSession, SaveIndicator, SaveOutcome, SessionError, SessionStatus,
};
use crate::state::AppState;
use crate::store::RemoteStore;

/// What a client needs to render an editor: the working copy and the save state.
#[derive(Debug, Serialize)]
pub struct SessionView<D> {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub indicator: SaveIndicator,
    pub label: &'static str,
    /// Failed saves since the last success; non-zero means the client should
    /// offer a retry.
    pub consecutive_failures: u32,
    pub document: D,
}

pub fn session_view<S>(session_id: Uuid, session: &EditSession<S>) -> SessionView<S::Document>
where
    S: RemoteStore + ?Sized,
{
    let status = session.status();
    SessionView {
        session_id,
        status,
        indicator: status.indicator(),
        label: status.indicator().label(),
        consecutive_failures: session.consecutive_failures(),
        document: session.document(),
    }
}

/// A batch of edits, applied in order as one change to the working copy.
/// If any edit fails none of them are applied.
#[derive(Debug, Deserialize)]
pub struct EditRequest<M> {
    pub edits: Vec<M>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
    pub status: SessionStatus,
    pub indicator: SaveIndicator,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseRequest {
    #[serde(default)]
    pub discard: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared implementations
// ────────────────────────────────────────────────────────────────────────────

fn view<S>(
    registry: &SessionRegistry<S>,
    session_id: Uuid,
) -> Result<SessionView<S::Document>, AppError>
where
    S: RemoteStore + ?Sized,
{
    let session = registry.get(session_id)?;
    Ok(session_view(session_id, &session))
}

fn edit<S>(
    registry: &SessionRegistry<S>,
    session_id: Uuid,
    edits: Vec<<S::Document as Editable>::Mutation>,
) -> Result<SessionView<S::Document>, AppError>
where
    S: RemoteStore + ?Sized,
    S::Document: Editable,
{
    let session = registry.get(session_id)?;
    session.try_mutate(|document| {
        edits
            .into_iter()
            .try_fold(document.clone(), |doc, mutation| doc.apply(mutation))
            .map_err(SessionError::from)
    })?;
    Ok(session_view(session_id, &session))
}

async fn save<S>(registry: &SessionRegistry<S>, session_id: Uuid) -> Result<SaveResponse, AppError>
where
    S: RemoteStore + ?Sized,
{
    let session = registry.get(session_id)?;
    let outcome = session.force_save().await?;
    let status = session.status();
    Ok(SaveResponse {
        outcome,
        status,
        indicator: status.indicator(),
    })
}

/// Re-arms the autosave timer so a failed save is tried again without
/// another edit.
fn retry<S>(
    registry: &SessionRegistry<S>,
    session_id: Uuid,
) -> Result<SessionView<S::Document>, AppError>
where
    S: RemoteStore + ?Sized,
{
    let session = registry.get(session_id)?;
    session.schedule_save()?;
    Ok(session_view(session_id, &session))
}

fn close<S>(
    registry: &SessionRegistry<S>,
    session_id: Uuid,
    request: Option<Json<CloseRequest>>,
) -> Result<CloseReport, AppError>
where
    S: RemoteStore + ?Sized,
{
    let discard = request.map(|Json(r)| r.discard).unwrap_or(false);
    Ok(registry.close(session_id, discard)?)
}

// ────────────────────────────────────────────────────────────────────────────
// Profile sessions
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/profile/:session_id
pub async fn handle_get_profile_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView<Profile>>, AppError> {
    Ok(Json(view(&state.profiles, session_id)?))
}

/// PATCH /api/v1/sessions/profile/:session_id
pub async fn handle_edit_profile_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<EditRequest<<Profile as Editable>::Mutation>>,
) -> Result<Json<SessionView<Profile>>, AppError> {
    Ok(Json(edit(&state.profiles, session_id, req.edits)?))
}

/// POST /api/v1/sessions/profile/:session_id/save
pub async fn handle_save_profile_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    Ok(Json(save(&state.profiles, session_id).await?))
}

/// POST /api/v1/sessions/profile/:session_id/retry
pub async fn handle_retry_profile_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView<Profile>>, AppError> {
    Ok(Json(retry(&state.profiles, session_id)?))
}

/// POST /api/v1/sessions/profile/:session_id/close
pub async fn handle_close_profile_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    request: Option<Json<CloseRequest>>,
) -> Result<Json<CloseReport>, AppError> {
    Ok(Json(close(&state.profiles, session_id, request)?))
}

// ────────────────────────────────────────────────────────────────────────────
// Application sessions
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/application/:session_id
pub async fn handle_get_application_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView<Application>>, AppError> {
    Ok(Json(view(&state.applications, session_id)?))
}

/// PATCH /api/v1/sessions/application/:session_id
pub async fn handle_edit_application_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<EditRequest<<Application as Editable>::Mutation>>,
) -> Result<Json<SessionView<Application>>, AppError> {
    Ok(Json(edit(&state.applications, session_id, req.edits)?))
}

/// POST /api/v1/sessions/application/:session_id/save
pub async fn handle_save_application_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    Ok(Json(save(&state.applications, session_id).await?))
}

/// POST /api/v1/sessions/application/:session_id/retry
pub async fn handle_retry_application_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView<Application>>, AppError> {
    Ok(Json(retry(&state.applications, session_id)?))
}

/// POST /api/v1/sessions/application/:session_id/close
pub async fn handle_close_application_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    request: Option<Json<CloseRequest>>,
) -> Result<Json<CloseReport>, AppError> {
    Ok(Json(close(&state.applications, session_id, request)?))
}
