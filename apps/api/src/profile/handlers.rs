use axum::{
    extract::{Multipart, Path, Query, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::profile::extract::{extract_resume, resume_text};
use crate::session::handlers::{session_view, SessionView};
use crate::state::AppState;
use crate::store::blob::resume_upload_key;
use crate::templates::{render_resume, Medium, Skin};

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub skin: Option<Skin>,
    pub medium: Option<Medium>,
}

/// Writes a whole profile: through the open edit session when there is one,
/// straight to the store otherwise.
async fn put_profile(state: &AppState, profile: Profile) -> Result<Profile, AppError> {
    let user_id = profile.user_id;
    if let Some((_, session)) = state.profiles.find_by_key(&user_id) {
        session.mutate(move |_| profile)?;
        return Ok(session.document());
    }
    state.profiles.store().save(&user_id, &profile).await?;
    Ok(profile)
}

/// GET /api/v1/profiles/:user_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .current(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profiles/:user_id
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, AppError> {
    if profile.user_id != user_id {
        return Err(AppError::Validation(
            "Profile user_id does not match the URL".to_string(),
        ));
    }
    Ok(Json(put_profile(&state, profile).await?))
}

/// POST /api/v1/profiles/:user_id/resume
///
/// Multipart upload with a `file` field (PDF or plain text). The original file
/// is stored, its text is structured by the model, and the result replaces the
/// profile's resume content.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        upload = Some((file_name, content_type, bytes));
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing `file` field".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    info!(
        "Resume upload for user {user_id}: {} bytes ({})",
        bytes.len(),
        file_name.as_deref().unwrap_or("unnamed")
    );

    let key = resume_upload_key(user_id, file_name.as_deref().unwrap_or("resume"));
    let resume_url = state
        .blobs
        .put(
            &key,
            bytes.clone(),
            content_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .await?;

    let text = resume_text(file_name.as_deref(), content_type.as_deref(), bytes.to_vec()).await?;
    let resume = extract_resume(&state.llm, &text).await?;

    let profile = Profile {
        user_id,
        resume_url: Some(resume_url),
        resume,
    };
    Ok(Json(put_profile(&state, profile).await?))
}

/// GET /api/v1/profiles/:user_id/render
pub async fn handle_render_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RenderQuery>,
) -> Result<Html<String>, AppError> {
    let profile = state
        .profiles
        .current(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))?;
    Ok(Html(render_resume(
        &profile.resume,
        query.skin.unwrap_or_default(),
        query.medium.unwrap_or_default(),
    )))
}

/// POST /api/v1/profiles/:user_id/session
///
/// Opens (or rejoins) the edit session for a profile. A user without a stored
/// profile starts from an empty one.
pub async fn handle_open_profile_session(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SessionView<Profile>>, AppError> {
    let (session_id, session) = state
        .profiles
        .open(user_id, Some(Profile::empty(user_id)))
        .await?;
    Ok(Json(session_view(session_id, &session)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::build_router;
    use crate::state::test_support::{send, TestHarness};

    fn stored_profile(user_id: Uuid) -> Profile {
        let mut profile = Profile::empty(user_id);
        profile.resume.full_name = "Ada Lovelace".into();
        profile.resume.skills = vec!["Rust".into()];
        profile
    }

    #[tokio::test]
    async fn test_get_missing_profile_is_not_found() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/profiles/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_put_then_get_profile() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let user = Uuid::new_v4();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/profiles/{user}"),
            Some(serde_json::to_value(stored_profile(user)).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.profiles.save_count(), 1);

        let (status, body) = send(&app, Method::GET, &format!("/api/v1/profiles/{user}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"]["full_name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_put_profile_rejects_mismatched_user() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/profiles/{}", Uuid::new_v4()),
            Some(serde_json::to_value(stored_profile(Uuid::new_v4())).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_profile_shows_unsaved_session_edits() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(stored_profile(user));
        let app = build_router(harness.state.clone());

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/profiles/{user}/session"),
            None,
        )
        .await;
        let session = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["document"]["resume"]["full_name"], "Ada Lovelace");

        send(
            &app,
            Method::PATCH,
            &format!("/api/v1/sessions/profile/{session}"),
            Some(json!({"edits": [{"op": "set_full_name", "value": "Ada King"}]})),
        )
        .await;

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/profiles/{user}"), None).await;
        assert_eq!(body["resume"]["full_name"], "Ada King");
        assert_eq!(harness.profiles.stored(user).unwrap().resume.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_render_profile_html() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(stored_profile(user));
        let app = build_router(harness.state.clone());

        let request = Request::builder()
            .uri(format!("/api/v1/profiles/{user}/render?skin=executive&medium=print"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));

        let html = String::from_utf8(
            to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap();
        assert!(html.contains("skin-executive medium-print"));
        assert!(html.contains("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_upload_without_file_field_is_rejected() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/profiles/{}/resume", Uuid::new_v4()))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(harness.blobs.objects.lock().unwrap().is_empty());
    }
}
