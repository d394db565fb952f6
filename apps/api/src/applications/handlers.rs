use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::applications::tailor::generate_documents;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::profile::ResumeContent;
use crate::profile::handlers::RenderQuery;
use crate::session::handlers::{session_view, SessionView};
use crate::state::AppState;
use crate::store::blob::portfolio_key;
use crate::templates::{
    render_cover_letter, render_portfolio, render_resume, DocumentKind, Medium, Skin,
};

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: Uuid,
    pub company: String,
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub skin: Option<Skin>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Uuid,
}

async fn load_application(state: &AppState, id: Uuid) -> Result<Application, AppError> {
    state
        .applications
        .current(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// The resume shown alongside an application: its tailored copy once
/// generated, the owner's base resume before that.
async fn resume_for(state: &AppState, application: &Application) -> Result<ResumeContent, AppError> {
    if let Some(tailored) = &application.tailored {
        return Ok(tailored.clone());
    }
    state
        .profiles
        .current(&application.user_id)
        .await?
        .map(|p| p.resume)
        .ok_or_else(|| {
            AppError::NotFound(format!("Profile for user {} not found", application.user_id))
        })
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    if req.company.trim().is_empty() || req.job_title.trim().is_empty() {
        return Err(AppError::Validation(
            "company and job_title are required".to_string(),
        ));
    }

    let application = Application::new(
        req.user_id,
        req.company.trim().to_string(),
        req.job_title.trim().to_string(),
        req.job_description,
        req.skin.unwrap_or_default(),
    );
    state
        .applications
        .store()
        .save(&application.id, &application)
        .await?;

    info!(
        "Created application {} for user {}: {} at {}",
        application.id, application.user_id, application.job_title, application.company
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications?user_id=
///
/// Newest first. Applications with an open edit session show its working copy.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Application>>, AppError> {
    let applications = state
        .applications
        .store()
        .list_for_user(query.user_id)
        .await?
        .into_iter()
        .map(|stored| match state.applications.find_by_key(&stored.id) {
            Some((_, session)) => session.document(),
            None => stored,
        })
        .collect();
    Ok(Json(applications))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(load_application(&state, id).await?))
}

/// DELETE /api/v1/applications/:id
///
/// Refused while an open session on the application holds unsaved edits.
/// Otherwise the session is closed first, so no edit or autosave can land
/// after the row is gone.
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.applications.close_key(&id, false)?;

    let removed = state.applications.store().delete(id).await?;
    if !removed {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }

    info!("Deleted application {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/applications/:id/generate
///
/// Generates the tailored resume, cover letter and portfolio copy from the
/// owner's current profile. With an open session the results land in its
/// working copy and are saved by autosave.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let application = load_application(&state, id).await?;
    let profile = state
        .profiles
        .current(&application.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Profile for user {} not found; upload a resume first",
                application.user_id
            ))
        })?;
    if profile.resume.experience.is_empty() && profile.resume.summary.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "Profile has no resume content to tailor".to_string(),
        ));
    }

    let generated = generate_documents(&state.llm, &application, &profile.resume).await?;

    let updated = state
        .applications
        .update(&id, |current| -> Result<Application, AppError> {
            let mut next = current.clone();
            let mut portfolio = generated.portfolio;
            // Publishing may have finished while generation ran.
            if let Some(existing) = &current.portfolio {
                if existing.slug == portfolio.slug && portfolio.published_url.is_none() {
                    portfolio.published_url = existing.published_url.clone();
                }
            }
            next.tailored = Some(generated.tailored);
            next.cover_letter = Some(generated.cover_letter);
            next.portfolio = Some(portfolio);
            Ok(next)
        })
        .await?;

    info!("Generated documents for application {id}");
    Ok(Json(updated))
}

/// POST /api/v1/applications/:id/portfolio/publish
///
/// Renders the portfolio page, uploads it to the blob store and records the
/// public URL on the application.
pub async fn handle_publish_portfolio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let application = load_application(&state, id).await?;
    let portfolio = application.portfolio.clone().ok_or_else(|| {
        AppError::UnprocessableEntity(
            "No portfolio yet; generate documents for this application first".to_string(),
        )
    })?;
    let resume = resume_for(&state, &application).await?;

    let html = render_portfolio(
        &portfolio,
        &resume,
        &application.job_title,
        application.skin,
        Medium::Screen,
    );
    let url = state
        .blobs
        .put(
            &portfolio_key(&portfolio.slug),
            Bytes::from(html),
            "text/html; charset=utf-8",
        )
        .await?;

    let published = url.clone();
    let updated = state
        .applications
        .update(&id, move |current| -> Result<Application, AppError> {
            let mut next = current.clone();
            let portfolio = next.portfolio.as_mut().ok_or_else(|| {
                AppError::Conflict("Portfolio was removed while publishing".to_string())
            })?;
            portfolio.published_url = Some(published);
            Ok(next)
        })
        .await?;

    info!("Published portfolio for application {id} at {url}");
    Ok(Json(updated))
}

/// GET /api/v1/applications/:id/render/:document?skin=&medium=
///
/// The skin defaults to the one chosen on the application.
pub async fn handle_render_application(
    State(state): State<AppState>,
    Path((id, document)): Path<(Uuid, DocumentKind)>,
    Query(query): Query<RenderQuery>,
) -> Result<Html<String>, AppError> {
    let application = load_application(&state, id).await?;
    let skin = query.skin.unwrap_or(application.skin);
    let medium = query.medium.unwrap_or_default();
    let resume = resume_for(&state, &application).await?;

    let html = match document {
        DocumentKind::Resume => render_resume(&resume, skin, medium),
        DocumentKind::CoverLetter => {
            let letter = application.cover_letter.as_ref().ok_or_else(|| {
                AppError::NotFound(format!("Application {id} has no cover letter yet"))
            })?;
            render_cover_letter(letter, &resume, &application.company, skin, medium)
        }
        DocumentKind::Portfolio => {
            let portfolio = application.portfolio.as_ref().ok_or_else(|| {
                AppError::NotFound(format!("Application {id} has no portfolio yet"))
            })?;
            render_portfolio(portfolio, &resume, &application.job_title, skin, medium)
        }
    };
    Ok(Html(html))
}

/// POST /api/v1/applications/:id/session
pub async fn handle_open_application_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView<Application>>, AppError> {
    let (session_id, session) = state.applications.open(id, None).await?;
    Ok(Json(session_view(session_id, &session)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::models::application::{CoverLetter, Portfolio};
    use crate::models::profile::Profile;
    use crate::routes::build_router;
    use crate::state::test_support::{send, TestHarness};

    fn profile(user_id: Uuid) -> Profile {
        let mut profile = Profile::empty(user_id);
        profile.resume.full_name = "Ada Lovelace".into();
        profile.resume.summary = "Engineer.".into();
        profile
    }

    async fn get_html(app: &axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_create_list_and_get() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let user = Uuid::new_v4();

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({
                "user_id": user,
                "company": " Acme ",
                "job_title": "Rust Engineer",
                "job_description": "Storage.",
                "skin": "creative"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["company"], "Acme");
        assert_eq!(created["skin"], "creative");
        assert_eq!(created["status"], "draft");

        let (status, list) = send(
            &app,
            Method::GET,
            &format!("/api/v1/applications?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let id = created["id"].as_str().unwrap();
        let (status, fetched) =
            send(&app, Method::GET, &format!("/api/v1/applications/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["job_title"], "Rust Engineer");
    }

    #[tokio::test]
    async fn test_create_requires_company_and_title() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({"user_id": Uuid::new_v4(), "company": "", "job_title": "X"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_shows_session_working_copy() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let user = Uuid::new_v4();
        let seeded = harness.seed_application(user);

        let (_, view) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/session", seeded.id),
            None,
        )
        .await;
        let session = view["session_id"].as_str().unwrap().to_string();
        send(
            &app,
            Method::PATCH,
            &format!("/api/v1/sessions/application/{session}"),
            Some(json!({"edits": [{"op": "set_notes", "value": "Call back Friday"}]})),
        )
        .await;

        let (_, list) = send(
            &app,
            Method::GET,
            &format!("/api/v1/applications?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(list[0]["notes"], "Call back Friday");
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(Uuid::new_v4());
        let uri = format!("/api/v1/applications/{}", seeded.id);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(harness.applications.stored(seeded.id).is_none());

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_refused_with_unsaved_session_edits() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(Uuid::new_v4());

        let (_, view) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/session", seeded.id),
            None,
        )
        .await;
        let session = view["session_id"].as_str().unwrap().to_string();
        send(
            &app,
            Method::PATCH,
            &format!("/api/v1/sessions/application/{session}"),
            Some(json!({"edits": [{"op": "set_status", "status": "applied"}]})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/applications/{}", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "UNSAVED_CHANGES");
        assert!(harness.applications.stored(seeded.id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_refused_while_reverted_edit_is_saving() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(Uuid::new_v4());
        harness.applications.gate.hold();

        let (_, view) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/session", seeded.id),
            None,
        )
        .await;
        let session = view["session_id"].as_str().unwrap().to_string();
        let edit_uri = format!("/api/v1/sessions/application/{session}");
        send(
            &app,
            Method::PATCH,
            &edit_uri,
            Some(json!({"edits": [{"op": "set_status", "status": "applied"}]})),
        )
        .await;
        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        let (_, body) = send(
            &app,
            Method::PATCH,
            &edit_uri,
            Some(json!({"edits": [{"op": "set_status", "status": "draft"}]})),
        )
        .await;
        assert_eq!(body["status"]["dirty"], false);
        assert_eq!(body["indicator"], "saving");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/applications/{}", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "UNSAVED_CHANGES");
        assert_eq!(harness.state.applications.len(), 1);
        harness.applications.gate.release();
    }

    #[tokio::test]
    async fn test_delete_closes_clean_session() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(Uuid::new_v4());

        let (_, view) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/session", seeded.id),
            None,
        )
        .await;
        let session = view["session_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/applications/{}", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(harness.state.applications.len(), 0);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/application/{session}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_requires_profile() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(Uuid::new_v4());

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/generate", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("upload a resume first"));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_profile() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(Profile::empty(user));
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(user);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/generate", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_render_resume_falls_back_to_profile() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(profile(user));
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(user);

        let (status, html) = get_html(
            &app,
            &format!("/api/v1/applications/{}/render/resume", seeded.id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Ada Lovelace"));
        // Seeded with the modern skin.
        assert!(html.contains("skin-modern medium-screen"));
    }

    #[tokio::test]
    async fn test_render_cover_letter_before_generation_is_not_found() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(profile(user));
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(user);

        let (status, _) = get_html(
            &app,
            &format!("/api/v1/applications/{}/render/cover_letter", seeded.id),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_cover_letter_print() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(profile(user));
        let app = build_router(harness.state.clone());
        let mut seeded = harness.seed_application(user);
        seeded.cover_letter = Some(CoverLetter {
            greeting: "Dear Hiring Team,".into(),
            paragraphs: vec!["I build <fast> storage.".into()],
            closing: "Sincerely,".into(),
            signature: "Ada Lovelace".into(),
        });
        harness.applications.insert(seeded.clone());

        let (status, html) = get_html(
            &app,
            &format!(
                "/api/v1/applications/{}/render/cover_letter?skin=minimal&medium=print",
                seeded.id
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("skin-minimal medium-print"));
        assert!(html.contains("I build &lt;fast&gt; storage."));
        assert!(html.contains("@page"));
    }

    #[tokio::test]
    async fn test_publish_uploads_page_and_records_url() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(profile(user));
        let app = build_router(harness.state.clone());
        let mut seeded = harness.seed_application(user);
        seeded.portfolio = Some(Portfolio {
            slug: "ada-acme".into(),
            tagline: "Storage engines in Rust".into(),
            ..Default::default()
        });
        harness.applications.insert(seeded.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/portfolio/publish", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let url = "https://cdn.test/portfolios/ada-acme/index.html";
        assert_eq!(body["portfolio"]["published_url"], url);
        assert_eq!(
            harness
                .applications
                .stored(seeded.id)
                .unwrap()
                .portfolio
                .unwrap()
                .published_url
                .as_deref(),
            Some(url)
        );

        let objects = harness.blobs.objects.lock().unwrap();
        let (bytes, content_type) = &objects["portfolios/ada-acme/index.html"];
        assert_eq!(content_type, "text/html; charset=utf-8");
        assert!(String::from_utf8_lossy(bytes).contains("Storage engines in Rust"));
    }

    #[tokio::test]
    async fn test_publish_without_portfolio_is_unprocessable() {
        let user = Uuid::new_v4();
        let harness = TestHarness::with_profile(profile(user));
        let app = build_router(harness.state.clone());
        let seeded = harness.seed_application(user);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/portfolio/publish", seeded.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(harness.blobs.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_session_for_missing_application_is_not_found() {
        let harness = TestHarness::new();
        let app = build_router(harness.state.clone());
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{}/session", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
