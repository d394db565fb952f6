pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::profile::handlers as profiles;
use crate::session::handlers as sessions;
use crate::state::AppState;

/// Largest accepted resume upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles
        .route(
            "/api/v1/profiles/:user_id",
            get(profiles::handle_get_profile).put(profiles::handle_put_profile),
        )
        .route(
            "/api/v1/profiles/:user_id/resume",
            post(profiles::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/profiles/:user_id/render",
            get(profiles::handle_render_profile),
        )
        .route(
            "/api/v1/profiles/:user_id/session",
            post(profiles::handle_open_profile_session),
        )
        // Applications
        .route(
            "/api/v1/applications",
            post(applications::handle_create_application)
                .get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:id/generate",
            post(applications::handle_generate),
        )
        .route(
            "/api/v1/applications/:id/portfolio/publish",
            post(applications::handle_publish_portfolio),
        )
        .route(
            "/api/v1/applications/:id/render/:document",
            get(applications::handle_render_application),
        )
        .route(
            "/api/v1/applications/:id/session",
            post(applications::handle_open_application_session),
        )
        // Edit sessions
        .route(
            "/api/v1/sessions/profile/:session_id",
            get(sessions::handle_get_profile_session).patch(sessions::handle_edit_profile_session),
        )
        .route(
            "/api/v1/sessions/profile/:session_id/save",
            post(sessions::handle_save_profile_session),
        )
        .route(
            "/api/v1/sessions/profile/:session_id/retry",
            post(sessions::handle_retry_profile_session),
        )
        .route(
            "/api/v1/sessions/profile/:session_id/close",
            post(sessions::handle_close_profile_session),
        )
        .route(
            "/api/v1/sessions/application/:session_id",
            get(sessions::handle_get_application_session)
                .patch(sessions::handle_edit_application_session),
        )
        .route(
            "/api/v1/sessions/application/:session_id/save",
            post(sessions::handle_save_application_session),
        )
        .route(
            "/api/v1/sessions/application/:session_id/retry",
            post(sessions::handle_retry_application_session),
        )
        .route(
            "/api/v1/sessions/application/:session_id/close",
            post(sessions::handle_close_application_session),
        )
        .with_state(state)
}
