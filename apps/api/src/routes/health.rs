use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tailor-api",
        "sessions": {
            "autosave_debounce_ms": state.config.autosave_debounce_ms,
            "idle_timeout_secs": state.config.session_idle_timeout_secs,
            "profile": {
                "open": state.profiles.len(),
                "save_failures": state.profiles.failure_stats(),
            },
            "application": {
                "open": state.applications.len(),
                "save_failures": state.applications.failure_stats(),
            },
        }
    }))
}
