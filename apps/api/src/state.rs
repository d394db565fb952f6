use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::session::registry::SessionRegistry;
use crate::store::{ApplicationStore, BlobStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    /// Uploaded resumes and published portfolio pages.
    pub blobs: Arc<dyn BlobStore>,
    /// Open profile edit sessions; also the path to the profile store.
    pub profiles: Arc<SessionRegistry<dyn ProfileStore>>,
    /// Open application edit sessions; also the path to the application store.
    pub applications: Arc<SessionRegistry<dyn ApplicationStore>>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm: LlmClient,
        blobs: Arc<dyn BlobStore>,
        profiles: Arc<dyn ProfileStore>,
        applications: Arc<dyn ApplicationStore>,
    ) -> Self {
        let sessions = config.session_config();
        Self {
            profiles: Arc::new(SessionRegistry::new(profiles, sessions.clone())),
            applications: Arc::new(SessionRegistry::new(applications, sessions)),
            config,
            llm,
            blobs,
        }
    }

    /// Closes sessions of both kinds that have sat idle past the configured
    /// timeout with nothing to lose. Returns how many were closed.
    pub fn sweep_idle_sessions(&self) -> usize {
        let max_idle = self.config.session_idle_timeout();
        self.profiles.sweep_idle(max_idle) + self.applications.sweep_idle(max_idle)
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::AppState;
    use crate::config::Config;
    use crate::llm_client::LlmClient;
    use crate::models::application::Application;
    use crate::models::profile::Profile;
    use crate::store::memory::{MemoryApplicationStore, MemoryBlobStore, MemoryProfileStore};
    use crate::templates::Skin;

    /// App state over in-memory stores, with handles to inspect them.
    pub struct TestHarness {
        pub state: AppState,
        pub profiles: Arc<MemoryProfileStore>,
        pub applications: Arc<MemoryApplicationStore>,
        pub blobs: Arc<MemoryBlobStore>,
    }

    impl TestHarness {
        pub fn new() -> Self {
            Self::with_profiles(MemoryProfileStore::default())
        }

        pub fn with_profile(profile: Profile) -> Self {
            Self::with_profiles(MemoryProfileStore::with(profile))
        }

        fn with_profiles(profiles: MemoryProfileStore) -> Self {
            let profiles = Arc::new(profiles);
            let applications = Arc::new(MemoryApplicationStore::default());
            let blobs = Arc::new(MemoryBlobStore::default());
            let state = AppState::new(
                test_config(),
                LlmClient::new("test-key".to_string()).unwrap(),
                blobs.clone(),
                profiles.clone(),
                applications.clone(),
            );
            Self {
                state,
                profiles,
                applications,
                blobs,
            }
        }

        /// Stores a fresh application for `user_id` directly, bypassing HTTP.
        pub fn seed_application(&self, user_id: Uuid) -> Application {
            let application = Application::new(
                user_id,
                "Acme".into(),
                "Rust Engineer".into(),
                "Write Rust.".into(),
                Skin::Modern,
            );
            self.applications.insert(application.clone());
            application
        }
    }

    pub fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/tailor_test".into(),
            s3_bucket: "tailor-test".into(),
            s3_endpoint: "http://localhost:9000".into(),
            s3_public_url: "https://cdn.test".into(),
            aws_access_key_id: "test".into(),
            aws_secret_access_key: "test".into(),
            anthropic_api_key: "test-key".into(),
            port: 0,
            rust_log: "debug".into(),
            autosave_debounce_ms: 2000,
            save_failure_escalation: 3,
            session_idle_timeout_secs: 1800,
        }
    }

    /// Sends one JSON request through the router and decodes the JSON reply
    /// (`Value::Null` for an empty body).
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}
