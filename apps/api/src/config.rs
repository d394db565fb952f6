use std::time::Duration;

use anyhow::{Context, Result};

use crate::session::config::{DEFAULT_DEBOUNCE_MS, DEFAULT_ESCALATE_AFTER};

/// Clean sessions untouched this long are closed by the sweeper.
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 30 * 60;
use crate::session::SessionConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base URL uploaded objects are served from (CDN or bucket website).
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Quiet period after the last edit before an edit session autosaves.
    pub autosave_debounce_ms: u64,
    /// Consecutive autosave failures after which they are logged as errors.
    pub save_failure_escalation: u32,
    /// Idle time after which a session with nothing unsaved is closed.
    pub session_idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_public_url: require_env("S3_PUBLIC_URL")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            autosave_debounce_ms: optional_env("AUTOSAVE_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)
                .context("AUTOSAVE_DEBOUNCE_MS must be a number of milliseconds")?,
            save_failure_escalation: optional_env(
                "SAVE_FAILURE_ESCALATION",
                DEFAULT_ESCALATE_AFTER,
            )
            .context("SAVE_FAILURE_ESCALATION must be a positive integer")?,
            session_idle_timeout_secs: optional_env(
                "SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            )
            .context("SESSION_IDLE_TIMEOUT_SECS must be a number of seconds")?,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_debounce(Duration::from_millis(self.autosave_debounce_ms))
            .with_escalate_after(self.save_failure_escalation)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
