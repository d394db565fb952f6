use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::store::StoreError;

pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;
pub const DEFAULT_ESCALATE_AFTER: u32 = 3;

/// One failed save attempt, as reported to the failure hook.
#[derive(Debug)]
pub struct SaveFailure<'a> {
    pub key: &'a str,
    pub error: &'a StoreError,
    /// Failures since the last successful save, including this one.
    pub consecutive_failures: u32,
}

pub type SaveFailureHook = Arc<dyn Fn(&SaveFailure<'_>) + Send + Sync>;

#[derive(Clone)]
pub struct SessionConfig {
    /// Quiet period after the last edit before a save is attempted.
    pub debounce: Duration,
    /// Consecutive failures after which failures are logged as errors.
    pub escalate_after: u32,
    /// Called once per failed save attempt, outside the session lock.
    pub on_save_failure: Option<SaveFailureHook>,
}

impl SessionConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_escalate_after(mut self, failures: u32) -> Self {
        self.escalate_after = failures.max(1);
        self
    }

    pub fn on_save_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SaveFailure<'_>) + Send + Sync + 'static,
    {
        self.on_save_failure = Some(Arc::new(hook));
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            escalate_after: DEFAULT_ESCALATE_AFTER,
            on_save_failure: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("debounce", &self.debounce)
            .field("escalate_after", &self.escalate_after)
            .field("on_save_failure", &self.on_save_failure.is_some())
            .finish()
    }
}
