//! Optimistic edit sessions.
//!
//! An [`EditSession`] owns the working copy of one document. Edits replace the
//! working copy immediately; a debounce timer saves it to the remote store once
//! the edits settle. The session remembers the last value the store
//! acknowledged and is dirty whenever the working copy differs from it.
//!
//! Lifecycle: open (clean) → editing (dirty, timer armed) → saving (one attempt
//! in flight, carrying a copy of the working state taken at dispatch) →
//! reconciling (on success the acknowledged value becomes the copy that was
//! sent; if the user kept editing the session stays dirty and re-arms the
//! timer) → editing or clean → closed.
//!
//! At most one save is in flight per session. A timer firing during a save does
//! nothing; the reconcile step re-arms it instead. Failed saves leave the
//! acknowledged value untouched, are reported through the failure hook, and
//! are retried only when the timer next fires.
//!
//! A session has unsaved changes when it is dirty, or when the attempt in
//! flight carries a value the working copy has since moved away from (an
//! edit reverted during a save is clean against the old acknowledged value
//! but will be dirty once the stale save lands).

pub mod comparator;
pub mod config;
pub mod handlers;
pub mod registry;
pub mod status;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use comparator::{Snapshot, SnapshotError};
pub use config::{SaveFailure, SessionConfig};
pub use status::{CloseReport, SaveIndicator, SaveOutcome, SessionStatus};

use crate::edits::MutationError;
use crate::store::{RemoteStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("failed to load document: {0}")]
    Load(#[source] StoreError),

    #[error("save failed: {0}")]
    Save(#[source] StoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("session is closed")]
    Closed,

    #[error("session {0} not found")]
    UnknownSession(Uuid),

    #[error("session has unsaved changes")]
    UnsavedChanges,
}

/// Handle to one document's edit session. Cloning shares the session.
pub struct EditSession<S: RemoteStore + ?Sized> {
    inner: Arc<Inner<S>>,
}

impl<S: RemoteStore + ?Sized> Clone for EditSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S: RemoteStore + ?Sized> {
    key: S::Key,
    store: Arc<S>,
    config: SessionConfig,
    state: Mutex<State<S::Document>>,
    status_tx: watch::Sender<SessionStatus>,
}

struct State<D> {
    working: D,
    working_snapshot: Snapshot,
    acknowledged_snapshot: Snapshot,
    /// Cached `working_snapshot != acknowledged_snapshot`.
    dirty: bool,
    saving: bool,
    /// Snapshot of the value carried by the attempt in flight.
    in_flight: Option<Snapshot>,
    closed: bool,
    last_activity: Instant,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every arm/cancel; a timer only fires if its generation is current.
    timer_generation: u64,
    consecutive_failures: u32,
}

impl<D> State<D> {
    fn status(&self) -> SessionStatus {
        SessionStatus {
            dirty: self.dirty,
            saving: self.saving,
        }
    }

    fn has_unsaved(&self) -> bool {
        self.dirty
            || self
                .in_flight
                .as_ref()
                .is_some_and(|sent| *sent != self.working_snapshot)
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn cancel_timer(&mut self) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// A dispatched save: the working copy as it was when the attempt started.
struct SaveAttempt<D> {
    value: D,
    snapshot: Snapshot,
}

impl<S: RemoteStore + ?Sized> EditSession<S> {
    /// Opens a clean session over `initial`, which should be the latest value
    /// the store holds for `key` (or the caller's default when it holds none).
    pub fn open(
        store: Arc<S>,
        key: S::Key,
        initial: S::Document,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let snapshot = Snapshot::capture(&initial)?;
        let state = State {
            working: initial,
            working_snapshot: snapshot.clone(),
            acknowledged_snapshot: snapshot,
            dirty: false,
            saving: false,
            in_flight: None,
            closed: false,
            last_activity: Instant::now(),
            timer: None,
            timer_generation: 0,
            consecutive_failures: 0,
        };
        let (status_tx, _) = watch::channel(SessionStatus::default());

        debug!(key = %key, "Opened edit session");
        Ok(Self {
            inner: Arc::new(Inner {
                key,
                store,
                config,
                state: Mutex::new(state),
                status_tx,
            }),
        })
    }

    /// Loads `key` from the store and opens a session over it. A missing
    /// document falls back to `default`; without one the session is not opened.
    pub async fn load(
        store: Arc<S>,
        key: S::Key,
        default: Option<S::Document>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let initial = match store.load(&key).await.map_err(SessionError::Load)? {
            Some(document) => document,
            None => default.ok_or_else(|| SessionError::NotFound(key.to_string()))?,
        };
        Self::open(store, key, initial, config)
    }

    pub fn key(&self) -> &S::Key {
        &self.inner.key
    }

    /// The working copy, including edits not yet saved. Counts as activity.
    pub fn document(&self) -> S::Document {
        let mut state = self.lock();
        state.touch();
        state.working.clone()
    }

    /// Canonical form of the last value the store acknowledged.
    #[cfg(test)]
    pub fn acknowledged(&self) -> Snapshot {
        self.lock().acknowledged_snapshot.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    /// True when closing now would lose edits, counting a stale save in flight.
    pub fn has_unsaved_changes(&self) -> bool {
        self.lock().has_unsaved()
    }

    /// Receives every status change; drives the "Saving… / Unsaved / Saved" affordance.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status_tx.subscribe()
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Replaces the working copy with `transform(working)`.
    ///
    /// When the result differs from the acknowledged value the debounce timer
    /// restarts with the full delay; when it matches, any pending save is
    /// cancelled. `transform` runs under the session lock and must not call
    /// back into the session.
    pub fn mutate<F>(&self, transform: F) -> Result<SessionStatus, SessionError>
    where
        F: FnOnce(&S::Document) -> S::Document,
    {
        self.try_mutate(|document| Ok::<_, SessionError>(transform(document)))
    }

    /// Fallible form of [`mutate`](Self::mutate). An error from `transform`
    /// leaves the session untouched.
    pub fn try_mutate<F, E>(&self, transform: F) -> Result<SessionStatus, E>
    where
        F: FnOnce(&S::Document) -> Result<S::Document, E>,
        E: From<SessionError>,
    {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            return Err(SessionError::Closed.into());
        }

        let next = transform(&state.working)?;
        let snapshot = Snapshot::capture(&next).map_err(SessionError::from)?;

        state.dirty = snapshot != state.acknowledged_snapshot;
        state.working = next;
        state.working_snapshot = snapshot;
        state.touch();

        if state.dirty {
            self.arm_timer(state);
        } else {
            state.cancel_timer();
        }

        let status = state.status();
        self.publish(status);
        Ok(status)
    }

    /// Saves now, bypassing the debounce delay.
    ///
    /// If a save is already in flight this waits for it and then re-checks,
    /// so two saves are never in flight at once and a stale attempt is
    /// followed by one carrying the working copy. A session that is clean
    /// with nothing in flight returns [`SaveOutcome::Clean`] without touching
    /// the store.
    pub async fn force_save(&self) -> Result<SaveOutcome, SessionError> {
        let mut status_rx = self.subscribe();
        loop {
            let attempt = {
                let mut guard = self.lock();
                let state = &mut *guard;
                if state.closed {
                    return Err(SessionError::Closed);
                }
                state.touch();
                if state.saving {
                    None
                } else if !state.dirty {
                    return Ok(SaveOutcome::Clean);
                } else {
                    state.cancel_timer();
                    self.begin_attempt(state)
                }
            };

            match attempt {
                Some(attempt) => {
                    return self
                        .run_attempt(attempt)
                        .await
                        .map(|()| SaveOutcome::Saved)
                        .map_err(SessionError::Save);
                }
                None => {
                    if status_rx.wait_for(|s| !s.saving).await.is_err() {
                        return Err(SessionError::Closed);
                    }
                }
            }
        }
    }

    /// Restarts the debounce timer if there is anything to save. This is how
    /// a caller retries after a failed save without making another edit.
    pub fn schedule_save(&self) -> Result<SessionStatus, SessionError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            return Err(SessionError::Closed);
        }
        state.touch();
        if state.dirty {
            self.arm_timer(state);
        }
        Ok(state.status())
    }

    /// Closes the session without saving. A save already in flight is allowed
    /// to finish in the background. Closing twice is harmless.
    pub fn close(&self) -> CloseReport {
        let mut guard = self.lock();
        let state = &mut *guard;
        let had_unsaved_changes = state.has_unsaved();
        if !state.closed {
            state.closed = true;
            state.cancel_timer();
            if had_unsaved_changes {
                info!(key = %self.inner.key, "Edit session closed with unsaved changes");
            } else {
                debug!(key = %self.inner.key, "Edit session closed");
            }
        }
        CloseReport {
            had_unsaved_changes,
        }
    }

    /// Closes the session if nothing has touched it for `max_idle` and closing
    /// loses nothing: no unsaved changes and no save in flight.
    pub fn close_if_idle(&self, max_idle: Duration) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            return true;
        }
        if state.saving || state.has_unsaved() || state.last_activity.elapsed() < max_idle {
            return false;
        }
        state.closed = true;
        state.cancel_timer();
        debug!(key = %self.inner.key, "Edit session closed after idling");
        true
    }

    fn lock(&self) -> MutexGuard<'_, State<S::Document>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, status: SessionStatus) {
        self.inner.status_tx.send_replace(status);
    }

    fn arm_timer(&self, state: &mut State<S::Document>) {
        state.cancel_timer();
        let generation = state.timer_generation;
        let delay = self.inner.config.debounce;
        let session = self.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.on_timer(generation).await;
        }));
    }

    async fn on_timer(&self, generation: u64) {
        let attempt = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.timer_generation != generation {
                return;
            }
            // From here on nothing aborts this task; the save runs to completion.
            state.timer = None;
            self.begin_attempt(state)
        };

        if let Some(attempt) = attempt {
            // Failures are reported through the hook inside run_attempt.
            let _ = self.run_attempt(attempt).await;
        }
    }

    /// Claims the single in-flight slot, or returns `None` when there is
    /// nothing to do: closed, already saving, or clean.
    fn begin_attempt(&self, state: &mut State<S::Document>) -> Option<SaveAttempt<S::Document>> {
        if state.closed || state.saving || !state.dirty {
            return None;
        }
        state.saving = true;
        state.in_flight = Some(state.working_snapshot.clone());
        self.publish(state.status());
        Some(SaveAttempt {
            value: state.working.clone(),
            snapshot: state.working_snapshot.clone(),
        })
    }

    async fn run_attempt(&self, attempt: SaveAttempt<S::Document>) -> Result<(), StoreError> {
        debug!(key = %self.inner.key, "Saving document");
        let result = self.inner.store.save(&self.inner.key, &attempt.value).await;

        let failures = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.saving = false;
            state.in_flight = None;

            let failures = match &result {
                Ok(()) => {
                    state.acknowledged_snapshot = attempt.snapshot;
                    state.dirty = state.working_snapshot != state.acknowledged_snapshot;
                    state.consecutive_failures = 0;
                    if state.dirty && !state.closed {
                        debug!(key = %self.inner.key, "Edited during save, scheduling another");
                        self.arm_timer(state);
                    }
                    None
                }
                Err(_) => {
                    state.consecutive_failures += 1;
                    Some(state.consecutive_failures)
                }
            };

            self.publish(state.status());
            failures
        };

        if let (Err(e), Some(consecutive_failures)) = (&result, failures) {
            self.report_failure(e, consecutive_failures);
        }
        result
    }

    fn report_failure(&self, error: &StoreError, consecutive_failures: u32) {
        let key = self.inner.key.to_string();
        if consecutive_failures >= self.inner.config.escalate_after {
            error!(
                key = %key,
                consecutive_failures,
                "Save failed repeatedly; changes are still unsaved: {error}"
            );
        } else {
            warn!(key = %key, consecutive_failures, "Save failed: {error}");
        }

        if let Some(hook) = &self.inner.config.on_save_failure {
            hook(&SaveFailure {
                key: &key,
                error,
                consecutive_failures,
            });
        }
    }
}
