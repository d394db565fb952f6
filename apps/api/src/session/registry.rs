use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::comparator;
use crate::session::{CloseReport, EditSession, SessionConfig, SessionError};
use crate::store::{RemoteStore, StoreError};

/// Failed saves seen across every session of a registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveFailureStats {
    pub failed_saves: u64,
    pub last_error: Option<String>,
}

/// Open edit sessions for one kind of document, addressed by session id.
///
/// At most one session exists per document key; opening a key that already
/// has a session returns that session.
pub struct SessionRegistry<S: RemoteStore + ?Sized> {
    store: Arc<S>,
    config: SessionConfig,
    sessions: Mutex<HashMap<Uuid, EditSession<S>>>,
    failures: Arc<Mutex<SaveFailureStats>>,
}

impl<S: RemoteStore + ?Sized> SessionRegistry<S> {
    /// Sessions opened here report failed saves to the registry's stats and
    /// then to any hook already in `config`.
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        let failures = Arc::new(Mutex::new(SaveFailureStats::default()));
        let stats = Arc::clone(&failures);
        let hook = config.on_save_failure.clone();
        let config = config.on_save_failure(move |failure| {
            {
                let mut stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
                stats.failed_saves += 1;
                stats.last_error = Some(format!(
                    "{}: {} ({} in a row)",
                    failure.key, failure.error, failure.consecutive_failures
                ));
            }
            if let Some(hook) = &hook {
                hook(failure);
            }
        });
        Self {
            store,
            config,
            sessions: Mutex::new(HashMap::new()),
            failures,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn open(
        &self,
        key: S::Key,
        default: Option<S::Document>,
    ) -> Result<(Uuid, EditSession<S>), SessionError> {
        if let Some(existing) = self.find_by_key(&key) {
            return Ok(existing);
        }

        let session =
            EditSession::load(Arc::clone(&self.store), key.clone(), default, self.config.clone())
                .await?;

        let mut sessions = self.lock();
        // Another request may have opened the same key while this one was loading.
        if let Some((id, existing)) = sessions.iter().find(|(_, s)| s.key() == &key) {
            return Ok((*id, existing.clone()));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, session.clone());
        info!("Opened edit session {id} for {key}");
        Ok((id, session))
    }

    pub fn get(&self, id: Uuid) -> Result<EditSession<S>, SessionError> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownSession(id))
    }

    pub fn find_by_key(&self, key: &S::Key) -> Option<(Uuid, EditSession<S>)> {
        self.lock()
            .iter()
            .find(|(_, s)| s.key() == key)
            .map(|(id, s)| (*id, s.clone()))
    }

    /// Navigation guard: a session with unsaved changes is only closed when the
    /// caller explicitly discards them. Otherwise it stays open and
    /// `UnsavedChanges` is returned.
    pub fn close(&self, id: Uuid, discard: bool) -> Result<CloseReport, SessionError> {
        Self::close_in(&mut self.lock(), id, discard)
    }

    /// [`close`](Self::close) for whichever session is open on `key`.
    /// `Ok(None)` when there is none.
    pub fn close_key(
        &self,
        key: &S::Key,
        discard: bool,
    ) -> Result<Option<CloseReport>, SessionError> {
        let mut sessions = self.lock();
        let Some(id) = sessions
            .iter()
            .find(|(_, s)| s.key() == key)
            .map(|(id, _)| *id)
        else {
            return Ok(None);
        };
        Self::close_in(&mut sessions, id, discard).map(Some)
    }

    fn close_in(
        sessions: &mut HashMap<Uuid, EditSession<S>>,
        id: Uuid,
        discard: bool,
    ) -> Result<CloseReport, SessionError> {
        let session = sessions
            .get(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        if session.has_unsaved_changes() && !discard {
            return Err(SessionError::UnsavedChanges);
        }
        let report = session.close();
        sessions.remove(&id);
        info!(
            "Closed edit session {id} (discarded unsaved changes: {})",
            report.had_unsaved_changes
        );
        Ok(report)
    }

    /// Closes and forgets every session left untouched for `max_idle`.
    /// Sessions with unsaved changes or a save in flight are kept however
    /// long they have been idle. Returns how many were swept.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let swept = session.close_if_idle(max_idle);
            if swept {
                debug!("Swept idle edit session {id}");
            }
            !swept
        });
        before - sessions.len()
    }

    /// The freshest copy of a document: the working copy of an open session,
    /// or whatever the store holds.
    pub async fn current(&self, key: &S::Key) -> Result<Option<S::Document>, StoreError> {
        match self.find_by_key(key) {
            Some((_, session)) => Ok(Some(session.document())),
            None => self.store.load(key).await,
        }
    }

    /// Applies `transform` to a document. With an open session the edit goes
    /// through it and is saved by its autosave; without one the document is
    /// loaded, transformed and saved immediately.
    pub async fn update<F, E>(&self, key: &S::Key, transform: F) -> Result<S::Document, E>
    where
        F: FnOnce(&S::Document) -> Result<S::Document, E>,
        E: From<SessionError> + From<StoreError>,
    {
        if let Some((_, session)) = self.find_by_key(key) {
            session.try_mutate(transform)?;
            return Ok(session.document());
        }

        let current = self
            .store
            .load(key)
            .await?
            .ok_or_else(|| SessionError::NotFound(key.to_string()))?;
        let next = transform(&current)?;
        if !comparator::equal(&current, &next).map_err(SessionError::from)? {
            self.store.save(key, &next).await?;
        }
        Ok(next)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn failure_stats(&self) -> SaveFailureStats {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, EditSession<S>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
