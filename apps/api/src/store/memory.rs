//! In-process stores backing handler and registry tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::models::application::Application;
use crate::models::profile::Profile;
use crate::store::{ApplicationStore, BlobStore, RemoteStore, StoreError};

/// Holds saves open until released, for tests that need a save in flight.
#[derive(Default)]
pub struct SaveGate {
    held: Mutex<Option<Arc<Notify>>>,
}

impl SaveGate {
    pub fn hold(&self) {
        *self.held.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(notify) = self.held.lock().unwrap().take() {
            notify.notify_waiters();
        }
    }

    async fn pass(&self) {
        let held = self.held.lock().unwrap().clone();
        if let Some(notify) = held {
            notify.notified().await;
        }
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<Uuid, Profile>>,
    pub saves: Mutex<Vec<Profile>>,
    pub gate: SaveGate,
}

impl MemoryProfileStore {
    pub fn with(profile: Profile) -> Self {
        let store = Self::default();
        store.rows.lock().unwrap().insert(profile.user_id, profile);
        store
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn stored(&self, user_id: Uuid) -> Option<Profile> {
        self.rows.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryProfileStore {
    type Key = Uuid;
    type Document = Profile;

    async fn load(&self, key: &Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &Uuid, value: &Profile) -> Result<(), StoreError> {
        self.gate.pass().await;
        self.rows.lock().unwrap().insert(*key, value.clone());
        self.saves.lock().unwrap().push(value.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryApplicationStore {
    rows: Mutex<HashMap<Uuid, Application>>,
    pub gate: SaveGate,
}

impl MemoryApplicationStore {
    pub fn insert(&self, application: Application) {
        self.rows
            .lock()
            .unwrap()
            .insert(application.id, application);
    }

    pub fn stored(&self, id: Uuid) -> Option<Application> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryApplicationStore {
    type Key = Uuid;
    type Document = Application;

    async fn load(&self, key: &Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &Uuid, value: &Application) -> Result<(), StoreError> {
        self.gate.pass().await;
        self.rows.lock().unwrap().insert(*key, value.clone());
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let mut apps: Vec<Application> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(format!("https://cdn.test/{key}"))
    }
}
