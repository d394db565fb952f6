//! Remote store contract consumed by edit sessions and handlers.
//!
//! Documents are always read and written whole. Each call resolves once,
//! success or failure; retry and timeout policy belongs to the implementation.

pub mod blob;
#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::Application;
use crate::models::profile::Profile;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("blob storage error: {0}")]
    Blob(String),

    /// The store could not be reached at all; the request may succeed later.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Anything an edit session can hold. Must serialize so the snapshot
/// comparator can see its full shape.
pub trait Document: Clone + Serialize + Send + Sync + 'static {}

impl<T> Document for T where T: Clone + Serialize + Send + Sync + 'static {}

#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    type Key: Clone + Debug + Display + PartialEq + Send + Sync + 'static;
    type Document: Document;

    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn load(&self, key: &Self::Key) -> Result<Option<Self::Document>, StoreError>;

    /// Persists `value` in full, replacing whatever was stored under `key`.
    async fn save(&self, key: &Self::Key, value: &Self::Document) -> Result<(), StoreError>;
}

/// Profiles keyed by user id.
pub trait ProfileStore: RemoteStore<Key = Uuid, Document = Profile> {}

impl<T> ProfileStore for T where T: RemoteStore<Key = Uuid, Document = Profile> {}

/// Applications keyed by application id, with the listing the dashboard needs.
#[async_trait]
pub trait ApplicationStore: RemoteStore<Key = Uuid, Document = Application> {
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Binary uploads (original resumes, published portfolio pages).
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Stores `bytes` under `key` and returns the public URL it is served from.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str)
        -> Result<String, StoreError>;
}
