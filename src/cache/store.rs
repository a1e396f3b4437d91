//! Persistent record store contract.
//!
//! A [`RecordStore`] keeps at most one [`StoredRecord`] per fingerprint.
//! Implementations report failures as [`StoreError`]; the promotion cache
//! decides what a failure means for the request (it never fails one).

use super::fingerprint::Fingerprint;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Document shape persisted for a promoted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Fingerprint string of the originating request.
    pub params: String,
    /// Canonical payload text.
    pub data: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store credentials unusable: {0}")]
    Credentials(String),

    #[error("store connection failed: {0}")]
    Connect(String),

    #[error("store operation failed: {0}")]
    Operation(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// What a write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// A record already existed; nothing was changed.
    AlreadyPresent,
}

/// Field changes for the administrative update path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub data: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    async fn exists(&self, fp: &Fingerprint) -> StoreResult<bool>;

    async fn read(&self, fp: &Fingerprint) -> StoreResult<Option<String>>;

    /// Insert a record unless one exists for `fp`. Never overwrites.
    async fn write(&self, fp: &Fingerprint, payload: &str) -> StoreResult<WriteOutcome>;

    /// Returns whether a record matched.
    async fn update(&self, fp: &Fingerprint, update: RecordUpdate) -> StoreResult<bool>;

    /// Returns whether a record was removed.
    async fn delete(&self, fp: &Fingerprint) -> StoreResult<bool>;

    /// Round-trip check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}

/// Process-local store, used when persistence is disabled and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Fingerprint, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, fp: &Fingerprint) -> StoreResult<bool> {
        Ok(self.records.read().contains_key(fp))
    }

    async fn read(&self, fp: &Fingerprint) -> StoreResult<Option<String>> {
        Ok(self.records.read().get(fp).cloned())
    }

    async fn write(&self, fp: &Fingerprint, payload: &str) -> StoreResult<WriteOutcome> {
        let mut records = self.records.write();
        if records.contains_key(fp) {
            return Ok(WriteOutcome::AlreadyPresent);
        }
        records.insert(fp.clone(), payload.to_string());
        Ok(WriteOutcome::Inserted)
    }

    async fn update(&self, fp: &Fingerprint, update: RecordUpdate) -> StoreResult<bool> {
        let mut records = self.records.write();
        match records.get_mut(fp) {
            Some(data) => {
                if let Some(new_data) = update.data {
                    *data = new_data;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, fp: &Fingerprint) -> StoreResult<bool> {
        Ok(self.records.write().remove(fp).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Stand-in used when the real store could not be configured.
/// Every call fails, so the gateway serves everything from upstream.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl RecordStore for UnavailableStore {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    async fn exists(&self, _fp: &Fingerprint) -> StoreResult<bool> {
        Err(self.err())
    }

    async fn read(&self, _fp: &Fingerprint) -> StoreResult<Option<String>> {
        Err(self.err())
    }

    async fn write(&self, _fp: &Fingerprint, _payload: &str) -> StoreResult<WriteOutcome> {
        Err(self.err())
    }

    async fn update(&self, _fp: &Fingerprint, _update: RecordUpdate) -> StoreResult<bool> {
        Err(self.err())
    }

    async fn delete(&self, _fp: &Fingerprint) -> StoreResult<bool> {
        Err(self.err())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_once() {
        let store = MemoryStore::new();
        let fp = Fingerprint::build([("pageNo", "1")]);

        assert!(!store.exists(&fp).await.unwrap());
        assert_eq!(store.write(&fp, "A").await.unwrap(), WriteOutcome::Inserted);
        assert!(store.exists(&fp).await.unwrap());
        assert_eq!(
            store.write(&fp, "B").await.unwrap(),
            WriteOutcome::AlreadyPresent
        );
        assert_eq!(store.read(&fp).await.unwrap().as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let fp = Fingerprint::build([("pageNo", "1")]);

        let update = RecordUpdate {
            data: Some("B".to_string()),
        };
        assert!(!store.update(&fp, update.clone()).await.unwrap());

        store.write(&fp, "A").await.unwrap();
        assert!(store.update(&fp, update).await.unwrap());
        assert_eq!(store.read(&fp).await.unwrap().as_deref(), Some("B"));

        assert!(store.delete(&fp).await.unwrap());
        assert!(!store.delete(&fp).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_everything() {
        let store = UnavailableStore::new("no credentials");
        let fp = Fingerprint::build([("pageNo", "1")]);

        assert!(matches!(store.read(&fp).await, Err(StoreError::Unavailable(_))));
        assert!(store.write(&fp, "A").await.is_err());
        assert!(store.ping().await.is_err());
    }
}
