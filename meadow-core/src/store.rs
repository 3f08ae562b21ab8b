//! Persisted key/value store seam and the game-document binding on top of it.
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::mirror::StateMirror;
use crate::snapshot::{STORE_KEY, SnapshotError, StoreDocument};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// String key/value storage backing the game.
#[async_trait]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value on the bot's behalf. Not reported by [`KeyValueStore::drain_writes`].
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Values written under `key` by other writers since the last drain, oldest first.
    async fn drain_writes(&self, key: &str) -> Result<Vec<String>, StoreError>;
}

/// The game's document under its single key.
///
/// Every write made through here feeds the [`StateMirror`] before returning,
/// so the mirror is never stale right after a patch.
#[derive(Debug)]
pub struct GameStore<K> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> GameStore<K> {
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, STORE_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and parse the current document. `None` when the key is unset.
    ///
    /// # Errors
    ///
    /// Fails when the backend fails or the stored value is not a game document.
    pub async fn load(&self) -> Result<Option<StoreDocument>, StoreError> {
        match self.backend.get(&self.key).await? {
            Some(raw) => Ok(Some(StoreDocument::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the stored document and update the mirror.
    ///
    /// # Errors
    ///
    /// Fails when serialization or the backend write fails; the mirror is untouched then.
    pub async fn write(
        &self,
        doc: &StoreDocument,
        mirror: &mut StateMirror,
    ) -> Result<(), StoreError> {
        let raw = doc.to_json()?;
        self.backend.set(&self.key, &raw).await?;
        mirror.apply(doc);
        Ok(())
    }

    /// Feed writes made by the game since the last sync into the mirror.
    /// Returns how many were accepted.
    ///
    /// # Errors
    ///
    /// Fails only when the backend cannot be drained; bad values are skipped.
    pub async fn sync(&self, mirror: &mut StateMirror) -> Result<usize, StoreError> {
        let writes = self.backend.drain_writes(&self.key).await?;
        let accepted = writes
            .iter()
            .filter(|raw| mirror.observe(raw).is_ok())
            .count();
        if !writes.is_empty() {
            debug!("synced {accepted}/{} observed store writes", writes.len());
        }
        Ok(accepted)
    }

    /// Drop game writes queued since the last sync without parsing them.
    /// The current value supersedes them; see [`GameStore::refresh`].
    ///
    /// # Errors
    ///
    /// Fails only when the backend cannot be drained.
    pub async fn discard_pending(&self) -> Result<usize, StoreError> {
        let dropped = self.backend.drain_writes(&self.key).await?.len();
        if dropped > 0 {
            debug!("discarded {dropped} stale store writes");
        }
        Ok(dropped)
    }

    /// Load the current value into the mirror, as at bot start.
    ///
    /// # Errors
    ///
    /// Fails only when the backend read fails.
    pub async fn refresh(&self, mirror: &mut StateMirror) -> Result<bool, StoreError> {
        match self.backend.get(&self.key).await? {
            Some(raw) => Ok(mirror.observe(&raw).is_ok()),
            None => Ok(false),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    pending: HashMap<String, Vec<String>>,
    own_writes: u64,
}

/// In-process store backing the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .lock()
            .values
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Simulate the game itself writing a value.
    pub fn external_write(&self, key: &str, value: &str) {
        let mut inner = self.lock();
        inner.values.insert(key.to_string(), value.to_string());
        inner
            .pending
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    /// Number of writes issued through [`KeyValueStore::set`].
    #[must_use]
    pub fn own_writes(&self) -> u64 {
        self.lock().own_writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.values.insert(key.to_string(), value.to_string());
        inner.own_writes += 1;
        Ok(())
    }

    async fn drain_writes(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().pending.remove(key).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"_state": {"pointsByItem": {"1": 50}, "purchasedItems": {}}}"#;

    #[tokio::test]
    async fn write_updates_mirror_before_returning() {
        let store = GameStore::new(MemoryStore::with_value(STORE_KEY, DOC));
        let mut mirror = StateMirror::new("0");
        let mut doc = store.load().await.unwrap().unwrap();
        doc.state.points_by_item.insert("2".into(), 25.0);
        store.write(&doc, &mut mirror).await.unwrap();
        assert_eq!(mirror.summary().unwrap().total_points, 75);
        assert_eq!(store.backend().own_writes(), 1);
        let stored = StoreDocument::parse(&store.backend().value(STORE_KEY).unwrap()).unwrap();
        assert_eq!(stored, doc);
    }

    #[tokio::test]
    async fn sync_applies_external_writes_in_order() {
        let store = GameStore::new(MemoryStore::new());
        let mut mirror = StateMirror::new("0");
        store.backend().external_write(STORE_KEY, DOC);
        store.backend().external_write(STORE_KEY, "{not json");
        store.backend().external_write(
            STORE_KEY,
            r#"{"_state": {"pointsByItem": {"1": 90}, "purchasedItems": {}}}"#,
        );
        assert_eq!(store.sync(&mut mirror).await.unwrap(), 2);
        assert_eq!(mirror.summary().unwrap().total_points, 90);
        assert_eq!(store.sync(&mut mirror).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn discarded_writes_are_never_parsed() {
        let store = GameStore::new(MemoryStore::new());
        let mut mirror = StateMirror::new("0");
        store.backend().external_write(STORE_KEY, "{not json");
        store.backend().external_write(STORE_KEY, DOC);
        assert_eq!(store.discard_pending().await.unwrap(), 2);
        assert_eq!(store.sync(&mut mirror).await.unwrap(), 0);
        assert_eq!(mirror.updates(), 0);
        assert!(store.refresh(&mut mirror).await.unwrap());
        assert_eq!(mirror.updates(), 1);
        assert_eq!(mirror.summary().unwrap().total_points, 50);
    }

    #[tokio::test]
    async fn missing_key_loads_nothing() {
        let store = GameStore::new(MemoryStore::new());
        let mut mirror = StateMirror::new("0");
        assert!(store.load().await.unwrap().is_none());
        assert!(!store.refresh(&mut mirror).await.unwrap());
        assert!(mirror.summary().is_none());
    }

    #[tokio::test]
    async fn own_writes_are_not_replayed() {
        let store = GameStore::new(MemoryStore::new());
        store.backend().set(STORE_KEY, DOC).await.unwrap();
        assert!(store.backend().drain_writes(STORE_KEY).await.unwrap().is_empty());
    }
}
