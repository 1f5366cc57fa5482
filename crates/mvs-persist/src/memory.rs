//! In-memory persistence backends for tests and ephemeral stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use mvs_types::{QueryRequest, UpsertRecord};
use serde_json::Value;
use tracing::debug;

use crate::error::{PersistError, PersistResult};
use crate::traits::{collapse_results, LocalStore, PersistenceAdapter, RemoteTransport};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// InMemoryLocalStore
// ---------------------------------------------------------------------------

/// A [`LocalStore`] holding blobs in a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryLocalStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for InMemoryLocalStore {
    fn read(&self, key: &str) -> PersistResult<Option<String>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| PersistError::Lock(e.to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> PersistResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| PersistError::Lock(e.to_string()))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistResult<bool> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| PersistError::Lock(e.to_string()))?;
        Ok(blobs.remove(key).is_some())
    }
}

// ---------------------------------------------------------------------------
// InMemoryTransport
// ---------------------------------------------------------------------------

/// A [`RemoteTransport`] serving seeded records and recording upserts.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    records: RwLock<HashMap<String, Vec<Value>>>,
    upserts: RwLock<Vec<UpsertRecord>>,
    failing: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `records` the result set for `model_class`.
    pub fn seed(&self, model_class: impl Into<String>, records: Vec<Value>) {
        write(&self.records).insert(model_class.into(), records);
    }

    /// Every upserted record, in arrival order.
    pub fn upserts(&self) -> Vec<UpsertRecord> {
        read(&self.upserts).clone()
    }

    /// While set, every call fails with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> PersistResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Transport("simulated failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTransport for InMemoryTransport {
    async fn list(&self, query: &QueryRequest) -> PersistResult<Vec<Value>> {
        self.check()?;
        let records = read(&self.records);
        Ok(records
            .get(&query.model_class)
            .map(|rs| rs.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, records: &[UpsertRecord]) -> PersistResult<()> {
        self.check()?;
        write(&self.upserts).extend_from_slice(records);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryPersistence
// ---------------------------------------------------------------------------

/// A synchronous [`PersistenceAdapter`] that keeps snapshots as values and
/// records every remote interaction, for inspecting what a store persisted.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    local: RwLock<HashMap<String, Value>>,
    remote: RwLock<HashMap<String, Vec<Value>>>,
    queries: RwLock<Vec<QueryRequest>>,
    writes: RwLock<Vec<UpsertRecord>>,
    saves: RwLock<Vec<String>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a local snapshot.
    pub fn set_local(&self, key: impl Into<String>, state: Value) {
        write(&self.local).insert(key.into(), state);
    }

    pub fn local_snapshot(&self, key: &str) -> Option<Value> {
        read(&self.local).get(key).cloned()
    }

    /// Keys passed to `save_local`, in call order.
    pub fn saves(&self) -> Vec<String> {
        read(&self.saves).clone()
    }

    /// Make `records` the result set for `model_class`.
    pub fn seed_remote(&self, model_class: impl Into<String>, records: Vec<Value>) {
        write(&self.remote).insert(model_class.into(), records);
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        read(&self.queries).clone()
    }

    pub fn remote_writes(&self) -> Vec<UpsertRecord> {
        read(&self.writes).clone()
    }
}

impl PersistenceAdapter for InMemoryPersistence {
    fn load_local(&self, key: &str) -> Option<Value> {
        self.local_snapshot(key)
    }

    fn save_local(&self, key: &str, state: &Value) {
        write(&self.local).insert(key.to_string(), state.clone());
        write(&self.saves).push(key.to_string());
    }

    fn query_remote(&self, query: &QueryRequest) -> Option<Value> {
        write(&self.queries).push(query.clone());
        let remote = read(&self.remote);
        let records = remote.get(&query.model_class)?;
        let matching = records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        Some(collapse_results(matching))
    }

    fn write_remote(&self, record: UpsertRecord) {
        debug!(name = %record.name, ty = %record.type_name, "recorded remote write");
        write(&self.writes).push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn filters(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn local_store_round_trip() {
        let store = InMemoryLocalStore::new();
        assert_eq!(store.read("app").unwrap(), None);
        store.write("app", "{}").unwrap();
        assert_eq!(store.read("app").unwrap().as_deref(), Some("{}"));
        assert!(store.remove("app").unwrap());
        assert!(!store.remove("app").unwrap());
    }

    #[tokio::test]
    async fn transport_filters_seeded_records() {
        let t = InMemoryTransport::new();
        t.seed("TaskList", vec![json!({"title": "a"}), json!({"title": "b"})]);
        let q = QueryRequest::new("TaskList", filters(&[("title", json!("b"))]));
        assert_eq!(t.list(&q).await.unwrap(), vec![json!({"title": "b"})]);
        let q = QueryRequest::new("Other", Map::new());
        assert!(t.list(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failures() {
        let t = InMemoryTransport::new();
        t.set_failing(true);
        let r = UpsertRecord::new("list", "TaskList", json!({}));
        assert!(matches!(t.upsert(&[r]).await, Err(PersistError::Transport(_))));
        assert!(t.upserts().is_empty());
    }

    #[test]
    fn persistence_records_interactions() {
        let p = InMemoryPersistence::new();
        p.seed_remote("TaskList", vec![json!({"title": "a", "tasks": []})]);

        let q = QueryRequest::new("TaskList", filters(&[("title", json!("a"))]));
        assert_eq!(p.query_remote(&q), Some(json!({"title": "a", "tasks": []})));
        assert_eq!(p.queries().len(), 1);

        p.save_local("app", &json!({"x": 1}));
        assert_eq!(p.load_local("app"), Some(json!({"x": 1})));
        assert_eq!(p.saves(), vec!["app"]);

        p.write_remote(UpsertRecord::new("list", "TaskList", json!({})));
        assert_eq!(p.remote_writes().len(), 1);
    }
}
