//! The production [`PersistenceAdapter`].

use std::sync::Arc;

use mvs_types::{QueryRequest, StoreConfig, UpsertRecord};
use serde_json::Value;
use tracing::{debug, warn};

use crate::channel::RemoteChannel;
use crate::error::PersistResult;
use crate::file::FileLocalStore;
use crate::http::HttpTransport;
use crate::traits::{LocalStore, PersistenceAdapter, RemoteTransport};

/// Local snapshots through a [`LocalStore`], remote calls through an optional
/// [`RemoteChannel`]. Every failure is logged and swallowed.
pub struct StandardPersistence {
    local: Arc<dyn LocalStore>,
    remote: Option<RemoteChannel>,
}

impl StandardPersistence {
    /// Local persistence only; remote loads find nothing and remote writes
    /// are dropped.
    pub fn local_only(local: Arc<dyn LocalStore>) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    pub fn new(local: Arc<dyn LocalStore>, transport: Arc<dyn RemoteTransport>) -> PersistResult<Self> {
        Ok(Self {
            local,
            remote: Some(RemoteChannel::new(transport)?),
        })
    }

    /// File snapshots under `config.local_dir` and the HTTP endpoint named by
    /// `config`.
    pub fn from_config(config: &StoreConfig) -> PersistResult<Self> {
        let local = Arc::new(FileLocalStore::new(&config.local_dir));
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        Self::new(local, transport)
    }

    pub fn remote(&self) -> Option<&RemoteChannel> {
        self.remote.as_ref()
    }

    /// Wait for outstanding remote writes.
    pub fn flush(&self) -> PersistResult<()> {
        match &self.remote {
            Some(remote) => remote.flush(),
            None => Ok(()),
        }
    }
}

impl PersistenceAdapter for StandardPersistence {
    fn load_local(&self, key: &str) -> Option<Value> {
        let text = match self.local.read(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read local snapshot");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(key = %key, error = %e, "malformed local snapshot ignored");
                None
            }
        }
    }

    fn save_local(&self, key: &str, state: &Value) {
        let result = serde_json::to_string(state)
            .map_err(Into::into)
            .and_then(|text| self.local.write(key, &text));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to write local snapshot");
        }
    }

    fn query_remote(&self, query: &QueryRequest) -> Option<Value> {
        let Some(remote) = &self.remote else {
            debug!(class = %query.model_class, "no remote channel, query skipped");
            return None;
        };
        match remote.query(query) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(class = %query.model_class, error = %e, "remote query failed");
                None
            }
        }
    }

    fn write_remote(&self, record: UpsertRecord) {
        match &self.remote {
            Some(remote) => remote.write(record),
            None => debug!(name = %record.name, "no remote channel, write dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryLocalStore, InMemoryTransport};
    use serde_json::{json, Map};

    #[test]
    fn local_snapshots_round_trip() {
        let p = StandardPersistence::local_only(Arc::new(InMemoryLocalStore::new()));
        assert_eq!(p.load_local("app"), None);
        p.save_local("app", &json!({"list": {"tasks": []}}));
        assert_eq!(p.load_local("app"), Some(json!({"list": {"tasks": []}})));
    }

    #[test]
    fn malformed_snapshot_is_no_state() {
        let local = Arc::new(InMemoryLocalStore::new());
        local.write("app", "{not json").unwrap();
        let p = StandardPersistence::local_only(local);
        assert_eq!(p.load_local("app"), None);
    }

    #[test]
    fn remote_without_channel_is_inert() {
        let p = StandardPersistence::local_only(Arc::new(InMemoryLocalStore::new()));
        assert_eq!(p.query_remote(&QueryRequest::new("T", Map::new())), None);
        p.write_remote(UpsertRecord::new("a", "T", json!({})));
        p.flush().unwrap();
    }

    #[test]
    fn remote_failures_are_swallowed() {
        let transport = Arc::new(InMemoryTransport::new());
        transport.set_failing(true);
        let p = StandardPersistence::new(Arc::new(InMemoryLocalStore::new()), transport.clone()).unwrap();
        assert_eq!(p.query_remote(&QueryRequest::new("T", Map::new())), None);
        p.write_remote(UpsertRecord::new("a", "T", json!({})));
        p.flush().unwrap();
        assert!(transport.upserts().is_empty());
    }
}
