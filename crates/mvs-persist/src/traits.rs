//! Persistence capability interfaces.

use async_trait::async_trait;
use mvs_types::{QueryRequest, UpsertRecord};
use serde_json::Value;

use crate::error::PersistResult;

/// What a store needs from persistence.
///
/// Failures never reach the store: implementations log them and report
/// "nothing loaded" instead.
pub trait PersistenceAdapter: Send + Sync {
    /// The snapshot stored under `key`, or `None` if there is none or it
    /// cannot be read.
    fn load_local(&self, key: &str) -> Option<Value>;

    /// Replace the snapshot stored under `key`.
    fn save_local(&self, key: &str, state: &Value);

    /// Run a filtered query, blocking until it completes. A single record
    /// is returned as an object, any other count as an array.
    fn query_remote(&self, query: &QueryRequest) -> Option<Value>;

    /// Fire-and-forget upsert. No ordering or delivery guarantee.
    fn write_remote(&self, record: UpsertRecord);
}

/// Synchronous string blob storage keyed by root store name.
pub trait LocalStore: Send + Sync {
    fn read(&self, key: &str) -> PersistResult<Option<String>>;

    fn write(&self, key: &str, blob: &str) -> PersistResult<()>;

    /// Returns `Ok(true)` if a blob existed and was removed.
    fn remove(&self, key: &str) -> PersistResult<bool>;
}

/// The remote persistence endpoint.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// All records of `query.model_class` matching `query.filters`.
    async fn list(&self, query: &QueryRequest) -> PersistResult<Vec<Value>>;

    async fn upsert(&self, records: &[UpsertRecord]) -> PersistResult<()>;
}

/// Collapse a query response: exactly one record becomes that record.
pub fn collapse_results(mut records: Vec<Value>) -> Value {
    if records.len() == 1 {
        records.remove(0)
    } else {
        Value::Array(records)
    }
}

/// Storage keys become file names, so they must be plain names.
pub fn validate_key(key: &str) -> PersistResult<()> {
    if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
        return Err(crate::error::PersistError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_record_collapses() {
        assert_eq!(collapse_results(vec![json!({"a": 1})]), json!({"a": 1}));
        assert_eq!(collapse_results(vec![]), json!([]));
        assert_eq!(
            collapse_results(vec![json!({"a": 1}), json!({"a": 2})]),
            json!([{"a": 1}, {"a": 2}])
        );
    }

    #[test]
    fn keys_are_plain_names() {
        assert!(validate_key("app").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../app").is_err());
        assert!(validate_key(".hidden").is_err());
    }
}
