//! The [`SchemaResolver`] trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SchemaResult;

/// Source of JSON-schema-like documents keyed by model-class identifier.
///
/// Store construction is a blocking phase and uses [`resolve`]; callers that
/// already run inside an async runtime can use [`resolve_async`].
///
/// [`resolve`]: SchemaResolver::resolve
/// [`resolve_async`]: SchemaResolver::resolve_async
#[async_trait]
pub trait SchemaResolver: Send + Sync {
    /// Fetch the schema for `id`. Returns `Ok(None)` if there is none.
    fn resolve(&self, id: &str) -> SchemaResult<Option<Value>>;

    /// Asynchronous variant of [`resolve`](SchemaResolver::resolve).
    async fn resolve_async(&self, id: &str) -> SchemaResult<Option<Value>> {
        self.resolve(id)
    }
}
