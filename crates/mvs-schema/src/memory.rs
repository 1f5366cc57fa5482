//! In-memory schema resolver for tests and embedded models.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::traits::SchemaResolver;

/// A [`SchemaResolver`] backed by a `HashMap` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemorySchemaResolver {
    schemas: RwLock<HashMap<String, Value>>,
}

impl InMemorySchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_schema(self, id: impl Into<String>, schema: Value) -> Self {
        if let Ok(mut schemas) = self.schemas.write() {
            schemas.insert(id.into(), schema);
        }
        self
    }

    /// Register or replace the schema for `id`.
    pub fn insert(&self, id: impl Into<String>, schema: Value) -> SchemaResult<()> {
        let mut schemas = self
            .schemas
            .write()
            .map_err(|e| SchemaError::Lock(e.to_string()))?;
        schemas.insert(id.into(), schema);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.schemas.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SchemaResolver for InMemorySchemaResolver {
    fn resolve(&self, id: &str) -> SchemaResult<Option<Value>> {
        let schemas = self
            .schemas
            .read()
            .map_err(|e| SchemaError::Lock(e.to_string()))?;
        Ok(schemas.get(id).cloned())
    }
}
