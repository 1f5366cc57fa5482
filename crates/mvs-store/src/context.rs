//! Collaborators shared by every node of a store tree.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use mvs_expr::ExpressionCache;
use mvs_persist::{InMemoryPersistence, PersistenceAdapter};
use mvs_schema::{InMemorySchemaResolver, SchemaResolver};
use mvs_types::{ModelDescriptor, StoreConfig};

use crate::registry::ModelRegistry;

/// Configuration, models, schema source, persistence and the expression
/// cache. Built once, then shared by the root and inherited by children.
pub struct StoreContext {
    config: StoreConfig,
    models: ModelRegistry,
    schemas: Arc<dyn SchemaResolver>,
    persistence: Arc<dyn PersistenceAdapter>,
    expressions: ExpressionCache,
}

impl StoreContext {
    pub fn new(
        config: StoreConfig,
        schemas: Arc<dyn SchemaResolver>,
        persistence: Arc<dyn PersistenceAdapter>,
    ) -> Self {
        Self {
            config,
            models: ModelRegistry::new(),
            schemas,
            persistence,
            expressions: ExpressionCache::new(),
        }
    }

    /// Default config, no schemas, in-memory persistence.
    pub fn in_memory() -> Self {
        Self::new(
            StoreConfig::default(),
            Arc::new(InMemorySchemaResolver::new()),
            Arc::new(InMemoryPersistence::new()),
        )
    }

    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = models;
        self
    }

    pub fn with_model(mut self, type_name: impl Into<String>, model: ModelDescriptor) -> Self {
        self.models.register(type_name, model);
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn schemas(&self) -> &dyn SchemaResolver {
        &*self.schemas
    }

    pub fn persistence(&self) -> &dyn PersistenceAdapter {
        &*self.persistence
    }

    pub fn expressions(&self) -> &ExpressionCache {
        &self.expressions
    }
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("repository", &self.config.repository)
            .field("models", &self.models.len())
            .field("expressions", &self.expressions.len())
            .finish()
    }
}
