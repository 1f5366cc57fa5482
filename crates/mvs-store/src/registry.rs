//! Per-component-type model descriptors.

use std::collections::HashMap;
use std::rc::Rc;

use mvs_types::ModelDescriptor;

/// Maps a component type identifier to its [`ModelDescriptor`].
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Rc<ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the model for `type_name`, replacing any previous one.
    pub fn register(&mut self, type_name: impl Into<String>, model: ModelDescriptor) {
        self.models.insert(type_name.into(), Rc::new(model));
    }

    pub fn with_model(mut self, type_name: impl Into<String>, model: ModelDescriptor) -> Self {
        self.register(type_name, model);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<Rc<ModelDescriptor>> {
        self.models.get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
