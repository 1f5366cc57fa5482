//! The component side of a store.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use mvs_types::StorageModes;
use serde_json::Value;

/// A component that owns a store and receives mapped property values.
///
/// Stores hold elements weakly; the component tree owns them.
pub trait Element {
    /// Component type identifier, used to look up the model descriptor.
    fn type_name(&self) -> &str;

    /// Current value of a property, `None` when undefined.
    fn property(&self, name: &str) -> Option<Value>;

    /// Assign a property. Must not call back into the store synchronously.
    fn set_property(&mut self, name: &str, value: Value);

    fn storage_modes(&self) -> StorageModes {
        StorageModes::NONE
    }
}

pub type ElementRef = Rc<RefCell<dyn Element>>;
pub type WeakElement = Weak<RefCell<dyn Element>>;

/// Identity of an element for de-duplication: the address of its cell.
pub(crate) fn element_id(element: &WeakElement) -> *const () {
    element.as_ptr() as *const ()
}

/// A property-bag element. Records every assignment it receives.
#[derive(Clone, Debug, Default)]
pub struct BasicElement {
    type_name: String,
    properties: BTreeMap<String, Value>,
    storage_modes: StorageModes,
    assignments: Vec<(String, Value)>,
}

impl BasicElement {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_storage_modes(mut self, modes: StorageModes) -> Self {
        self.storage_modes = modes;
        self
    }

    /// Wrap in the shared cell a store expects.
    pub fn shared(self) -> Rc<RefCell<BasicElement>> {
        Rc::new(RefCell::new(self))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Every `(property, value)` assigned through [`Element::set_property`].
    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    /// Number of times `name` was assigned.
    pub fn assignment_count(&self, name: &str) -> usize {
        self.assignments.iter().filter(|(n, _)| n == name).count()
    }

    pub fn clear_assignments(&mut self) {
        self.assignments.clear();
    }
}

impl Element for BasicElement {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.assignments.push((name.to_string(), value.clone()));
        self.properties.insert(name.to_string(), value);
    }

    fn storage_modes(&self) -> StorageModes {
        self.storage_modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_assignments() {
        let mut el = BasicElement::new("TaskItem").with_property("task", json!("milk"));
        assert_eq!(el.property("task"), Some(json!("milk")));
        assert_eq!(el.property("missing"), None);

        el.set_property("task", json!("eggs"));
        el.set_property("task", json!("bread"));
        assert_eq!(el.get("task"), Some(&json!("bread")));
        assert_eq!(el.assignment_count("task"), 2);
        el.clear_assignments();
        assert!(el.assignments().is_empty());
    }

    #[test]
    fn identity_follows_the_cell() {
        let a = BasicElement::new("A").shared();
        let b = BasicElement::new("A").shared();
        let a_dyn: ElementRef = a.clone();
        let wa1: WeakElement = Rc::downgrade(&a_dyn);
        let wa2: WeakElement = Rc::downgrade(&(a as ElementRef));
        let wb: WeakElement = Rc::downgrade(&(b as ElementRef));
        assert_eq!(element_id(&wa1), element_id(&wa2));
        assert_ne!(element_id(&wa1), element_id(&wb));
    }
}
