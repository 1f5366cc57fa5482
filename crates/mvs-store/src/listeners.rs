//! Path-keyed listener registry held by the root store.

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use mvs_expr::DerivedExpression;

use mvs_types::qualify;

use crate::element::{element_id, WeakElement};
use crate::node::NodeInner;

/// How a mapped property gets its value.
#[derive(Clone)]
pub enum Binding {
    /// Copy `state[key]` of the owning store.
    Direct(String),
    /// Evaluate against the owning store's state.
    Derived(Arc<dyn DerivedExpression>),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Direct(key) => f.debug_tuple("Direct").field(key).finish(),
            Binding::Derived(expr) => f
                .debug_tuple("Derived")
                .field(&expr.extract_dependency_paths())
                .finish(),
        }
    }
}

/// A mapping ready for dispatch.
#[derive(Clone, Debug)]
pub struct CompiledMapping {
    pub target: String,
    pub binding: Binding,
}

/// One component's subscription: created at store construction, shared by
/// every key it is registered under.
#[derive(Clone)]
pub struct ListenerEntry {
    pub(crate) element: WeakElement,
    pub(crate) mappings: Rc<[CompiledMapping]>,
    pub(crate) store: Weak<NodeInner>,
}

impl ListenerEntry {
    pub fn mappings(&self) -> &[CompiledMapping] {
        &self.mappings
    }

    pub(crate) fn element_id(&self) -> *const () {
        element_id(&self.element)
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("element", &self.element_id())
            .field("mappings", &self.mappings)
            .finish()
    }
}

/// Does a listener registered under `key` care about a change at `path`?
///
/// Without an item: the key is the path, lies under it, or the path is
/// empty (broadcast). With an item: the key is the path or `path.item`.
pub fn key_matches(key: &str, path: &str, item: Option<&str>) -> bool {
    match item {
        None => {
            path.is_empty()
                || key == path
                || key
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        }
        Some(item) => key == path || key == qualify(path, item),
    }
}

/// Dependency key to entries, keys kept in first-registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    order: Vec<String>,
    entries: HashMap<String, Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, entry: ListenerEntry) {
        match self.entries.get_mut(&key) {
            Some(list) => list.push(entry),
            None => {
                self.order.push(key.clone());
                self.entries.insert(key, vec![entry]);
            }
        }
    }

    /// Entries interested in a change, one per element: keys are visited in
    /// registration order and within a key entries in registration order;
    /// the first entry seen for an element wins.
    pub fn matching(&self, path: &str, item: Option<&str>) -> Vec<ListenerEntry> {
        let mut out: Vec<ListenerEntry> = Vec::new();
        for key in &self.order {
            if !key_matches(key, path, item) {
                continue;
            }
            let Some(list) = self.entries.get(key) else {
                continue;
            };
            for entry in list {
                let id = entry.element_id();
                if !out.iter().any(|e| e.element_id() == id) {
                    out.push(entry.clone());
                }
            }
        }
        out
    }

    /// Drop every entry for the element identified by `id`. Returns how many
    /// were removed.
    pub(crate) fn remove_element(&mut self, id: *const ()) -> usize {
        let mut removed = 0;
        for list in self.entries.values_mut() {
            let before = list.len();
            list.retain(|e| e.element_id() != id);
            removed += before - list.len();
        }
        self.entries.retain(|_, list| !list.is_empty());
        self.order.retain(|k| self.entries.contains_key(k));
        removed
    }

    /// Registered keys in first-registration order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    /// Number of entries under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().map(|k| (k, self.count(k))))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{BasicElement, ElementRef};

    fn entry(element: &ElementRef, target: &str) -> ListenerEntry {
        ListenerEntry {
            element: Rc::downgrade(element),
            mappings: Rc::from(vec![CompiledMapping {
                target: target.to_string(),
                binding: Binding::Direct(target.to_string()),
            }]),
            store: Weak::new(),
        }
    }

    fn element() -> ElementRef {
        BasicElement::new("T").shared()
    }

    // ---- Key matching ----

    #[test]
    fn broadcast_matches_everything() {
        assert!(key_matches("a", "", None));
        assert!(key_matches("list.tasks", "", None));
    }

    #[test]
    fn path_matches_itself_and_descendants() {
        assert!(key_matches("list", "list", None));
        assert!(key_matches("list.tasks", "list", None));
        assert!(!key_matches("listing", "list", None));
        assert!(!key_matches("a", "list", None));
    }

    #[test]
    fn item_targets_one_child_key() {
        assert!(key_matches("list", "list", Some("tasks")));
        assert!(key_matches("list.tasks", "list", Some("tasks")));
        assert!(!key_matches("list.title", "list", Some("tasks")));
        assert!(!key_matches("list.tasks.x", "list", Some("tasks")));
        assert!(!key_matches("other", "", Some("tasks")));
        assert!(key_matches("tasks", "", Some("tasks")));
    }

    // ---- Registry ----

    #[test]
    fn matching_dedups_by_element_in_key_order() {
        let a = element();
        let b = element();
        let mut reg = ListenerRegistry::new();
        reg.insert("x".into(), entry(&a, "first"));
        reg.insert("y".into(), entry(&b, "b"));
        reg.insert("y".into(), entry(&a, "second"));

        let hits = reg.matching("", None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].mappings()[0].target, "first");
        assert_eq!(hits[1].mappings()[0].target, "b");
        assert_eq!(reg.keys(), ["x", "y"]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn remove_element_drops_all_its_entries() {
        let a = element();
        let b = element();
        let mut reg = ListenerRegistry::new();
        reg.insert("x".into(), entry(&a, "a"));
        reg.insert("y".into(), entry(&a, "a"));
        reg.insert("y".into(), entry(&b, "b"));

        let id = element_id(&Rc::downgrade(&a));
        assert_eq!(reg.remove_element(id), 2);
        assert_eq!(reg.keys(), ["y"]);
        assert_eq!(reg.count("y"), 1);
    }
}
