//! Read/write surface used by components.
//!
//! Every mutation writes through to the root state tree, persists, and then
//! dispatches to the mutated top-level key of the node unless the caller asks
//! for [`Notify::Silent`].

use mvs_types::{split_first, split_path};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::node::StoreNode;

/// Collection entries are identified by this field.
pub const IDENTITY_FIELD: &str = "value";

/// Whether a mutation dispatches after persisting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Notify {
    #[default]
    Dispatch,
    Silent,
}

impl StoreNode {
    /// Assign `value` at the dotted `path` below this node.
    ///
    /// Objects along the path are created when missing; sibling keys at
    /// every level are preserved.
    pub fn update_value(&self, path: &str, value: Value) -> StoreResult<()> {
        self.update_value_with(path, value, Notify::Dispatch)
    }

    pub fn update_value_with(&self, path: &str, value: Value, notify: Notify) -> StoreResult<()> {
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidPath(path.to_string()));
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        self.with_state_mut(|state| {
            let mut cur = state;
            for (depth, segment) in parents.iter().enumerate() {
                let slot = cur.entry(segment.to_string()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                cur = match slot {
                    Value::Object(map) => map,
                    _ => {
                        return Err(StoreError::NotAnObject {
                            path: parents[..=depth].join("."),
                        })
                    }
                };
            }
            cur.insert(last.to_string(), value);
            Ok(())
        })??;

        let (top, _) = split_first(path);
        self.after_mutation(top, notify)
    }

    /// Append `item` to the collection at `key`, replacing any entry with the
    /// same identity.
    pub fn add_item(&self, key: &str, item: Value) -> StoreResult<()> {
        self.add_item_with(key, item, Notify::Dispatch)
    }

    pub fn add_item_with(&self, key: &str, item: Value, notify: Notify) -> StoreResult<()> {
        self.mutate_collection(key, |items| {
            let id = identity(&item).cloned();
            items.retain(|existing| identity(existing) != id.as_ref());
            items.push(item);
        })?;
        self.after_mutation(key, notify)
    }

    /// Drop every entry of the collection at `key` with the identity of
    /// `item`.
    pub fn remove_item(&self, key: &str, item: &Value) -> StoreResult<()> {
        self.remove_item_with(key, item, Notify::Dispatch)
    }

    pub fn remove_item_with(&self, key: &str, item: &Value, notify: Notify) -> StoreResult<()> {
        let id = identity(item);
        self.mutate_collection(key, |items| {
            items.retain(|existing| identity(existing) != id);
        })?;
        self.after_mutation(key, notify)
    }

    /// Shallow-merge `item` into the entries of the collection at `key` that
    /// share its identity. Non-object entries are replaced.
    pub fn update_item(&self, key: &str, item: Value) -> StoreResult<()> {
        self.update_item_with(key, item, Notify::Dispatch)
    }

    pub fn update_item_with(&self, key: &str, item: Value, notify: Notify) -> StoreResult<()> {
        let id = identity(&item).cloned();
        self.mutate_collection(key, |items| {
            for existing in items.iter_mut() {
                if identity(existing) != id.as_ref() {
                    continue;
                }
                match (existing, &item) {
                    (Value::Object(current), Value::Object(update)) => {
                        for (k, v) in update {
                            current.insert(k.clone(), v.clone());
                        }
                    }
                    (existing, _) => *existing = item.clone(),
                }
            }
        })?;
        self.after_mutation(key, notify)
    }

    fn mutate_collection(&self, key: &str, f: impl FnOnce(&mut Vec<Value>)) -> StoreResult<()> {
        if key.is_empty() || key.contains('.') {
            return Err(StoreError::InvalidPath(key.to_string()));
        }
        self.with_state_mut(|state| {
            let slot = state
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(items) => {
                    f(items);
                    Ok(())
                }
                _ => Err(StoreError::NotACollection {
                    key: key.to_string(),
                }),
            }
        })?
    }

    fn after_mutation(&self, key: &str, notify: Notify) -> StoreResult<()> {
        debug!(store = %self.name(), key, ?notify, "mutation");
        self.store_state();
        match notify {
            Notify::Dispatch => self.dispatch(key, None),
            Notify::Silent => Ok(()),
        }
    }
}

fn identity(item: &Value) -> Option<&Value> {
    item.get(IDENTITY_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StoreContext;
    use crate::element::BasicElement;
    use serde_json::json;

    fn root() -> StoreNode {
        let ctx = StoreContext::in_memory().shared();
        StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap()
    }

    #[test]
    fn update_value_top_level() {
        let app = root();
        app.update_value("a", json!(2)).unwrap();
        assert_eq!(app.state().unwrap(), json!({"a": 2}));
    }

    #[test]
    fn update_value_nested_keeps_siblings() {
        let app = root();
        app.update_value("a", json!({"b": 1, "c": 2})).unwrap();
        app.update_value("a.b", json!(10)).unwrap();
        app.update_value("x.y.z", json!(true)).unwrap();
        assert_eq!(
            app.state().unwrap(),
            json!({"a": {"b": 10, "c": 2}, "x": {"y": {"z": true}}})
        );
    }

    #[test]
    fn update_value_rejects_bad_paths() {
        let app = root();
        assert!(matches!(app.update_value("", json!(1)), Err(StoreError::InvalidPath(_))));
        assert!(matches!(app.update_value("a..b", json!(1)), Err(StoreError::InvalidPath(_))));
        app.update_value("n", json!(3)).unwrap();
        assert!(matches!(
            app.update_value("n.m", json!(1)),
            Err(StoreError::NotAnObject { .. })
        ));
    }

    #[test]
    fn add_item_replaces_same_identity() {
        let app = root();
        app.add_item("tasks", json!({"value": "1", "task": "milk"})).unwrap();
        app.add_item("tasks", json!({"value": "2", "task": "eggs"})).unwrap();
        app.add_item("tasks", json!({"value": "1", "task": "oat milk"})).unwrap();
        assert_eq!(
            app.get_state("tasks").unwrap(),
            json!([{"value": "2", "task": "eggs"}, {"value": "1", "task": "oat milk"}])
        );
    }

    #[test]
    fn update_item_merges() {
        let app = root();
        app.add_item("tasks", json!({"value": "1", "task": "milk", "completed": false}))
            .unwrap();
        app.update_item("tasks", json!({"value": "1", "completed": true}))
            .unwrap();
        assert_eq!(
            app.get_state("tasks").unwrap(),
            json!([{"value": "1", "task": "milk", "completed": true}])
        );
    }

    #[test]
    fn remove_item_by_identity() {
        let app = root();
        app.add_item("tasks", json!({"value": "1"})).unwrap();
        app.add_item("tasks", json!({"value": "2"})).unwrap();
        app.remove_item("tasks", &json!({"value": "1", "task": "ignored"}))
            .unwrap();
        assert_eq!(app.get_state("tasks").unwrap(), json!([{"value": "2"}]));
    }

    #[test]
    fn collection_on_scalar_fails() {
        let app = root();
        app.update_value("tasks", json!("nope")).unwrap();
        assert!(matches!(
            app.add_item("tasks", json!({"value": 1})),
            Err(StoreError::NotACollection { .. })
        ));
    }
}
