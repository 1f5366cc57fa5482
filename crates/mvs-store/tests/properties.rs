//! Property tests over randomly shaped trees and collections.

use mvs_store::{BasicElement, Notify, StoreContext, StoreNode};
use mvs_types::split_path;
use proptest::prelude::*;
use serde_json::{json, Value};

fn navigate<'a>(mut value: &'a Value, path: &str) -> Option<&'a Value> {
    for segment in split_path(path) {
        value = value.get(segment)?;
    }
    Some(value)
}

fn tree_ops() -> impl Strategy<Value = Vec<(usize, String, Option<i64>)>> {
    proptest::collection::vec(
        (any::<usize>(), "[a-d]", proptest::option::of(-100i64..100)),
        0..12,
    )
}

proptest! {
    // ---- Tree invariant: every node's state is the root's state at its path ----
    #[test]
    fn node_state_is_root_subtree(ops in tree_ops()) {
        let ctx = StoreContext::in_memory().shared();
        let root = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        let mut nodes = vec![root.clone()];
        let mut elements = Vec::new();

        for (parent, name, write) in &ops {
            let parent = nodes[parent % nodes.len()].clone();
            let el = BasicElement::new("Node").shared();
            let node = StoreNode::child(name, el.clone(), &parent).unwrap();
            if let Some(n) = write {
                node.update_value("n", json!(n)).unwrap();
            }
            elements.push(el);
            nodes.push(node);
        }

        let whole = root.state().unwrap();
        for node in &nodes {
            let path = node.path().unwrap();
            let expected = navigate(&whole, &path).cloned();
            prop_assert_eq!(Some(node.state().unwrap()), expected, "path {}", path);
        }
    }

    // ---- add_item followed by remove_item restores the collection ----
    #[test]
    fn add_then_remove_is_identity(
        ids in proptest::collection::btree_set(0u32..50, 0..8),
        extra in 50u32..100,
    ) {
        let ctx = StoreContext::in_memory().shared();
        let list = StoreNode::root("list", BasicElement::new("List").shared(), ctx).unwrap();
        list.update_value_with("tasks", json!([]), Notify::Silent).unwrap();
        for id in &ids {
            list.add_item_with("tasks", json!({"value": id, "task": format!("t{id}")}), Notify::Silent).unwrap();
        }
        let before = list.get_state("tasks").unwrap();

        let item = json!({"value": extra, "task": "new"});
        list.add_item("tasks", item.clone()).unwrap();
        list.remove_item("tasks", &item).unwrap();

        prop_assert_eq!(list.get_state("tasks").unwrap(), before);
    }

    // ---- Nested updates leave sibling keys alone ----
    #[test]
    fn nested_update_keeps_siblings(a in any::<i32>(), b in any::<i32>(), c in any::<i32>()) {
        let ctx = StoreContext::in_memory().shared();
        let store = StoreNode::root("s", BasicElement::new("S").shared(), ctx).unwrap();
        store.update_value("x", json!({"b": a, "c": c})).unwrap();
        store.update_value("x.b", json!(b)).unwrap();
        prop_assert_eq!(store.get_state("x").unwrap(), json!({"b": b, "c": c}));
    }
}
