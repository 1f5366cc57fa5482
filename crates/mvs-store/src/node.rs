//! The store tree.
//!
//! Only the root owns state: a single JSON object tree. A child is a view of
//! the subtree addressed by the dotted path of its ancestors' names, so every
//! read and write from a child is resolved against the root. This makes the
//! tree invariant hold by construction: `child.state()` is always
//! `root.state()` navigated by the child's path.
//!
//! Parents own their children; children point back weakly. Elements are
//! held weakly as well, the component tree owns them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use mvs_expr::DerivedExpression;
use mvs_schema::{apply_defaults, SchemaLookup};
use mvs_types::{
    join_path, qualify, split_path, validate_store_name, MappingSource, ModelClass,
    ModelDescriptor, QueryRequest, StorageModes, UpsertRecord,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::context::StoreContext;
use crate::element::{element_id, ElementRef, WeakElement};
use crate::error::{StoreError, StoreResult};
use crate::listeners::{Binding, CompiledMapping, ListenerEntry, ListenerRegistry};

pub(crate) struct NodeInner {
    name: String,
    element: WeakElement,
    role: Role,
    children: RefCell<BTreeMap<String, StoreNode>>,
    model: Option<Rc<ModelDescriptor>>,
    storage_modes: StorageModes,
    ctx: Rc<StoreContext>,
}

enum Role {
    Root {
        state: RefCell<Value>,
        listeners: RefCell<ListenerRegistry>,
    },
    Child {
        parent: RefCell<Weak<NodeInner>>,
    },
}

/// Handle to a node of a store tree. Cloning the handle does not clone the
/// node.
#[derive(Clone)]
pub struct StoreNode {
    pub(crate) inner: Rc<NodeInner>,
}

impl StoreNode {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build a root store for `element`.
    pub fn root(name: &str, element: ElementRef, ctx: Rc<StoreContext>) -> StoreResult<Self> {
        let role = Role::Root {
            state: RefCell::new(Value::Object(Map::new())),
            listeners: RefCell::new(ListenerRegistry::new()),
        };
        Self::build(name, &element, role, ctx, None)
    }

    /// Build a store for `element` under `parent`. An existing child with the
    /// same name is replaced.
    pub fn child(name: &str, element: ElementRef, parent: &StoreNode) -> StoreResult<Self> {
        let role = Role::Child {
            parent: RefCell::new(Rc::downgrade(&parent.inner)),
        };
        Self::build(name, &element, role, Rc::clone(&parent.inner.ctx), Some(parent))
    }

    fn build(
        name: &str,
        element: &ElementRef,
        role: Role,
        ctx: Rc<StoreContext>,
        parent: Option<&StoreNode>,
    ) -> StoreResult<Self> {
        validate_store_name(name)?;
        let (type_name, storage_modes) = {
            let el = element
                .try_borrow()
                .map_err(|_| StoreError::Busy(format!("element of store {name}")))?;
            (el.type_name().to_string(), el.storage_modes())
        };
        let model = ctx.models().get(&type_name);

        let node = StoreNode {
            inner: Rc::new(NodeInner {
                name: name.to_string(),
                element: Rc::downgrade(element),
                role,
                children: RefCell::new(BTreeMap::new()),
                model,
                storage_modes,
                ctx,
            }),
        };

        if let Some(parent) = parent {
            parent.register_sub_store(&node)?;
        }
        if let Err(e) = node.initialize() {
            node.detach();
            return Err(e);
        }
        debug!(
            store = %node.path_display(),
            ty = %type_name,
            modes = %storage_modes,
            "store ready"
        );
        Ok(node)
    }

    fn initialize(&self) -> StoreResult<()> {
        self.reset_state(false)?;
        if self.inner.storage_modes.any() {
            self.load_state()?;
        }
        self.register_listeners()?;
        self.dispatch("", None)
    }

    /// Insert `child` into this node's children and make sure its state slot
    /// exists. Returns the child's state.
    fn register_sub_store(&self, child: &StoreNode) -> StoreResult<Value> {
        let previous = self
            .inner
            .children
            .borrow_mut()
            .insert(child.name().to_string(), child.clone());
        if previous.is_some() {
            warn!(parent = %self.path_display(), child = %child.name(), "replacing existing sub-store");
        }
        self.get_state(child.name())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_root(&self) -> bool {
        matches!(self.inner.role, Role::Root { .. })
    }

    pub fn parent(&self) -> Option<StoreNode> {
        match &self.inner.role {
            Role::Root { .. } => None,
            Role::Child { parent } => parent.borrow().upgrade().map(|inner| StoreNode { inner }),
        }
    }

    /// A direct child by name.
    pub fn get_child(&self, name: &str) -> Option<StoreNode> {
        self.inner.children.borrow().get(name).cloned()
    }

    /// Names of the direct children, sorted.
    pub fn child_names(&self) -> Vec<String> {
        self.inner.children.borrow().keys().cloned().collect()
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.inner.model.as_deref()
    }

    pub fn storage_modes(&self) -> StorageModes {
        self.inner.storage_modes
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.inner.element.upgrade()
    }

    pub fn context(&self) -> &StoreContext {
        &self.inner.ctx
    }

    /// The root of this node's tree.
    pub fn root_node(&self) -> StoreResult<StoreNode> {
        let (inner, _) = self.locate()?;
        Ok(StoreNode { inner })
    }

    /// Root-relative dotted path of this node; empty for the root.
    pub fn path(&self) -> StoreResult<String> {
        let (_, segments) = self.locate()?;
        Ok(join_path(&segments))
    }

    fn path_display(&self) -> String {
        match self.path() {
            Ok(p) if p.is_empty() => self.name().to_string(),
            Ok(p) => p,
            Err(_) => format!("<detached {}>", self.name()),
        }
    }

    /// Walk up to the root, collecting the names of every non-root node.
    fn locate(&self) -> StoreResult<(Rc<NodeInner>, Vec<String>)> {
        let mut segments = Vec::new();
        let mut current = Rc::clone(&self.inner);
        loop {
            let parent = match &current.role {
                Role::Root { .. } => break,
                Role::Child { parent } => parent.borrow().upgrade(),
            };
            let Some(parent) = parent else {
                return Err(StoreError::Detached {
                    name: current.name.clone(),
                });
            };
            segments.push(current.name.clone());
            current = parent;
        }
        segments.reverse();
        Ok((current, segments))
    }

    /// This node's path qualified by `path`, plus the root to resolve it at.
    fn resolve(&self, path: &str) -> StoreResult<(Rc<NodeInner>, String)> {
        let (root, segments) = self.locate()?;
        Ok((root, qualify(&join_path(&segments), path)))
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    /// The state at `path` below this node, creating empty objects along the
    /// way where nothing (or `null`) is stored.
    pub fn get_state(&self, path: &str) -> StoreResult<Value> {
        let (root, full) = self.resolve(path)?;
        let mut state = root_state(&root)?.try_borrow_mut().map_err(|_| busy(&root))?;
        let slot = slot_mut(&mut state, &split_path(&full), &full)?;
        Ok(slot.clone())
    }

    /// This node's whole state.
    pub fn state(&self) -> StoreResult<Value> {
        self.get_state("")
    }

    /// The value at `path` below this node, without creating anything.
    pub fn peek(&self, path: &str) -> StoreResult<Option<Value>> {
        let (root, full) = self.resolve(path)?;
        let state = root_state(&root)?.try_borrow().map_err(|_| busy(&root))?;
        Ok(slot(&state, &split_path(&full)).cloned())
    }

    /// Run `f` on this node's state object. Errors if the slot holds a
    /// non-object value.
    pub(crate) fn with_state_mut<R>(
        &self,
        f: impl FnOnce(&mut Map<String, Value>) -> R,
    ) -> StoreResult<R> {
        let (root, full) = self.resolve("")?;
        let mut state = root_state(&root)?.try_borrow_mut().map_err(|_| busy(&root))?;
        let segments = split_path(&full);
        match slot_mut(&mut state, &segments, &full)? {
            Value::Object(map) => Ok(f(map)),
            _ => Err(StoreError::NotAnObject { path: full.clone() }),
        }
    }

    /// Whether this node's slot is, or can become, a state object.
    fn holds_object(&self) -> StoreResult<bool> {
        Ok(matches!(
            self.peek("")?,
            None | Some(Value::Null) | Some(Value::Object(_))
        ))
    }

    // -----------------------------------------------------------------------
    // Schema defaults
    // -----------------------------------------------------------------------

    /// Populate missing state keys from the model schema.
    ///
    /// Without `force`, keys that already hold a value are kept and a defined
    /// element property of the same name replaces a freshly computed default.
    /// With `force`, every declared key is reset, then the state is persisted
    /// and broadcast. A schema that cannot be resolved is skipped.
    pub fn reset_state(&self, force: bool) -> StoreResult<()> {
        let Some(model) = self.inner.model.clone() else {
            return Ok(());
        };
        let Some(class) = &model.model_class else {
            return Ok(());
        };
        let ctx = &self.inner.ctx;
        let schema = match class {
            ModelClass::Inline(schema) => schema.clone(),
            ModelClass::Id(id) => match ctx.schemas().resolve(id) {
                Ok(Some(schema)) => schema,
                Ok(None) => {
                    debug!(store = %self.name(), class = %id, "no schema, defaults skipped");
                    return Ok(());
                }
                Err(e) => {
                    warn!(store = %self.name(), class = %id, error = %e, "schema resolution failed, defaults skipped");
                    return Ok(());
                }
            },
        };
        if !self.holds_object()? {
            warn!(store = %self.name(), "state is not an object, defaults skipped");
            return Ok(());
        }
        let lookup = SchemaLookup::new(ctx.schemas(), &model.ref_schemas);
        let element = self.element();

        self.with_state_mut(|state| {
            let applied = apply_defaults(state, &schema, &lookup, force);
            if force {
                return;
            }
            let Some(element) = element else { return };
            let Ok(el) = element.try_borrow() else {
                warn!(store = %self.name(), "element busy, initial values skipped");
                return;
            };
            for key in applied {
                if let Some(value) = el.property(&key) {
                    state.insert(key, value);
                }
            }
        })?;

        if force {
            self.store_state();
            self.dispatch("", None)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Merge persisted state over the current state.
    ///
    /// Server-backed stores that declare filters query the remote endpoint with the
    /// element's filter properties; a local-backed root reads its snapshot.
    pub fn load_state(&self) -> StoreResult<()> {
        let modes = self.inner.storage_modes;
        let ctx = Rc::clone(&self.inner.ctx);

        if modes.server {
            if let Some(query) = self.remote_query() {
                if let Some(data) = ctx.persistence().query_remote(&query) {
                    self.merge_loaded(data, "remote")?;
                }
            }
        }

        if modes.local && self.is_root() {
            if let Some(data) = ctx.persistence().load_local(self.name()) {
                self.merge_loaded(data, "local")?;
            }
        }
        Ok(())
    }

    fn remote_query(&self) -> Option<QueryRequest> {
        let model = self.inner.model.as_ref()?;
        let names = model.filters.as_ref()?;
        let class = model.model_class.as_ref()?.type_name()?;
        let mut filters = Map::new();
        if let Some(element) = self.element() {
            if let Ok(el) = element.try_borrow() {
                for name in names {
                    match el.property(name) {
                        Some(Value::Null) | None => {}
                        Some(value) => {
                            filters.insert(name.clone(), value);
                        }
                    }
                }
            }
        }
        Some(QueryRequest::new(class, filters))
    }

    /// Top-level spread of `data` into the state.
    fn merge_loaded(&self, data: Value, source: &str) -> StoreResult<()> {
        if !self.holds_object()? {
            warn!(store = %self.name(), source, "state is not an object, loaded state skipped");
            return Ok(());
        }
        match data {
            Value::Object(loaded) => self.with_state_mut(|state| state.extend(loaded)),
            Value::Array(records) => {
                if !records.is_empty() {
                    warn!(store = %self.name(), source, records = records.len(), "several records loaded, merged by index");
                }
                self.with_state_mut(|state| {
                    for (i, record) in records.into_iter().enumerate() {
                        state.insert(i.to_string(), record);
                    }
                })
            }
            Value::Null => Ok(()),
            other => {
                warn!(store = %self.name(), source, value = %other, "ignoring non-object persisted state");
                Ok(())
            }
        }
    }

    /// Persist after a mutation. Failures are logged by the adapter.
    ///
    /// Server-backed: upsert `{name, type, properties}`. Local-backed: the
    /// parent persists (and so on up), the root writes the whole tree under
    /// its name.
    pub fn store_state(&self) {
        let modes = self.inner.storage_modes;
        let ctx = &self.inner.ctx;

        if modes.server {
            let type_name = self
                .inner
                .model
                .as_ref()
                .and_then(|m| m.model_class.as_ref())
                .and_then(ModelClass::type_name);
            match (type_name, self.state()) {
                (Some(ty), Ok(state)) => {
                    ctx.persistence()
                        .write_remote(UpsertRecord::new(self.name(), ty, state));
                }
                (None, _) => debug!(store = %self.name(), "no model class, remote write skipped"),
                (_, Err(e)) => warn!(store = %self.name(), error = %e, "cannot read state for remote write"),
            }
        }

        if modes.local {
            match &self.inner.role {
                Role::Child { .. } => match self.parent() {
                    Some(parent) => parent.store_state(),
                    None => warn!(store = %self.name(), "detached store not persisted"),
                },
                Role::Root { state, .. } => match state.try_borrow() {
                    Ok(tree) => ctx.persistence().save_local(self.name(), &tree),
                    Err(_) => warn!(store = %self.name(), "state busy, snapshot skipped"),
                },
            }
        }
    }

    // -----------------------------------------------------------------------
    // Listeners and dispatch
    // -----------------------------------------------------------------------

    fn register_listeners(&self) -> StoreResult<()> {
        let Some(model) = self.inner.model.clone() else {
            return Ok(());
        };
        if model.mappings.is_empty() {
            return Ok(());
        }

        let mut mappings = Vec::with_capacity(model.mappings.len());
        let mut deps: Vec<String> = Vec::new();
        for mapping in &model.mappings {
            let binding = match &mapping.source {
                MappingSource::Key(key) => {
                    push_unique(&mut deps, key);
                    Binding::Direct(key.clone())
                }
                MappingSource::Expression(text) => {
                    let expr = self.inner.ctx.expressions().get_or_compile(text)?;
                    for dep in expr.dependency_paths() {
                        push_unique(&mut deps, dep);
                    }
                    Binding::Derived(expr as Arc<dyn DerivedExpression>)
                }
            };
            mappings.push(CompiledMapping {
                target: mapping.target.clone(),
                binding,
            });
        }

        let entry = ListenerEntry {
            element: self.inner.element.clone(),
            mappings: Rc::from(mappings),
            store: Rc::downgrade(&self.inner),
        };
        let (root, prefix) = self.resolve("")?;
        let mut listeners = root_listeners(&root)?
            .try_borrow_mut()
            .map_err(|_| busy(&root))?;
        for dep in &deps {
            listeners.insert(qualify(&prefix, dep), entry.clone());
        }
        debug!(store = %self.path_display(), keys = ?deps, "registered listeners");
        Ok(())
    }

    /// Notify elements of a change at `path` (relative to this node).
    ///
    /// Without `item` every listener at or below `path` is notified; an empty
    /// path reaches every listener of the tree. With `item` only listeners on
    /// `path` itself or on `path.item` are notified, and direct mappings only
    /// copy the key `item`.
    pub fn dispatch(&self, path: &str, item: Option<&str>) -> StoreResult<()> {
        let (root, full) = self.resolve(path)?;
        let entries = root_listeners(&root)?
            .try_borrow()
            .map_err(|_| busy(&root))?
            .matching(&full, item);
        debug!(path = %full, item = ?item, listeners = entries.len(), "dispatch");

        for entry in entries {
            let (Some(element), Some(store)) = (entry.element.upgrade(), entry.store.upgrade())
            else {
                continue;
            };
            let store = StoreNode { inner: store };
            let state = match store.peek("") {
                Ok(state) => state.unwrap_or(Value::Null),
                Err(e) => {
                    warn!(store = %store.name(), error = %e, "listener store unavailable");
                    continue;
                }
            };

            let mut updates = Vec::with_capacity(entry.mappings.len());
            for mapping in entry.mappings.iter() {
                match &mapping.binding {
                    Binding::Derived(expr) => match expr.evaluate(&state) {
                        Ok(value) => updates.push((&mapping.target, value.unwrap_or(Value::Null))),
                        Err(e) => {
                            warn!(property = %mapping.target, error = %e, "expression evaluation failed")
                        }
                    },
                    Binding::Direct(key) => {
                        if item.is_none() || item == Some(key.as_str()) {
                            let value = state.get(key).cloned().unwrap_or(Value::Null);
                            updates.push((&mapping.target, value));
                        }
                    }
                }
            }

            match element.try_borrow_mut() {
                Ok(mut el) => {
                    for (target, value) in updates {
                        el.set_property(target, value);
                    }
                }
                Err(_) => warn!(store = %store.name(), "element busy, dispatch skipped"),
            };
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Remove this node from its parent and drop the listener entries of its
    /// element and of every descendant's element. The state stays in the
    /// tree. A detached node rejects further state operations.
    pub fn detach(&self) {
        let mut ids = Vec::new();
        self.collect_element_ids(&mut ids);

        if let Ok((root, _)) = self.locate() {
            if let Ok(listeners) = root_listeners(&root) {
                if let Ok(mut listeners) = listeners.try_borrow_mut() {
                    let removed: usize = ids.iter().map(|id| listeners.remove_element(*id)).sum();
                    debug!(store = %self.name(), removed, "detached listeners");
                }
            }
        }

        if let Role::Child { parent } = &self.inner.role {
            if let Some(p) = parent.borrow().upgrade() {
                let mut children = p.children.borrow_mut();
                if children
                    .get(self.name())
                    .is_some_and(|c| Rc::ptr_eq(&c.inner, &self.inner))
                {
                    children.remove(self.name());
                }
            }
            *parent.borrow_mut() = Weak::new();
        }
    }

    fn collect_element_ids(&self, ids: &mut Vec<*const ()>) {
        ids.push(element_id(&self.inner.element));
        for child in self.inner.children.borrow().values() {
            child.collect_element_ids(ids);
        }
    }

    /// Number of listener entries registered in this node's tree.
    pub fn listener_count(&self) -> StoreResult<usize> {
        let (root, _) = self.locate()?;
        let listeners = root_listeners(&root)?.try_borrow().map_err(|_| busy(&root))?;
        Ok(listeners.len())
    }

    /// Registered listener keys in registration order.
    pub fn listener_keys(&self) -> StoreResult<Vec<String>> {
        let (root, _) = self.locate()?;
        let listeners = root_listeners(&root)?.try_borrow().map_err(|_| busy(&root))?;
        Ok(listeners.keys().to_vec())
    }
}

impl fmt::Debug for StoreNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreNode")
            .field("name", &self.inner.name)
            .field("path", &self.path().ok())
            .field("storage_modes", &self.inner.storage_modes)
            .field("children", &self.child_names())
            .finish()
    }
}

fn root_state(root: &NodeInner) -> StoreResult<&RefCell<Value>> {
    match &root.role {
        Role::Root { state, .. } => Ok(state),
        Role::Child { .. } => Err(StoreError::Detached {
            name: root.name.clone(),
        }),
    }
}

fn root_listeners(root: &NodeInner) -> StoreResult<&RefCell<ListenerRegistry>> {
    match &root.role {
        Role::Root { listeners, .. } => Ok(listeners),
        Role::Child { .. } => Err(StoreError::Detached {
            name: root.name.clone(),
        }),
    }
}

fn busy(root: &NodeInner) -> StoreError {
    StoreError::Busy(format!("state of store {}", root.name))
}

fn push_unique(deps: &mut Vec<String>, dep: &str) {
    if !deps.iter().any(|d| d == dep) {
        deps.push(dep.to_string());
    }
}

/// Navigate to `segments`, turning absent or `null` slots (the final one
/// included) into empty objects. Intermediate non-object values are an error.
fn slot_mut<'a>(mut cur: &'a mut Value, segments: &[&str], path: &str) -> StoreResult<&'a mut Value> {
    for segment in segments {
        if cur.is_null() {
            *cur = Value::Object(Map::new());
        }
        cur = match cur {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            _ => {
                return Err(StoreError::NotAnObject {
                    path: path.to_string(),
                })
            }
        };
    }
    if cur.is_null() {
        *cur = Value::Object(Map::new());
    }
    Ok(cur)
}

fn slot<'a>(mut cur: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    for segment in segments {
        cur = cur.get(*segment)?;
    }
    Some(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::BasicElement;
    use mvs_types::Mapping;
    use serde_json::json;

    fn ctx() -> Rc<StoreContext> {
        StoreContext::in_memory()
            .with_model(
                "Sum",
                ModelDescriptor::new()
                    .with_mapping(Mapping::expression("sum", "a + b"))
                    .with_mapping(Mapping::key("a", "a")),
            )
            .shared()
    }

    #[test]
    fn slot_helpers() {
        let mut v = json!({"a": {"b": 1}, "n": null});
        assert_eq!(slot(&v, &["a", "b"]), Some(&json!(1)));
        assert_eq!(slot(&v, &["a", "c"]), None);
        assert_eq!(slot_mut(&mut v, &["n", "x"], "n.x").unwrap(), &json!({}));
        assert!(matches!(
            slot_mut(&mut v, &["a", "b", "c"], "a.b.c"),
            Err(StoreError::NotAnObject { .. })
        ));
        assert_eq!(slot_mut(&mut v, &["a", "b"], "a.b").unwrap(), &json!(1));
    }

    #[test]
    fn root_and_child_paths() {
        let ctx = ctx();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        let list = StoreNode::child("list", BasicElement::new("List").shared(), &app).unwrap();
        let tasks = StoreNode::child("tasks", BasicElement::new("Item").shared(), &list).unwrap();

        assert!(app.is_root());
        assert_eq!(app.path().unwrap(), "");
        assert_eq!(tasks.path().unwrap(), "list.tasks");
        assert_eq!(app.state().unwrap(), json!({"list": {"tasks": {}}}));
        assert_eq!(app.child_names(), vec!["list"]);
        assert!(tasks.root_node().unwrap().is_root());
    }

    #[test]
    fn rejects_dotted_names() {
        let ctx = ctx();
        let el = BasicElement::new("App").shared();
        assert!(matches!(
            StoreNode::root("a.b", el, ctx),
            Err(StoreError::Types(_))
        ));
    }

    #[test]
    fn registers_expression_dependencies() {
        let ctx = ctx();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        let _sum = StoreNode::child("calc", BasicElement::new("Sum").shared(), &app).unwrap();
        assert_eq!(app.listener_keys().unwrap(), vec!["calc.a", "calc.b"]);
        assert_eq!(app.listener_count().unwrap(), 2);
    }

    #[test]
    fn bad_expression_fails_construction_and_unregisters() {
        let ctx = StoreContext::in_memory()
            .with_model(
                "Broken",
                ModelDescriptor::new().with_mapping(Mapping::expression("x", "a +")),
            )
            .shared();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        let err = StoreNode::child("b", BasicElement::new("Broken").shared(), &app).unwrap_err();
        assert!(matches!(err, StoreError::Expression(_)));
        assert!(app.get_child("b").is_none());
    }

    #[test]
    fn detach_removes_child_and_listeners() {
        let ctx = ctx();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        let calc = StoreNode::child("calc", BasicElement::new("Sum").shared(), &app).unwrap();
        calc.detach();
        assert!(app.get_child("calc").is_none());
        assert_eq!(app.listener_count().unwrap(), 0);
        assert!(matches!(calc.state(), Err(StoreError::Detached { .. })));
    }

    #[test]
    fn non_object_slot_is_readable_but_not_mutable() {
        let ctx = ctx();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        app.with_state_mut(|s| {
            s.insert("n".into(), json!(5));
        })
        .unwrap();
        assert_eq!(app.get_state("n").unwrap(), json!(5));
        let n = StoreNode::child("n", BasicElement::new("App").shared(), &app).unwrap();
        assert_eq!(n.state().unwrap(), json!(5));
        assert!(matches!(
            n.with_state_mut(|_| ()),
            Err(StoreError::NotAnObject { .. })
        ));
    }

    #[test]
    fn modelled_child_over_array_slot_keeps_the_array() {
        let ctx = StoreContext::in_memory()
            .with_model(
                "Item",
                ModelDescriptor::new()
                    .with_class(ModelClass::Inline(json!({"type": "object", "properties": {"task": {"type": "string"}}})))
                    .with_mapping(Mapping::key("task", "task")),
            )
            .shared();
        let app = StoreNode::root("app", BasicElement::new("App").shared(), ctx).unwrap();
        app.with_state_mut(|s| {
            s.insert("items".into(), json!([{"task": "milk"}]));
        })
        .unwrap();
        let items = StoreNode::child("items", BasicElement::new("Item").shared(), &app).unwrap();
        assert!(!items.holds_object().unwrap());
        assert_eq!(items.state().unwrap(), json!([{"task": "milk"}]));
        items.reset_state(true).unwrap();
        assert_eq!(app.get_state("items").unwrap(), json!([{"task": "milk"}]));
    }
}
