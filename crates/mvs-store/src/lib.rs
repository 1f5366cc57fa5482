//! Hierarchical, schema-driven state store.
//!
//! Components own [`StoreNode`]s arranged in a tree that mirrors component
//! composition. The root holds the whole state as one JSON object and the
//! listener registry; every other node reads and writes the subtree addressed
//! by its ancestors' names.
//!
//! A node's lifecycle:
//!
//! 1. register with the parent (or become the root)
//! 2. fill schema defaults, layering defined element properties on top
//! 3. merge persisted state (remote query, local snapshot)
//! 4. register the model's mappings as path-keyed listeners at the root
//! 5. dispatch so subscribed elements receive their first values
//!
//! Afterwards the mutation API (`update_value`, `add_item`, `remove_item`,
//! `update_item`) persists and dispatches.
//!
//! ```
//! use mvs_store::{BasicElement, StoreContext, StoreNode};
//! use mvs_types::{Mapping, ModelDescriptor};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), mvs_store::StoreError> {
//! let ctx = StoreContext::in_memory()
//!     .with_model("Sum", ModelDescriptor::new().with_mapping(Mapping::expression("sum", "a + b")))
//!     .shared();
//! let el = BasicElement::new("Sum").shared();
//! let store = StoreNode::root("calc", el.clone(), ctx)?;
//! store.update_value("a", json!(2))?;
//! store.update_value("b", json!(3))?;
//! assert_eq!(el.borrow().get("sum"), Some(&json!(5)));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod element;
pub mod error;
pub mod listeners;
pub mod mutation;
pub mod node;
pub mod registry;

pub use context::StoreContext;
pub use element::{BasicElement, Element, ElementRef, WeakElement};
pub use error::{StoreError, StoreResult};
pub use listeners::{key_matches, Binding, CompiledMapping, ListenerEntry, ListenerRegistry};
pub use mutation::{Notify, IDENTITY_FIELD};
pub use node::StoreNode;
pub use registry::ModelRegistry;
