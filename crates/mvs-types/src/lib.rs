//! Foundation types for mvstore.
//!
//! Every other mvstore crate depends on `mvs-types`. It holds the plain data
//! that flows between the schema resolver, the expression engine, the
//! persistence channels and the store tree.
//!
//! # Key Types
//!
//! - [`ModelDescriptor`]: per-component-type model: schema class, mappings,
//!   referenced schemas and remote filters
//! - [`Mapping`]: binds a state value (direct or derived) to a component property
//! - [`StorageModes`]: which persistence channels back a store
//! - [`UpsertRecord`] / [`QueryRequest`]: remote persistence contract
//! - [`StoreConfig`]: repository identifier, API base and local directories
//! - [`path`]: dotted root-relative path helpers

pub mod config;
pub mod error;
pub mod model;
pub mod path;
pub mod record;

pub use config::StoreConfig;
pub use error::TypeError;
pub use model::{Mapping, MappingSource, ModelClass, ModelDescriptor, StorageModes};
pub use path::{join_path, qualify, split_first, split_path, validate_store_name};
pub use record::{QueryRequest, UpsertRecord};
