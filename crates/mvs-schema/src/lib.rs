//! Schema resolution and default-state derivation for mvstore.
//!
//! A store whose model names a schema class initializes its state from that
//! schema: every declared property gets a typed default unless a value is
//! already present. Schemas come from a [`SchemaResolver`], either an
//! [`InMemorySchemaResolver`] or a [`DirSchemaResolver`] reading
//! `<dir>/<class>.json`.
//!
//! # Modules
//!
//! - [`error`]: [`SchemaError`] and [`SchemaResult`]
//! - [`traits`]: the [`SchemaResolver`] trait
//! - [`memory`]: in-memory resolver
//! - [`dir`]: file-per-class resolver
//! - [`defaults`]: default values, `allOf` and `$ref` handling

pub mod defaults;
pub mod dir;
pub mod error;
pub mod memory;
pub mod traits;

pub use defaults::{apply_defaults, default_object, normalize_ref, type_default, SchemaLookup};
pub use dir::DirSchemaResolver;
pub use error::{SchemaError, SchemaResult};
pub use memory::InMemorySchemaResolver;
pub use traits::SchemaResolver;
