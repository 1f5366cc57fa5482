//! Persistence channels for mvstore.
//!
//! A store can be backed locally (a JSON snapshot of the whole root tree
//! under the root store's name) and remotely (a filtered list query while the
//! store is being built, fire-and-forget upserts afterwards). Stores talk to
//! both through the [`PersistenceAdapter`] capability interface.
//!
//! # Modules
//!
//! - [`traits`]: [`PersistenceAdapter`], [`LocalStore`], [`RemoteTransport`]
//! - [`memory`]: in-memory local store, transport and adapter
//! - [`file`]: [`FileLocalStore`], one file per root store
//! - [`http`]: [`HttpTransport`] over `reqwest`
//! - [`channel`]: [`RemoteChannel`], blocking queries and spawned writes
//! - [`adapter`]: [`StandardPersistence`], the production adapter

pub mod adapter;
pub mod channel;
pub mod error;
pub mod file;
pub mod http;
pub mod memory;
pub mod traits;

pub use adapter::StandardPersistence;
pub use channel::RemoteChannel;
pub use error::{PersistError, PersistResult};
pub use file::FileLocalStore;
pub use http::HttpTransport;
pub use memory::{InMemoryLocalStore, InMemoryPersistence, InMemoryTransport};
pub use traits::{collapse_results, validate_key, LocalStore, PersistenceAdapter, RemoteTransport};
