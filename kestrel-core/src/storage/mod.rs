//! The Storage port: opaque, namespaced key-value persistence for
//! snapshots, ASTs, metas, indexes, sessions, and undo stacks.

pub mod json_file;
pub mod memory;
pub mod port;

pub use json_file::JsonFileStorage;
pub use memory::InMemoryStorage;
pub use port::{Namespace, StoragePort};
