//! The Context Manager: token accounting, file-in-context tracking,
//! and summary-method history compression.

pub mod compression;
pub mod manager;

pub use compression::{compress, CompressionOutcome};
pub use manager::{CompressionMethod, ContextManager, FileContextEntry, DEFAULT_COMPRESSION_THRESHOLD};
