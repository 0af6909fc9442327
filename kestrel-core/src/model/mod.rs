//! The shared data model: snapshots, ASTs, metadata, sessions, messages,
//! and undo entries.

pub mod ast;
pub mod message;
pub mod meta;
pub mod session;
pub mod snapshot;
pub mod undo;

pub use ast::FileAst;
pub use message::{Message, MessageStats, Role, ToolCall, ToolResult};
pub use meta::{Complexity, FileMeta, FileType};
pub use session::{ContextState, Session, SessionStats};
pub use snapshot::FileSnapshot;
pub use undo::{DiffInfo, UndoEntry};
