//! The project index: the substrate every read/search/analysis tool
//! reads from.

pub mod deps_graph;
pub mod indexer;
pub mod symbol_index;

pub use deps_graph::DepsGraph;
pub use indexer::{WorkspaceIndex, WorkspaceIndexer};
pub use symbol_index::{SymbolDefinition, SymbolIndex, SymbolKind};
