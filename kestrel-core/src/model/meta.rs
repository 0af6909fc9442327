//! Derived per-file metadata: complexity, dependencies, classification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Source,
    Test,
    Config,
    Types,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    pub loc: usize,
    pub max_nesting: u32,
    pub cyclomatic: u32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub complexity: Complexity,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub is_hub: bool,
    pub is_entry_point: bool,
    pub file_type: FileType,
}

impl FileMeta {
    pub const HUB_THRESHOLD: usize = 5;
}
