//! Undo entries and diffs.

use serde::{Deserialize, Serialize};

use super::snapshot::hash_lines;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub id: String,
    pub timestamp: u64,
    pub file_path: String,
    pub previous_lines: Vec<String>,
    pub new_lines: Vec<String>,
    pub description: String,
    pub tool_call_id: String,
}

impl UndoEntry {
    /// An entry is applicable iff the file's current lines equal `new_lines`.
    pub fn is_applicable(&self, current_lines: &[String]) -> bool {
        hash_lines(current_lines, true) == hash_lines(&self.new_lines, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffInfo {
    pub file_path: String,
    pub old_lines: Vec<String>,
    pub new_lines: Vec<String>,
    pub start_line: usize,
}
