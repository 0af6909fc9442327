//! File snapshots: the content of a file as the core last saw it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lines of a file plus enough metadata to detect external modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub lines: Vec<String>,
    pub hash: String,
    pub size: u64,
    pub modified_at: u64,
}

impl FileSnapshot {
    /// Build a snapshot from raw file content, splitting on `\n`.
    ///
    /// A trailing newline in `content` is preserved: splitting `"a\nb\n"`
    /// yields `["a", "b"]` with no synthetic empty trailing element, matching
    /// how the lines are rejoined on write (`lines.join("\n") + "\n"`).
    pub fn from_content(content: &str, modified_at: u64) -> Self {
        let lines: Vec<String> = if content.is_empty() {
            Vec::new()
        } else {
            content
                .strip_suffix('\n')
                .unwrap_or(content)
                .split('\n')
                .map(str::to_string)
                .collect()
        };
        let has_trailing_newline = content.ends_with('\n') && !content.is_empty();
        Self::from_lines(lines, content.len() as u64, modified_at, has_trailing_newline)
    }

    pub fn from_lines(
        lines: Vec<String>,
        size: u64,
        modified_at: u64,
        trailing_newline: bool,
    ) -> Self {
        let hash = hash_lines(&lines, trailing_newline);
        Self {
            lines,
            hash,
            size,
            modified_at,
        }
    }

    /// Reconstitutes file content from the stored lines, preserving a final
    /// newline decision recorded at construction time via the hash input;
    /// callers that need an explicit trailing newline should track it
    /// alongside the snapshot (see [`FileSnapshot::to_content`]).
    pub fn to_content(&self, trailing_newline: bool) -> String {
        let joined = self.lines.join("\n");
        if trailing_newline && !joined.is_empty() {
            format!("{joined}\n")
        } else {
            joined
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn hash_matches(&self, lines: &[String], trailing_newline: bool) -> bool {
        self.hash == hash_lines(lines, trailing_newline)
    }
}

pub fn hash_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    if trailing_newline {
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_trailing_newline() {
        let snap = FileSnapshot::from_content("a\nb\nc\n", 0);
        assert_eq!(snap.lines, vec!["a", "b", "c"]);
        assert_eq!(snap.to_content(true), "a\nb\nc\n");
    }

    #[test]
    fn round_trips_without_trailing_newline() {
        let snap = FileSnapshot::from_content("a\nb", 0);
        assert_eq!(snap.lines, vec!["a", "b"]);
        assert_eq!(snap.to_content(false), "a\nb");
    }

    #[test]
    fn empty_file_has_zero_lines() {
        let snap = FileSnapshot::from_content("", 0);
        assert_eq!(snap.line_count(), 0);
    }

    #[test]
    fn hash_changes_with_content() {
        let a = FileSnapshot::from_content("a\n", 0);
        let b = FileSnapshot::from_content("b\n", 0);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_matches_detects_external_modification() {
        let snap = FileSnapshot::from_content("a\nb\n", 0);
        assert!(snap.hash_matches(&["a".to_string(), "b".to_string()], true));
        assert!(!snap.hash_matches(&["a".to_string(), "x".to_string()], true));
    }
}
