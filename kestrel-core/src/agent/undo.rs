//! Undo: pops the most recent [`UndoEntry`], verifies it is still
//! applicable, and restores the file's previous lines.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{KestrelError, KestrelResult};
use crate::model::session::Session;
use crate::model::snapshot::FileSnapshot;
use crate::path_guard::{PathGuard, ValidateOptions};
use crate::storage::StoragePort;
use crate::tools::storage_helpers::save_snapshot;

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn split_lines(content: &str) -> (Vec<String>, bool) {
    if content.is_empty() {
        return (Vec::new(), false);
    }
    let trailing = content.ends_with('\n');
    let lines = content.strip_suffix('\n').unwrap_or(content).split('\n').map(str::to_string).collect();
    (lines, trailing)
}

/// Pops the session's last undo entry and restores its `previous_lines` to
/// disk. Returns `Ok(true)` on success, `Ok(false)` on an inapplicable entry
/// (the file changed since the edit) — either way the entry is consumed and
/// not re-pushed, per the stack advancing past unrecoverable entries.
pub async fn undo_change(session: &mut Session, storage: &dyn StoragePort, path_guard: &PathGuard) -> KestrelResult<bool> {
    let Some(entry) = session.pop_undo() else {
        return Err(KestrelError::conflict("no undo entries available"));
    };

    let (abs, _) = path_guard
        .resolve(&entry.file_path, ValidateOptions { require_file: true, ..Default::default() })
        .map_err(KestrelError::conflict)?;

    let content = fs::read_to_string(&abs).map_err(|e| KestrelError::file(e.to_string()))?;
    let (current_lines, trailing_newline) = split_lines(&content);

    if !entry.is_applicable(&current_lines) {
        return Ok(false);
    }

    let joined = if trailing_newline && !entry.previous_lines.is_empty() {
        format!("{}\n", entry.previous_lines.join("\n"))
    } else {
        entry.previous_lines.join("\n")
    };
    fs::write(&abs, &joined).map_err(|e| KestrelError::file(e.to_string()))?;

    let snapshot = FileSnapshot::from_lines(entry.previous_lines.clone(), joined.len() as u64, now_secs(), trailing_newline);
    save_snapshot(storage, &entry.file_path, &snapshot).await;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::undo::UndoEntry;
    use crate::storage::InMemoryStorage;
    use crate::tools::storage_helpers::load_snapshot;
    use tempfile::tempdir;

    fn entry(file_path: &str, previous: Vec<&str>, new: Vec<&str>) -> UndoEntry {
        UndoEntry {
            id: "u1".to_string(),
            timestamp: 0,
            file_path: file_path.to_string(),
            previous_lines: previous.into_iter().map(str::to_string).collect(),
            new_lines: new.into_iter().map(str::to_string).collect(),
            description: "edit_lines: test".to_string(),
            tool_call_id: "call_1".to_string(),
        }
    }

    #[tokio::test]
    async fn restores_previous_lines_when_applicable() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "NEW\n").unwrap();
        let storage = InMemoryStorage::new();
        let path_guard = PathGuard::new(dir.path());

        let mut session = Session::new("s1", "proj", 0);
        session.push_undo(entry("a.ts", vec!["OLD"], vec!["NEW"]));

        let restored = undo_change(&mut session, &storage, &path_guard).await.unwrap();
        assert!(restored);
        assert_eq!(fs::read_to_string(dir.path().join("a.ts")).unwrap(), "OLD\n");
        assert_eq!(session.undo_stack_len(), 0);

        let snapshot = load_snapshot(&storage, "a.ts").await.unwrap();
        assert_eq!(snapshot.lines, vec!["OLD".to_string()]);
    }

    #[tokio::test]
    async fn reports_conflict_without_repush_when_file_changed_externally() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "SOMETHING_ELSE\n").unwrap();
        let storage = InMemoryStorage::new();
        let path_guard = PathGuard::new(dir.path());

        let mut session = Session::new("s1", "proj", 0);
        session.push_undo(entry("a.ts", vec!["OLD"], vec!["NEW"]));

        let restored = undo_change(&mut session, &storage, &path_guard).await.unwrap();
        assert!(!restored);
        assert_eq!(session.undo_stack_len(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("a.ts")).unwrap(), "SOMETHING_ELSE\n");
    }
}
