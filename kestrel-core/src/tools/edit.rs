//! Edit tools: `edit_lines`, `create_file`, `delete_file`. All three
//! require confirmation.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::snapshot::{hash_lines, FileSnapshot};
use crate::model::undo::DiffInfo;
use crate::path_guard::ValidateOptions;
use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::storage_helpers::{delete_file_state, load_snapshot, save_snapshot};
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn split_lines(content: &str) -> (Vec<String>, bool) {
    if content.is_empty() {
        return (Vec::new(), false);
    }
    let trailing = content.ends_with('\n');
    let lines = content
        .strip_suffix('\n')
        .unwrap_or(content)
        .split('\n')
        .map(str::to_string)
        .collect();
    (lines, trailing)
}

/// Reads the file's current lines straight from disk — the authoritative
/// source for the external-modification check — falling back to the stored
/// snapshot only when the file is unreadable from disk (e.g. a virtual
/// fixture in tests).
async fn current_disk_lines(ctx: &ToolContext, abs: &Path, path: &str) -> Option<(Vec<String>, bool)> {
    if let Ok(content) = fs::read_to_string(abs) {
        return Some(split_lines(&content));
    }
    load_snapshot(ctx.storage.as_ref(), path)
        .await
        .map(|snap| (snap.lines, true))
}

pub struct EditLines;

#[async_trait]
impl Tool for EditLines {
    fn name(&self) -> &'static str {
        "edit_lines"
    }
    fn description(&self) -> &'static str {
        "Replaces a 1-based inclusive line range with new content."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Edit
    }
    fn requires_confirmation(&self) -> bool {
        true
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None },
            ParamSpec { name: "start", param_type: ParamType::Number, description: "first line (1-based)", required: true, enum_values: None },
            ParamSpec { name: "end", param_type: ParamType::Number, description: "last line (inclusive)", required: true, enum_values: None },
            ParamSpec { name: "content", param_type: ParamType::String, description: "replacement text", required: true, enum_values: None },
        ]
    }

    fn validate_params(&self, params: &BTreeMap<String, Value>) -> Option<String> {
        let start = params.get("start").and_then(Value::as_i64)?;
        let end = params.get("end").and_then(Value::as_i64)?;
        if start < 1 {
            return Some("start must be >= 1".to_string());
        }
        if start > end {
            return Some("start must be <= end".to_string());
        }
        None
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let start = params.get("start").and_then(Value::as_u64).unwrap_or(1) as usize;
        let end_raw = params.get("end").and_then(Value::as_u64).unwrap_or(1) as usize;
        let content = params.get("content").and_then(Value::as_str).unwrap_or_default();

        let (abs, _) = match ctx.project_root.resolve(path, ValidateOptions { require_file: true, ..Default::default() }) {
            Ok(pair) => pair,
            Err(reason) => return ToolExecResult::error(self.name(), reason),
        };

        let Some((current_lines, trailing_newline)) = current_disk_lines(ctx, &abs, path).await else {
            return ToolExecResult::error(self.name(), format!("file not found: {path}"));
        };
        let line_count = current_lines.len();

        if let Some(stored) = load_snapshot(ctx.storage.as_ref(), path).await {
            if stored.hash != hash_lines(&current_lines, trailing_newline) {
                return ToolExecResult::error(self.name(), "file modified externally");
            }
        }

        if start > line_count {
            return ToolExecResult::error(self.name(), format!("start {start} exceeds line count {line_count}"));
        }
        let end = end_raw.min(line_count).max(start);

        let diff = DiffInfo {
            file_path: path.to_string(),
            old_lines: current_lines[start - 1..end].to_vec(),
            new_lines: content.split('\n').map(str::to_string).collect(),
            start_line: start,
        };

        let outcome = ctx.confirm(format!("Edit {path} lines {start}-{end}?"), Some(diff));
        if !outcome.confirmed {
            return ToolExecResult::error(self.name(), "cancelled");
        }
        let final_content = outcome.edited_content.unwrap_or_else(|| content.to_string());
        let replacement: Vec<String> = final_content.split('\n').map(str::to_string).collect();

        let mut new_lines = current_lines[..start - 1].to_vec();
        new_lines.extend(replacement);
        new_lines.extend(current_lines[end..].iter().cloned());

        let joined = if trailing_newline {
            format!("{}\n", new_lines.join("\n"))
        } else {
            new_lines.join("\n")
        };
        if let Err(err) = fs::write(&abs, &joined) {
            return ToolExecResult::error(self.name(), err.to_string());
        }

        let snapshot = FileSnapshot::from_lines(new_lines, joined.len() as u64, now_secs(), trailing_newline);
        save_snapshot(ctx.storage.as_ref(), path, &snapshot).await;

        ToolResponseBuilder::new(self.name())
            .message(format!("updated {path} lines {start}-{end}"))
            .file(path)
            .build()
    }
}

pub struct CreateFile;

#[async_trait]
impl Tool for CreateFile {
    fn name(&self) -> &'static str {
        "create_file"
    }
    fn description(&self) -> &'static str {
        "Creates a new file with the given content; fails if it already exists."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Edit
    }
    fn requires_confirmation(&self) -> bool {
        true
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None },
            ParamSpec { name: "content", param_type: ParamType::String, description: "file content", required: true, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let content = params.get("content").and_then(Value::as_str).unwrap_or_default();

        let (abs, _) = match ctx.project_root.resolve(path, ValidateOptions { allow_nonexistent: true, ..Default::default() }) {
            Ok(pair) => pair,
            Err(reason) => return ToolExecResult::error(self.name(), reason),
        };
        if abs.exists() {
            return ToolExecResult::error(self.name(), format!("file already exists: {path}"));
        }

        let diff = DiffInfo {
            file_path: path.to_string(),
            old_lines: Vec::new(),
            new_lines: content.split('\n').map(str::to_string).collect(),
            start_line: 1,
        };
        let outcome = ctx.confirm(format!("Create {path}?"), Some(diff));
        if !outcome.confirmed {
            return ToolExecResult::error(self.name(), "cancelled");
        }
        let final_content = outcome.edited_content.unwrap_or_else(|| content.to_string());

        if let Some(parent) = abs.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                return ToolExecResult::error(self.name(), err.to_string());
            }
        }
        if let Err(err) = fs::write(&abs, &final_content) {
            return ToolExecResult::error(self.name(), err.to_string());
        }

        let (lines, trailing) = split_lines(&final_content);
        let snapshot = FileSnapshot::from_lines(lines, final_content.len() as u64, now_secs(), trailing);
        save_snapshot(ctx.storage.as_ref(), path, &snapshot).await;

        ToolResponseBuilder::new(self.name())
            .message(format!("created {path}"))
            .file(path)
            .build()
    }
}

pub struct DeleteFile;

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &'static str {
        "delete_file"
    }
    fn description(&self) -> &'static str {
        "Deletes a regular file and its indexed state."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Edit
    }
    fn requires_confirmation(&self) -> bool {
        true
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None }]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();

        let (abs, _) = match ctx.project_root.resolve(path, ValidateOptions { require_file: true, ..Default::default() }) {
            Ok(pair) => pair,
            Err(reason) => return ToolExecResult::error(self.name(), reason),
        };
        if !abs.is_file() {
            return ToolExecResult::error(self.name(), format!("not a regular file: {path}"));
        }

        let current_lines = fs::read_to_string(&abs)
            .map(|c| split_lines(&c).0)
            .unwrap_or_default();
        let diff = DiffInfo {
            file_path: path.to_string(),
            old_lines: current_lines,
            new_lines: Vec::new(),
            start_line: 1,
        };
        let outcome = ctx.confirm(format!("Delete {path}?"), Some(diff));
        if !outcome.confirmed {
            return ToolExecResult::error(self.name(), "cancelled");
        }

        if let Err(err) = fs::remove_file(&abs) {
            return ToolExecResult::error(self.name(), err.to_string());
        }
        delete_file_state(ctx.storage.as_ref(), path).await;

        ToolResponseBuilder::new(self.name())
            .message(format!("deleted {path}"))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::path_guard::PathGuard;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn ctx_for(root: &Path) -> ToolContext {
        ToolContext {
            project_root: PathGuard::new(root),
            storage: Arc::new(InMemoryStorage::new()),
            request_confirmation: Box::new(|_req| crate::tools::traits::ConfirmationOutcome { confirmed: true, edited_content: None }),
            on_progress: Box::new(|_msg| {}),
        }
    }

    #[tokio::test]
    async fn edit_lines_replaces_range() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "one\ntwo\nthree\n").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        params.insert("start".to_string(), json!(2));
        params.insert("end".to_string(), json!(2));
        params.insert("content".to_string(), json!("TWO"));

        let result = EditLines.execute(params, &ctx).await;
        assert!(result.success);
        let written = fs::read_to_string(dir.path().join("a.ts")).unwrap();
        assert_eq!(written, "one\nTWO\nthree\n");
    }

    #[tokio::test]
    async fn create_file_fails_if_exists() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "x").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        params.insert("content".to_string(), json!("y"));

        let result = CreateFile.execute(params, &ctx).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn delete_file_removes_from_disk() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "x").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        let result = DeleteFile.execute(params, &ctx).await;
        assert!(result.success);
        assert!(!dir.path().join("a.ts").exists());
    }
}
