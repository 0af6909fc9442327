//! Git tools: `git_status`, `git_diff`, `git_commit`. Thin wrappers over
//! the `git` binary, parsing porcelain output rather than shelling out to
//! a library.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;

use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

async fn run_git(root: &std::path::Path, args: &[&str]) -> Result<(bool, String, String), String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .env("GIT_PAGER", "cat")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| e.to_string())?;
    Ok((
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}

pub struct GitStatus;

#[async_trait]
impl Tool for GitStatus {
    fn name(&self) -> &'static str {
        "git_status"
    }
    fn description(&self) -> &'static str {
        "Returns the current branch and porcelain status of the project."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Git
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[]
    }

    async fn execute(&self, _params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let root = ctx.project_root.root();

        let (ok, branch_out, err) = match run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"]).await {
            Ok(v) => v,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if !ok {
            return ToolExecResult::error(self.name(), if err.is_empty() { "not a git repository".to_string() } else { err });
        }
        let branch = branch_out.trim().to_string();

        let (ok, status_out, err) = match run_git(root, &["status", "--porcelain"]).await {
            Ok(v) => v,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if !ok {
            return ToolExecResult::error(self.name(), err);
        }

        let entries: Vec<Value> = status_out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                let (code, path) = line.split_at(2.min(line.len()));
                json!({"status": code.trim(), "path": path.trim()})
            })
            .collect();
        let dirty = !entries.is_empty();

        ToolResponseBuilder::new(self.name())
            .content(status_out.clone())
            .data("branch", json!(branch))
            .data("dirty", json!(dirty))
            .data("entries", json!(entries))
            .build()
    }
}

pub struct GitDiff;

#[async_trait]
impl Tool for GitDiff {
    fn name(&self) -> &'static str {
        "git_diff"
    }
    fn description(&self) -> &'static str {
        "Returns the unified diff for the working tree or a specific path."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Git
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "restrict the diff to this path", required: false, enum_values: None },
            ParamSpec { name: "staged", param_type: ParamType::Boolean, description: "diff the index instead of the working tree", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str);
        let staged = params.get("staged").and_then(Value::as_bool).unwrap_or(false);

        let mut args: Vec<&str> = vec!["diff"];
        if staged {
            args.push("--staged");
        }
        if let Some(path) = path {
            args.push("--");
            args.push(path);
        }

        let root = ctx.project_root.root();
        let (ok, out, err) = match run_git(root, &args).await {
            Ok(v) => v,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if !ok {
            return ToolExecResult::error(self.name(), err);
        }

        ToolResponseBuilder::new(self.name())
            .content(out)
            .data("staged", json!(staged))
            .build()
    }
}

pub struct GitCommit;

#[async_trait]
impl Tool for GitCommit {
    fn name(&self) -> &'static str {
        "git_commit"
    }
    fn description(&self) -> &'static str {
        "Commits staged (or specified) changes with the given message."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Git
    }
    fn requires_confirmation(&self) -> bool {
        true
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "message", param_type: ParamType::String, description: "commit message", required: true, enum_values: None },
            ParamSpec { name: "files", param_type: ParamType::Array, description: "paths to stage before committing; defaults to everything already staged", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let message = params.get("message").and_then(Value::as_str).unwrap_or_default();
        let files: Vec<String> = params
            .get("files")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        let outcome = ctx.confirm(format!("Commit with message \"{message}\"?"), None);
        if !outcome.confirmed {
            return ToolExecResult::error(self.name(), "cancelled");
        }

        let root = ctx.project_root.root();
        if !files.is_empty() {
            let mut add_args: Vec<&str> = vec!["add", "--"];
            add_args.extend(files.iter().map(String::as_str));
            let (ok, _, err) = match run_git(root, &add_args).await {
                Ok(v) => v,
                Err(e) => return ToolExecResult::error(self.name(), e),
            };
            if !ok {
                return ToolExecResult::error(self.name(), err);
            }
        }

        let (ok, out, err) = match run_git(root, &["commit", "-m", message]).await {
            Ok(v) => v,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if !ok {
            return ToolExecResult::error(self.name(), if err.is_empty() { out } else { err });
        }

        ToolResponseBuilder::new(self.name())
            .content(out)
            .data("message", json!(message))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_guard::PathGuard;
    use crate::storage::InMemoryStorage;
    use crate::tools::traits::ConfirmationOutcome;
    use std::process::Command as StdCommand;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn ctx_for(root: &std::path::Path) -> ToolContext {
        ToolContext {
            project_root: PathGuard::new(root),
            storage: Arc::new(InMemoryStorage::new()),
            request_confirmation: Box::new(|_req| ConfirmationOutcome { confirmed: true, edited_content: None }),
            on_progress: Box::new(|_msg| {}),
        }
    }

    fn init_repo(dir: &std::path::Path) {
        let run = |args: &[&str]| {
            StdCommand::new("git").args(args).current_dir(dir).output().expect("git available in test env")
        };
        run(&["init", "--initial-branch=main"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
    }

    #[tokio::test]
    async fn git_status_reports_branch_and_dirty_flag() {
        let dir = tempdir().expect("tempdir");
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let ctx = ctx_for(dir.path());

        let result = GitStatus.execute(BTreeMap::new(), &ctx).await;
        assert!(result.success);
        assert_eq!(result.metadata.data["dirty"], json!(true));
    }

    #[tokio::test]
    async fn git_commit_requires_confirmation_and_commits() {
        let dir = tempdir().expect("tempdir");
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("message".to_string(), json!("initial commit"));
        params.insert("files".to_string(), json!(["a.txt"]));
        let result = GitCommit.execute(params, &ctx).await;
        assert!(result.success);
    }
}
