//! Run tools: `run_command`, `run_tests`. Spawns a subprocess with a
//! bounded timeout and output cap.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time;

use crate::command_safety::{classify, tokenize, CommandClass};
use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;
const OUTPUT_CAP_BYTES: usize = 100 * 1024;

fn cap(mut bytes: Vec<u8>) -> (String, bool) {
    let truncated = bytes.len() > OUTPUT_CAP_BYTES;
    bytes.truncate(OUTPUT_CAP_BYTES);
    (String::from_utf8_lossy(&bytes).into_owned(), truncated)
}

struct SpawnOutcome {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
    timed_out: bool,
}

async fn spawn_and_wait(root: &std::path::Path, command: &[String], timeout_secs: u64) -> Result<SpawnOutcome, String> {
    let Some((program, args)) = command.split_first() else {
        return Err("empty command".to_string());
    };

    let mut process = Command::new(program);
    process.args(args);
    process.current_dir(root);
    process.env("FORCE_COLOR", "0");
    process.stdin(Stdio::null());
    process.stdout(Stdio::piped());
    process.stderr(Stdio::piped());
    process.kill_on_drop(true);

    let mut child = process.spawn().map_err(|e| e.to_string())?;
    let mut stdout_pipe = child.stdout.take().ok_or("missing stdout pipe")?;
    let mut stderr_pipe = child.stderr.take().ok_or("missing stderr pipe")?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        buf
    });

    let wait_result = time::timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    let (exit_code, timed_out) = match wait_result {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(e)) => return Err(e.to_string()),
        Err(_) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            (None, true)
        }
    };

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();
    let (stdout, stdout_truncated) = cap(stdout_bytes);
    let (stderr, stderr_truncated) = cap(stderr_bytes);

    Ok(SpawnOutcome { exit_code, stdout, stderr, stdout_truncated, stderr_truncated, timed_out })
}

pub struct RunCommand;

#[async_trait]
impl Tool for RunCommand {
    fn name(&self) -> &'static str {
        "run_command"
    }
    fn description(&self) -> &'static str {
        "Runs a shell command in the project root with a bounded timeout."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Run
    }
    fn requires_confirmation(&self) -> bool {
        // Confirmation is class-dependent (see execute); the schema still
        // advertises the tool as confirmation-capable.
        true
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "command", param_type: ParamType::String, description: "command line to run", required: true, enum_values: None },
            ParamSpec { name: "timeout", param_type: ParamType::Number, description: "timeout in seconds (default 30, max 600)", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let command_line = params.get("command").and_then(Value::as_str).unwrap_or_default();
        let timeout = params
            .get("timeout")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, MAX_TIMEOUT_SECS);

        let tokens = tokenize(command_line);
        match classify(&tokens) {
            CommandClass::Blocked => {
                return ToolExecResult::error(self.name(), format!("command blocked by policy: {command_line}"));
            }
            CommandClass::RequiresConfirmation => {
                let outcome = ctx.confirm(format!("Run `{command_line}`?"), None);
                if !outcome.confirmed {
                    return ToolExecResult::error(self.name(), "cancelled");
                }
            }
            CommandClass::Allowed => {}
        }

        let root = ctx.project_root.root();
        let outcome = match spawn_and_wait(root, &tokens, timeout).await {
            Ok(o) => o,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if outcome.timed_out {
            return ToolExecResult::error(self.name(), format!("command timed out after {timeout}s"));
        }

        let success = outcome.exit_code == Some(0);
        ToolResponseBuilder::new(self.name())
            .content(format!("{}{}", outcome.stdout, outcome.stderr))
            .data("exit_code", json!(outcome.exit_code))
            .data("stdout", json!(outcome.stdout))
            .data("stderr", json!(outcome.stderr))
            .data("success", json!(success))
            .data("stdout_truncated", json!(outcome.stdout_truncated))
            .data("stderr_truncated", json!(outcome.stderr_truncated))
            .build()
    }
}

pub struct RunTests;

#[async_trait]
impl Tool for RunTests {
    fn name(&self) -> &'static str {
        "run_tests"
    }
    fn description(&self) -> &'static str {
        "Runs the project test suite, optionally scoped to a path or filter."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Run
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "restrict tests to this path", required: false, enum_values: None },
            ParamSpec { name: "filter", param_type: ParamType::String, description: "test name filter", required: false, enum_values: None },
            ParamSpec { name: "watch", param_type: ParamType::Boolean, description: "run in watch mode", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str);
        let filter = params.get("filter").and_then(Value::as_str);
        let watch = params.get("watch").and_then(Value::as_bool).unwrap_or(false);

        let mut command: Vec<String> = vec!["npm".to_string(), "test".to_string(), "--".to_string()];
        if watch {
            command.push("--watch".to_string());
        }
        if let Some(path) = path {
            command.push(path.to_string());
        }
        if let Some(filter) = filter {
            command.push("-t".to_string());
            command.push(filter.to_string());
        }

        let root = ctx.project_root.root();
        let outcome = match spawn_and_wait(root, &command, DEFAULT_TIMEOUT_SECS.max(120)).await {
            Ok(o) => o,
            Err(e) => return ToolExecResult::error(self.name(), e),
        };
        if outcome.timed_out {
            return ToolExecResult::error(self.name(), "test run timed out");
        }

        let success = outcome.exit_code == Some(0);
        ToolResponseBuilder::new(self.name())
            .content(format!("{}{}", outcome.stdout, outcome.stderr))
            .data("exit_code", json!(outcome.exit_code))
            .data("stdout", json!(outcome.stdout))
            .data("stderr", json!(outcome.stderr))
            .data("success", json!(success))
            .build()
    }
}
