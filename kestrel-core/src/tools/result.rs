//! Tool execution results: dual LLM-facing/UI-facing content channels plus
//! structured metadata, per the builder pattern in [`super::builder`].

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::message::ToolResult as ModelToolResult;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ToolMetadata {
    pub files: Vec<PathBuf>,
    pub lines: Vec<(String, usize, usize)>,
    pub data: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolMetadataBuilder {
    metadata: ToolMetadata,
}

impl ToolMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: PathBuf) -> Self {
        self.metadata.files.push(path);
        self
    }

    pub fn files(mut self, paths: Vec<PathBuf>) -> Self {
        self.metadata.files.extend(paths);
        self
    }

    pub fn line_range(mut self, path: impl Into<String>, start: usize, end: usize) -> Self {
        self.metadata.lines.push((path.into(), start, end));
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.data.insert(key.into(), value);
        self
    }

    pub fn build(self) -> ToolMetadata {
        self.metadata
    }
}

/// The result of one tool execution, carried through the agent loop before
/// it is folded into a [`ModelToolResult`] for history.
#[derive(Debug, Clone)]
pub struct ToolExecResult {
    pub tool_name: String,
    pub success: bool,
    pub llm_content: String,
    pub ui_content: String,
    pub error: Option<String>,
    pub metadata: ToolMetadata,
}

impl ToolExecResult {
    pub fn new(tool_name: impl Into<String>, llm_content: impl Into<String>, ui_content: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            llm_content: llm_content.into(),
            ui_content: ui_content.into(),
            error: None,
            metadata: ToolMetadata::default(),
        }
    }

    pub fn same_content(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self::new(tool_name, content.clone(), content)
    }

    pub fn error(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            llm_content: String::new(),
            ui_content: String::new(),
            error: Some(error.into()),
            metadata: ToolMetadata::default(),
        }
    }

    /// Converts to the history-facing [`ModelToolResult`], enforcing I5 by
    /// construction: exactly one of `data`/`error`.
    pub fn into_model_result(self, call_id: impl Into<String>, execution_time_ms: u64) -> ModelToolResult {
        if self.success {
            let data = serde_json::json!({
                "llm_content": self.llm_content,
                "ui_content": self.ui_content,
                "metadata": self.metadata,
            });
            ModelToolResult::ok(call_id, data, execution_time_ms)
        } else {
            ModelToolResult::err(
                call_id,
                self.error.unwrap_or_else(|| "unknown error".to_string()),
                execution_time_ms,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_result_carries_no_content() {
        let result = ToolExecResult::error("get_lines", "not found");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("not found"));
    }

    #[test]
    fn model_result_enforces_exclusive_data_or_error() {
        let ok = ToolExecResult::same_content("get_lines", "body").into_model_result("c1", 5);
        assert!(ok.data.is_some() && ok.error.is_none());

        let err = ToolExecResult::error("get_lines", "bad").into_model_result("c2", 5);
        assert!(err.error.is_some() && err.data.is_none());
    }
}
