//! Builder for [`ToolExecResult`]s: a consistent way to assemble dual-
//! channel output and structured metadata across every tool implementation.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::tools::result::{ToolExecResult, ToolMetadataBuilder};

pub struct ToolResponseBuilder {
    tool_name: String,
    success: bool,
    message: Option<String>,
    content: Option<String>,
    llm_content: Option<String>,
    ui_content: Option<String>,
    error: Option<String>,
    metadata: ToolMetadataBuilder,
    custom_fields: BTreeMap<String, Value>,
}

impl ToolResponseBuilder {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            message: None,
            content: None,
            llm_content: None,
            ui_content: None,
            error: None,
            metadata: ToolMetadataBuilder::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Explicit dual-channel content, overriding `content` for either side.
    pub fn dual_content(mut self, llm: impl Into<String>, ui: impl Into<String>) -> Self {
        self.llm_content = Some(llm.into());
        self.ui_content = Some(ui.into());
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata = self.metadata.file(path.into());
        self
    }

    pub fn files(mut self, paths: Vec<PathBuf>) -> Self {
        self.metadata = self.metadata.files(paths);
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata = self.metadata.data(key, value);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.custom_fields.insert(key.into(), value);
        self
    }

    pub fn build(self) -> ToolExecResult {
        if !self.success {
            return ToolExecResult::error(
                self.tool_name,
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            );
        }

        let llm = self.llm_content.or_else(|| self.content.clone()).unwrap_or_default();
        let ui = self.ui_content.or(self.content).unwrap_or_default();

        let mut result = ToolExecResult::new(self.tool_name, llm, ui);
        if let Some(msg) = self.message {
            result.metadata = self.metadata.data("message", Value::String(msg)).build();
        } else {
            result.metadata = self.metadata.build();
        }
        for (k, v) in self.custom_fields {
            result.metadata.data.insert(k, v);
        }
        result
    }
}
