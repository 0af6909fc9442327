//! Conversation messages, tool calls, and tool results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub params: BTreeMap<String, Value>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl ToolResult {
    /// Enforces invariant I5: exactly one of `data`/`error` is present.
    pub fn ok(call_id: impl Into<String>, data: Value, execution_time_ms: u64) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms,
        }
    }

    pub fn err(call_id: impl Into<String>, error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    pub tokens: u64,
    pub time_ms: u64,
    pub tool_call_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: u64,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_results: Option<Vec<ToolResult>>,
    pub stats: Option<MessageStats>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
            tool_calls: None,
            tool_results: None,
            stats: None,
        }
    }

    pub fn system(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp,
            tool_calls: None,
            tool_results: None,
            stats: None,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp,
            tool_calls: None,
            tool_results: None,
            stats: None,
        }
    }

    pub fn assistant_with_calls(
        content: impl Into<String>,
        timestamp: u64,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp,
            tool_calls: Some(tool_calls),
            tool_results: None,
            stats: None,
        }
    }

    pub fn tool_aggregate(timestamp: u64, results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::Tool,
            content: String::new(),
            timestamp,
            tool_calls: None,
            tool_results: Some(results),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: MessageStats) -> Self {
        self.stats = Some(stats);
        self
    }
}
