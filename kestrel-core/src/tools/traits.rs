//! The tool contract: every tool declares a schema, validates its
//! own parameters synchronously, and executes asynchronously against a
//! [`ToolContext`].

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::undo::DiffInfo;
use crate::path_guard::PathGuard;
use crate::storage::StoragePort;
use crate::tools::result::ToolExecResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolCategory {
    Read,
    Edit,
    Search,
    Analysis,
    Git,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub enum_values: Option<&'static [&'static str]>,
}

/// What confirmation is ultimately requested with: a human-readable message
/// plus an optional diff the UI can render before the user decides.
pub struct ConfirmationRequest {
    pub message: String,
    pub diff: Option<DiffInfo>,
}

/// The outcome of a confirmation round-trip. `edited_content`, when
/// present, overrides the proposed new content.
#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    pub confirmed: bool,
    pub edited_content: Option<String>,
}

/// Callbacks and shared state every tool executes against.
pub struct ToolContext {
    pub project_root: PathGuard,
    pub storage: Arc<dyn StoragePort>,
    pub request_confirmation:
        Box<dyn Fn(ConfirmationRequest) -> ConfirmationOutcome + Send + Sync>,
    pub on_progress: Box<dyn Fn(&str) + Send + Sync>,
}

impl ToolContext {
    pub fn confirm(&self, message: impl Into<String>, diff: Option<DiffInfo>) -> ConfirmationOutcome {
        (self.request_confirmation)(ConfirmationRequest {
            message: message.into(),
            diff,
        })
    }

    pub fn progress(&self, message: impl AsRef<str>) {
        (self.on_progress)(message.as_ref());
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn category(&self) -> ToolCategory;
    fn requires_confirmation(&self) -> bool;
    fn params(&self) -> &'static [ParamSpec];

    /// Pure, synchronous parameter validation; `None` means the call may
    /// proceed to `execute`.
    fn validate_params(&self, params: &BTreeMap<String, Value>) -> Option<String> {
        for spec in self.params() {
            let value = params.get(spec.name);
            if spec.required && value.is_none() {
                return Some(format!("missing required parameter: {}", spec.name));
            }
            if let Some(value) = value {
                if !matches_type(value, spec.param_type) {
                    return Some(format!(
                        "parameter '{}' has the wrong type",
                        spec.name
                    ));
                }
                if let Some(allowed) = spec.enum_values {
                    if let Some(s) = value.as_str() {
                        if !allowed.contains(&s) {
                            return Some(format!(
                                "parameter '{}' must be one of {:?}",
                                spec.name, allowed
                            ));
                        }
                    }
                }
            }
        }
        None
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult;
}

fn matches_type(value: &Value, expected: ParamType) -> bool {
    match expected {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Array => value.is_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_params_reports_missing_required() {
        struct Noop;
        #[async_trait]
        impl Tool for Noop {
            fn name(&self) -> &'static str {
                "noop"
            }
            fn description(&self) -> &'static str {
                "test tool"
            }
            fn category(&self) -> ToolCategory {
                ToolCategory::Read
            }
            fn requires_confirmation(&self) -> bool {
                false
            }
            fn params(&self) -> &'static [ParamSpec] {
                &[ParamSpec {
                    name: "path",
                    param_type: ParamType::String,
                    description: "target path",
                    required: true,
                    enum_values: None,
                }]
            }
            async fn execute(&self, _params: BTreeMap<String, Value>, _ctx: &ToolContext) -> ToolExecResult {
                unreachable!()
            }
        }

        let tool = Noop;
        let err = tool.validate_params(&BTreeMap::new());
        assert!(err.unwrap().contains("path"));
    }
}
