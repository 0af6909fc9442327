//! The tool registry: holds tool definitions, exposes
//! validate+execute by name. Read-only after construction.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::tools::traits::{ParamType, Tool, ToolCategory};

pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registers a tool. Duplicate names are a programming error.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name, tool).is_some() {
            panic!("duplicate tool registration: {name}");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.values().map(Box::as_ref)
    }

    pub fn by_category(&self, category: ToolCategory) -> Vec<&dyn Tool> {
        self.tools
            .values()
            .map(Box::as_ref)
            .filter(|t| t.category() == category)
            .collect()
    }

    /// Exports every tool's schema as JSON, suitable for a model-facing
    /// tool-use prompt.
    pub fn export_schema(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .values()
            .map(|tool| {
                let params: Vec<Value> = tool
                    .params()
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "type": param_type_name(p.param_type),
                            "description": p.description,
                            "required": p.required,
                            "enum": p.enum_values,
                        })
                    })
                    .collect();
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "category": category_name(tool.category()),
                    "requires_confirmation": tool.requires_confirmation(),
                    "params": params,
                })
            })
            .collect();
        json!({ "tools": tools })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn param_type_name(t: ParamType) -> &'static str {
    match t {
        ParamType::String => "string",
        ParamType::Number => "number",
        ParamType::Boolean => "boolean",
        ParamType::Array => "array",
    }
}

fn category_name(c: ToolCategory) -> &'static str {
    match c {
        ToolCategory::Read => "read",
        ToolCategory::Edit => "edit",
        ToolCategory::Search => "search",
        ToolCategory::Analysis => "analysis",
        ToolCategory::Git => "git",
        ToolCategory::Run => "run",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::traits::{ParamSpec, ToolContext};
    use crate::tools::result::ToolExecResult;
    use async_trait::async_trait;

    struct Echo;
    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "echoes input"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Read
        }
        fn requires_confirmation(&self) -> bool {
            false
        }
        fn params(&self) -> &'static [ParamSpec] {
            &[]
        }
        async fn execute(&self, _params: BTreeMap<String, Value>, _ctx: &ToolContext) -> ToolExecResult {
            ToolExecResult::same_content("echo", "ok")
        }
    }

    #[test]
    fn registers_and_looks_up_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo));
        assert!(registry.has("echo"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate tool registration")]
    fn duplicate_registration_panics() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo));
        registry.register(Box::new(Echo));
    }

    #[test]
    fn by_category_filters() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo));
        assert_eq!(registry.by_category(ToolCategory::Read).len(), 1);
        assert_eq!(registry.by_category(ToolCategory::Edit).len(), 0);
    }
}
