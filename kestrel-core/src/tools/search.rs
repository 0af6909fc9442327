//! Search tools: `find_references`, `find_definition`.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::storage_helpers::{all_metas, load_symbol_index};
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

pub struct FindDefinition;

#[async_trait]
impl Tool for FindDefinition {
    fn name(&self) -> &'static str {
        "find_definition"
    }
    fn description(&self) -> &'static str {
        "Returns every indexed definition site of a symbol."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Search
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[ParamSpec { name: "symbol", param_type: ParamType::String, description: "symbol name", required: true, enum_values: None }]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let symbol = params.get("symbol").and_then(Value::as_str).unwrap_or_default();
        let index = load_symbol_index(ctx.storage.as_ref()).await;
        let defs = index.lookup(symbol);

        if defs.is_empty() {
            return ToolExecResult::error(self.name(), format!("no definition found for: {symbol}"));
        }

        let entries: Vec<Value> = defs
            .iter()
            .map(|d| json!({"path": d.path, "line": d.line, "kind": format!("{:?}", d.kind)}))
            .collect();
        let body = defs
            .iter()
            .map(|d| format!("{}:{}", d.path, d.line))
            .collect::<Vec<_>>()
            .join("\n");

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("definitions", json!(entries))
            .build()
    }
}

pub struct FindReferences;

/// A word-boundary match so `fooBar` doesn't also match a search for `foo`.
fn symbol_regex(symbol: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(symbol))).ok()
}

#[async_trait]
impl Tool for FindReferences {
    fn name(&self) -> &'static str {
        "find_references"
    }
    fn description(&self) -> &'static str {
        "Finds every line mentioning a symbol, optionally scoped to a path prefix."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Search
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "symbol", param_type: ParamType::String, description: "symbol name", required: true, enum_values: None },
            ParamSpec { name: "path", param_type: ParamType::String, description: "restrict the search to this file or directory prefix", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let symbol = params.get("symbol").and_then(Value::as_str).unwrap_or_default();
        let scope = params.get("path").and_then(Value::as_str);

        let Some(pattern) = symbol_regex(symbol) else {
            return ToolExecResult::error(self.name(), format!("invalid symbol: {symbol}"));
        };

        let metas = all_metas(ctx.storage.as_ref()).await;
        let mut hits: Vec<(String, usize, String)> = Vec::new();

        for path in metas.keys() {
            if let Some(scope) = scope {
                if path != scope && !path.starts_with(&format!("{scope}/")) {
                    continue;
                }
            }
            let Some(lines) = super::read::read_current_lines(ctx, path).await else {
                continue;
            };
            for (idx, line) in lines.iter().enumerate() {
                if pattern.is_match(line) {
                    hits.push((path.clone(), idx + 1, line.trim().to_string()));
                }
            }
        }
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let body = hits
            .iter()
            .map(|(path, line, text)| format!("{path}:{line}: {text}"))
            .collect::<Vec<_>>()
            .join("\n");
        let entries: Vec<Value> = hits
            .iter()
            .map(|(path, line, text)| json!({"path": path, "line": line, "text": text}))
            .collect();

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("count", json!(entries.len()))
            .data("references", json!(entries))
            .build()
    }
}
