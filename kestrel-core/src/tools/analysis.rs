//! Analysis tools: `get_dependencies`, `get_dependents`,
//! `get_complexity`, `get_todos`.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::meta::classification::classify_file_type;
use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::storage_helpers::{all_metas, load_meta};
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

fn scoped(metas: &BTreeMap<String, crate::model::meta::FileMeta>, prefix: Option<&str>) -> Vec<String> {
    metas
        .keys()
        .filter(|path| match prefix {
            Some(p) => path.as_str() == p || path.starts_with(&format!("{p}/")),
            None => true,
        })
        .cloned()
        .collect()
}

pub struct GetDependencies;

#[async_trait]
impl Tool for GetDependencies {
    fn name(&self) -> &'static str {
        "get_dependencies"
    }
    fn description(&self) -> &'static str {
        "Returns the imports of a file, each enriched with existence/entry-point/hub/file-type info."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Analysis
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None }]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let Some(meta) = load_meta(ctx.storage.as_ref(), path).await else {
            return ToolExecResult::error(self.name(), format!("no indexed meta for: {path}"));
        };
        let all = all_metas(ctx.storage.as_ref()).await;

        let entries: Vec<Value> = meta
            .dependencies
            .iter()
            .map(|dep| {
                let dep_meta = all.get(dep);
                json!({
                    "path": dep,
                    "exists": dep_meta.is_some(),
                    "is_entry_point": dep_meta.map(|m| m.is_entry_point).unwrap_or(false),
                    "is_hub": dep_meta.map(|m| m.is_hub).unwrap_or(false),
                    "file_type": dep_meta.map(|m| format!("{:?}", m.file_type)).unwrap_or_else(|| format!("{:?}", classify_file_type(dep))),
                })
            })
            .collect();

        ToolResponseBuilder::new(self.name())
            .content(meta.dependencies.join("\n"))
            .data("dependencies", json!(entries))
            .build()
    }
}

pub struct GetDependents;

#[async_trait]
impl Tool for GetDependents {
    fn name(&self) -> &'static str {
        "get_dependents"
    }
    fn description(&self) -> &'static str {
        "Returns every indexed file that imports the given path."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Analysis
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None }]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let Some(meta) = load_meta(ctx.storage.as_ref(), path).await else {
            return ToolExecResult::error(self.name(), format!("no indexed meta for: {path}"));
        };

        ToolResponseBuilder::new(self.name())
            .content(meta.dependents.join("\n"))
            .data("dependents", json!(meta.dependents))
            .build()
    }
}

pub struct GetComplexity;

#[async_trait]
impl Tool for GetComplexity {
    fn name(&self) -> &'static str {
        "get_complexity"
    }
    fn description(&self) -> &'static str {
        "Ranks indexed files by complexity score, optionally scoped to a path."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Analysis
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "restrict to this file or directory prefix", required: false, enum_values: None },
            ParamSpec { name: "limit", param_type: ParamType::Number, description: "max number of entries to return", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let prefix = params.get("path").and_then(Value::as_str);
        let limit = params.get("limit").and_then(Value::as_u64).map(|v| v as usize).unwrap_or(usize::MAX);

        let all = all_metas(ctx.storage.as_ref()).await;
        let mut entries: Vec<(String, f64, &'static str)> = scoped(&all, prefix)
            .into_iter()
            .filter_map(|path| {
                all.get(&path).map(|meta| {
                    let score = meta.complexity.score;
                    let bucket = if score >= 60.0 {
                        "high"
                    } else if score >= 30.0 {
                        "medium"
                    } else {
                        "low"
                    };
                    (path, score, bucket)
                })
            })
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let average = if entries.is_empty() {
            0.0
        } else {
            entries.iter().map(|(_, score, _)| score).sum::<f64>() / entries.len() as f64
        };

        let top: Vec<Value> = entries
            .iter()
            .take(limit)
            .map(|(path, score, bucket)| json!({"path": path, "score": score, "bucket": bucket}))
            .collect();

        ToolResponseBuilder::new(self.name())
            .content(format!("{} file(s) analyzed, average score {:.1}", entries.len(), average))
            .data("entries", json!(top))
            .data("average", json!(average))
            .data("total", json!(entries.len()))
            .build()
    }
}

pub struct GetTodos;

static TODO_PATTERN: OnceLock<Regex> = OnceLock::new();

fn todo_pattern() -> &'static Regex {
    TODO_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?://|/\*|#)\s*(TODO|FIXME|HACK|XXX|BUG|NOTE)(\([^)]*\))?:?\s*(.*)")
            .expect("TODO_PATTERN should compile")
    })
}

#[async_trait]
impl Tool for GetTodos {
    fn name(&self) -> &'static str {
        "get_todos"
    }
    fn description(&self) -> &'static str {
        "Scans files for TODO/FIXME/HACK/XXX/BUG/NOTE comment markers."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Analysis
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "restrict to this file or directory prefix", required: false, enum_values: None },
            ParamSpec { name: "type", param_type: ParamType::String, description: "restrict to one marker type", required: false, enum_values: Some(&["TODO", "FIXME", "HACK", "XXX", "BUG", "NOTE"]) },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let prefix = params.get("path").and_then(Value::as_str);
        let type_filter = params.get("type").and_then(Value::as_str);

        let all = all_metas(ctx.storage.as_ref()).await;
        let paths = scoped(&all, prefix);

        let mut hits: Vec<(String, usize, String, String)> = Vec::new();
        for path in &paths {
            let Some(lines) = super::read::read_current_lines(ctx, path).await else {
                continue;
            };
            for (idx, line) in lines.iter().enumerate() {
                let Some(caps) = todo_pattern().captures(line) else {
                    continue;
                };
                let marker = caps.get(1).map(|m| m.as_str().to_ascii_uppercase()).unwrap_or_default();
                if let Some(filter) = type_filter {
                    if marker != filter.to_ascii_uppercase() {
                        continue;
                    }
                }
                let text = caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
                hits.push((path.clone(), idx + 1, marker, text));
            }
        }
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for (_, _, marker, _) in &hits {
            *counts.entry(marker.clone()).or_insert(0) += 1;
        }

        let body = hits
            .iter()
            .map(|(path, line, marker, text)| format!("{path}:{line}: [{marker}] {text}"))
            .collect::<Vec<_>>()
            .join("\n");
        let entries: Vec<Value> = hits
            .iter()
            .map(|(path, line, marker, text)| json!({"path": path, "line": line, "type": marker, "text": text}))
            .collect();

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("todos", json!(entries))
            .data("counts", json!(counts))
            .build()
    }
}
