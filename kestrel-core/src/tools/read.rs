//! Read tools: `get_lines`, `get_function`, `get_class`,
//! `get_structure`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::path_guard::ValidateOptions;
use crate::tools::builder::ToolResponseBuilder;
use crate::tools::result::ToolExecResult;
use crate::tools::storage_helpers::load_ast;
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolCategory, ToolContext};

const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    ".idea",
    ".vscode",
    "__pycache__",
    "coverage",
];

pub(crate) async fn read_current_lines(ctx: &ToolContext, path: &str) -> Option<Vec<String>> {
    if let Some(snapshot) = crate::tools::storage_helpers::load_snapshot(ctx.storage.as_ref(), path).await {
        return Some(snapshot.lines);
    }
    let (abs, _) = ctx
        .project_root
        .resolve(path, ValidateOptions { require_file: true, ..Default::default() })
        .ok()?;
    let content = fs::read_to_string(abs).ok()?;
    Some(
        content
            .strip_suffix('\n')
            .unwrap_or(&content)
            .split('\n')
            .map(str::to_string)
            .collect(),
    )
}

pub struct GetLines;

#[async_trait]
impl Tool for GetLines {
    fn name(&self) -> &'static str {
        "get_lines"
    }
    fn description(&self) -> &'static str {
        "Returns a range of lines from a file, 1-based and inclusive."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None },
            ParamSpec { name: "start", param_type: ParamType::Number, description: "first line (1-based)", required: false, enum_values: None },
            ParamSpec { name: "end", param_type: ParamType::Number, description: "last line (inclusive)", required: false, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let Some(lines) = read_current_lines(ctx, path).await else {
            return ToolExecResult::error(self.name(), format!("file not found: {path}"));
        };
        let line_count = lines.len();
        if line_count == 0 {
            return ToolResponseBuilder::new(self.name())
                .content(String::new())
                .data("line_count", json!(0))
                .build();
        }

        let start = params
            .get("start")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(1)
            .clamp(1, line_count);
        let end = params
            .get("end")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(line_count)
            .clamp(1, line_count);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        let body: String = lines[start - 1..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {}\n", start + i, line))
            .collect();

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("start", json!(start))
            .data("end", json!(end))
            .data("line_count", json!(line_count))
            .build()
    }
}

pub struct GetFunction;

#[async_trait]
impl Tool for GetFunction {
    fn name(&self) -> &'static str {
        "get_function"
    }
    fn description(&self) -> &'static str {
        "Returns the source lines of a named top-level function."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None },
            ParamSpec { name: "name", param_type: ParamType::String, description: "function name", required: true, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(ast) = load_ast(ctx.storage.as_ref(), path).await else {
            return ToolExecResult::error(self.name(), format!("no indexed AST for: {path}"));
        };
        let Some(func) = ast.functions.iter().find(|f| f.name == name) else {
            return ToolExecResult::error(self.name(), format!("function not found: {name}"));
        };
        let Some(lines) = read_current_lines(ctx, path).await else {
            return ToolExecResult::error(self.name(), format!("file not found: {path}"));
        };
        let end = func.end_line.min(lines.len());
        let start = func.start_line.min(end.max(1));
        let body = lines[start.saturating_sub(1)..end].join("\n");

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("start_line", json!(func.start_line))
            .data("end_line", json!(func.end_line))
            .data("exported", json!(func.exported))
            .build()
    }
}

pub struct GetClass;

#[async_trait]
impl Tool for GetClass {
    fn name(&self) -> &'static str {
        "get_class"
    }
    fn description(&self) -> &'static str {
        "Returns the source lines of a named top-level class."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "file path", required: true, enum_values: None },
            ParamSpec { name: "name", param_type: ParamType::String, description: "class name", required: true, enum_values: None },
        ]
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(ast) = load_ast(ctx.storage.as_ref(), path).await else {
            return ToolExecResult::error(self.name(), format!("no indexed AST for: {path}"));
        };
        let Some(class) = ast.classes.iter().find(|c| c.name == name) else {
            return ToolExecResult::error(self.name(), format!("class not found: {name}"));
        };
        let Some(lines) = read_current_lines(ctx, path).await else {
            return ToolExecResult::error(self.name(), format!("file not found: {path}"));
        };
        let end = class.end_line.min(lines.len());
        let start = class.start_line.min(end.max(1));
        let body = lines[start.saturating_sub(1)..end].join("\n");

        ToolResponseBuilder::new(self.name())
            .content(body)
            .data("methods", json!(class.methods.iter().map(|m| &m.name).collect::<Vec<_>>()))
            .data("extends", json!(class.extends))
            .data("implements", json!(class.implements))
            .build()
    }
}

pub struct GetStructure;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    is_dir: bool,
}

fn walk_structure(dir: &Path, ignored: &[String], depth: usize, max_depth: usize, out: &mut String) {
    let Ok(read) = fs::read_dir(dir) else { return };
    let mut entries: Vec<Entry> = read
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                return None;
            }
            if ignored.iter().any(|i| i == &name) {
                return None;
            }
            Some(Entry { name, is_dir: e.path().is_dir() })
        })
        .collect();
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then(a.name.cmp(&b.name)));

    for entry in entries {
        let indent = "  ".repeat(depth);
        if entry.is_dir {
            out.push_str(&format!("{indent}{}/\n", entry.name));
            if depth + 1 < max_depth {
                walk_structure(&dir.join(&entry.name), ignored, depth + 1, max_depth, out);
            }
        } else {
            out.push_str(&format!("{indent}{}\n", entry.name));
        }
    }
}

#[async_trait]
impl Tool for GetStructure {
    fn name(&self) -> &'static str {
        "get_structure"
    }
    fn description(&self) -> &'static str {
        "Returns a directory tree, directories before files, alphabetically sorted."
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }
    fn requires_confirmation(&self) -> bool {
        false
    }
    fn params(&self) -> &'static [ParamSpec] {
        &[
            ParamSpec { name: "path", param_type: ParamType::String, description: "subdirectory (default: project root)", required: false, enum_values: None },
            ParamSpec { name: "depth", param_type: ParamType::Number, description: "max recursion depth (>=1)", required: false, enum_values: None },
        ]
    }

    fn validate_params(&self, params: &BTreeMap<String, Value>) -> Option<String> {
        if let Some(depth) = params.get("depth").and_then(Value::as_i64) {
            if depth < 1 {
                return Some("depth must be >= 1".to_string());
            }
        }
        None
    }

    async fn execute(&self, params: BTreeMap<String, Value>, ctx: &ToolContext) -> ToolExecResult {
        let rel = params.get("path").and_then(Value::as_str).unwrap_or(".");
        let depth = params.get("depth").and_then(Value::as_u64).map(|d| d as usize).unwrap_or(usize::MAX);

        let (abs, _) = match ctx.project_root.resolve(rel, ValidateOptions { require_dir: true, ..Default::default() }) {
            Ok(pair) => pair,
            Err(reason) => return ToolExecResult::error(self.name(), reason),
        };

        let mut out = String::new();
        walk_structure(&abs, IGNORED_DIRS, 0, depth, &mut out);

        ToolResponseBuilder::new(self.name()).content(out).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::{FunctionRecord, ClassRecord, MethodRecord, Visibility};
    use crate::path_guard::PathGuard;
    use crate::storage::InMemoryStorage;
    use crate::tools::storage_helpers::save_ast;
    use crate::tools::traits::ConfirmationOutcome;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn ctx_for(root: &Path) -> ToolContext {
        ToolContext {
            project_root: PathGuard::new(root),
            storage: Arc::new(InMemoryStorage::new()),
            request_confirmation: Box::new(|_req| ConfirmationOutcome { confirmed: true, edited_content: None }),
            on_progress: Box::new(|_msg| {}),
        }
    }

    #[tokio::test]
    async fn get_lines_defaults_to_whole_file() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "one\ntwo\nthree\n").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        let result = GetLines.execute(params, &ctx).await;
        assert!(result.success);
        assert_eq!(result.llm_content, "1: one\n2: two\n3: three\n");
    }

    #[tokio::test]
    async fn get_lines_clamps_out_of_range() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "one\ntwo\n").unwrap();
        let ctx = ctx_for(dir.path());

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        params.insert("start".to_string(), json!(0));
        params.insert("end".to_string(), json!(999));
        let result = GetLines.execute(params, &ctx).await;
        assert!(result.success);
        assert_eq!(result.llm_content, "1: one\n2: two\n");
    }

    #[tokio::test]
    async fn get_function_slices_by_line_range() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "a\nb\nc\nd\n").unwrap();
        let ctx = ctx_for(dir.path());

        let mut ast = crate::model::ast::FileAst::empty();
        ast.functions.push(FunctionRecord {
            name: "greet".to_string(),
            start_line: 2,
            end_line: 3,
            params: Vec::new(),
            is_async: false,
            exported: true,
            return_type: None,
        });
        save_ast(ctx.storage.as_ref(), "a.ts", &ast).await;

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        params.insert("name".to_string(), json!("greet"));
        let result = GetFunction.execute(params, &ctx).await;
        assert!(result.success);
        assert_eq!(result.llm_content, "b\nc");
    }

    #[tokio::test]
    async fn get_class_reports_methods() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "class X {\n  m() {}\n}\n").unwrap();
        let ctx = ctx_for(dir.path());

        let mut ast = crate::model::ast::FileAst::empty();
        ast.classes.push(ClassRecord {
            name: "X".to_string(),
            start_line: 1,
            end_line: 3,
            methods: vec![MethodRecord {
                name: "m".to_string(),
                start_line: 2,
                end_line: 2,
                visibility: Visibility::Public,
                is_static: false,
                is_async: false,
            }],
            properties: Vec::new(),
            extends: None,
            implements: Vec::new(),
            exported: false,
            is_abstract: false,
        });
        save_ast(ctx.storage.as_ref(), "a.ts", &ast).await;

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), json!("a.ts"));
        params.insert("name".to_string(), json!("X"));
        let result = GetClass.execute(params, &ctx).await;
        assert!(result.success);
        assert_eq!(result.metadata.data["methods"], json!(["m"]));
    }

    #[tokio::test]
    async fn get_structure_rejects_zero_depth() {
        let dir = tempdir().expect("tempdir");
        let ctx = ctx_for(dir.path());
        let mut params = BTreeMap::new();
        params.insert("depth".to_string(), json!(0));
        let reason = GetStructure.validate_params(&params);
        assert!(reason.is_some());
        let _ = ctx;
    }

    #[tokio::test]
    async fn get_structure_lists_dirs_before_files() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("README.md"), "x").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "x").unwrap();
        let ctx = ctx_for(dir.path());

        let result = GetStructure.execute(BTreeMap::new(), &ctx).await;
        assert!(result.success);
        let dir_pos = result.llm_content.find("src/").unwrap();
        let file_pos = result.llm_content.find("README.md").unwrap();
        assert!(dir_pos < file_pos);
    }
}
