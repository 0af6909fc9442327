//! Dependency resolution and normalization.

use crate::model::ast::{FileAst, ImportClassification};

const KNOWN_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".json", ".yaml", ".yml"];

/// Resolves every internal import of `path`'s [`FileAst`] to a normalized,
/// project-relative path. Imports resolving outside the project (too many
/// `..` segments) are dropped. Result is sorted and deduplicated.
pub fn resolve_dependencies(path: &str, ast: &FileAst) -> Vec<String> {
    let base_dir = parent_dir(path);
    let mut deps: Vec<String> = ast
        .imports
        .iter()
        .filter(|i| i.classification == ImportClassification::Internal)
        .filter_map(|i| resolve_one(&base_dir, &i.module))
        .collect();
    deps.sort();
    deps.dedup();
    deps
}

fn resolve_one(base_dir: &str, module: &str) -> Option<String> {
    let joined = join_relative(base_dir, module)?;
    Some(normalize_extension(&joined))
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Joins `base_dir` with a relative `module` specifier, resolving `.`/`..`
/// segments lexically. Returns `None` if the result escapes the project
/// root (more `..` than there are leading segments to consume).
fn join_relative(base_dir: &str, module: &str) -> Option<String> {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in module.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return None;
                }
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Rewrites a `.js`/`.jsx` suffix to `.ts`/`.tsx`, and appends `.ts` when no
/// known extension is present.
fn normalize_extension(path: &str) -> String {
    if let Some(stem) = path.strip_suffix(".jsx") {
        return format!("{stem}.tsx");
    }
    if let Some(stem) = path.strip_suffix(".js") {
        return format!("{stem}.ts");
    }
    if KNOWN_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return path.to_string();
    }
    format!("{path}.ts")
}

/// Strips the extension and collapses a trailing `/index` to the bare
/// directory, so `dir/index` and `dir` compare equal.
pub fn normalize_for_compare(path: &str) -> String {
    let stripped = KNOWN_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path);
    stripped
        .strip_suffix("/index")
        .map(str::to_string)
        .unwrap_or_else(|| stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::ImportRecord;

    fn ast_with_import(module: &str) -> FileAst {
        FileAst {
            imports: vec![ImportRecord {
                name: "x".to_string(),
                module: module.to_string(),
                line: 1,
                classification: ImportClassification::Internal,
                is_default: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn resolves_relative_import_and_appends_extension() {
        let ast = ast_with_import("./util");
        let deps = resolve_dependencies("src/a.ts", &ast);
        assert_eq!(deps, vec!["src/util.ts".to_string()]);
    }

    #[test]
    fn rewrites_js_extension_to_ts() {
        let ast = ast_with_import("./util.js");
        let deps = resolve_dependencies("src/a.ts", &ast);
        assert_eq!(deps, vec!["src/util.ts".to_string()]);
    }

    #[test]
    fn drops_imports_escaping_project_root() {
        let ast = ast_with_import("../../../outside");
        let deps = resolve_dependencies("src/a.ts", &ast);
        assert!(deps.is_empty());
    }

    #[test]
    fn index_and_directory_compare_equal() {
        assert_eq!(
            normalize_for_compare("components/Button/index.ts"),
            normalize_for_compare("components/Button.ts")
        );
    }
}
