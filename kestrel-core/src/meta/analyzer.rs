//! The Meta Analyzer: derives [`FileMeta`] from a file's AST, its raw
//! text, and (for dependents) a consistent snapshot of every AST in the
//! project.

use std::collections::BTreeMap;

use crate::meta::classification::{classify_file_type, is_entry_point, is_hub};
use crate::meta::complexity::compute_complexity;
use crate::meta::dependencies::{normalize_for_compare, resolve_dependencies};
use crate::model::ast::FileAst;
use crate::model::meta::FileMeta;

/// One file's `(ast, content)` pair, keyed by project-relative path.
pub type FileInput<'a> = (&'a FileAst, &'a str);

/// Computes metadata for every file in `files` in one pass, so dependents
/// are derived from a single consistent snapshot rather than file-by-file.
pub fn analyze_batch(files: &BTreeMap<String, FileInput<'_>>) -> BTreeMap<String, FileMeta> {
    let dependencies: BTreeMap<String, Vec<String>> = files
        .iter()
        .map(|(path, (ast, _content))| (path.clone(), resolve_dependencies(path, ast)))
        .collect();

    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (path, deps) in &dependencies {
        for dep in deps {
            let dep_key = normalize_for_compare(dep);
            for candidate in files.keys() {
                if normalize_for_compare(candidate) == dep_key {
                    dependents.entry(candidate.clone()).or_default().push(path.clone());
                }
            }
        }
    }
    for list in dependents.values_mut() {
        list.sort();
        list.dedup();
    }

    files
        .iter()
        .map(|(path, (ast, content))| {
            let deps = dependencies.get(path).cloned().unwrap_or_default();
            let dents = dependents.get(path).cloned().unwrap_or_default();
            let meta = FileMeta {
                complexity: compute_complexity(content, ast),
                is_hub: is_hub(dents.len()),
                is_entry_point: is_entry_point(path, dents.len()),
                file_type: classify_file_type(path),
                dependencies: deps,
                dependents: dents,
            };
            (path.clone(), meta)
        })
        .collect()
}

/// Computes metadata for a single file against a full-project AST snapshot,
/// via [`analyze_batch`] restricted to one output.
pub fn analyze_one(path: &str, files: &BTreeMap<String, FileInput<'_>>) -> Option<FileMeta> {
    analyze_batch(files).remove(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::{ImportClassification, ImportRecord};

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
    fn batch_computes_consistent_dependents() {
        let a = ast_with_import("./b");
        let b = FileAst::empty();
        let mut files: BTreeMap<String, FileInput> = BTreeMap::new();
        files.insert("src/a.ts".to_string(), (&a, "const x = 1;\n"));
        files.insert("src/b.ts".to_string(), (&b, "export const y = 2;\n"));

        let metas = analyze_batch(&files);
        assert_eq!(metas["src/a.ts"].dependencies, vec!["src/b.ts".to_string()]);
        assert_eq!(metas["src/b.ts"].dependents, vec!["src/a.ts".to_string()]);
        assert!(metas["src/a.ts"].is_entry_point);
    }
}
