//! Workspace indexing: walks the project tree, extracts an AST per file,
//! and derives metas, the symbol index, and the dependency graph from one
//! consistent snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast;
use crate::errors::KestrelError;
use crate::index::deps_graph::DepsGraph;
use crate::index::symbol_index::SymbolIndex;
use crate::meta::{self, FileInput};
use crate::model::ast::FileAst;
use crate::model::meta::FileMeta;

const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    ".idea",
    ".vscode",
    "__pycache__",
    "coverage",
];

/// The full derived state of a project: every file's raw content, AST, and
/// meta, plus the symbol index and dependency graph built from the same
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceIndex {
    pub contents: BTreeMap<String, String>,
    pub asts: BTreeMap<String, FileAst>,
    pub metas: BTreeMap<String, FileMeta>,
    pub symbols: SymbolIndex,
    pub deps: DepsGraph,
}

pub struct WorkspaceIndexer {
    root: PathBuf,
    extra_ignored: Vec<String>,
}

impl WorkspaceIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extra_ignored: Vec::new(),
        }
    }

    pub fn with_ignored_patterns(mut self, patterns: Vec<String>) -> Self {
        self.extra_ignored = patterns;
        self
    }

    /// Walks the workspace from scratch and builds a full [`WorkspaceIndex`].
    pub fn index_workspace(&self) -> Result<WorkspaceIndex, KestrelError> {
        let mut contents: BTreeMap<String, String> = BTreeMap::new();
        self.walk(&self.root, &mut contents)?;
        Ok(self.build_index(contents))
    }

    /// Re-derives the full index after a single file's content changes:
    /// metas and dependents are recomputed from the complete snapshot
    /// of ASTs, not incrementally.
    pub fn reindex_file(&self, index: WorkspaceIndex, path: &str, content: &str) -> WorkspaceIndex {
        let mut contents = index.contents;
        contents.insert(path.to_string(), content.to_string());
        self.build_index(contents)
    }

    /// Removes a deleted file from the index and rebuilds derived state.
    pub fn remove_file(&self, index: WorkspaceIndex, path: &str) -> WorkspaceIndex {
        let mut contents = index.contents;
        contents.remove(path);
        self.build_index(contents)
    }

    fn walk(&self, dir: &Path, contents: &mut BTreeMap<String, String>) -> Result<(), KestrelError> {
        if !dir.exists() {
            return Ok(());
        }
        let entries = fs::read_dir(dir).map_err(|e| KestrelError::file(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| KestrelError::file(e.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with('.') && name != "." {
                        continue;
                    }
                    if DEFAULT_IGNORED_DIRS.contains(&name)
                        || self.extra_ignored.iter().any(|p| p == name)
                    {
                        continue;
                    }
                }
                self.walk(&path, contents)?;
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(&self.root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if let Ok(text) = fs::read_to_string(&path) {
                        contents.insert(rel_str, text);
                    }
                }
            }
        }
        Ok(())
    }

    fn build_index(&self, contents: BTreeMap<String, String>) -> WorkspaceIndex {
        let asts: BTreeMap<String, FileAst> = contents
            .iter()
            .map(|(path, content)| (path.clone(), ast::extract(path, content)))
            .collect();

        let inputs: BTreeMap<String, FileInput> = asts
            .iter()
            .map(|(path, file_ast)| {
                let content = contents.get(path).map(String::as_str).unwrap_or("");
                (path.clone(), (file_ast, content))
            })
            .collect();

        let metas = meta::analyze_batch(&inputs);

        let mut symbols = SymbolIndex::new();
        for (path, file_ast) in &asts {
            symbols.index_file(path, file_ast);
        }

        let dependency_map: BTreeMap<String, Vec<String>> = metas
            .iter()
            .map(|(path, m)| (path.clone(), m.dependencies.clone()))
            .collect();
        let deps = DepsGraph::rebuild(&dependency_map);

        WorkspaceIndex {
            contents,
            asts,
            metas,
            symbols,
            deps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn indexes_workspace_ignoring_node_modules() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/a.ts"), "export function f() {}\n").unwrap();
        fs::write(root.join("node_modules/pkg/index.ts"), "export function g() {}\n").unwrap();

        let indexer = WorkspaceIndexer::new(root);
        let index = indexer.index_workspace().expect("index succeeds");

        assert!(index.asts.contains_key("src/a.ts"));
        assert!(!index.asts.keys().any(|k| k.contains("node_modules")));
    }

    #[test]
    fn derives_symbols_and_metas_for_indexed_files() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.ts"), "export function doThing() {}\n").unwrap();

        let indexer = WorkspaceIndexer::new(root);
        let index = indexer.index_workspace().expect("index succeeds");

        assert!(!index.symbols.lookup("doThing").is_empty());
        assert!(index.metas.contains_key("src/a.ts"));
    }

    #[test]
    fn reindex_file_updates_single_entry_without_full_rewalk() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.ts"), "export function f() {}\n").unwrap();

        let indexer = WorkspaceIndexer::new(root);
        let index = indexer.index_workspace().expect("index succeeds");
        let updated = indexer.reindex_file(index, "src/a.ts", "export function renamed() {}\n");

        assert!(updated.symbols.lookup("renamed").len() == 1);
        assert!(updated.symbols.lookup("f").is_empty());
    }
}
