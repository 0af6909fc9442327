//! Typed read/write helpers over the opaque [`StoragePort`] namespaces, so
//! individual tools don't each hand-roll `serde_json::from_value`.

use std::collections::BTreeMap;

use crate::index::{DepsGraph, SymbolIndex, WorkspaceIndex};
use crate::model::ast::FileAst;
use crate::model::meta::FileMeta;
use crate::model::session::Session;
use crate::model::snapshot::FileSnapshot;
use crate::storage::{Namespace, StoragePort};

pub async fn load_snapshot(storage: &dyn StoragePort, path: &str) -> Option<FileSnapshot> {
    let value = storage.get(Namespace::Files, path).await.ok()??;
    serde_json::from_value(value).ok()
}

pub async fn save_snapshot(storage: &dyn StoragePort, path: &str, snapshot: &FileSnapshot) {
    if let Ok(value) = serde_json::to_value(snapshot) {
        let _ = storage.set(Namespace::Files, path, value).await;
    }
}

pub async fn load_ast(storage: &dyn StoragePort, path: &str) -> Option<FileAst> {
    let value = storage.get(Namespace::Asts, path).await.ok()??;
    serde_json::from_value(value).ok()
}

pub async fn save_ast(storage: &dyn StoragePort, path: &str, ast: &FileAst) {
    if let Ok(value) = serde_json::to_value(ast) {
        let _ = storage.set(Namespace::Asts, path, value).await;
    }
}

pub async fn load_meta(storage: &dyn StoragePort, path: &str) -> Option<FileMeta> {
    let value = storage.get(Namespace::Metas, path).await.ok()??;
    serde_json::from_value(value).ok()
}

pub async fn save_meta(storage: &dyn StoragePort, path: &str, meta: &FileMeta) {
    if let Ok(value) = serde_json::to_value(meta) {
        let _ = storage.set(Namespace::Metas, path, value).await;
    }
}

pub async fn all_metas(storage: &dyn StoragePort) -> BTreeMap<String, FileMeta> {
    let raw = storage.hgetall(Namespace::Metas).await.unwrap_or_default();
    raw.into_iter()
        .filter_map(|(path, value)| serde_json::from_value(value).ok().map(|m| (path, m)))
        .collect()
}

pub async fn all_asts(storage: &dyn StoragePort) -> BTreeMap<String, FileAst> {
    let raw = storage.hgetall(Namespace::Asts).await.unwrap_or_default();
    raw.into_iter()
        .filter_map(|(path, value)| serde_json::from_value(value).ok().map(|a| (path, a)))
        .collect()
}

pub async fn load_symbol_index(storage: &dyn StoragePort) -> SymbolIndex {
    storage
        .get(Namespace::Indexes, "symbols")
        .await
        .ok()
        .flatten()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub async fn save_symbol_index(storage: &dyn StoragePort, index: &SymbolIndex) {
    if let Ok(value) = serde_json::to_value(index) {
        let _ = storage.set(Namespace::Indexes, "symbols", value).await;
    }
}

pub async fn load_deps_graph(storage: &dyn StoragePort) -> DepsGraph {
    storage
        .get(Namespace::Indexes, "deps")
        .await
        .ok()
        .flatten()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub async fn save_deps_graph(storage: &dyn StoragePort, graph: &DepsGraph) {
    if let Ok(value) = serde_json::to_value(graph) {
        let _ = storage.set(Namespace::Indexes, "deps", value).await;
    }
}

pub async fn load_session(storage: &dyn StoragePort, id: &str) -> Option<Session> {
    let value = storage.get(Namespace::Sessions, id).await.ok()??;
    serde_json::from_value(value).ok()
}

pub async fn save_session(storage: &dyn StoragePort, session: &Session) {
    if let Ok(value) = serde_json::to_value(session) {
        let _ = storage.set(Namespace::Sessions, &session.id, value).await;
    }
}

/// Writes a freshly built [`WorkspaceIndex`] into storage: one snapshot,
/// AST, and meta per file, plus the symbol index and dependency graph.
pub async fn persist_workspace_index(storage: &dyn StoragePort, index: &WorkspaceIndex, now: u64) {
    for (path, content) in &index.contents {
        let snapshot = FileSnapshot::from_content(content, now);
        save_snapshot(storage, path, &snapshot).await;
    }
    for (path, ast) in &index.asts {
        save_ast(storage, path, ast).await;
    }
    for (path, meta) in &index.metas {
        save_meta(storage, path, meta).await;
    }
    save_symbol_index(storage, &index.symbols).await;
    save_deps_graph(storage, &index.deps).await;
}

pub async fn delete_file_state(storage: &dyn StoragePort, path: &str) {
    let _ = storage.delete(Namespace::Files, path).await;
    let _ = storage.delete(Namespace::Asts, path).await;
    let _ = storage.delete(Namespace::Metas, path).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::WorkspaceIndexer;
    use crate::storage::InMemoryStorage;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn persist_workspace_index_writes_every_namespace() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ts"), "export function f() {}\n").unwrap();

        let index = WorkspaceIndexer::new(dir.path()).index_workspace().unwrap();
        let storage = InMemoryStorage::new();
        persist_workspace_index(&storage, &index, 0).await;

        assert!(load_snapshot(&storage, "a.ts").await.is_some());
        assert!(load_ast(&storage, "a.ts").await.is_some());
        assert!(load_meta(&storage, "a.ts").await.is_some());
        assert!(!load_symbol_index(&storage).await.lookup("f").is_empty());
    }
}
