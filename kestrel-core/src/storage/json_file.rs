//! JSON-file-backed [`StoragePort`]: the whole store lives in memory and is
//! flushed to a single file on every mutation. Simpler than a real database
//! but durable enough for a single-user local agent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::errors::{KestrelError, KestrelResult};
use crate::storage::port::{Namespace, StoragePort};

#[derive(Debug, Default, Serialize, Deserialize)]
struct OnDisk {
    files: BTreeMap<String, Value>,
    asts: BTreeMap<String, Value>,
    metas: BTreeMap<String, Value>,
    indexes: BTreeMap<String, Value>,
    project_config: BTreeMap<String, Value>,
    sessions: BTreeMap<String, Value>,
    undo_stacks: BTreeMap<String, Value>,
}

impl OnDisk {
    fn namespace(&self, ns: Namespace) -> &BTreeMap<String, Value> {
        match ns {
            Namespace::Files => &self.files,
            Namespace::Asts => &self.asts,
            Namespace::Metas => &self.metas,
            Namespace::Indexes => &self.indexes,
            Namespace::ProjectConfig => &self.project_config,
            Namespace::Sessions => &self.sessions,
            Namespace::UndoStacks => &self.undo_stacks,
        }
    }

    fn namespace_mut(&mut self, ns: Namespace) -> &mut BTreeMap<String, Value> {
        match ns {
            Namespace::Files => &mut self.files,
            Namespace::Asts => &mut self.asts,
            Namespace::Metas => &mut self.metas,
            Namespace::Indexes => &mut self.indexes,
            Namespace::ProjectConfig => &mut self.project_config,
            Namespace::Sessions => &mut self.sessions,
            Namespace::UndoStacks => &mut self.undo_stacks,
        }
    }
}

pub struct JsonFileStorage {
    path: PathBuf,
    state: RwLock<OnDisk>,
    connected: AtomicBool,
}

impl JsonFileStorage {
    /// Opens (or creates) the store at `path`, loading any existing content.
    pub async fn open(path: impl Into<PathBuf>) -> KestrelResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| KestrelError::storage(e.to_string()))?;
            serde_json::from_str(&text).unwrap_or_default()
        } else {
            OnDisk::default()
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
            connected: AtomicBool::new(true),
        })
    }

    async fn flush(&self, state: &OnDisk) -> KestrelResult<()> {
        let text = serde_json::to_string_pretty(state).map_err(|e| KestrelError::storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| KestrelError::storage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| KestrelError::storage(e.to_string()))
    }
}

#[async_trait]
impl StoragePort for JsonFileStorage {
    async fn connect(&self) -> KestrelResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> KestrelResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, namespace: Namespace, key: &str) -> KestrelResult<Option<Value>> {
        let state = self.state.read().await;
        Ok(state.namespace(namespace).get(key).cloned())
    }

    async fn set(&self, namespace: Namespace, key: &str, value: Value) -> KestrelResult<()> {
        let mut state = self.state.write().await;
        state.namespace_mut(namespace).insert(key.to_string(), value);
        self.flush(&state).await
    }

    async fn delete(&self, namespace: Namespace, key: &str) -> KestrelResult<()> {
        let mut state = self.state.write().await;
        state.namespace_mut(namespace).remove(key);
        self.flush(&state).await
    }

    async fn hgetall(&self, namespace: Namespace) -> KestrelResult<BTreeMap<String, Value>> {
        let state = self.state.read().await;
        Ok(state.namespace(namespace).clone())
    }

    async fn count(&self, namespace: Namespace) -> KestrelResult<usize> {
        let state = self.state.read().await;
        Ok(state.namespace(namespace).len())
    }

    async fn clear_all(&self) -> KestrelResult<()> {
        let mut state = self.state.write().await;
        *state = OnDisk::default();
        self.flush(&state).await
    }

    async fn list_sessions(&self) -> KestrelResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state.sessions.keys().cloned().collect())
    }

    async fn latest_session_by_project(&self, project: &str) -> KestrelResult<Option<String>> {
        let state = self.state.read().await;
        let mut best: Option<(u64, String)> = None;
        for (id, value) in &state.sessions {
            if value.get("project_name").and_then(Value::as_str) != Some(project) {
                continue;
            }
            let last_activity = value.get("last_activity_at").and_then(Value::as_u64).unwrap_or(0);
            if best.as_ref().map(|(ts, _)| last_activity > *ts).unwrap_or(true) {
                best = Some((last_activity, id.clone()));
            }
        }
        Ok(best.map(|(_, id)| id))
    }

    async fn touch_session(&self, id: &str, now: u64) -> KestrelResult<()> {
        let mut state = self.state.write().await;
        if let Some(value) = state.sessions.get_mut(id) {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("last_activity_at".to_string(), Value::from(now));
            }
        }
        self.flush(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn persists_and_reloads_values() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        {
            let storage = JsonFileStorage::open(&path).await.unwrap();
            storage.set(Namespace::Files, "a.ts", Value::from("x")).await.unwrap();
        }

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(Namespace::Files, "a.ts").await.unwrap(),
            Some(Value::from("x"))
        );
    }
}
