//! In-memory [`StoragePort`] implementation, used by tests and the `init`
//! CLI path before a durable backend is configured.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::errors::KestrelResult;
use crate::storage::port::{Namespace, StoragePort};

#[derive(Default)]
pub struct InMemoryStorage {
    data: RwLock<BTreeMap<(Namespace, String), Value>>,
    connected: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            connected: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl StoragePort for InMemoryStorage {
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
        let data = self.data.read().await;
        Ok(data.get(&(namespace, key.to_string())).cloned())
    }

    async fn set(&self, namespace: Namespace, key: &str, value: Value) -> KestrelResult<()> {
        let mut data = self.data.write().await;
        data.insert((namespace, key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, namespace: Namespace, key: &str) -> KestrelResult<()> {
        let mut data = self.data.write().await;
        data.remove(&(namespace, key.to_string()));
        Ok(())
    }

    async fn hgetall(&self, namespace: Namespace) -> KestrelResult<BTreeMap<String, Value>> {
        let data = self.data.read().await;
        Ok(data
            .iter()
            .filter(|((ns, _), _)| *ns == namespace)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn count(&self, namespace: Namespace) -> KestrelResult<usize> {
        let data = self.data.read().await;
        Ok(data.keys().filter(|(ns, _)| *ns == namespace).count())
    }

    async fn clear_all(&self) -> KestrelResult<()> {
        let mut data = self.data.write().await;
        data.clear();
        Ok(())
    }

    async fn list_sessions(&self) -> KestrelResult<Vec<String>> {
        let data = self.data.read().await;
        Ok(data
            .keys()
            .filter(|(ns, _)| *ns == Namespace::Sessions)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn latest_session_by_project(&self, project: &str) -> KestrelResult<Option<String>> {
        let data = self.data.read().await;
        let mut best: Option<(u64, String)> = None;
        for ((ns, id), value) in data.iter() {
            if *ns != Namespace::Sessions {
                continue;
            }
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
        let mut data = self.data.write().await;
        if let Some(value) = data.get_mut(&(Namespace::Sessions, id.to_string())) {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("last_activity_at".to_string(), Value::from(now));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let storage = InMemoryStorage::new();
        storage.set(Namespace::Files, "a.ts", Value::from("content")).await.unwrap();
        assert_eq!(
            storage.get(Namespace::Files, "a.ts").await.unwrap(),
            Some(Value::from("content"))
        );
        storage.delete(Namespace::Files, "a.ts").await.unwrap();
        assert_eq!(storage.get(Namespace::Files, "a.ts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn hgetall_scoped_to_namespace() {
        let storage = InMemoryStorage::new();
        storage.set(Namespace::Files, "a.ts", Value::from(1)).await.unwrap();
        storage.set(Namespace::Asts, "a.ts", Value::from(2)).await.unwrap();
        let files = storage.hgetall(Namespace::Files).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(storage.count(Namespace::Files).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn touch_session_updates_last_activity() {
        let storage = InMemoryStorage::new();
        storage
            .set(
                Namespace::Sessions,
                "s1",
                serde_json::json!({"project_name": "demo", "last_activity_at": 1}),
            )
            .await
            .unwrap();
        storage.touch_session("s1", 42).await.unwrap();
        let value = storage.get(Namespace::Sessions, "s1").await.unwrap().unwrap();
        assert_eq!(value["last_activity_at"], Value::from(42));
    }

    #[tokio::test]
    async fn latest_session_by_project_picks_most_recent() {
        let storage = InMemoryStorage::new();
        storage
            .set(Namespace::Sessions, "old", serde_json::json!({"project_name": "demo", "last_activity_at": 1}))
            .await
            .unwrap();
        storage
            .set(Namespace::Sessions, "new", serde_json::json!({"project_name": "demo", "last_activity_at": 9}))
            .await
            .unwrap();
        let latest = storage.latest_session_by_project("demo").await.unwrap();
        assert_eq!(latest.as_deref(), Some("new"));
    }
}
