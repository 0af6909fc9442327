//! The Storage port: an asynchronous, namespaced key-value store. All
//! values are opaque to the store — the core serializes and deserializes
//! them itself, so a port implementation never inspects their shape beyond
//! the handful of session fields `touch`/`latest_by_project` need.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::KestrelResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Namespace {
    Files,
    Asts,
    Metas,
    Indexes,
    ProjectConfig,
    Sessions,
    UndoStacks,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Asts => "asts",
            Self::Metas => "metas",
            Self::Indexes => "indexes",
            Self::ProjectConfig => "project-config",
            Self::Sessions => "sessions",
            Self::UndoStacks => "undo-stacks",
        }
    }
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn connect(&self) -> KestrelResult<()>;
    async fn disconnect(&self) -> KestrelResult<()>;
    fn is_connected(&self) -> bool;

    async fn get(&self, namespace: Namespace, key: &str) -> KestrelResult<Option<Value>>;
    async fn set(&self, namespace: Namespace, key: &str, value: Value) -> KestrelResult<()>;
    async fn delete(&self, namespace: Namespace, key: &str) -> KestrelResult<()>;
    async fn hgetall(&self, namespace: Namespace) -> KestrelResult<BTreeMap<String, Value>>;
    async fn count(&self, namespace: Namespace) -> KestrelResult<usize>;
    async fn clear_all(&self) -> KestrelResult<()>;

    /// Every session id currently stored, in no particular order.
    async fn list_sessions(&self) -> KestrelResult<Vec<String>>;

    /// The most recently active session for `project`, if any.
    async fn latest_session_by_project(&self, project: &str) -> KestrelResult<Option<String>>;

    /// Updates a session's `last_activity_at` field in place.
    async fn touch_session(&self, id: &str, now: u64) -> KestrelResult<()>;
}
