//! The Context Manager: token accounting, the file-in-context set,
//! and the compression-needed signal.

use std::collections::BTreeMap;

use crate::model::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Summary,
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileContextEntry {
    pub tokens: u64,
    pub added_at: u64,
}

pub const DEFAULT_COMPRESSION_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct ContextManager {
    tokens: u64,
    files_in_context: BTreeMap<String, FileContextEntry>,
    window_size: u64,
    compression_threshold: f64,
    compression_method: CompressionMethod,
}

impl ContextManager {
    pub fn new(window_size: u64) -> Self {
        Self {
            tokens: 0,
            files_in_context: BTreeMap::new(),
            window_size,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            compression_method: CompressionMethod::Summary,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn with_method(mut self, method: CompressionMethod) -> Self {
        self.compression_method = method;
        self
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Replaces any previously recorded token count for `path`.
    pub fn add_file(&mut self, path: impl Into<String>, tokens: u64, added_at: u64) {
        self.files_in_context.insert(path.into(), FileContextEntry { tokens, added_at });
    }

    pub fn remove_file(&mut self, path: &str) {
        self.files_in_context.remove(path);
    }

    pub fn files_in_context(&self) -> impl Iterator<Item = (&String, &FileContextEntry)> {
        self.files_in_context.iter()
    }

    pub fn add_tokens(&mut self, delta: i64) {
        self.tokens = (self.tokens as i64 + delta).max(0) as u64;
    }

    pub fn usage(&self) -> f64 {
        if self.window_size == 0 {
            return 0.0;
        }
        self.tokens as f64 / self.window_size as f64
    }

    pub fn needs_compression(&self) -> bool {
        self.usage() > self.compression_threshold
    }

    /// Pulls the reduced-fidelity state the session model stores back into
    /// this manager. `files_in_context` in [`crate::model::session::ContextState`]
    /// is path-only, so per-file token/timestamp detail already tracked here
    /// is preserved for paths that remain; new paths get a zero token count
    /// until the caller re-adds them with real figures.
    pub fn sync_from_session(&mut self, session: &Session) {
        self.tokens = (session.context.token_usage * self.window_size as f64).round().max(0.0) as u64;

        let mut next = BTreeMap::new();
        for path in &session.context.files_in_context {
            let entry = self.files_in_context.get(path).copied().unwrap_or(FileContextEntry { tokens: 0, added_at: 0 });
            next.insert(path.clone(), entry);
        }
        self.files_in_context = next;
    }

    /// Writes this manager's state back into the session's reduced-fidelity
    /// `ContextState`.
    pub fn update_session(&self, session: &mut Session) {
        session.context.files_in_context = self.files_in_context.keys().cloned().collect();
        session.context.token_usage = self.usage();
        session.context.needs_compression = self.needs_compression();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_replaces_previous_count_for_same_path() {
        let mut manager = ContextManager::new(1000);
        manager.add_file("a.ts", 100, 1);
        manager.add_file("a.ts", 50, 2);
        let entry = manager.files_in_context().find(|(p, _)| p.as_str() == "a.ts").unwrap().1;
        assert_eq!(entry.tokens, 50);
        assert_eq!(entry.added_at, 2);
    }

    #[test]
    fn usage_and_compression_threshold() {
        let mut manager = ContextManager::new(1000);
        manager.add_tokens(750);
        assert!(!manager.needs_compression());
        manager.add_tokens(100);
        assert!(manager.needs_compression());
        assert!((manager.usage() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn add_tokens_never_goes_negative() {
        let mut manager = ContextManager::new(1000);
        manager.add_tokens(10);
        manager.add_tokens(-100);
        assert_eq!(manager.tokens(), 0);
    }

    #[test]
    fn session_round_trip_preserves_usage_and_file_set() {
        let mut manager = ContextManager::new(1000);
        manager.add_file("a.ts", 200, 1);
        manager.add_tokens(850);

        let mut session = Session::new("s1", "proj", 0);
        manager.update_session(&mut session);
        assert_eq!(session.context.files_in_context, vec!["a.ts".to_string()]);
        assert!((session.context.token_usage - 0.85).abs() < 1e-9);
        assert!(session.context.needs_compression);

        let mut restored = ContextManager::new(1000);
        restored.sync_from_session(&session);
        assert_eq!(restored.tokens(), 850);
        assert_eq!(restored.files_in_context().count(), 1);
    }
}
