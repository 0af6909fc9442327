//! Session state: conversation history, undo stack, input history,
//! context tracking, and running statistics for one project dialogue.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::message::Message;
use super::undo::UndoEntry;

/// Bound on the undo stack per invariant I4.
pub const UNDO_STACK_BOUND: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextState {
    pub files_in_context: Vec<String>,
    pub token_usage: f64,
    pub needs_compression: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_tokens: u64,
    pub total_time_ms: u64,
    pub tool_calls: u64,
    pub edits_applied: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub project_name: String,
    pub created_at: u64,
    pub last_activity_at: u64,
    pub history: Vec<Message>,
    undo_stack: VecDeque<UndoEntry>,
    pub input_history: Vec<String>,
    pub context: ContextState,
    pub stats: SessionStats,
}

impl Session {
    pub fn new(id: impl Into<String>, project_name: impl Into<String>, now: u64) -> Self {
        Self {
            id: id.into(),
            project_name: project_name.into(),
            created_at: now,
            last_activity_at: now,
            history: Vec::new(),
            undo_stack: VecDeque::new(),
            input_history: Vec::new(),
            context: ContextState::default(),
            stats: SessionStats::default(),
        }
    }

    /// Appends a message to history, honoring I3 ordering only (files
    /// subset membership is enforced by the context manager, not here).
    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Records an input in the deduplicated-consecutive input history
    /// unless suppressed (e.g. a replayed retry).
    pub fn record_input(&mut self, input: &str) {
        if self.input_history.last().map(String::as_str) != Some(input) {
            self.input_history.push(input.to_string());
        }
    }

    /// Pushes an undo entry, evicting the oldest on overflow (I4).
    pub fn push_undo(&mut self, entry: UndoEntry) {
        if self.undo_stack.len() >= UNDO_STACK_BOUND {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(entry);
    }

    /// Pops the most recent undo entry (push order = stack order).
    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo_stack.pop_back()
    }

    pub fn peek_undo(&self) -> Option<&UndoEntry> {
        self.undo_stack.back()
    }

    pub fn undo_stack_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn undo_entries(&self) -> impl Iterator<Item = &UndoEntry> {
        self.undo_stack.iter()
    }

    pub fn touch(&mut self, now: u64) {
        self.last_activity_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::undo::UndoEntry;

    fn entry(id: &str) -> UndoEntry {
        UndoEntry {
            id: id.to_string(),
            timestamp: 0,
            file_path: "a.ts".to_string(),
            previous_lines: vec!["old".to_string()],
            new_lines: vec!["new".to_string()],
            description: "edit".to_string(),
            tool_call_id: "call-1".to_string(),
        }
    }

    #[test]
    fn undo_stack_evicts_oldest_on_overflow() {
        let mut session = Session::new("s1", "proj", 0);
        for i in 0..(UNDO_STACK_BOUND + 3) {
            session.push_undo(entry(&format!("u{i}")));
        }
        assert_eq!(session.undo_stack_len(), UNDO_STACK_BOUND);
        let ids: Vec<_> = session.undo_entries().map(|e| e.id.clone()).collect();
        assert_eq!(ids.first().map(String::as_str), Some("u3"));
        assert_eq!(ids.last().map(String::as_str), Some("u12"));
    }

    #[test]
    fn input_history_dedupes_consecutive_entries() {
        let mut session = Session::new("s1", "proj", 0);
        session.record_input("read file");
        session.record_input("read file");
        session.record_input("edit file");
        assert_eq!(session.input_history, vec!["read file", "edit file"]);
    }

    #[test]
    fn undo_pop_is_lifo() {
        let mut session = Session::new("s1", "proj", 0);
        session.push_undo(entry("first"));
        session.push_undo(entry("second"));
        assert_eq!(session.pop_undo().map(|e| e.id), Some("second".to_string()));
        assert_eq!(session.pop_undo().map(|e| e.id), Some("first".to_string()));
        assert!(session.pop_undo().is_none());
    }
}
