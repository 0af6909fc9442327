//! The UI port: the agent loop talks to whatever front end is attached
//! only through this trait, emitting events and requesting decisions.

use crate::errors::{ErrorChoice, KestrelError};
use crate::model::message::{Message, ToolCall, ToolResult};
use crate::model::undo::{DiffInfo, UndoEntry};

/// What the user decided in response to a confirmation prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmationDecision {
    pub confirmed: bool,
    /// If present, overrides the proposed content (the user edited the diff
    /// before approving it).
    pub edited_content: Option<String>,
}

/// High-level agent status, mirrored from the agent loop's state machine
/// for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Ready,
    Thinking,
    ToolCall,
    AwaitingConfirmation,
    Error,
}

/// Sink for everything the agent loop needs to tell a front end, and the
/// source of everything it needs the front end to decide.
pub trait Ui: Send + Sync {
    fn on_message(&self, message: &Message);
    fn on_tool_call(&self, call: &ToolCall);
    fn on_tool_result(&self, result: &ToolResult);
    fn on_status_change(&self, status: AgentStatus);
    fn on_undo_entry(&self, entry: &UndoEntry);

    fn on_confirmation(&self, message: &str, diff: Option<&DiffInfo>) -> ConfirmationDecision;

    /// Presents a recoverable error and returns the user's choice. Callers
    /// must not invoke this for non-recoverable ([`KestrelError::is_recoverable`]
    /// false) errors; those always abort.
    fn on_error(&self, error: &KestrelError) -> ErrorChoice;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<AgentStatus>>,
        confirmations: AtomicUsize,
    }

    impl Ui for Recorder {
        fn on_message(&self, _message: &Message) {}
        fn on_tool_call(&self, _call: &ToolCall) {}
        fn on_tool_result(&self, _result: &ToolResult) {}
        fn on_status_change(&self, status: AgentStatus) {
            self.statuses.lock().unwrap().push(status);
        }
        fn on_undo_entry(&self, _entry: &UndoEntry) {}
        fn on_confirmation(&self, _message: &str, _diff: Option<&DiffInfo>) -> ConfirmationDecision {
            self.confirmations.fetch_add(1, Ordering::SeqCst);
            ConfirmationDecision { confirmed: true, edited_content: None }
        }
        fn on_error(&self, error: &KestrelError) -> ErrorChoice {
            if error.is_recoverable() {
                ErrorChoice::Retry
            } else {
                ErrorChoice::Abort
            }
        }
    }

    #[test]
    fn status_transitions_are_recorded_in_order() {
        let recorder = Recorder::default();
        recorder.on_status_change(AgentStatus::Thinking);
        recorder.on_status_change(AgentStatus::ToolCall);
        recorder.on_status_change(AgentStatus::Ready);
        let statuses = recorder.statuses.lock().unwrap();
        assert_eq!(*statuses, vec![AgentStatus::Thinking, AgentStatus::ToolCall, AgentStatus::Ready]);
    }

    #[test]
    fn non_recoverable_error_routes_to_abort() {
        let recorder = Recorder::default();
        let choice = recorder.on_error(&KestrelError::storage("backend down"));
        assert_eq!(choice, ErrorChoice::Abort);
    }

    #[test]
    fn confirmation_is_counted() {
        let recorder = Recorder::default();
        let decision = recorder.on_confirmation("apply edit?", None);
        assert!(decision.confirmed);
        assert_eq!(recorder.confirmations.load(Ordering::SeqCst), 1);
    }
}
