//! Confirmation flow: wires a tool's `ctx.request_confirmation` call
//! into either unconditional auto-apply or a round trip through the UI,
//! producing an [`UndoEntry`] whenever a diff is approved.

use std::sync::{Arc, Mutex};

use crate::model::undo::UndoEntry;
use crate::ports::ui::Ui;
use crate::tools::traits::{ConfirmationOutcome, ConfirmationRequest};

/// Builds the closure handed to a single tool invocation's [`ToolContext`].
/// Any undo entry it decides to create is deposited into `sink` rather than
/// pushed directly onto the session, since the closure must be `Sync` and
/// cannot hold a mutable borrow of the session across the tool's `execute`.
pub fn build_confirmation_handler(
    auto_apply: bool,
    ui: Arc<dyn Ui>,
    tool_name: &'static str,
    call_id: String,
    now: u64,
    sink: Arc<Mutex<Option<UndoEntry>>>,
) -> Box<dyn Fn(ConfirmationRequest) -> ConfirmationOutcome + Send + Sync> {
    Box::new(move |req: ConfirmationRequest| {
        let ConfirmationRequest { message, diff } = req;

        if auto_apply {
            if let Some(diff) = diff {
                let entry = UndoEntry {
                    id: format!("undo_{call_id}"),
                    timestamp: now,
                    file_path: diff.file_path.clone(),
                    previous_lines: diff.old_lines.clone(),
                    new_lines: diff.new_lines.clone(),
                    description: format!("{tool_name}: {}", diff.file_path),
                    tool_call_id: call_id.clone(),
                };
                *sink.lock().expect("undo sink poisoned") = Some(entry);
            }
            return ConfirmationOutcome { confirmed: true, edited_content: None };
        }

        let decision = ui.on_confirmation(&message, diff.as_ref());
        if decision.confirmed {
            if let Some(diff) = &diff {
                let new_lines = match &decision.edited_content {
                    Some(edited) => edited.split('\n').map(str::to_string).collect(),
                    None => diff.new_lines.clone(),
                };
                let entry = UndoEntry {
                    id: format!("undo_{call_id}"),
                    timestamp: now,
                    file_path: diff.file_path.clone(),
                    previous_lines: diff.old_lines.clone(),
                    new_lines,
                    description: format!("{tool_name}: {}", diff.file_path),
                    tool_call_id: call_id.clone(),
                };
                *sink.lock().expect("undo sink poisoned") = Some(entry);
            }
        }

        ConfirmationOutcome { confirmed: decision.confirmed, edited_content: decision.edited_content }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::undo::DiffInfo;
    use crate::ports::ui::{AgentStatus, ConfirmationDecision};
    use crate::errors::{ErrorChoice, KestrelError};
    use crate::model::message::{Message, ToolCall, ToolResult};

    struct AlwaysConfirm;
    impl Ui for AlwaysConfirm {
        fn on_message(&self, _message: &Message) {}
        fn on_tool_call(&self, _call: &ToolCall) {}
        fn on_tool_result(&self, _result: &ToolResult) {}
        fn on_status_change(&self, _status: AgentStatus) {}
        fn on_undo_entry(&self, _entry: &UndoEntry) {}
        fn on_confirmation(&self, _message: &str, _diff: Option<&DiffInfo>) -> ConfirmationDecision {
            ConfirmationDecision { confirmed: true, edited_content: Some("hello".to_string()) }
        }
        fn on_error(&self, _error: &KestrelError) -> ErrorChoice {
            ErrorChoice::Abort
        }
    }

    fn diff() -> DiffInfo {
        DiffInfo {
            file_path: "README.md".to_string(),
            old_lines: Vec::new(),
            new_lines: vec!["hi".to_string()],
            start_line: 1,
        }
    }

    #[test]
    fn auto_apply_confirms_unconditionally_and_records_undo() {
        let sink = Arc::new(Mutex::new(None));
        let handler = build_confirmation_handler(true, Arc::new(AlwaysConfirm), "create_file", "call_1".to_string(), 0, Arc::clone(&sink));
        let outcome = handler(ConfirmationRequest { message: "create?".to_string(), diff: Some(diff()) });
        assert!(outcome.confirmed);
        let entry = sink.lock().unwrap().take().unwrap();
        assert_eq!(entry.new_lines, vec!["hi".to_string()]);
        assert!(entry.description.starts_with("create_file:"));
    }

    #[test]
    fn ui_edited_content_overrides_diff_new_lines() {
        let sink = Arc::new(Mutex::new(None));
        let handler = build_confirmation_handler(false, Arc::new(AlwaysConfirm), "create_file", "call_1".to_string(), 0, Arc::clone(&sink));
        let outcome = handler(ConfirmationRequest { message: "create?".to_string(), diff: Some(diff()) });
        assert!(outcome.confirmed);
        assert_eq!(outcome.edited_content.as_deref(), Some("hello"));
        let entry = sink.lock().unwrap().take().unwrap();
        assert_eq!(entry.new_lines, vec!["hello".to_string()]);
    }
}
