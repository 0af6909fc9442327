//! A plain stdio [`Ui`] implementation: prints agent events to the
//! terminal and reads confirmation/error decisions from stdin. The core
//! only requires the trait; this is one concrete front end, not part of
//! the core contract.

use std::io::{self, Write};

use kestrel_core::errors::{ErrorChoice, KestrelError};
use kestrel_core::model::message::{Message, Role, ToolCall, ToolResult};
use kestrel_core::model::undo::{DiffInfo, UndoEntry};
use kestrel_core::ports::ui::{AgentStatus, ConfirmationDecision, Ui};

pub struct TerminalUi;

fn prompt_line(prompt: &str) -> String {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

impl Ui for TerminalUi {
    fn on_message(&self, message: &Message) {
        match message.role {
            Role::Assistant if message.tool_calls.is_none() => {
                println!("\nassistant: {}", message.content);
            }
            Role::System => {
                println!("\n[system] {}", message.content);
            }
            _ => {}
        }
    }

    fn on_tool_call(&self, call: &ToolCall) {
        println!("  -> {}({})", call.name, serde_json::to_string(&call.params).unwrap_or_default());
    }

    fn on_tool_result(&self, result: &ToolResult) {
        if result.success {
            println!("  <- ok");
        } else {
            println!("  <- error: {}", result.error.as_deref().unwrap_or("unknown"));
        }
    }

    fn on_status_change(&self, status: AgentStatus) {
        let label = match status {
            AgentStatus::Ready => "ready",
            AgentStatus::Thinking => "thinking...",
            AgentStatus::ToolCall => "running tools...",
            AgentStatus::AwaitingConfirmation => "awaiting confirmation...",
            AgentStatus::Error => "error",
        };
        println!("[{label}]");
    }

    fn on_undo_entry(&self, entry: &UndoEntry) {
        println!("  (undo available: {})", entry.description);
    }

    fn on_confirmation(&self, message: &str, diff: Option<&DiffInfo>) -> ConfirmationDecision {
        if let Some(diff) = diff {
            println!("--- {}", diff.file_path);
            for line in &diff.old_lines {
                println!("- {line}");
            }
            for line in &diff.new_lines {
                println!("+ {line}");
            }
        }
        let answer = prompt_line(&format!("{message} [y/N/edit] "));
        match answer.to_lowercase().as_str() {
            "y" | "yes" => ConfirmationDecision { confirmed: true, edited_content: None },
            "edit" => {
                let edited = prompt_line("replacement content: ");
                ConfirmationDecision { confirmed: true, edited_content: Some(edited) }
            }
            _ => ConfirmationDecision { confirmed: false, edited_content: None },
        }
    }

    fn on_error(&self, error: &KestrelError) -> ErrorChoice {
        println!("[{}] {}", error.kind_name(), error.message());
        if let Some(suggestion) = error.suggestion() {
            println!("  suggestion: {suggestion}");
        }
        if !error.is_recoverable() {
            return ErrorChoice::Abort;
        }
        let answer = prompt_line("(r)etry / (s)kip / (a)bort: ");
        match answer.to_lowercase().as_str() {
            "r" | "retry" => ErrorChoice::Retry,
            "s" | "skip" => ErrorChoice::Skip,
            _ => ErrorChoice::Abort,
        }
    }
}
