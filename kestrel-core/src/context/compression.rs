//! Summary-method compression: replaces the earliest messages of a
//! session's history with one system message summarizing them, keeping the
//! last 5 verbatim.

use crate::model::message::{Message, Role};
use crate::ports::model_transport::ModelTransport;

pub const SUMMARY_TAG: &str = "[compacted summary]";
const KEEP_LAST: usize = 5;
const MIN_HISTORY_LEN: usize = 10;
const TRUNCATE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum CompressionOutcome {
    NotCompressed,
    Compressed { tokens_saved: i64 },
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::Tool => "Tool",
        Role::System => "System",
    }
}

fn format_for_summary(messages: &[Message]) -> String {
    let mut lines = Vec::new();
    for message in messages {
        if message.role == Role::Tool {
            continue;
        }
        let mut content = message.content.clone();
        if content.chars().count() > TRUNCATE_CHARS {
            content = content.chars().take(TRUNCATE_CHARS).collect();
        }
        lines.push(format!("{}: {}", role_label(message.role), content));
    }
    lines.join("\n")
}

/// Attempts to compress `history` in place. Returns `NotCompressed` when
/// history is too short to be worth summarizing; callers are expected to
/// have already checked `needs_compression()` before calling this.
pub async fn compress(
    history: &mut Vec<Message>,
    transport: &dyn ModelTransport,
    now: u64,
) -> Result<CompressionOutcome, crate::errors::KestrelError> {
    if history.len() < MIN_HISTORY_LEN {
        return Ok(CompressionOutcome::NotCompressed);
    }

    let split_at = history.len() - KEEP_LAST;
    let (to_compress, to_keep) = history.split_at(split_at);
    let to_keep = to_keep.to_vec();

    let formatted = format_for_summary(to_compress);
    let compressed_tokens: u64 = to_compress.iter().map(|m| transport.count_tokens(&m.content)).sum();

    let instruction = format!(
        "Summarize the following conversation history concisely, preserving any \
         decisions, file paths, and open threads a continuing agent would need:\n\n{formatted}"
    );
    let prompt = vec![Message::user(instruction, now)];
    let response = transport.chat(&prompt).await?;

    let summary_tokens = transport.count_tokens(&response.content);
    let summary_message = Message::system(format!("{SUMMARY_TAG} {}", response.content), now);

    history.clear();
    history.push(summary_message);
    history.extend(to_keep);

    let tokens_saved = compressed_tokens as i64 - summary_tokens as i64;
    Ok(CompressionOutcome::Compressed { tokens_saved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_transport::{ChatResponse, StopReason};
    use async_trait::async_trait;

    struct StubTransport;

    #[async_trait]
    impl ModelTransport for StubTransport {
        async fn chat(&self, _messages: &[Message]) -> crate::errors::KestrelResult<ChatResponse> {
            Ok(ChatResponse {
                content: "short summary".to_string(),
                tool_calls: None,
                tokens: 3,
                time_ms: 1,
                truncated: false,
                stop_reason: StopReason::End,
            })
        }
        fn is_available(&self) -> bool {
            true
        }
        fn get_model_name(&self) -> String {
            "stub".to_string()
        }
        fn get_context_window_size(&self) -> u64 {
            8192
        }
        fn abort(&self) {}
    }

    fn seed_history(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                if i % 3 == 0 {
                    Message::tool_aggregate(i as u64, vec![])
                } else {
                    Message::user(format!("message {i}"), i as u64)
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn short_history_is_not_compressed() {
        let mut history = seed_history(5);
        let outcome = compress(&mut history, &StubTransport, 100).await.unwrap();
        assert_eq!(outcome, CompressionOutcome::NotCompressed);
        assert_eq!(history.len(), 5);
    }

    #[tokio::test]
    async fn compression_preserves_last_five_and_prepends_summary() {
        let mut history = seed_history(15);
        let last_five_before: Vec<Message> = history[history.len() - KEEP_LAST..].to_vec();

        let outcome = compress(&mut history, &StubTransport, 100).await.unwrap();
        assert!(matches!(outcome, CompressionOutcome::Compressed { .. }));
        assert_eq!(history.len(), KEEP_LAST + 1);
        assert_eq!(history[0].role, Role::System);
        assert!(history[0].content.starts_with(SUMMARY_TAG));
        assert_eq!(&history[1..], &last_five_before[..]);
    }

    #[tokio::test]
    async fn tool_messages_are_skipped_in_formatted_summary_input() {
        let history = seed_history(4);
        let formatted = format_for_summary(&history);
        assert!(!formatted.contains("Tool:"));
    }
}
