//! The Model Transport port: whatever backend turns messages into a
//! response is reached only through this trait, keeping the core backend-
//! agnostic.

use async_trait::async_trait;

use crate::errors::KestrelResult;
use crate::model::message::{Message, ToolCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    End,
    Length,
    ToolUse,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tokens: u64,
    pub time_ms: u64,
    pub truncated: bool,
    pub stop_reason: StopReason,
}

#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> KestrelResult<ChatResponse>;

    /// Token estimate; ~4 chars/token is an acceptable fallback when the
    /// backend exposes no tokenizer.
    fn count_tokens(&self, text: &str) -> u64 {
        ((text.chars().count() as f64) / 4.0).ceil() as u64
    }

    fn is_available(&self) -> bool;
    fn get_model_name(&self) -> String;
    fn get_context_window_size(&self) -> u64;
    fn abort(&self);

    async fn pull_model(&self, _name: &str) -> KestrelResult<()> {
        Err(crate::errors::KestrelError::llm("pull_model not supported by this transport"))
    }

    async fn has_model(&self, _name: &str) -> KestrelResult<bool> {
        Ok(false)
    }

    async fn list_models(&self) -> KestrelResult<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl ModelTransport for Fixed {
        async fn chat(&self, _messages: &[Message]) -> KestrelResult<ChatResponse> {
            Ok(ChatResponse {
                content: self.0.to_string(),
                tool_calls: None,
                tokens: 10,
                time_ms: 5,
                truncated: false,
                stop_reason: StopReason::End,
            })
        }
        fn is_available(&self) -> bool {
            true
        }
        fn get_model_name(&self) -> String {
            "fixed".to_string()
        }
        fn get_context_window_size(&self) -> u64 {
            8192
        }
        fn abort(&self) {}
    }

    #[test]
    fn default_token_estimate_uses_four_chars_per_token() {
        let t = Fixed("x");
        assert_eq!(t.count_tokens("abcd"), 1);
        assert_eq!(t.count_tokens("abcde"), 2);
    }

    #[tokio::test]
    async fn default_pull_model_is_unsupported() {
        let t = Fixed("x");
        assert!(t.pull_model("llama3").await.is_err());
    }
}
