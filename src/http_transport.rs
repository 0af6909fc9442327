//! A concrete [`ModelTransport`] over an OpenAI-compatible chat
//! completions endpoint, the shape most local inference servers (Ollama,
//! llama.cpp's server, LM Studio) expose. The core depends only on the
//! trait; this is a concrete transport left to the consuming binary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use kestrel_core::errors::{KestrelError, KestrelResult};
use kestrel_core::model::message::{Message, Role};
use kestrel_core::ports::model_transport::{ChatResponse, ModelTransport, StopReason};
use serde::{Deserialize, Serialize};

pub struct HttpModelTransport {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
    context_window_size: u64,
    aborted: AtomicBool,
}

impl HttpModelTransport {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>, context_window_size: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model_name: model_name.into(),
            context_window_size,
            aborted: AtomicBool::new(false),
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
        Role::System => "system",
    }
}

#[async_trait]
impl ModelTransport for HttpModelTransport {
    async fn chat(&self, messages: &[Message]) -> KestrelResult<ChatResponse> {
        if self.aborted.load(Ordering::SeqCst) {
            return Err(KestrelError::llm("aborted"));
        }

        let wire: Vec<WireMessage> = messages
            .iter()
            .map(|m| WireMessage { role: role_str(m.role), content: &m.content })
            .collect();
        let request = ChatRequest { model: &self.model_name, messages: wire, stream: false };

        let started = Instant::now();
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| KestrelError::llm(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KestrelError::llm(format!("model server returned {status}: {body}")));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| KestrelError::llm(format!("failed to parse model response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KestrelError::llm("model returned no choices"))?;

        let content = choice.message.content;
        let tokens = completion
            .usage
            .map(|u| u.total_tokens)
            .unwrap_or_else(|| self.count_tokens(&content));
        let stop_reason = match choice.finish_reason.as_deref() {
            Some("length") => StopReason::Length,
            _ if content.contains("<tool_call") => StopReason::ToolUse,
            _ => StopReason::End,
        };

        Ok(ChatResponse {
            content,
            tool_calls: None,
            tokens,
            time_ms: started.elapsed().as_millis() as u64,
            truncated: matches!(stop_reason, StopReason::Length),
            stop_reason,
        })
    }

    fn is_available(&self) -> bool {
        !self.aborted.load(Ordering::SeqCst)
    }

    fn get_model_name(&self) -> String {
        self.model_name.clone()
    }

    fn get_context_window_size(&self) -> u64 {
        self.context_window_size
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    async fn list_models(&self) -> KestrelResult<Vec<String>> {
        #[derive(Deserialize)]
        struct ModelEntry {
            id: String,
        }
        #[derive(Deserialize)]
        struct ModelList {
            data: Vec<ModelEntry>,
        }

        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KestrelError::llm(e.to_string()))?;
        let list: ModelList = response.json().await.map_err(|e| KestrelError::llm(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn has_model(&self, name: &str) -> KestrelResult<bool> {
        Ok(self.list_models().await?.iter().any(|m| m == name))
    }
}
