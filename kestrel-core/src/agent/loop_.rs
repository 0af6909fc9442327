//! The Agent Loop: the single state machine driving one turn of
//! conversation — model call, response parsing, sequential tool execution,
//! confirmation/undo wiring, and compression.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::agent::confirmation::build_confirmation_handler;
use crate::agent::project_summary::build_project_summary;
use crate::context::{compress, CompressionOutcome, ContextManager};
use crate::errors::{ErrorChoice, KestrelError, KestrelResult};
use crate::model::message::{Message, MessageStats, Role, ToolCall};
use crate::model::session::Session;
use crate::parser;
use crate::path_guard::PathGuard;
use crate::ports::model_transport::ModelTransport;
use crate::ports::ui::{AgentStatus, Ui};
use crate::storage::StoragePort;
use crate::tools::result::ToolExecResult;
use crate::tools::storage_helpers::save_session;
use crate::tools::traits::ToolContext;
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = "You are a local coding agent. Use the available tools to inspect and \
modify the project; ask for confirmation before any destructive change.";

const TOOL_USE_REMINDER: &str = "Reminder: respond with a tool call if one is needed to make progress, \
or with a final answer if the task is complete.";

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
pub struct AgentConfig {
    pub max_tool_calls: usize,
    pub auto_apply: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_tool_calls: 20, auto_apply: false }
    }
}

pub struct AgentLoop {
    pub session: Session,
    registry: Arc<ToolRegistry>,
    storage: Arc<dyn StoragePort>,
    transport: Arc<dyn ModelTransport>,
    ui: Arc<dyn Ui>,
    path_guard: PathGuard,
    context: ContextManager,
    cancelled: Arc<AtomicBool>,
    config: AgentConfig,
    tool_call_counter: usize,
}

impl AgentLoop {
    pub fn new(
        session: Session,
        registry: Arc<ToolRegistry>,
        storage: Arc<dyn StoragePort>,
        transport: Arc<dyn ModelTransport>,
        ui: Arc<dyn Ui>,
        path_guard: PathGuard,
        config: AgentConfig,
    ) -> Self {
        let window_size = transport.get_context_window_size();
        let mut context = ContextManager::new(window_size);
        context.sync_from_session(&session);
        Self {
            session,
            registry,
            storage,
            transport,
            ui,
            path_guard,
            context,
            cancelled: Arc::new(AtomicBool::new(false)),
            config,
            tool_call_counter: 0,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.transport.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn set_status(&self, status: AgentStatus) {
        self.ui.on_status_change(status);
    }

    async fn persist(&self) -> KestrelResult<()> {
        save_session(self.storage.as_ref(), &self.session).await;
        Ok(())
    }

    async fn build_messages(&self) -> Vec<Message> {
        let mut messages = vec![Message::system(SYSTEM_PROMPT, now_secs())];
        if let Some(summary) = build_project_summary(self.storage.as_ref()).await {
            messages.push(Message::system(summary, now_secs()));
        }
        messages.extend(self.session.history.iter().cloned());
        if matches!(messages.last().map(|m| m.role), Some(Role::User)) {
            messages.push(Message::system(TOOL_USE_REMINDER, now_secs()));
        }
        messages
    }

    /// Step 1: append the user message (if non-empty), record it, persist.
    pub async fn submit(&mut self, user_input: &str) -> KestrelResult<()> {
        if !user_input.is_empty() {
            self.session.push_message(Message::user(user_input, now_secs()));
            self.session.record_input(user_input);
        }
        self.tool_call_counter = 0;
        self.persist().await
    }

    /// Runs the loop body (step 2) to completion: either a final assistant
    /// message, a tool-call-cap cutoff, or a fatal transport error.
    pub async fn run(&mut self) -> KestrelResult<()> {
        loop {
            if self.is_cancelled() {
                return Ok(());
            }
            self.set_status(AgentStatus::Thinking);
            let messages = self.build_messages().await;

            let response = match self.transport.chat(&messages).await {
                Ok(response) => response,
                Err(err) => match self.handle_transport_error(&err) {
                    ErrorChoice::Retry => continue,
                    ErrorChoice::Skip | ErrorChoice::Abort => {
                        self.session.push_message(Message::system(format!("error: {}", err.message()), now_secs()));
                        self.set_status(AgentStatus::Error);
                        self.persist().await?;
                        return Err(err);
                    }
                },
            };

            if self.is_cancelled() {
                return Ok(());
            }

            let parsed = parser::parse(&response.content);

            if parsed.tool_calls.is_empty() {
                let message = Message::assistant(parsed.text, now_secs()).with_stats(MessageStats {
                    tokens: response.tokens,
                    time_ms: response.time_ms,
                    tool_call_count: 0,
                });
                self.session.push_message(message.clone());
                self.ui.on_message(&message);
                self.context.add_tokens(response.tokens as i64);
                self.session.stats.total_tokens += response.tokens;
                self.session.stats.total_time_ms += response.time_ms;
                self.maybe_compress().await?;
                self.context.update_session(&mut self.session);
                self.persist().await?;
                self.set_status(AgentStatus::Ready);
                return Ok(());
            }

            self.tool_call_counter += parsed.tool_calls.len();
            if self.tool_call_counter > self.config.max_tool_calls {
                let msg = format!("Maximum tool calls ({}) exceeded", self.config.max_tool_calls);
                self.session.push_message(Message::system(msg, now_secs()));
                self.set_status(AgentStatus::Ready);
                self.persist().await?;
                return Ok(());
            }

            let assistant_message =
                Message::assistant_with_calls(parsed.text, now_secs(), parsed.tool_calls.clone());
            self.session.push_message(assistant_message.clone());
            self.ui.on_message(&assistant_message);

            self.set_status(AgentStatus::ToolCall);
            let mut results = Vec::with_capacity(parsed.tool_calls.len());
            for call in &parsed.tool_calls {
                if self.is_cancelled() {
                    return Ok(());
                }
                self.ui.on_tool_call(call);
                let started = Instant::now();
                let exec_result = self.execute_tool_call(call).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let success = exec_result.success;
                let model_result = exec_result.into_model_result(call.id.clone(), elapsed_ms);
                self.ui.on_tool_result(&model_result);
                self.session.stats.tool_calls += 1;
                let is_edit_tool = matches!(call.name.as_str(), "edit_lines" | "create_file" | "delete_file");
                if success && is_edit_tool {
                    self.session.stats.edits_applied += 1;
                }
                results.push(model_result);
            }

            let tool_message = Message::tool_aggregate(now_secs(), results);
            self.session.push_message(tool_message.clone());
            self.ui.on_message(&tool_message);

            self.context.add_tokens(response.tokens as i64);
            self.session.stats.total_tokens += response.tokens;
            self.session.stats.total_time_ms += response.time_ms;
            self.maybe_compress().await?;
            self.context.update_session(&mut self.session);
            self.persist().await?;
        }
    }

    fn handle_transport_error(&self, err: &KestrelError) -> ErrorChoice {
        if !err.is_recoverable() {
            return ErrorChoice::Abort;
        }
        self.ui.on_error(err)
    }

    async fn execute_tool_call(&mut self, call: &ToolCall) -> ToolExecResult {
        let Some(tool) = self.registry.get(call.name.as_str()) else {
            return ToolExecResult::error(call.name.clone(), format!("unknown tool: {}", call.name));
        };
        if let Some(reason) = tool.validate_params(&call.params) {
            return ToolExecResult::error(tool.name(), reason);
        }

        let sink = Arc::new(Mutex::new(None));
        let ctx = ToolContext {
            project_root: self.path_guard.clone(),
            storage: Arc::clone(&self.storage),
            request_confirmation: build_confirmation_handler(
                self.config.auto_apply,
                Arc::clone(&self.ui),
                tool.name(),
                call.id.clone(),
                now_secs(),
                Arc::clone(&sink),
            ),
            on_progress: Box::new(|_msg| {}),
        };

        let result = tool.execute(call.params.clone(), &ctx).await;

        let entry = sink.lock().expect("undo sink poisoned").take();
        if let Some(entry) = entry {
            self.ui.on_undo_entry(&entry);
            self.session.push_undo(entry);
        }

        result
    }

    async fn maybe_compress(&mut self) -> KestrelResult<()> {
        if !self.context.needs_compression() {
            return Ok(());
        }
        let outcome = compress(&mut self.session.history, self.transport.as_ref(), now_secs()).await?;
        if let CompressionOutcome::Compressed { tokens_saved } = outcome {
            self.context.add_tokens(-tokens_saved);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::undo::DiffInfo;
    use crate::ports::model_transport::StopReason;
    use crate::ports::ui::ConfirmationDecision;
    use crate::storage::InMemoryStorage;
    use crate::tools::build_registry;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    struct NoopUi {
        statuses: Mutex<Vec<AgentStatus>>,
    }

    impl NoopUi {
        fn new() -> Self {
            Self { statuses: Mutex::new(Vec::new()) }
        }
    }

    impl Ui for NoopUi {
        fn on_message(&self, _message: &Message) {}
        fn on_tool_call(&self, _call: &ToolCall) {}
        fn on_tool_result(&self, _result: &crate::model::message::ToolResult) {}
        fn on_status_change(&self, status: AgentStatus) {
            self.statuses.lock().unwrap().push(status);
        }
        fn on_undo_entry(&self, _entry: &crate::model::undo::UndoEntry) {}
        fn on_confirmation(&self, _message: &str, _diff: Option<&DiffInfo>) -> ConfirmationDecision {
            ConfirmationDecision { confirmed: true, edited_content: None }
        }
        fn on_error(&self, _error: &KestrelError) -> ErrorChoice {
            ErrorChoice::Abort
        }
    }

    /// Always returns the same single `get_lines` tool call, forever.
    struct RepeatingToolCallTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelTransport for RepeatingToolCallTransport {
        async fn chat(&self, _messages: &[Message]) -> KestrelResult<crate::ports::model_transport::ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(crate::ports::model_transport::ChatResponse {
                content: r#"<tool_call name="get_lines"><param name="path">a.ts</param></tool_call>"#.to_string(),
                tool_calls: None,
                tokens: 5,
                time_ms: 1,
                truncated: false,
                stop_reason: StopReason::ToolUse,
            })
        }
        fn is_available(&self) -> bool {
            true
        }
        fn get_model_name(&self) -> String {
            "repeat".to_string()
        }
        fn get_context_window_size(&self) -> u64 {
            8192
        }
        fn abort(&self) {}
    }

    struct PlainTextTransport;

    #[async_trait]
    impl ModelTransport for PlainTextTransport {
        async fn chat(&self, _messages: &[Message]) -> KestrelResult<crate::ports::model_transport::ChatResponse> {
            Ok(crate::ports::model_transport::ChatResponse {
                content: "all done, no tools needed".to_string(),
                tool_calls: None,
                tokens: 5,
                time_ms: 1,
                truncated: false,
                stop_reason: StopReason::End,
            })
        }
        fn is_available(&self) -> bool {
            true
        }
        fn get_model_name(&self) -> String {
            "plain".to_string()
        }
        fn get_context_window_size(&self) -> u64 {
            8192
        }
        fn abort(&self) {}
    }

    #[tokio::test]
    async fn tool_call_cap_stops_after_exactly_max_tool_calls() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.ts"), "one\ntwo\n").unwrap();

        let session = Session::new("s1", "proj", 0);
        let registry = Arc::new(build_registry());
        let storage: Arc<dyn StoragePort> = Arc::new(InMemoryStorage::new());
        let transport: Arc<dyn ModelTransport> = Arc::new(RepeatingToolCallTransport { calls: AtomicUsize::new(0) });
        let ui: Arc<dyn Ui> = Arc::new(NoopUi::new());
        let path_guard = PathGuard::new(dir.path());
        let config = AgentConfig { max_tool_calls: 3, auto_apply: true };

        let mut agent = AgentLoop::new(session, registry, storage, transport, ui, path_guard, config);
        agent.submit("read a.ts").await.unwrap();
        agent.run().await.unwrap();

        let tool_aggregate_count = agent.session.history.iter().filter(|m| m.role == Role::Tool).count();
        assert_eq!(tool_aggregate_count, 3);

        let last = agent.session.history.last().unwrap();
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("Maximum tool calls (3) exceeded"));
    }

    #[tokio::test]
    async fn no_tool_calls_returns_final_assistant_message() {
        let dir = tempdir().expect("tempdir");
        let session = Session::new("s1", "proj", 0);
        let registry = Arc::new(build_registry());
        let storage: Arc<dyn StoragePort> = Arc::new(InMemoryStorage::new());
        let transport: Arc<dyn ModelTransport> = Arc::new(PlainTextTransport);
        let ui: Arc<dyn Ui> = Arc::new(NoopUi::new());
        let path_guard = PathGuard::new(dir.path());

        let mut agent = AgentLoop::new(session, registry, storage, transport, ui, path_guard, AgentConfig::default());
        agent.submit("hello").await.unwrap();
        agent.run().await.unwrap();

        let last = agent.session.history.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "all done, no tools needed");
    }
}
