//! Conversation surface — one session's ordered history and the per-turn
//! retrieval → prompt assembly → completion pipeline.
//!
//! The completion path is an explicit two-state machine: a session is
//! [`Liveness::Live`] until the first failed live call, at which point it
//! transitions — one-way, for the rest of the session — to
//! [`Liveness::Degraded`] and the failed turn is retried once against the
//! offline responder. Sessions whose live client never initialized (or that
//! were started with `--demo`) begin Degraded.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::providers::{AzureProvider, DemoProvider};
use crate::llm::{CompletionClient, CompletionResult, Message};
use crate::prompt;
use crate::rag::RetrievalClient;

/// Completion-path state. The only transition is `Live -> Degraded`,
/// triggered by the first failed live call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Degraded,
}

pub struct ChatSession {
    client: CompletionClient,
    liveness: Liveness,
    retrieval: Option<RetrievalClient>,
    history: Vec<Message>,
}

impl ChatSession {
    /// Build a session from config.
    ///
    /// A live provider that fails to construct degrades to the demo
    /// responder instead of failing startup; `force_demo` skips the live
    /// attempt entirely.
    pub fn new(config: &Config, force_demo: bool) -> Self {
        let (client, liveness) = if force_demo {
            info!("demo mode requested — using offline responder");
            (CompletionClient::Demo(DemoProvider::new()), Liveness::Degraded)
        } else {
            match AzureProvider::new(config) {
                Ok(p) => (CompletionClient::Azure(p), Liveness::Live),
                Err(e) => {
                    warn!(error = %e, "live client initialization failed — using offline responder");
                    (CompletionClient::Demo(DemoProvider::new()), Liveness::Degraded)
                }
            }
        };

        let retrieval = match (&liveness, config.rag.enabled) {
            (Liveness::Live, true) => match RetrievalClient::new(config) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(error = %e, "retrieval client initialization failed — RAG disabled");
                    None
                }
            },
            _ => None,
        };

        Self { client, liveness, retrieval, history: Vec::new() }
    }

    /// Resolve one user turn and record both sides of it in history.
    ///
    /// Live path: retrieve → enhance → complete; a failure transitions the
    /// session to Degraded and retries this turn once against the offline
    /// responder with the original (unenhanced) text.
    pub async fn send(&mut self, text: &str) -> CompletionResult {
        let text = text.trim();

        let result = match self.liveness {
            Liveness::Live => {
                let documents = match &self.retrieval {
                    Some(retrieval) => retrieval.search(text, None).await,
                    None => Vec::new(),
                };
                if !documents.is_empty() {
                    debug!(documents = documents.len(), "enhancing message with retrieved context");
                }
                let enhanced = prompt::build_context(&documents, text);

                let first = self.client.complete(&enhanced, &self.history).await;
                if first.success {
                    first
                } else {
                    warn!(
                        error = first.error.as_deref().unwrap_or("unknown"),
                        "live completion failed — degrading to offline responder for this session"
                    );
                    self.degrade();
                    self.client.complete(text, &self.history).await
                }
            }
            Liveness::Degraded => self.client.complete(text, &self.history).await,
        };

        self.append_user(text);
        self.append_assistant(&result.content);
        result
    }

    fn degrade(&mut self) {
        self.client = CompletionClient::Demo(DemoProvider::new());
        self.liveness = Liveness::Degraded;
    }

    // ── History ──────────────────────────────────────────────────────────────

    pub fn append_user(&mut self, content: &str) {
        self.history.push(Message::user(content));
    }

    pub fn append_assistant(&mut self, content: &str) {
        self.history.push(Message::assistant(content));
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Stored history in chronological order — role and content only.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Total characters across all stored message contents.
    pub fn content_chars(&self) -> usize {
        self.history.iter().map(|m| m.content.chars().count()).sum()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_degraded(&self) -> bool {
        self.liveness == Liveness::Degraded
    }

    pub fn rag_active(&self) -> bool {
        self.retrieval.is_some()
    }

    pub fn client_label(&self) -> &'static str {
        self.client.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn demo_session() -> ChatSession {
        ChatSession::new(&Config::test_default(), true)
    }

    /// Config whose live client constructs but points at a closed port, so
    /// the first call fails fast.
    fn unreachable_live_config() -> Config {
        let mut cfg = Config::test_default();
        cfg.openai.endpoint = "http://127.0.0.1:9".into();
        cfg.openai.api_key = Some("test-key".into());
        cfg
    }

    #[test]
    fn append_round_trip_preserves_order_and_roles() {
        let mut s = demo_session();
        s.append_user("one");
        s.append_assistant("two");
        let n = s.message_count();

        s.append_user("three");
        s.append_assistant("four");

        assert_eq!(s.message_count(), n + 2);
        let h = s.history();
        assert_eq!(h[0].role, Role::User);
        assert_eq!(h[1].role, Role::Assistant);
        assert_eq!(h[2].content, "three");
        assert_eq!(h[3].content, "four");
    }

    #[test]
    fn clear_empties_history() {
        let mut s = demo_session();
        s.append_user("x");
        s.clear();
        assert_eq!(s.message_count(), 0);
    }

    #[test]
    fn forced_demo_starts_degraded() {
        let s = demo_session();
        assert!(s.is_degraded());
        assert_eq!(s.client_label(), "demo");
        assert!(!s.rag_active());
    }

    #[test]
    fn missing_credentials_start_degraded() {
        let s = ChatSession::new(&Config::test_default(), false);
        assert!(s.is_degraded());
    }

    #[test]
    fn valid_config_starts_live() {
        let s = ChatSession::new(&unreachable_live_config(), false);
        assert_eq!(s.liveness(), Liveness::Live);
        assert_eq!(s.client_label(), "azure-openai");
    }

    #[tokio::test]
    async fn failed_live_call_degrades_once_and_retries_on_demo() {
        let mut s = ChatSession::new(&unreachable_live_config(), false);
        assert_eq!(s.liveness(), Liveness::Live);

        let result = s.send("hello").await;

        // The turn resolved through the offline responder.
        assert!(result.success);
        assert!(result.content.contains("DEMO MODE"));
        assert!(s.is_degraded());

        // Both sides of the turn were recorded.
        assert_eq!(s.message_count(), 2);
        assert_eq!(s.history()[0].content, "hello");
        assert_eq!(s.history()[1].content, result.content);
    }

    #[tokio::test]
    async fn degradation_is_permanent_for_the_session() {
        let mut s = ChatSession::new(&unreachable_live_config(), false);
        s.send("first").await;
        assert!(s.is_degraded());

        let again = s.send("hello again").await;
        assert!(again.success);
        assert!(s.is_degraded());
        assert_eq!(s.client_label(), "demo");
    }

    #[tokio::test(start_paused = true)]
    async fn send_trims_input_before_recording() {
        let mut s = demo_session();
        s.send("  spaced  ").await;
        assert_eq!(s.history()[0].content, "spaced");
    }
}
