//! Completion client abstraction.
//!
//! [`CompletionClient`] is an enum over concrete provider implementations —
//! enum dispatch keeps the call path free of trait objects and the
//! `async-trait` dependency. Providers are shared immutable capabilities;
//! clone them freely.
//!
//! Every provider resolves to a [`CompletionResult`]: failures are captured
//! and converted at this boundary, never raised to the caller.

pub mod providers;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use self::providers::{azure::AzureProvider, demo::DemoProvider};

// ── Messages ──────────────────────────────────────────────────────────────────

/// Chat participant role. Serialized lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn. Role is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Token accounting reported by the backend. Missing counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Uniform outcome of one completion request.
///
/// Invariant: `success == false` implies `error` is set and `content` holds
/// a user-facing apology embedding the error text.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub content: String,
    pub model: String,
    pub usage: Usage,
    pub success: bool,
    pub error: Option<String>,
}

impl CompletionResult {
    pub(crate) fn replied(content: String, model: String, usage: Usage) -> Self {
        Self { content, model, usage, success: true, error: None }
    }

    pub(crate) fn failed(err: &ServiceError) -> Self {
        Self {
            content: format!("I apologize, but I encountered an error: {err}"),
            model: String::new(),
            usage: Usage::default(),
            success: false,
            error: Some(err.to_string()),
        }
    }
}

// ── Client enum ───────────────────────────────────────────────────────────────

/// All available completion backends.
///
/// Adding a backend = new module under `providers/` + new variant + new
/// `complete` arm.
#[derive(Debug, Clone)]
pub enum CompletionClient {
    Azure(AzureProvider),
    Demo(DemoProvider),
}

impl CompletionClient {
    /// Resolve one chat turn. `message` is the (possibly context-enhanced)
    /// user text; `history` is the stored conversation, bounded by each
    /// provider at submission time.
    pub async fn complete(&self, message: &str, history: &[Message]) -> CompletionResult {
        match self {
            CompletionClient::Azure(p) => p.complete(message, history).await,
            CompletionClient::Demo(p) => p.complete(message).await,
        }
    }

    /// Short label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            CompletionClient::Azure(_) => "azure-openai",
            CompletionClient::Demo(_) => "demo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let m = Message::user("hi");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
        assert_eq!(
            serde_json::to_value(Message::system("s")).unwrap()["role"],
            "system"
        );
        assert_eq!(
            serde_json::to_value(Message::assistant("a")).unwrap()["role"],
            "assistant"
        );
    }

    #[test]
    fn failed_result_embeds_error_text() {
        let r = CompletionResult::failed(&ServiceError::RateLimit);
        assert!(!r.success);
        assert!(r.content.starts_with("I apologize, but I encountered an error:"));
        assert!(r.content.contains("Rate limit exceeded"));
        assert_eq!(r.error.as_deref(), Some("Rate limit exceeded. Please wait and try again."));
        assert_eq!(r.usage, Usage::default());
    }
}
