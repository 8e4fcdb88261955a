//! Azure OpenAI chat-completion provider.
//!
//! Exposes a single `complete(&str, &[Message]) -> CompletionResult`
//! interface matching the rest of the [`CompletionClient`](crate::llm::CompletionClient)
//! abstraction. All wire types are private to this module — callers never
//! see them. Retrieval enhancement belongs at the session layer; this
//! provider is one round-trip, stateless.
//!
//! Azure addresses requests to a *deployment* (URL path + `api-key` header)
//! rather than a `model` body field the way the plain OpenAI API does.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::Config;
use crate::error::ServiceError;
use crate::llm::{CompletionResult, Message, Usage};
use crate::prompt;

const API_VERSION: &str = "2024-02-01";
const EMPTY_REPLY: &str = "I apologize, but I couldn't generate a response.";

/// Live completion backend. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct AzureProvider {
    client: Client,
    url: String,
    api_key: String,
    deployment: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    history_limit: usize,
}

impl AzureProvider {
    /// Build a provider from config. Fails when the API key is absent or the
    /// HTTP client cannot be constructed — the caller decides whether that
    /// degrades to the offline stand-in.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .ok_or_else(|| ServiceError::Service("AZURE_OPENAI_API_KEY is not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Service(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            config.openai.endpoint.trim_end_matches('/'),
            config.openai.deployment,
        );

        Ok(Self {
            client,
            url,
            api_key,
            deployment: config.openai.deployment.clone(),
            model: config.openai.model.clone(),
            max_tokens: config.openai.max_tokens,
            temperature: config.openai.temperature,
            history_limit: config.history_limit,
        })
    }

    /// Resolve one chat turn against the live deployment.
    ///
    /// Never fails to the caller: every error is classified and folded into
    /// a `CompletionResult` with `success == false`.
    pub async fn complete(&self, message: &str, history: &[Message]) -> CompletionResult {
        match self.request(message, history).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "completion request failed");
                CompletionResult::failed(&e)
            }
        }
    }

    async fn request(
        &self,
        message: &str,
        history: &[Message],
    ) -> Result<CompletionResult, ServiceError> {
        let messages = prompt::build_messages(message, history, self.history_limit);
        let payload = ChatCompletionRequest {
            messages: &messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        debug!(
            deployment = %self.deployment,
            messages = messages.len(),
            content_len = message.len(),
            "sending completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full completion request payload");
        }

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_raw(&e.to_string(), e.is_timeout()))?;

        let response = self.check_status(response).await?;

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ServiceError::Service(format!("failed to parse response body: {e}")))?;

        debug!(choices = parsed.choices.len(), "received completion response");

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string());

        let usage = parsed
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let model = parsed.model.unwrap_or_else(|| self.model.clone());

        Ok(CompletionResult::replied(content, model, usage))
    }

    /// Consume a non-success response into a classified error. The raw text
    /// keeps the HTTP status so substring classification sees it.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read error body>".to_string());

        let raw = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
            format!("HTTP {status}: {}", env.error.message)
        } else {
            format!("HTTP {status}: {body}")
        };

        Err(self.classify_raw(&raw, false))
    }

    fn classify_raw(&self, raw: &str, is_timeout: bool) -> ServiceError {
        if is_timeout {
            return ServiceError::Timeout;
        }
        ServiceError::classify(raw, &self.deployment)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UsageData {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

// Error envelope used by Azure OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
