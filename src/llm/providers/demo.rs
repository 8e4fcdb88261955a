//! Demo completion provider — canned replies, no network.
//!
//! Used when no live deployment is reachable (or `--demo` was passed) so the
//! chat loop can be exercised end to end without credentials. Reply choice is
//! keyword-driven with a byte-sum hash standing in for randomness, keeping
//! the responder deterministic for a given input.

use std::time::Duration;

use tracing::debug;

use crate::llm::{CompletionResult, Usage};

const DEMO_MODEL: &str = "demo-model";

/// Messages longer than this get the "detailed messages" reply.
const LONG_MESSAGE_CHARS: usize = 50;

/// Base + spread of the simulated network latency.
const LATENCY_BASE_MS: u64 = 300;
const LATENCY_SPREAD_MS: u64 = 500;

const GREETING: &str =
    "Hello! I'm your demo AI assistant. Deploy a model in Azure AI Foundry to unlock real AI conversations!";
const DEPLOY_HELP: &str =
    "To deploy a model: Go to ai.azure.com → Your Project → Deployments → Create New Deployment → Choose a model like GPT-4";
const TEST_REPLY: &str =
    "Test successful! ✅ The chat console is working perfectly. Just need that model deployment!";
const LONG_MESSAGE_REPLY: &str =
    "I can see you're writing detailed messages! Once you deploy a model, I'll be able to provide thoughtful, detailed responses to match.";

const REPLY_POOL: [&str; 5] = [
    "Hello! I'm a demo AI assistant. Your Azure AI Foundry project needs a model deployment to work with real AI responses.",
    "This is a simulated response! Once you deploy a model in Azure AI Foundry, I'll provide real AI-powered answers.",
    "Great question! I'm currently in demo mode. Deploy a model like GPT-4 in your Azure AI Foundry project to unlock my full capabilities.",
    "I understand you're testing the chat interface. Everything looks good! Just deploy a model in Azure AI Foundry to get started.",
    "This chat interface is working perfectly! The only missing piece is deploying a model in your Azure AI Foundry project.",
];

#[derive(Debug, Clone)]
pub struct DemoProvider;

impl DemoProvider {
    pub fn new() -> Self {
        Self
    }

    /// Produce a canned reply for `message`. Always succeeds; the usage
    /// total is the character count of the request plus the raw reply.
    pub async fn complete(&self, message: &str) -> CompletionResult {
        let reply = pick_reply(message);

        // Emulate network latency so the console feels like a real backend.
        let delay = LATENCY_BASE_MS + seed(message) as u64 % LATENCY_SPREAD_MS;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        debug!(reply_len = reply.len(), delay_ms = delay, "demo reply selected");

        let usage = Usage {
            total_tokens: (message.chars().count() + reply.chars().count()) as u64,
            ..Usage::default()
        };

        let content = format!(
            "🎭 **DEMO MODE**: {reply}\n\n💡 **Next Step**: Deploy a model in Azure AI Foundry to enable real AI responses!"
        );

        CompletionResult::replied(content, DEMO_MODEL.to_string(), usage)
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("hello") || lower.contains("hi") {
        GREETING
    } else if lower.contains("deploy") || lower.contains("model") {
        DEPLOY_HELP
    } else if lower.contains("test") {
        TEST_REPLY
    } else if message.chars().count() > LONG_MESSAGE_CHARS {
        LONG_MESSAGE_REPLY
    } else {
        REPLY_POOL[seed(message) % REPLY_POOL.len()]
    }
}

/// Cheap stable hash — good enough to vary pool picks and latency.
fn seed(message: &str) -> usize {
    message.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn hello_routes_to_greeting() {
        let result = DemoProvider::new().complete("hello").await;
        assert!(result.success);
        assert!(result.content.contains(GREETING));
        assert_eq!(result.model, DEMO_MODEL);
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_routes_to_walkthrough() {
        let result = DemoProvider::new().complete("how do I deploy?").await;
        assert!(result.content.contains("ai.azure.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyword_routes_to_confirmation() {
        let result = DemoProvider::new().complete("just a test").await;
        assert!(result.content.contains("Test successful"));
    }

    #[tokio::test(start_paused = true)]
    async fn long_message_routes_to_detailed_reply() {
        let message = "x".repeat(60);
        let result = DemoProvider::new().complete(&message).await;
        assert!(result.content.contains("detailed messages"));
    }

    #[tokio::test(start_paused = true)]
    async fn short_message_picks_from_pool() {
        let result = DemoProvider::new().complete("ok").await;
        let raw = REPLY_POOL[seed("ok") % REPLY_POOL.len()];
        assert!(result.content.contains(raw));
    }

    #[tokio::test(start_paused = true)]
    async fn usage_total_is_message_plus_raw_reply() {
        let result = DemoProvider::new().complete("hello").await;
        let expected = "hello".chars().count() + GREETING.chars().count();
        assert_eq!(result.usage.total_tokens, expected as u64);
        assert_eq!(result.usage.prompt_tokens, 0);
        assert_eq!(result.usage.completion_tokens, 0);
    }

    #[test]
    fn same_input_same_pick() {
        assert_eq!(pick_reply("ok"), pick_reply("ok"));
    }
}
