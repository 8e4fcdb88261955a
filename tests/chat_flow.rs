//! End-to-end chat flows through the public session surface.
//!
//! Run with:
//!   cargo test --test chat_flow
//!
//! These tests never reach a live backend: they drive the offline demo
//! responder, or a live client pointed at a closed local port to force the
//! degradation path.

use foundry_chat::config::Config;
use foundry_chat::llm::Role;
use foundry_chat::session::{ChatSession, Liveness};

// ── helpers ──────────────────────────────────────────────────────────────────

fn demo_session() -> ChatSession {
    ChatSession::new(&Config::test_default(), true)
}

fn unreachable_live_session() -> ChatSession {
    let mut cfg = Config::test_default();
    cfg.openai.endpoint = "http://127.0.0.1:9".into();
    cfg.openai.api_key = Some("test-key".into());
    ChatSession::new(&cfg, false)
}

// ── demo end-to-end ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn hello_turn_resolves_with_greeting_and_usage() {
    let mut session = demo_session();
    assert_eq!(session.message_count(), 0);

    let result = session.send("hello").await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.model, "demo-model");
    assert!(result.content.contains("Hello! I'm your demo AI assistant."));

    // usage total = request chars + raw reply chars
    let raw_reply =
        "Hello! I'm your demo AI assistant. Deploy a model in Azure AI Foundry to unlock real AI conversations!";
    let expected = ("hello".chars().count() + raw_reply.chars().count()) as u64;
    assert_eq!(result.usage.total_tokens, expected);
    assert_eq!(result.usage.prompt_tokens, 0);
    assert_eq!(result.usage.completion_tokens, 0);
}

#[tokio::test(start_paused = true)]
async fn turn_appends_user_then_assistant() {
    let mut session = demo_session();
    session.send("hello").await;
    session.send("deploy please").await;

    let history = session.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[2].role, Role::User);
    assert_eq!(history[3].role, Role::Assistant);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[2].content, "deploy please");
}

#[tokio::test(start_paused = true)]
async fn keyword_routing_matches_demo_topics() {
    let mut session = demo_session();

    let deploy = session.send("how do I deploy a GPT-4 instance?").await;
    assert!(deploy.content.contains("ai.azure.com"));

    // Over 50 characters and free of the routed keywords.
    let long = session
        .send("could you expand at great length on your favorite subject of all?")
        .await;
    assert!(long.content.contains("detailed messages"));
}

#[tokio::test(start_paused = true)]
async fn clear_resets_history_but_keeps_the_session_usable() {
    let mut session = demo_session();
    session.send("hello").await;
    assert_eq!(session.message_count(), 2);

    session.clear();
    assert_eq!(session.message_count(), 0);

    let result = session.send("hello").await;
    assert!(result.success);
    assert_eq!(session.message_count(), 2);
}

// ── degradation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_failure_falls_back_to_demo_within_the_turn() {
    let mut session = unreachable_live_session();
    assert_eq!(session.liveness(), Liveness::Live);

    let result = session.send("hello").await;

    assert!(result.success, "demo retry should resolve the turn");
    assert!(result.content.contains("DEMO MODE"));
    assert_eq!(session.liveness(), Liveness::Degraded);
}

#[tokio::test]
async fn degraded_session_stays_on_demo_for_subsequent_turns() {
    let mut session = unreachable_live_session();
    session.send("first").await;
    assert!(session.is_degraded());

    let second = session.send("test").await;
    assert!(second.success);
    assert!(second.content.contains("Test successful"));
    assert_eq!(session.client_label(), "demo");
}
