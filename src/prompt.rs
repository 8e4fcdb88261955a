//! Prompt assembly — pure functions from retrieved documents and history to
//! the exact message sequence sent to the model.

use serde_json::Value;

use crate::llm::Message;
use crate::rag::RetrievedDocument;

/// Fixed system message leading every request.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide clear, accurate, and helpful responses.";

/// Per-document content cap inside the context block.
const CONTEXT_CHAR_LIMIT: usize = 2000;

/// Wrap `user_query` with retrieved context.
///
/// No documents means no wrapping — the query passes through untouched and
/// the turn degrades to plain chat. Otherwise every document contributes one
/// labelled block, in relevance order, capped at [`CONTEXT_CHAR_LIMIT`]
/// characters each.
pub fn build_context(documents: &[RetrievedDocument], user_query: &str) -> String {
    if documents.is_empty() {
        return user_query.to_string();
    }

    let blocks: Vec<String> = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let n = i + 1;
            let content: String = doc.content.chars().take(CONTEXT_CHAR_LIMIT).collect();
            let source = doc
                .metadata
                .get("source")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Document {n}"));
            format!("[Source {n}: {source}]\n{content}")
        })
        .collect();

    let context = blocks.join("\n\n");

    format!(
        "You are a helpful AI assistant. Use the following context information to answer the user's question. If the context doesn't contain relevant information, say so and provide a general response.

CONTEXT:
{context}

USER QUESTION: {user_query}

Instructions:
- Base your answer primarily on the provided context
- If you reference specific information, mention the source
- If the context is insufficient, acknowledge this and provide what help you can
- Be conversational and helpful"
    )
}

/// Assemble the outgoing sequence: one system message, the trailing
/// `history_limit` history messages, one user message holding `text`.
///
/// Older history beyond the limit is dropped from the request only — stored
/// history is not touched.
pub fn build_messages(text: &str, history: &[Message], history_limit: usize) -> Vec<Message> {
    let start = history.len().saturating_sub(history_limit);

    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(Message::system(SYSTEM_PROMPT));
    messages.extend(history[start..].iter().cloned());
    messages.push(Message::user(text));
    messages
}
