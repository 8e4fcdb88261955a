//! Content and metadata extraction from heterogeneous search hits.
//!
//! Search indexes carry arbitrary schemas, so hits arrive as raw JSON maps.
//! Extraction is driven by the ordered rule tables below — adapting to a new
//! index schema means editing the tables, not the probing logic.

use serde_json::{Map, Value};

/// Content candidates, probed in priority order; first non-empty wins.
const CONTENT_FIELDS: &[&str] = &["content", "text", "body", "description", "summary"];

/// Metadata candidates copied through verbatim when present.
const METADATA_FIELDS: &[&str] = &["title", "source", "url", "filename", "category", "tags", "date"];

/// Chunked-index shape: `chunk` holds the body, `title` an optional heading.
const CHUNK_FIELD: &str = "chunk";
const TITLE_FIELD: &str = "title";

/// Backend-internal keys (`@search.score`, `@search.rerankerScore`, …) are
/// excluded from the concatenation fallback.
const RESERVED_PREFIX: char = '@';

pub(crate) const SCORE_FIELD: &str = "@search.score";
pub(crate) const SCORE_METADATA_KEY: &str = "search_score";

pub(crate) const NO_CONTENT: &str = "No content available";

const PART_SEPARATOR: &str = " | ";

/// Extract display content from one hit.
///
/// Rule order: content-field table → `chunk` (with `Title:` prefix) →
/// concatenated string fields → the no-content sentinel. The result is never
/// empty.
pub fn content(hit: &Map<String, Value>) -> String {
    for field in CONTENT_FIELDS {
        if let Some(text) = non_empty_text(hit.get(*field)) {
            return text;
        }
    }

    if let Some(chunk) = non_empty_text(hit.get(CHUNK_FIELD)) {
        let mut parts = Vec::with_capacity(2);
        if let Some(title) = non_empty_text(hit.get(TITLE_FIELD)) {
            parts.push(format!("Title: {title}"));
        }
        parts.push(chunk);
        return parts.join(PART_SEPARATOR);
    }

    let leftovers: Vec<String> = hit
        .iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .filter_map(|(key, value)| {
            value
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| format!("{key}: {s}"))
        })
        .collect();

    if leftovers.is_empty() {
        NO_CONTENT.to_string()
    } else {
        leftovers.join(PART_SEPARATOR)
    }
}

/// Extract the common metadata fields plus the backend relevance score.
pub fn metadata(hit: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for field in METADATA_FIELDS {
        if let Some(value) = hit.get(*field).filter(|v| is_present(v)) {
            out.insert((*field).to_string(), value.clone());
        }
    }
    if let Some(score) = hit.get(SCORE_FIELD) {
        out.insert(SCORE_METADATA_KEY.to_string(), score.clone());
    }
    out
}

/// A value counts as text when it is a non-empty string or a number; numbers
/// are stringified.
fn non_empty_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Empty strings, empty containers, `false`, and `null` all count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
