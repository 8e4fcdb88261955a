//! Retrieval client for Azure AI Search.
//!
//! The configured [`SearchStrategy`] expands into an ordered tier plan
//! ([`tier_plan`]); [`RetrievalClient::search`] walks the plan, attempting
//! each tier at most once and taking the first success. Every tier call
//! returns a `Result` — fallback decisions live in the walking loop, not in
//! the tiers. Total failure degrades to an empty document list; retrieval
//! never fails a chat turn.

pub mod embedding;
pub mod extract;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, warn};

use crate::config::{Config, SearchStrategy};
use crate::error::ServiceError;
use self::embedding::EmbeddingClient;

const SEARCH_API_VERSION: &str = "2024-07-01";

/// Semantic configuration name expected on the index.
const SEMANTIC_CONFIGURATION: &str = "default";

/// Index field holding document vectors for the hybrid tier.
const VECTOR_FIELD: &str = "contentVector";

/// One ranked hit, shaped for prompt assembly. Produced fresh per query and
/// never persisted. `content` is never empty — extraction substitutes a
/// sentinel when the hit has no usable text.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub content: String,
    pub score: f64,
    pub metadata: Map<String, Value>,
}

/// A single search mode the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    /// Full-text + vector + semantic rerank in one query.
    HybridWithVector,
    /// Semantic query without a vector component.
    SemanticOnly,
    /// Plain full-text search.
    PlainText,
}

/// Expand a strategy into the ordered tiers to attempt.
///
/// `has_vector` reports whether query-embedding generation succeeded; without
/// a vector the hybrid strategy starts at the semantic tier (and does not
/// repeat it further down the plan).
pub fn tier_plan(strategy: SearchStrategy, has_vector: bool) -> Vec<SearchTier> {
    match strategy {
        SearchStrategy::Hybrid if has_vector => vec![
            SearchTier::HybridWithVector,
            SearchTier::SemanticOnly,
            SearchTier::PlainText,
        ],
        SearchStrategy::Hybrid | SearchStrategy::Semantic => {
            vec![SearchTier::SemanticOnly, SearchTier::PlainText]
        }
        SearchStrategy::Text => vec![SearchTier::PlainText],
    }
}

/// Client for one search index. Shared read-only; clone freely.
#[derive(Debug, Clone)]
pub struct RetrievalClient {
    client: Client,
    url: String,
    api_key: String,
    index: String,
    strategy: SearchStrategy,
    top_k: usize,
    embedder: EmbeddingClient,
}

impl RetrievalClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let api_key = config
            .rag
            .api_key
            .clone()
            .ok_or_else(|| ServiceError::Service("AZURE_SEARCH_KEY is not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Service(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{}/indexes/{}/docs/search?api-version={SEARCH_API_VERSION}",
            config.rag.endpoint.trim_end_matches('/'),
            config.rag.index,
        );

        Ok(Self {
            client,
            url,
            api_key,
            index: config.rag.index.clone(),
            strategy: config.rag.strategy,
            top_k: config.rag.top_k,
            embedder: EmbeddingClient::new(config)?,
        })
    }

    /// Retrieve ranked documents for `query`.
    ///
    /// Never fails: each failed tier is logged and the next one attempted;
    /// when the whole plan is exhausted the result is empty. `top_k` defaults
    /// from config.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Vec<RetrievedDocument> {
        let top = top_k.unwrap_or(self.top_k);

        // The vector component is only worth computing for the hybrid
        // strategy; a failed embedding just disables that tier.
        let vector = match self.strategy {
            SearchStrategy::Hybrid => match self.embedder.embed(query).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, "query embedding failed — vector tier disabled");
                    None
                }
            },
            _ => None,
        };

        let plan = tier_plan(self.strategy, vector.is_some());
        let last = plan.len() - 1;

        for (i, tier) in plan.into_iter().enumerate() {
            match self.run_tier(tier, query, vector.as_deref(), top).await {
                Ok(documents) => {
                    info!(index = %self.index, ?tier, count = documents.len(), "retrieved documents");
                    return documents;
                }
                Err(e) if i < last => {
                    warn!(?tier, error = %e, "search tier failed — falling back");
                }
                Err(e) => {
                    error!(?tier, error = %e, "all search tiers failed — returning no documents");
                }
            }
        }

        Vec::new()
    }

    async fn run_tier(
        &self,
        tier: SearchTier,
        query: &str,
        vector: Option<&[f32]>,
        top: usize,
    ) -> Result<Vec<RetrievedDocument>, ServiceError> {
        let body = tier_body(tier, query, vector, top);
        debug!(?tier, top, "issuing search request");

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ServiceError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(ServiceError::Service(format!("HTTP {status}: {body}")));
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| ServiceError::Service(format!("failed to parse search body: {e}")))?;

        Ok(parsed.value.into_iter().map(shape_hit).collect())
    }
}

/// Request body for one tier. Hits come back in backend relevance order and
/// are passed through as-is.
fn tier_body(tier: SearchTier, query: &str, vector: Option<&[f32]>, top: usize) -> Value {
    let mut body = json!({
        "search": query,
        "top": top,
        "count": true,
    });

    if matches!(tier, SearchTier::HybridWithVector | SearchTier::SemanticOnly) {
        body["queryType"] = json!("semantic");
        body["semanticConfiguration"] = json!(SEMANTIC_CONFIGURATION);
    }

    if tier == SearchTier::HybridWithVector {
        if let Some(vector) = vector {
            body["vectorQueries"] = json!([{
                "kind": "vector",
                "vector": vector,
                "k": top,
                "fields": VECTOR_FIELD,
            }]);
        }
    }

    body
}

fn shape_hit(hit: Map<String, Value>) -> RetrievedDocument {
    let score = hit
        .get(extract::SCORE_FIELD)
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    RetrievedDocument {
        content: extract::content(&hit),
        score,
        metadata: extract::metadata(&hit),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}
