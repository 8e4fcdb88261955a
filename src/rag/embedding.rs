//! Query-embedding client for the vector search tier.
//!
//! Talks to the Azure OpenAI embeddings endpoint. Only the hybrid search
//! tier needs this; a failure here disables the vector component and is
//! never fatal to the turn.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::ServiceError;

const API_VERSION: &str = "2024-02-01";

/// Embedding deployment used for query vectors. The index side must have
/// been built with the same model for the vectors to be comparable.
const EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";

#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    url: String,
    api_key: String,
}

impl EmbeddingClient {
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
            "{}/openai/deployments/{EMBEDDING_DEPLOYMENT}/embeddings?api-version={API_VERSION}",
            config.openai.endpoint.trim_end_matches('/'),
        );

        Ok(Self { client, url, api_key })
    }

    /// Embed `text` into a fixed-length vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let payload = EmbeddingRequest { input: text };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&payload)
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
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| ServiceError::Service(format!("failed to parse embedding body: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ServiceError::Service("empty embedding in response".into()))?;

        debug!(dimensions = vector.len(), "query embedding generated");
        Ok(vector)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
