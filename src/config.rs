//! Configuration loading from the process environment.
//!
//! All settings are environment variables; `main` loads an optional `.env`
//! file (dotenvy) before this runs. The resolved [`Config`] is immutable and
//! handed to each component at construction time — nothing reads the
//! environment after startup.
//!
//! Tests use [`from_lookup`] with an explicit closure instead of mutating
//! process env vars.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Which search mode the retrieval client starts from.
///
/// Unrecognized values resolve to [`SearchStrategy::Text`] — plain full-text
/// search with no fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    Hybrid,
    Semantic,
    Text,
}

impl SearchStrategy {
    fn parse(raw: &str) -> Self {
        match raw {
            "hybrid" => Self::Hybrid,
            "semantic" => Self::Semantic,
            _ => Self::Text,
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hybrid => "hybrid",
            Self::Semantic => "semantic",
            Self::Text => "text",
        };
        f.write_str(s)
    }
}

/// Azure OpenAI settings (`AZURE_OPENAI_*`, `MODEL_NAME`, sampling limits).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Resource endpoint, e.g. `https://<resource>.cognitiveservices.azure.com`.
    pub endpoint: String,
    /// API key from `AZURE_OPENAI_API_KEY` — never defaulted.
    pub api_key: Option<String>,
    /// Deployment name the requests are addressed to.
    pub deployment: String,
    /// Display/model name used when the response omits one.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Azure AI Search settings (`AZURE_SEARCH_*`, `RAG_*`).
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub index: String,
    /// Number of hits to request per query.
    pub top_k: usize,
    pub strategy: SearchStrategy,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_title: String,
    pub openai: OpenAiConfig,
    pub rag: RagConfig,
    /// History messages included per request (suffix slice at submit time).
    pub history_limit: usize,
    /// Per-request HTTP timeout, applied to every backend client.
    pub request_timeout_secs: u64,
    /// Carried through for operators; not enforced by the HTTP clients.
    pub max_retries: u32,
}

pub fn load() -> Result<Config, AppError> {
    from_lookup(|key| env::var(key).ok())
}

/// Build a config from an arbitrary key lookup.
///
/// Unset keys take their defaults; malformed numeric values are config
/// errors. Booleans follow the `"true"` (case-insensitive) convention —
/// anything else is `false`.
pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Config, AppError> {
    let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
    let flag = |key: &str, default: bool| match get(key) {
        Some(raw) => raw.to_lowercase() == "true",
        None => default,
    };

    Ok(Config {
        app_title: text("APP_TITLE", "AI Chat Assistant"),
        openai: OpenAiConfig {
            endpoint: text("AZURE_OPENAI_ENDPOINT", ""),
            api_key: get("AZURE_OPENAI_API_KEY").filter(|k| !k.is_empty()),
            deployment: text("AZURE_OPENAI_DEPLOYMENT", "gpt-4o-mini"),
            model: text("MODEL_NAME", "gpt-4o-mini"),
            max_tokens: number(&get, "MAX_TOKENS", 1000)?,
            temperature: number(&get, "TEMPERATURE", 0.7)?,
        },
        rag: RagConfig {
            enabled: flag("ENABLE_RAG", true),
            endpoint: text("AZURE_SEARCH_ENDPOINT", ""),
            api_key: get("AZURE_SEARCH_KEY").filter(|k| !k.is_empty()),
            index: text("AZURE_SEARCH_INDEX", ""),
            top_k: number(&get, "RAG_TOP_K", 5)?,
            strategy: SearchStrategy::parse(&text("RAG_SEARCH_TYPE", "hybrid")),
        },
        history_limit: number(&get, "CONVERSATION_HISTORY_LIMIT", 50)?,
        request_timeout_secs: number(&get, "REQUEST_TIMEOUT", 30)?,
        max_retries: number(&get, "MAX_RETRIES", 3)?,
    })
}

fn number<T>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {key} value '{raw}': {e}"))),
        None => Ok(default),
    }
}

impl Config {
    /// Startup validation. Missing completion credentials are fatal; when RAG
    /// is enabled the search credentials are fatal too.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.openai.endpoint.is_empty() {
            return Err(AppError::Config("AZURE_OPENAI_ENDPOINT is required".into()));
        }
        if self.openai.api_key.is_none() {
            return Err(AppError::Config("AZURE_OPENAI_API_KEY is required".into()));
        }
        if self.openai.deployment.is_empty() {
            return Err(AppError::Config("AZURE_OPENAI_DEPLOYMENT is required".into()));
        }

        if self.rag.enabled {
            if self.rag.endpoint.is_empty() {
                return Err(AppError::Config(
                    "AZURE_SEARCH_ENDPOINT is required when RAG is enabled".into(),
                ));
            }
            if self.rag.api_key.is_none() {
                return Err(AppError::Config(
                    "AZURE_SEARCH_KEY is required when RAG is enabled".into(),
                ));
            }
            if self.rag.index.is_empty() {
                return Err(AppError::Config(
                    "AZURE_SEARCH_INDEX is required when RAG is enabled".into(),
                ));
            }
        }

        Ok(())
    }
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests — no credentials, RAG off, tight timeout.
    pub fn test_default() -> Self {
        Self {
            app_title: "test".into(),
            openai: OpenAiConfig {
                endpoint: String::new(),
                api_key: None,
                deployment: "test-deployment".into(),
                model: "test-model".into(),
                max_tokens: 64,
                temperature: 0.0,
            },
            rag: RagConfig {
                enabled: false,
                endpoint: String::new(),
                api_key: None,
                index: String::new(),
                top_k: 5,
                strategy: SearchStrategy::Text,
            },
            history_limit: 50,
            request_timeout_secs: 1,
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.app_title, "AI Chat Assistant");
        assert_eq!(cfg.openai.deployment, "gpt-4o-mini");
        assert_eq!(cfg.openai.max_tokens, 1000);
        assert_eq!(cfg.rag.top_k, 5);
        assert_eq!(cfg.rag.strategy, SearchStrategy::Hybrid);
        assert!(cfg.rag.enabled);
        assert_eq!(cfg.history_limit, 50);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let cfg = config_from(&[
            ("APP_TITLE", "Support Bot"),
            ("MAX_TOKENS", "256"),
            ("TEMPERATURE", "0.2"),
            ("RAG_SEARCH_TYPE", "semantic"),
            ("ENABLE_RAG", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.app_title, "Support Bot");
        assert_eq!(cfg.openai.max_tokens, 256);
        assert!((cfg.openai.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.rag.strategy, SearchStrategy::Semantic);
        assert!(!cfg.rag.enabled);
    }

    #[test]
    fn enable_rag_is_case_insensitive_true() {
        assert!(config_from(&[("ENABLE_RAG", "True")]).unwrap().rag.enabled);
        assert!(!config_from(&[("ENABLE_RAG", "yes")]).unwrap().rag.enabled);
        assert!(!config_from(&[("ENABLE_RAG", "1")]).unwrap().rag.enabled);
    }

    #[test]
    fn unknown_search_type_resolves_to_text() {
        let cfg = config_from(&[("RAG_SEARCH_TYPE", "vector")]).unwrap();
        assert_eq!(cfg.rag.strategy, SearchStrategy::Text);
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let err = config_from(&[("MAX_TOKENS", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
        let err = config_from(&[("TEMPERATURE", "warm")]).unwrap_err();
        assert!(err.to_string().contains("TEMPERATURE"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let cfg = config_from(&[("AZURE_OPENAI_API_KEY", "")]).unwrap();
        assert!(cfg.openai.api_key.is_none());
    }

    #[test]
    fn validate_requires_completion_credentials() {
        let mut cfg = Config::test_default();
        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_OPENAI_ENDPOINT"));

        cfg.openai.endpoint = "https://example.cognitiveservices.azure.com".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_OPENAI_API_KEY"));

        cfg.openai.api_key = Some("key".into());
        cfg.openai.deployment.clear();
        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_OPENAI_DEPLOYMENT"));

        cfg.openai.deployment = "gpt-4o-mini".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_requires_search_credentials_only_when_rag_enabled() {
        let mut cfg = Config::test_default();
        cfg.openai.endpoint = "https://example.cognitiveservices.azure.com".into();
        cfg.openai.api_key = Some("key".into());
        cfg.rag.enabled = true;

        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_SEARCH_ENDPOINT"));
        cfg.rag.endpoint = "https://search.example.net".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_SEARCH_KEY"));
        cfg.rag.api_key = Some("skey".into());
        assert!(cfg.validate().unwrap_err().to_string().contains("AZURE_SEARCH_INDEX"));
        cfg.rag.index = "docs".into();
        assert!(cfg.validate().is_ok());

        cfg.rag.enabled = false;
        cfg.rag.index.clear();
        assert!(cfg.validate().is_ok());
    }
}
