//! Application-wide error types.
//!
//! Two layers: [`AppError`] is fatal and only produced during startup
//! (config, logger). [`ServiceError`] is the non-fatal taxonomy for the
//! remote backends; it is always caught at the client boundary and converted
//! into a user-facing reply, never propagated further up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classified failure from the completion, embedding, or search backend.
///
/// The `Display` text is the user-facing message; the completion client embeds
/// it in an apology string when a turn fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Authentication failed. Please check your API key.")]
    Auth,

    #[error("Model deployment '{0}' not found. Please verify your deployment name.")]
    NotFound(String),

    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimit,

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("{0}")]
    Service(String),
}

impl ServiceError {
    /// Classify a raw backend error string by substring.
    ///
    /// `deployment` is only used for the not-found message, which must name
    /// the deployment the operator configured.
    pub fn classify(raw: &str, deployment: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("401") || lower.contains("unauthorized") {
            Self::Auth
        } else if lower.contains("404") || lower.contains("not found") {
            Self::NotFound(deployment.to_string())
        } else if lower.contains("429") || lower.contains("rate limit") {
            Self::RateLimit
        } else if lower.contains("timeout") {
            Self::Timeout
        } else {
            Self::Service(raw.to_string())
        }
    }

    /// Convert a transport-level failure. Timeouts keep their identity;
    /// everything else is a generic service error carrying the reqwest text.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Service(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("AZURE_OPENAI_API_KEY is required".into());
        assert!(e.to_string().contains("AZURE_OPENAI_API_KEY"));
        assert!(e.to_string().starts_with("config error"));
    }

    #[test]
    fn status_401_maps_to_auth() {
        let e = ServiceError::classify("HTTP 401 Unauthorized: bad key", "gpt-4o-mini");
        assert_eq!(e, ServiceError::Auth);
        assert!(e.to_string().contains("API key"));
    }

    #[test]
    fn unauthorized_text_maps_to_auth() {
        assert_eq!(
            ServiceError::classify("request was Unauthorized", "d"),
            ServiceError::Auth
        );
    }

    #[test]
    fn status_404_names_the_deployment() {
        let e = ServiceError::classify("HTTP 404: no such path", "my-gpt4o");
        assert_eq!(e, ServiceError::NotFound("my-gpt4o".into()));
        let msg = e.to_string();
        assert!(msg.contains("deployment"));
        assert!(msg.contains("my-gpt4o"));
    }

    #[test]
    fn status_429_maps_to_rate_limit() {
        let e = ServiceError::classify("HTTP 429: too many requests", "d");
        assert_eq!(e, ServiceError::RateLimit);
    }

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e = ServiceError::classify("connection timeout after 30s", "d");
        assert_eq!(e, ServiceError::Timeout);
    }

    #[test]
    fn anything_else_is_generic() {
        let e = ServiceError::classify("HTTP 503: backend unavailable", "d");
        assert_eq!(e, ServiceError::Service("HTTP 503: backend unavailable".into()));
        assert_eq!(e.to_string(), "HTTP 503: backend unavailable");
    }

    #[test]
    fn auth_takes_precedence_over_not_found() {
        // A message mentioning both 401 and 404 is an auth failure first.
        let e = ServiceError::classify("HTTP 401: resource 404", "d");
        assert_eq!(e, ServiceError::Auth);
    }
}
