//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup. Log output goes to stderr so the chat
//! transcript on stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber.
///
/// `level` accepts standard filter strings (`"error"` … `"trace"`). With
/// `prefer_level` set (the CLI passed an explicit verbosity), `level` wins
/// and `RUST_LOG` is only a fallback; otherwise `RUST_LOG` wins.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let from_level = || EnvFilter::try_new(level).map_err(|e| e.to_string());
    let from_env = || EnvFilter::try_from_default_env().map_err(|e| e.to_string());

    let filter = if prefer_level {
        from_level().or_else(|_| from_env())
    } else {
        from_env().or_else(|_| from_level())
    }
    .map_err(|e| AppError::Logger(format!("invalid log filter '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}
