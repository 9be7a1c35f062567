//! Error types for the OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
///
/// API failures carry the upstream status and body as plain text; the
/// upstream error surface is not a structured contract, so callers that
/// need to distinguish failure modes (e.g. rate limiting) match on the
/// message.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Client misconfiguration (missing API key, bad base URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// Request never produced a response (connect failure, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// API answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}
