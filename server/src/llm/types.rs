//! LLM types: upstream stream types, sampling config and errors.

use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// A stream event could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The provider reported an error inside an open stream.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::Upstream(_) => "E_UPSTREAM",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// SAMPLING
// =============================================================================

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// Incremental text output of one model turn, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Provider-neutral async trait for streamed generation. Enables mocking in tests.
///
/// Every call is a fresh single-turn session: no history is kept between calls.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// Open a generation stream for `message`.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request cannot be sent or the provider
    /// rejects it before any output is produced. Failures after that point are
    /// delivered as `Err` items of the returned stream.
    async fn chat_stream(&self, message: &str) -> Result<TextStream, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
