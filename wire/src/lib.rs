//! Shared wire contract for the `/api/chat` relay.
//!
//! This crate owns the request/error bodies and the stream conventions used
//! by both `chat-server` and `chat-client`. The success body is unframed
//! UTF-8 text, so the only in-band signal is the trailing error marker the
//! proxy appends when the upstream model fails after headers were sent.

use serde::{Deserialize, Serialize};

/// Path of the streaming chat endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// `Content-Type` of a successful streamed reply.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// `Cache-Control` of a successful streamed reply.
pub const NO_CACHE: &str = "no-cache";

/// `Transfer-Encoding` of a successful streamed reply.
pub const CHUNKED: &str = "chunked";

/// Prefix written into an open stream when the upstream fails mid-reply.
/// Only this exact text marks a reply as cut short; a model answer that
/// merely contains an `ERROR:` line is a complete answer.
pub const STREAM_ERROR_MARKER: &str = "\nERROR: Failed to get response from Gemini API: ";

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// JSON error body returned with any non-2xx status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Build the trailing marker text for a mid-stream failure.
#[must_use]
pub fn stream_error_marker(detail: &str) -> String {
    format!("{STREAM_ERROR_MARKER}{detail}")
}

/// Split accumulated reply text into the answer and the marker detail.
///
/// Returns `(text, None)` when the reply completed normally. The proxy writes
/// at most one marker and nothing after it, so the last occurrence is used.
#[must_use]
pub fn split_error_marker(text: &str) -> (&str, Option<&str>) {
    match text.rfind(STREAM_ERROR_MARKER) {
        Some(pos) => (&text[..pos], Some(&text[pos + STREAM_ERROR_MARKER.len()..])),
        None => (text, None),
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
