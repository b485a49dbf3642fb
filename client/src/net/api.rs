//! HTTP client for the `/api/chat` proxy.
//!
//! ERROR HANDLING
//! ==============
//! A failure status is turned into a [`ClientError::Server`] carrying the
//! most human-readable message available, before any fragment is produced.
//! Transport failures, including ones in the middle of the body, carry the
//! "failed to communicate with chat server" context. Nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use chat_wire::{CHAT_PATH, ChatRequest};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;

use super::decode::Utf8StreamDecoder;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors surfaced to the conversation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The proxy answered with a failure status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The proxy answered without a body to stream.
    #[error("response body is empty, no stream received from server")]
    MissingBody,

    /// The request or the body read failed.
    #[error("failed to communicate with chat server: {0}")]
    Transport(String),
}

/// Decoded text fragments of one reply, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, ClientError>>;

/// Opens a fragment stream for one outgoing message. Enables mocking in tests.
#[async_trait::async_trait]
pub trait FragmentSource: Send + Sync {
    /// Send `message` and return its reply as a lazy fragment sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the reply cannot be started.
    async fn open(&self, message: &str) -> Result<FragmentStream, ClientError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Build a client for the proxy at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self::with_http(http, base_url))
    }

    /// Build a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn chat_url(&self) -> String {
        format!("{}{CHAT_PATH}", self.base_url)
    }

    /// `POST /api/chat` and stream the reply.
    ///
    /// # Errors
    ///
    /// See [`ClientError`]. Errors after this returns arrive as stream items.
    pub async fn send_message_stream(&self, message: &str) -> Result<FragmentStream, ClientError> {
        let response = self
            .http
            .post(self.chat_url())
            .json(&ChatRequest::new(message))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| ClientError::Transport(e.to_string()))?;
            let status = status.as_u16();
            return Err(ClientError::Server { status, message: error_message(status, &body) });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(ClientError::MissingBody);
        }

        Ok(fragment_stream(response.bytes_stream()))
    }
}

#[async_trait::async_trait]
impl FragmentSource for ChatClient {
    async fn open(&self, message: &str) -> Result<FragmentStream, ClientError> {
        self.send_message_stream(message).await
    }
}

// =============================================================================
// ERROR BODY
// =============================================================================

fn status_message(status: u16) -> String {
    format!("Server responded with status: {status}")
}

/// Pick the message for a failure response.
///
/// A JSON body yields its `error` field (or the status line if it has none);
/// any other non-empty body is used verbatim.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json
            .get("error")
            .and_then(serde_json::Value::as_str)
            .filter(|error| !error.is_empty())
            .map_or_else(|| status_message(status), str::to_string),
        Err(_) if !body.is_empty() => body.to_string(),
        Err(_) => status_message(status),
    }
}

// =============================================================================
// BODY STREAM
// =============================================================================

struct BodyState<S> {
    body: std::pin::Pin<Box<S>>,
    decoder: Utf8StreamDecoder,
    done: bool,
}

/// Decode a raw body into non-empty text fragments.
pub(crate) fn fragment_stream<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = BodyState { body: Box::pin(body), decoder: Utf8StreamDecoder::new(), done: false };

    futures::stream::unfold(state, |mut st| async move {
        while !st.done {
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let text = st.decoder.decode(chunk.as_ref());
                    if !text.is_empty() {
                        return Some((Ok(text), st));
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(ClientError::Transport(e.to_string())), st));
                }
                None => {
                    st.done = true;
                    let tail = st.decoder.finish();
                    if !tail.is_empty() {
                        return Some((Ok(tail), st));
                    }
                }
            }
        }
        None
    })
    .boxed()
}
