//! Chat route: relays one prompt to the upstream model as a text stream.
//!
//! DESIGN
//! ======
//! Status and headers are committed only once the upstream produces its
//! first non-empty fragment. Until then any failure is answered with a JSON
//! `ErrorBody`; after that, the only channel left is the body itself, so a
//! mid-stream failure is appended as a plain-text marker and the body ends.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use chat_wire::{CHUNKED, ChatRequest, ErrorBody, NO_CACHE, TEXT_CONTENT_TYPE, stream_error_marker};
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::llm::types::{LlmError, TextStream};
use crate::state::AppState;

const MISSING_MESSAGE: &str = "Message content is required.";
const MISSING_API_KEY: &str =
    "Server error: Gemini API key is missing or invalid. Please check the server environment variables.";
const UPSTREAM_FAILED: &str = "Failed to get response from Gemini API. Please try again later.";

// =============================================================================
// ERRORS
// =============================================================================

/// Failures answered before the stream starts. Each maps to a status and a
/// JSON `ErrorBody`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("message content is required")]
    MissingMessage,
    #[error("request body rejected: {0}")]
    BodyRejected(#[from] BytesRejection),
    #[error("upstream failed: {0}")]
    Upstream(#[from] LlmError),
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "E_METHOD_NOT_ALLOWED",
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::MissingMessage => "E_MISSING_MESSAGE",
            Self::BodyRejected(_) => "E_BODY_REJECTED",
            Self::Upstream(e) => e.error_code(),
        }
    }
}

impl ChatError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingMessage => StatusCode::BAD_REQUEST,
            Self::BodyRejected(rejection) => rejection.status(),
            Self::LlmNotConfigured | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Upstream details stay in the server log.
    fn public_message(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method Not Allowed".into(),
            Self::LlmNotConfigured => MISSING_API_KEY.into(),
            Self::MissingMessage => MISSING_MESSAGE.into(),
            Self::BodyRejected(rejection) => rejection.body_text(),
            Self::Upstream(_) => UPSTREAM_FAILED.into(),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody::new(self.public_message()));
        if matches!(self, Self::MethodNotAllowed) {
            return (self.status(), [(header::ALLOW, "POST")], body).into_response();
        }
        (self.status(), body).into_response()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Any method other than `POST` on the chat path.
pub async fn method_not_allowed() -> ChatError {
    warn!("chat: method not allowed");
    ChatError::MethodNotAllowed
}

/// `POST /api/chat`: stream the model's reply to `{ "message": string }`.
///
/// A body axum refuses to buffer (over the default size limit, or unreadable)
/// is answered with the rejection's status and a JSON `ErrorBody`.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ChatError> {
    let request_id = Uuid::new_v4();

    let Some(llm) = state.llm.clone() else {
        error!(%request_id, "chat: LLM client not configured");
        return Err(ChatError::LlmNotConfigured);
    };

    let message = body
        .map_err(ChatError::from)
        .and_then(|body| parse_message(&body))
        .inspect_err(|e| {
            warn!(%request_id, error = %e, code = e.error_code(), "chat: request rejected");
        })?;
    info!(%request_id, message_len = message.len(), "chat: request received");

    let mut upstream = llm
        .chat_stream(&message)
        .await
        .inspect_err(|e| log_pre_stream_failure(request_id, e))?;

    let first = loop {
        match upstream.next().await {
            Some(Ok(text)) if text.is_empty() => {}
            Some(Ok(text)) => break Some(text),
            Some(Err(e)) => {
                log_pre_stream_failure(request_id, &e);
                return Err(e.into());
            }
            None => break None,
        }
    };

    Ok(stream_response(relay(request_id, first, upstream)))
}

fn log_pre_stream_failure(request_id: Uuid, e: &LlmError) {
    error!(%request_id, error = %e, code = e.error_code(), "chat: upstream failed before stream");
}

/// Extract a non-blank message from the request body.
fn parse_message(body: &[u8]) -> Result<String, ChatError> {
    serde_json::from_slice::<ChatRequest>(body)
        .ok()
        .map(|req| req.message)
        .filter(|message| !message.trim().is_empty())
        .ok_or(ChatError::MissingMessage)
}

fn stream_response<S>(body: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    (
        [
            (header::CONTENT_TYPE, TEXT_CONTENT_TYPE),
            (header::CACHE_CONTROL, NO_CACHE),
            (header::TRANSFER_ENCODING, CHUNKED),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

// =============================================================================
// RELAY
// =============================================================================

struct Relay {
    request_id: Uuid,
    first: Option<String>,
    upstream: TextStream,
    done: bool,
    fragments: usize,
    bytes: usize,
}

impl Relay {
    fn emit(&mut self, text: String) -> Bytes {
        self.fragments += 1;
        self.bytes += text.len();
        Bytes::from(text)
    }
}

/// Body stream: the already-received first fragment, then every later
/// non-empty fragment as it arrives. A failure becomes a trailing marker.
fn relay(
    request_id: Uuid,
    first: Option<String>,
    upstream: TextStream,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    let state = Relay { request_id, first, upstream, done: false, fragments: 0, bytes: 0 };

    futures::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        if let Some(text) = st.first.take() {
            let chunk = st.emit(text);
            return Some((Ok(chunk), st));
        }
        loop {
            match st.upstream.next().await {
                Some(Ok(text)) if text.is_empty() => {}
                Some(Ok(text)) => {
                    let chunk = st.emit(text);
                    return Some((Ok(chunk), st));
                }
                Some(Err(e)) => {
                    error!(
                        request_id = %st.request_id,
                        error = %e,
                        code = e.error_code(),
                        fragments = st.fragments,
                        "chat: upstream failed mid-stream"
                    );
                    st.done = true;
                    let marker = stream_error_marker(&e.to_string());
                    return Some((Ok(Bytes::from(marker)), st));
                }
                None => {
                    info!(
                        request_id = %st.request_id,
                        fragments = st.fragments,
                        bytes = st.bytes,
                        "chat: stream completed"
                    );
                    return None;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
