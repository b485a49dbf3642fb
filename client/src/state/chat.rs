//! Conversation transcript and the streaming exchange that grows it.
//!
//! DESIGN
//! ======
//! The transcript is append-only. During an exchange at most one model
//! message is open for appending; `loading` stays true from the user message
//! until the reply ends, and `submit` refuses new input meanwhile. Each step
//! of an exchange is a public transition so a front-end can drive it from
//! its own event loop, and [`ChatState::submit`] runs the whole sequence.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::fmt;

use chat_wire::split_error_marker;
use futures::StreamExt;

use crate::net::api::{ClientError, FragmentSource};

/// Identity of a message within one transcript. Later messages compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// True for a model reply the proxy cut short with its error marker.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.role == Role::Model && split_error_marker(&self.content).1.is_some()
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("message is blank")]
    Blank,
    #[error("a reply is still streaming")]
    Busy,
}

/// Observer for transcript changes. Every method defaults to a no-op.
pub trait TranscriptView {
    fn message_appended(&mut self, _message: &ChatMessage) {}

    /// `message` already includes `fragment`.
    fn message_extended(&mut self, _message: &ChatMessage, _fragment: &str) {}

    fn loading_changed(&mut self, _loading: bool) {}

    fn scroll_to_latest(&mut self) {}
}

impl TranscriptView for () {}

/// Conversation state for one front-end session.
#[derive(Clone, Debug, Default)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
    loading: bool,
    next_id: u64,
    /// Index of the model message receiving fragments.
    streaming: Option<usize>,
}

impl ChatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Input is accepted only while no reply is streaming.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        !self.loading
    }

    /// Run one exchange: append the user message, stream the reply from
    /// `source` into the transcript, and record any failure as a model message.
    ///
    /// Only precondition failures are returned; exchange failures end up in
    /// the transcript.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Blank`] for blank text, [`SubmitError::Busy`] while loading.
    pub async fn submit<S, V>(&mut self, text: &str, source: &S, view: &mut V) -> Result<(), SubmitError>
    where
        S: FragmentSource + ?Sized,
        V: TranscriptView + ?Sized,
    {
        let message = self.begin(text, view)?;

        if let Err(e) = self.consume(&message, source, view).await {
            tracing::warn!(error = %e, "chat: exchange failed");
            self.fail(&e, view);
        }

        self.finish(view);
        Ok(())
    }

    async fn consume<S, V>(&mut self, message: &str, source: &S, view: &mut V) -> Result<(), ClientError>
    where
        S: FragmentSource + ?Sized,
        V: TranscriptView + ?Sized,
    {
        let mut fragments = source.open(message).await?;
        while let Some(fragment) = fragments.next().await {
            self.apply_fragment(&fragment?, view);
        }
        Ok(())
    }

    /// Start an exchange: append the user message and set `loading`.
    /// Returns the trimmed text to send.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Blank`] for blank text, [`SubmitError::Busy`] while loading.
    pub fn begin<V>(&mut self, text: &str, view: &mut V) -> Result<String, SubmitError>
    where
        V: TranscriptView + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::Blank);
        }
        if self.loading {
            return Err(SubmitError::Busy);
        }

        self.push(Role::User, text.to_string(), view);
        self.streaming = None;
        self.loading = true;
        view.loading_changed(true);
        Ok(text.to_string())
    }

    /// Apply one reply fragment. The first creates the model message, later
    /// ones extend it in place.
    pub fn apply_fragment<V>(&mut self, fragment: &str, view: &mut V)
    where
        V: TranscriptView + ?Sized,
    {
        if fragment.is_empty() {
            return;
        }
        match self.streaming {
            Some(index) => {
                let message = &mut self.messages[index];
                message.content.push_str(fragment);
                view.message_extended(message, fragment);
            }
            None => {
                self.push(Role::Model, fragment.to_string(), view);
                self.streaming = Some(self.messages.len() - 1);
            }
        }
    }

    /// Record a failed exchange as a model-authored message.
    pub fn fail<V>(&mut self, error: &dyn fmt::Display, view: &mut V)
    where
        V: TranscriptView + ?Sized,
    {
        self.streaming = None;
        self.push(Role::Model, failure_text(error), view);
    }

    /// End the exchange, whatever its outcome.
    pub fn finish<V>(&mut self, view: &mut V)
    where
        V: TranscriptView + ?Sized,
    {
        self.streaming = None;
        self.loading = false;
        view.loading_changed(false);
        view.scroll_to_latest();
    }

    fn push<V>(&mut self, role: Role, content: String, view: &mut V)
    where
        V: TranscriptView + ?Sized,
    {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage { id, role, content });
        if let Some(message) = self.messages.last() {
            view.message_appended(message);
        }
    }
}

fn failure_text(error: &dyn fmt::Display) -> String {
    format!("An error occurred while communicating with the AI. {error}. Please try again.")
}
