//! Plain-text rendering of the transcript.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;

use std::io::{self, Write};

use chat_client::state::chat::{ChatMessage, Role, TranscriptView};
use chat_wire::split_error_marker;

const WELCOME: &str = "Welcome to Gemini Chat!\nType a message below to start a conversation.";
const PROMPT: &str = "> ";
const USER_LABEL: &str = "you: ";
const MODEL_LABEL: &str = "gemini: ";

pub struct TerminalView<W: Write> {
    out: W,
    echo_user: bool,
    /// A model reply is being printed and its line is not yet terminated.
    line_open: bool,
    /// Last model reply, kept to describe a degraded answer.
    reply: String,
    /// First write failure seen by a transcript callback.
    failed: Option<io::Error>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out, echo_user: false, line_open: false, reply: String::new(), failed: None }
    }

    /// Print user messages too. Off for interactive use where the terminal
    /// already shows what was typed.
    #[must_use]
    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    pub fn welcome(&mut self) -> io::Result<()> {
        writeln!(self.out, "{WELCOME}")?;
        self.out.flush()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "{PROMPT}")?;
        self.out.flush()
    }

    pub fn degraded_notice(&mut self) -> io::Result<()> {
        let detail = split_error_marker(&self.reply).1.unwrap_or("unknown error");
        writeln!(self.out, "[reply was cut short: {detail}]")?;
        self.out.flush()
    }

    /// Take the first write failure from the transcript callbacks, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.failed.take()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_fragment(&mut self, text: &str) {
        let result = write!(self.out, "{text}").and_then(|()| self.out.flush());
        self.record(result);
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.failed.is_none() {
                self.failed = Some(e);
            }
        }
    }
}

impl<W: Write> TranscriptView for TerminalView<W> {
    fn message_appended(&mut self, message: &ChatMessage) {
        match message.role {
            Role::User => {
                if self.echo_user {
                    let result = writeln!(self.out, "{USER_LABEL}{}", message.content);
                    self.record(result);
                }
            }
            Role::Model => {
                if self.line_open {
                    let result = writeln!(self.out);
                    self.record(result);
                }
                self.line_open = true;
                self.reply.clone_from(&message.content);
                self.write_fragment(&format!("{MODEL_LABEL}{}", message.content));
            }
        }
    }

    fn message_extended(&mut self, message: &ChatMessage, fragment: &str) {
        self.reply.clone_from(&message.content);
        self.write_fragment(fragment);
    }

    fn loading_changed(&mut self, loading: bool) {
        if loading {
            self.reply.clear();
        } else if self.line_open {
            self.line_open = false;
            let result = writeln!(self.out).and_then(|()| self.out.flush());
            self.record(result);
        }
    }
}
