//! Client side of the streaming chat relay.
//!
//! `net` talks to the `/api/chat` proxy and turns the chunked reply into a
//! sequence of text fragments; `state` holds the conversation transcript and
//! applies those fragments to it. Rendering is left to the front-end, which
//! observes changes through [`state::chat::TranscriptView`].

pub mod net;
pub mod state;
