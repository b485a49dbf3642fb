//! Networking for the chat proxy.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the HTTP exchange and owns the client error type, and
//! `decode` reassembles UTF-8 text across body reads.

pub mod api;
pub mod decode;
