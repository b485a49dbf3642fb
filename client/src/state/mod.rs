//! Front-end state.

pub mod chat;
