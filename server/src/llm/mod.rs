//! LLM: upstream generation model for the chat relay.
//!
//! DESIGN
//! ======
//! Uses environment variables instead of config files. `GeminiClient` holds
//! only an HTTP client and fixed settings; every `chat_stream` call is an
//! independent single-turn session, so one instance is shared by all requests
//! through `AppState` without any per-conversation state.

pub mod config;
pub mod gemini;
pub mod sse;
pub mod types;

pub use gemini::GeminiClient;
pub use types::LlmChat;
