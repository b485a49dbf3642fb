//! Error classification shared by server error types.

/// Stable machine-readable code for an error, used as a structured log field.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}
