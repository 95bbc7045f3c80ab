//! Shared Error Types
//!
//! Failures of the plain data layer: a payload that cannot be encoded or decoded,
//! or a draft that fails its local precondition before anything is sent. Transport
//! and pipeline failures are [`crate::client::pipeline::ApiError`].
//!
//! Validation messages are shown to the user as-is, so their `Display` is the bare
//! message; the offending field is kept alongside for forms.
//!
//! ```rust
//! use pressroom::shared::error::SharedError;
//!
//! let error = SharedError::validation("title", "Post title cannot be empty");
//! assert_eq!(error.field(), Some("title"));
//! assert_eq!(error.to_string(), "Post title cannot be empty");
//! ```
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A body could not be encoded, or a response body did not match its model
    #[error("Malformed payload: {message}")]
    SerializationError { message: String },

    /// A draft was rejected locally
    #[error("{message}")]
    ValidationError { field: String, message: String },
}

impl SharedError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Form field a validation error refers to
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::SerializationError { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
