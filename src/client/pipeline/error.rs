//! Terminal outcomes of the request pipeline.
//!
//! Intermediate failures (a retried 503, a 401 resolved by refresh) never surface;
//! callers only ever see one of the four response kinds, or `InvalidRequest` when
//! nothing could be sent.

use crate::client::transport::{RawResponse, TransportError};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response at all (unreachable host, timeout), retries exhausted
    #[error("Network error: {message}")]
    Network { message: String },

    /// 5xx (or 408/429) after retries were exhausted
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// 401 that survived a failed or skipped refresh
    #[error("Session expired: {message}")]
    AuthExpired { message: String },

    /// Any other 4xx, never retried
    #[error("Request rejected {status}: {message}")]
    Client { status: u16, message: String },

    /// The request could not be built locally and was never sent
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::AuthExpired {
            message: message.into(),
        }
    }

    /// Classify a non-success response that the pipeline will not recover from
    pub fn from_response(response: &RawResponse) -> Self {
        let status = response.status;
        let message = response.error_message();
        if status == StatusCode::UNAUTHORIZED {
            Self::AuthExpired { message }
        } else if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            Self::Server {
                status: status.as_u16(),
                message,
            }
        } else {
            Self::Client {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            Self::AuthExpired { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Network { .. } | Self::InvalidRequest { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Network { message }
            | Self::Server { message, .. }
            | Self::AuthExpired { message }
            | Self::Client { message, .. }
            | Self::InvalidRequest { message } => message,
        }
    }

    /// Whether this kind is in the retryable class (the pipeline already retried it)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Build(message) => Self::InvalidRequest { message },
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}
