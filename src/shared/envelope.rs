//! Uniform result envelope
//!
//! Every domain service call resolves to an [`ApiEnvelope`], never to an `Err`.
//! Servers may answer with the envelope shape directly
//! (`{"success": true, "data": {...}}`) or with a bare payload; both decode to the
//! same envelope.

use crate::shared::error::SharedError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// `{ success, data?, message? }` wrapper normalizing all service results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Successful envelope without a payload (e.g. 204 No Content)
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    /// Failed envelope with a human-readable message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Map the payload, preserving success and message
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiEnvelope<U> {
        ApiEnvelope {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
        }
    }

    /// Convert into a `Result`, using the message (or a generic one) on failure.
    ///
    /// A successful envelope without data yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .unwrap_or_else(|| "Request failed".to_string()))
        }
    }
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decode a response body into an envelope.
    ///
    /// Objects carrying a boolean `success` key are treated as envelopes, anything
    /// else is decoded as the bare payload. An empty body is an empty success.
    pub fn from_body(body: &[u8]) -> Result<Self, SharedError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }

        let value: serde_json::Value = serde_json::from_slice(body)?;
        let is_envelope = value
            .as_object()
            .and_then(|object| object.get("success"))
            .is_some_and(serde_json::Value::is_boolean);

        if is_envelope {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(Self::ok(serde_json::from_value(value)?))
        }
    }
}
