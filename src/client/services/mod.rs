//! # Domain Services
//!
//! One service per resource. Each method maps (identifiers, payload) to exactly one
//! pipeline call and normalizes the outcome into an [`ApiEnvelope`]:
//!
//! - 2xx with a decodable body → `success: true`
//! - 2xx the server itself flagged as failed → passed through unchanged
//! - any terminal [`ApiError`] or undecodable body → `success: false` with a message
//!
//! Services never retry and never look at auth failures; that all happens inside
//! [`ApiClient`].

pub mod auth;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use likes::{LikeCommand, LikeService};
pub use posts::PostService;
pub use users::{FollowCommand, UserService};

use crate::client::pipeline::{ApiClient, ApiError};
use crate::client::transport::{ApiRequest, RawResponse};
use crate::shared::envelope::ApiEnvelope;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Send `request` through the pipeline and decode the body as `T`
pub(crate) async fn call<T: DeserializeOwned>(
    client: &ApiClient,
    request: ApiRequest,
) -> ApiEnvelope<T> {
    let label = format!("{} {}", request.method, request.path);
    into_envelope(&label, client.send(request).await)
}

/// Like [`call`] for endpoints whose payload is irrelevant
pub(crate) async fn call_empty(client: &ApiClient, request: ApiRequest) -> ApiEnvelope<()> {
    call::<serde_json::Value>(client, request)
        .await
        .map(|_| ())
}

/// Like [`call`] for toggle mutations whose reply may or may not be a status.
///
/// A 2xx body that does not decode as `S` (the created like record, say) leaves
/// `data` empty instead of failing the envelope.
pub(crate) async fn call_status<S: DeserializeOwned>(
    client: &ApiClient,
    request: ApiRequest,
) -> ApiEnvelope<S> {
    let envelope = call::<serde_json::Value>(client, request).await;
    ApiEnvelope {
        success: envelope.success,
        data: envelope
            .data
            .and_then(|value| serde_json::from_value(value).ok()),
        message: envelope.message,
    }
}

/// Attach a JSON body, or produce the failure envelope if it cannot be encoded
pub(crate) fn with_json<B: Serialize + ?Sized, T>(
    request: ApiRequest,
    body: &B,
) -> Result<ApiRequest, ApiEnvelope<T>> {
    request.json(body).map_err(|e| {
        tracing::warn!("[API] Could not encode request body: {}", e);
        ApiEnvelope::failure(e.to_string())
    })
}

pub(crate) fn into_envelope<T: DeserializeOwned>(
    label: &str,
    result: Result<RawResponse, ApiError>,
) -> ApiEnvelope<T> {
    match result {
        Ok(response) => match ApiEnvelope::from_body(&response.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("[API] {} returned an unreadable body: {}", label, e);
                ApiEnvelope::failure(format!("Failed to parse response: {}", e))
            }
        },
        Err(e) => {
            tracing::debug!("[API] {} failed: {}", label, e);
            ApiEnvelope::failure(e.message())
        }
    }
}
