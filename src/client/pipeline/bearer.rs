//! Authorization injection stage.

use crate::client::transport::ApiRequest;
use reqwest::header::{HeaderValue, AUTHORIZATION};

/// Copy of `request` carrying `Authorization: Bearer <token>`.
///
/// Without a token, or when the request opts out with `skip_auth`, any
/// Authorization header is removed instead.
pub fn authorize(request: &ApiRequest, token: Option<&str>) -> ApiRequest {
    let mut authorized = request.clone();
    let headers = &mut authorized.options.headers;
    headers.remove(AUTHORIZATION);

    let Some(token) = token.filter(|_| !request.options.skip_auth) else {
        return authorized;
    };

    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => {
            tracing::warn!("[AUTH] Access token is not a valid header value, sending request without it");
        }
    }
    authorized
}
