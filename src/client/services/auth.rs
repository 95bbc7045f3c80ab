//! Authentication Service
//!
//! Login, registration, password reset and session lifecycle. Successful login,
//! registration and social callbacks hand the issued tokens to the pipeline's
//! token store; logout always clears the local session, whatever the server says.

use crate::client::pipeline::ApiClient;
use crate::client::services::{call, call_empty, with_json};
use crate::client::transport::{ApiRequest, RequestOptions};
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{
    AuthPayload, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    TokenPair, User,
};
use serde::Deserialize;
use std::sync::Arc;

/// `/api/auth/me` answers either `{ user: {...} }` or the user itself
#[derive(Deserialize)]
#[serde(untagged)]
enum UserBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        match body {
            UserBody::Wrapped { user } | UserBody::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ApiEnvelope<AuthPayload> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return ApiEnvelope::failure("Email and password are required");
        }
        let request = match with_json(
            ApiRequest::post("/api/auth/login").options(RequestOptions::public()),
            credentials,
        ) {
            Ok(request) => request,
            Err(failure) => return failure,
        };
        self.start_session(call(&self.client, request).await)
    }

    pub async fn register(&self, registration: &RegisterRequest) -> ApiEnvelope<AuthPayload> {
        if registration.username.trim().is_empty() {
            return ApiEnvelope::failure("Username is required");
        }
        let request = match with_json(
            ApiRequest::post("/api/auth/register").options(RequestOptions::public()),
            registration,
        ) {
            Ok(request) => request,
            Err(failure) => return failure,
        };
        self.start_session(call(&self.client, request).await)
    }

    /// Tell the server, then drop the local session regardless of the answer
    pub async fn logout(&self) -> ApiEnvelope<()> {
        let options = RequestOptions {
            skip_refresh: true,
            ..RequestOptions::default()
        };
        let envelope = if self.client.is_authenticated() {
            call_empty(&self.client, ApiRequest::post("/api/auth/logout").options(options)).await
        } else {
            ApiEnvelope::empty()
        };
        self.client.end_session();
        if !envelope.success {
            tracing::debug!("[AUTH] Server-side logout failed: {:?}", envelope.message);
        }
        ApiEnvelope::empty()
    }

    pub async fn current_user(&self) -> ApiEnvelope<User> {
        call::<UserBody>(&self.client, ApiRequest::get("/api/auth/me"))
            .await
            .map(User::from)
    }

    pub async fn forgot_password(&self, email: &str) -> ApiEnvelope<()> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        match with_json(
            ApiRequest::post("/api/auth/forgot-password").options(RequestOptions::public()),
            &body,
        ) {
            Ok(request) => call_empty(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> ApiEnvelope<()> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        };
        match with_json(
            ApiRequest::post("/api/auth/reset-password").options(RequestOptions::public()),
            &body,
        ) {
            Ok(request) => call_empty(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    /// Finish an OAuth redirect: adopt the tokens from the callback and fetch the user
    pub async fn complete_social_login(&self, tokens: TokenPair) -> ApiEnvelope<User> {
        self.client.establish_session(tokens);
        let envelope = self.current_user().await;
        if !envelope.success {
            self.client.end_session();
        }
        envelope
    }

    fn start_session(&self, envelope: ApiEnvelope<AuthPayload>) -> ApiEnvelope<AuthPayload> {
        if let (true, Some(payload)) = (envelope.success, envelope.data.as_ref()) {
            self.client.establish_session(payload.tokens.clone());
        }
        envelope
    }
}
