//! # Authenticated Request Pipeline
//!
//! [`ApiClient`] wraps an [`HttpTransport`] and makes every logical call:
//!
//! - carry `Authorization: Bearer <token>` when a session exists ([`bearer`])
//! - survive transient failures with exponential backoff ([`retry`])
//! - recover from an expired access token exactly once, sharing a single refresh
//!   with every other call that hit 401 at the same time ([`refresh`])
//! - end in either a 2xx response or one [`ApiError`] kind ([`error`])
//!
//! ## Per-call state machine
//!
//! ```text
//! INIT -> SENDING -> SUCCESS                      (2xx)
//!                 -> NEEDS_REFRESH -> SENDING     (401, not yet refreshed)
//!                 -> RETRYABLE_FAILURE -> SENDING (network/5xx/408/429, budget left)
//!                 -> TERMINAL_FAILURE             (anything else)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pressroom::client::pipeline::ApiClient;
//! use pressroom::client::transport::ApiRequest;
//! use pressroom::shared::ClientConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder(ClientConfig::from_env()?).build()?;
//! let response = client.send(ApiRequest::get("/api/posts")).await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod bearer;
pub mod error;
pub mod refresh;
pub mod retry;

pub use error::ApiError;
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use retry::{AttemptOutcome, BackoffStrategy, RetryPolicy};

use crate::client::storage::{MemoryStorage, Storage};
use crate::client::token_store::{Session, TokenStore};
use crate::client::transport::{
    ApiRequest, HttpTransport, RawResponse, ReqwestTransport, RequestBody, RequestOptions,
    TransportError,
};
use crate::shared::config::ClientConfig;
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::TokenPair;
use reqwest::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Receives the session-expired side effect (clear credentials, send the user to
/// the login screen). Invoked once per failed refresh, never once per request.
pub trait SessionObserver: Send + Sync {
    fn session_expired(&self, error: &ApiError);
}

impl<F> SessionObserver for F
where
    F: Fn(&ApiError) + Send + Sync,
{
    fn session_expired(&self, error: &ApiError) {
        self(error)
    }
}

/// Observer that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyObserver;

impl SessionObserver for LogOnlyObserver {
    fn session_expired(&self, error: &ApiError) {
        tracing::info!("[AUTH] Session expired, login required: {}", error);
    }
}

/// Bookkeeping for one logical call across its physical attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestAttempt {
    /// Retries consumed so far; never exceeds the policy maximum
    pub retry_count: u32,
    /// Set once this call has gone through refresh; a second 401 is terminal
    pub refreshed: bool,
}

/// Authenticated HTTP client shared by all domain services
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    refresh: RefreshCoordinator,
    retry: RetryPolicy,
    observer: Arc<dyn SessionObserver>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("session", &self.tokens.session())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            transport: None,
            storage: None,
            observer: None,
            retry: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Session {
        self.tokens.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.session().is_authenticated()
    }

    /// Number of refresh calls issued by this client
    pub fn refresh_count(&self) -> u64 {
        self.refresh.refresh_count()
    }

    /// Store credentials obtained from login, register or a social-login callback
    pub fn establish_session(&self, tokens: TokenPair) {
        tracing::info!("[AUTH] Session established");
        self.tokens.set_tokens(tokens);
    }

    /// Drop credentials locally (logout)
    pub fn end_session(&self) {
        tracing::info!("[AUTH] Session ended");
        self.tokens.clear();
    }

    /// `request(method, path, body?, options?)`
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        options: Option<RequestOptions>,
    ) -> Result<RawResponse, ApiError> {
        let mut request = ApiRequest::new(method, path).options(options.unwrap_or_default());
        if let Some(body) = body {
            request.body = RequestBody::Json(body);
        }
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse, ApiError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<RawResponse, ApiError> {
        self.request(Method::POST, path, Some(body), None).await
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> Result<RawResponse, ApiError> {
        self.request(Method::PUT, path, Some(body), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<RawResponse, ApiError> {
        self.request(Method::DELETE, path, None, None).await
    }

    /// Run one logical call to completion
    pub async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let mut attempt = RequestAttempt::default();
        let refreshable = !request.options.skip_auth && !request.options.skip_refresh;
        let mut token = self.current_token(&request);

        loop {
            let authorized = bearer::authorize(&request, token.as_deref());
            tracing::debug!(
                "[API] SENDING {} {} (retry {}, refreshed {})",
                request.method,
                request.path,
                attempt.retry_count,
                attempt.refreshed
            );
            let result = self.transport.send(&authorized).await;

            match AttemptOutcome::classify(&result) {
                AttemptOutcome::Success => return result.map_err(ApiError::from),
                AttemptOutcome::Unauthorized => {
                    let response = result.map_err(ApiError::from)?;
                    if !refreshable {
                        return Err(ApiError::Client {
                            status: StatusCode::UNAUTHORIZED.as_u16(),
                            message: response.error_message(),
                        });
                    }
                    if attempt.refreshed {
                        tracing::warn!(
                            "[AUTH] {} {} still unauthorized after refresh",
                            request.method,
                            request.path
                        );
                        return Err(ApiError::from_response(&response));
                    }
                    attempt.refreshed = true;
                    tracing::debug!("[API] NEEDS_REFRESH {} {}", request.method, request.path);
                    let fresh = self
                        .refresh
                        .refresh_or_join(token.as_deref(), &self.tokens, || self.perform_refresh())
                        .await?;
                    token = Some(fresh);
                }
                AttemptOutcome::Retryable => {
                    if !self.retry.allows_retry(attempt.retry_count) {
                        return Err(terminal_error(result));
                    }
                    let delay = self.retry.delay_for(attempt.retry_count);
                    tracing::warn!(
                        "[RETRY] {} {} failed ({}), retrying in {:?} ({}/{})",
                        request.method,
                        request.path,
                        describe(&result),
                        delay,
                        attempt.retry_count + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt.retry_count += 1;
                    // Another call may have refreshed while this one waited.
                    token = self.current_token(&request);
                }
                AttemptOutcome::Terminal => return Err(terminal_error(result)),
            }
        }
    }

    fn current_token(&self, request: &ApiRequest) -> Option<String> {
        if request.options.skip_auth {
            None
        } else {
            self.tokens.access_token()
        }
    }

    /// The one physical refresh call per expiry window
    async fn perform_refresh(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            let error = ApiError::auth_expired("No refresh token available");
            if self.tokens.access_token().is_some() {
                self.expire_session(&error);
            }
            return Err(error);
        };

        tracing::info!("[REFRESH] Refreshing access token");
        let mut request =
            ApiRequest::post(self.config.refresh_endpoint.clone()).options(RequestOptions::public());
        request.body = RequestBody::Json(serde_json::json!({ "refreshToken": refresh_token }));

        let outcome = match self.transport.send(&request).await {
            Ok(response) if response.status.is_success() => {
                match ApiEnvelope::<TokenPair>::from_body(&response.body) {
                    Ok(ApiEnvelope {
                        success: true,
                        data: Some(tokens),
                        ..
                    }) => Ok(tokens),
                    Ok(envelope) => Err(envelope
                        .message
                        .unwrap_or_else(|| "Refresh response carried no token".to_string())),
                    Err(e) => Err(format!("Unreadable refresh response: {}", e)),
                }
            }
            Ok(response) => Err(response.error_message()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(tokens) => {
                let access = tokens.access_token.clone();
                self.tokens.apply_refresh(tokens);
                tracing::info!("[REFRESH] Access token refreshed");
                Ok(access)
            }
            Err(message) => {
                let error = ApiError::auth_expired(message);
                self.expire_session(&error);
                Err(error)
            }
        }
    }

    fn expire_session(&self, error: &ApiError) {
        tracing::error!("[AUTH] Refresh failed, clearing session: {}", error);
        self.tokens.clear();
        self.observer.session_expired(error);
    }
}

fn terminal_error(result: Result<RawResponse, TransportError>) -> ApiError {
    match result {
        Ok(response) => ApiError::from_response(&response),
        Err(e) => ApiError::from(e),
    }
}

fn describe(result: &Result<RawResponse, TransportError>) -> String {
    match result {
        Ok(response) => response.status.to_string(),
        Err(e) => e.to_string(),
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    storage: Option<Arc<dyn Storage>>,
    observer: Option<Arc<dyn SessionObserver>>,
    retry: Option<RetryPolicy>,
}

impl ApiClientBuilder {
    /// Use a custom transport instead of [`ReqwestTransport`]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Persistence for the token store (defaults to in-memory)
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Override the retry policy derived from the configuration
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn build(self) -> Result<ApiClient, TransportError> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.clone())?),
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let retry = self
            .retry
            .unwrap_or_else(|| RetryPolicy::from_config(&self.config));

        Ok(ApiClient {
            tokens: TokenStore::new(storage),
            refresh: RefreshCoordinator::new(),
            observer: self.observer.unwrap_or_else(|| Arc::new(LogOnlyObserver)),
            retry,
            transport,
            config: self.config,
        })
    }
}
