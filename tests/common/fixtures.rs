//! Client, session and entity fixtures

use crate::common::fake_transport::ScriptedTransport;
use pressroom::client::pipeline::{ApiClient, ApiError, SessionObserver};
use pressroom::client::storage::{MemoryStorage, Storage};
use pressroom::shared::models::{Post, TokenPair, User};
use pressroom::shared::ClientConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Counts session-expired notifications
#[derive(Debug, Default)]
pub struct CountingObserver {
    calls: AtomicUsize,
}

impl CountingObserver {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionObserver for CountingObserver {
    fn session_expired(&self, _error: &ApiError) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a pipeline test needs to inspect
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub observer: Arc<CountingObserver>,
    pub client: Arc<ApiClient>,
}

impl Harness {
    /// Default configuration: 3 retries, 1 s base delay
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let transport = ScriptedTransport::new();
        let storage = Arc::new(MemoryStorage::new());
        let observer = Arc::new(CountingObserver::default());
        let client = ApiClient::builder(config)
            .transport(transport.clone())
            .storage(storage.clone())
            .observer(observer.clone())
            .build()
            .unwrap();
        Self {
            transport,
            storage,
            observer,
            client: Arc::new(client),
        }
    }

    /// Sign in with access token `a1` and refresh token `r1`
    pub fn signed_in(self) -> Self {
        self.client.establish_session(tokens("a1", Some("r1")));
        self
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }
}

pub fn tokens(access: &str, refresh: Option<&str>) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
    }
}

pub fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {}", token))
}

pub fn post(id: &str, title: &str) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        content: format!("{} body", title),
        ..Post::default()
    }
}

pub fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        ..User::default()
    }
}

/// Configuration pointing at a wiremock server with fast retries
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(2))
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap()
}

/// reqwest-backed client against a wiremock server
pub fn mock_client(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(ApiClient::builder(mock_config(server)).build().unwrap())
}
