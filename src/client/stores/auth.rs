//! Auth Store
//!
//! The signed-in identity with loading and error state. The identity is persisted
//! so a restarted client shows the user before `/api/auth/me` answers; tokens are
//! persisted separately by the token store.

use crate::client::services::AuthService;
use crate::client::storage::{load_json, Storage};
use crate::client::stores::posts::unwrap_data;
use crate::client::stores::{persist, StoreError};
use crate::shared::models::{LoginRequest, RegisterRequest, TokenPair, User};
use std::sync::Arc;
use tokio::sync::RwLock;

const STORAGE_KEY: &str = "pressroom.auth.user";

#[derive(Debug, Default)]
struct AuthState {
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

pub struct AuthStore {
    service: AuthService,
    storage: Arc<dyn Storage>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(service: AuthService, storage: Arc<dyn Storage>) -> Self {
        let user: Option<User> = load_json(storage.as_ref(), STORAGE_KEY);
        // An identity without tokens is a leftover of an expired session.
        let user = user.filter(|_| service.client().is_authenticated());
        Self {
            service,
            storage,
            state: RwLock::new(AuthState {
                user,
                ..AuthState::default()
            }),
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Signed in locally and holding an access token
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.user.is_some() && self.service.client().is_authenticated()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, StoreError> {
        self.start().await;
        let result = unwrap_data(self.service.login(credentials).await).map(|payload| payload.user);
        self.finish(result).await
    }

    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, StoreError> {
        self.start().await;
        let result =
            unwrap_data(self.service.register(registration).await).map(|payload| payload.user);
        self.finish(result).await
    }

    /// Complete an OAuth redirect with the tokens it carried
    pub async fn complete_social_login(&self, tokens: TokenPair) -> Result<User, StoreError> {
        self.start().await;
        let result = unwrap_data(self.service.complete_social_login(tokens).await);
        self.finish(result).await
    }

    pub async fn load_current_user(&self) -> Result<User, StoreError> {
        self.start().await;
        let result = unwrap_data(self.service.current_user().await);
        self.finish(result).await
    }

    pub async fn logout(&self) {
        self.service.logout().await;
        self.forget().await;
        tracing::info!("[AUTH] Logged out");
    }

    /// Drop the local identity, e.g. after the session expired
    pub async fn forget(&self) {
        let mut state = self.state.write().await;
        *state = AuthState::default();
        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            tracing::warn!("[STORE] Failed to clear persisted identity: {}", e);
        }
    }

    async fn start(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self, result: Result<User, StoreError>) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        state.loading = false;
        match &result {
            Ok(user) => {
                state.user = Some(user.clone());
                persist(self.storage.as_ref(), STORAGE_KEY, user);
                tracing::info!("[AUTH] Signed in as {}", user.username);
            }
            Err(e) => state.error = Some(e.to_string()),
        }
        result
    }
}
