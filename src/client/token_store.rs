//! Token Store
//!
//! Owns the [`Session`] (access and refresh tokens) for one [`ApiClient`] instance and
//! mirrors it into the injected [`Storage`] so a restarted client resumes the session.
//! Only the pipeline and the session lifecycle methods on `ApiClient` write here.
//!
//! Access is synchronous; the lock is never held across an `.await`.
//!
//! [`ApiClient`]: crate::client::pipeline::ApiClient

use crate::client::storage::{MemoryStorage, Storage};
use crate::shared::models::TokenPair;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Current credentials. Either token may be absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

// Tokens never reach logs through Debug.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub struct TokenStore {
    session: RwLock<Session>,
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Create a token store, restoring any session persisted in `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let session = Session {
            access_token: storage.get(ACCESS_TOKEN_KEY),
            refresh_token: storage.get(REFRESH_TOKEN_KEY),
        };
        if session.is_authenticated() {
            tracing::info!("[AUTH] Restored persisted session");
        }
        Self {
            session: RwLock::new(session),
            storage,
        }
    }

    /// Token store backed by a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn session(&self) -> Session {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    /// Replace the whole session (login, register, social callback)
    pub fn set_tokens(&self, tokens: TokenPair) {
        let mut session = self.write();
        *session = Session {
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
        };
        self.persist(&session);
    }

    /// Apply a refresh result. A missing refresh token keeps the current one.
    pub fn apply_refresh(&self, tokens: TokenPair) {
        let mut session = self.write();
        session.access_token = Some(tokens.access_token);
        if let Some(refresh) = tokens.refresh_token {
            session.refresh_token = Some(refresh);
        }
        self.persist(&session);
    }

    /// Destroy the session (logout or terminal refresh failure)
    pub fn clear(&self) {
        let mut session = self.write();
        *session = Session::default();
        self.persist(&session);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, session: &Session) {
        let writes = [
            (ACCESS_TOKEN_KEY, &session.access_token),
            (REFRESH_TOKEN_KEY, &session.refresh_token),
        ];
        for (key, value) in writes {
            let result = match value {
                Some(token) => self.storage.set(key, token),
                None => self.storage.remove(key),
            };
            if let Err(e) = result {
                tracing::warn!("[AUTH] Failed to persist {}: {}", key, e);
            }
        }
    }
}
