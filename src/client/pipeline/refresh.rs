//! # Single-flight Token Refresh
//!
//! Coordinates access-token refresh across every request that observed a 401.
//!
//! - The first caller becomes the **leader** and runs the refresh.
//! - Callers arriving while a refresh is in flight are **followers**: they park on a
//!   oneshot channel in the pending queue instead of polling or refreshing again.
//! - When the leader finishes, the queue is taken under the lock and every follower
//!   receives the same outcome: the same new token, or the same error.
//! - A caller whose request was sent with an access token that has since been
//!   replaced skips refresh altogether and replays with the current token.
//!
//! If the leader's future is dropped mid-refresh, the queue is released and every
//! follower resolves with [`ApiError::AuthExpired`].

use crate::client::pipeline::error::ApiError;
use crate::client::token_store::TokenStore;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// New access token, or the error every waiter observes
pub type RefreshOutcome = Result<String, ApiError>;

type Waiters = Vec<oneshot::Sender<RefreshOutcome>>;

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    /// `Some` while a refresh is in flight; holds the parked followers
    pending: Mutex<Option<Waiters>>,
    refreshes: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refreshes this coordinator has started
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().is_some()
    }

    /// Obtain a token to replay a request that got 401 after being sent with
    /// `sent_token`, running `refresh` only if no other caller already did.
    pub async fn refresh_or_join<F, Fut>(
        &self,
        sent_token: Option<&str>,
        tokens: &TokenStore,
        refresh: F,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let role = {
            let mut pending = self.lock();
            match pending.as_mut() {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    tracing::debug!("[REFRESH] Refresh in flight, queued ({} waiting)", waiters.len());
                    Role::Follower(rx)
                }
                None => {
                    // The token was replaced after this request went out.
                    if let Some(current) = tokens.access_token() {
                        if sent_token != Some(current.as_str()) {
                            tracing::debug!("[REFRESH] Token already rotated, replaying without refresh");
                            return Ok(current);
                        }
                    }
                    *pending = Some(Vec::new());
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(rx) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::auth_expired("token refresh was abandoned"))
            }),
            Role::Leader => {
                self.refreshes.fetch_add(1, Ordering::SeqCst);
                let mut guard = LeaderGuard {
                    coordinator: self,
                    settled: false,
                };
                let outcome = refresh().await;
                let waiters = guard.settle();

                if !waiters.is_empty() {
                    tracing::debug!("[REFRESH] Releasing {} queued request(s)", waiters.len());
                }
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
                outcome
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Waiters>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight marker even if the leader is dropped before finishing.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(&mut self) -> Waiters {
        self.settled = true;
        self.coordinator.lock().take().unwrap_or_default()
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("[REFRESH] Refresh cancelled, releasing queued requests");
            // Dropping the senders wakes every follower with an error.
            drop(self.coordinator.lock().take());
        }
    }
}
