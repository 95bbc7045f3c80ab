//! Like Store
//!
//! Like status of posts and comments. Every like or unlike is an explicit
//! [`LikeCommand`]; [`LikeStore::toggle`] resolves the command from the stored flag
//! and sends it through the same optimistic path.

use crate::client::services::{LikeCommand, LikeService};
use crate::client::stores::optimistic::OptimisticLedger;
use crate::client::stores::posts::unwrap_data;
use crate::client::stores::StoreError;
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{Comment, LikeStatus, Post};
use futures_util::future::join_all;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The likeable entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(String),
    Comment(String),
}

impl LikeTarget {
    pub fn post(id: impl Into<String>) -> Self {
        Self::Post(id.into())
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self::Comment(id.into())
    }
}

#[derive(Debug, Default)]
struct LikeState {
    statuses: HashMap<LikeTarget, LikeStatus>,
    errors: HashMap<LikeTarget, String>,
    ledger: OptimisticLedger<LikeTarget, Option<LikeStatus>>,
}

impl LikeState {
    fn restore(&mut self, target: &LikeTarget, snapshot: Option<LikeStatus>) {
        match snapshot {
            Some(status) => {
                self.statuses.insert(target.clone(), status);
            }
            None => {
                self.statuses.remove(target);
            }
        }
    }
}

pub struct LikeStore {
    service: LikeService,
    state: RwLock<LikeState>,
}

impl LikeStore {
    pub fn new(service: LikeService) -> Self {
        Self {
            service,
            state: RwLock::new(LikeState::default()),
        }
    }

    /// Known status; unknown targets read as not liked
    pub async fn status(&self, target: &LikeTarget) -> LikeStatus {
        self.state
            .read()
            .await
            .statuses
            .get(target)
            .copied()
            .unwrap_or_default()
    }

    pub async fn is_liked(&self, target: &LikeTarget) -> bool {
        self.status(target).await.is_liked
    }

    pub async fn is_pending(&self, target: &LikeTarget) -> bool {
        self.state.read().await.ledger.is_pending(target)
    }

    pub async fn error(&self, target: &LikeTarget) -> Option<String> {
        self.state.read().await.errors.get(target).cloned()
    }

    /// Record a status learned elsewhere, unless a mutation is in flight
    pub async fn seed(&self, target: LikeTarget, status: LikeStatus) {
        let mut state = self.state.write().await;
        if !state.ledger.is_pending(&target) {
            state.statuses.insert(target, status);
        }
    }

    /// Seed from the counters embedded in loaded posts
    pub async fn seed_posts(&self, posts: &[Post]) {
        for post in posts {
            let status = LikeStatus {
                count: post.likes_count,
                is_liked: post.is_liked,
            };
            self.seed(LikeTarget::post(post.id.clone()), status).await;
        }
    }

    pub async fn seed_comments(&self, comments: &[Comment]) {
        for comment in comments {
            let status = LikeStatus {
                count: comment.likes_count,
                is_liked: comment.is_liked,
            };
            self.seed(LikeTarget::comment(comment.id.clone()), status).await;
        }
    }

    pub async fn fetch_status(&self, target: &LikeTarget) -> Result<LikeStatus, StoreError> {
        let envelope = match target {
            LikeTarget::Post(id) => self.service.post_status(id).await,
            LikeTarget::Comment(id) => self.service.comment_status(id).await,
        };
        let status = unwrap_data(envelope)?;
        self.seed(target.clone(), status).await;
        Ok(status)
    }

    /// Refresh many statuses at once; requests run concurrently
    pub async fn fetch_statuses(&self, targets: &[LikeTarget]) -> Vec<Result<LikeStatus, StoreError>> {
        join_all(targets.iter().map(|target| self.fetch_status(target))).await
    }

    /// Flip the like flag of `target`
    pub async fn toggle(&self, target: &LikeTarget) -> Result<LikeStatus, StoreError> {
        self.dispatch(target, |status| LikeCommand::toggle(status.is_liked))
            .await
    }

    /// Send an explicit like or unlike
    pub async fn apply(&self, target: &LikeTarget, command: LikeCommand) -> Result<LikeStatus, StoreError> {
        self.dispatch(target, |_| command).await
    }

    async fn dispatch(
        &self,
        target: &LikeTarget,
        resolve: impl FnOnce(LikeStatus) -> LikeCommand,
    ) -> Result<LikeStatus, StoreError> {
        let (ticket, command, base) = {
            let mut state = self.state.write().await;
            let snapshot = state.statuses.get(target).copied();
            let base = snapshot.unwrap_or_default();
            let command = resolve(base);
            state.statuses.insert(target.clone(), command.apply(base));
            state.errors.remove(target);
            let ticket = state.ledger.begin(target.clone(), snapshot);
            (ticket, command, base)
        };
        tracing::debug!("[STORE] {:?} {:?}", command, target);

        let envelope: ApiEnvelope<LikeStatus> = match target {
            LikeTarget::Post(id) => self.service.post(id, command).await,
            LikeTarget::Comment(id) => self.service.comment(id, command).await,
        };

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(reported) => {
                let confirmed = reported.unwrap_or_else(|| command.apply(base));
                if let Some(snapshot) = state.ledger.confirm(&ticket, Some(confirmed)).into_value() {
                    state.restore(target, snapshot);
                }
                Ok(confirmed)
            }
            Err(message) => {
                tracing::warn!("[STORE] {:?} of {:?} failed, rolling back: {}", command, target, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.restore(target, snapshot);
                }
                state.errors.insert(target.clone(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }
}
