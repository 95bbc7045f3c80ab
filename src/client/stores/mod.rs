//! # Client State Stores
//!
//! Canonical in-memory copies of domain entities, mutated only through store actions.
//!
//! | Store | Holds | Optimistic actions |
//! |---|---|---|
//! | [`PostStore`] | post list, current post, categories, tags, filters, pagination | update, delete |
//! | [`CommentStore`] | comments per post | update, delete |
//! | [`LikeStore`] | like status per post/comment | like, unlike, toggle |
//! | [`UserStore`] | profiles, followers, following | follow, unfollow, profile update |
//! | [`AuthStore`] | signed-in identity | none |
//!
//! Optimistic actions change visible state before the request goes out and settle
//! through an [`OptimisticLedger`](optimistic::OptimisticLedger). A failed action
//! restores the entity in one replacement, records the message in the entity's error
//! slot and returns [`StoreError::Rejected`].
//!
//! State lives behind a `tokio::sync::RwLock`; readers get clones.

pub mod auth;
pub mod comments;
pub mod likes;
pub mod optimistic;
pub mod posts;
pub mod users;

pub use auth::AuthStore;
pub use comments::CommentStore;
pub use likes::{LikeStore, LikeTarget};
pub use optimistic::{EntityList, Identified, MutationTicket, OptimisticLedger, Resolution, Slot};
pub use posts::PostStore;
pub use users::UserStore;

use crate::client::storage::{save_json, Storage};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The server (or local validation) rejected the action
    #[error("{0}")]
    Rejected(String),

    #[error("{kind} '{id}' is not loaded")]
    NotFound { kind: &'static str, id: String },
}

impl StoreError {
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected(message.unwrap_or_else(|| "Request failed".to_string()))
    }
}

/// Write a persisted subset, logging instead of failing the action
pub(crate) fn persist<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    if let Err(e) = save_json(storage, key, value) {
        tracing::warn!("[STORE] Failed to persist '{}': {}", key, e);
    }
}
