//! User Store
//!
//! Profiles keyed by user id, plus follower/following lists. Follow toggles and
//! profile edits are optimistic.

use crate::client::services::{FollowCommand, UserService};
use crate::client::stores::optimistic::OptimisticLedger;
use crate::client::stores::posts::unwrap_data;
use crate::client::stores::StoreError;
use crate::shared::models::{ProfileUpdate, SocialLinks, User};
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct UserState {
    profiles: HashMap<String, User>,
    followers: HashMap<String, Vec<User>>,
    following: HashMap<String, Vec<User>>,
    error: Option<String>,
    errors: HashMap<String, String>,
    ledger: OptimisticLedger<String, Option<User>>,
}

impl UserState {
    fn restore(&mut self, id: &str, snapshot: Option<User>) {
        match snapshot {
            Some(user) => {
                self.profiles.insert(id.to_string(), user);
            }
            None => {
                self.profiles.remove(id);
            }
        }
    }
}

pub struct UserStore {
    service: UserService,
    state: RwLock<UserState>,
}

impl UserStore {
    pub fn new(service: UserService) -> Self {
        Self {
            service,
            state: RwLock::new(UserState::default()),
        }
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.state.read().await.profiles.get(id).cloned()
    }

    pub async fn user_by_username(&self, username: &str) -> Option<User> {
        let state = self.state.read().await;
        state
            .profiles
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    pub async fn followers(&self, id: &str) -> Vec<User> {
        self.state
            .read()
            .await
            .followers
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn following(&self, id: &str) -> Vec<User> {
        self.state
            .read()
            .await
            .following
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn entity_error(&self, id: &str) -> Option<String> {
        self.state.read().await.errors.get(id).cloned()
    }

    pub async fn is_pending(&self, id: &str) -> bool {
        self.state.read().await.ledger.is_pending(&id.to_string())
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<User, StoreError> {
        let result = unwrap_data(self.service.profile(username).await);
        let mut state = self.state.write().await;
        match result {
            Ok(user) => {
                if !state.ledger.is_pending(&user.id) {
                    state.profiles.insert(user.id.clone(), user.clone());
                }
                state.error = None;
                Ok(user)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_followers(&self, id: &str) -> Result<Vec<User>, StoreError> {
        let users = unwrap_data(self.service.followers(id).await)?;
        self.state
            .write()
            .await
            .followers
            .insert(id.to_string(), users.clone());
        Ok(users)
    }

    pub async fn fetch_following(&self, id: &str) -> Result<Vec<User>, StoreError> {
        let users = unwrap_data(self.service.following(id).await)?;
        self.state
            .write()
            .await
            .following
            .insert(id.to_string(), users.clone());
        Ok(users)
    }

    /// Flip the follow state of user `id`
    pub async fn toggle_follow(&self, id: &str) -> Result<User, StoreError> {
        let is_following = self
            .user(id)
            .await
            .ok_or_else(|| not_found(id))?
            .is_following;
        self.follow(id, FollowCommand::toggle(is_following)).await
    }

    /// Follow or unfollow user `id`, adjusting the follower count
    pub async fn follow(&self, id: &str, command: FollowCommand) -> Result<User, StoreError> {
        let (ticket, base) = {
            let mut state = self.state.write().await;
            let Some(base) = state.profiles.get(id).cloned() else {
                return Err(not_found(id));
            };
            let mut speculative = base.clone();
            speculative.apply_follow_status(command.apply(base.follow_status()));
            state.profiles.insert(id.to_string(), speculative);
            state.errors.remove(id);
            let ticket = state.ledger.begin(id.to_string(), Some(base.clone()));
            (ticket, base)
        };

        let envelope = self.service.follow(id, command).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(reported) => {
                let mut confirmed = base.clone();
                let status = reported.unwrap_or_else(|| command.apply(base.follow_status()));
                confirmed.apply_follow_status(status);
                if let Some(snapshot) = state
                    .ledger
                    .confirm(&ticket, Some(confirmed.clone()))
                    .into_value()
                {
                    state.restore(id, snapshot);
                }
                Ok(confirmed)
            }
            Err(message) => {
                tracing::warn!("[STORE] {:?} of user {} failed, rolling back: {}", command, id, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    /// Optimistically edit the signed-in user's profile (`id` is their user id).
    ///
    /// The profile must be loaded; a success without a returned profile confirms
    /// the edited copy.
    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User, StoreError> {
        let (ticket, applied) = {
            let mut state = self.state.write().await;
            let Some(base) = state.profiles.get(id).cloned() else {
                return Err(not_found(id));
            };
            let mut applied = base.clone();
            update.apply_to(&mut applied);
            state.profiles.insert(id.to_string(), applied.clone());
            state.errors.remove(id);
            let ticket = state.ledger.begin(id.to_string(), Some(base));
            (ticket, applied)
        };

        let envelope = self.service.update_profile(&update).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(reported) => {
                let confirmed = reported.unwrap_or(applied);
                if let Some(snapshot) = state
                    .ledger
                    .confirm(&ticket, Some(confirmed.clone()))
                    .into_value()
                {
                    state.restore(id, snapshot);
                }
                Ok(confirmed)
            }
            Err(message) => {
                tracing::warn!("[STORE] Profile update failed, rolling back: {}", message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    pub async fn update_social_links(&self, links: &SocialLinks) -> Result<User, StoreError> {
        let user = unwrap_data(self.service.update_social_links(links).await)?;
        self.remember(&user).await;
        Ok(user)
    }

    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<User, StoreError> {
        let user = unwrap_data(self.service.upload_avatar(file_name, mime, bytes).await)?;
        self.remember(&user).await;
        Ok(user)
    }

    async fn remember(&self, user: &User) {
        let mut state = self.state.write().await;
        if !state.ledger.is_pending(&user.id) {
            state.profiles.insert(user.id.clone(), user.clone());
        }
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "user",
        id: id.to_string(),
    }
}
