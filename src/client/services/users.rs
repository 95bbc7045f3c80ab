//! User Service
//!
//! Profiles, follows, social links and avatars. Like likes, follows take an explicit
//! [`FollowCommand`].

use crate::client::pipeline::ApiClient;
use crate::client::services::{call, call_status, with_json};
use crate::client::transport::{ApiRequest, MultipartPart};
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{FollowStatus, ProfileUpdate, SocialLinks, User};
use bytes::Bytes;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowCommand {
    Follow,
    Unfollow,
}

impl FollowCommand {
    /// The command that flips `is_following`
    pub fn toggle(is_following: bool) -> Self {
        if is_following {
            Self::Unfollow
        } else {
            Self::Follow
        }
    }

    /// Status after this command succeeds, when the server does not report one
    pub fn apply(self, status: FollowStatus) -> FollowStatus {
        match self {
            Self::Follow if !status.is_following => FollowStatus {
                is_following: true,
                followers_count: status.followers_count + 1,
            },
            Self::Unfollow if status.is_following => FollowStatus {
                is_following: false,
                followers_count: status.followers_count.saturating_sub(1),
            },
            _ => status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserService {
    client: Arc<ApiClient>,
}

impl UserService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn profile(&self, username: &str) -> ApiEnvelope<User> {
        call(&self.client, ApiRequest::get(format!("/api/users/{}", username))).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiEnvelope<User> {
        match with_json(ApiRequest::put("/api/users/profile"), update) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    /// `POST|DELETE /api/users/:id/follow`.
    ///
    /// `data` is `None` when the server answers without a follow status.
    pub async fn follow(&self, user_id: &str, command: FollowCommand) -> ApiEnvelope<FollowStatus> {
        let path = format!("/api/users/{}/follow", user_id);
        let request = match command {
            FollowCommand::Follow => ApiRequest::post(path),
            FollowCommand::Unfollow => ApiRequest::delete(path),
        };
        call_status(&self.client, request).await
    }

    pub async fn followers(&self, user_id: &str) -> ApiEnvelope<Vec<User>> {
        call(&self.client, ApiRequest::get(format!("/api/users/{}/followers", user_id))).await
    }

    pub async fn following(&self, user_id: &str) -> ApiEnvelope<Vec<User>> {
        call(&self.client, ApiRequest::get(format!("/api/users/{}/following", user_id))).await
    }

    pub async fn update_social_links(&self, links: &SocialLinks) -> ApiEnvelope<User> {
        match with_json(ApiRequest::put("/api/users/social-links"), links) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime: &str,
        bytes: impl Into<Bytes>,
    ) -> ApiEnvelope<User> {
        let part = MultipartPart::file("avatar", file_name, mime, bytes);
        call(
            &self.client,
            ApiRequest::post("/api/users/avatar").multipart(vec![part]),
        )
        .await
    }
}
