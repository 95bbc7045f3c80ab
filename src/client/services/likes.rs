//! Like Service
//!
//! Likes are driven by an explicit [`LikeCommand`]; deciding between like and unlike
//! from the current flag is the caller's job ([`LikeCommand::toggle`]).

use crate::client::pipeline::ApiClient;
use crate::client::services::{call, call_status, with_json};
use crate::client::transport::ApiRequest;
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::LikeStatus;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeCommand {
    Like,
    Unlike,
}

impl LikeCommand {
    /// The command that flips `is_liked`
    pub fn toggle(is_liked: bool) -> Self {
        if is_liked {
            Self::Unlike
        } else {
            Self::Like
        }
    }

    /// Status after this command succeeds, when the server does not report one
    pub fn apply(self, status: LikeStatus) -> LikeStatus {
        match self {
            Self::Like if !status.is_liked => LikeStatus {
                count: status.count + 1,
                is_liked: true,
            },
            Self::Unlike if status.is_liked => LikeStatus {
                count: status.count.saturating_sub(1),
                is_liked: false,
            },
            _ => status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LikeService {
    client: Arc<ApiClient>,
}

impl LikeService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `POST /api/likes/posts` or `DELETE /api/likes/posts/:postId`.
    ///
    /// `data` is `None` when the server answers without a like status.
    pub async fn post(&self, post_id: &str, command: LikeCommand) -> ApiEnvelope<LikeStatus> {
        let request = match command {
            LikeCommand::Like => {
                match with_json(ApiRequest::post("/api/likes/posts"), &json!({ "postId": post_id })) {
                    Ok(request) => request,
                    Err(failure) => return failure,
                }
            }
            LikeCommand::Unlike => ApiRequest::delete(format!("/api/likes/posts/{}", post_id)),
        };
        call_status(&self.client, request).await
    }

    /// `POST|DELETE /api/likes/comments/:id`
    pub async fn comment(&self, comment_id: &str, command: LikeCommand) -> ApiEnvelope<LikeStatus> {
        let path = format!("/api/likes/comments/{}", comment_id);
        let request = match command {
            LikeCommand::Like => ApiRequest::post(path),
            LikeCommand::Unlike => ApiRequest::delete(path),
        };
        call_status(&self.client, request).await
    }

    pub async fn like_post(&self, post_id: &str) -> ApiEnvelope<LikeStatus> {
        self.post(post_id, LikeCommand::Like).await
    }

    pub async fn unlike_post(&self, post_id: &str) -> ApiEnvelope<LikeStatus> {
        self.post(post_id, LikeCommand::Unlike).await
    }

    pub async fn like_comment(&self, comment_id: &str) -> ApiEnvelope<LikeStatus> {
        self.comment(comment_id, LikeCommand::Like).await
    }

    pub async fn unlike_comment(&self, comment_id: &str) -> ApiEnvelope<LikeStatus> {
        self.comment(comment_id, LikeCommand::Unlike).await
    }

    pub async fn post_status(&self, post_id: &str) -> ApiEnvelope<LikeStatus> {
        call(&self.client, ApiRequest::get(format!("/api/likes/posts/{}/count", post_id))).await
    }

    pub async fn comment_status(&self, comment_id: &str) -> ApiEnvelope<LikeStatus> {
        call(
            &self.client,
            ApiRequest::get(format!("/api/likes/comments/{}/count", comment_id)),
        )
        .await
    }
}
