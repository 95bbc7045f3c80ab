//! Comment Service

use crate::client::pipeline::ApiClient;
use crate::client::services::{call, call_empty, with_json};
use crate::client::transport::ApiRequest;
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{Comment, CommentUpdate, NewComment};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CommentService {
    client: Arc<ApiClient>,
}

impl CommentService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn for_post(&self, post_id: &str) -> ApiEnvelope<Vec<Comment>> {
        call(&self.client, ApiRequest::get(format!("/api/comments/post/{}", post_id))).await
    }

    /// Create a comment, or a reply when `parent_id` is set
    pub async fn create(&self, comment: &NewComment) -> ApiEnvelope<Comment> {
        if let Err(e) = comment.validate() {
            return ApiEnvelope::failure(e.to_string());
        }
        match with_json(ApiRequest::post("/api/comments"), comment) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn update(&self, id: &str, update: &CommentUpdate) -> ApiEnvelope<Comment> {
        if update.content.trim().is_empty() {
            return ApiEnvelope::failure("Comment cannot be empty");
        }
        match with_json(ApiRequest::put(format!("/api/comments/{}", id)), update) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn delete(&self, id: &str) -> ApiEnvelope<()> {
        call_empty(&self.client, ApiRequest::delete(format!("/api/comments/{}", id))).await
    }
}
