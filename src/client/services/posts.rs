//! Post Service

use crate::client::pipeline::ApiClient;
use crate::client::services::{call, call_empty, with_json};
use crate::client::transport::{ApiRequest, MultipartPart};
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{Pagination, Post, PostDraft, PostPage, PostQuery, PostUpdate};
use serde::Deserialize;
use std::sync::Arc;

/// List endpoints answer with a page object or, on older servers, a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody {
    List(Vec<Post>),
    Page(PostPage),
}

impl From<PageBody> for PostPage {
    fn from(body: PageBody) -> Self {
        match body {
            PageBody::Page(page) => page,
            PageBody::List(posts) => {
                let total = posts.len() as u64;
                PostPage {
                    posts,
                    pagination: Pagination {
                        total,
                        total_pages: 1,
                        ..Pagination::default()
                    },
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostService {
    client: Arc<ApiClient>,
}

impl PostService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PostQuery) -> ApiEnvelope<PostPage> {
        let request = ApiRequest::get("/api/posts").query(query.to_pairs());
        call::<PageBody>(&self.client, request)
            .await
            .map(PostPage::from)
    }

    pub async fn get(&self, id: &str) -> ApiEnvelope<Post> {
        call(&self.client, ApiRequest::get(format!("/api/posts/{}", id))).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> ApiEnvelope<Post> {
        call(&self.client, ApiRequest::get(format!("/api/posts/slug/{}", slug))).await
    }

    pub async fn create(&self, draft: &PostDraft) -> ApiEnvelope<Post> {
        if let Err(e) = draft.validate() {
            return ApiEnvelope::failure(e.to_string());
        }
        match with_json(ApiRequest::post("/api/posts"), draft) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn update(&self, id: &str, update: &PostUpdate) -> ApiEnvelope<Post> {
        match with_json(ApiRequest::put(format!("/api/posts/{}", id)), update) {
            Ok(request) => call(&self.client, request).await,
            Err(failure) => failure,
        }
    }

    pub async fn delete(&self, id: &str) -> ApiEnvelope<()> {
        call_empty(&self.client, ApiRequest::delete(format!("/api/posts/{}", id))).await
    }

    /// Upload media files; the server answers with the updated post
    pub async fn upload_media(&self, id: &str, files: Vec<MultipartPart>) -> ApiEnvelope<Post> {
        if files.is_empty() {
            return ApiEnvelope::failure("No media selected");
        }
        let request = ApiRequest::post(format!("/api/posts/{}/media", id)).multipart(files);
        call(&self.client, request).await
    }

    pub async fn categories(&self) -> ApiEnvelope<Vec<String>> {
        call(&self.client, ApiRequest::get("/api/posts/categories")).await
    }

    pub async fn tags(&self) -> ApiEnvelope<Vec<String>> {
        call(&self.client, ApiRequest::get("/api/posts/tags")).await
    }
}
