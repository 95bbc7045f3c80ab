use crate::shared::error::SharedError;
use crate::shared::models::user::Author;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication state of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// A blog/news post as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<Author>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub media: Vec<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub views: u64,
    pub is_liked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
}

impl PostDraft {
    /// Local precondition checked before the draft is sent
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.title.trim().is_empty() {
            return Err(SharedError::validation("title", "Post title cannot be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(SharedError::validation("content", "Post content cannot be empty"));
        }
        Ok(())
    }
}

/// Partial update of a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl PostUpdate {
    /// Apply the patch speculatively to a local copy
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(excerpt) = &self.excerpt {
            post.excerpt = Some(excerpt.clone());
        }
        if let Some(cover) = &self.cover_image {
            post.cover_image = Some(cover.clone());
        }
        if let Some(category) = &self.category {
            post.category = Some(category.clone());
        }
        if let Some(tags) = &self.tags {
            post.tags = tags.clone();
        }
        if let Some(status) = self.status {
            post.status = status;
        }
    }
}

/// List filters, persisted by the post store across reloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostFilters {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
}

/// Query for `GET /api/posts`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filters: PostFilters,
}

impl PostQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            filters: PostFilters::default(),
        }
    }

    /// Query-string pairs in a stable order, omitting unset values
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        let filters = &self.filters;
        let text_filters = [
            ("category", &filters.category),
            ("tag", &filters.tag),
            ("search", &filters.search),
            ("author", &filters.author),
        ];
        for (key, value) in text_filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        if let Some(status) = filters.status {
            let status = match status {
                PostStatus::Draft => "draft",
                PostStatus::Published => "published",
                PostStatus::Archived => "archived",
            };
            pairs.push(("status".to_string(), status.to_string()));
        }
        pairs
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page of posts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}
