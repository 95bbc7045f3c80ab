use crate::shared::error::SharedError;
use crate::shared::models::user::Author;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a post, optionally replying to another comment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "post")]
    pub post_id: String,
    pub content: String,
    pub author: Option<Author>,
    pub parent_id: Option<String>,
    pub likes_count: u64,
    pub is_liked: bool,
    pub is_edited: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /api/comments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.content.trim().is_empty() {
            return Err(SharedError::validation("content", "Comment cannot be empty"));
        }
        Ok(())
    }
}

/// Payload for `PUT /api/comments/:id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentUpdate {
    pub content: String,
}

impl CommentUpdate {
    pub fn apply_to(&self, comment: &mut Comment) {
        comment.content = self.content.clone();
        comment.is_edited = true;
    }
}
