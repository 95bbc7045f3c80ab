use serde::{Deserialize, Serialize};

/// Like count and the viewer's own like flag for a post or comment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    #[serde(alias = "likesCount", alias = "likes")]
    pub count: u64,
    #[serde(alias = "liked")]
    pub is_liked: bool,
}
