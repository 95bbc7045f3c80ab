use serde::{Deserialize, Serialize};

/// Compact author block embedded in posts and comments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

/// External profile links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

/// Full user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
    pub social_links: SocialLinks,
}

/// Partial update of the signed-in user's profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.display_name {
            user.display_name = Some(name.clone());
        }
        if let Some(bio) = &self.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
    }
}

/// Follow state of a profile as seen by the signed-in user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
    pub followers_count: u64,
}

impl User {
    pub fn follow_status(&self) -> FollowStatus {
        FollowStatus {
            is_following: self.is_following,
            followers_count: self.followers_count,
        }
    }

    pub fn apply_follow_status(&mut self, status: FollowStatus) {
        self.is_following = status.is_following;
        self.followers_count = status.followers_count;
    }
}
