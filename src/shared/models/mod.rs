//! Domain payloads exchanged with the news platform API.
//!
//! Field names follow the server's camelCase JSON. Server-derived fields
//! (timestamps, counts, flags) default when absent so partial responses still decode.

pub mod auth;
pub mod comment;
pub mod like;
pub mod post;
pub mod user;

pub use auth::{
    AuthPayload, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    TokenPair,
};
pub use comment::{Comment, CommentUpdate, NewComment};
pub use like::LikeStatus;
pub use post::{Pagination, Post, PostDraft, PostFilters, PostPage, PostQuery, PostStatus, PostUpdate};
pub use user::{Author, FollowStatus, ProfileUpdate, SocialLinks, User};
