//! News Platform Client
//!
//! Everything between the view layer and the network.
//!
//! # Architecture
//!
//! - **`storage`** - Persistence port (`Storage` trait, memory and file backends)
//! - **`token_store`** - Access/refresh token session
//! - **`transport`** - One physical HTTP attempt (`HttpTransport`, reqwest backend)
//! - **`pipeline`** - `ApiClient`: bearer auth, retry with backoff, single-flight refresh
//! - **`services`** - Per-resource request builders returning `ApiEnvelope`s
//! - **`stores`** - In-memory state with optimistic mutations
//!
//! Data flows view → store action → service → pipeline → transport, and results flow
//! back into the store.
//!
//! # Example
//!
//! ```rust,no_run
//! use pressroom::client::{MemoryStorage, Pressroom};
//! use pressroom::shared::ClientConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pressroom = Pressroom::connect(ClientConfig::default(), Arc::new(MemoryStorage::new()))?;
//! let page = pressroom.posts.fetch_posts(1).await?;
//! println!("{} posts", page.posts.len());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod services;
pub mod storage;
pub mod stores;
pub mod token_store;
pub mod transport;

// Re-export commonly used types
pub use pipeline::{ApiClient, ApiClientBuilder, ApiError, SessionObserver};
pub use services::{
    AuthService, CommentService, FollowCommand, LikeCommand, LikeService, PostService, UserService,
};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use stores::{AuthStore, CommentStore, LikeStore, LikeTarget, PostStore, StoreError, UserStore};
pub use token_store::{Session, TokenStore};
pub use transport::{ApiRequest, HttpTransport, RawResponse, ReqwestTransport, RequestOptions, TransportError};

use crate::shared::config::ClientConfig;
use std::sync::Arc;

/// One fully wired client: a pipeline plus every store on top of it
pub struct Pressroom {
    pub api: Arc<ApiClient>,
    pub auth: AuthStore,
    pub posts: PostStore,
    pub comments: CommentStore,
    pub likes: LikeStore,
    pub users: UserStore,
}

impl Pressroom {
    /// Wire stores around an existing pipeline
    pub fn new(api: Arc<ApiClient>, storage: Arc<dyn Storage>) -> Self {
        Self {
            auth: AuthStore::new(AuthService::new(api.clone()), storage.clone()),
            posts: PostStore::new(PostService::new(api.clone()), storage),
            comments: CommentStore::new(CommentService::new(api.clone())),
            likes: LikeStore::new(LikeService::new(api.clone())),
            users: UserStore::new(UserService::new(api.clone())),
            api,
        }
    }

    /// Build a reqwest-backed pipeline whose session and store state live in `storage`
    pub fn connect(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, TransportError> {
        let api = ApiClient::builder(config).storage(storage.clone()).build()?;
        Ok(Self::new(Arc::new(api), storage))
    }
}
