//! Pressroom - News Platform Client Library
//!
//! Pressroom is the client core of a news/blog platform: an authenticated REST
//! pipeline with token refresh and retry, typed domain services, and state stores
//! that apply changes optimistically and roll them back when the server disagrees.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - Domain models (posts, comments, likes, users, auth payloads)
//!   - The `{ success, data?, message? }` result envelope
//!   - Client configuration and shared error types
//!
//! - **`client`** - The runtime core
//!   - Persistence port and token store
//!   - HTTP transport and the authenticated request pipeline
//!   - Domain services and optimistic state stores
//!
//! # Usage
//!
//! ```rust,no_run
//! use pressroom::client::{FileStorage, Pressroom};
//! use pressroom::shared::models::LoginRequest;
//! use pressroom::shared::ClientConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(FileStorage::open(FileStorage::default_location()?)?);
//! let pressroom = Pressroom::connect(ClientConfig::from_env()?, storage)?;
//!
//! pressroom
//!     .auth
//!     .login(&LoginRequest {
//!         email: "ada@example.com".into(),
//!         password: "hunter2".into(),
//!     })
//!     .await?;
//! pressroom.posts.fetch_posts(1).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Everything runs on tokio. One `ApiClient` is shared (via `Arc`) by all services;
//! concurrent calls that hit an expired token share a single refresh. Store state sits
//! behind `tokio::sync::RwLock`, and each optimistic write-back is one locked
//! replacement.
//!
//! # Error Handling
//!
//! - `ApiError` is the terminal outcome of a pipeline call
//! - services never fail; they return failure envelopes
//! - stores return `StoreError` and keep the message in their error slots

/// Shared types and data structures
pub mod shared;

/// Pipeline, services and stores
pub mod client;
