//! Shared Module
//!
//! Types that carry no runtime behavior: domain payloads, the result envelope,
//! client configuration and the shared error type. Everything here is plain data
//! and can be serialized, compared and cloned freely.

/// Domain payloads (posts, comments, users, likes, auth)
pub mod models;

/// Uniform `{success, data?, message?}` envelope
pub mod envelope;

/// Shared error types
pub mod error;

/// Client configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use envelope::ApiEnvelope;
pub use error::SharedError;
