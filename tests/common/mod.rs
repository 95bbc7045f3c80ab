//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A scripted in-memory transport
//! - Client, session and entity fixtures
//! - Custom assertion macros

pub mod assertions;
pub mod fixtures;

// Re-export commonly used utilities
pub use fake_transport::*;
pub use fixtures::*;
