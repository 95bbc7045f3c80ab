//! Test suite for Pressroom
//!
//! - `common` - scripted transport, fixtures and assertion macros
//! - `integration` - pipeline, services and stores end to end
//! - `property` - backoff schedule and optimistic ordering invariants

pub mod common;
pub mod integration;
pub mod property;
