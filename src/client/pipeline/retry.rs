//! # Retry Classification and Backoff
//!
//! Decides what a single physical attempt means for the logical call and how long to
//! wait before the next one.
//!
//! ## Classification
//!
//! - **Success**: any 2xx
//! - **Unauthorized**: 401, handed to the refresh stage
//! - **Retryable**: no response (network error, timeout), 5xx, 408, 429
//! - **Terminal**: everything else, including a request that could not be built
//!
//! ## Backoff
//!
//! Exponential by default: `delay = base × 2^attempt_index`, so with the default base
//! of one second the waits are 1 s, 2 s, 4 s.

use crate::client::transport::{RawResponse, TransportError};
use crate::shared::config::ClientConfig;
use reqwest::StatusCode;
use std::time::Duration;

/// What a physical attempt means for the logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Unauthorized,
    Retryable,
    Terminal,
}

impl AttemptOutcome {
    pub fn classify(result: &Result<RawResponse, TransportError>) -> Self {
        match result {
            Err(e) if e.is_retryable() => Self::Retryable,
            Err(_) => Self::Terminal,
            Ok(response) => Self::from_status(response.status),
        }
    }

    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized
        } else if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            Self::Retryable
        } else {
            Self::Terminal
        }
    }
}

/// Backoff strategy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed { interval: Duration },
    /// `base × 2^attempt_index`, optionally capped
    Exponential { base: Duration, max: Option<Duration> },
}

impl BackoffStrategy {
    pub fn delay(&self, attempt_index: u32) -> Duration {
        match self {
            Self::Fixed { interval } => *interval,
            Self::Exponential { base, max } => {
                let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
                let delay = base.saturating_mul(factor);
                match max {
                    Some(max) => delay.min(*max),
                    None => delay,
                }
            }
        }
    }
}

/// Retry budget plus backoff for one logical call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Exponential {
                base: base_delay,
                max: None,
            },
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay)
    }

    /// Never retry
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Whether another attempt is allowed after `retry_count` retries
    pub fn allows_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Wait before retry number `retry_count + 1`
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.backoff.delay(retry_count)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
