// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-provider request rate limiting

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::types::SourceError;

/// Rate limiter guarding one provider's upstream quota
pub struct ProviderRateLimiter {
    limiter: Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    provider: &'static str,
    requests_per_minute: u32,
}

impl ProviderRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `provider` - Provider the budget belongs to, used in errors
    /// * `requests_per_minute` - Maximum requests allowed per minute (0 means 60)
    pub fn new(provider: &'static str, requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN.saturating_add(59));
        let quota = Quota::per_minute(rpm);
        let limiter = Arc::new(GovRateLimiter::direct(quota));

        Self {
            limiter,
            provider,
            requests_per_minute: rpm.get(),
        }
    }

    /// Check if a request is allowed
    ///
    /// Returns Ok(()) if allowed, or SourceError::RateLimited if not
    pub fn check(&self) -> Result<(), SourceError> {
        self.limiter
            .check()
            .map_err(|_| SourceError::RateLimited {
                provider: self.provider.to_string(),
                retry_after_secs: 60,
            })
    }

    /// Get the configured requests per minute
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}
