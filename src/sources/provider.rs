// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content provider trait definition

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use super::types::{ContentItem, FetchOptions, SourceError};

/// Trait for implementing content providers
///
/// Providers wrap one external content source. Several providers can serve
/// the same category; the orchestrator tries them in priority order.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider identifier used for routing, attribution and logging
    fn name(&self) -> &'static str;

    /// Categories this provider can serve. Known without any I/O.
    fn supported_categories(&self) -> &[&'static str];

    /// Check if the provider is usable (credential present, client built)
    ///
    /// Must never touch the network; it is queried often and speculatively.
    fn is_available(&self) -> bool;

    /// Human-readable explanation when `is_available` is false
    fn unavailable_reason(&self) -> Option<String> {
        None
    }

    /// Fetch up to `max_items` items for `category`
    ///
    /// # Arguments
    /// * `category` - A category from `supported_categories`
    /// * `max_items` - Upper bound on the result length
    /// * `options` - Provider-specific knobs; unknown fields are ignored
    ///
    /// # Returns
    /// Items in provider order (possibly empty), or a typed failure
    async fn fetch(
        &self,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError>;

    /// Check whether a category is declared
    fn supports_category(&self, category: &str) -> bool {
        self.supported_categories().iter().any(|c| *c == category)
    }

    /// Fail fast on unsupported categories or an unavailable provider
    fn ensure_can_fetch(&self, category: &str) -> Result<(), SourceError> {
        if !self.supports_category(category) {
            return Err(SourceError::CategoryUnsupported {
                provider: self.name().to_string(),
                category: category.to_string(),
            });
        }
        if !self.is_available() {
            return Err(SourceError::ProviderUnavailable {
                provider: self.name().to_string(),
                reason: self
                    .unavailable_reason()
                    .unwrap_or_else(|| "not available".to_string()),
            });
        }
        Ok(())
    }
}

/// Build the HTTP client a provider owns
pub(crate) fn http_client(
    provider: &str,
    user_agent: &str,
    timeout_ms: u64,
) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: format!("failed to create HTTP client: {}", e),
        })
}

/// Send a request and turn transport errors and non-2xx statuses into `SourceError`
pub(crate) async fn send_checked(
    provider: &str,
    request: RequestBuilder,
    timeout_ms: u64,
) -> Result<Response, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(provider, &e, timeout_ms))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(provider, status, body));
    }

    Ok(response)
}
