// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Agent-facing tool surface
//!
//! Thin wrappers that turn orchestrator results into serializable responses.
//! They never fail; problems are reported in the `error` field.

use serde::Serialize;
use tracing::{info, warn};

use super::orchestrator::{FallbackOrchestrator, ProviderAttempt};
use super::registry::{ProviderRegistry, ProviderStatus};
use super::tavily::TavilyProvider;
use super::types::{ContentItem, SearchTopic};

/// Reported as `source_used` when nothing was found
pub const NO_SOURCE: &str = "none";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchNewsResponse {
    pub items: Vec<ContentItem>,
    pub source_used: String,
    pub category: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: Vec<ProviderAttempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableSourcesResponse {
    pub available_sources: Vec<String>,
    pub total_sources: usize,
    pub sources_info: Vec<ProviderStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchNewsResponse {
    pub items: Vec<ContentItem>,
    pub query: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetch items for a category, with fallback unless `source` pins a provider
pub async fn fetch_news(
    orchestrator: &FallbackOrchestrator,
    category: &str,
    source: Option<&str>,
    max_items: usize,
) -> FetchNewsResponse {
    info!(
        "fetch_news called: category={}, source={:?}, max_items={}",
        category, source, max_items
    );

    let resolution = orchestrator.resolve(category, max_items, source).await;
    let error = resolution.miss_reason().map(|reason| {
        warn!("No items fetched for category '{}': {}", resolution.category, reason);
        format!("No items available: {}", reason)
    });

    FetchNewsResponse {
        count: resolution.items.len(),
        source_used: resolution
            .provider_used
            .unwrap_or_else(|| NO_SOURCE.to_string()),
        items: resolution.items,
        category: resolution.category,
        error,
        attempts: resolution.attempts,
    }
}

/// Describe the registered providers and which of them are usable now
pub fn available_sources(registry: &ProviderRegistry) -> AvailableSourcesResponse {
    let sources_info = registry.source_info();
    let available_sources = registry.available_providers();
    info!(
        "{}/{} sources available",
        available_sources.len(),
        sources_info.len()
    );

    AvailableSourcesResponse {
        available_sources,
        total_sources: sources_info.len(),
        sources_info,
    }
}

/// Free-text search through Tavily
pub async fn search_news(
    tavily: Option<&TavilyProvider>,
    query: &str,
    max_items: usize,
) -> SearchNewsResponse {
    info!("search_news called: query='{}', max_items={}", query, max_items);

    let result = match tavily {
        Some(tavily) => {
            tavily
                .search_custom(query, max_items, SearchTopic::General)
                .await
        }
        None => {
            warn!("Tavily search is not available");
            return SearchNewsResponse {
                items: Vec::new(),
                query: query.to_string(),
                count: 0,
                error: Some("Tavily search is not available (missing API key)".to_string()),
            };
        }
    };

    match result {
        Ok(items) => SearchNewsResponse {
            count: items.len(),
            items,
            query: query.to_string(),
            error: None,
        },
        Err(e) => {
            warn!("Error searching news: {}", e);
            SearchNewsResponse {
                items: Vec::new(),
                query: query.to_string(),
                count: 0,
                error: Some(e.to_string()),
            }
        }
    }
}
