// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tavily AI search provider
//!
//! Category requests are answered by running a few canned queries per
//! category. `search_custom` exposes free-text search outside the category
//! system. Requires an API key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::provider::{http_client, send_checked, ContentProvider};
use super::rate_limiter::ProviderRateLimiter;
use super::text::{collapse_whitespace, truncate_chars};
use super::types::{ContentItem, FetchOptions, SearchTopic, SourceError};

pub const NAME: &str = "tavily";
pub const DEFAULT_API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Category used for items returned by free-text search
pub const CUSTOM_CATEGORY: &str = "custom";

const CATEGORIES: &[&str] = &["tech", "science", "news", "fun", "ai"];
const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const DESCRIPTION_CHARS: usize = 300;

/// Canned search queries for a category
pub fn category_queries(category: &str) -> &'static [&'static str] {
    match category {
        "tech" => &["latest technology news", "AI breakthroughs", "new tech products"],
        "science" => &[
            "recent scientific discoveries",
            "space exploration news",
            "medical breakthroughs",
        ],
        "news" => &["breaking news today", "world news", "current events"],
        "fun" => &["interesting facts", "unusual discoveries", "amazing stories"],
        "ai" => &[
            "artificial intelligence news",
            "machine learning advances",
            "AI research",
        ],
        _ => &[],
    }
}

/// AI web-search provider backed by the Tavily API
pub struct TavilyProvider {
    api_key: Option<String>,
    api_key_env: String,
    client: Client,
    rate_limiter: ProviderRateLimiter,
    timeout_ms: u64,
}

impl TavilyProvider {
    /// Create a new Tavily provider
    ///
    /// # Arguments
    /// * `api_key` - Tavily key; the provider is unavailable without one
    /// * `api_key_env` - Variable the key was read from, for diagnostics
    /// * `user_agent` - User-Agent header
    /// * `timeout_ms` - Per-request timeout
    /// * `requests_per_minute` - Local request budget
    pub fn new(
        api_key: Option<String>,
        api_key_env: &str,
        user_agent: &str,
        timeout_ms: u64,
        requests_per_minute: u32,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: api_key_env.to_string(),
            client: http_client(NAME, user_agent, timeout_ms)?,
            rate_limiter: ProviderRateLimiter::new(NAME, requests_per_minute),
            timeout_ms,
        })
    }

    /// Run a free-text search, independent of categories
    ///
    /// Items carry the `custom` category.
    pub async fn search_custom(
        &self,
        query: &str,
        max_results: usize,
        topic: SearchTopic,
    ) -> Result<Vec<ContentItem>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SourceError::InvalidQuery {
                reason: "query must not be empty".to_string(),
            });
        }
        if !self.is_available() {
            return Err(SourceError::NoApiKey {
                provider: NAME.to_string(),
            });
        }

        info!("Tavily custom search: {}", query);
        let results = self.search(query, max_results, topic, None).await?;
        let items = results_to_items(results, query, topic, CUSTOM_CATEGORY, max_results);
        info!("Tavily custom search returned {} items", items.len());
        Ok(items)
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        topic: SearchTopic,
        days: Option<u32>,
    ) -> Result<Vec<TavilyResult>, SourceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| SourceError::NoApiKey {
            provider: NAME.to_string(),
        })?;
        self.rate_limiter.check()?;

        let body = TavilyRequest {
            api_key,
            query,
            search_depth: "basic",
            topic: topic.as_str(),
            max_results,
            // The API only honours `days` for news searches
            days: days.filter(|_| topic == SearchTopic::News),
        };

        let request = self.client.post(TAVILY_API_URL).json(&body);
        let response: TavilyResponse = send_checked(NAME, request, self.timeout_ms)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse {
                provider: NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(response.results)
    }
}

#[async_trait]
impl ContentProvider for TavilyProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supported_categories(&self) -> &[&'static str] {
        CATEGORIES
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn unavailable_reason(&self) -> Option<String> {
        if self.is_available() {
            None
        } else {
            Some(format!("{} not set", self.api_key_env))
        }
    }

    async fn fetch(
        &self,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.ensure_can_fetch(category)?;

        let topic = options.topic.unwrap_or_default();
        let queries = category_queries(category);
        let per_query = (max_items / queries.len().max(1)).max(1);

        let mut items = Vec::new();
        let mut first_error = None;
        let mut any_succeeded = false;

        for query in queries {
            info!("Tavily searching for: {}", query);
            match self.search(query, per_query, topic, options.days).await {
                Ok(results) => {
                    any_succeeded = true;
                    items.extend(results_to_items(results, query, topic, category, per_query));
                }
                Err(e) => {
                    warn!("Tavily error searching for '{}': {}", query, e);
                    first_error.get_or_insert(e);
                }
            }

            if items.len() >= max_items {
                break;
            }
        }

        if !any_succeeded {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        items.truncate(max_items);
        info!(
            "Fetched {} Tavily items for category '{}'",
            items.len(),
            category
        );
        Ok(items)
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    topic: &'static str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    published_date: Option<String>,
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn results_to_items(
    results: Vec<TavilyResult>,
    query: &str,
    topic: SearchTopic,
    category: &str,
    limit: usize,
) -> Vec<ContentItem> {
    results
        .into_iter()
        .take(limit)
        .filter_map(|r| {
            let title = r
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| query.to_string());
            let description = r
                .content
                .map(|c| truncate_chars(&collapse_whitespace(&c), DESCRIPTION_CHARS));
            let published_at = r.published_date.as_deref().and_then(parse_published);

            ContentItem::new(title, NAME, category).map(|item| {
                item.with_url(r.url)
                    .with_description(description)
                    .with_published_at(published_at)
                    .with_metadata("query", query)
                    .with_metadata("topic", topic.as_str())
                    .with_metadata("score", r.score.unwrap_or(0.0))
            })
        })
        .collect()
}
