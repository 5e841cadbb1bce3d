// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for content acquisition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single normalized content item produced by any provider
///
/// Items are value objects: once built they are only read and forwarded.
/// Deserialization goes through the same checks as [`ContentItem::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContentItem")]
pub struct ContentItem {
    title: String,
    url: Option<String>,
    description: Option<String>,
    source_name: String,
    category: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl ContentItem {
    /// Create a new item
    ///
    /// # Arguments
    /// * `title` - Display headline, must not be blank
    /// * `source_name` - Identifier of the producing provider
    /// * `category` - Category the item was fetched for
    ///
    /// # Returns
    /// The item, or `None` if the title is blank
    pub fn new(
        title: impl Into<String>,
        source_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            title,
            url: None,
            description: None,
            source_name: source_name.into(),
            category: category.into(),
            published_at: None,
            metadata: Map::new(),
        })
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Attach one provider-specific metadata field
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

#[derive(Deserialize)]
struct RawContentItem {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    source_name: String,
    category: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<RawContentItem> for ContentItem {
    type Error = String;

    fn try_from(raw: RawContentItem) -> Result<Self, Self::Error> {
        if raw.source_name.trim().is_empty() {
            return Err("content item source_name must not be blank".to_string());
        }
        if raw.category.trim().is_empty() {
            return Err("content item category must not be blank".to_string());
        }

        let mut item = ContentItem::new(raw.title, raw.source_name, raw.category)
            .ok_or_else(|| "content item title must not be blank".to_string())?
            .with_url(raw.url)
            .with_description(raw.description)
            .with_published_at(raw.published_at);
        item.metadata = raw.metadata;
        Ok(item)
    }
}

/// Listing window for discussion aggregators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl FromStr for TimeFilter {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(SourceError::InvalidQuery {
                reason: format!("unknown time filter '{}'", other),
            }),
        }
    }
}

/// Search topic for the AI search provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

impl SearchTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::News => "news",
        }
    }
}

/// How the tech aggregator obtains its stories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HnMethod {
    /// Parse the front page HTML
    #[default]
    Scrape,
    /// Use the public Firebase API
    Api,
}

/// Provider-specific per-call options
///
/// Every provider reads only the fields it understands and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_filter: Option<TimeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<SearchTopic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hn_method: Option<HnMethod>,
}

impl FetchOptions {
    /// Stable key fragment used by the fetch cache
    pub fn cache_fragment(&self) -> String {
        format!(
            "{}|{}|{}|{:?}",
            self.time_filter.map(|t| t.as_str()).unwrap_or("-"),
            self.topic.map(|t| t.as_str()).unwrap_or("-"),
            self.days.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            self.hn_method.unwrap_or_default(),
        )
    }
}

/// Errors raised by providers
///
/// Provider errors never cross the orchestrator boundary; they are converted
/// into attempt records.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// Provider cannot run at all
    #[error("Provider unavailable: {provider} ({reason})")]
    ProviderUnavailable { provider: String, reason: String },

    /// Provider asked for a category it does not declare
    #[error("Category '{category}' not supported by {provider}")]
    CategoryUnsupported { provider: String, category: String },

    /// No API key configured for the provider
    #[error("No API key configured for {provider}")]
    NoApiKey { provider: String },

    /// Transport failure before a response arrived
    #[error("Network error from {provider}: {message}")]
    Network { provider: String, message: String },

    /// Non-success HTTP status from upstream
    #[error("API error from {provider}: {status} - {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Upstream body could not be understood
    #[error("Malformed response from {provider}: {message}")]
    Parse { provider: String, message: String },

    /// Rate limited locally or by upstream
    #[error("{provider} rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    /// Request exceeded its time budget
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Invalid caller input
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl SourceError {
    /// Map a reqwest transport error for the given provider
    pub fn from_reqwest(provider: &str, err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
                timeout_ms,
            }
        } else if err.is_decode() {
            Self::Parse {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Map a non-success HTTP status for the given provider
    pub fn from_status(provider: &str, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            429 => Self::RateLimited {
                provider: provider.to_string(),
                retry_after_secs: 60,
            },
            401 | 403 => Self::NoApiKey {
                provider: provider.to_string(),
            },
            code => Self::ApiError {
                provider: provider.to_string(),
                status: code,
                message: body,
            },
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
