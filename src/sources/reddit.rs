// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reddit provider
//!
//! Read-only access to public subreddit listings. Each category maps to a
//! handful of subreddits; items are spread evenly across them.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::provider::{http_client, send_checked, ContentProvider};
use super::rate_limiter::ProviderRateLimiter;
use super::text::{html_decode, truncate_chars};
use super::types::{ContentItem, FetchOptions, SourceError, TimeFilter};

pub const NAME: &str = "reddit";

const CATEGORIES: &[&str] = &["tech", "science", "fun", "news", "startup"];
const REDDIT_BASE_URL: &str = "https://www.reddit.com";
const SELFTEXT_PREVIEW_CHARS: usize = 200;

/// Subreddits consulted for a category, in order
pub fn subreddits_for(category: &str) -> &'static [&'static str] {
    match category {
        "tech" => &["technology", "programming", "artificial"],
        "science" => &["science", "askscience", "space"],
        "fun" => &["todayilearned", "explainlikeimfive", "Damnthatsinteresting"],
        "news" => &["worldnews", "news"],
        "startup" => &["startups", "entrepreneur"],
        _ => &[],
    }
}

/// Discussion aggregator backed by Reddit
pub struct RedditProvider {
    client: Client,
    rate_limiter: ProviderRateLimiter,
    timeout_ms: u64,
}

impl RedditProvider {
    /// Create a new Reddit provider
    ///
    /// # Arguments
    /// * `user_agent` - Reddit rejects anonymous default agents
    /// * `timeout_ms` - Per-request timeout
    /// * `requests_per_minute` - Local request budget
    pub fn new(
        user_agent: &str,
        timeout_ms: u64,
        requests_per_minute: u32,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(NAME, user_agent, timeout_ms)?,
            rate_limiter: ProviderRateLimiter::new(NAME, requests_per_minute),
            timeout_ms,
        })
    }

    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        limit: usize,
        time_filter: Option<TimeFilter>,
    ) -> Result<Listing, SourceError> {
        self.rate_limiter.check()?;

        let limit = limit.to_string();
        let request = match time_filter {
            Some(filter) => self
                .client
                .get(format!("{}/r/{}/top.json", REDDIT_BASE_URL, subreddit))
                .query(&[("limit", limit.as_str()), ("t", filter.as_str())]),
            None => self
                .client
                .get(format!("{}/r/{}/hot.json", REDDIT_BASE_URL, subreddit))
                .query(&[("limit", limit.as_str())]),
        };

        send_checked(NAME, request, self.timeout_ms)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse {
                provider: NAME.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ContentProvider for RedditProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supported_categories(&self) -> &[&'static str] {
        CATEGORIES
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn fetch(
        &self,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.ensure_can_fetch(category)?;

        let subreddits = subreddits_for(category);
        if subreddits.is_empty() {
            warn!("No subreddits mapped for category '{}'", category);
            return Ok(Vec::new());
        }

        let per_subreddit = (max_items / subreddits.len()).max(1);
        let mut items = Vec::new();
        let mut first_error = None;
        let mut any_succeeded = false;

        for subreddit in subreddits {
            match self
                .fetch_subreddit(subreddit, per_subreddit, options.time_filter)
                .await
            {
                Ok(listing) => {
                    any_succeeded = true;
                    for item in listing_to_items(listing, subreddit, category) {
                        if items.len() >= max_items {
                            break;
                        }
                        items.push(item);
                    }
                }
                Err(e) => {
                    warn!("Error fetching from r/{}: {}", subreddit, e);
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

        info!(
            "Fetched {} Reddit items from {} subreddits",
            items.len(),
            subreddits.len()
        );
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    url: Option<String>,
    permalink: String,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    author: Option<String>,
}

fn listing_to_items(listing: Listing, subreddit: &str, category: &str) -> Vec<ContentItem> {
    listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .filter(|post| !post.stickied)
        .filter_map(|post| {
            let permalink = format!("{}{}", REDDIT_BASE_URL, post.permalink);
            let (url, description) = if post.is_self {
                (
                    permalink,
                    Some(truncate_chars(
                        &html_decode(&post.selftext),
                        SELFTEXT_PREVIEW_CHARS,
                    )),
                )
            } else {
                (post.url.unwrap_or(permalink), None)
            };

            let published_at = post
                .created_utc
                .and_then(|ts| DateTime::from_timestamp(ts as i64, 0));

            ContentItem::new(html_decode(&post.title), NAME, category).map(|item| {
                item.with_url(Some(url))
                    .with_description(description)
                    .with_published_at(published_at)
                    .with_metadata("subreddit", subreddit)
                    .with_metadata("score", post.score)
                    .with_metadata("num_comments", post.num_comments)
                    .with_metadata(
                        "author",
                        post.author.unwrap_or_else(|| "[deleted]".to_string()),
                    )
            })
        })
        .collect()
}
