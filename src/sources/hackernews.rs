// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hacker News provider
//!
//! Reads the front page by default; the Firebase API is available as an
//! alternative through `FetchOptions::hn_method`. No credential needed.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::provider::{http_client, send_checked, ContentProvider};
use super::text::collapse_whitespace;
use super::types::{ContentItem, FetchOptions, HnMethod, SourceError};

pub const NAME: &str = "hackernews";

const CATEGORIES: &[&str] = &["tech", "startup", "ai"];
const HN_BASE_URL: &str = "https://news.ycombinator.com/";
const HN_API_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// One story as read from Hacker News
#[derive(Debug, Clone, PartialEq)]
pub struct HnStory {
    pub title: String,
    pub url: String,
    pub points: u64,
    pub comments: u64,
    pub author: String,
    pub rank: usize,
}

impl HnStory {
    fn into_item(self, category: &str) -> Option<ContentItem> {
        ContentItem::new(self.title, NAME, category).map(|item| {
            item.with_url(Some(self.url))
                .with_metadata("points", self.points)
                .with_metadata("comments", self.comments)
                .with_metadata("rank", self.rank as u64)
                .with_metadata("author", self.author)
        })
    }
}

/// Tech aggregator backed by Hacker News
pub struct HackerNewsProvider {
    client: Client,
    timeout_ms: u64,
}

impl HackerNewsProvider {
    /// Create a new Hacker News provider
    ///
    /// # Arguments
    /// * `user_agent` - User-Agent header for all requests
    /// * `timeout_ms` - Per-request timeout
    pub fn new(user_agent: &str, timeout_ms: u64) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(NAME, user_agent, timeout_ms)?,
            timeout_ms,
        })
    }

    async fn scrape_front_page(&self, max_items: usize) -> Result<Vec<HnStory>, SourceError> {
        let request = self
            .client
            .get(HN_BASE_URL)
            .header("Accept", "text/html,application/xhtml+xml");
        let html = send_checked(NAME, request, self.timeout_ms)
            .await?
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(NAME, &e, self.timeout_ms))?;

        parse_front_page(&html, max_items)
    }

    async fn top_stories(&self, max_items: usize) -> Result<Vec<HnStory>, SourceError> {
        let request = self.client.get(format!("{}/topstories.json", HN_API_URL));
        let ids: Vec<u64> = send_checked(NAME, request, self.timeout_ms)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse {
                provider: NAME.to_string(),
                message: e.to_string(),
            })?;

        let lookups = ids
            .into_iter()
            .take(max_items)
            .map(|id| self.story_by_id(id));

        let stories = join_all(lookups)
            .await
            .into_iter()
            .enumerate()
            .filter_map(|(i, result)| match result {
                Ok(Some(mut story)) => {
                    story.rank = i + 1;
                    Some(story)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("Error fetching Hacker News story: {}", e);
                    None
                }
            })
            .collect();

        Ok(stories)
    }

    async fn story_by_id(&self, id: u64) -> Result<Option<HnStory>, SourceError> {
        let request = self.client.get(format!("{}/item/{}.json", HN_API_URL, id));
        let item: Option<HnApiItem> = send_checked(NAME, request, self.timeout_ms)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse {
                provider: NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(item.and_then(|item| item.into_story(id)))
    }
}

#[async_trait]
impl ContentProvider for HackerNewsProvider {
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
        info!("Fetching {} Hacker News items", max_items);

        let stories = match options.hn_method.unwrap_or_default() {
            HnMethod::Scrape => self.scrape_front_page(max_items).await?,
            HnMethod::Api => self.top_stories(max_items).await?,
        };

        let items: Vec<ContentItem> = stories
            .into_iter()
            .filter_map(|story| story.into_item(category))
            .take(max_items)
            .collect();

        info!("Fetched {} Hacker News items", items.len());
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct HnApiItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    url: Option<String>,
    by: Option<String>,
    score: Option<u64>,
    descendants: Option<u64>,
}

impl HnApiItem {
    fn into_story(self, id: u64) -> Option<HnStory> {
        if self.kind.as_deref() != Some("story") {
            return None;
        }
        Some(HnStory {
            title: self.title?,
            url: self
                .url
                .unwrap_or_else(|| format!("{}item?id={}", HN_BASE_URL, id)),
            points: self.score.unwrap_or(0),
            comments: self.descendants.unwrap_or(0),
            author: self.by.unwrap_or_default(),
            rank: 0,
        })
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse {
        provider: NAME.to_string(),
        message: format!("bad selector {}: {:?}", css, e),
    })
}

/// Parse the Hacker News front page into stories
///
/// Story rows are `tr.athing`; the following row holds score, author and
/// comment count.
pub fn parse_front_page(html: &str, max_items: usize) -> Result<Vec<HnStory>, SourceError> {
    let document = Html::parse_document(html);
    let row_sel = selector("tr.athing")?;
    let title_sel = selector("span.titleline > a")?;
    let subtext_sel = selector("td.subtext")?;
    let score_sel = selector("span.score")?;
    let user_sel = selector("a.hnuser")?;
    let link_sel = selector("a")?;

    let mut stories = Vec::new();

    for (i, row) in document.select(&row_sel).take(max_items).enumerate() {
        let Some(link) = row.select(&title_sel).next() else {
            debug!("Skipping story row {} without title link", i + 1);
            continue;
        };

        let title = element_text(&link);
        let href = link.value().attr("href").unwrap_or_default();
        let Some(url) = resolve_link(href) else {
            continue;
        };

        let subtext = row
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .and_then(|next| next.select(&subtext_sel).next());

        let (points, author, comments) = match subtext {
            Some(sub) => {
                let points = sub
                    .select(&score_sel)
                    .next()
                    .map(|s| leading_number(&element_text(&s)))
                    .unwrap_or(0);
                let author = sub
                    .select(&user_sel)
                    .next()
                    .map(|a| element_text(&a))
                    .unwrap_or_default();
                let comments = sub
                    .select(&link_sel)
                    .find(|a| {
                        a.value()
                            .attr("href")
                            .map(|h| h.contains("item?id="))
                            .unwrap_or(false)
                            && element_text(a).to_lowercase().contains("comment")
                    })
                    .map(|a| leading_number(&element_text(&a)))
                    .unwrap_or(0);
                (points, author, comments)
            }
            None => (0, String::new(), 0),
        };

        stories.push(HnStory {
            title,
            url,
            points,
            comments,
            author,
            rank: i + 1,
        });
    }

    Ok(stories)
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn leading_number(text: &str) -> u64 {
    text.split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Resolve story links; relative `item?id=` links point back to Hacker News
fn resolve_link(href: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    Url::parse(HN_BASE_URL)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .ok()
}
