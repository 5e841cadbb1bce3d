// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wikipedia provider
//!
//! `history` and `fun` read the "On this day" feed; `news` and `events`
//! point at the Current Events portal.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::provider::{http_client, send_checked, ContentProvider};
use super::types::{ContentItem, FetchOptions, SourceError};

pub const NAME: &str = "wikipedia";

const CATEGORIES: &[&str] = &["news", "history", "fun", "events"];
const ON_THIS_DAY_URL: &str = "https://api.wikimedia.org/feed/v1/wikipedia/en/onthisday/all";
const PARSE_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const CURRENT_EVENTS_URL: &str = "https://en.wikipedia.org/wiki/Portal:Current_events";

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Encyclopedia provider backed by Wikipedia/Wikimedia feeds
pub struct WikipediaProvider {
    client: Client,
    timeout_ms: u64,
    today: Clock,
}

impl WikipediaProvider {
    /// Create a new Wikipedia provider using the current UTC date
    pub fn new(user_agent: &str, timeout_ms: u64) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(NAME, user_agent, timeout_ms)?,
            timeout_ms,
            today: Arc::new(|| Utc::now().date_naive()),
        })
    }

    /// Replace the date source used for "On this day"
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    /// URL of the "On this day" feed for a date
    pub fn on_this_day_url(date: NaiveDate) -> String {
        format!("{}/{:02}/{:02}", ON_THIS_DAY_URL, date.month(), date.day())
    }

    async fn fetch_on_this_day(
        &self,
        category: &str,
        max_items: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        let date = (self.today)();
        let request = self.client.get(Self::on_this_day_url(date));
        let feed: OnThisDayFeed = send_checked(NAME, request, self.timeout_ms)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse {
                provider: NAME.to_string(),
                message: e.to_string(),
            })?;

        let items = on_this_day_items(feed, date, category, max_items);
        info!("Fetched {} 'On this day' events", items.len());
        Ok(items)
    }

    async fn fetch_current_events(&self, category: &str) -> Result<Vec<ContentItem>, SourceError> {
        // Only confirms the portal is reachable; the page itself is not parsed
        let request = self.client.get(PARSE_API_URL).query(&[
            ("action", "parse"),
            ("page", "Portal:Current_events"),
            ("format", "json"),
            ("prop", "text"),
            ("section", "0"),
        ]);
        send_checked(NAME, request, self.timeout_ms).await?;

        Ok(current_events_item(category).into_iter().collect())
    }
}

#[async_trait]
impl ContentProvider for WikipediaProvider {
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
        _options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.ensure_can_fetch(category)?;
        if max_items == 0 {
            return Ok(Vec::new());
        }

        match category {
            "news" | "events" => self.fetch_current_events(category).await,
            _ => self.fetch_on_this_day(category, max_items).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OnThisDayFeed {
    #[serde(default)]
    events: Vec<HistoricalEvent>,
}

#[derive(Debug, Deserialize)]
struct HistoricalEvent {
    #[serde(default)]
    text: String,
    #[serde(default)]
    year: Option<i64>,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: Option<String>,
}

fn on_this_day_items(
    feed: OnThisDayFeed,
    date: NaiveDate,
    category: &str,
    max_items: usize,
) -> Vec<ContentItem> {
    let day = format!("{:02}/{:02}", date.month(), date.day());

    feed.events
        .into_iter()
        .filter(|event| !event.text.trim().is_empty())
        .take(max_items)
        .filter_map(|event| {
            let url = event
                .pages
                .into_iter()
                .next()
                .and_then(|p| p.content_urls)
                .and_then(|u| u.desktop)
                .and_then(|d| d.page);
            let title = match event.year {
                Some(year) => format!("In {}: {}", year, event.text),
                None => event.text.clone(),
            };

            ContentItem::new(title, NAME, category).map(|item| {
                let item = item
                    .with_url(url)
                    .with_description(Some(event.text))
                    .with_metadata("type", "historical_event")
                    .with_metadata("date", day.as_str());
                match event.year {
                    Some(year) => item.with_metadata("year", year),
                    None => item,
                }
            })
        })
        .collect()
}

fn current_events_item(category: &str) -> Option<ContentItem> {
    ContentItem::new("Wikipedia Current Events", NAME, category).map(|item| {
        item.with_url(Some(CURRENT_EVENTS_URL.to_string()))
            .with_description(Some(
                "Today's notable news events from around the world, as documented by Wikipedia editors."
                    .to_string(),
            ))
            .with_published_at(Some(Utc::now()))
            .with_metadata("type", "current_events_portal")
    })
}
