// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::sources::tools::{available_sources, search_news};
use crate::sources::{
    ContentItem, FallbackOrchestrator, FetchOptions, HnMethod, ProviderRegistry, Resolution,
    RoutingConfig, SearchTopic, TimeFilter,
};

/// Options shared by every command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Routing config file, JSON or TOML
    #[arg(long, env = "DIGEST_SOURCES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the sources command
#[derive(Args, Debug)]
pub struct SourcesArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Category to fetch (tech, science, news, fun, history, startup, ai, events)
    pub category: String,

    /// Use only this source, without fallback
    #[arg(long)]
    pub source: Option<String>,

    /// Maximum items (defaults to the configured value)
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Reddit listing window (hour, day, week, month, year, all)
    #[arg(long)]
    pub time_filter: Option<TimeFilter>,

    /// Tavily search topic
    #[arg(long, value_enum)]
    pub topic: Option<TopicArg>,

    /// Tavily look-back window in days (news topic)
    #[arg(long)]
    pub days: Option<u32>,

    /// How Hacker News is read
    #[arg(long, value_enum)]
    pub hn_method: Option<HnMethodArg>,

    #[command(flatten)]
    pub common: ConfigArgs,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Natural-language query
    pub query: String,

    /// Maximum results
    #[arg(long, default_value_t = 5)]
    pub max_items: usize,

    #[command(flatten)]
    pub common: ConfigArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TopicArg {
    General,
    News,
}

impl From<TopicArg> for SearchTopic {
    fn from(topic: TopicArg) -> Self {
        match topic {
            TopicArg::General => SearchTopic::General,
            TopicArg::News => SearchTopic::News,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HnMethodArg {
    Scrape,
    Api,
}

impl From<HnMethodArg> for HnMethod {
    fn from(method: HnMethodArg) -> Self {
        match method {
            HnMethodArg::Scrape => HnMethod::Scrape,
            HnMethodArg::Api => HnMethod::Api,
        }
    }
}

fn load_config(args: &ConfigArgs) -> Result<RoutingConfig> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let config = match &args.config {
        Some(path) => RoutingConfig::from_file(path)?,
        None => RoutingConfig::from_env()?,
    };
    Ok(config)
}

/// Print every known source with its status
pub async fn show_sources(args: SourcesArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let registry = ProviderRegistry::from_config(&config);
    let response = available_sources(&registry);

    if args.common.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("\n📋 Routing:");
    println!("  Priority:         {}", config.priority.join(", "));
    println!("  Request timeout:  {}ms", config.request_timeout_ms);
    if config.cache_enabled() {
        println!("  Cache TTL:        {}s", config.cache_ttl_secs);
    } else {
        println!("  Cache TTL:        off");
    }

    println!(
        "\n📰 Sources ({}/{} available):",
        response.available_sources.len(),
        response.total_sources
    );
    for status in &response.sources_info {
        let mark = if status.available { "✅" } else { "❌" };
        print!("  {} {:<12} [{}]", mark, status.name, status.categories.join(", "));
        match &status.reason {
            Some(reason) => println!(" - {}", reason),
            None => println!(),
        }
    }

    if response.available_sources.is_empty() {
        return Err(anyhow!("No content sources are available"));
    }
    Ok(())
}

/// Fetch a category and print the resolution
pub async fn fetch(args: FetchArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let max_items = args.max_items.unwrap_or(config.default_max_items);
    let options = FetchOptions {
        time_filter: args.time_filter,
        topic: args.topic.map(Into::into),
        days: args.days,
        hn_method: args.hn_method.map(Into::into),
    };

    let orchestrator = FallbackOrchestrator::new(
        Arc::new(ProviderRegistry::from_config(&config)),
        config.request_timeout_ms,
    );
    info!("Fetching {} items for {}", max_items, args.category);
    let resolution = orchestrator
        .resolve_with_options(&args.category, max_items, args.source.as_deref(), &options)
        .await;

    if args.common.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_resolution(&resolution);
    }
    Ok(())
}

/// Run a free-text search
pub async fn search(args: SearchArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let registry = ProviderRegistry::from_config(&config);
    let response = search_news(registry.search_provider(), &args.query, args.max_items).await;

    if args.common.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if let Some(error) = &response.error {
        return Err(anyhow!("Search failed: {}", error));
    }
    println!("\n🔎 {} results for \"{}\":", response.count, response.query);
    print_items(&response.items);
    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    println!("\n🧭 Attempts for {}:", resolution.category);
    for attempt in &resolution.attempts {
        println!(
            "  {:<12} {:?} ({}ms)",
            attempt.provider, attempt.outcome, attempt.latency_ms
        );
    }

    match (&resolution.provider_used, resolution.miss_reason()) {
        (Some(provider), _) => {
            println!("\n✅ {} items from {}:", resolution.items.len(), provider);
            print_items(&resolution.items);
        }
        (None, Some(reason)) => println!("\n❌ No items: {}", reason),
        (None, None) => println!("\n❌ No items"),
    }
}

fn print_items(items: &[ContentItem]) {
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {}", i + 1, item.title());
        if let Some(url) = item.url() {
            println!("     {}", url);
        }
        if let Some(description) = item.description() {
            println!("     {}", description);
        }
    }
}
