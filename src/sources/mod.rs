// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-source content acquisition
//!
//! Fetches digest content by category from several independent providers
//! and falls back across them in a configured priority order:
//! - Hacker News (tech, startup, ai)
//! - Reddit subreddit listings (tech, science, fun, news, startup)
//! - Wikipedia "On this day" and Current Events (news, history, fun, events)
//! - Tavily AI search (tech, science, news, fun, ai; needs an API key)
//!
//! Provider failures never escape the orchestrator; every resolution carries
//! the trace of the attempts it made.

pub mod cache;
pub mod config;
pub mod hackernews;
pub mod orchestrator;
pub mod provider;
pub mod rate_limiter;
pub mod reddit;
pub mod registry;
pub mod tavily;
pub mod text;
pub mod tools;
pub mod types;
pub mod wikipedia;

// Re-export commonly used types
pub use cache::{CacheStats, CachedProvider};
pub use config::{ConfigError, ProviderSettings, RoutingConfig};
pub use hackernews::HackerNewsProvider;
pub use orchestrator::{
    AttemptOutcome, FallbackOrchestrator, MissReason, Outcome, ProviderAttempt, Resolution,
    ResolveRequest,
};
pub use provider::ContentProvider;
pub use reddit::RedditProvider;
pub use registry::{
    ExclusionReason, ProviderExclusion, ProviderRegistration, ProviderRegistry,
    ProviderConstructor, ProviderRegistryBuilder, ProviderStatus, BUILTIN_PROVIDERS,
};
pub use tavily::TavilyProvider;
pub use types::{ContentItem, FetchOptions, HnMethod, SearchTopic, SourceError, TimeFilter};
pub use wikipedia::WikipediaProvider;
