// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fallback orchestration across providers
//!
//! Candidates for a category are tried one after another in routing order.
//! The first provider that returns at least one item wins; empty results,
//! errors, panics and timeouts all move on to the next candidate. Nothing a
//! provider does escapes `resolve`.

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::RoutingConfig;
use super::registry::{ProviderRegistration, ProviderRegistry};
use super::types::{ContentItem, FetchOptions, SourceError};

/// What happened when one provider was asked for items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Items { count: usize },
    Empty,
    Failed { reason: String },
    TimedOut,
}

/// One entry in the attempt trace of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub category: String,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
}

/// Why a resolution produced no items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissReason {
    ProviderNotFound { provider: String },
    ProviderUnavailable { provider: String },
    CategoryUnsupported { provider: String, category: String },
    NoProviderForCategory,
    FallbackExhausted,
    ZeroItemsRequested,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderNotFound { provider } => {
                write!(f, "source '{}' is not registered", provider)
            }
            Self::ProviderUnavailable { provider } => {
                write!(f, "source '{}' is not available", provider)
            }
            Self::CategoryUnsupported { provider, category } => {
                write!(f, "source '{}' does not support category '{}'", provider, category)
            }
            Self::NoProviderForCategory => f.write_str("no available provider for category"),
            Self::FallbackExhausted => f.write_str("all sources failed or returned no items"),
            Self::ZeroItemsRequested => f.write_str("max_items must be greater than 0"),
        }
    }
}

/// Final result of a resolution: items were found, or why none were
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Miss(MissReason),
}

/// Result of resolving one category request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub category: String,
    pub items: Vec<ContentItem>,
    pub provider_used: Option<String>,
    pub outcome: Outcome,
    pub attempts: Vec<ProviderAttempt>,
}

impl Resolution {
    fn success(category: &str, provider: &str, items: Vec<ContentItem>, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            category: category.to_string(),
            items,
            provider_used: Some(provider.to_string()),
            outcome: Outcome::Success,
            attempts,
        }
    }

    fn miss(category: &str, reason: MissReason, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            category: category.to_string(),
            items: Vec::new(),
            provider_used: None,
            outcome: Outcome::Miss(reason),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn miss_reason(&self) -> Option<&MissReason> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::Miss(reason) => Some(reason),
        }
    }
}

/// One request for `resolve_many`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveRequest {
    pub category: String,
    pub max_items: usize,
    pub provider: Option<String>,
    pub options: FetchOptions,
}

impl ResolveRequest {
    pub fn new(category: impl Into<String>, max_items: usize) -> Self {
        Self {
            category: category.into(),
            max_items,
            ..Default::default()
        }
    }

    /// Pin the request to one provider
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }
}

/// Tries providers in routing order until one returns items
pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
    request_timeout: Duration,
}

impl FallbackOrchestrator {
    /// Create an orchestrator over a shared registry
    ///
    /// # Arguments
    /// * `registry` - Providers to route between
    /// * `request_timeout_ms` - Budget for each single provider fetch
    pub fn new(registry: Arc<ProviderRegistry>, request_timeout_ms: u64) -> Self {
        Self {
            registry,
            request_timeout: Duration::from_millis(request_timeout_ms),
        }
    }

    /// Build the registry and orchestrator from configuration
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(
            Arc::new(ProviderRegistry::from_config(config)),
            config.request_timeout_ms,
        )
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Resolve a category with default fetch options
    ///
    /// # Arguments
    /// * `category` - Requested category
    /// * `max_items` - Upper bound on returned items
    /// * `explicit_provider` - Pin to one provider; disables fallback
    pub async fn resolve(
        &self,
        category: &str,
        max_items: usize,
        explicit_provider: Option<&str>,
    ) -> Resolution {
        self.resolve_with_options(category, max_items, explicit_provider, &FetchOptions::default())
            .await
    }

    /// Resolve a category, passing provider-specific options through
    pub async fn resolve_with_options(
        &self,
        category: &str,
        max_items: usize,
        explicit_provider: Option<&str>,
        options: &FetchOptions,
    ) -> Resolution {
        let category = category.trim().to_lowercase();

        if max_items == 0 {
            return Resolution::miss(&category, MissReason::ZeroItemsRequested, Vec::new());
        }

        match explicit_provider.map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => self.resolve_pinned(&category, max_items, name, options).await,
            None => self.resolve_fallback(&category, max_items, options).await,
        }
    }

    /// Resolve several independent requests concurrently
    ///
    /// Each request keeps its own sequential fallback chain. Results come
    /// back in request order.
    pub async fn resolve_many(&self, requests: &[ResolveRequest]) -> Vec<Resolution> {
        let resolutions = requests.iter().map(|r| {
            self.resolve_with_options(&r.category, r.max_items, r.provider.as_deref(), &r.options)
        });
        join_all(resolutions).await
    }

    async fn resolve_pinned(
        &self,
        category: &str,
        max_items: usize,
        name: &str,
        options: &FetchOptions,
    ) -> Resolution {
        let name = name.to_lowercase();
        let Some(registration) = self.registry.provider(&name) else {
            warn!("Requested source {} is not registered", name);
            return Resolution::miss(
                category,
                MissReason::ProviderNotFound { provider: name },
                Vec::new(),
            );
        };

        if !registration.is_available() {
            warn!("Requested source {} is not available", name);
            return Resolution::miss(
                category,
                MissReason::ProviderUnavailable { provider: name },
                Vec::new(),
            );
        }

        if !registration.supports(category) {
            warn!("Source {} doesn't support category {}", name, category);
            return Resolution::miss(
                category,
                MissReason::CategoryUnsupported {
                    provider: name,
                    category: category.to_string(),
                },
                Vec::new(),
            );
        }

        let (items, attempt) = self.attempt(registration, category, max_items, options).await;
        match items {
            Some(items) => Resolution::success(category, &name, items, vec![attempt]),
            None => Resolution::miss(category, MissReason::FallbackExhausted, vec![attempt]),
        }
    }

    async fn resolve_fallback(
        &self,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> Resolution {
        let candidates = self.registry.providers_for_category(category);
        if candidates.is_empty() {
            warn!("No available sources for category: {}", category);
            return Resolution::miss(category, MissReason::NoProviderForCategory, Vec::new());
        }

        debug!("Candidates for {}: {:?}", category, candidates);
        let mut attempts = Vec::with_capacity(candidates.len());

        for name in &candidates {
            let Some(registration) = self.registry.provider(name) else {
                continue;
            };

            let (items, attempt) = self.attempt(registration, category, max_items, options).await;
            attempts.push(attempt);

            if let Some(items) = items {
                info!("Using {} items from {} for {}", items.len(), name, category);
                return Resolution::success(category, name, items, attempts);
            }
        }

        warn!("All sources failed for category: {}", category);
        Resolution::miss(category, MissReason::FallbackExhausted, attempts)
    }

    /// Fetch from one provider inside the timeout and panic boundary
    async fn attempt(
        &self,
        registration: &ProviderRegistration,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> (Option<Vec<ContentItem>>, ProviderAttempt) {
        let provider = registration.provider();
        let start = Instant::now();

        let fetch = AssertUnwindSafe(provider.fetch(category, max_items, options)).catch_unwind();
        let result = tokio::time::timeout(self.request_timeout, fetch).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (items, outcome) = match result {
            Err(_) => (None, AttemptOutcome::TimedOut),
            Ok(Err(panic)) => (
                None,
                AttemptOutcome::Failed {
                    reason: format!("provider panicked: {}", panic_message(&panic)),
                },
            ),
            Ok(Ok(Err(SourceError::Timeout { .. }))) => (None, AttemptOutcome::TimedOut),
            Ok(Ok(Err(e))) => (
                None,
                AttemptOutcome::Failed {
                    reason: e.to_string(),
                },
            ),
            Ok(Ok(Ok(items))) if items.is_empty() => (None, AttemptOutcome::Empty),
            Ok(Ok(Ok(mut items))) => {
                items.truncate(max_items);
                let count = items.len();
                (Some(items), AttemptOutcome::Items { count })
            }
        };

        match &outcome {
            AttemptOutcome::Items { count } => info!(
                provider = provider.name(),
                category,
                latency_ms,
                "Fetched {} items",
                count
            ),
            AttemptOutcome::Empty => info!(
                provider = provider.name(),
                category,
                latency_ms,
                "Source returned no items, trying next"
            ),
            AttemptOutcome::Failed { reason } => warn!(
                provider = provider.name(),
                category,
                latency_ms,
                "Source failed: {}",
                reason
            ),
            AttemptOutcome::TimedOut => warn!(
                provider = provider.name(),
                category,
                latency_ms,
                "Source timed out"
            ),
        }

        let attempt = ProviderAttempt {
            provider: provider.name().to_string(),
            category: category.to_string(),
            outcome,
            latency_ms,
        };
        (items, attempt)
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
