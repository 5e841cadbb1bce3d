// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Provider registry and router
//!
//! Holds the providers that made it through construction, in priority order,
//! and answers which of them can serve a category right now.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::CachedProvider;
use super::config::{ProviderSettings, RoutingConfig};
use super::hackernews::{self, HackerNewsProvider};
use super::provider::ContentProvider;
use super::reddit::{self, RedditProvider};
use super::tavily::{self, TavilyProvider};
use super::types::SourceError;
use super::wikipedia::{self, WikipediaProvider};

/// Builds one provider from the routing configuration and its settings
pub type ProviderConstructor =
    fn(&RoutingConfig, &ProviderSettings) -> Result<Arc<dyn ContentProvider>, SourceError>;

/// Built-in providers, in construction order
pub const BUILTIN_PROVIDERS: &[(&str, ProviderConstructor)] = &[
    (hackernews::NAME, build_hackernews as ProviderConstructor),
    (reddit::NAME, build_reddit as ProviderConstructor),
    (wikipedia::NAME, build_wikipedia as ProviderConstructor),
    (tavily::NAME, build_tavily_provider as ProviderConstructor),
];

const REDDIT_DEFAULT_RPM: u32 = 30;
const TAVILY_DEFAULT_RPM: u32 = 60;

fn build_hackernews(
    config: &RoutingConfig,
    _settings: &ProviderSettings,
) -> Result<Arc<dyn ContentProvider>, SourceError> {
    let provider = HackerNewsProvider::new(&config.user_agent, config.request_timeout_ms)?;
    Ok(Arc::new(provider))
}

fn build_reddit(
    config: &RoutingConfig,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ContentProvider>, SourceError> {
    let provider = RedditProvider::new(
        &config.user_agent,
        config.request_timeout_ms,
        settings.rate_limit_per_minute.unwrap_or(REDDIT_DEFAULT_RPM),
    )?;
    Ok(Arc::new(provider))
}

fn build_wikipedia(
    config: &RoutingConfig,
    _settings: &ProviderSettings,
) -> Result<Arc<dyn ContentProvider>, SourceError> {
    let provider = WikipediaProvider::new(&config.user_agent, config.request_timeout_ms)?;
    Ok(Arc::new(provider))
}

fn build_tavily(
    config: &RoutingConfig,
    settings: &ProviderSettings,
) -> Result<TavilyProvider, SourceError> {
    let key_env = settings
        .api_key_env
        .as_deref()
        .unwrap_or(tavily::DEFAULT_API_KEY_ENV);
    TavilyProvider::new(
        config.api_key(tavily::NAME, tavily::DEFAULT_API_KEY_ENV),
        key_env,
        &config.user_agent,
        config.request_timeout_ms,
        settings.rate_limit_per_minute.unwrap_or(TAVILY_DEFAULT_RPM),
    )
}

fn build_tavily_provider(
    config: &RoutingConfig,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ContentProvider>, SourceError> {
    Ok(Arc::new(build_tavily(config, settings)?))
}

/// A registered provider and the categories it may serve
#[derive(Clone)]
pub struct ProviderRegistration {
    provider: Arc<dyn ContentProvider>,
    categories: Vec<String>,
}

impl ProviderRegistration {
    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }

    /// Effective categories (declared, possibly narrowed by configuration)
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn supports(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}

/// Why a provider was left out of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Disabled,
    MissingCredential,
    ConstructionFailed,
    Unavailable,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled in configuration",
            Self::MissingCredential => "missing credential",
            Self::ConstructionFailed => "construction failed",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Record of a provider that was not registered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderExclusion {
    pub name: String,
    pub reason: ExclusionReason,
    /// Declared categories, when the provider got far enough to report them
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Introspection record for one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub categories: Vec<String>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Immutable set of providers shared by the orchestrator
pub struct ProviderRegistry {
    priority: Vec<String>,
    registrations: Vec<ProviderRegistration>,
    exclusions: Vec<ProviderExclusion>,
    tavily: Option<Arc<TavilyProvider>>,
}

impl ProviderRegistry {
    /// Start an explicit registry with the given priority order
    pub fn builder<I, S>(priority: I) -> ProviderRegistryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProviderRegistryBuilder {
            priority: priority
                .into_iter()
                .map(|p| p.into().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            registrations: Vec::new(),
            exclusions: Vec::new(),
            tavily: None,
        }
    }

    /// Build the registry from configuration with the built-in providers
    ///
    /// A registered Tavily provider is also exposed for free-text search.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let mut registry = Self::from_constructors(config, BUILTIN_PROVIDERS);

        if registry.provider(tavily::NAME).is_some() {
            match build_tavily(config, &config.settings(tavily::NAME)) {
                Ok(search) if search.is_available() => registry.tavily = Some(Arc::new(search)),
                Ok(_) => {}
                Err(e) => warn!("Tavily search handle unavailable: {}", e),
            }
        }
        registry
    }

    /// Build the registry from configuration with an explicit constructor list
    ///
    /// Every constructor runs in turn. Disabled, broken and unavailable
    /// providers are recorded as exclusions; none of them stops the others
    /// from registering.
    pub fn from_constructors(
        config: &RoutingConfig,
        constructors: &[(&str, ProviderConstructor)],
    ) -> Self {
        let mut builder = Self::builder(config.priority.iter().cloned());

        for &(name, construct) in constructors {
            let settings = config.settings(name);
            if !settings.enabled {
                info!("Provider {} disabled in configuration", name);
                builder = builder.exclude(name, ExclusionReason::Disabled, Vec::new(), None);
                continue;
            }

            let provider = match construct(config, &settings) {
                Ok(provider) => provider,
                Err(e) => {
                    warn!("Failed to initialize provider {}: {}", name, e);
                    builder = builder.exclude(
                        name,
                        ExclusionReason::ConstructionFailed,
                        Vec::new(),
                        Some(e.to_string()),
                    );
                    continue;
                }
            };

            if !provider.is_available() {
                let reason = if name == tavily::NAME || settings.api_key_env.is_some() {
                    ExclusionReason::MissingCredential
                } else {
                    ExclusionReason::Unavailable
                };
                warn!(
                    "Provider {} not available: {}",
                    name,
                    provider.unavailable_reason().unwrap_or_default()
                );
                builder = builder.exclude(
                    name,
                    reason,
                    declared_categories(provider.as_ref()),
                    provider.unavailable_reason(),
                );
                continue;
            }

            let provider = if config.cache_enabled() {
                debug!(
                    "Caching {} results for {}s",
                    name, config.cache_ttl_secs
                );
                Arc::new(CachedProvider::new(
                    provider,
                    config.cache_ttl_secs,
                    config.cache_max_entries,
                )) as Arc<dyn ContentProvider>
            } else {
                provider
            };

            builder = builder.register_with_categories(provider, settings.categories.as_deref());
        }

        let registry = builder.build();
        info!(
            "Provider registry ready: {} registered, {} excluded",
            registry.registrations.len(),
            registry.exclusions.len()
        );
        registry
    }

    /// Registrations in routing order: configured priority first, then the
    /// remaining providers in registration order
    fn ordered(&self) -> Vec<&ProviderRegistration> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(self.registrations.len());

        for name in &self.priority {
            if let Some(registration) = self.provider(name) {
                if seen.insert(registration.name()) {
                    ordered.push(registration);
                }
            }
        }
        for registration in &self.registrations {
            if seen.insert(registration.name()) {
                ordered.push(registration);
            }
        }

        ordered
    }

    /// Names of currently available providers, in routing order
    pub fn available_providers(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .filter(|r| r.is_available())
            .map(|r| r.name().to_string())
            .collect()
    }

    /// Available providers that can serve `category`, in routing order
    pub fn providers_for_category(&self, category: &str) -> Vec<String> {
        self.ordered()
            .into_iter()
            .filter(|r| r.is_available() && r.supports(category))
            .map(|r| r.name().to_string())
            .collect()
    }

    /// Look up a registered provider by name
    pub fn provider(&self, name: &str) -> Option<&ProviderRegistration> {
        self.registrations.iter().find(|r| r.name() == name)
    }

    /// Status of every known provider, registered ones first
    pub fn source_info(&self) -> Vec<ProviderStatus> {
        let registered = self.ordered().into_iter().map(|r| ProviderStatus {
            name: r.name().to_string(),
            categories: r.categories().to_vec(),
            available: r.is_available(),
            reason: r.provider().unavailable_reason(),
        });

        let excluded = self.exclusions.iter().map(|e| ProviderStatus {
            name: e.name.clone(),
            categories: e.categories.clone(),
            available: false,
            reason: Some(match &e.detail {
                Some(detail) => format!("{}: {}", e.reason.as_str(), detail),
                None => e.reason.as_str().to_string(),
            }),
        });

        registered.chain(excluded).collect()
    }

    pub fn exclusions(&self) -> &[ProviderExclusion] {
        &self.exclusions
    }

    /// Free-text search provider, when one is registered and available
    pub fn search_provider(&self) -> Option<&TavilyProvider> {
        self.tavily.as_deref()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Explicit registration for tests and custom providers
pub struct ProviderRegistryBuilder {
    priority: Vec<String>,
    registrations: Vec<ProviderRegistration>,
    exclusions: Vec<ProviderExclusion>,
    tavily: Option<Arc<TavilyProvider>>,
}

impl ProviderRegistryBuilder {
    /// Register a provider with its declared categories
    pub fn register(self, provider: Arc<dyn ContentProvider>) -> Self {
        self.register_with_categories(provider, None)
    }

    /// Register a provider, optionally narrowing its categories
    ///
    /// Override entries the provider does not declare are ignored. A second
    /// provider with an already registered name is ignored.
    pub fn register_with_categories(
        mut self,
        provider: Arc<dyn ContentProvider>,
        categories: Option<&[String]>,
    ) -> Self {
        let name = provider.name();
        if self.registrations.iter().any(|r| r.name() == name) {
            warn!("Provider {} already registered, ignoring duplicate", name);
            return self;
        }

        let declared = declared_categories(provider.as_ref());
        let categories = match categories {
            Some(overrides) => {
                let mut effective = Vec::new();
                for category in overrides {
                    let category = category.trim().to_lowercase();
                    if !declared.contains(&category) {
                        warn!(
                            "Ignoring category '{}' for {}: not supported by the provider",
                            category, name
                        );
                    } else if !effective.contains(&category) {
                        effective.push(category);
                    }
                }
                effective
            }
            None => declared,
        };

        info!("Registered provider {} for {:?}", name, categories);
        self.registrations.push(ProviderRegistration {
            provider,
            categories,
        });
        self
    }

    /// Record a provider that could not be registered
    pub fn exclude(
        mut self,
        name: &str,
        reason: ExclusionReason,
        categories: Vec<String>,
        detail: Option<String>,
    ) -> Self {
        self.exclusions.push(ProviderExclusion {
            name: name.to_string(),
            reason,
            categories,
            detail,
        });
        self
    }

    /// Expose a Tavily instance for free-text search
    pub fn with_search_provider(mut self, tavily: Arc<TavilyProvider>) -> Self {
        self.tavily = Some(tavily);
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            priority: self.priority,
            registrations: self.registrations,
            exclusions: self.exclusions,
            tavily: self.tavily,
        }
    }
}

fn declared_categories(provider: &dyn ContentProvider) -> Vec<String> {
    provider
        .supported_categories()
        .iter()
        .map(|c| c.to_string())
        .collect()
}
