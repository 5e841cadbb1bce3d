// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Routing configuration for content providers

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default location of the routing file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/sources.json";

const DEFAULT_USER_AGENT: &str = "MorningDigest/1.0 (+https://github.com/fabstir)";

/// Errors raised while loading routing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Static routing configuration consumed by the registry at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Provider identifiers, highest priority first
    #[serde(deserialize_with = "deserialize_priority")]
    pub priority: Vec<String>,
    /// Per-provider settings (`sources` in the JSON layout), keyed by
    /// trimmed lowercase provider name
    #[serde(alias = "sources", deserialize_with = "deserialize_providers")]
    pub providers: BTreeMap<String, ProviderSettings>,
    /// Per-fetch timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Fetch cache TTL in seconds (0 disables caching)
    pub cache_ttl_secs: u64,
    /// Maximum cached fetch results per provider
    pub cache_max_entries: usize,
    /// Items requested when the caller does not say
    pub default_max_items: usize,
    /// User-Agent sent by every provider
    pub user_agent: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether the provider may be registered at all
    pub enabled: bool,
    /// Narrows the provider's declared categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Environment variable holding the provider's credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Local request budget for the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: None,
            api_key_env: None,
            rate_limit_per_minute: None,
        }
    }
}

impl RoutingConfig {
    /// Load configuration from the environment
    ///
    /// `DIGEST_SOURCES_CONFIG` names a JSON or TOML file; without it
    /// `config/sources.json` is used when present, else built-in defaults.
    /// `DIGEST_SOURCE_PRIORITY`, `DIGEST_REQUEST_TIMEOUT_MS` and
    /// `DIGEST_CACHE_TTL_SECS` override the loaded values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("DIGEST_SOURCES_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    warn!(
                        "Config file not found at {}, using default routing",
                        DEFAULT_CONFIG_PATH
                    );
                    Self::default()
                }
            }
        };

        if let Ok(priority) = env::var("DIGEST_SOURCE_PRIORITY") {
            let parsed = parse_priority_list(&priority);
            if !parsed.is_empty() {
                config.priority = parsed;
            }
        }
        if let Some(timeout) = env::var("DIGEST_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.request_timeout_ms = timeout;
        }
        if let Some(ttl) = env::var("DIGEST_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.cache_ttl_secs = ttl;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON or TOML file (chosen by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config: Self = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        info!(
            "Loaded routing config from {} with {} provider entries",
            path.display(),
            config.providers.len()
        );
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.default_max_items == 0 {
            return Err(ConfigError::Invalid(
                "default_max_items must be greater than 0".to_string(),
            ));
        }
        if self.cache_ttl_secs > 0 && self.cache_max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache_max_entries must be greater than 0 when caching is enabled".to_string(),
            ));
        }
        for (name, settings) in &self.providers {
            if settings.rate_limit_per_minute == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "rate_limit_per_minute for {} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Settings for a provider, falling back to defaults when not listed
    ///
    /// Names match case-insensitively, so hand-built maps with mixed-case
    /// keys resolve the same way as loaded ones.
    pub fn settings(&self, provider: &str) -> ProviderSettings {
        let wanted = normalize_name(provider);
        self.providers
            .get(&wanted)
            .or_else(|| {
                self.providers
                    .iter()
                    .find(|(name, _)| normalize_name(name) == wanted)
                    .map(|(_, settings)| settings)
            })
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve a provider credential from its configured env variable
    ///
    /// Returns None when the variable is unset or blank.
    pub fn api_key(&self, provider: &str, default_env: &str) -> Option<String> {
        let settings = self.settings(provider);
        let var = settings.api_key_env.as_deref().unwrap_or(default_env);
        match env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
            _ => {
                warn!("{} not found in environment for {}", var, provider);
                None
            }
        }
    }

    /// Check if caching of fetch results is enabled
    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_secs > 0
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert("hackernews".to_string(), ProviderSettings::default());
        providers.insert(
            "reddit".to_string(),
            ProviderSettings {
                rate_limit_per_minute: Some(30),
                ..Default::default()
            },
        );
        providers.insert("wikipedia".to_string(), ProviderSettings::default());
        providers.insert(
            "tavily".to_string(),
            ProviderSettings {
                api_key_env: Some("TAVILY_API_KEY".to_string()),
                rate_limit_per_minute: Some(60),
                ..Default::default()
            },
        );

        Self {
            priority: vec![
                "hackernews".to_string(),
                "reddit".to_string(),
                "wikipedia".to_string(),
                "tavily".to_string(),
            ],
            providers,
            request_timeout_ms: 8000,
            cache_ttl_secs: 0,
            cache_max_entries: 256,
            default_max_items: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn parse_priority_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_name)
        .filter(|s| !s.is_empty())
        .collect()
}

fn deserialize_priority<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|name| normalize_name(name))
        .filter(|name| !name.is_empty())
        .collect())
}

fn deserialize_providers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, ProviderSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, ProviderSettings>::deserialize(deserializer)?;
    let mut providers = BTreeMap::new();
    for (name, settings) in raw {
        let key = normalize_name(&name);
        if key.is_empty() {
            continue;
        }
        if providers.insert(key.clone(), settings).is_some() {
            warn!("Duplicate settings for provider '{}', keeping the last entry", key);
        }
    }
    Ok(providers)
}
