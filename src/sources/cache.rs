// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TTL-based caching of provider fetches
//!
//! Caching sits outside the provider contract: `CachedProvider` wraps any
//! provider and serves repeated identical fetches from memory. Only
//! non-empty successful results are cached, so fallback still sees a fresh
//! attempt whenever a provider came back empty or failed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

use super::provider::ContentProvider;
use super::types::{ContentItem, FetchOptions, SourceError};

/// TTL cache for fetch results of a single provider
pub struct FetchCache {
    cache: RwLock<HashMap<String, CachedEntry>>,
    ttl: Duration,
    max_entries: usize,
}

struct CachedEntry {
    items: Vec<ContentItem>,
    inserted_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries in cache
    pub total: usize,
    /// Expired entries (not yet evicted)
    pub expired: usize,
    /// Maximum cache capacity
    pub max: usize,
}

impl FetchCache {
    /// Create a new fetch cache
    ///
    /// # Arguments
    /// * `ttl_secs` - Time-to-live for cache entries in seconds
    /// * `max_entries` - Maximum number of entries to store
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
            max_entries: max_entries.max(1),
        }
    }

    /// Get cached items, None if missing or expired
    pub fn get(&self, category: &str, max_items: usize, options: &FetchOptions) -> Option<Vec<ContentItem>> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(&Self::cache_key(category, max_items, options))?;

        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }

        Some(entry.items.clone())
    }

    /// Insert items into cache
    pub fn insert(&self, category: &str, max_items: usize, options: &FetchOptions, items: &[ContentItem]) {
        let mut cache = match self.cache.write() {
            Ok(c) => c,
            Err(_) => return,
        };

        let key = Self::cache_key(category, max_items, options);
        if !cache.contains_key(&key) && cache.len() >= self.max_entries {
            Self::evict_oldest(&mut cache);
        }

        cache.insert(
            key,
            CachedEntry {
                items: items.to_vec(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let Ok(cache) = self.cache.read() else {
            return CacheStats {
                total: 0,
                expired: 0,
                max: self.max_entries,
            };
        };

        CacheStats {
            total: cache.len(),
            expired: cache
                .values()
                .filter(|e| e.inserted_at.elapsed() > self.ttl)
                .count(),
            max: self.max_entries,
        }
    }

    /// Remove expired entries from cache
    pub fn cleanup_expired(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        }
    }

    fn cache_key(category: &str, max_items: usize, options: &FetchOptions) -> String {
        format!(
            "{}|{}|{}",
            category.trim().to_lowercase(),
            max_items,
            options.cache_fragment()
        )
    }

    fn evict_oldest(cache: &mut HashMap<String, CachedEntry>) {
        if let Some(oldest_key) = cache
            .iter()
            .min_by_key(|(_, v)| v.inserted_at)
            .map(|(k, _)| k.clone())
        {
            cache.remove(&oldest_key);
        }
    }
}

/// Provider decorator that memoizes successful non-empty fetches
pub struct CachedProvider {
    inner: Arc<dyn ContentProvider>,
    cache: FetchCache,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn ContentProvider>, ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            inner,
            cache: FetchCache::new(ttl_secs, max_entries),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl ContentProvider for CachedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn supported_categories(&self) -> &[&'static str] {
        self.inner.supported_categories()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.inner.unavailable_reason()
    }

    async fn fetch(
        &self,
        category: &str,
        max_items: usize,
        options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError> {
        if let Some(items) = self.cache.get(category, max_items, options) {
            debug!("Cache hit for {} / {}", self.inner.name(), category);
            return Ok(items);
        }

        let items = self.inner.fetch(category, max_items, options).await?;
        if !items.is_empty() {
            self.cache.insert(category, max_items, options, &items);
        }
        Ok(items)
    }
}
