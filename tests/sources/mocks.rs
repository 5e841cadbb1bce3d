// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hand-written providers with scripted behavior and call counters

use async_trait::async_trait;
use morning_digest::sources::{
    ContentItem, ContentProvider, FallbackOrchestrator, FetchOptions, ProviderRegistry,
    SourceError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub enum Behavior {
    /// Return this many items, ignoring max_items
    Items(usize),
    Empty,
    Fail(SourceError),
    /// Sleep, then return one item
    Slow(Duration),
    Panic,
}

pub struct MockProvider {
    name: &'static str,
    categories: &'static [&'static str],
    behavior: Behavior,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(
        name: &'static str,
        categories: &'static [&'static str],
        behavior: Behavior,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            categories,
            behavior,
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supported_categories(&self) -> &[&'static str] {
        self.categories
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn unavailable_reason(&self) -> Option<String> {
        if self.is_available() {
            None
        } else {
            Some("switched off".to_string())
        }
    }

    async fn fetch(
        &self,
        category: &str,
        _max_items: usize,
        _options: &FetchOptions,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Items(n) => Ok(items(self.name, category, *n)),
            Behavior::Empty => Ok(Vec::new()),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(items(self.name, category, 1))
            }
            Behavior::Panic => panic!("{} exploded", self.name),
        }
    }
}

pub fn items(source: &str, category: &str, n: usize) -> Vec<ContentItem> {
    (0..n)
        .filter_map(|i| ContentItem::new(format!("{} story {}", source, i), source, category))
        .collect()
}

pub fn network_error(provider: &str) -> SourceError {
    SourceError::Network {
        provider: provider.to_string(),
        message: "connection refused".to_string(),
    }
}

pub fn registry(priority: &[&str], providers: &[Arc<MockProvider>]) -> ProviderRegistry {
    let mut builder = ProviderRegistry::builder(priority.iter().copied());
    for provider in providers {
        builder = builder.register(provider.clone());
    }
    builder.build()
}

pub fn orchestrator(
    priority: &[&str],
    providers: &[Arc<MockProvider>],
    timeout_ms: u64,
) -> FallbackOrchestrator {
    FallbackOrchestrator::new(Arc::new(registry(priority, providers)), timeout_ms)
}
