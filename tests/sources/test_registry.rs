// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Routing order and availability filtering

use morning_digest::sources::{
    ExclusionReason, FallbackOrchestrator, MissReason, ProviderRegistry, ProviderSettings,
    RoutingConfig,
};
use std::sync::Arc;

use super::mocks::{registry, Behavior, MockProvider};

#[test]
fn test_available_providers_is_idempotent() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Empty);
    let p2 = MockProvider::new("p2", &["fun"], Behavior::Empty);
    let registry = registry(&["p2", "p1"], &[p1, p2]);

    let first = registry.available_providers();
    let second = registry.available_providers();
    assert_eq!(first, second);
    assert_eq!(first, vec!["p2", "p1"]);
}

#[test]
fn test_unknown_priority_entries_are_ignored() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Empty);
    let p2 = MockProvider::new("p2", &["tech"], Behavior::Empty);
    let p3 = MockProvider::new("p3", &["tech"], Behavior::Empty);
    let registry = registry(&["ghost", "p3"], &[p1, p2, p3]);

    // Unlisted providers follow in registration order
    assert_eq!(registry.available_providers(), vec!["p3", "p1", "p2"]);
}

#[test]
fn test_providers_for_category_never_returns_unavailable() {
    let p1 = MockProvider::new("p1", &["tech", "ai"], Behavior::Empty);
    let p2 = MockProvider::new("p2", &["tech"], Behavior::Empty);
    let p3 = MockProvider::new("p3", &["ai"], Behavior::Empty);
    p1.set_available(false);
    let registry = registry(&["p1", "p2", "p3"], &[p1.clone(), p2, p3]);

    for category in ["tech", "ai", "fun"] {
        for name in registry.providers_for_category(category) {
            assert!(registry.provider(&name).unwrap().is_available());
        }
    }
    assert_eq!(registry.providers_for_category("tech"), vec!["p2"]);
    assert_eq!(registry.providers_for_category("ai"), vec!["p3"]);

    p1.set_available(true);
    assert_eq!(registry.providers_for_category("ai"), vec!["p1", "p3"]);
}

#[test]
fn test_source_info_reports_unavailable_reason() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Empty);
    p1.set_available(false);
    let registry = registry(&["p1"], &[p1]);

    let info = registry.source_info();
    assert_eq!(info.len(), 1);
    assert!(!info[0].available);
    assert_eq!(info[0].reason.as_deref(), Some("switched off"));
    assert_eq!(info[0].categories, vec!["tech"]);
}

#[tokio::test]
async fn test_everything_disabled_yields_empty_registry() {
    let mut config = RoutingConfig::default();
    for settings in config.providers.values_mut() {
        settings.enabled = false;
    }

    let registry = ProviderRegistry::from_config(&config);
    assert!(registry.is_empty());
    assert!(registry.available_providers().is_empty());
    assert_eq!(registry.exclusions().len(), 4);
    assert!(registry
        .exclusions()
        .iter()
        .all(|e| e.reason == ExclusionReason::Disabled));

    let orchestrator = FallbackOrchestrator::new(Arc::new(registry), 1000);
    let resolution = orchestrator.resolve("tech", 5, None).await;
    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::NoProviderForCategory)
    );
}

#[test]
fn test_from_config_priority_and_cache_wrapping() {
    let mut config = RoutingConfig::default();
    config.priority = vec!["wikipedia".to_string(), "hackernews".to_string()];
    config.cache_ttl_secs = 300;
    config.providers.insert(
        "tavily".to_string(),
        ProviderSettings {
            api_key_env: Some("DIGEST_TEST_NEVER_SET_TAVILY_KEY".to_string()),
            ..Default::default()
        },
    );

    let registry = ProviderRegistry::from_config(&config);

    assert_eq!(
        registry.available_providers(),
        vec!["wikipedia", "hackernews", "reddit"]
    );
    // Cached providers keep their identity
    assert_eq!(
        registry.provider("reddit").unwrap().provider().name(),
        "reddit"
    );
    assert_eq!(registry.providers_for_category("history"), vec!["wikipedia"]);

    let tavily = registry
        .source_info()
        .into_iter()
        .find(|s| s.name == "tavily")
        .unwrap();
    assert!(!tavily.available);
    assert!(tavily
        .reason
        .unwrap()
        .contains("DIGEST_TEST_NEVER_SET_TAVILY_KEY"));
}
