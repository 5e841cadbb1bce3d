// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Agent tool responses

use morning_digest::sources::tools::{available_sources, fetch_news, search_news, NO_SOURCE};
use morning_digest::sources::{ExclusionReason, ProviderRegistry};

use super::mocks::{network_error, orchestrator, Behavior, MockProvider};

#[tokio::test]
async fn test_fetch_news_success() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Fail(network_error("p1")));
    let p2 = MockProvider::new("p2", &["tech"], Behavior::Items(3));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1, p2], 1000);

    let response = fetch_news(&orchestrator, "tech", None, 2).await;

    assert_eq!(response.source_used, "p2");
    assert_eq!(response.count, 2);
    assert_eq!(response.items.len(), 2);
    assert_eq!(response.category, "tech");
    assert!(response.error.is_none());
    assert_eq!(response.attempts.len(), 2);
}

#[tokio::test]
async fn test_fetch_news_miss_reports_none() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Items(1));
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let response = fetch_news(&orchestrator, "history", None, 5).await;

    assert_eq!(response.source_used, NO_SOURCE);
    assert_eq!(response.count, 0);
    assert!(response
        .error
        .unwrap()
        .contains("no available provider for category"));
    assert_eq!(p1.calls(), 0);

    let json = serde_json::to_value(
        &fetch_news(&orchestrator, "tech", Some("nope"), 5).await,
    )
    .unwrap();
    assert_eq!(json["source_used"], "none");
    assert_eq!(json["items"].as_array().unwrap().len(), 0);
}

#[test]
fn test_available_sources_counts_exclusions() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Empty);
    let p2 = MockProvider::new("p2", &["fun"], Behavior::Empty);
    p2.set_available(false);
    let registry = ProviderRegistry::builder(["p1", "p2"])
        .register(p1)
        .register(p2)
        .exclude("tavily", ExclusionReason::MissingCredential, Vec::new(), None)
        .build();

    let response = available_sources(&registry);

    assert_eq!(response.available_sources, vec!["p1"]);
    assert_eq!(response.total_sources, 3);
    assert_eq!(response.sources_info.len(), 3);
}

#[tokio::test]
async fn test_search_news_without_tavily() {
    let registry = ProviderRegistry::builder(Vec::<String>::new()).build();
    let response = search_news(registry.search_provider(), "fusion energy", 3).await;

    assert!(response.items.is_empty());
    assert_eq!(response.query, "fusion energy");
    assert!(response.error.is_some());
}
