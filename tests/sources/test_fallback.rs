// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fallback behavior of the orchestrator against scripted providers

use morning_digest::sources::{AttemptOutcome, MissReason, ResolveRequest, SourceError};
use std::time::Duration;

use super::mocks::{network_error, orchestrator, Behavior, MockProvider};

const TECH: &[&str] = &["tech", "science"];

#[tokio::test]
async fn test_empty_result_falls_through_to_next_provider() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Empty);
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(1));
    let p3 = MockProvider::new("p3", TECH, Behavior::Items(3));
    let orchestrator = orchestrator(
        &["p1", "p2", "p3"],
        &[p1.clone(), p2.clone(), p3.clone()],
        1000,
    );

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert!(resolution.is_success());
    assert_eq!(resolution.items.len(), 1);
    assert_eq!(resolution.items[0].title(), "p2 story 0");
    assert_eq!(resolution.provider_used.as_deref(), Some("p2"));
    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 1);
    assert_eq!(p3.calls(), 0);

    let outcomes: Vec<_> = resolution.attempts.iter().map(|a| &a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![&AttemptOutcome::Empty, &AttemptOutcome::Items { count: 1 }]
    );
}

#[tokio::test]
async fn test_highest_priority_non_empty_wins() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(2));
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(2));
    let orchestrator = orchestrator(&["p2", "p1"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("science", 5, None).await;

    assert_eq!(resolution.provider_used.as_deref(), Some("p2"));
    assert!(resolution.items.iter().all(|i| i.category() == "science"));
    assert!(resolution.items.iter().all(|i| i.source_name() == "p2"));
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_only_unavailable_provider_is_a_miss_without_fetch() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(3));
    p1.set_available(false);
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert!(resolution.items.is_empty());
    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::NoProviderForCategory)
    );
    assert_eq!(
        resolution.miss_reason().unwrap().to_string(),
        "no available provider for category"
    );
    assert!(resolution.attempts.is_empty());
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_no_provider_supports_category() {
    let p1 = MockProvider::new("p1", &["fun"], Behavior::Items(3));
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::NoProviderForCategory)
    );
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_explicit_unregistered_provider_is_a_hard_miss() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(1));
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(1));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, Some("p3")).await;

    assert!(resolution.items.is_empty());
    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::ProviderNotFound {
            provider: "p3".to_string()
        })
    );
    assert_eq!(p1.calls(), 0);
    assert_eq!(p2.calls(), 0);
}

#[tokio::test]
async fn test_explicit_unavailable_provider_does_not_fall_back() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(1));
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(1));
    p2.set_available(false);
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, Some("p2")).await;

    assert!(matches!(
        resolution.miss_reason(),
        Some(MissReason::ProviderUnavailable { .. })
    ));
    assert_eq!(p1.calls(), 0);
    assert_eq!(p2.calls(), 0);
}

#[tokio::test]
async fn test_explicit_provider_with_unsupported_category() {
    let p1 = MockProvider::new("p1", &["fun"], Behavior::Items(1));
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, Some("p1")).await;

    assert!(matches!(
        resolution.miss_reason(),
        Some(MissReason::CategoryUnsupported { .. })
    ));
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_explicit_provider_empty_result_is_not_retried_elsewhere() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Empty);
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(2));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, Some("p1")).await;

    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::FallbackExhausted)
    );
    assert_eq!(resolution.attempts.len(), 1);
    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 0);
}

#[tokio::test]
async fn test_explicit_provider_success() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(2));
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(2));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, Some("P2")).await;

    assert_eq!(resolution.provider_used.as_deref(), Some("p2"));
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_errors_never_escape_and_remaining_candidates_run() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Fail(network_error("p1")));
    let p2 = MockProvider::new(
        "p2",
        TECH,
        Behavior::Fail(SourceError::RateLimited {
            provider: "p2".to_string(),
            retry_after_secs: 60,
        }),
    );
    let p3 = MockProvider::new("p3", TECH, Behavior::Items(2));
    let orchestrator = orchestrator(
        &["p1", "p2", "p3"],
        &[p1.clone(), p2.clone(), p3.clone()],
        1000,
    );

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert_eq!(resolution.provider_used.as_deref(), Some("p3"));
    assert_eq!(resolution.attempts.len(), 3);
    match &resolution.attempts[0].outcome {
        AttemptOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(
        resolution.attempts[1].outcome,
        AttemptOutcome::Failed { .. }
    ));
}

#[tokio::test]
async fn test_all_failures_exhaust_fallback() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Fail(network_error("p1")));
    let p2 = MockProvider::new("p2", TECH, Behavior::Empty);
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert!(resolution.items.is_empty());
    assert!(resolution.provider_used.is_none());
    assert_eq!(
        resolution.miss_reason(),
        Some(&MissReason::FallbackExhausted)
    );
    assert_eq!(resolution.attempts.len(), 2);
}

#[tokio::test]
async fn test_slow_provider_times_out_and_falls_back() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Slow(Duration::from_secs(5)));
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(1));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 50);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert_eq!(resolution.provider_used.as_deref(), Some("p2"));
    assert_eq!(resolution.attempts[0].outcome, AttemptOutcome::TimedOut);
    assert!(resolution.attempts[0].latency_ms < 5000);
}

#[tokio::test]
async fn test_provider_timeout_error_recorded_as_timed_out() {
    let p1 = MockProvider::new(
        "p1",
        TECH,
        Behavior::Fail(SourceError::Timeout {
            provider: "p1".to_string(),
            timeout_ms: 8000,
        }),
    );
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert_eq!(resolution.attempts[0].outcome, AttemptOutcome::TimedOut);
}

#[tokio::test]
async fn test_panicking_provider_is_contained() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Panic);
    let p2 = MockProvider::new("p2", TECH, Behavior::Items(1));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 5, None).await;

    assert_eq!(resolution.provider_used.as_deref(), Some("p2"));
    match &resolution.attempts[0].outcome {
        AttemptOutcome::Failed { reason } => assert!(reason.contains("p1 exploded")),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_results_bounded_by_max_items() {
    let p1 = MockProvider::new("p1", TECH, Behavior::Items(20));
    let orchestrator = orchestrator(&["p1"], &[p1.clone()], 1000);

    let resolution = orchestrator.resolve("tech", 4, None).await;

    assert_eq!(resolution.items.len(), 4);
}

#[tokio::test]
async fn test_resolve_many_keeps_request_order() {
    let p1 = MockProvider::new("p1", &["tech"], Behavior::Items(2));
    let p2 = MockProvider::new("p2", &["fun"], Behavior::Items(1));
    let orchestrator = orchestrator(&["p1", "p2"], &[p1.clone(), p2.clone()], 1000);

    let requests = vec![
        ResolveRequest::new("fun", 3),
        ResolveRequest::new("history", 3),
        ResolveRequest::new("tech", 3).with_provider("p1"),
    ];
    let resolutions = orchestrator.resolve_many(&requests).await;

    assert_eq!(resolutions.len(), 3);
    assert_eq!(resolutions[0].provider_used.as_deref(), Some("p2"));
    assert_eq!(
        resolutions[1].miss_reason(),
        Some(&MissReason::NoProviderForCategory)
    );
    assert_eq!(resolutions[2].items.len(), 2);
}
