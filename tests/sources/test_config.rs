// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loading routing configuration from files and the environment

use morning_digest::sources::{ConfigError, ExclusionReason, ProviderRegistry, RoutingConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_json_sources_layout() {
    let file = write_config(
        ".json",
        r#"{
            "priority": ["reddit", "hackernews"],
            "sources": {
                "reddit": {"enabled": true, "rate_limit_per_minute": 10},
                "tavily": {"enabled": false}
            },
            "request_timeout_ms": 2500
        }"#,
    );

    let config = RoutingConfig::from_file(file.path()).unwrap();
    assert_eq!(config.priority, vec!["reddit", "hackernews"]);
    assert_eq!(config.request_timeout_ms, 2500);
    assert_eq!(config.settings("reddit").rate_limit_per_minute, Some(10));
    assert!(!config.settings("tavily").enabled);
    assert_eq!(config.default_max_items, 5);
}

#[test]
fn test_mixed_case_provider_keys_disable_provider() {
    let file = write_config(
        ".json",
        r#"{
            "priority": ["Reddit", "HackerNews"],
            "sources": {
                "Reddit": {"enabled": false},
                "TAVILY": {"enabled": false}
            }
        }"#,
    );

    let config = RoutingConfig::from_file(file.path()).unwrap();
    assert_eq!(config.priority, vec!["reddit", "hackernews"]);

    let registry = ProviderRegistry::from_config(&config);
    let available = registry.available_providers();
    assert!(!available.contains(&"reddit".to_string()));
    assert!(!available.contains(&"tavily".to_string()));
    assert_eq!(available[0], "hackernews");
    assert!(registry
        .exclusions()
        .iter()
        .any(|e| e.name == "reddit" && e.reason == ExclusionReason::Disabled));
}

#[test]
fn test_load_toml() {
    let file = write_config(
        ".toml",
        r#"
priority = ["tavily", "wikipedia"]
cache_ttl_secs = 120

[providers.hackernews]
categories = ["tech"]
"#,
    );

    let config = RoutingConfig::from_file(file.path()).unwrap();
    assert_eq!(config.priority, vec!["tavily", "wikipedia"]);
    assert!(config.cache_enabled());
    assert_eq!(
        config.settings("hackernews").categories,
        Some(vec!["tech".to_string()])
    );
}

#[test]
fn test_malformed_json_is_rejected() {
    let file = write_config(".json", "{ not json");
    let result = RoutingConfig::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Json(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_config(".json", r#"{"request_timeout_ms": 0}"#);
    let result = RoutingConfig::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_from_env_reads_file_and_overrides() {
    let file = write_config(".json", r#"{"priority": ["hackernews"]}"#);

    std::env::set_var("DIGEST_SOURCES_CONFIG", file.path());
    std::env::set_var("DIGEST_SOURCE_PRIORITY", "Wikipedia, reddit");
    std::env::set_var("DIGEST_REQUEST_TIMEOUT_MS", "1500");

    let result = RoutingConfig::from_env();

    std::env::remove_var("DIGEST_SOURCES_CONFIG");
    std::env::remove_var("DIGEST_SOURCE_PRIORITY");
    std::env::remove_var("DIGEST_REQUEST_TIMEOUT_MS");

    let config = result.unwrap();
    assert_eq!(config.priority, vec!["wikipedia", "reddit"]);
    assert_eq!(config.request_timeout_ms, 1500);
}
