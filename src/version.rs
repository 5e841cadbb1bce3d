// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the morning digest source layer

/// Full version string with feature description
pub const VERSION: &str = "v1.2.0-multi-source-fallback-2025-11-04";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.2.0";

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "hackernews",
    "reddit",
    "wikipedia",
    "tavily-search",
    "priority-fallback",
    "explicit-source-pinning",
    "attempt-trace",
    "fetch-cache",
    "rate-limiting",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Morning Digest Sources {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
