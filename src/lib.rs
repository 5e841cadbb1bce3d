// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod sources;
pub mod version;

// Re-export main types
pub use sources::{
    ContentItem, ContentProvider, FallbackOrchestrator, FetchOptions, ProviderRegistry,
    Resolution, RoutingConfig, SourceError,
};
