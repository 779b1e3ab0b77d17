// src/aggregator/mod.rs
//! Merge, deduplicate and score results from every job board

pub mod dedup;
pub mod filters;
pub mod pipeline;
pub mod scoring;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::analytics::SearchAnalytics;
use crate::cache::SearchCache;
use crate::core::ConfigManager;
use crate::scrapers::build_registry;

pub use pipeline::JobSearchPipeline;
pub use scoring::{JobScorer, ScoringWeights};

/// Wire adapters, cache and analytics from configuration
pub fn build_pipeline(config: &ConfigManager) -> Result<JobSearchPipeline> {
    let registry =
        build_registry(&config.scrapers).context("Failed to build the job source registry")?;

    let search = &config.search;
    let cache = SearchCache::new(
        search.cache_max_size,
        Duration::from_secs(search.cache_ttl_secs),
    )
    .shared();
    let analytics = SearchAnalytics::new(search.analytics_max_metrics).shared();

    info!(
        sources = registry.len(),
        timeout_ms = search.timeout_ms,
        cache_max_size = search.cache_max_size,
        "Search pipeline ready"
    );

    Ok(JobSearchPipeline::new(registry, cache, analytics, search))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pipeline_from_defaults() {
        let config = ConfigManager::defaults("local").unwrap();
        let pipeline = build_pipeline(&config).unwrap();
        assert_eq!(pipeline.registry().names(), vec!["indeed", "linkedin"]);
        assert!(pipeline.cache().lock().unwrap().is_empty());
    }
}
