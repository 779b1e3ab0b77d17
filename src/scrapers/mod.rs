// src/scrapers/mod.rs
//! Job board adapters.
//!
//! Each board is a [`JobScraper`]. Adapters never fail outright: network
//! errors, HTTP errors and anti-bot challenge pages are reported through
//! [`ScrapeResult::errors`] so one broken board never sinks a search.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::config_manager::ScraperSettings;
use crate::types::RawJob;

pub mod html;
pub mod indeed;
pub mod linkedin;

#[cfg(test)]
pub(crate) mod testing;

pub use indeed::IndeedScraper;
pub use linkedin::LinkedinScraper;

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub search_query: String,
    pub location: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub source: String,
    pub jobs: Vec<RawJob>,
    pub scraped_count: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub scraped_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScrapeResult {
    /// Build a result with consistent counts. Jobs beyond
    /// `config.max_results` are dropped and not counted.
    pub fn from_parts(
        source: &str,
        config: &ScrapeConfig,
        mut jobs: Vec<RawJob>,
        failed_count: usize,
        errors: Vec<String>,
        started: Instant,
    ) -> Self {
        jobs.truncate(config.max_results);
        let success_count = jobs.len();

        Self {
            source: source.to_string(),
            jobs,
            scraped_count: success_count + failed_count,
            success_count,
            failed_count,
            errors,
            scraped_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn failure(source: &str, error: String, started: Instant) -> Self {
        Self {
            source: source.to_string(),
            jobs: Vec::new(),
            scraped_count: 0,
            success_count: 0,
            failed_count: 0,
            errors: vec![error],
            scraped_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// A source counts as failed when it reported errors and produced nothing
    pub fn is_failure(&self) -> bool {
        self.jobs.is_empty() && !self.errors.is_empty()
    }
}

/// Cards extracted from one result page, before counts are reconciled
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub jobs: Vec<RawJob>,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[async_trait]
pub trait JobScraper: Send + Sync {
    /// Stable lower-case name, also used in `sources` of a request
    fn source_name(&self) -> &str;

    async fn scrape(&self, config: &ScrapeConfig) -> ScrapeResult;

    /// Release held resources
    async fn close(&self) {}
}

/// Adapters available to the pipeline, in registration order
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: Vec<Arc<dyn JobScraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scraper: Arc<dyn JobScraper>) -> Result<()> {
        let name = scraper.source_name().to_string();
        if self.get(&name).is_some() {
            anyhow::bail!("Duplicate scraper registration for source '{}'", name);
        }
        self.scrapers.push(scraper);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn JobScraper>> {
        self.scrapers
            .iter()
            .find(|scraper| scraper.source_name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.scrapers
            .iter()
            .map(|scraper| scraper.source_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }

    pub async fn close_all(&self) {
        for scraper in &self.scrapers {
            scraper.close().await;
        }
    }
}

/// Build the registry for the boards enabled in configuration
pub fn build_registry(settings: &ScraperSettings) -> Result<ScraperRegistry> {
    let mut registry = ScraperRegistry::new();

    for name in &settings.enabled_sources {
        let scraper: Arc<dyn JobScraper> = match name.as_str() {
            indeed::SOURCE_NAME => Arc::new(IndeedScraper::new(settings)?),
            linkedin::SOURCE_NAME => Arc::new(LinkedinScraper::new(settings)?),
            other => anyhow::bail!("Unknown job source in configuration: {}", other),
        };
        registry.register(scraper)?;
    }

    info!("Registered job sources: {}", registry.names().join(", "));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::testing::FakeScraper;
    use super::*;

    fn config(max_results: usize) -> ScrapeConfig {
        ScrapeConfig {
            search_query: "rust".into(),
            location: None,
            max_results,
        }
    }

    #[test]
    fn test_from_parts_keeps_counts_consistent() {
        let jobs = (0..5)
            .map(|i| RawJob::new("indeed", &format!("Job {}", i), "Acme", "Remote"))
            .collect();

        let result =
            ScrapeResult::from_parts("indeed", &config(3), jobs, 2, vec![], Instant::now());

        assert_eq!(result.jobs.len(), 3);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.failed_count, 2);
        assert_eq!(result.scraped_count, result.success_count + result.failed_count);
        assert!(!result.is_failure());
    }

    #[test]
    fn test_failure_result() {
        let result = ScrapeResult::failure("indeed", "HTTP error: 403".into(), Instant::now());
        assert!(result.is_failure());
        assert_eq!(result.scraped_count, 0);
    }

    #[test]
    fn test_empty_result_is_not_a_failure() {
        let result =
            ScrapeResult::from_parts("indeed", &config(3), vec![], 0, vec![], Instant::now());
        assert!(!result.is_failure());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ScraperRegistry::new();
        registry.register(Arc::new(FakeScraper::new("indeed"))).unwrap();
        registry.register(Arc::new(FakeScraper::new("linkedin"))).unwrap();

        assert!(registry.register(Arc::new(FakeScraper::new("indeed"))).is_err());
        assert_eq!(registry.names(), vec!["indeed", "linkedin"]);
        assert!(registry.get("linkedin").is_some());
        assert!(registry.get("monster").is_none());
    }

    #[tokio::test]
    async fn test_close_all_closes_every_adapter() {
        let first = Arc::new(FakeScraper::new("indeed"));
        let second = Arc::new(FakeScraper::new("linkedin"));
        let mut registry = ScraperRegistry::new();
        registry.register(first.clone()).unwrap();
        registry.register(second.clone()).unwrap();

        registry.close_all().await;

        assert!(first.is_closed());
        assert!(second.is_closed());
    }

    #[test]
    fn test_build_registry_from_settings() {
        let settings = ScraperSettings::default();
        let registry = build_registry(&settings).unwrap();
        assert_eq!(registry.names(), vec!["indeed", "linkedin"]);

        let unknown = ScraperSettings {
            enabled_sources: vec!["monster".into()],
            ..ScraperSettings::default()
        };
        assert!(build_registry(&unknown).is_err());
    }
}
