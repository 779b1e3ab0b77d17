// src/aggregator/pipeline.rs
//! Cache check, concurrent fan-out to the adapters under one deadline,
//! then filter, dedup, score, sort and truncate.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::dedup::deduplicate;
use super::filters::matches_criteria;
use super::scoring::{distribution, JobScorer};
use crate::analytics::{SearchMetrics, SharedSearchAnalytics};
use crate::cache::{generate_key, SharedSearchCache};
use crate::core::config_manager::SearchConfig;
use crate::scrapers::{JobScraper, ScrapeConfig, ScrapeResult, ScraperRegistry};
use crate::types::{
    ScoredJob, SearchCriteria, SearchJobsData, SearchJobsResponse, SearchMetadata,
};

/// What one source produced by the end of the fan-out
#[derive(Debug)]
struct SourceOutcome {
    order: usize,
    source: String,
    result: Result<ScrapeResult, String>,
}

pub struct JobSearchPipeline {
    registry: ScraperRegistry,
    cache: SharedSearchCache<SearchJobsData>,
    analytics: SharedSearchAnalytics,
    scorer: JobScorer,
    fetch_limit: usize,
    timeout: Duration,
    cache_ttl: Duration,
}

impl JobSearchPipeline {
    pub fn new(
        registry: ScraperRegistry,
        cache: SharedSearchCache<SearchJobsData>,
        analytics: SharedSearchAnalytics,
        settings: &SearchConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            analytics,
            scorer: JobScorer::new(settings.weights, settings.source_quality.clone()),
            fetch_limit: settings.fetch_limit,
            timeout: Duration::from_millis(settings.timeout_ms),
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &SharedSearchCache<SearchJobsData> {
        &self.cache
    }

    pub fn analytics(&self) -> &SharedSearchAnalytics {
        &self.analytics
    }

    /// Run a search. Never fails: unexpected errors become an
    /// `INTERNAL_ERROR` response and are only logged.
    pub async fn search(&self, criteria: &SearchCriteria) -> SearchJobsResponse {
        match self.execute(criteria).await {
            Ok(data) => SearchJobsResponse::success(data),
            Err(e) => {
                error!(query = %criteria.query, "Job search failed: {:#}", e);
                SearchJobsResponse::internal_error()
            }
        }
    }

    async fn execute(&self, criteria: &SearchCriteria) -> Result<SearchJobsData> {
        let started = Instant::now();
        let key = generate_key(criteria);

        if let Some(data) = self.cached(&key)? {
            return self.serve_cached(criteria, data, started);
        }

        if self.registry.is_empty() {
            anyhow::bail!("No job sources are registered");
        }

        let requested = criteria
            .sources
            .clone()
            .unwrap_or_else(|| self.registry.names());

        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut successful_sources = Vec::new();
        let mut failed_sources = Vec::new();

        let mut scrapers = Vec::new();
        for name in &requested {
            match self.registry.get(name) {
                Some(scraper) => scrapers.push(scraper),
                None => {
                    warn!(source = %name, "Requested source has no adapter");
                    warnings.push(format!("Source '{}' is not available", name));
                    failed_sources.push(name.clone());
                }
            }
        }

        // Over-fetch so ranking sees more than the first page of postings
        let config = ScrapeConfig {
            search_query: criteria.query.clone(),
            location: criteria.location.clone(),
            max_results: self.fetch_limit.max(criteria.max_results),
        };

        // Spawned so an abandoned request does not cancel adapters mid-flight
        let fan_out_started = Instant::now();
        let outcomes = tokio::spawn(fan_out(scrapers, config, self.timeout))
            .await
            .context("Scraper fan-out task failed")?;
        let search_duration_ms = fan_out_started.elapsed().as_millis() as u64;

        let mut raw_jobs = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(result) if !result.is_failure() => {
                    warnings.extend(
                        result
                            .errors
                            .iter()
                            .map(|e| format!("{}: {}", outcome.source, e)),
                    );
                    successful_sources.push(outcome.source);
                    raw_jobs.extend(result.jobs);
                }
                Ok(result) => {
                    errors.extend(
                        result
                            .errors
                            .iter()
                            .map(|e| format!("{}: {}", outcome.source, e)),
                    );
                    failed_sources.push(outcome.source);
                }
                Err(message) => {
                    errors.push(format!("{}: {}", outcome.source, message));
                    failed_sources.push(outcome.source);
                }
            }
        }

        let total_jobs_found = raw_jobs.len();
        let now = Utc::now();
        let filtered: Vec<_> = raw_jobs
            .into_iter()
            .filter(|job| matches_criteria(job, criteria, now))
            .collect();

        let deduped = deduplicate(filtered);
        let unique_jobs = deduped.jobs.len();

        let mut scored: Vec<ScoredJob> = deduped
            .jobs
            .into_iter()
            .map(|unique| ScoredJob {
                score: self.scorer.score(&unique.job, criteria),
                id: unique.id,
                job: unique.job,
            })
            .collect();

        let rates = self.success_rates(&successful_sources)?;
        let rate_of = |job: &ScoredJob| rates.get(&job.job.source).copied().unwrap_or(-1.0);
        // Stable: equal keys keep first-seen order
        scored.sort_by(|a, b| {
            b.score
                .total
                .total_cmp(&a.score.total)
                .then_with(|| rate_of(b).total_cmp(&rate_of(a)))
        });
        scored.truncate(criteria.max_results);

        let average_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().map(|job| job.score.total).sum::<f64>() / scored.len() as f64
        };

        let metadata = SearchMetadata {
            total_jobs_found,
            unique_jobs,
            duplicates_removed: deduped.duplicates_removed,
            partial_results: !failed_sources.is_empty(),
            successful_sources,
            failed_sources,
            search_duration_ms,
            total_duration_ms: started.elapsed().as_millis() as u64,
            average_score,
            score_distribution: distribution(scored.iter().map(|job| &job.score)),
            cache_hit: false,
        };

        let data = SearchJobsData {
            jobs: scored,
            metadata,
            warnings: (!warnings.is_empty()).then_some(warnings),
            errors: (!errors.is_empty()).then_some(errors),
        };

        if !data.metadata.successful_sources.is_empty() {
            self.cache
                .lock()
                .map_err(|_| anyhow!("Search cache lock poisoned"))?
                .set(key, data.clone(), Some(self.cache_ttl));
        }

        let mut metric = SearchMetrics::new(&criteria.query, criteria.location.as_deref());
        metric.sources = requested;
        metric.duration_ms = data.metadata.total_duration_ms;
        metric.jobs_found = data.metadata.unique_jobs;
        metric.successful_sources = data.metadata.successful_sources.clone();
        metric.failed_sources = data.metadata.failed_sources.clone();
        metric.error_count = data.errors.as_ref().map_or(0, Vec::len);
        self.record(metric)?;

        info!(
            query = %criteria.query,
            jobs = data.jobs.len(),
            unique = data.metadata.unique_jobs,
            failed_sources = ?data.metadata.failed_sources,
            duration_ms = data.metadata.total_duration_ms,
            "Job search completed"
        );

        Ok(data)
    }

    fn cached(&self, key: &str) -> Result<Option<SearchJobsData>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("Search cache lock poisoned"))?;
        Ok(cache.get(key))
    }

    fn serve_cached(
        &self,
        criteria: &SearchCriteria,
        mut data: SearchJobsData,
        started: Instant,
    ) -> Result<SearchJobsData> {
        data.metadata.cache_hit = true;
        data.metadata.total_duration_ms = started.elapsed().as_millis() as u64;

        let mut metric = SearchMetrics::new(&criteria.query, criteria.location.as_deref());
        metric.duration_ms = data.metadata.total_duration_ms;
        metric.jobs_found = data.metadata.unique_jobs;
        metric.cache_hit = true;
        self.record(metric)?;

        debug!(query = %criteria.query, "Served search from cache");
        Ok(data)
    }

    fn success_rates(&self, sources: &[String]) -> Result<HashMap<String, f64>> {
        let analytics = self
            .analytics
            .lock()
            .map_err(|_| anyhow!("Search analytics lock poisoned"))?;
        Ok(sources
            .iter()
            .filter_map(|source| {
                analytics
                    .source_success_rate(source)
                    .map(|rate| (source.clone(), rate))
            })
            .collect())
    }

    fn record(&self, metric: SearchMetrics) -> Result<()> {
        self.analytics
            .lock()
            .map_err(|_| anyhow!("Search analytics lock poisoned"))?
            .add_metric(metric);
        Ok(())
    }
}

/// Run every adapter as its own task and collect whatever finishes before
/// `timeout`. Tasks still running at the deadline are aborted and reported
/// as timed out. Outcomes come back in request order.
async fn fan_out(
    scrapers: Vec<Arc<dyn JobScraper>>,
    config: ScrapeConfig,
    timeout: Duration,
) -> Vec<SourceOutcome> {
    let config = Arc::new(config);
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for (order, scraper) in scrapers.into_iter().enumerate() {
        let source = scraper.source_name().to_string();
        let config = Arc::clone(&config);
        let handle = tasks.spawn(async move { scraper.scrape(&config).await });
        pending.insert(handle.id(), (order, source));
    }

    let mut outcomes = Vec::with_capacity(pending.len());
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            joined = tasks.join_next_with_id() => match joined {
                None => break,
                Some(Ok((id, result))) => {
                    if let Some((order, source)) = pending.remove(&id) {
                        debug!(source = %source, jobs = result.jobs.len(), "Source finished");
                        outcomes.push(SourceOutcome { order, source, result: Ok(result) });
                    }
                }
                Some(Err(join_error)) => {
                    if let Some((order, source)) = pending.remove(&join_error.id()) {
                        error!(source = %source, "Scraper task failed: {}", join_error);
                        outcomes.push(SourceOutcome {
                            order,
                            source,
                            result: Err("scraper task failed unexpectedly".to_string()),
                        });
                    }
                }
            },
            _ = &mut deadline => {
                tasks.abort_all();
                for (_, (order, source)) in pending.drain() {
                    warn!(
                        source = %source,
                        timeout_ms = timeout.as_millis() as u64,
                        "Source timed out"
                    );
                    outcomes.push(SourceOutcome {
                        order,
                        source,
                        result: Err(format!("timed out after {} ms", timeout.as_millis())),
                    });
                }
                break;
            }
        }
    }

    outcomes.sort_by_key(|outcome| outcome.order);
    outcomes
}
