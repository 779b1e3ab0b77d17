// src/analytics.rs
//! Rolling window of executed searches and the summary statistics derived
//! from it. Nothing in here can fail; missing data yields zeroed aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::utils::{fold_label, percentage};

pub const DEFAULT_MAX_METRICS: usize = 1000;
const TOP_ENTRIES: usize = 10;

/// One executed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetrics {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub location: Option<String>,
    pub sources: Vec<String>,
    pub duration_ms: u64,
    pub jobs_found: usize,
    pub successful_sources: Vec<String>,
    pub failed_sources: Vec<String>,
    pub error_count: usize,
    pub cache_hit: bool,
}

impl SearchMetrics {
    pub fn new(query: &str, location: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            query: query.to_string(),
            location: location.map(str::to_string),
            sources: Vec::new(),
            duration_ms: 0,
            jobs_found: 0,
            successful_sources: Vec::new(),
            failed_sources: Vec::new(),
            error_count: 0,
            cache_hit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// Aggregates over a window of searches. Rates are percentages except
/// `error_rate`, which is errors per search.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_searches: usize,
    pub average_duration_ms: f64,
    pub average_jobs_found: f64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub source_success_rates: BTreeMap<String, f64>,
    pub error_rate: f64,
    pub top_queries: Vec<FrequencyEntry>,
    pub top_locations: Vec<FrequencyEntry>,
}

pub struct SearchAnalytics {
    metrics: VecDeque<SearchMetrics>,
    max_metrics: usize,
}

pub type SharedSearchAnalytics = Arc<Mutex<SearchAnalytics>>;

impl Default for SearchAnalytics {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_METRICS)
    }
}

impl SearchAnalytics {
    pub fn new(max_metrics: usize) -> Self {
        Self {
            metrics: VecDeque::with_capacity(max_metrics.min(DEFAULT_MAX_METRICS)),
            max_metrics,
        }
    }

    pub fn shared(self) -> SharedSearchAnalytics {
        Arc::new(Mutex::new(self))
    }

    pub fn add_metric(&mut self, metric: SearchMetrics) {
        self.metrics.push_back(metric);
        while self.metrics.len() > self.max_metrics {
            self.metrics.pop_front();
        }
    }

    /// Last `count` searches, oldest first
    pub fn recent_metrics(&self, count: usize) -> Vec<SearchMetrics> {
        let skip = self.metrics.len().saturating_sub(count);
        self.metrics.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn max_metrics(&self) -> usize {
        self.max_metrics
    }

    pub fn clear(&mut self) {
        self.metrics.clear();
    }

    pub fn export(&self) -> Vec<SearchMetrics> {
        self.metrics.iter().cloned().collect()
    }

    /// Historical success rate of a source in `[0, 1]`, `None` without attempts
    pub fn source_success_rate(&self, source: &str) -> Option<f64> {
        let (attempts, successes) = self.metrics.iter().fold((0usize, 0usize), |acc, metric| {
            let attempted = metric.sources.iter().any(|s| s == source);
            let succeeded = metric.successful_sources.iter().any(|s| s == source);
            (acc.0 + attempted as usize, acc.1 + succeeded as usize)
        });

        (attempts > 0).then(|| successes as f64 / attempts as f64)
    }

    /// Aggregate searches whose timestamp lies within the inclusive window
    pub fn aggregated_metrics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AggregatedMetrics {
        let window: Vec<&SearchMetrics> = self
            .metrics
            .iter()
            .filter(|metric| start.map_or(true, |start| metric.timestamp >= start))
            .filter(|metric| end.map_or(true, |end| metric.timestamp <= end))
            .collect();

        let total = window.len();
        if total == 0 {
            return AggregatedMetrics::default();
        }

        let total_duration: u64 = window.iter().map(|m| m.duration_ms).sum();
        let total_jobs: usize = window.iter().map(|m| m.jobs_found).sum();
        let successful = window.iter().filter(|m| m.jobs_found > 0).count();
        let cache_hits = window.iter().filter(|m| m.cache_hit).count();
        let total_errors: usize = window.iter().map(|m| m.error_count).sum();

        let mut source_counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for metric in &window {
            for source in &metric.sources {
                let counts = source_counts.entry(source.as_str()).or_default();
                counts.0 += 1;
                if metric.successful_sources.contains(source) {
                    counts.1 += 1;
                }
            }
        }

        let source_success_rates = source_counts
            .into_iter()
            .map(|(source, (attempts, successes))| {
                (source.to_string(), percentage(successes, attempts))
            })
            .collect();

        AggregatedMetrics {
            total_searches: total,
            average_duration_ms: total_duration as f64 / total as f64,
            average_jobs_found: total_jobs as f64 / total as f64,
            success_rate: percentage(successful, total),
            cache_hit_rate: percentage(cache_hits, total),
            source_success_rates,
            error_rate: total_errors as f64 / total as f64,
            top_queries: top_frequencies(window.iter().map(|m| m.query.as_str())),
            top_locations: top_frequencies(window.iter().filter_map(|m| m.location.as_deref())),
        }
    }
}

fn top_frequencies<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let folded = fold_label(value);
        if !folded.is_empty() {
            *counts.entry(folded).or_default() += 1;
        }
    }

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(value, count)| FrequencyEntry { value, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(TOP_ENTRIES);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn metric(query: &str, jobs_found: usize) -> SearchMetrics {
        let mut metric = SearchMetrics::new(query, Some("Remote"));
        metric.jobs_found = jobs_found;
        metric
    }

    fn attempted(query: &str, ok: &[&str], failed: &[&str]) -> SearchMetrics {
        let mut metric = metric(query, ok.len());
        metric.successful_sources = ok.iter().map(|s| s.to_string()).collect();
        metric.failed_sources = failed.iter().map(|s| s.to_string()).collect();
        metric.sources = ok.iter().chain(failed).map(|s| s.to_string()).collect();
        metric.error_count = failed.len();
        metric
    }

    #[test]
    fn test_buffer_drops_oldest_first() {
        let mut analytics = SearchAnalytics::new(3);
        for i in 0..4 {
            analytics.add_metric(metric(&format!("query {}", i), i));
        }

        assert_eq!(analytics.len(), 3);
        let queries: Vec<String> = analytics.export().into_iter().map(|m| m.query).collect();
        assert_eq!(queries, vec!["query 1", "query 2", "query 3"]);
    }

    #[test]
    fn test_default_capacity_holds_one_thousand() {
        let mut analytics = SearchAnalytics::default();
        for i in 0..=DEFAULT_MAX_METRICS {
            analytics.add_metric(metric(&i.to_string(), 0));
        }

        assert_eq!(analytics.len(), DEFAULT_MAX_METRICS);
        assert_eq!(analytics.export()[0].query, "1");
    }

    #[test]
    fn test_recent_metrics_most_recent_last() {
        let mut analytics = SearchAnalytics::new(10);
        for query in ["a", "b", "c"] {
            analytics.add_metric(metric(query, 1));
        }

        let recent: Vec<String> = analytics
            .recent_metrics(2)
            .into_iter()
            .map(|m| m.query)
            .collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(analytics.recent_metrics(50).len(), 3);
    }

    #[test]
    fn test_empty_aggregation_is_zeroed() {
        let analytics = SearchAnalytics::new(10);
        let aggregated = analytics.aggregated_metrics(None, None);

        assert_eq!(aggregated, AggregatedMetrics::default());
        assert_eq!(aggregated.success_rate, 0.0);
        assert_eq!(aggregated.error_rate, 0.0);
    }

    #[test]
    fn test_window_filtering_out_everything_is_zeroed() {
        let mut analytics = SearchAnalytics::new(10);
        analytics.add_metric(metric("rust", 3));

        let future = Utc::now() + Duration::hours(1);
        let aggregated = analytics.aggregated_metrics(Some(future), None);
        assert_eq!(aggregated.total_searches, 0);
        assert_eq!(aggregated.cache_hit_rate, 0.0);
        assert!(aggregated.top_queries.is_empty());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let mut analytics = SearchAnalytics::new(10);
        let entry = metric("rust", 3);
        let at = entry.timestamp;
        analytics.add_metric(entry);

        assert_eq!(analytics.aggregated_metrics(Some(at), Some(at)).total_searches, 1);
    }

    #[test]
    fn test_aggregates() {
        let mut analytics = SearchAnalytics::new(10);

        let mut first = attempted("Rust Engineer", &["indeed"], &["linkedin"]);
        first.duration_ms = 100;
        let mut second = attempted(" rust engineer ", &["indeed", "linkedin"], &[]);
        second.duration_ms = 300;
        let mut third = metric("Chef", 0);
        third.cache_hit = true;
        third.location = Some("Paris".into());

        analytics.add_metric(first);
        analytics.add_metric(second);
        analytics.add_metric(third);

        let aggregated = analytics.aggregated_metrics(None, None);
        assert_eq!(aggregated.total_searches, 3);
        assert!((aggregated.average_duration_ms - 400.0 / 3.0).abs() < 1e-9);
        assert!((aggregated.average_jobs_found - 1.0).abs() < 1e-9);
        assert!((aggregated.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!((aggregated.cache_hit_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((aggregated.error_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(aggregated.source_success_rates["indeed"], 100.0);
        assert_eq!(aggregated.source_success_rates["linkedin"], 50.0);

        assert_eq!(
            aggregated.top_queries[0],
            FrequencyEntry {
                value: "rust engineer".into(),
                count: 2
            }
        );
        assert_eq!(aggregated.top_locations[0].value, "remote");
        assert_eq!(aggregated.top_locations[1].value, "paris");
    }

    #[test]
    fn test_top_queries_capped_at_ten() {
        let mut analytics = SearchAnalytics::new(100);
        for i in 0..15 {
            analytics.add_metric(metric(&format!("query {:02}", i), 1));
        }
        assert_eq!(analytics.aggregated_metrics(None, None).top_queries.len(), 10);
    }

    #[test]
    fn test_source_success_rate() {
        let mut analytics = SearchAnalytics::new(10);
        assert_eq!(analytics.source_success_rate("indeed"), None);

        analytics.add_metric(attempted("a", &["indeed"], &[]));
        analytics.add_metric(attempted("b", &[], &["indeed"]));

        assert_eq!(analytics.source_success_rate("indeed"), Some(0.5));
        assert_eq!(analytics.source_success_rate("linkedin"), None);
    }
}
