// src/aggregator/scoring.rs
//! Relevance scoring. Every component lies in `[0, 1]`; `total` is the
//! weighted sum normalized by the sum of the weights.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::{RawJob, ScoreBreakdown, ScoreDistribution, SearchCriteria};
use crate::utils::{normalize_text, tokenize};

pub const HIGH_SCORE_THRESHOLD: f64 = 0.7;
pub const MEDIUM_SCORE_THRESHOLD: f64 = 0.4;

const DEFAULT_SOURCE_QUALITY: f64 = 0.5;
// Component value when the request expresses no preference
const NEUTRAL: f64 = 0.5;
const UNKNOWN_SALARY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub location: f64,
    pub title: f64,
    pub salary: f64,
    pub source_quality: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            location: 0.30,
            title: 0.35,
            salary: 0.15,
            source_quality: 0.20,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.location + self.title + self.salary + self.source_quality
    }
}

#[derive(Debug, Clone)]
pub struct JobScorer {
    weights: ScoringWeights,
    source_quality: HashMap<String, f64>,
}

impl JobScorer {
    pub fn new(weights: ScoringWeights, source_quality: HashMap<String, f64>) -> Self {
        Self {
            weights,
            source_quality,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, job: &RawJob, criteria: &SearchCriteria) -> ScoreBreakdown {
        let location_match = location_match(job, criteria);
        let title_relevance = title_relevance(job, &criteria.query);
        let salary_fit = salary_fit(job, criteria);
        let source_quality = self.source_quality(&job.source);

        let weight_sum = self.weights.sum();
        let total = if weight_sum > 0.0 {
            (location_match * self.weights.location
                + title_relevance * self.weights.title
                + salary_fit * self.weights.salary
                + source_quality * self.weights.source_quality)
                / weight_sum
        } else {
            0.0
        };

        ScoreBreakdown {
            location_match,
            title_relevance,
            salary_fit,
            source_quality,
            total: total.clamp(0.0, 1.0),
        }
    }

    pub fn source_quality(&self, source: &str) -> f64 {
        self.source_quality
            .get(source)
            .copied()
            .unwrap_or(DEFAULT_SOURCE_QUALITY)
            .clamp(0.0, 1.0)
    }
}

/// Share of `wanted` tokens present in `have`
fn token_coverage(wanted: &[String], have: &[String]) -> f64 {
    if wanted.is_empty() {
        return 0.0;
    }
    let have: HashSet<&String> = have.iter().collect();
    let hits = wanted.iter().filter(|token| have.contains(token)).count();
    hits as f64 / wanted.len() as f64
}

pub fn location_match(job: &RawJob, criteria: &SearchCriteria) -> f64 {
    let targets: Vec<&str> = criteria
        .location
        .iter()
        .chain(criteria.preferred_locations.iter().flatten())
        .map(String::as_str)
        .collect();

    if targets.is_empty() {
        return NEUTRAL;
    }

    let job_location = normalize_text(&job.location);
    if job_location.is_empty() {
        return 0.0;
    }
    let job_tokens = tokenize(&job.location);

    targets
        .iter()
        .map(|target| {
            let target_norm = normalize_text(target);
            if target_norm.is_empty() {
                0.0
            } else if job_location == target_norm
                || job_location.contains(&target_norm)
                || target_norm.contains(&job_location)
            {
                1.0
            } else {
                token_coverage(&tokenize(target), &job_tokens)
            }
        })
        .fold(0.0, f64::max)
}

pub fn title_relevance(job: &RawJob, query: &str) -> f64 {
    let query_norm = normalize_text(query);
    let title_norm = normalize_text(&job.title);
    if query_norm.is_empty() {
        return NEUTRAL;
    }
    if title_norm.contains(&query_norm) {
        return 1.0;
    }

    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let title_score = token_coverage(&query_tokens, &tokenize(&job.title));
    // A query term only found in the description still counts for a little
    let description_score = token_coverage(&query_tokens, &tokenize(&job.description)) * 0.3;
    title_score.max(description_score)
}

pub fn salary_fit(job: &RawJob, criteria: &SearchCriteria) -> f64 {
    let Some(wanted) = &criteria.salary else {
        return NEUTRAL;
    };
    let Some(offered) = &job.salary else {
        return UNKNOWN_SALARY;
    };

    if let Some(currency) = &offered.currency {
        if !currency.eq_ignore_ascii_case(&wanted.currency) {
            return UNKNOWN_SALARY;
        }
    }

    let top = match (offered.min, offered.max) {
        (Some(min), Some(max)) => min.max(max),
        (Some(value), None) | (None, Some(value)) => value,
        (None, None) => return UNKNOWN_SALARY,
    };

    // Overlapping the wanted range or paying above it is a full fit
    if top >= wanted.min {
        1.0
    } else if wanted.min > 0.0 {
        (top / wanted.min).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

pub fn score_bucket(total: f64) -> &'static str {
    if total >= HIGH_SCORE_THRESHOLD {
        "high"
    } else if total >= MEDIUM_SCORE_THRESHOLD {
        "medium"
    } else {
        "low"
    }
}

pub fn distribution<'a>(totals: impl Iterator<Item = &'a ScoreBreakdown>) -> ScoreDistribution {
    totals.fold(ScoreDistribution::default(), |mut acc, score| {
        match score_bucket(score.total) {
            "high" => acc.high += 1,
            "medium" => acc.medium += 1,
            _ => acc.low += 1,
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SalaryRange;

    fn scorer() -> JobScorer {
        JobScorer::new(
            ScoringWeights::default(),
            HashMap::from([("linkedin".to_string(), 0.8), ("indeed".to_string(), 0.75)]),
        )
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::new("rust engineer").with_location("Berlin")
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_match_scores_high() {
        let job = RawJob::new("linkedin", "Senior Rust Engineer", "Acme", "Berlin, Germany");
        let score = scorer().score(&job, &criteria());

        assert_eq!(score.location_match, 1.0);
        assert_eq!(score.title_relevance, 1.0);
        assert_eq!(score.salary_fit, 0.5);
        assert_eq!(score.source_quality, 0.8);
        let expected = 0.30 + 0.35 + 0.15 * 0.5 + 0.20 * 0.8;
        assert!((score.total - expected).abs() < 1e-9);
        assert_eq!(score_bucket(score.total), "high");
    }

    #[test]
    fn test_components_stay_in_unit_interval() {
        let jobs = [
            RawJob::new("indeed", "", "", ""),
            RawJob::new("monster", "Chef", "Diner", "Paris"),
            RawJob::new("indeed", "Rust", "Acme", "Remote").with_salary(Some(10.0), None, "USD"),
        ];
        let mut criteria = criteria();
        criteria.salary = Some(SalaryRange {
            min: 100_000.0,
            max: 150_000.0,
            currency: "USD".into(),
        });

        for job in &jobs {
            let score = scorer().score(job, &criteria);
            for value in [
                score.location_match,
                score.title_relevance,
                score.salary_fit,
                score.source_quality,
                score.total,
            ] {
                assert!((0.0..=1.0).contains(&value), "{:?}", score);
            }
        }
    }

    #[test]
    fn test_partial_title_and_location_matches() {
        let job = RawJob::new("indeed", "Rust Developer", "Acme", "Munich");
        assert_eq!(title_relevance(&job, "rust engineer"), 0.5);
        assert_eq!(location_match(&job, &criteria()), 0.0);

        let mut preferred = criteria();
        preferred.preferred_locations = Some(vec!["Munich".into()]);
        assert_eq!(location_match(&job, &preferred), 1.0);

        let no_location = SearchCriteria::new("rust");
        assert_eq!(location_match(&job, &no_location), 0.5);
    }

    #[test]
    fn test_salary_fit() {
        let mut criteria = criteria();
        criteria.salary = Some(SalaryRange {
            min: 100_000.0,
            max: 150_000.0,
            currency: "USD".into(),
        });

        let overlapping = RawJob::new("indeed", "Rust", "A", "B").with_salary(
            Some(90_000.0),
            Some(120_000.0),
            "USD",
        );
        let below = RawJob::new("indeed", "Rust", "A", "B").with_salary(
            Some(40_000.0),
            Some(50_000.0),
            "USD",
        );
        let other_currency =
            RawJob::new("indeed", "Rust", "A", "B").with_salary(Some(120_000.0), None, "EUR");
        let unknown = RawJob::new("indeed", "Rust", "A", "B");

        assert_eq!(salary_fit(&overlapping, &criteria), 1.0);
        assert_eq!(salary_fit(&below, &criteria), 0.5);
        assert_eq!(salary_fit(&other_currency, &criteria), 0.3);
        assert_eq!(salary_fit(&unknown, &criteria), 0.3);
    }

    #[test]
    fn test_unknown_source_gets_default_quality() {
        assert_eq!(scorer().source_quality("monster"), 0.5);
    }

    #[test]
    fn test_distribution_buckets() {
        let scores: Vec<ScoreBreakdown> = [0.9, 0.7, 0.69, 0.4, 0.1]
            .iter()
            .map(|total| ScoreBreakdown {
                total: *total,
                ..ScoreBreakdown::default()
            })
            .collect();

        assert_eq!(
            distribution(scores.iter()),
            ScoreDistribution {
                high: 2,
                medium: 2,
                low: 1
            }
        );
    }
}
