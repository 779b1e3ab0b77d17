// src/aggregator/dedup.rs
//! Collapse postings that describe the same job.
//!
//! A posting's identity is its external id scoped to the source when the
//! board supplies one, else its normalized `title|company|location`. On top
//! of exact identity, two postings with the same normalized company and
//! location whose titles have a token Jaccard similarity of at least
//! [`TITLE_SIMILARITY_THRESHOLD`] are duplicates. The first posting seen wins.

use std::collections::HashSet;
use uuid::Uuid;

use crate::types::RawJob;
use crate::utils::{normalize_text, token_similarity};

pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
    "company",
    "gmbh",
    "plc",
    "sa",
    "ag",
    "bv",
];

#[derive(Debug, Clone, PartialEq)]
pub struct UniqueJob {
    /// Stable id derived from the identity key
    pub id: String,
    pub job: RawJob,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    pub jobs: Vec<UniqueJob>,
    pub duplicates_removed: usize,
}

/// Company name without trailing legal-form tokens ("Acme, Inc." -> "acme")
pub fn normalize_company(company: &str) -> String {
    let normalized = normalize_text(company);
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| LEGAL_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

fn content_key(job: &RawJob) -> String {
    format!(
        "{}|{}|{}",
        normalize_text(&job.title),
        normalize_company(&job.company),
        normalize_text(&job.location)
    )
}

pub fn identity_key(job: &RawJob) -> String {
    match job.external_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => format!("{}:{}", job.source.to_lowercase(), id),
        _ => content_key(job),
    }
}

pub fn stable_id(identity: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, identity.as_bytes()).to_string()
}

struct Seen {
    company: String,
    location: String,
    title: String,
}

pub fn deduplicate(jobs: Vec<RawJob>) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();
    let mut identities: HashSet<String> = HashSet::new();
    let mut content_keys: HashSet<String> = HashSet::new();
    let mut seen: Vec<Seen> = Vec::new();

    for job in jobs {
        let identity = identity_key(&job);
        let content = content_key(&job);

        let company = normalize_company(&job.company);
        let location = normalize_text(&job.location);
        let is_duplicate = identities.contains(&identity)
            || content_keys.contains(&content)
            || seen.iter().any(|other| {
                other.company == company
                    && other.location == location
                    && token_similarity(&other.title, &job.title) >= TITLE_SIMILARITY_THRESHOLD
            });

        if is_duplicate {
            outcome.duplicates_removed += 1;
            continue;
        }

        seen.push(Seen {
            company,
            location,
            title: job.title.clone(),
        });
        outcome.jobs.push(UniqueJob {
            id: stable_id(&identity),
            job,
        });
        identities.insert(identity);
        content_keys.insert(content);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_company_strips_legal_suffixes() {
        assert_eq!(normalize_company("Acme, Inc."), "acme");
        assert_eq!(normalize_company("Globex Corp LLC"), "globex");
        assert_eq!(normalize_company("Initech GmbH"), "initech");
        // a bare suffix is kept rather than emptied
        assert_eq!(normalize_company("Co"), "co");
    }

    #[test]
    fn test_case_and_punctuation_variants_collapse() {
        let jobs = vec![
            RawJob::new("indeed", "Senior Rust Engineer", "Acme, Inc.", "Berlin, Germany"),
            RawJob::new("linkedin", "senior rust engineer!", "ACME", "berlin germany"),
        ];

        let outcome = deduplicate(jobs);

        assert_eq!(outcome.jobs.len(), 1);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.jobs[0].job.source, "indeed");
    }

    #[test]
    fn test_external_ids_are_scoped_per_source() {
        let jobs = vec![
            RawJob::new("indeed", "Rust Engineer", "Acme", "Berlin").with_external_id("42"),
            RawJob::new("indeed", "Rust Engineer (repost)", "Acme", "Berlin")
                .with_external_id("42"),
            RawJob::new("linkedin", "Platform Engineer", "Globex", "Paris").with_external_id("42"),
        ];

        let outcome = deduplicate(jobs);

        assert_eq!(outcome.jobs.len(), 2);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.jobs[1].job.source, "linkedin");
    }

    #[test]
    fn test_similar_titles_at_same_company_and_location() {
        let jobs = vec![
            RawJob::new(
                "indeed",
                "Senior Backend Rust Engineer Payments Platform",
                "Acme",
                "Remote",
            ),
            RawJob::new(
                "linkedin",
                "Senior Backend Rust Engineer - Payments Platform Team",
                "Acme",
                "Remote",
            ),
            RawJob::new("linkedin", "Frontend Engineer", "Acme", "Remote"),
        ];

        let outcome = deduplicate(jobs);

        assert_eq!(outcome.jobs.len(), 2);
        assert_eq!(outcome.jobs[1].job.title, "Frontend Engineer");
    }

    #[test]
    fn test_same_title_elsewhere_is_distinct() {
        let jobs = vec![
            RawJob::new("indeed", "Rust Engineer", "Acme", "Berlin"),
            RawJob::new("indeed", "Rust Engineer", "Acme", "Munich"),
            RawJob::new("indeed", "Rust Engineer", "Globex", "Berlin"),
        ];

        assert_eq!(deduplicate(jobs).jobs.len(), 3);
    }

    #[test]
    fn test_ids_are_stable() {
        let job = RawJob::new("indeed", "Rust Engineer", "Acme", "Berlin").with_external_id("abc");
        let first = deduplicate(vec![job.clone()]);
        let second = deduplicate(vec![job]);
        assert_eq!(first.jobs[0].id, second.jobs[0].id);
        assert_eq!(first.jobs[0].id, stable_id("indeed:abc"));
    }
}
