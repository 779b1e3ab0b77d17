// src/aggregator/filters.rs
use chrono::{DateTime, Duration, Utc};

use crate::types::{JobType, RawJob, SearchCriteria};

fn searchable_text(job: &RawJob) -> String {
    format!("{} {} {}", job.title, job.company, job.description).to_lowercase()
}

/// Whether a posting passes the hard filters of a request.
///
/// Keywords match case-insensitively as substrings of title, company and
/// description: any exclude term rejects, and when include terms are given at
/// least one must appear. Postings with an unknown job type or posting date
/// are kept.
pub fn matches_criteria(job: &RawJob, criteria: &SearchCriteria, now: DateTime<Utc>) -> bool {
    if let Some(keywords) = &criteria.keywords {
        let text = searchable_text(job);
        if keywords
            .exclude
            .iter()
            .any(|term| text.contains(&term.to_lowercase()))
        {
            return false;
        }
        if !keywords.include.is_empty()
            && !keywords
                .include
                .iter()
                .any(|term| text.contains(&term.to_lowercase()))
        {
            return false;
        }
    }

    if let Some(job_types) = criteria.job_types.as_ref().filter(|types| !types.is_empty()) {
        let remote_ok =
            job_types.contains(&JobType::Remote) && job.location.to_lowercase().contains("remote");
        let type_ok = match job.job_type {
            Some(job_type) => job_types.contains(&job_type),
            None => true,
        };
        if !(type_ok || remote_ok) {
            return false;
        }
    }

    if let (Some(days), Some(posted_at)) = (criteria.posted_within_days, job.posted_at) {
        if now - posted_at > Duration::days(i64::from(days)) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeywordFilter;

    fn job() -> RawJob {
        RawJob::new("indeed", "Rust Engineer", "Acme", "Berlin")
            .with_description("Async services with tokio")
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        assert!(matches_criteria(&job(), &SearchCriteria::new("rust"), Utc::now()));
    }

    #[test]
    fn test_keywords() {
        let mut criteria = SearchCriteria::new("rust");
        criteria.keywords = Some(KeywordFilter {
            include: vec!["tokio".into(), "actix".into()],
            exclude: vec![],
        });
        assert!(matches_criteria(&job(), &criteria, Utc::now()));

        criteria.keywords = Some(KeywordFilter {
            include: vec!["actix".into()],
            exclude: vec![],
        });
        assert!(!matches_criteria(&job(), &criteria, Utc::now()));

        criteria.keywords = Some(KeywordFilter {
            include: vec![],
            exclude: vec!["ACME".into()],
        });
        assert!(!matches_criteria(&job(), &criteria, Utc::now()));
    }

    #[test]
    fn test_job_types() {
        let mut criteria = SearchCriteria::new("rust");
        criteria.job_types = Some(vec![JobType::FullTime]);

        assert!(matches_criteria(&job(), &criteria, Utc::now()));
        assert!(matches_criteria(&job().with_job_type(JobType::FullTime), &criteria, Utc::now()));
        assert!(!matches_criteria(&job().with_job_type(JobType::Contract), &criteria, Utc::now()));

        criteria.job_types = Some(vec![JobType::Remote]);
        let remote = RawJob::new("indeed", "Rust Engineer", "Acme", "Remote")
            .with_job_type(JobType::Contract);
        assert!(matches_criteria(&remote, &criteria, Utc::now()));
    }

    #[test]
    fn test_posted_within_days() {
        let now = Utc::now();
        let mut criteria = SearchCriteria::new("rust");
        criteria.posted_within_days = Some(7);

        assert!(matches_criteria(&job().with_posted_at(now - Duration::days(3)), &criteria, now));
        assert!(!matches_criteria(&job().with_posted_at(now - Duration::days(10)), &criteria, now));
        assert!(matches_criteria(&job(), &criteria, now));
    }
}
