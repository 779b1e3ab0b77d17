// src/types/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::JobType;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSalary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

/// A posting as extracted by a scraper, before dedup and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<JobSalary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    pub source: String,
}

impl RawJob {
    pub fn new(source: &str, title: &str, company: &str, location: &str) -> Self {
        Self {
            external_id: None,
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            description: String::new(),
            url: String::new(),
            salary: None,
            job_type: None,
            posted_at: None,
            source: source.to_string(),
        }
    }

    pub fn with_external_id(mut self, id: &str) -> Self {
        self.external_id = Some(id.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_salary(mut self, min: Option<f64>, max: Option<f64>, currency: &str) -> Self {
        self.salary = Some(JobSalary {
            min,
            max,
            currency: Some(currency.to_string()),
        });
        self
    }

    pub fn with_job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }

    pub fn with_posted_at(mut self, posted_at: DateTime<Utc>) -> Self {
        self.posted_at = Some(posted_at);
        self
    }
}

/// Component scores, each in `[0, 1]`. `total` is the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub location_match: f64,
    pub title_relevance: f64,
    pub salary_fit: f64,
    pub source_quality: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    pub id: String,
    #[serde(flatten)]
    pub job: RawJob,
    pub score: ScoreBreakdown,
}
