use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::ScoredJob;

// ===== Search Response Types =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub total_jobs_found: usize,
    pub unique_jobs: usize,
    pub duplicates_removed: usize,
    pub successful_sources: Vec<String>,
    pub failed_sources: Vec<String>,
    pub partial_results: bool,
    pub search_duration_ms: u64,
    pub total_duration_ms: u64,
    pub average_score: f64,
    pub score_distribution: ScoreDistribution,
    #[serde(default)]
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchJobsData {
    pub jobs: Vec<ScoredJob>,
    pub metadata: SearchMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    ValidationError,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuccess {
    pub success: bool,
    pub data: SearchJobsData,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFailure {
    pub success: bool,
    pub error: ApiError,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a search as sent to clients, discriminated by `success`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchJobsResponse {
    Success(SearchSuccess),
    Failure(SearchFailure),
}

impl SearchJobsResponse {
    pub fn success(data: SearchJobsData) -> Self {
        SearchJobsResponse::Success(SearchSuccess {
            success: true,
            data,
            timestamp: Utc::now(),
        })
    }

    pub fn failure(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        SearchJobsResponse::Failure(SearchFailure {
            success: false,
            error: ApiError {
                code,
                message: message.into(),
                details,
            },
            timestamp: Utc::now(),
        })
    }

    pub fn validation_error(errors: Vec<String>) -> Self {
        Self::failure(
            ApiErrorCode::ValidationError,
            "Invalid search request",
            Some(serde_json::json!({ "errors": errors })),
        )
    }

    /// Generic failure; internal detail stays in the server log
    pub fn internal_error() -> Self {
        Self::failure(
            ApiErrorCode::InternalError,
            "An unexpected error occurred while searching for jobs",
            None,
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchJobsResponse::Success(_))
    }

    pub fn data(&self) -> Option<&SearchJobsData> {
        match self {
            SearchJobsResponse::Success(success) => Some(&success.data),
            SearchJobsResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            SearchJobsResponse::Success(_) => None,
            SearchJobsResponse::Failure(failure) => Some(&failure.error),
        }
    }
}
