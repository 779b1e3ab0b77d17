// src/web/handlers/search_handlers.rs
use rocket::http::Status;
use rocket::serde::json::{Json, Value};
use rocket::State;
use tracing::{info, warn};

use crate::aggregator::JobSearchPipeline;
use crate::types::{ApiErrorCode, SearchJobsResponse};
use crate::validation::{validate_search_request, ValidationResult};

pub async fn search_jobs_handler(
    body: String,
    pipeline: &State<JobSearchPipeline>,
) -> (Status, Json<SearchJobsResponse>) {
    let payload: Value = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejected search request with malformed JSON: {}", e);
            return (
                Status::BadRequest,
                Json(SearchJobsResponse::validation_error(vec![format!(
                    "Request body must be valid JSON: {}",
                    e
                )])),
            );
        }
    };

    let criteria = match validate_search_request(&payload) {
        ValidationResult::Valid(criteria) => criteria,
        ValidationResult::Invalid(errors) => {
            warn!(errors = ?errors, "Rejected invalid search request");
            return (
                Status::BadRequest,
                Json(SearchJobsResponse::validation_error(errors)),
            );
        }
    };

    info!(query = %criteria.query, location = ?criteria.location, "Job search requested");

    let response = pipeline.search(&criteria).await;
    let status = match response.error().map(|error| error.code) {
        None => Status::Ok,
        Some(ApiErrorCode::ValidationError) => Status::BadRequest,
        Some(ApiErrorCode::InternalError) => Status::InternalServerError,
    };

    (status, Json(response))
}
