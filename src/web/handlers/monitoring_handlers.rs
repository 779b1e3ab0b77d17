// src/web/handlers/monitoring_handlers.rs
//! Search analytics and cache statistics.
//!
//! `DELETE /jobs/monitoring` is not authenticated; it is meant for operators
//! on a trusted network.

use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::aggregator::JobSearchPipeline;
use crate::web::types::{
    ActionResponse, DataResponse, MonitoringData, RecentSearchesData, StandardErrorResponse,
};

pub const DEFAULT_RECENT_COUNT: usize = 20;
pub const MAX_RECENT_COUNT: usize = 100;

type HandlerResult<T> = Result<Json<T>, (rocket::http::Status, Json<StandardErrorResponse>)>;

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| format!("{} must be an RFC 3339 timestamp", name))
        })
        .transpose()
}

fn state_unavailable() -> (rocket::http::Status, Json<StandardErrorResponse>) {
    (
        rocket::http::Status::InternalServerError,
        Json(StandardErrorResponse::new(
            "Monitoring data is unavailable",
            "INTERNAL_ERROR",
            vec!["Try again in a few moments".to_string()],
        )),
    )
}

pub async fn monitoring_handler(
    start: Option<&str>,
    end: Option<&str>,
    pipeline: &State<JobSearchPipeline>,
) -> HandlerResult<DataResponse<MonitoringData>> {
    let (start, end) = match (parse_bound("start", start), parse_bound("end", end)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(message), _) | (_, Err(message)) => {
            return Err((
                rocket::http::Status::BadRequest,
                Json(StandardErrorResponse::new(
                    message,
                    "VALIDATION_ERROR",
                    vec!["Use a timestamp such as 2024-01-31T12:00:00Z".to_string()],
                )),
            ))
        }
    };

    let metrics = match pipeline.analytics().lock() {
        Ok(analytics) => analytics.aggregated_metrics(start, end),
        Err(_) => {
            error!("Search analytics lock poisoned");
            return Err(state_unavailable());
        }
    };
    let cache = match pipeline.cache().lock() {
        Ok(cache) => cache.stats(),
        Err(_) => {
            error!("Search cache lock poisoned");
            return Err(state_unavailable());
        }
    };

    Ok(Json(DataResponse::success(
        format!("{} searches in window", metrics.total_searches),
        MonitoringData {
            metrics,
            cache,
            sources: pipeline.registry().names(),
        },
    )))
}

pub async fn recent_searches_handler(
    count: Option<usize>,
    pipeline: &State<JobSearchPipeline>,
) -> HandlerResult<DataResponse<RecentSearchesData>> {
    let count = count.unwrap_or(DEFAULT_RECENT_COUNT).min(MAX_RECENT_COUNT);

    let analytics = match pipeline.analytics().lock() {
        Ok(analytics) => analytics,
        Err(_) => {
            error!("Search analytics lock poisoned");
            return Err(state_unavailable());
        }
    };

    let searches = analytics.recent_metrics(count);
    Ok(Json(DataResponse::success(
        format!("{} recent searches", searches.len()),
        RecentSearchesData {
            searches,
            total_recorded: analytics.len(),
        },
    )))
}

pub async fn reset_monitoring_handler(
    pipeline: &State<JobSearchPipeline>,
) -> HandlerResult<ActionResponse> {
    match (pipeline.cache().lock(), pipeline.analytics().lock()) {
        (Ok(mut cache), Ok(mut analytics)) => {
            cache.clear();
            analytics.clear();
        }
        _ => {
            error!("Cannot reset monitoring state: lock poisoned");
            return Err(state_unavailable());
        }
    }

    info!("Search cache and analytics cleared");
    Ok(Json(ActionResponse::success(
        "Search cache and analytics cleared",
        "monitoring_reset",
    )))
}
