// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::aggregator::JobSearchPipeline;
use crate::auth::OptionalAuth;
use crate::core::Database;
use crate::web::types::TextResponse;

pub async fn health_handler(
    auth: OptionalAuth,
    pipeline: &State<JobSearchPipeline>,
    db: &State<Database>,
) -> Json<TextResponse> {
    match auth.user {
        Some(user) => info!("Health check by authenticated user: {}", user.user_id),
        None => info!("Health check by anonymous user"),
    }

    let database = match db.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            error!("Database health check failed: {:#}", e);
            "unavailable"
        }
    };

    Json(TextResponse::success(format!(
        "OK (sources: {}; database: {})",
        pipeline.registry().names().join(", "),
        database
    )))
}
