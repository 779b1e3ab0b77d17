// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use crate::aggregator::{build_pipeline, JobSearchPipeline};
use crate::auth::{AuthConfig, AuthenticatedUser, OptionalAuth};
use crate::core::{ConfigManager, Database, SavedSearch};
use crate::types::SearchJobsResponse;
use anyhow::{anyhow, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

type ErrorResult<T> = Result<Json<T>, (Status, Json<StandardErrorResponse>)>;

// Raw body so malformed JSON still gets the search failure envelope
#[post("/jobs/search", data = "<payload>")]
pub async fn search_jobs(
    payload: String,
    pipeline: &State<JobSearchPipeline>,
) -> (Status, Json<SearchJobsResponse>) {
    handlers::search_jobs_handler(payload, pipeline).await
}

#[get("/jobs/monitoring?<start>&<end>")]
pub async fn monitoring(
    start: Option<&str>,
    end: Option<&str>,
    pipeline: &State<JobSearchPipeline>,
) -> ErrorResult<DataResponse<MonitoringData>> {
    handlers::monitoring_handler(start, end, pipeline).await
}

#[get("/jobs/monitoring/recent?<count>")]
pub async fn recent_searches(
    count: Option<usize>,
    pipeline: &State<JobSearchPipeline>,
) -> ErrorResult<DataResponse<RecentSearchesData>> {
    handlers::recent_searches_handler(count, pipeline).await
}

#[delete("/jobs/monitoring")]
pub async fn reset_monitoring(pipeline: &State<JobSearchPipeline>) -> ErrorResult<ActionResponse> {
    handlers::reset_monitoring_handler(pipeline).await
}

#[post("/jobs/saved", data = "<request>")]
pub async fn save_search(
    request: Json<SaveSearchRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ErrorResult<DataResponse<SavedSearch>> {
    handlers::save_search_handler(request, auth, db).await
}

#[get("/jobs/saved")]
pub async fn list_saved_searches(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ErrorResult<DataResponse<Vec<SavedSearch>>> {
    handlers::list_saved_searches_handler(auth, db).await
}

#[delete("/jobs/saved/<id>")]
pub async fn delete_saved_search(
    id: &str,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ErrorResult<ActionResponse> {
    handlers::delete_saved_search_handler(id, auth, db).await
}

#[get("/health")]
pub async fn health(
    auth: OptionalAuth,
    pipeline: &State<JobSearchPipeline>,
    db: &State<Database>,
) -> Json<TextResponse> {
    handlers::health_handler(auth, pipeline, db).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format",
        "BAD_REQUEST",
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized(req: &Request) -> Json<StandardErrorResponse> {
    let message = match req.local_cache(|| None::<crate::auth::AuthError>) {
        Some(error) => error.message(),
        None => "Authentication required",
    };
    Json(StandardErrorResponse::new(
        message,
        "AUTHORIZATION_ERROR",
        vec!["Send a valid bearer token in the Authorization header".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found(req: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {} {}", req.method(), req.uri().path()),
        "NOT_FOUND",
        vec!["Check the endpoint path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable_entity() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body has the wrong shape",
        "BAD_REQUEST",
        vec!["Verify all required fields are present".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error",
        "INTERNAL_ERROR",
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Assemble the application from already-built state
pub fn build_rocket(
    figment: rocket::figment::Figment,
    pipeline: JobSearchPipeline,
    database: Database,
    auth_config: AuthConfig,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(pipeline)
        .manage(database)
        .manage(auth_config)
        .register(
            "/api",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                unprocessable_entity,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                search_jobs,
                monitoring,
                recent_searches,
                reset_monitoring,
                save_search,
                list_saved_searches,
                delete_saved_search,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    config.ensure_directories().await?;

    let database = match Database::new(&config.environment.database_path).await {
        Ok(database) => database,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    let pipeline = build_pipeline(&config)?;
    let auth_config = AuthConfig::new(config.auth.jwt_secret.clone());

    let figment = rocket::Config::figment()
        .merge(("address", config.environment.address.clone()))
        .merge(("port", config.environment.port));

    info!("Starting job search API server");
    info!("Environment: {}", config.environment.name);
    info!("Database: {}", config.environment.database_path.display());
    info!(
        "Server: http://{}:{}",
        config.environment.address, config.environment.port
    );

    let rocket = build_rocket(figment, pipeline, database, auth_config)
        .launch()
        .await
        .map_err(|e| anyhow!("Web server failed: {}", e))?;

    if let Some(pipeline) = rocket.state::<JobSearchPipeline>() {
        pipeline.registry().close_all().await;
    }
    info!("Server stopped");

    Ok(())
}
