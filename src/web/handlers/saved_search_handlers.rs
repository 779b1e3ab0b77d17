// src/web/handlers/saved_search_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::core::{Database, SavedSearch, SavedSearchRepository};
use crate::validation::{validate_search_request, ValidationResult};
use crate::web::types::{ActionResponse, DataResponse, SaveSearchRequest, StandardErrorResponse};

const MAX_NAME_LENGTH: usize = 100;

type HandlerResult<T> = Result<Json<T>, (Status, Json<StandardErrorResponse>)>;

fn database_error() -> (Status, Json<StandardErrorResponse>) {
    (
        Status::InternalServerError,
        Json(StandardErrorResponse::new(
            "Database error occurred",
            "DATABASE_ERROR",
            vec!["Try again in a few moments".to_string()],
        )),
    )
}

pub async fn save_search_handler(
    request: Json<SaveSearchRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> HandlerResult<DataResponse<SavedSearch>> {
    let request = request.into_inner();
    let name = request.name.trim();

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push("name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(format!("name must be at most {} characters", MAX_NAME_LENGTH));
    }
    let criteria = match validate_search_request(&request.criteria) {
        ValidationResult::Valid(criteria) => Some(criteria),
        ValidationResult::Invalid(criteria_errors) => {
            errors.extend(criteria_errors);
            None
        }
    };

    let criteria = match criteria {
        Some(criteria) if errors.is_empty() => criteria,
        _ => {
            return Err((
                Status::BadRequest,
                Json(StandardErrorResponse::new(
                    "Invalid saved search",
                    "VALIDATION_ERROR",
                    errors,
                )),
            ))
        }
    };

    let repository = SavedSearchRepository::new(db.pool());
    match repository.save(&auth.user_id, name, &criteria).await {
        Ok(saved) => {
            info!(user_id = %auth.user_id, name, "Search saved");
            Ok(Json(DataResponse::success("Search saved", saved)))
        }
        Err(e) => {
            error!("Failed to save search: {:#}", e);
            Err(database_error())
        }
    }
}

pub async fn list_saved_searches_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> HandlerResult<DataResponse<Vec<SavedSearch>>> {
    let repository = SavedSearchRepository::new(db.pool());
    match repository.list(&auth.user_id).await {
        Ok(searches) => Ok(Json(DataResponse::success(
            format!("{} saved searches", searches.len()),
            searches,
        ))),
        Err(e) => {
            error!("Failed to list saved searches: {:#}", e);
            Err(database_error())
        }
    }
}

pub async fn delete_saved_search_handler(
    id: &str,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> HandlerResult<ActionResponse> {
    let repository = SavedSearchRepository::new(db.pool());
    match repository.delete(&auth.user_id, id).await {
        Ok(true) => {
            info!(user_id = %auth.user_id, search_id = id, "Saved search deleted");
            Ok(Json(ActionResponse::success(
                "Saved search deleted",
                "saved_search_deleted",
            )))
        }
        Ok(false) => Err((
            Status::NotFound,
            Json(StandardErrorResponse::new(
                format!("Saved search '{}' not found", id),
                "NOT_FOUND",
                vec!["List your saved searches to get valid ids".to_string()],
            )),
        )),
        Err(e) => {
            error!("Failed to delete saved search: {:#}", e);
            Err(database_error())
        }
    }
}
