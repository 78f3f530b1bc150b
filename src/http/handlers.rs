//! Employee API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::directory::{query, DirectoryError};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::upstream::types::{CreateRequest, EmployeeRecord};

const TOP_EARNERS: usize = 10;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeRecord>>, ApiError> {
    let employees = state.directory.list_all().await?;
    Ok(Json(employees.to_vec()))
}

pub async fn search_employees(
    State(state): State<AppState>,
    Path(fragment): Path<String>,
) -> Result<Json<Vec<EmployeeRecord>>, ApiError> {
    let employees = state.directory.list_all().await?;
    let matches: Vec<EmployeeRecord> = query::search_by_name(&employees, &fragment)
        .into_iter()
        .cloned()
        .collect();

    if matches.is_empty() {
        return Err(ApiError::NotFound(format!("no employee name contains '{fragment}'")));
    }
    Ok(Json(matches))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeRecord>, ApiError> {
    Ok(Json(state.directory.get_by_id(&id).await?))
}

pub async fn highest_salary(State(state): State<AppState>) -> Result<Json<i64>, ApiError> {
    let employees = state.directory.list_all().await?;
    Ok(Json(query::highest_salary(&employees)))
}

pub async fn top_earner_names(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let employees = state.directory.list_all().await?;
    let names = query::top_earner_names(&employees, TOP_EARNERS);

    if names.is_empty() {
        return Err(ApiError::NotFound("no employees".to_string()));
    }
    Ok(Json(names))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(input): Json<CreateRequest>,
) -> Result<Json<EmployeeRecord>, ApiError> {
    validate_create(&input)?;
    Ok(Json(state.directory.create(&input).await?))
}

/// Resolve the id to a name, delete by name, then drop the id's cache slot.
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<String>, ApiError> {
    let employee = state.directory.get_by_id(&id).await?;
    let deletion = state.directory.delete_by_name(&employee.name).await?;

    if !deletion.deleted {
        // A 404 means our cached record was already stale.
        if deletion.status == StatusCode::NOT_FOUND {
            state.directory.evict_employee(&id);
        }
        return Err(DirectoryError::Rejected(deletion.status).into());
    }

    state.directory.evict_employee(&id);
    tracing::info!(id = %id, name = %employee.name, "Employee removed");
    Ok(Json(employee.name))
}

fn validate_create(input: &CreateRequest) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be blank".to_string()));
    }
    if input.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be blank".to_string()));
    }
    if input.age == 0 {
        return Err(ApiError::BadRequest("age must be positive".to_string()));
    }
    Ok(())
}
