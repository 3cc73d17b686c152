use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::universities::{CreateUniversityCommand, UpdateUniversityCommand};
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UniversityPayload {
    pub name: String,
    pub code: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    let universities = state.universities.list().await?;
    Ok(error::ok(
        "Universities fetched successfully",
        universities,
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let university = state.universities.get(id).await?;
    Ok(error::ok("University fetched successfully", university))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<UniversityPayload>,
) -> Result<Response, ApiError> {
    let university = state
        .universities
        .create(CreateUniversityCommand {
            name: payload.name,
            code: payload.code,
        })
        .await?;
    Ok(error::created(
        "University created successfully",
        university,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UniversityPayload>,
) -> Result<Response, ApiError> {
    let university = state
        .universities
        .update(
            id,
            UpdateUniversityCommand {
                name: payload.name,
                code: payload.code,
            },
        )
        .await?;
    Ok(error::ok("University updated successfully", university))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.universities.delete(id).await?;
    Ok(error::ok_empty("University deleted successfully"))
}
