use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::terms::{CreateTermCommand, UpdateTermCommand};
use crate::domain::types::SchemeType;
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermListQuery {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermRequest {
    pub course_id: Uuid,
    #[serde(rename = "type")]
    pub term_type: SchemeType,
    pub value: i32,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTermRequest {
    pub value: Option<i32>,
    pub label: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TermListQuery>,
) -> Result<Response, ApiError> {
    let course_id = query
        .course_id
        .ok_or_else(|| ApiError::bad_request("courseId is required"))?;
    let terms = state.terms.list_by_course(course_id).await?;
    Ok(error::ok("Terms fetched successfully", terms))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let term = state.terms.get(id).await?;
    Ok(error::ok("Term fetched successfully", term))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateTermRequest>,
) -> Result<Response, ApiError> {
    let term = state
        .terms
        .create(CreateTermCommand {
            course_id: payload.course_id,
            term_type: payload.term_type,
            value: payload.value,
            label: payload.label,
        })
        .await?;
    Ok(error::created("Term created successfully", term))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTermRequest>,
) -> Result<Response, ApiError> {
    let term = state
        .terms
        .update(
            id,
            UpdateTermCommand {
                value: payload.value,
                label: payload.label,
            },
        )
        .await?;
    Ok(error::ok("Term updated successfully", term))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.terms.delete(id).await?;
    Ok(error::ok_empty("Term deleted successfully"))
}
