use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::courses::{CreateCourseCommand, UpdateCourseCommand};
use crate::domain::types::SchemeType;
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListQuery {
    pub university_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub university_id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: Option<SchemeType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub scheme_type: Option<SchemeType>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Response, ApiError> {
    let courses = state.courses.list(query.university_id).await?;
    Ok(error::ok("Courses fetched successfully", courses))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let course = state.courses.get(id).await?;
    Ok(error::ok("Course fetched successfully", course))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Response, ApiError> {
    let course = state
        .courses
        .create(CreateCourseCommand {
            university_id: payload.university_id,
            name: payload.name,
            code: payload.code,
            scheme_type: payload.scheme_type,
        })
        .await?;
    Ok(error::created("Course created successfully", course))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Response, ApiError> {
    let course = state
        .courses
        .update(
            id,
            UpdateCourseCommand {
                name: payload.name,
                code: payload.code,
                scheme_type: payload.scheme_type,
            },
        )
        .await?;
    Ok(error::ok("Course updated successfully", course))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.courses.delete(id).await?;
    Ok(error::ok_empty("Course deleted successfully"))
}
