use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::subjects::{CreateSubjectCommand, UpdateSubjectCommand};
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectListQuery {
    pub term_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    pub term_id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> Result<Response, ApiError> {
    let subjects = match (query.term_id, query.course_id) {
        (Some(term_id), _) => state.subjects.list_by_term(term_id).await?,
        (None, Some(course_id)) => state.subjects.list_by_course(course_id).await?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "termId is required; courseId is supported for backward compatibility",
            ));
        }
    };
    Ok(error::ok("Subjects fetched successfully", subjects))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let subject = state.subjects.get(id).await?;
    Ok(error::ok("Subject fetched successfully", subject))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<Response, ApiError> {
    let subject = state
        .subjects
        .create(CreateSubjectCommand {
            term_id: payload.term_id,
            name: payload.name,
            code: payload.code,
        })
        .await?;
    Ok(error::created("Subject created successfully", subject))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<Response, ApiError> {
    let subject = state
        .subjects
        .update(
            id,
            UpdateSubjectCommand {
                name: payload.name,
                code: payload.code,
            },
        )
        .await?;
    Ok(error::ok("Subject updated successfully", subject))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.subjects.delete(id).await?;
    Ok(error::ok_empty("Subject deleted successfully"))
}
