use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::application::artifacts::UploadSyllabusCommand;
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::multipart::parse_upload;
use crate::infra::http::state::AppState;

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let parsed = parse_upload(
        multipart,
        &state.allowed_upload_types,
        state.upload_limit_bytes,
    )
    .await?;

    let subject_id = parse_uuid(parsed.require_field("subjectId")?, "subjectId")?;
    let year = parsed
        .field("year")
        .map(|value| parse_i32(value, "year"))
        .transpose()?;
    let (file, _) = parsed.require_file()?;

    let syllabus = state
        .artifacts
        .upload_syllabus(UploadSyllabusCommand {
            subject_id,
            year,
            file,
        })
        .await?;
    Ok(error::created("Syllabus uploaded successfully", syllabus))
}

pub async fn by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let syllabus = state.artifacts.syllabus_for_subject(subject_id).await?;
    Ok(error::ok("Syllabus fetched successfully", syllabus))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.artifacts.delete_syllabus(id).await?;
    Ok(error::ok_empty("Syllabus deleted successfully"))
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    value
        .parse::<Uuid>()
        .map_err(|_| ApiError::bad_request(format!("{field} must be a valid id")))
}

pub(crate) fn parse_i32(value: &str, field: &str) -> Result<i32, ApiError> {
    value
        .parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("{field} must be a number")))
}
