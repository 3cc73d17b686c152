use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::application::artifacts::UploadNotesCommand;
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::multipart::parse_upload;
use crate::infra::http::state::AppState;

use super::syllabus::{parse_i32, parse_uuid};

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
    let unit = parse_i32(parsed.require_field("unit")?, "unit")?;
    let title = parsed.require_field("title")?.to_string();
    let (file, _) = parsed.require_file()?;

    let notes = state
        .artifacts
        .upload_notes(UploadNotesCommand {
            subject_id,
            unit,
            title,
            file,
        })
        .await?;
    Ok(error::created("Notes uploaded successfully", notes))
}

pub async fn by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let notes = state.artifacts.notes_for_subject(subject_id).await?;
    Ok(error::ok("Notes fetched successfully", notes))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let notes = state.artifacts.get_notes(id).await?;
    Ok(error::ok("Notes fetched successfully", notes))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.artifacts.delete_notes(id).await?;
    Ok(error::ok_empty("Notes deleted successfully"))
}
