use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::application::artifacts::{UpdateQuestionPaperCommand, UploadQuestionPaperCommand};
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
    let year = parse_i32(parsed.require_field("year")?, "year")?;
    let month = parsed.require_field("month")?.to_string();
    let (file, _) = parsed.require_file()?;

    let paper = state
        .artifacts
        .upload_question_paper(UploadQuestionPaperCommand {
            subject_id,
            year,
            month,
            file,
        })
        .await?;
    Ok(error::created("Question paper uploaded successfully", paper))
}

pub async fn by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let papers = state
        .artifacts
        .question_papers_for_subject(subject_id)
        .await?;
    Ok(error::ok("Question papers fetched successfully", papers))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let paper = state.artifacts.get_question_paper(id).await?;
    Ok(error::ok("Question paper fetched successfully", paper))
}

/// Metadata update with an optional replacement file.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let parsed = parse_upload(
        multipart,
        &state.allowed_upload_types,
        state.upload_limit_bytes,
    )
    .await?;

    let year = parsed
        .field("year")
        .map(|value| parse_i32(value, "year"))
        .transpose()?;
    let month = parsed.field("month").map(str::to_string);
    let file = parsed.file;

    let paper = state
        .artifacts
        .update_question_paper(id, UpdateQuestionPaperCommand { year, month, file })
        .await?;
    Ok(error::ok("Question paper updated successfully", paper))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.artifacts.delete_question_paper(id).await?;
    Ok(error::ok_empty("Question paper deleted successfully"))
}
