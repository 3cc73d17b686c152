use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

/// Public artifact download by stored relative path.
pub async fn download(
    State(state): State<AppState>,
    Path(stored_path): Path<String>,
) -> Result<Response, ApiError> {
    let data = state
        .storage
        .read(&stored_path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;

    let mime = mime_guess::from_path(&stored_path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], data).into_response())
}
