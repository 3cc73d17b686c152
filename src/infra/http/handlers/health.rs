use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

pub async fn health(State(state): State<AppState>) -> Result<Response, ApiError> {
    state
        .db
        .health_check()
        .await
        .map_err(|_| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unreachable"))?;
    Ok(error::ok_empty("Server is running"))
}
