use axum::Json;
use axum::extract::{Extension, State};
use axum::response::Response;
use serde::Deserialize;

use crate::application::auth::AdminPrincipal;
use crate::domain::types::OtpPurpose;
use crate::infra::http::error::{self, ApiError};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    pub purpose: Option<OtpPurpose>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(error::ok("Login successful", session))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Response, ApiError> {
    state.auth.forgot_password(&payload.email).await?;
    Ok(error::ok_empty("OTP sent to your email"))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    let purpose = payload.purpose.unwrap_or(OtpPurpose::ForgotPassword);
    state
        .auth
        .verify_otp(&payload.email, &payload.otp, purpose)
        .await?;
    Ok(error::ok_empty("OTP verified successfully"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    state
        .auth
        .reset_password(&payload.email, &payload.new_password)
        .await?;
    Ok(error::ok_empty("Password reset successful"))
}

pub async fn send_verification_otp(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Response, ApiError> {
    state.auth.send_verification_otp(&payload.email).await?;
    Ok(error::ok_empty("Verification OTP sent to your email"))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> Result<Response, ApiError> {
    let profile = state.auth.profile(principal.admin_id).await?;
    Ok(error::ok("Profile fetched successfully", profile))
}
