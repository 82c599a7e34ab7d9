use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{
        ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, VerifyCodeRequest,
        VerifyCodeResponse,
    },
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Email a six-digit recovery code
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 404, description = "Email not registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Password Recovery"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.recovery.request_code(&req.email).await.map_err(|e| {
        tracing::warn!(error = %e, ip = %ip, "Recovery code request failed");
        e
    })?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Recovery code sent to your email")),
    ))
}

/// Exchange a recovery code for a short-lived reset token
#[utoipa::path(
    post,
    path = "/api/auth/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyCodeResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password Recovery"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reset_token = state
        .recovery
        .verify_code(&req.email, req.code.trim())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, ip = %ip, "Recovery code rejected");
            e
        })?;

    Ok((
        StatusCode::OK,
        Json(VerifyCodeResponse {
            reset_token,
            message: "Code verified".to_string(),
        }),
    ))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Weak password or invalid reset token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password Recovery"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .recovery
        .reset_password(&req.reset_token, &req.new_password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, ip = %ip, "Password reset rejected");
            e
        })?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "Password updated. You can now log in with your new password.",
        )),
    ))
}
