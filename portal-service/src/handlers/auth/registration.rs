use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{PoliceRegisterRequest, RegisterRequest},
    services::PolicialRegistration,
    utils::ValidatedJson,
    AppState,
};

/// Register a citizen account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = IdentityResponse),
        (status = 400, description = "Weak password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state
        .auth
        .register_civil(req.nome, req.email, req.senha)
        .await?;

    Ok((StatusCode::CREATED, Json(identity.sanitized())))
}

/// Register a police recruit with a registration token
#[utoipa::path(
    post,
    path = "/api/policia/register",
    request_body = PoliceRegisterRequest,
    responses(
        (status = 201, description = "Recruit created, awaiting review", body = IdentityResponse),
        (status = 400, description = "Invalid token or weak password", body = ErrorResponse),
        (status = 409, description = "Email or passaporte already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn police_register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PoliceRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state
        .registration
        .register_policial(PolicialRegistration {
            token: req.token,
            display_name: req.nome,
            email: req.email,
            passaporte: req.passaporte,
            password: req.senha,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(identity.sanitized())))
}
