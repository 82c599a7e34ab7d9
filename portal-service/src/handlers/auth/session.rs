use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{
        LoginRequest, MessageResponse, PoliceLoginRequest, PoliceSessionResponse,
        SessionResponse,
    },
    middleware::{AuthActor, AuthUser},
    models::IdentityResponse,
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account pending or inactive", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth.login(&req.email, req.senha).await.map_err(|e| {
        tracing::info!(error = %e, ip = %ip, "Login rejected");
        e
    })?;

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            token: session.token,
            usuario: session.identity.sanitized(),
        }),
    ))
}

/// Police login by passaporte
#[utoipa::path(
    post,
    path = "/api/policia/login",
    request_body = PoliceLoginRequest,
    responses(
        (status = 200, description = "Session opened", body = PoliceSessionResponse),
        (status = 400, description = "Captcha failed", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account pending or inactive", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn police_login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<PoliceLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .police_login(&req.passaporte, req.senha, &req.recaptcha_token, &ip)
        .await
        .map_err(|e| {
            tracing::info!(error = %e, ip = %ip, "Police login rejected");
            e
        })?;

    Ok((
        StatusCode::OK,
        Json(PoliceSessionResponse {
            token: session.token,
            policial: session.identity.sanitized(),
        }),
    ))
}

/// Current account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account", body = IdentityResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(AuthActor(actor): AuthActor) -> Json<IdentityResponse> {
    Json(actor.identity.sanitized())
}

/// Revoke the current session token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth.logout(&claims).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Logged out"))))
}
