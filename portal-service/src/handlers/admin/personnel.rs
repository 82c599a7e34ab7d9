use service_core::{
    axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use super::unexpected_outcome;
use crate::{
    dtos::admin::{
        GenerateTokenRequest, GenerateTokenResponse, ManageCareerRequest, PoliciaisQuery,
        ReviewRecruitRequest,
    },
    middleware::AuthActor,
    models::IdentityResponse,
    services::{ActionOutcome, AdminAction, CareerAction},
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Pending recruits in the caller's scope
#[utoipa::path(
    get,
    path = "/api/admin/recrutas",
    responses(
        (status = 200, description = "Pending recruits", body = [IdentityResponse]),
        (status = 403, description = "Missing is_rh", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_recruits(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<Json<Vec<IdentityResponse>>, AppError> {
    let recruits = state.admin.list_recruits(&actor).await?;
    Ok(Json(recruits.iter().map(IdentityResponse::from).collect()))
}

/// Approve or reject a recruit
#[utoipa::path(
    put,
    path = "/api/admin/recrutas/{id}",
    params(("id" = Uuid, Path, description = "Recruit identity id")),
    request_body = ReviewRecruitRequest,
    responses(
        (status = 200, description = "Recruit after review", body = IdentityResponse),
        (status = 400, description = "Unknown rank or division", body = ErrorResponse),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse),
        (status = 404, description = "Recruit not found", body = ErrorResponse),
        (status = 409, description = "Recruit already reviewed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn review_recruit(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(recruit_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReviewRecruitRequest>,
) -> Result<Json<IdentityResponse>, AppError> {
    let action = AdminAction::ReviewRecruit {
        recruit_id,
        decision: req.novo_status,
        rank: req.patente,
        division: req.divisao,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Identity(identity) => Ok(Json(identity.sanitized())),
        other => Err(unexpected_outcome(other)),
    }
}

/// Approved personnel in the caller's scope
#[utoipa::path(
    get,
    path = "/api/admin/policiais",
    params(PoliciaisQuery),
    responses(
        (status = 200, description = "Personnel", body = [IdentityResponse]),
        (status = 403, description = "Missing is_rh", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_policiais(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Query(query): Query<PoliciaisQuery>,
) -> Result<Json<Vec<IdentityResponse>>, AppError> {
    let search = query.search.filter(|s| !s.trim().is_empty());
    let personnel = state.admin.list_policiais(&actor, search).await?;
    Ok(Json(personnel.iter().map(IdentityResponse::from).collect()))
}

/// Promote, demote, transfer or dismiss an officer
#[utoipa::path(
    put,
    path = "/api/admin/gerenciar-policial",
    request_body = ManageCareerRequest,
    responses(
        (status = 200, description = "Officer after the change", body = IdentityResponse),
        (status = 400, description = "Invalid action or rank", body = ErrorResponse),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse),
        (status = 404, description = "Officer not found", body = ErrorResponse),
        (status = 409, description = "Officer state does not allow the action", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn manage_career(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<ManageCareerRequest>,
) -> Result<Json<IdentityResponse>, AppError> {
    let action: CareerAction = req
        .acao
        .parse()
        .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let action = AdminAction::ManageCareer {
        target_id: req.policial_id,
        action,
        new_rank: req.nova_patente,
        new_corporation: req.nova_corporacao,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Identity(identity) => Ok(Json(identity.sanitized())),
        other => Err(unexpected_outcome(other)),
    }
}

/// Mint a registration token for police sign-up
#[utoipa::path(
    post,
    path = "/api/admin/generate-token",
    request_body = GenerateTokenRequest,
    responses(
        (status = 201, description = "Token minted; shown only once", body = GenerateTokenResponse),
        (status = 400, description = "Invalid bounds", body = ErrorResponse),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn generate_token(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<GenerateTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::GenerateRegistrationToken {
        max_uses: req.max_uses,
        duration_hours: req.duration_hours,
        corporation: req.corporacao,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::RegistrationToken {
            token,
            corporation,
            max_uses,
            expiry_utc,
        } => Ok((
            StatusCode::CREATED,
            Json(GenerateTokenResponse {
                token,
                corporacao: corporation,
                max_uses,
                expires_at: expiry_utc,
            }),
        )),
        other => Err(unexpected_outcome(other)),
    }
}
