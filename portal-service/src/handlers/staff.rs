use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::staff::{
        CreateCorporationRequest, CreateDivisionRequest, CreateRankRequest,
        UpdatePermissionsRequest,
    },
    handlers::admin::unexpected_outcome,
    middleware::AuthActor,
    models::{Corporation, CorporationResponse},
    services::{ActionOutcome, AdminAction},
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Corporations with their ranks and divisions
#[utoipa::path(
    get,
    path = "/api/staff/corporacoes",
    responses(
        (status = 200, description = "All corporations", body = [CorporationResponse]),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_corporations(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<Json<Vec<CorporationResponse>>, AppError> {
    Ok(Json(state.admin.list_corporations(&actor).await?))
}

/// Create a corporation
#[utoipa::path(
    post,
    path = "/api/staff/corporacoes",
    request_body = CreateCorporationRequest,
    responses(
        (status = 201, description = "Corporation created", body = CorporationResponse),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse),
        (status = 409, description = "Sigla already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_corporation(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<CreateCorporationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::CreateCorporation {
        sigla: req.sigla,
        name: req.nome,
        permissions: req.permissoes,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Corporation(corporation) => Ok((
            StatusCode::CREATED,
            Json(CorporationResponse::new(&corporation, Vec::new(), Vec::new())),
        )),
        other => Err(unexpected_outcome(other)),
    }
}

/// Replace a corporation's permission flags
#[utoipa::path(
    put,
    path = "/api/staff/corporacoes/{id}/permissions",
    params(("id" = Uuid, Path, description = "Corporation id")),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Corporation after the change", body = CorporationResponse),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse),
        (status = 404, description = "Corporation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_corporation_permissions(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(corporation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionsRequest>,
) -> Result<Json<CorporationResponse>, AppError> {
    let action = AdminAction::UpdateCorporationPermissions {
        corporation_id,
        permissions: req.permissoes,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Corporation(corporation) => {
            Ok(Json(describe(&state, &corporation).await?))
        }
        other => Err(unexpected_outcome(other)),
    }
}

/// Add a rank to a corporation
#[utoipa::path(
    post,
    path = "/api/staff/corporacoes/{id}/patentes",
    params(("id" = Uuid, Path, description = "Corporation id")),
    request_body = CreateRankRequest,
    responses(
        (status = 201, description = "Rank created", body = Rank),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse),
        (status = 404, description = "Corporation not found", body = ErrorResponse),
        (status = 409, description = "Rank name already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_rank(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(corporation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateRankRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::CreateRank {
        corporation_id,
        name: req.nome,
        level: req.nivel,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Rank(rank) => Ok((StatusCode::CREATED, Json(rank))),
        other => Err(unexpected_outcome(other)),
    }
}

/// Add a division to a corporation
#[utoipa::path(
    post,
    path = "/api/staff/corporacoes/{id}/divisoes",
    params(("id" = Uuid, Path, description = "Corporation id")),
    request_body = CreateDivisionRequest,
    responses(
        (status = 201, description = "Division created", body = Division),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse),
        (status = 404, description = "Corporation not found", body = ErrorResponse),
        (status = 409, description = "Division name already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_division(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(corporation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateDivisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::CreateDivision {
        corporation_id,
        name: req.nome,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Division(division) => Ok((StatusCode::CREATED, Json(division))),
        other => Err(unexpected_outcome(other)),
    }
}

async fn describe(
    state: &AppState,
    corporation: &Corporation,
) -> Result<CorporationResponse, AppError> {
    let ranks = state.store.list_ranks(corporation.corporation_id).await?;
    let divisions = state.store.list_divisions(corporation.corporation_id).await?;
    Ok(CorporationResponse::new(corporation, ranks, divisions))
}
