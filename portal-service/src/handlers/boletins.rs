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

use crate::{
    dtos::portal::{BoletinsQuery, CreateBoletimRequest},
    handlers::admin::unexpected_outcome,
    middleware::AuthActor,
    models::Boletim,
    services::{ActionOutcome, AdminAction},
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// File a boletim de ocorrência
#[utoipa::path(
    post,
    path = "/api/boletins",
    request_body = CreateBoletimRequest,
    responses(
        (status = 201, description = "Boletim filed", body = Boletim),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Boletins"
)]
pub async fn create_boletim(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ValidatedJson(req): ValidatedJson<CreateBoletimRequest>,
) -> Result<impl IntoResponse, AppError> {
    let boletim = state
        .portal
        .file_boletim(&actor, req.tipo, req.descricao, req.local)
        .await?;
    Ok((StatusCode::CREATED, Json(boletim)))
}

/// Boletim queue for officers
#[utoipa::path(
    get,
    path = "/api/policia/boletins",
    params(BoletinsQuery),
    responses(
        (status = 200, description = "Boletins, newest first", body = [Boletim]),
        (status = 403, description = "Missing podeAssumirBO", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Boletins"
)]
pub async fn list_boletins(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Query(query): Query<BoletinsQuery>,
) -> Result<Json<Vec<Boletim>>, AppError> {
    Ok(Json(state.portal.list_boletins(&actor, query.status).await?))
}

/// Take over an open boletim
#[utoipa::path(
    put,
    path = "/api/policia/boletins/{id}/assumir",
    params(("id" = Uuid, Path, description = "Boletim id")),
    responses(
        (status = 200, description = "Boletim under investigation", body = Boletim),
        (status = 403, description = "Missing podeAssumirBO", body = ErrorResponse),
        (status = 404, description = "Boletim not found", body = ErrorResponse),
        (status = 409, description = "Boletim already assumed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Boletins"
)]
pub async fn assume_boletim(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(boletim_id): Path<Uuid>,
) -> Result<Json<Boletim>, AppError> {
    match state
        .admin
        .execute(&actor, AdminAction::AssumeBoletim { boletim_id }, &ip)
        .await?
    {
        ActionOutcome::Boletim(boletim) => Ok(Json(boletim)),
        other => Err(unexpected_outcome(other)),
    }
}
