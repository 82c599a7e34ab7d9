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

use super::unexpected_outcome;
use crate::{
    dtos::{
        admin::{CreateAnnouncementRequest, CreateConcursoRequest, UpdateConcursoRequest},
        auth::MessageResponse,
    },
    middleware::AuthActor,
    models::Concurso,
    services::{ActionOutcome, AdminAction},
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Publish an announcement
#[utoipa::path(
    post,
    path = "/api/admin/anuncios",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement published", body = Announcement),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_announcement(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::CreateAnnouncement {
        title: req.titulo,
        body: req.conteudo,
        corporation: req.corporacao,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Announcement(announcement) => {
            Ok((StatusCode::CREATED, Json(announcement)))
        }
        other => Err(unexpected_outcome(other)),
    }
}

/// Open a concurso
#[utoipa::path(
    post,
    path = "/api/admin/concursos",
    request_body = CreateConcursoRequest,
    responses(
        (status = 201, description = "Concurso created", body = Concurso),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_concurso(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    ValidatedJson(req): ValidatedJson<CreateConcursoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = AdminAction::CreateConcurso {
        title: req.titulo,
        description: req.descricao,
        corporation: req.corporacao,
        vacancies: req.vagas,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Concurso(concurso) => Ok((StatusCode::CREATED, Json(concurso))),
        other => Err(unexpected_outcome(other)),
    }
}

/// Edit a concurso
#[utoipa::path(
    put,
    path = "/api/admin/concursos/{id}",
    params(("id" = Uuid, Path, description = "Concurso id")),
    request_body = UpdateConcursoRequest,
    responses(
        (status = 200, description = "Concurso after the edit", body = Concurso),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse),
        (status = 404, description = "Concurso not found", body = ErrorResponse),
        (status = 409, description = "Concurso changed concurrently", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_concurso(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(concurso_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateConcursoRequest>,
) -> Result<Json<Concurso>, AppError> {
    let action = AdminAction::UpdateConcurso {
        concurso_id,
        title: req.titulo,
        description: req.descricao,
        open: req.aberto,
        vacancies: req.vagas,
    };

    match state.admin.execute(&actor, action, &ip).await? {
        ActionOutcome::Concurso(concurso) => Ok(Json(concurso)),
        other => Err(unexpected_outcome(other)),
    }
}

/// Delete a concurso
#[utoipa::path(
    delete,
    path = "/api/admin/concursos/{id}",
    params(("id" = Uuid, Path, description = "Concurso id")),
    responses(
        (status = 200, description = "Concurso deleted", body = MessageResponse),
        (status = 403, description = "Missing is_rh or out of scope", body = ErrorResponse),
        (status = 404, description = "Concurso not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_concurso(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ClientIp(ip): ClientIp,
    Path(concurso_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    match state
        .admin
        .execute(&actor, AdminAction::DeleteConcurso { concurso_id }, &ip)
        .await?
    {
        ActionOutcome::ConcursoDeleted(_) => Ok(Json(MessageResponse::new("Concurso deleted"))),
        other => Err(unexpected_outcome(other)),
    }
}
