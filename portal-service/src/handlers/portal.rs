use service_core::{
    axum::{extract::State, Json},
    error::AppError,
};

use crate::{
    middleware::AuthActor,
    models::{Announcement, Concurso},
    AppState,
};

/// General announcements, newest first
#[utoipa::path(
    get,
    path = "/api/anuncios",
    responses(
        (status = 200, description = "Announcements with no corporation", body = [Announcement])
    ),
    tag = "Portal"
)]
pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    Ok(Json(state.portal.announcements(None).await?))
}

/// Announcements visible to the caller
///
/// Officers also get their corporation's announcements; staff and dev get all.
#[utoipa::path(
    get,
    path = "/api/policia/anuncios",
    responses(
        (status = 200, description = "Announcements, newest first", body = [Announcement]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn list_member_announcements(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<Json<Vec<Announcement>>, AppError> {
    Ok(Json(state.portal.announcements(Some(&actor)).await?))
}

/// Concursos currently open for applications
#[utoipa::path(
    get,
    path = "/api/concursos",
    responses(
        (status = 200, description = "Open concursos", body = [Concurso])
    ),
    tag = "Portal"
)]
pub async fn list_concursos(State(state): State<AppState>) -> Result<Json<Vec<Concurso>>, AppError> {
    Ok(Json(state.portal.open_concursos().await?))
}
