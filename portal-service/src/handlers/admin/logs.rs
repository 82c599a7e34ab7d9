use service_core::{
    axum::{
        extract::{Query, State},
        Json,
    },
    error::AppError,
};

use crate::{
    dtos::admin::{LogsQuery, LogsResponse, DEFAULT_LOG_PAGE_SIZE, MAX_LOG_PAGE_SIZE},
    middleware::AuthActor,
    models::AuditLogResponse,
    services::store::AuditLogQuery,
    AppState,
};

/// Search the audit log, newest first
#[utoipa::path(
    get,
    path = "/api/admin/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "One page of audit entries", body = LogsResponse),
        (status = 403, description = "Missing is_staff or is_dev", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_logs(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Query(params): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LOG_PAGE_SIZE)
        .clamp(1, MAX_LOG_PAGE_SIZE);
    let query = AuditLogQuery {
        page: params.page.unwrap_or(1).max(1),
        limit,
        text: params.text.filter(|t| !t.trim().is_empty()),
        action: params.action.filter(|a| !a.trim().is_empty()),
        date: params.date,
    };

    let page = state.admin.audit_logs(&actor, &query).await?;

    Ok(Json(LogsResponse {
        logs: page.entries.iter().map(AuditLogResponse::from).collect(),
        total_pages: LogsResponse::total_pages(page.total, limit),
        total: page.total,
    }))
}
