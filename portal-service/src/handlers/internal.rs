use service_core::{
    axum::{
        extract::{Path, State},
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::staff::UpdatePermissionsRequest,
    handlers::admin::unexpected_outcome,
    models::IdentityResponse,
    services::{ActionOutcome, Actor, AdminAction},
    utils::{ClientIp, ValidatedJson},
    AppState,
};

/// Operator route for granting per-identity overrides, e.g. the first staff account.
///
/// Audited as the system actor.
#[utoipa::path(
    put,
    path = "/api/internal/identities/{id}/permissions",
    params(("id" = Uuid, Path, description = "Identity id")),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Identity after the change", body = IdentityResponse),
        (status = 401, description = "Missing or invalid admin key", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse)
    ),
    security(("admin_api_key" = [])),
    tag = "Internal"
)]
pub async fn update_identity_permissions(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(identity_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionsRequest>,
) -> Result<Json<IdentityResponse>, AppError> {
    let action = AdminAction::UpdateIdentityPermissions {
        identity_id,
        permissions: req.permissoes,
    };

    match state.admin.execute(&Actor::system(), action, &ip).await? {
        ActionOutcome::Identity(identity) => Ok(Json(identity.sanitized())),
        other => Err(unexpected_outcome(other)),
    }
}
