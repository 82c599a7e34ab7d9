use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PermissionFlags;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCorporationRequest {
    #[validate(length(min = 1, max = 16, message = "Sigla is required"))]
    #[schema(example = "PM")]
    pub sigla: String,
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    #[schema(example = "Polícia Militar")]
    pub nome: String,
    #[serde(default)]
    pub permissoes: PermissionFlags,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionsRequest {
    pub permissoes: PermissionFlags,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRankRequest {
    #[validate(length(min = 1, max = 60, message = "Name is required"))]
    #[schema(example = "Cabo")]
    pub nome: String,
    /// Higher is more senior
    #[schema(example = 2)]
    pub nivel: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDivisionRequest {
    #[validate(length(min = 1, max = 60, message = "Name is required"))]
    #[schema(example = "ROTA")]
    pub nome: String,
}
