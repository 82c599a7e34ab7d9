use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{AuditLogResponse, IdentityStatus};

pub const DEFAULT_LOG_PAGE_SIZE: u32 = 20;
pub const MAX_LOG_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewRecruitRequest {
    #[serde(rename = "novoStatus")]
    pub novo_status: IdentityStatus,
    #[schema(example = "Soldado")]
    pub patente: Option<String>,
    #[schema(example = "Patrulha")]
    pub divisao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ManageCareerRequest {
    #[serde(rename = "policialId")]
    pub policial_id: Uuid,
    /// `promover`, `rebaixar`, `transferir` or `demitir`
    #[schema(example = "promover")]
    pub acao: String,
    #[serde(rename = "novaPatente")]
    pub nova_patente: Option<String>,
    #[serde(rename = "novaCorporacao")]
    pub nova_corporacao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenerateTokenRequest {
    #[schema(example = 5)]
    pub max_uses: i32,
    #[schema(example = 48)]
    pub duration_hours: i64,
    #[schema(example = "PM")]
    pub corporacao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateTokenResponse {
    pub token: String,
    pub corporacao: String,
    pub max_uses: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub titulo: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub conteudo: String,
    pub corporacao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateConcursoRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    pub corporacao: Option<String>,
    #[validate(range(min = 0, message = "Vacancies must not be negative"))]
    #[serde(default)]
    pub vagas: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateConcursoRequest {
    #[validate(length(min = 1, max = 200, message = "Title must not be empty"))]
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub aberto: Option<bool>,
    #[validate(range(min = 0, message = "Vacancies must not be negative"))]
    pub vagas: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PoliciaisQuery {
    /// Substring over name, email and passaporte
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub text: Option<String>,
    pub action: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogsResponse {
    pub logs: Vec<AuditLogResponse>,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    pub total: i64,
}

impl LogsResponse {
    pub fn total_pages(total: i64, limit: u32) -> i64 {
        let limit = i64::from(limit.max(1));
        (total + limit - 1) / limit
    }
}
