//! Corporation hierarchy: corporations, their ranks and divisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PermissionFlags;

/// Corporation entity. `sigla` is the short unique code identities reference.
#[derive(Debug, Clone, FromRow)]
pub struct Corporation {
    pub corporation_id: Uuid,
    pub sigla: String,
    pub name: String,
    pub permissions: Json<PermissionFlags>,
    pub created_utc: DateTime<Utc>,
}

impl Corporation {
    pub fn new(sigla: String, name: String, permissions: PermissionFlags) -> Self {
        Self {
            corporation_id: Uuid::new_v4(),
            sigla: sigla.to_uppercase(),
            name,
            permissions: Json(permissions),
            created_utc: Utc::now(),
        }
    }
}

/// Rank (patente). Higher `level` is more senior.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rank {
    pub rank_id: Uuid,
    pub corporation_id: Uuid,
    #[schema(example = "Sargento")]
    pub name: String,
    #[schema(example = 4)]
    pub level: i32,
    pub created_utc: DateTime<Utc>,
}

impl Rank {
    pub fn new(corporation_id: Uuid, name: String, level: i32) -> Self {
        Self {
            rank_id: Uuid::new_v4(),
            corporation_id,
            name,
            level,
            created_utc: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Division {
    pub division_id: Uuid,
    pub corporation_id: Uuid,
    #[schema(example = "ROTA")]
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl Division {
    pub fn new(corporation_id: Uuid, name: String) -> Self {
        Self {
            division_id: Uuid::new_v4(),
            corporation_id,
            name,
            created_utc: Utc::now(),
        }
    }
}

/// Corporation with its hierarchy, as listed in the staff panel.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CorporationResponse {
    pub id: Uuid,
    #[schema(example = "PM")]
    pub sigla: String,
    #[schema(example = "Polícia Militar")]
    pub nome: String,
    pub permissoes: PermissionFlags,
    pub patentes: Vec<Rank>,
    pub divisoes: Vec<Division>,
}

impl CorporationResponse {
    pub fn new(corporation: &Corporation, mut ranks: Vec<Rank>, divisions: Vec<Division>) -> Self {
        ranks.sort_by_key(|r| r.level);
        Self {
            id: corporation.corporation_id,
            sigla: corporation.sigla.clone(),
            nome: corporation.name.clone(),
            permissoes: corporation.permissions.0.clone(),
            patentes: ranks,
            divisoes: divisions,
        }
    }
}
