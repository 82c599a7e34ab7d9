//! Identity model - civil and police accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::PermissionFlags;

/// Account role codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Civil,
    Policial,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Civil => "civil",
            RoleType::Policial => "policial",
        }
    }
}

impl FromStr for RoleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "civil" => Ok(RoleType::Civil),
            "policial" => Ok(RoleType::Policial),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Account status codes. `Reprovado` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    Pendente,
    Aprovado,
    Reprovado,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Pendente => "pendente",
            IdentityStatus::Aprovado => "aprovado",
            IdentityStatus::Reprovado => "reprovado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IdentityStatus::Reprovado)
    }
}

impl FromStr for IdentityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(IdentityStatus::Pendente),
            "aprovado" => Ok(IdentityStatus::Aprovado),
            "reprovado" => Ok(IdentityStatus::Reprovado),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// Identity entity.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub identity_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub passaporte: Option<String>,
    pub password_hash: String,
    pub role_code: String,
    pub status_code: String,
    pub rank: Option<String>,
    pub corporation: Option<String>,
    pub division: Option<String>,
    pub permission_overrides: Json<PermissionFlags>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Identity {
    /// Self-registered citizen account, active immediately.
    pub fn new_civil(display_name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            identity_id: Uuid::new_v4(),
            display_name,
            email: email.to_lowercase(),
            passaporte: None,
            password_hash,
            role_code: RoleType::Civil.as_str().to_string(),
            status_code: IdentityStatus::Aprovado.as_str().to_string(),
            rank: None,
            corporation: None,
            division: None,
            permission_overrides: Json(PermissionFlags::new()),
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Police recruit registered through a corporation token, pending review.
    pub fn new_recruit(
        display_name: String,
        email: String,
        passaporte: String,
        password_hash: String,
        corporation: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            identity_id: Uuid::new_v4(),
            display_name,
            email: email.to_lowercase(),
            passaporte: Some(passaporte),
            password_hash,
            role_code: RoleType::Policial.as_str().to_string(),
            status_code: IdentityStatus::Pendente.as_str().to_string(),
            rank: None,
            corporation: Some(corporation),
            division: None,
            permission_overrides: Json(PermissionFlags::new()),
            created_utc: now,
            updated_utc: now,
        }
    }

    // The table's CHECK constraints keep codes in range; an unknown code reads
    // as the least privileged value.
    pub fn role(&self) -> RoleType {
        self.role_code.parse().unwrap_or(RoleType::Civil)
    }

    pub fn status(&self) -> IdentityStatus {
        self.status_code
            .parse()
            .unwrap_or(IdentityStatus::Pendente)
    }

    pub fn is_policial(&self) -> bool {
        self.role() == RoleType::Policial
    }

    pub fn is_active(&self) -> bool {
        self.status() == IdentityStatus::Aprovado
    }

    pub fn set_status(&mut self, status: IdentityStatus) {
        self.status_code = status.as_str().to_string();
    }

    pub fn overrides(&self) -> &PermissionFlags {
        &self.permission_overrides.0
    }

    pub fn sanitized(&self) -> IdentityResponse {
        IdentityResponse::from(self)
    }
}

/// Identity as returned by the API (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub id: Uuid,
    #[schema(example = "João Silva")]
    pub nome: String,
    #[schema(example = "joao@example.com")]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "123456")]
    pub passaporte: Option<String>,
    pub tipo: RoleType,
    pub status: IdentityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Soldado")]
    pub patente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "PM")]
    pub corporacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisao: Option<String>,
    pub permissoes: PermissionFlags,
    pub created_utc: DateTime<Utc>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.identity_id,
            nome: identity.display_name.clone(),
            email: identity.email.clone(),
            passaporte: identity.passaporte.clone(),
            tipo: identity.role(),
            status: identity.status(),
            patente: identity.rank.clone(),
            corporacao: identity.corporation.clone(),
            divisao: identity.division.clone(),
            permissoes: identity.overrides().clone(),
            created_utc: identity.created_utc,
        }
    }
}
