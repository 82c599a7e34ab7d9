//! Boletim de ocorrência (incident report) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BoletimStatus {
    Aberto,
    EmInvestigacao,
    Encerrado,
}

impl BoletimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoletimStatus::Aberto => "aberto",
            BoletimStatus::EmInvestigacao => "em_investigacao",
            BoletimStatus::Encerrado => "encerrado",
        }
    }
}

impl FromStr for BoletimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aberto" => Ok(BoletimStatus::Aberto),
            "em_investigacao" => Ok(BoletimStatus::EmInvestigacao),
            "encerrado" => Ok(BoletimStatus::Encerrado),
            _ => Err(format!("Invalid boletim status: {}", s)),
        }
    }
}

/// Boletim entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Boletim {
    pub boletim_id: Uuid,
    pub author_id: Uuid,
    #[schema(example = "Furto")]
    pub kind: String,
    pub description: String,
    #[schema(example = "Praça da Sé")]
    pub location: String,
    #[schema(example = "aberto")]
    pub status_code: String,
    pub assigned_to: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Boletim {
    pub fn new(author_id: Uuid, kind: String, description: String, location: String) -> Self {
        let now = Utc::now();
        Self {
            boletim_id: Uuid::new_v4(),
            author_id,
            kind,
            description,
            location,
            status_code: BoletimStatus::Aberto.as_str().to_string(),
            assigned_to: None,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn status(&self) -> BoletimStatus {
        self.status_code.parse().unwrap_or(BoletimStatus::Encerrado)
    }
}
