//! Audit log model - insert-only record of administrative actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Administrative action kinds as stored in `audit_logs.action`.
///
/// Labels written by other tooling deserialize into `Other` and render
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    ManageCareer,
    ApproveRecruit,
    RejectRecruit,
    DismissPolicial,
    GenerateRegistrationToken,
    CreateAnnouncement,
    CreateConcurso,
    UpdateConcurso,
    DeleteConcurso,
    CreateCorporation,
    UpdateCorporationPermissions,
    UpdateIdentityPermissions,
    CreateRank,
    CreateDivision,
    AssumeBoletim,
    Other(String),
}

impl ActionKind {
    pub fn label(&self) -> &str {
        match self {
            ActionKind::ManageCareer => "Manage Career",
            ActionKind::ApproveRecruit => "Approve Recruit",
            ActionKind::RejectRecruit => "Reject Recruit",
            ActionKind::DismissPolicial => "Dismiss Policial",
            ActionKind::GenerateRegistrationToken => "Generate Registration Token",
            ActionKind::CreateAnnouncement => "Create Announcement",
            ActionKind::CreateConcurso => "Create Concurso",
            ActionKind::UpdateConcurso => "Update Concurso",
            ActionKind::DeleteConcurso => "Delete Concurso",
            ActionKind::CreateCorporation => "Create Corporation",
            ActionKind::UpdateCorporationPermissions => "Update Corporation Permissions",
            ActionKind::UpdateIdentityPermissions => "Update Identity Permissions",
            ActionKind::CreateRank => "Create Rank",
            ActionKind::CreateDivision => "Create Division",
            ActionKind::AssumeBoletim => "Assume Boletim",
            ActionKind::Other(label) => label,
        }
    }

    /// One-line description for the logs panel, rendered from the entry details.
    pub fn summary(&self, details: &Value) -> String {
        let field = |key: &str| -> String {
            match details.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "-".to_string(),
                Some(other) => other.to_string(),
            }
        };

        match self {
            ActionKind::ManageCareer => match details.get("acao").and_then(Value::as_str) {
                Some("promover") => format!("Promoted {} to {}", field("alvo"), field("novaPatente")),
                Some("rebaixar") => format!("Demoted {} to {}", field("alvo"), field("novaPatente")),
                Some("transferir") => format!(
                    "Transferred {} from {} to {} as {}",
                    field("alvo"),
                    field("corporacaoAnterior"),
                    field("novaCorporacao"),
                    field("novaPatente")
                ),
                Some("demitir") => format!("Dismissed {}", field("alvo")),
                _ => format!("Changed career of {}", field("alvo")),
            },
            ActionKind::ApproveRecruit => format!(
                "Approved recruit {} as {} ({})",
                field("alvo"),
                field("patente"),
                field("divisao")
            ),
            ActionKind::RejectRecruit => format!("Rejected recruit {}", field("alvo")),
            ActionKind::DismissPolicial => format!("Dismissed {}", field("alvo")),
            ActionKind::GenerateRegistrationToken => format!(
                "Generated registration token for {} ({} uses, {}h)",
                field("corporacao"),
                field("max_uses"),
                field("duration_hours")
            ),
            ActionKind::CreateAnnouncement => format!("Published announcement \"{}\"", field("titulo")),
            ActionKind::CreateConcurso => format!("Opened concurso \"{}\"", field("titulo")),
            ActionKind::UpdateConcurso => format!("Updated concurso \"{}\"", field("titulo")),
            ActionKind::DeleteConcurso => format!("Deleted concurso \"{}\"", field("titulo")),
            ActionKind::CreateCorporation => format!("Created corporation {}", field("sigla")),
            ActionKind::UpdateCorporationPermissions => {
                format!("Updated permissions of corporation {}", field("sigla"))
            }
            ActionKind::UpdateIdentityPermissions => {
                format!("Updated individual permissions of {}", field("alvo"))
            }
            ActionKind::CreateRank => format!(
                "Created rank {} (level {}) in {}",
                field("patente"),
                field("nivel"),
                field("sigla")
            ),
            ActionKind::CreateDivision => {
                format!("Created division {} in {}", field("divisao"), field("sigla"))
            }
            ActionKind::AssumeBoletim => format!("Assumed boletim {}", field("boletim")),
            ActionKind::Other(label) => label.clone(),
        }
    }
}

impl From<String> for ActionKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Manage Career" => ActionKind::ManageCareer,
            "Approve Recruit" => ActionKind::ApproveRecruit,
            "Reject Recruit" => ActionKind::RejectRecruit,
            "Dismiss Policial" => ActionKind::DismissPolicial,
            "Generate Registration Token" => ActionKind::GenerateRegistrationToken,
            "Create Announcement" => ActionKind::CreateAnnouncement,
            "Create Concurso" => ActionKind::CreateConcurso,
            "Update Concurso" => ActionKind::UpdateConcurso,
            "Delete Concurso" => ActionKind::DeleteConcurso,
            "Create Corporation" => ActionKind::CreateCorporation,
            "Update Corporation Permissions" => ActionKind::UpdateCorporationPermissions,
            "Update Identity Permissions" => ActionKind::UpdateIdentityPermissions,
            "Create Rank" => ActionKind::CreateRank,
            "Create Division" => ActionKind::CreateDivision,
            "Assume Boletim" => ActionKind::AssumeBoletim,
            _ => ActionKind::Other(label),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Audit log entry entity.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntry {
    pub log_id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub details: Json<Value>,
    pub source_ip: String,
    pub created_utc: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        actor_id: Uuid,
        actor_name: &str,
        kind: &ActionKind,
        details: Value,
        source_ip: &str,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            actor_id,
            actor_name: actor_name.to_string(),
            action: kind.label().to_string(),
            details: Json(details),
            source_ip: source_ip.to_string(),
            created_utc: Utc::now(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        ActionKind::from(self.action.clone())
    }
}

/// Audit log entry as shown in the logs panel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub actor_id: Uuid,
    #[schema(example = "Sgt. Oliveira")]
    pub actor_name: String,
    #[schema(example = "Manage Career")]
    pub action: String,
    #[schema(example = "Promoted Carlos to Cabo")]
    pub summary: String,
    #[schema(value_type = Object)]
    pub details: Value,
    #[schema(example = "203.0.113.7")]
    pub source_ip: String,
    pub created_utc: DateTime<Utc>,
}

impl From<&AuditLogEntry> for AuditLogResponse {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: entry.log_id,
            actor_id: entry.actor_id,
            actor_name: entry.actor_name.clone(),
            action: entry.action.clone(),
            summary: entry.kind().summary(&entry.details.0),
            details: entry.details.0.clone(),
            source_ip: entry.source_ip.clone(),
            created_utc: entry.created_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_round_trip_and_unknown_labels_fall_back() {
        assert_eq!(
            ActionKind::from("Manage Career".to_string()),
            ActionKind::ManageCareer
        );
        let legacy: ActionKind = serde_json::from_str("\"Alterar Senha\"").unwrap();
        assert_eq!(legacy, ActionKind::Other("Alterar Senha".to_string()));
        assert_eq!(legacy.summary(&json!({})), "Alterar Senha");
    }

    #[test]
    fn career_summary_names_target_and_rank() {
        let details = json!({"alvo": "Carlos", "acao": "promover", "novaPatente": "Cabo"});
        assert_eq!(
            ActionKind::ManageCareer.summary(&details),
            "Promoted Carlos to Cabo"
        );
    }

    #[test]
    fn missing_details_render_as_dash() {
        assert_eq!(
            ActionKind::CreateDivision.summary(&json!({"sigla": "PC"})),
            "Created division - in PC"
        );
    }
}
