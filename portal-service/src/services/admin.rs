//! Administrative action pipeline for the RH and Staff panels.
//!
//! Every action runs the same four steps:
//!
//! 1. gate: the actor must hold the action's capability ([`authorize`]),
//! 2. load and validate the target against the granted scope, the
//!    corporation hierarchy and the allowed state transitions,
//! 3. an action that would not change anything returns the current state
//!    without writing or logging,
//! 4. otherwise the mutation and its audit entry are committed together.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::types::Json;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{
        ActionKind, Announcement, AuditLogEntry, Boletim, BoletimStatus, Capability, Concurso,
        Corporation, CorporationResponse, Division, Identity, IdentityStatus, PermissionFlags,
        Rank, RegistrationToken, RoleType,
    },
    models::registration_token::MAX_DURATION_HOURS,
    services::{
        metrics::ADMIN_ACTIONS,
        permissions::{authorize, ensure_in_scope, is_global, Actor, Scope},
        store::{AuditLogPage, AuditLogQuery, IdentityQuery, Mutation, PortalStore},
        ServiceError,
    },
    utils::secrets::{generate_opaque_token, sha256_hex},
};

const RH: &[Capability] = &[Capability::IsRh];
const STAFF: &[Capability] = &[Capability::IsStaff, Capability::IsDev];
const ASSUME_BO: &[Capability] = &[Capability::PodeAssumirBo];

/// Career operations available from the RH panel (`acao`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareerAction {
    Promover,
    Rebaixar,
    Transferir,
    Demitir,
}

impl CareerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CareerAction::Promover => "promover",
            CareerAction::Rebaixar => "rebaixar",
            CareerAction::Transferir => "transferir",
            CareerAction::Demitir => "demitir",
        }
    }
}

impl FromStr for CareerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promover" => Ok(CareerAction::Promover),
            "rebaixar" => Ok(CareerAction::Rebaixar),
            "transferir" => Ok(CareerAction::Transferir),
            "demitir" => Ok(CareerAction::Demitir),
            _ => Err(format!("Invalid career action: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AdminAction {
    ReviewRecruit {
        recruit_id: Uuid,
        decision: IdentityStatus,
        rank: Option<String>,
        division: Option<String>,
    },
    ManageCareer {
        target_id: Uuid,
        action: CareerAction,
        new_rank: Option<String>,
        new_corporation: Option<String>,
    },
    GenerateRegistrationToken {
        max_uses: i32,
        duration_hours: i64,
        corporation: Option<String>,
    },
    CreateAnnouncement {
        title: String,
        body: String,
        corporation: Option<String>,
    },
    CreateConcurso {
        title: String,
        description: String,
        corporation: Option<String>,
        vacancies: i32,
    },
    UpdateConcurso {
        concurso_id: Uuid,
        title: Option<String>,
        description: Option<String>,
        open: Option<bool>,
        vacancies: Option<i32>,
    },
    DeleteConcurso {
        concurso_id: Uuid,
    },
    CreateCorporation {
        sigla: String,
        name: String,
        permissions: PermissionFlags,
    },
    UpdateCorporationPermissions {
        corporation_id: Uuid,
        permissions: PermissionFlags,
    },
    UpdateIdentityPermissions {
        identity_id: Uuid,
        permissions: PermissionFlags,
    },
    CreateRank {
        corporation_id: Uuid,
        name: String,
        level: i32,
    },
    CreateDivision {
        corporation_id: Uuid,
        name: String,
    },
    AssumeBoletim {
        boletim_id: Uuid,
    },
}

/// State after an action, whether or not it wrote anything.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Identity(Identity),
    /// The raw bearer value is only ever returned here.
    RegistrationToken {
        token: String,
        corporation: String,
        max_uses: i32,
        expiry_utc: DateTime<Utc>,
    },
    Announcement(Announcement),
    Concurso(Concurso),
    ConcursoDeleted(Uuid),
    Corporation(Corporation),
    Rank(Rank),
    Division(Division),
    Boletim(Boletim),
}

enum Plan {
    Unchanged(ActionOutcome),
    Commit {
        kind: ActionKind,
        mutation: Mutation,
        details: Value,
        outcome: ActionOutcome,
    },
}

#[derive(Clone)]
pub struct AdminPipeline {
    store: Arc<dyn PortalStore>,
}

impl AdminPipeline {
    pub fn new(store: Arc<dyn PortalStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, actor, action), fields(identity_id = %actor.id()))]
    pub async fn execute(
        &self,
        actor: &Actor,
        action: AdminAction,
        source_ip: &str,
    ) -> Result<ActionOutcome, ServiceError> {
        match self.plan(actor, action).await? {
            Plan::Unchanged(outcome) => {
                tracing::debug!("Action left state unchanged");
                metrics::counter!(ADMIN_ACTIONS, "result" => "unchanged").increment(1);
                Ok(outcome)
            }
            Plan::Commit {
                kind,
                mutation,
                details,
                outcome,
            } => {
                let audit = AuditLogEntry::new(actor.id(), actor.name(), &kind, details, source_ip);
                self.store.commit(mutation, audit).await?;

                metrics::counter!(ADMIN_ACTIONS, "result" => "applied").increment(1);
                tracing::info!(action = %kind, ip = %source_ip, "Administrative action applied");
                Ok(outcome)
            }
        }
    }

    async fn plan(&self, actor: &Actor, action: AdminAction) -> Result<Plan, ServiceError> {
        match action {
            AdminAction::ReviewRecruit {
                recruit_id,
                decision,
                rank,
                division,
            } => {
                let scope = authorize(actor, RH)?;
                self.plan_review(actor, &scope, recruit_id, decision, rank, division)
                    .await
            }
            AdminAction::ManageCareer {
                target_id,
                action,
                new_rank,
                new_corporation,
            } => {
                let scope = authorize(actor, RH)?;
                self.plan_career(actor, &scope, target_id, action, new_rank, new_corporation)
                    .await
            }
            AdminAction::GenerateRegistrationToken {
                max_uses,
                duration_hours,
                corporation,
            } => {
                let scope = authorize(actor, RH)?;
                self.plan_registration_token(actor, &scope, max_uses, duration_hours, corporation)
                    .await
            }
            AdminAction::CreateAnnouncement {
                title,
                body,
                corporation,
            } => {
                let scope = authorize(actor, RH)?;
                ensure_in_scope(actor, &scope, corporation.as_deref())?;
                require_text("titulo", &title)?;
                require_text("conteudo", &body)?;
                self.ensure_corporation_exists(corporation.as_deref()).await?;

                let announcement = Announcement::new(title, body, corporation, actor.id());
                Ok(Plan::Commit {
                    kind: ActionKind::CreateAnnouncement,
                    details: json!({
                        "titulo": announcement.title,
                        "corporacao": announcement.corporation,
                    }),
                    mutation: Mutation::InsertAnnouncement(announcement.clone()),
                    outcome: ActionOutcome::Announcement(announcement),
                })
            }
            AdminAction::CreateConcurso {
                title,
                description,
                corporation,
                vacancies,
            } => {
                let scope = authorize(actor, RH)?;
                ensure_in_scope(actor, &scope, corporation.as_deref())?;
                require_text("titulo", &title)?;
                require_vacancies(vacancies)?;
                self.ensure_corporation_exists(corporation.as_deref()).await?;

                let concurso = Concurso::new(title, description, corporation, vacancies);
                Ok(Plan::Commit {
                    kind: ActionKind::CreateConcurso,
                    details: json!({
                        "titulo": concurso.title,
                        "corporacao": concurso.corporation,
                        "vagas": concurso.vacancies,
                    }),
                    mutation: Mutation::InsertConcurso(concurso.clone()),
                    outcome: ActionOutcome::Concurso(concurso),
                })
            }
            AdminAction::UpdateConcurso {
                concurso_id,
                title,
                description,
                open,
                vacancies,
            } => {
                let scope = authorize(actor, RH)?;
                let current = self.load_concurso(concurso_id).await?;
                ensure_in_scope(actor, &scope, current.corporation.as_deref())?;

                let mut updated = current.clone();
                if let Some(title) = title {
                    require_text("titulo", &title)?;
                    updated.title = title;
                }
                if let Some(description) = description {
                    updated.description = description;
                }
                if let Some(open) = open {
                    updated.open = open;
                }
                if let Some(vacancies) = vacancies {
                    require_vacancies(vacancies)?;
                    updated.vacancies = vacancies;
                }

                if updated.title == current.title
                    && updated.description == current.description
                    && updated.open == current.open
                    && updated.vacancies == current.vacancies
                {
                    return Ok(Plan::Unchanged(ActionOutcome::Concurso(current)));
                }
                updated.updated_utc = Utc::now();

                Ok(Plan::Commit {
                    kind: ActionKind::UpdateConcurso,
                    details: json!({
                        "titulo": updated.title,
                        "aberto": updated.open,
                        "vagas": updated.vacancies,
                    }),
                    mutation: Mutation::UpdateConcurso(updated.clone()),
                    outcome: ActionOutcome::Concurso(updated),
                })
            }
            AdminAction::DeleteConcurso { concurso_id } => {
                let scope = authorize(actor, RH)?;
                let current = self.load_concurso(concurso_id).await?;
                ensure_in_scope(actor, &scope, current.corporation.as_deref())?;

                Ok(Plan::Commit {
                    kind: ActionKind::DeleteConcurso,
                    details: json!({ "titulo": current.title }),
                    mutation: Mutation::DeleteConcurso(concurso_id),
                    outcome: ActionOutcome::ConcursoDeleted(concurso_id),
                })
            }
            AdminAction::CreateCorporation {
                sigla,
                name,
                permissions,
            } => {
                authorize(actor, STAFF)?;
                require_text("sigla", &sigla)?;
                require_text("nome", &name)?;

                let corporation = Corporation::new(sigla.trim().to_string(), name, permissions);
                if self
                    .store
                    .find_corporation_by_sigla(&corporation.sigla)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::Conflict(format!(
                        "Corporation {} already exists",
                        corporation.sigla
                    )));
                }

                Ok(Plan::Commit {
                    kind: ActionKind::CreateCorporation,
                    details: json!({
                        "sigla": corporation.sigla,
                        "nome": corporation.name,
                    }),
                    mutation: Mutation::InsertCorporation(corporation.clone()),
                    outcome: ActionOutcome::Corporation(corporation),
                })
            }
            AdminAction::UpdateCorporationPermissions {
                corporation_id,
                permissions,
            } => {
                authorize(actor, STAFF)?;
                let mut corporation = self.load_corporation(corporation_id).await?;
                if corporation.permissions.0 == permissions {
                    return Ok(Plan::Unchanged(ActionOutcome::Corporation(corporation)));
                }
                corporation.permissions = Json(permissions.clone());

                Ok(Plan::Commit {
                    kind: ActionKind::UpdateCorporationPermissions,
                    details: json!({
                        "sigla": corporation.sigla,
                        "permissoes": permissions,
                    }),
                    mutation: Mutation::UpdateCorporationPermissions {
                        corporation_id,
                        permissions,
                    },
                    outcome: ActionOutcome::Corporation(corporation),
                })
            }
            AdminAction::UpdateIdentityPermissions {
                identity_id,
                permissions,
            } => {
                authorize(actor, STAFF)?;
                let current = self.load_identity(identity_id, "Identity not found").await?;
                if current.overrides() == &permissions {
                    return Ok(Plan::Unchanged(ActionOutcome::Identity(current)));
                }

                let mut updated = current.clone();
                updated.permission_overrides = Json(permissions.clone());
                updated.updated_utc = Utc::now();

                Ok(Plan::Commit {
                    kind: ActionKind::UpdateIdentityPermissions,
                    details: json!({
                        "alvo": current.display_name,
                        "alvoId": current.identity_id,
                        "permissoes": permissions,
                    }),
                    mutation: Mutation::UpdateIdentity {
                        previous_updated_utc: current.updated_utc,
                        identity: updated.clone(),
                    },
                    outcome: ActionOutcome::Identity(updated),
                })
            }
            AdminAction::CreateRank {
                corporation_id,
                name,
                level,
            } => {
                authorize(actor, STAFF)?;
                require_text("nome", &name)?;
                let corporation = self.load_corporation(corporation_id).await?;
                let ranks = self.store.list_ranks(corporation_id).await?;
                if ranks.iter().any(|r| r.name == name) {
                    return Err(ServiceError::Conflict(format!(
                        "Rank {} already exists in {}",
                        name, corporation.sigla
                    )));
                }

                let rank = Rank::new(corporation_id, name, level);
                Ok(Plan::Commit {
                    kind: ActionKind::CreateRank,
                    details: json!({
                        "sigla": corporation.sigla,
                        "patente": rank.name,
                        "nivel": rank.level,
                    }),
                    mutation: Mutation::InsertRank(rank.clone()),
                    outcome: ActionOutcome::Rank(rank),
                })
            }
            AdminAction::CreateDivision {
                corporation_id,
                name,
            } => {
                authorize(actor, STAFF)?;
                require_text("nome", &name)?;
                let corporation = self.load_corporation(corporation_id).await?;
                let divisions = self.store.list_divisions(corporation_id).await?;
                if divisions.iter().any(|d| d.name == name) {
                    return Err(ServiceError::Conflict(format!(
                        "Division {} already exists in {}",
                        name, corporation.sigla
                    )));
                }

                let division = Division::new(corporation_id, name);
                Ok(Plan::Commit {
                    kind: ActionKind::CreateDivision,
                    details: json!({
                        "sigla": corporation.sigla,
                        "divisao": division.name,
                    }),
                    mutation: Mutation::InsertDivision(division.clone()),
                    outcome: ActionOutcome::Division(division),
                })
            }
            AdminAction::AssumeBoletim { boletim_id } => {
                authorize(actor, ASSUME_BO)?;
                self.plan_assume_boletim(actor, boletim_id).await
            }
        }
    }

    async fn plan_review(
        &self,
        actor: &Actor,
        scope: &Scope,
        recruit_id: Uuid,
        decision: IdentityStatus,
        rank: Option<String>,
        division: Option<String>,
    ) -> Result<Plan, ServiceError> {
        let recruit = self.load_identity(recruit_id, "Recruit not found").await?;
        if recruit.role() != RoleType::Policial {
            return Err(ServiceError::Validation(
                "Target is not a police account".to_string(),
            ));
        }
        ensure_in_scope(actor, scope, recruit.corporation.as_deref())?;

        let kind = match decision {
            IdentityStatus::Aprovado => ActionKind::ApproveRecruit,
            IdentityStatus::Reprovado => ActionKind::RejectRecruit,
            IdentityStatus::Pendente => {
                return Err(ServiceError::Validation(
                    "novoStatus must be aprovado or reprovado".to_string(),
                ))
            }
        };

        let current = recruit.status();
        if current == decision {
            return Ok(Plan::Unchanged(ActionOutcome::Identity(recruit)));
        }
        if current != IdentityStatus::Pendente {
            return Err(ServiceError::Conflict(format!(
                "Recruit has already been reviewed ({})",
                current.as_str()
            )));
        }

        let mut updated = recruit.clone();
        updated.set_status(decision);
        if decision == IdentityStatus::Aprovado {
            if let Some(rank) = rank.filter(|r| !r.is_empty()) {
                let ranks = self.ranks_of(updated.corporation.as_deref()).await?;
                find_rank(&ranks, &rank, updated.corporation.as_deref())?;
                updated.rank = Some(rank);
            }
            if let Some(division) = division.filter(|d| !d.is_empty()) {
                self.ensure_division(updated.corporation.as_deref(), &division)
                    .await?;
                updated.division = Some(division);
            }
        }
        updated.updated_utc = Utc::now();

        Ok(Plan::Commit {
            kind,
            details: json!({
                "alvo": recruit.display_name,
                "alvoId": recruit.identity_id,
                "corporacao": recruit.corporation,
                "patente": updated.rank,
                "divisao": updated.division,
            }),
            mutation: Mutation::UpdateIdentity {
                previous_updated_utc: recruit.updated_utc,
                identity: updated.clone(),
            },
            outcome: ActionOutcome::Identity(updated),
        })
    }

    async fn plan_career(
        &self,
        actor: &Actor,
        scope: &Scope,
        target_id: Uuid,
        action: CareerAction,
        new_rank: Option<String>,
        new_corporation: Option<String>,
    ) -> Result<Plan, ServiceError> {
        if target_id == actor.id() {
            return Err(ServiceError::PermissionDenied(
                "Cannot manage your own career".to_string(),
            ));
        }

        let target = self.load_identity(target_id, "Policial not found").await?;
        if target.role() != RoleType::Policial {
            return Err(ServiceError::Validation(
                "Target is not a police account".to_string(),
            ));
        }
        ensure_in_scope(actor, scope, target.corporation.as_deref())?;
        if *scope != Scope::Global && self.holds_global_scope(&target).await? {
            return Err(ServiceError::PermissionDenied(
                "Staff and dev accounts are managed by staff".to_string(),
            ));
        }

        match target.status() {
            IdentityStatus::Reprovado if action == CareerAction::Demitir => {
                return Ok(Plan::Unchanged(ActionOutcome::Identity(target)));
            }
            IdentityStatus::Reprovado => {
                return Err(ServiceError::Conflict(
                    "Policial has been dismissed".to_string(),
                ));
            }
            IdentityStatus::Pendente => {
                return Err(ServiceError::Conflict(
                    "Recruit is still pending review".to_string(),
                ));
            }
            IdentityStatus::Aprovado => {}
        }

        let mut updated = target.clone();
        let mut details = json!({
            "alvo": target.display_name,
            "alvoId": target.identity_id,
            "acao": action.as_str(),
        });

        let kind = match action {
            CareerAction::Demitir => {
                updated.set_status(IdentityStatus::Reprovado);
                details["corporacao"] = json!(target.corporation);
                ActionKind::DismissPolicial
            }
            CareerAction::Promover | CareerAction::Rebaixar => {
                let rank_name = require_field("novaPatente", new_rank)?;
                let ranks = self.ranks_of(target.corporation.as_deref()).await?;
                let next = find_rank(&ranks, &rank_name, target.corporation.as_deref())?;
                let current_level = target
                    .rank
                    .as_deref()
                    .and_then(|name| ranks.iter().find(|r| r.name == name))
                    .map(|r| r.level);

                match (action, current_level) {
                    (CareerAction::Promover, Some(level)) if next.level <= level => {
                        return Err(ServiceError::Validation(
                            "Promotion must move to a higher rank".to_string(),
                        ));
                    }
                    (CareerAction::Rebaixar, None) => {
                        return Err(ServiceError::Validation(
                            "Policial has no rank to demote from".to_string(),
                        ));
                    }
                    (CareerAction::Rebaixar, Some(level)) if next.level >= level => {
                        return Err(ServiceError::Validation(
                            "Demotion must move to a lower rank".to_string(),
                        ));
                    }
                    _ => {}
                }

                details["patenteAnterior"] = json!(target.rank);
                details["novaPatente"] = json!(rank_name);
                updated.rank = Some(rank_name);
                ActionKind::ManageCareer
            }
            CareerAction::Transferir => {
                if *scope != Scope::Global {
                    return Err(ServiceError::PermissionDenied(
                        "Transfers between corporations require global scope".to_string(),
                    ));
                }
                let sigla = require_field("novaCorporacao", new_corporation)?;
                if target.corporation.as_deref() == Some(sigla.as_str()) {
                    return Err(ServiceError::Validation(format!(
                        "Policial already belongs to {}",
                        sigla
                    )));
                }
                let rank_name = require_field("novaPatente", new_rank)?;
                let ranks = self.ranks_of(Some(&sigla)).await?;
                find_rank(&ranks, &rank_name, Some(&sigla))?;

                details["corporacaoAnterior"] = json!(target.corporation);
                details["novaCorporacao"] = json!(sigla);
                details["novaPatente"] = json!(rank_name);
                updated.corporation = Some(sigla);
                updated.rank = Some(rank_name);
                updated.division = None;
                ActionKind::ManageCareer
            }
        };
        updated.updated_utc = Utc::now();

        Ok(Plan::Commit {
            kind,
            details,
            mutation: Mutation::UpdateIdentity {
                previous_updated_utc: target.updated_utc,
                identity: updated.clone(),
            },
            outcome: ActionOutcome::Identity(updated),
        })
    }

    async fn plan_registration_token(
        &self,
        actor: &Actor,
        scope: &Scope,
        max_uses: i32,
        duration_hours: i64,
        corporation: Option<String>,
    ) -> Result<Plan, ServiceError> {
        if max_uses < 1 {
            return Err(ServiceError::Validation(
                "max_uses must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_DURATION_HOURS).contains(&duration_hours) {
            return Err(ServiceError::Validation(format!(
                "duration_hours must be between 1 and {}",
                MAX_DURATION_HOURS
            )));
        }

        let corporation = match (scope, corporation.filter(|c| !c.is_empty())) {
            (_, Some(sigla)) => {
                ensure_in_scope(actor, scope, Some(&sigla))?;
                sigla
            }
            (Scope::Corporation(own), None) => own.clone(),
            (Scope::Global, None) => {
                return Err(ServiceError::Validation("corporacao is required".to_string()))
            }
        };
        self.ensure_corporation_exists(Some(&corporation)).await?;

        let token = generate_opaque_token();
        let record = RegistrationToken::new(
            sha256_hex(&token),
            corporation.clone(),
            max_uses,
            duration_hours,
            actor.id(),
        );

        Ok(Plan::Commit {
            kind: ActionKind::GenerateRegistrationToken,
            details: json!({
                "corporacao": corporation,
                "max_uses": max_uses,
                "duration_hours": duration_hours,
            }),
            outcome: ActionOutcome::RegistrationToken {
                token,
                corporation,
                max_uses,
                expiry_utc: record.expiry_utc,
            },
            mutation: Mutation::InsertRegistrationToken(record),
        })
    }

    async fn plan_assume_boletim(
        &self,
        actor: &Actor,
        boletim_id: Uuid,
    ) -> Result<Plan, ServiceError> {
        let boletim = self
            .store
            .find_boletim(boletim_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Boletim not found".to_string()))?;

        match boletim.status() {
            BoletimStatus::Aberto => {}
            BoletimStatus::EmInvestigacao if boletim.assigned_to == Some(actor.id()) => {
                return Ok(Plan::Unchanged(ActionOutcome::Boletim(boletim)));
            }
            BoletimStatus::EmInvestigacao => {
                return Err(ServiceError::Conflict(
                    "Boletim already assumed by another officer".to_string(),
                ));
            }
            BoletimStatus::Encerrado => {
                return Err(ServiceError::Conflict("Boletim is closed".to_string()));
            }
        }

        let mut updated = boletim.clone();
        updated.status_code = BoletimStatus::EmInvestigacao.as_str().to_string();
        updated.assigned_to = Some(actor.id());
        updated.updated_utc = Utc::now();

        Ok(Plan::Commit {
            kind: ActionKind::AssumeBoletim,
            details: json!({
                "boletim": boletim.boletim_id,
                "tipo": boletim.kind,
            }),
            mutation: Mutation::UpdateBoletim {
                previous_updated_utc: boletim.updated_utc,
                boletim: updated.clone(),
            },
            outcome: ActionOutcome::Boletim(updated),
        })
    }

    // ==================== Read side ====================

    /// Pending police recruits visible to the actor.
    pub async fn list_recruits(&self, actor: &Actor) -> Result<Vec<Identity>, ServiceError> {
        let scope = authorize(actor, RH)?;
        let query = IdentityQuery {
            role: Some(RoleType::Policial),
            status: Some(IdentityStatus::Pendente),
            corporation_scope: scope.corporation_filter(),
            search: None,
        };
        Ok(self.store.list_identities(&query).await?)
    }

    /// Approved police personnel visible to the actor.
    pub async fn list_policiais(
        &self,
        actor: &Actor,
        search: Option<String>,
    ) -> Result<Vec<Identity>, ServiceError> {
        let scope = authorize(actor, RH)?;
        let query = IdentityQuery {
            role: Some(RoleType::Policial),
            status: Some(IdentityStatus::Aprovado),
            corporation_scope: scope.corporation_filter(),
            search,
        };
        Ok(self.store.list_identities(&query).await?)
    }

    pub async fn audit_logs(
        &self,
        actor: &Actor,
        query: &AuditLogQuery,
    ) -> Result<AuditLogPage, ServiceError> {
        authorize(actor, STAFF)?;
        Ok(self.store.query_audit_logs(query).await?)
    }

    pub async fn list_corporations(
        &self,
        actor: &Actor,
    ) -> Result<Vec<CorporationResponse>, ServiceError> {
        authorize(actor, STAFF)?;
        let corporations = self.store.list_corporations().await?;

        let mut result = Vec::with_capacity(corporations.len());
        for corporation in &corporations {
            let ranks = self.store.list_ranks(corporation.corporation_id).await?;
            let divisions = self.store.list_divisions(corporation.corporation_id).await?;
            result.push(CorporationResponse::new(corporation, ranks, divisions));
        }
        Ok(result)
    }

    // ==================== Helpers ====================

    async fn load_identity(&self, id: Uuid, missing: &str) -> Result<Identity, ServiceError> {
        self.store
            .find_identity_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(missing.to_string()))
    }

    async fn load_concurso(&self, id: Uuid) -> Result<Concurso, ServiceError> {
        self.store
            .find_concurso(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Concurso not found".to_string()))
    }

    async fn load_corporation(&self, id: Uuid) -> Result<Corporation, ServiceError> {
        self.store
            .find_corporation_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Corporation not found".to_string()))
    }

    async fn find_corporation(&self, sigla: &str) -> Result<Corporation, ServiceError> {
        self.store
            .find_corporation_by_sigla(sigla)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Corporation {} not found", sigla)))
    }

    /// Whether `identity` would pass the gate with global scope.
    async fn holds_global_scope(&self, identity: &Identity) -> Result<bool, ServiceError> {
        let corporation_permissions = match identity.corporation.as_deref() {
            Some(sigla) => self
                .store
                .find_corporation_by_sigla(sigla)
                .await?
                .map(|corporation| corporation.permissions.0)
                .unwrap_or_default(),
            None => PermissionFlags::new(),
        };
        Ok(is_global(&Actor::new(identity.clone(), corporation_permissions)))
    }

    async fn ensure_corporation_exists(&self, sigla: Option<&str>) -> Result<(), ServiceError> {
        if let Some(sigla) = sigla {
            self.find_corporation(sigla).await?;
        }
        Ok(())
    }

    async fn ranks_of(&self, sigla: Option<&str>) -> Result<Vec<Rank>, ServiceError> {
        let sigla = sigla.ok_or_else(|| {
            ServiceError::Validation("Policial has no corporation".to_string())
        })?;
        let corporation = self.find_corporation(sigla).await?;
        Ok(self.store.list_ranks(corporation.corporation_id).await?)
    }

    async fn ensure_division(&self, sigla: Option<&str>, name: &str) -> Result<(), ServiceError> {
        let sigla = sigla.ok_or_else(|| {
            ServiceError::Validation("Policial has no corporation".to_string())
        })?;
        let corporation = self.find_corporation(sigla).await?;
        let divisions = self.store.list_divisions(corporation.corporation_id).await?;
        if divisions.iter().any(|d| d.name == name) {
            Ok(())
        } else {
            Err(ServiceError::Validation(format!(
                "Division {} does not belong to {}",
                name, sigla
            )))
        }
    }
}

fn find_rank<'a>(
    ranks: &'a [Rank],
    name: &str,
    sigla: Option<&str>,
) -> Result<&'a Rank, ServiceError> {
    ranks.iter().find(|r| r.name == name).ok_or_else(|| {
        ServiceError::Validation(format!(
            "Rank {} does not belong to {}",
            name,
            sigla.unwrap_or("-")
        ))
    })
}

fn require_field(name: &str, value: Option<String>) -> Result<String, ServiceError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ServiceError::Validation(format!("{} is required", name)))
}

fn require_text(name: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        Err(ServiceError::Validation(format!("{} must not be empty", name)))
    } else {
        Ok(())
    }
}

fn require_vacancies(vacancies: i32) -> Result<(), ServiceError> {
    if vacancies < 0 {
        Err(ServiceError::Validation(
            "vagas must not be negative".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        pipeline: AdminPipeline,
        pm: Corporation,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let pm = Corporation::new(
            "PM".into(),
            "Polícia Militar".into(),
            PermissionFlags::new(),
        );
        store.seed_corporation(pm.clone()).unwrap();
        store
            .seed_corporation(Corporation::new(
                "PC".into(),
                "Polícia Civil".into(),
                PermissionFlags::new(),
            ))
            .unwrap();
        for (name, level) in [("Soldado", 1), ("Cabo", 2), ("Sargento", 3)] {
            store
                .seed_rank(Rank::new(pm.corporation_id, name.into(), level))
                .unwrap();
        }
        Fixture {
            pipeline: AdminPipeline::new(store.clone()),
            store,
            pm,
        }
    }

    fn officer(store: &InMemoryStore, name: &str, corp: &str, rank: Option<&str>) -> Identity {
        let mut identity = Identity::new_recruit(
            name.into(),
            format!("{}@example.com", name.to_lowercase()),
            format!("P-{}", name),
            "hash".into(),
            corp.into(),
        );
        identity.set_status(IdentityStatus::Aprovado);
        identity.rank = rank.map(str::to_string);
        store.seed_identity(identity.clone()).unwrap();
        identity
    }

    fn rh_actor(store: &InMemoryStore, corp: &str) -> Actor {
        let identity = officer(store, "Chefe", corp, Some("Sargento"));
        Actor::new(identity, PermissionFlags::new().with(Capability::IsRh, true))
    }

    fn career(target: &Identity, action: CareerAction, rank: Option<&str>) -> AdminAction {
        AdminAction::ManageCareer {
            target_id: target.identity_id,
            action,
            new_rank: rank.map(str::to_string),
            new_corporation: None,
        }
    }

    #[tokio::test]
    async fn promotion_commits_identity_and_audit_entry() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", Some("Soldado"));

        let outcome = f
            .pipeline
            .execute(&actor, career(&target, CareerAction::Promover, Some("Cabo")), "10.0.0.1")
            .await
            .unwrap();

        match outcome {
            ActionOutcome::Identity(identity) => assert_eq!(identity.rank.as_deref(), Some("Cabo")),
            other => panic!("unexpected outcome {:?}", other),
        }
        let entries = f.store.audit_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), ActionKind::ManageCareer);
        assert_eq!(entries[0].source_ip, "10.0.0.1");
        assert_eq!(
            entries[0].kind().summary(&entries[0].details.0),
            "Promoted Silva to Cabo"
        );
    }

    #[tokio::test]
    async fn promotion_to_a_lower_rank_is_rejected() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", Some("Cabo"));

        let err = f
            .pipeline
            .execute(&actor, career(&target, CareerAction::Promover, Some("Soldado")), "ip")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(f.store.audit_entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rank_outside_the_corporation_is_rejected() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", Some("Soldado"));

        let err = f
            .pipeline
            .execute(&actor, career(&target, CareerAction::Promover, Some("Delegado")), "ip")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn cross_corporation_target_is_denied_without_side_effects() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Souza", "PC", None);

        let err = f
            .pipeline
            .execute(&actor, career(&target, CareerAction::Demitir, None), "ip")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        let stored = f.store.find_identity_by_id(target.identity_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), IdentityStatus::Aprovado);
        assert!(f.store.audit_entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_dismissal_is_a_silent_no_op() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", Some("Soldado"));

        f.pipeline
            .execute(&actor, career(&target, CareerAction::Demitir, None), "ip")
            .await
            .unwrap();
        let second = f
            .pipeline
            .execute(&actor, career(&target, CareerAction::Demitir, None), "ip")
            .await
            .unwrap();

        match second {
            ActionOutcome::Identity(identity) => {
                assert_eq!(identity.status(), IdentityStatus::Reprovado)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let entries = f.store.audit_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), ActionKind::DismissPolicial);
    }

    #[tokio::test]
    async fn dismissed_policial_cannot_be_approved() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", None);
        f.pipeline
            .execute(&actor, career(&target, CareerAction::Demitir, None), "ip")
            .await
            .unwrap();

        let err = f
            .pipeline
            .execute(
                &actor,
                AdminAction::ReviewRecruit {
                    recruit_id: target.identity_id,
                    decision: IdentityStatus::Aprovado,
                    rank: None,
                    division: None,
                },
                "ip",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn actor_cannot_manage_own_career() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let err = f
            .pipeline
            .execute(&actor, career(&actor.identity, CareerAction::Promover, Some("Cabo")), "ip")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn transfer_requires_global_scope() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let target = officer(&f.store, "Silva", "PM", Some("Soldado"));

        let err = f
            .pipeline
            .execute(
                &actor,
                AdminAction::ManageCareer {
                    target_id: target.identity_id,
                    action: CareerAction::Transferir,
                    new_rank: Some("Investigador".into()),
                    new_corporation: Some("PC".into()),
                },
                "ip",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn registration_token_bounds_are_checked() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");

        for (max_uses, hours) in [(0, 24), (1, 0), (1, MAX_DURATION_HOURS + 1)] {
            let err = f
                .pipeline
                .execute(
                    &actor,
                    AdminAction::GenerateRegistrationToken {
                        max_uses,
                        duration_hours: hours,
                        corporation: None,
                    },
                    "ip",
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn registration_token_defaults_to_the_actor_corporation() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");

        let outcome = f
            .pipeline
            .execute(
                &actor,
                AdminAction::GenerateRegistrationToken {
                    max_uses: 2,
                    duration_hours: 24,
                    corporation: None,
                },
                "ip",
            )
            .await
            .unwrap();

        let ActionOutcome::RegistrationToken { token, corporation, .. } = outcome else {
            panic!("expected a registration token");
        };
        assert_eq!(corporation, "PM");
        let stored = f
            .store
            .find_registration_token(&sha256_hex(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.remaining_uses, 2);
        assert!(!f.store.audit_entries().unwrap()[0]
            .details
            .0
            .to_string()
            .contains(&token));
    }

    #[tokio::test]
    async fn staff_actions_require_staff() {
        let f = fixture();
        let actor = rh_actor(&f.store, "PM");
        let err = f
            .pipeline
            .execute(
                &actor,
                AdminAction::CreateRank {
                    corporation_id: f.pm.corporation_id,
                    name: "Tenente".into(),
                    level: 4,
                },
                "ip",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn unchanged_corporation_permissions_are_not_logged() {
        let f = fixture();
        let mut identity =
            Identity::new_civil("Staff".into(), "staff@example.com".into(), "h".into());
        identity.permission_overrides = Json(PermissionFlags::new().with(Capability::IsStaff, true));
        let staff = Actor::new(identity, PermissionFlags::new());

        let flags = PermissionFlags::new().with(Capability::IsRh, true);
        for _ in 0..2 {
            f.pipeline
                .execute(
                    &staff,
                    AdminAction::UpdateCorporationPermissions {
                        corporation_id: f.pm.corporation_id,
                        permissions: flags.clone(),
                    },
                    "ip",
                )
                .await
                .unwrap();
        }
        assert_eq!(f.store.audit_entries().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn boletim_can_only_be_assumed_once() {
        let f = fixture();
        let author = Identity::new_civil("Civil".into(), "civil@example.com".into(), "h".into());
        f.store.seed_identity(author.clone()).unwrap();
        let boletim = Boletim::new(author.identity_id, "Furto".into(), "desc".into(), "Centro".into());
        f.store.insert_boletim(&boletim).await.unwrap();

        let flags = PermissionFlags::new().with(Capability::PodeAssumirBo, true);
        let first = Actor::new(officer(&f.store, "Alpha", "PM", None), flags.clone());
        let second = Actor::new(officer(&f.store, "Bravo", "PM", None), flags);
        let assume = AdminAction::AssumeBoletim {
            boletim_id: boletim.boletim_id,
        };

        f.pipeline.execute(&first, assume.clone(), "ip").await.unwrap();
        f.pipeline.execute(&first, assume.clone(), "ip").await.unwrap();
        let err = f.pipeline.execute(&second, assume, "ip").await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(f.store.audit_entries().unwrap().len(), 1);
    }
}
