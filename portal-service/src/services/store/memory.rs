//! In-process store used by tests and local runs without PostgreSQL.
//!
//! One mutex guards all tables so each trait call is atomic, matching the
//! transaction boundaries of [`PgStore`](super::PgStore).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    AnnouncementAudience, AuditLogPage, AuditLogQuery, IdentityQuery, Mutation, PortalStore,
    ResetOutcome,
};
use crate::models::{
    Announcement, AuditLogEntry, Boletim, BoletimStatus, Concurso, Corporation, Division,
    Identity, Rank, RecoveryChallenge, RecoveryFlow, RegistrationToken,
};

#[derive(Default)]
struct Tables {
    identities: HashMap<Uuid, Identity>,
    corporations: HashMap<Uuid, Corporation>,
    ranks: HashMap<Uuid, Rank>,
    divisions: HashMap<Uuid, Division>,
    challenges: HashMap<(String, String), RecoveryChallenge>,
    consumed_jtis: HashSet<String>,
    registration_tokens: HashMap<String, RegistrationToken>,
    announcements: Vec<Announcement>,
    concursos: HashMap<Uuid, Concurso>,
    boletins: HashMap<Uuid, Boletim>,
    audit_logs: Vec<AuditLogEntry>,
}

impl Tables {
    fn check_identity_unique(&self, identity: &Identity) -> Result<(), AppError> {
        let email = identity.email.to_lowercase();
        for existing in self.identities.values() {
            if existing.identity_id == identity.identity_id {
                continue;
            }
            if existing.email.to_lowercase() == email {
                return Err(AppError::Conflict(anyhow::anyhow!("Email already registered")));
            }
            if identity.passaporte.is_some() && existing.passaporte == identity.passaporte {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Passaporte already registered"
                )));
            }
        }
        Ok(())
    }

    fn corporation_sigla_exists(&self, sigla: &str) -> bool {
        self.corporations.values().any(|c| c.sigla == sigla)
    }

    fn apply(&mut self, mutation: Mutation) -> Result<(), AppError> {
        match mutation {
            Mutation::UpdateIdentity {
                previous_updated_utc,
                identity,
            } => {
                let current = self
                    .identities
                    .get(&identity.identity_id)
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Identity not found")))?;
                if current.updated_utc != previous_updated_utc {
                    return Err(stale_write());
                }
                self.check_identity_unique(&identity)?;
                self.identities.insert(identity.identity_id, identity);
            }
            Mutation::InsertRegistrationToken(token) => {
                if !self.corporation_sigla_exists(&token.corporation) {
                    return Err(AppError::BadRequest(anyhow::anyhow!("Unknown corporation")));
                }
                self.registration_tokens
                    .insert(token.token_hash.clone(), token);
            }
            Mutation::InsertAnnouncement(announcement) => {
                self.announcements.push(announcement);
            }
            Mutation::InsertConcurso(concurso) | Mutation::UpdateConcurso(concurso) => {
                self.concursos.insert(concurso.concurso_id, concurso);
            }
            Mutation::DeleteConcurso(concurso_id) => {
                if self.concursos.remove(&concurso_id).is_none() {
                    return Err(AppError::NotFound(anyhow::anyhow!("Concurso not found")));
                }
            }
            Mutation::InsertCorporation(corporation) => {
                if self.corporation_sigla_exists(&corporation.sigla) {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Corporation sigla already exists"
                    )));
                }
                self.corporations
                    .insert(corporation.corporation_id, corporation);
            }
            Mutation::UpdateCorporationPermissions {
                corporation_id,
                permissions,
            } => {
                let corporation = self
                    .corporations
                    .get_mut(&corporation_id)
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Corporation not found")))?;
                corporation.permissions.0 = permissions;
            }
            Mutation::InsertRank(rank) => {
                if !self.corporations.contains_key(&rank.corporation_id) {
                    return Err(AppError::NotFound(anyhow::anyhow!("Corporation not found")));
                }
                if self
                    .ranks
                    .values()
                    .any(|r| r.corporation_id == rank.corporation_id && r.name == rank.name)
                {
                    return Err(AppError::Conflict(anyhow::anyhow!("Rank already exists")));
                }
                self.ranks.insert(rank.rank_id, rank);
            }
            Mutation::InsertDivision(division) => {
                if !self.corporations.contains_key(&division.corporation_id) {
                    return Err(AppError::NotFound(anyhow::anyhow!("Corporation not found")));
                }
                if self.divisions.values().any(|d| {
                    d.corporation_id == division.corporation_id && d.name == division.name
                }) {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Division already exists"
                    )));
                }
                self.divisions.insert(division.division_id, division);
            }
            Mutation::UpdateBoletim {
                previous_updated_utc,
                boletim,
            } => {
                let current = self
                    .boletins
                    .get(&boletim.boletim_id)
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Boletim not found")))?;
                if current.updated_utc != previous_updated_utc {
                    return Err(stale_write());
                }
                self.boletins.insert(boletim.boletim_id, boletim);
            }
        }
        Ok(())
    }
}

fn stale_write() -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "Record was modified concurrently, reload and retry"
    ))
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Store mutex poisoned: {}", e)))
    }

    // Seed helpers bypass the audit trail; they stand in for rows a fixture or
    // migration would have created.

    pub fn seed_identity(&self, identity: Identity) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        tables.check_identity_unique(&identity)?;
        tables.identities.insert(identity.identity_id, identity);
        Ok(())
    }

    pub fn seed_corporation(&self, corporation: Corporation) -> Result<(), AppError> {
        self.lock()?.apply(Mutation::InsertCorporation(corporation))
    }

    pub fn seed_rank(&self, rank: Rank) -> Result<(), AppError> {
        self.lock()?.apply(Mutation::InsertRank(rank))
    }

    pub fn seed_division(&self, division: Division) -> Result<(), AppError> {
        self.lock()?.apply(Mutation::InsertDivision(division))
    }

    pub fn seed_announcement(&self, announcement: Announcement) -> Result<(), AppError> {
        self.lock()?.apply(Mutation::InsertAnnouncement(announcement))
    }

    pub fn seed_registration_token(&self, token: RegistrationToken) -> Result<(), AppError> {
        self.lock()?.apply(Mutation::InsertRegistrationToken(token))
    }

    pub fn seed_challenge(&self, challenge: RecoveryChallenge) -> Result<(), AppError> {
        let key = (challenge.email.clone(), challenge.flow_code.clone());
        self.lock()?.challenges.insert(key, challenge);
        Ok(())
    }

    pub fn audit_entries(&self) -> Result<Vec<AuditLogEntry>, AppError> {
        Ok(self.lock()?.audit_logs.clone())
    }
}

#[async_trait]
impl PortalStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn find_identity_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self.lock()?.identities.get(&identity_id).cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let email = email.to_lowercase();
        Ok(self
            .lock()?
            .identities
            .values()
            .find(|i| i.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_identity_by_passaporte(
        &self,
        passaporte: &str,
    ) -> Result<Option<Identity>, AppError> {
        Ok(self
            .lock()?
            .identities
            .values()
            .find(|i| i.passaporte.as_deref() == Some(passaporte))
            .cloned())
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError> {
        self.seed_identity(identity.clone())
    }

    async fn list_identities(&self, query: &IdentityQuery) -> Result<Vec<Identity>, AppError> {
        let mut identities: Vec<Identity> = self
            .lock()?
            .identities
            .values()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();
        identities.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(identities)
    }

    async fn list_corporations(&self) -> Result<Vec<Corporation>, AppError> {
        let mut corporations: Vec<Corporation> =
            self.lock()?.corporations.values().cloned().collect();
        corporations.sort_by(|a, b| a.sigla.cmp(&b.sigla));
        Ok(corporations)
    }

    async fn find_corporation_by_id(
        &self,
        corporation_id: Uuid,
    ) -> Result<Option<Corporation>, AppError> {
        Ok(self.lock()?.corporations.get(&corporation_id).cloned())
    }

    async fn find_corporation_by_sigla(
        &self,
        sigla: &str,
    ) -> Result<Option<Corporation>, AppError> {
        Ok(self
            .lock()?
            .corporations
            .values()
            .find(|c| c.sigla == sigla)
            .cloned())
    }

    async fn list_ranks(&self, corporation_id: Uuid) -> Result<Vec<Rank>, AppError> {
        let mut ranks: Vec<Rank> = self
            .lock()?
            .ranks
            .values()
            .filter(|r| r.corporation_id == corporation_id)
            .cloned()
            .collect();
        ranks.sort_by_key(|r| r.level);
        Ok(ranks)
    }

    async fn list_divisions(&self, corporation_id: Uuid) -> Result<Vec<Division>, AppError> {
        let mut divisions: Vec<Division> = self
            .lock()?
            .divisions
            .values()
            .filter(|d| d.corporation_id == corporation_id)
            .cloned()
            .collect();
        divisions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(divisions)
    }

    async fn upsert_challenge(&self, challenge: &RecoveryChallenge) -> Result<(), AppError> {
        self.seed_challenge(challenge.clone())
    }

    async fn find_challenge(
        &self,
        email: &str,
        flow: RecoveryFlow,
    ) -> Result<Option<RecoveryChallenge>, AppError> {
        let key = (email.to_lowercase(), flow.as_str().to_string());
        Ok(self.lock()?.challenges.get(&key).cloned())
    }

    async fn record_failed_attempt(&self, challenge_id: Uuid) -> Result<i32, AppError> {
        let mut tables = self.lock()?;
        let challenge = tables
            .challenges
            .values_mut()
            .find(|c| c.challenge_id == challenge_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Challenge not found")))?;
        challenge.attempt_count += 1;
        Ok(challenge.attempt_count)
    }

    async fn consume_challenge(&self, challenge_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        let before = tables.challenges.len();
        tables
            .challenges
            .retain(|_, c| c.challenge_id != challenge_id);
        Ok(tables.challenges.len() < before)
    }

    async fn complete_password_reset(
        &self,
        identity_id: Uuid,
        jti: &str,
        _token_expiry: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<ResetOutcome, AppError> {
        let mut tables = self.lock()?;
        if tables.consumed_jtis.contains(jti) {
            return Ok(ResetOutcome::TokenAlreadyUsed);
        }
        let Some(identity) = tables.identities.get_mut(&identity_id) else {
            return Ok(ResetOutcome::IdentityMissing);
        };
        identity.password_hash = password_hash.to_string();
        identity.updated_utc = Utc::now();
        tables.consumed_jtis.insert(jti.to_string());
        Ok(ResetOutcome::Applied)
    }

    async fn find_registration_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RegistrationToken>, AppError> {
        Ok(self.lock()?.registration_tokens.get(token_hash).cloned())
    }

    async fn redeem_registration_token(
        &self,
        token_hash: &str,
        identity: &Identity,
    ) -> Result<Option<RegistrationToken>, AppError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        match tables.registration_tokens.get(token_hash) {
            Some(token) if token.is_redeemable_at(now) => {}
            _ => return Ok(None),
        }
        tables.check_identity_unique(identity)?;

        let token = match tables.registration_tokens.get_mut(token_hash) {
            Some(token) => {
                token.remaining_uses -= 1;
                token.clone()
            }
            None => return Ok(None),
        };
        tables
            .identities
            .insert(identity.identity_id, identity.clone());
        Ok(Some(token))
    }

    async fn list_announcements(
        &self,
        audience: &AnnouncementAudience,
    ) -> Result<Vec<Announcement>, AppError> {
        let mut announcements: Vec<Announcement> = self
            .lock()?
            .announcements
            .iter()
            .filter(|a| match (audience, a.corporation.as_deref()) {
                (AnnouncementAudience::All, _) | (_, None) => true,
                (AnnouncementAudience::General, Some(_)) => false,
                (AnnouncementAudience::Corporation(wanted), Some(corp)) => wanted == corp,
            })
            .cloned()
            .collect();
        announcements.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(announcements)
    }

    async fn list_concursos(&self, open_only: bool) -> Result<Vec<Concurso>, AppError> {
        let mut concursos: Vec<Concurso> = self
            .lock()?
            .concursos
            .values()
            .filter(|c| !open_only || c.open)
            .cloned()
            .collect();
        concursos.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(concursos)
    }

    async fn find_concurso(&self, concurso_id: Uuid) -> Result<Option<Concurso>, AppError> {
        Ok(self.lock()?.concursos.get(&concurso_id).cloned())
    }

    async fn insert_boletim(&self, boletim: &Boletim) -> Result<(), AppError> {
        self.lock()?
            .boletins
            .insert(boletim.boletim_id, boletim.clone());
        Ok(())
    }

    async fn find_boletim(&self, boletim_id: Uuid) -> Result<Option<Boletim>, AppError> {
        Ok(self.lock()?.boletins.get(&boletim_id).cloned())
    }

    async fn list_boletins(
        &self,
        status: Option<BoletimStatus>,
    ) -> Result<Vec<Boletim>, AppError> {
        let mut boletins: Vec<Boletim> = self
            .lock()?
            .boletins
            .values()
            .filter(|b| status.map_or(true, |s| b.status() == s))
            .cloned()
            .collect();
        boletins.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(boletins)
    }

    async fn commit(&self, mutation: Mutation, audit: AuditLogEntry) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        tables.apply(mutation)?;
        tables.audit_logs.push(audit);
        Ok(())
    }

    async fn query_audit_logs(&self, query: &AuditLogQuery) -> Result<AuditLogPage, AppError> {
        let tables = self.lock()?;
        let mut matching: Vec<&AuditLogEntry> =
            tables.audit_logs.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));

        let total = matching.len() as i64;
        let entries = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(AuditLogPage { entries, total })
    }
}
