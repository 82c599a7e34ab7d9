//! Persistence seam for the portal.
//!
//! Every administrative mutation goes through [`PortalStore::commit`], which
//! applies the mutation and appends its audit entry in one transaction.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Announcement, AuditLogEntry, Boletim, BoletimStatus, Concurso, Corporation, Division,
    Identity, IdentityStatus, PermissionFlags, Rank, RecoveryChallenge, RecoveryFlow,
    RegistrationToken, RoleType,
};

/// A single state change applied by the admin pipeline.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Replace an identity row. Fails with `Conflict` when the stored row's
    /// `updated_utc` no longer equals `previous_updated_utc`.
    UpdateIdentity {
        previous_updated_utc: DateTime<Utc>,
        identity: Identity,
    },
    InsertRegistrationToken(RegistrationToken),
    InsertAnnouncement(Announcement),
    InsertConcurso(Concurso),
    UpdateConcurso(Concurso),
    DeleteConcurso(Uuid),
    InsertCorporation(Corporation),
    UpdateCorporationPermissions {
        corporation_id: Uuid,
        permissions: PermissionFlags,
    },
    InsertRank(Rank),
    InsertDivision(Division),
    /// Same optimistic check as `UpdateIdentity`.
    UpdateBoletim {
        previous_updated_utc: DateTime<Utc>,
        boletim: Boletim,
    },
}

/// Which identities a listing may return.
#[derive(Debug, Clone, Default)]
pub struct IdentityQuery {
    pub role: Option<RoleType>,
    pub status: Option<IdentityStatus>,
    /// `Some(sigla)` restricts to that corporation plus identities with no
    /// corporation; `None` returns every corporation.
    pub corporation_scope: Option<String>,
    /// Case-insensitive substring over name, email and passaporte.
    pub search: Option<String>,
}

impl IdentityQuery {
    pub fn matches(&self, identity: &Identity) -> bool {
        if let Some(role) = self.role {
            if identity.role() != role {
                return false;
            }
        }
        if let Some(status) = self.status {
            if identity.status() != status {
                return false;
            }
        }
        if let Some(sigla) = &self.corporation_scope {
            match &identity.corporation {
                Some(corp) if corp != sigla => return false,
                _ => {}
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = identity.display_name.to_lowercase().contains(&needle)
                || identity.email.to_lowercase().contains(&needle)
                || identity
                    .passaporte
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring over actor name and details.
    pub text: Option<String>,
    pub action: Option<String>,
    /// Calendar day (UTC) the entry was written on.
    pub date: Option<NaiveDate>,
}

impl AuditLogQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(action) = self.action.as_deref().filter(|a| !a.is_empty()) {
            if entry.action != action {
                return false;
            }
        }
        if let Some(date) = self.date {
            if entry.created_utc.date_naive() != date {
                return false;
            }
        }
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let hit = entry.actor_name.to_lowercase().contains(&needle)
                || entry.details.0.to_string().to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: i64,
}

/// Which announcements a listing may show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnouncementAudience {
    /// Only announcements with no corporation.
    General,
    /// General announcements plus those of one corporation.
    Corporation(String),
    All,
}

/// Result of the final recovery step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Applied,
    TokenAlreadyUsed,
    IdentityMissing,
}

#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // ==================== Identities ====================

    async fn find_identity_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, AppError>;

    /// Case-insensitive.
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    async fn find_identity_by_passaporte(
        &self,
        passaporte: &str,
    ) -> Result<Option<Identity>, AppError>;

    /// Fails with `Conflict` on a duplicate email or passaporte.
    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError>;

    async fn list_identities(&self, query: &IdentityQuery) -> Result<Vec<Identity>, AppError>;

    // ==================== Hierarchy ====================

    async fn list_corporations(&self) -> Result<Vec<Corporation>, AppError>;

    async fn find_corporation_by_id(
        &self,
        corporation_id: Uuid,
    ) -> Result<Option<Corporation>, AppError>;

    async fn find_corporation_by_sigla(&self, sigla: &str)
        -> Result<Option<Corporation>, AppError>;

    async fn list_ranks(&self, corporation_id: Uuid) -> Result<Vec<Rank>, AppError>;

    async fn list_divisions(&self, corporation_id: Uuid) -> Result<Vec<Division>, AppError>;

    // ==================== Recovery ====================

    /// Insert or replace the challenge for `(email, flow)`.
    async fn upsert_challenge(&self, challenge: &RecoveryChallenge) -> Result<(), AppError>;

    async fn find_challenge(
        &self,
        email: &str,
        flow: RecoveryFlow,
    ) -> Result<Option<RecoveryChallenge>, AppError>;

    /// Increment the attempt counter and return the new count.
    async fn record_failed_attempt(&self, challenge_id: Uuid) -> Result<i32, AppError>;

    /// Delete the challenge. Returns `false` if it was already gone.
    async fn consume_challenge(&self, challenge_id: Uuid) -> Result<bool, AppError>;

    /// Record `jti` as consumed and replace the identity's password hash,
    /// atomically.
    async fn complete_password_reset(
        &self,
        identity_id: Uuid,
        jti: &str,
        token_expiry: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<ResetOutcome, AppError>;

    // ==================== Registration ====================

    async fn find_registration_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RegistrationToken>, AppError>;

    /// Decrement the token's remaining uses and insert `identity` in one
    /// transaction. `None` when the token is unknown, expired or exhausted.
    async fn redeem_registration_token(
        &self,
        token_hash: &str,
        identity: &Identity,
    ) -> Result<Option<RegistrationToken>, AppError>;

    // ==================== Content ====================

    /// Newest first.
    async fn list_announcements(
        &self,
        audience: &AnnouncementAudience,
    ) -> Result<Vec<Announcement>, AppError>;

    async fn list_concursos(&self, open_only: bool) -> Result<Vec<Concurso>, AppError>;

    async fn find_concurso(&self, concurso_id: Uuid) -> Result<Option<Concurso>, AppError>;

    // ==================== Boletins ====================

    async fn insert_boletim(&self, boletim: &Boletim) -> Result<(), AppError>;

    async fn find_boletim(&self, boletim_id: Uuid) -> Result<Option<Boletim>, AppError>;

    async fn list_boletins(&self, status: Option<BoletimStatus>)
        -> Result<Vec<Boletim>, AppError>;

    // ==================== Admin pipeline ====================

    async fn commit(&self, mutation: Mutation, audit: AuditLogEntry) -> Result<(), AppError>;

    /// Newest first.
    async fn query_audit_logs(&self, query: &AuditLogQuery) -> Result<AuditLogPage, AppError>;
}
