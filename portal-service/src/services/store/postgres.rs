//! PostgreSQL implementation of [`PortalStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use service_core::error::AppError;
use sqlx::{
    postgres::{PgArguments, PgPool},
    query::Query,
    types::Json,
    PgConnection, Postgres, QueryBuilder,
};
use uuid::Uuid;

use super::{
    AnnouncementAudience, AuditLogPage, AuditLogQuery, IdentityQuery, Mutation, PortalStore,
    ResetOutcome,
};
use crate::models::{
    Announcement, AuditLogEntry, Boletim, BoletimStatus, Concurso, Corporation, Division,
    Identity, Rank, RecoveryChallenge, RecoveryFlow, RegistrationToken,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

/// Map constraint violations on writes to client-facing errors.
fn write_error(e: sqlx::Error, conflict_message: &'static str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(anyhow::anyhow!(conflict_message));
        }
        if db.is_foreign_key_violation() {
            return AppError::BadRequest(anyhow::anyhow!("Referenced record does not exist"));
        }
    }
    db_error(e)
}

fn identity_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        match db.constraint() {
            Some("identities_email_lower_idx") => {
                return AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            Some("identities_passaporte_key") => {
                return AppError::Conflict(anyhow::anyhow!("Passaporte already registered"))
            }
            _ => {}
        }
    }
    write_error(e, "Identity already exists")
}

fn stale_write() -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "Record was modified concurrently, reload and retry"
    ))
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn insert_identity_query(identity: &Identity) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO identities (identity_id, display_name, email, passaporte, password_hash,
            role_code, status_code, rank, corporation, division, permission_overrides,
            created_utc, updated_utc)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(identity.identity_id)
    .bind(&identity.display_name)
    .bind(&identity.email)
    .bind(&identity.passaporte)
    .bind(&identity.password_hash)
    .bind(&identity.role_code)
    .bind(&identity.status_code)
    .bind(&identity.rank)
    .bind(&identity.corporation)
    .bind(&identity.division)
    .bind(&identity.permission_overrides)
    .bind(identity.created_utc)
    .bind(identity.updated_utc)
}

async fn apply_mutation(conn: &mut PgConnection, mutation: Mutation) -> Result<(), AppError> {
    match mutation {
        Mutation::UpdateIdentity {
            previous_updated_utc,
            identity,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE identities
                SET display_name = $2, email = $3, passaporte = $4, password_hash = $5,
                    role_code = $6, status_code = $7, rank = $8, corporation = $9,
                    division = $10, permission_overrides = $11, updated_utc = $12
                WHERE identity_id = $1 AND updated_utc = $13
                "#,
            )
            .bind(identity.identity_id)
            .bind(&identity.display_name)
            .bind(&identity.email)
            .bind(&identity.passaporte)
            .bind(&identity.password_hash)
            .bind(&identity.role_code)
            .bind(&identity.status_code)
            .bind(&identity.rank)
            .bind(&identity.corporation)
            .bind(&identity.division)
            .bind(&identity.permission_overrides)
            .bind(identity.updated_utc)
            .bind(previous_updated_utc)
            .execute(&mut *conn)
            .await
            .map_err(identity_write_error)?;

            if result.rows_affected() == 0 {
                return Err(stale_write());
            }
        }
        Mutation::InsertRegistrationToken(token) => {
            sqlx::query(
                r#"
                INSERT INTO registration_tokens (token_id, token_hash, corporation, max_uses,
                    remaining_uses, expiry_utc, issued_by, created_utc)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(token.token_id)
            .bind(&token.token_hash)
            .bind(&token.corporation)
            .bind(token.max_uses)
            .bind(token.remaining_uses)
            .bind(token.expiry_utc)
            .bind(token.issued_by)
            .bind(token.created_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Registration token already exists"))?;
        }
        Mutation::InsertAnnouncement(announcement) => {
            sqlx::query(
                r#"
                INSERT INTO announcements (announcement_id, title, body, corporation, author_id, created_utc)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(announcement.announcement_id)
            .bind(&announcement.title)
            .bind(&announcement.body)
            .bind(&announcement.corporation)
            .bind(announcement.author_id)
            .bind(announcement.created_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Announcement already exists"))?;
        }
        Mutation::InsertConcurso(concurso) => {
            sqlx::query(
                r#"
                INSERT INTO concursos (concurso_id, title, description, corporation, open,
                    vacancies, created_utc, updated_utc)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(concurso.concurso_id)
            .bind(&concurso.title)
            .bind(&concurso.description)
            .bind(&concurso.corporation)
            .bind(concurso.open)
            .bind(concurso.vacancies)
            .bind(concurso.created_utc)
            .bind(concurso.updated_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Concurso already exists"))?;
        }
        Mutation::UpdateConcurso(concurso) => {
            let result = sqlx::query(
                r#"
                UPDATE concursos
                SET title = $2, description = $3, corporation = $4, open = $5,
                    vacancies = $6, updated_utc = $7
                WHERE concurso_id = $1
                "#,
            )
            .bind(concurso.concurso_id)
            .bind(&concurso.title)
            .bind(&concurso.description)
            .bind(&concurso.corporation)
            .bind(concurso.open)
            .bind(concurso.vacancies)
            .bind(concurso.updated_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Concurso already exists"))?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(anyhow::anyhow!("Concurso not found")));
            }
        }
        Mutation::DeleteConcurso(concurso_id) => {
            let result = sqlx::query("DELETE FROM concursos WHERE concurso_id = $1")
                .bind(concurso_id)
                .execute(&mut *conn)
                .await
                .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(anyhow::anyhow!("Concurso not found")));
            }
        }
        Mutation::InsertCorporation(corporation) => {
            sqlx::query(
                r#"
                INSERT INTO corporations (corporation_id, sigla, name, permissions, created_utc)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(corporation.corporation_id)
            .bind(&corporation.sigla)
            .bind(&corporation.name)
            .bind(&corporation.permissions)
            .bind(corporation.created_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Corporation sigla already exists"))?;
        }
        Mutation::UpdateCorporationPermissions {
            corporation_id,
            permissions,
        } => {
            let result =
                sqlx::query("UPDATE corporations SET permissions = $2 WHERE corporation_id = $1")
                    .bind(corporation_id)
                    .bind(Json(&permissions))
                    .execute(&mut *conn)
                    .await
                    .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(anyhow::anyhow!("Corporation not found")));
            }
        }
        Mutation::InsertRank(rank) => {
            sqlx::query(
                r#"
                INSERT INTO ranks (rank_id, corporation_id, name, level, created_utc)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(rank.rank_id)
            .bind(rank.corporation_id)
            .bind(&rank.name)
            .bind(rank.level)
            .bind(rank.created_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Rank already exists"))?;
        }
        Mutation::InsertDivision(division) => {
            sqlx::query(
                r#"
                INSERT INTO divisions (division_id, corporation_id, name, created_utc)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(division.division_id)
            .bind(division.corporation_id)
            .bind(&division.name)
            .bind(division.created_utc)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "Division already exists"))?;
        }
        Mutation::UpdateBoletim {
            previous_updated_utc,
            boletim,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE boletins
                SET status_code = $2, assigned_to = $3, updated_utc = $4
                WHERE boletim_id = $1 AND updated_utc = $5
                "#,
            )
            .bind(boletim.boletim_id)
            .bind(&boletim.status_code)
            .bind(boletim.assigned_to)
            .bind(boletim.updated_utc)
            .bind(previous_updated_utc)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(stale_write());
            }
        }
    }
    Ok(())
}

fn push_audit_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &AuditLogQuery) {
    if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
        let pattern = like_pattern(text);
        qb.push(" AND (actor_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR details::text ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) {
        qb.push(" AND action = ").push_bind(action.to_string());
    }
    if let Some(date) = query.date {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let end = start + chrono::Duration::days(1);
        qb.push(" AND created_utc >= ")
            .push_bind(start)
            .push(" AND created_utc < ")
            .push_bind(end);
    }
}

#[async_trait]
impl PortalStore for PgStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Identities ====================

    async fn find_identity_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, AppError> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE identity_id = $1")
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_identity_by_passaporte(
        &self,
        passaporte: &str,
    ) -> Result<Option<Identity>, AppError> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE passaporte = $1")
            .bind(passaporte)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError> {
        insert_identity_query(identity)
            .execute(&self.pool)
            .await
            .map_err(identity_write_error)?;
        Ok(())
    }

    async fn list_identities(&self, query: &IdentityQuery) -> Result<Vec<Identity>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM identities WHERE TRUE");

        if let Some(role) = query.role {
            qb.push(" AND role_code = ").push_bind(role.as_str());
        }
        if let Some(status) = query.status {
            qb.push(" AND status_code = ").push_bind(status.as_str());
        }
        if let Some(sigla) = &query.corporation_scope {
            qb.push(" AND (corporation IS NULL OR corporation = ")
                .push_bind(sigla.clone())
                .push(")");
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            qb.push(" AND (display_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR passaporte ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY display_name");

        qb.build_query_as::<Identity>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    // ==================== Hierarchy ====================

    async fn list_corporations(&self) -> Result<Vec<Corporation>, AppError> {
        sqlx::query_as::<_, Corporation>("SELECT * FROM corporations ORDER BY sigla")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_corporation_by_id(
        &self,
        corporation_id: Uuid,
    ) -> Result<Option<Corporation>, AppError> {
        sqlx::query_as::<_, Corporation>("SELECT * FROM corporations WHERE corporation_id = $1")
            .bind(corporation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_corporation_by_sigla(
        &self,
        sigla: &str,
    ) -> Result<Option<Corporation>, AppError> {
        sqlx::query_as::<_, Corporation>("SELECT * FROM corporations WHERE sigla = $1")
            .bind(sigla)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_ranks(&self, corporation_id: Uuid) -> Result<Vec<Rank>, AppError> {
        sqlx::query_as::<_, Rank>(
            "SELECT * FROM ranks WHERE corporation_id = $1 ORDER BY level",
        )
        .bind(corporation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_divisions(&self, corporation_id: Uuid) -> Result<Vec<Division>, AppError> {
        sqlx::query_as::<_, Division>(
            "SELECT * FROM divisions WHERE corporation_id = $1 ORDER BY name",
        )
        .bind(corporation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    // ==================== Recovery ====================

    async fn upsert_challenge(&self, challenge: &RecoveryChallenge) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO recovery_challenges (challenge_id, email, flow_code, code_hash,
                attempt_count, attempt_max, expiry_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (email, flow_code) DO UPDATE
            SET challenge_id = EXCLUDED.challenge_id,
                code_hash = EXCLUDED.code_hash,
                attempt_count = EXCLUDED.attempt_count,
                attempt_max = EXCLUDED.attempt_max,
                expiry_utc = EXCLUDED.expiry_utc,
                created_utc = EXCLUDED.created_utc
            "#,
        )
        .bind(challenge.challenge_id)
        .bind(&challenge.email)
        .bind(&challenge.flow_code)
        .bind(&challenge.code_hash)
        .bind(challenge.attempt_count)
        .bind(challenge.attempt_max)
        .bind(challenge.expiry_utc)
        .bind(challenge.created_utc)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_challenge(
        &self,
        email: &str,
        flow: RecoveryFlow,
    ) -> Result<Option<RecoveryChallenge>, AppError> {
        sqlx::query_as::<_, RecoveryChallenge>(
            "SELECT * FROM recovery_challenges WHERE email = LOWER($1) AND flow_code = $2",
        )
        .bind(email)
        .bind(flow.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn record_failed_attempt(&self, challenge_id: Uuid) -> Result<i32, AppError> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE recovery_challenges SET attempt_count = attempt_count + 1
            WHERE challenge_id = $1
            RETURNING attempt_count
            "#,
        )
        .bind(challenge_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Challenge not found")))
    }

    async fn consume_challenge(&self, challenge_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recovery_challenges WHERE challenge_id = $1")
            .bind(challenge_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_password_reset(
        &self,
        identity_id: Uuid,
        jti: &str,
        token_expiry: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<ResetOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            "UPDATE identities SET password_hash = $2, updated_utc = now() WHERE identity_id = $1",
        )
        .bind(identity_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Ok(ResetOutcome::IdentityMissing);
        }

        let consumed = sqlx::query(
            r#"
            INSERT INTO consumed_reset_tokens (jti, identity_id, expiry_utc)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(identity_id)
        .bind(token_expiry)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if consumed.rows_affected() == 0 {
            // Dropping the transaction rolls back the password update.
            return Ok(ResetOutcome::TokenAlreadyUsed);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(ResetOutcome::Applied)
    }

    // ==================== Registration ====================

    async fn find_registration_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RegistrationToken>, AppError> {
        sqlx::query_as::<_, RegistrationToken>(
            "SELECT * FROM registration_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn redeem_registration_token(
        &self,
        token_hash: &str,
        identity: &Identity,
    ) -> Result<Option<RegistrationToken>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let token = sqlx::query_as::<_, RegistrationToken>(
            r#"
            UPDATE registration_tokens SET remaining_uses = remaining_uses - 1
            WHERE token_hash = $1 AND remaining_uses > 0 AND expiry_utc > now()
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(token) = token else {
            return Ok(None);
        };

        insert_identity_query(identity)
            .execute(&mut *tx)
            .await
            .map_err(identity_write_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(Some(token))
    }

    // ==================== Content ====================

    async fn list_announcements(
        &self,
        audience: &AnnouncementAudience,
    ) -> Result<Vec<Announcement>, AppError> {
        let (include_all, corporation) = match audience {
            AnnouncementAudience::All => (true, None),
            AnnouncementAudience::General => (false, None),
            AnnouncementAudience::Corporation(sigla) => (false, Some(sigla.as_str())),
        };

        sqlx::query_as::<_, Announcement>(
            r#"
            SELECT * FROM announcements
            WHERE $1 OR corporation IS NULL OR corporation = $2
            ORDER BY created_utc DESC
            "#,
        )
        .bind(include_all)
        .bind(corporation)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_concursos(&self, open_only: bool) -> Result<Vec<Concurso>, AppError> {
        sqlx::query_as::<_, Concurso>(
            "SELECT * FROM concursos WHERE open OR NOT $1 ORDER BY created_utc DESC",
        )
        .bind(open_only)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn find_concurso(&self, concurso_id: Uuid) -> Result<Option<Concurso>, AppError> {
        sqlx::query_as::<_, Concurso>("SELECT * FROM concursos WHERE concurso_id = $1")
            .bind(concurso_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    // ==================== Boletins ====================

    async fn insert_boletim(&self, boletim: &Boletim) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO boletins (boletim_id, author_id, kind, description, location,
                status_code, assigned_to, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(boletim.boletim_id)
        .bind(boletim.author_id)
        .bind(&boletim.kind)
        .bind(&boletim.description)
        .bind(&boletim.location)
        .bind(&boletim.status_code)
        .bind(boletim.assigned_to)
        .bind(boletim.created_utc)
        .bind(boletim.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Boletim already exists"))?;
        Ok(())
    }

    async fn find_boletim(&self, boletim_id: Uuid) -> Result<Option<Boletim>, AppError> {
        sqlx::query_as::<_, Boletim>("SELECT * FROM boletins WHERE boletim_id = $1")
            .bind(boletim_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_boletins(
        &self,
        status: Option<BoletimStatus>,
    ) -> Result<Vec<Boletim>, AppError> {
        sqlx::query_as::<_, Boletim>(
            r#"
            SELECT * FROM boletins
            WHERE $1::text IS NULL OR status_code = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    // ==================== Admin pipeline ====================

    async fn commit(&self, mutation: Mutation, audit: AuditLogEntry) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        apply_mutation(&mut *tx, mutation).await?;

        sqlx::query(
            r#"
            INSERT INTO audit_logs (log_id, actor_id, actor_name, action, details, source_ip, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(audit.log_id)
        .bind(audit.actor_id)
        .bind(&audit.actor_name)
        .bind(&audit.action)
        .bind(&audit.details)
        .bind(&audit.source_ip)
        .bind(audit.created_utc)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn query_audit_logs(&self, query: &AuditLogQuery) -> Result<AuditLogPage, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_logs WHERE TRUE");
        push_audit_filters(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut page = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs WHERE TRUE");
        push_audit_filters(&mut page, query);
        page.push(" ORDER BY created_utc DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset());
        let entries = page
            .build_query_as::<AuditLogEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(AuditLogPage { entries, total })
    }
}
