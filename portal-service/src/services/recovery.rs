//! Password recovery: request a code, trade the code for a reset token, and
//! trade the reset token for a new credential.
//!
//! Each step is gated by what the previous one issued. The code is stored only
//! as a hash, lives for a bounded window and a bounded number of attempts, and
//! the reset token is single-use.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{
    config::RecoveryConfig,
    models::{RecoveryChallenge, RecoveryFlow},
    services::{
        error::RecoveryError,
        metrics::{PASSWORD_RESETS, RECOVERY_CODES_ISSUED, RECOVERY_VERIFICATIONS},
        store::{PortalStore, ResetOutcome},
        EmailProvider, JwtService, ServiceError,
    },
    utils::{
        hash_password,
        secrets::{generate_numeric_code, matches_hash, sha256_hex},
        Password,
    },
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct RecoveryService {
    store: Arc<dyn PortalStore>,
    jwt: JwtService,
    email: Arc<dyn EmailProvider>,
    code_expiry_minutes: i64,
    max_attempts: i32,
}

impl RecoveryService {
    pub fn new(
        store: Arc<dyn PortalStore>,
        jwt: JwtService,
        email: Arc<dyn EmailProvider>,
        config: &RecoveryConfig,
    ) -> Self {
        Self {
            store,
            jwt,
            email,
            code_expiry_minutes: config.code_expiry_minutes,
            max_attempts: config.max_attempts,
        }
    }

    /// Issue a fresh code for `email`, replacing any outstanding one.
    #[tracing::instrument(skip(self))]
    pub async fn request_code(&self, email: &str) -> Result<(), ServiceError> {
        let identity = self
            .store
            .find_identity_by_email(email)
            .await?
            .ok_or(RecoveryError::NotRegistered)?;

        let code = generate_numeric_code();
        let challenge = RecoveryChallenge::new(
            &identity.email,
            RecoveryFlow::PasswordReset,
            sha256_hex(&code),
            Duration::minutes(self.code_expiry_minutes),
            self.max_attempts,
        );
        self.store.upsert_challenge(&challenge).await?;

        self.email
            .send_recovery_code(&identity.email, &code, self.code_expiry_minutes)
            .await?;

        metrics::counter!(RECOVERY_CODES_ISSUED).increment(1);
        tracing::info!(identity_id = %identity.identity_id, "Recovery code issued");
        Ok(())
    }

    /// Check `code` against the outstanding challenge and return a reset token.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<String, ServiceError> {
        let result = self.verify_code_inner(email, code).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(ServiceError::Recovery(RecoveryError::ExpiredChallenge)) => "expired",
            Err(_) => "rejected",
        };
        metrics::counter!(RECOVERY_VERIFICATIONS, "outcome" => outcome).increment(1);
        result
    }

    async fn verify_code_inner(&self, email: &str, code: &str) -> Result<String, ServiceError> {
        let challenge = self
            .store
            .find_challenge(email, RecoveryFlow::PasswordReset)
            .await?
            .ok_or(RecoveryError::InvalidCode)?;

        if challenge.is_expired_at(Utc::now()) {
            self.store.consume_challenge(challenge.challenge_id).await?;
            return Err(RecoveryError::ExpiredChallenge.into());
        }

        if challenge.is_exhausted() {
            self.store.consume_challenge(challenge.challenge_id).await?;
            return Err(RecoveryError::InvalidCode.into());
        }

        if !matches_hash(code, &challenge.code_hash) {
            let attempts = match self.store.record_failed_attempt(challenge.challenge_id).await {
                Ok(attempts) => attempts,
                // Consumed concurrently
                Err(AppError::NotFound(_)) => return Err(RecoveryError::InvalidCode.into()),
                Err(e) => return Err(e.into()),
            };
            if attempts >= challenge.attempt_max {
                self.store.consume_challenge(challenge.challenge_id).await?;
                tracing::warn!(email = %challenge.email, "Recovery challenge exhausted");
            }
            return Err(RecoveryError::InvalidCode.into());
        }

        // Whoever deletes the challenge wins the token
        if !self.store.consume_challenge(challenge.challenge_id).await? {
            return Err(RecoveryError::InvalidCode.into());
        }

        let identity = self
            .store
            .find_identity_by_email(&challenge.email)
            .await?
            .ok_or(RecoveryError::InvalidCode)?;

        let token = self.jwt.generate_reset_token(identity.identity_id)?;
        tracing::info!(identity_id = %identity.identity_id, "Recovery code verified");
        Ok(token)
    }

    /// Replace the credential of the identity named by `reset_token`.
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let password = Password::new(new_password.to_string());
        if !password.meets_minimum_length() {
            return Err(RecoveryError::WeakCredential.into());
        }

        let claims = self.jwt.validate_reset_token(reset_token).map_err(|e| {
            tracing::debug!(error = %e, "Reset token rejected");
            RecoveryError::InvalidResetToken
        })?;
        let identity_id = claims
            .identity_id()
            .map_err(|_| RecoveryError::InvalidResetToken)?;

        let password_hash = hash_password(&password)?;

        match self
            .store
            .complete_password_reset(
                identity_id,
                &claims.jti,
                claims.expiry(),
                password_hash.as_str(),
            )
            .await?
        {
            ResetOutcome::Applied => {
                metrics::counter!(PASSWORD_RESETS).increment(1);
                tracing::info!(identity_id = %identity_id, "Password reset completed");
                Ok(())
            }
            ResetOutcome::TokenAlreadyUsed | ResetOutcome::IdentityMissing => {
                Err(RecoveryError::InvalidResetToken.into())
            }
        }
    }
}
