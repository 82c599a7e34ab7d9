//! Police self-registration through a corporation registration token.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    models::Identity,
    services::{store::PortalStore, ServiceError},
    utils::{hash_password, secrets::sha256_hex, Password},
};

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn PortalStore>,
}

/// Fields of a police registration form.
#[derive(Debug, Clone)]
pub struct PolicialRegistration {
    pub token: String,
    pub display_name: String,
    pub email: String,
    pub passaporte: String,
    pub password: String,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn PortalStore>) -> Self {
        Self { store }
    }

    /// Create a pending policial in the token's corporation and spend one use
    /// of the token.
    #[tracing::instrument(skip_all, fields(email = %form.email))]
    pub async fn register_policial(
        &self,
        form: PolicialRegistration,
    ) -> Result<Identity, ServiceError> {
        let password = Password::new(form.password);
        if !password.meets_minimum_length() {
            return Err(ServiceError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let token_hash = sha256_hex(form.token.trim());
        let token = self
            .store
            .find_registration_token(&token_hash)
            .await?
            .filter(|t| t.is_redeemable_at(Utc::now()))
            .ok_or(ServiceError::InvalidRegistrationToken)?;

        if self.store.find_identity_by_email(&form.email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        if self
            .store
            .find_identity_by_passaporte(&form.passaporte)
            .await?
            .is_some()
        {
            return Err(ServiceError::PassaporteAlreadyRegistered);
        }

        let password_hash = hash_password(&password)?;
        let recruit = Identity::new_recruit(
            form.display_name,
            form.email,
            form.passaporte,
            password_hash.into_string(),
            token.corporation,
        );

        // The conditional decrement decides races for the last use
        self.store
            .redeem_registration_token(&token_hash, &recruit)
            .await?
            .ok_or(ServiceError::InvalidRegistrationToken)?;

        tracing::info!(
            identity_id = %recruit.identity_id,
            corporation = ?recruit.corporation,
            "Policial registered, pending review"
        );
        Ok(recruit)
    }
}
