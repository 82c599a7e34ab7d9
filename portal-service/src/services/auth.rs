//! Session lifecycle: civil registration, login (citizen and police forms),
//! logout.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    models::{Identity, IdentityStatus, RoleType},
    services::{
        metrics::LOGINS, store::PortalStore, AccessTokenClaims, CaptchaVerifier, JwtService,
        ServiceError, TokenBlacklist,
    },
    utils::{dummy_hash, hash_password, verify_password, Password, PasswordHashString},
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PortalStore>,
    jwt: JwtService,
    blacklist: Arc<dyn TokenBlacklist>,
    captcha: Arc<dyn CaptchaVerifier>,
}

/// Issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn PortalStore>,
        jwt: JwtService,
        blacklist: Arc<dyn TokenBlacklist>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        Self {
            store,
            jwt,
            blacklist,
            captcha,
        }
    }

    /// Citizen accounts are active immediately.
    #[tracing::instrument(skip(self, password))]
    pub async fn register_civil(
        &self,
        display_name: String,
        email: String,
        password: String,
    ) -> Result<Identity, ServiceError> {
        let password = Password::new(password);
        if !password.meets_minimum_length() {
            return Err(ServiceError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.store.find_identity_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&password)?;
        let identity = Identity::new_civil(display_name, email, password_hash.into_string());
        self.store.insert_identity(&identity).await?;

        tracing::info!(identity_id = %identity.identity_id, "Civil registered");
        Ok(identity)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: String) -> Result<Session, ServiceError> {
        let identity = self.store.find_identity_by_email(email).await?;
        self.open_session(identity, password, "email").await
    }

    /// Police login by passaporte, behind a captcha.
    #[tracing::instrument(skip(self, password, captcha_token))]
    pub async fn police_login(
        &self,
        passaporte: &str,
        password: String,
        captcha_token: &str,
        source_ip: &str,
    ) -> Result<Session, ServiceError> {
        if !self.captcha.verify(captcha_token, Some(source_ip)).await? {
            metrics::counter!(LOGINS, "method" => "passaporte", "result" => "captcha").increment(1);
            return Err(ServiceError::CaptchaFailed);
        }

        let identity = self
            .store
            .find_identity_by_passaporte(passaporte)
            .await?
            .filter(|i| i.role() == RoleType::Policial);
        self.open_session(identity, password, "passaporte").await
    }

    async fn open_session(
        &self,
        identity: Option<Identity>,
        password: String,
        method: &'static str,
    ) -> Result<Session, ServiceError> {
        let result = self.check_credentials(identity, password);
        let identity = match result {
            Ok(identity) => identity,
            Err(e) => {
                metrics::counter!(LOGINS, "method" => method, "result" => "rejected").increment(1);
                return Err(e);
            }
        };

        let token = self
            .jwt
            .generate_access_token(identity.identity_id, identity.role())?;

        metrics::counter!(LOGINS, "method" => method, "result" => "success").increment(1);
        tracing::info!(identity_id = %identity.identity_id, "Session opened");
        Ok(Session { token, identity })
    }

    fn check_credentials(
        &self,
        identity: Option<Identity>,
        password: String,
    ) -> Result<Identity, ServiceError> {
        let password = Password::new(password);
        let Some(identity) = identity else {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(&password, dummy);
            }
            return Err(ServiceError::InvalidCredentials);
        };

        verify_password(
            &password,
            &PasswordHashString::new(identity.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        // Status is only revealed to the account holder
        match identity.status() {
            IdentityStatus::Aprovado => Ok(identity),
            IdentityStatus::Pendente => Err(ServiceError::AccountPending),
            IdentityStatus::Reprovado => Err(ServiceError::AccountInactive),
        }
    }

    /// Revoke the session token for the rest of its lifetime.
    #[tracing::instrument(skip_all, fields(identity_id = %claims.sub))]
    pub async fn logout(&self, claims: &AccessTokenClaims) -> Result<(), ServiceError> {
        let remaining = claims.exp - Utc::now().timestamp();
        if remaining > 0 {
            self.blacklist.blacklist_token(&claims.jti, remaining).await?;
        }
        tracing::info!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        store::InMemoryStore, tokens::test_keys, MockBlacklist, StaticCaptcha,
    };

    fn service(captcha_ok: bool) -> (Arc<InMemoryStore>, Arc<MockBlacklist>, AuthService) {
        let store = Arc::new(InMemoryStore::new());
        let blacklist = Arc::new(MockBlacklist::new());
        let service = AuthService::new(
            store.clone(),
            test_keys::jwt_service(),
            blacklist.clone(),
            Arc::new(StaticCaptcha(captcha_ok)),
        );
        (store, blacklist, service)
    }

    fn policial(store: &InMemoryStore, status: IdentityStatus) -> Identity {
        let hash = hash_password(&Password::new("password123".into())).unwrap();
        let mut identity = Identity::new_recruit(
            "Agente".into(),
            "agente@example.com".into(),
            "4242".into(),
            hash.into_string(),
            "PM".into(),
        );
        identity.corporation = None;
        identity.set_status(status);
        store.seed_identity(identity.clone()).unwrap();
        identity
    }

    #[tokio::test]
    async fn civil_can_register_and_login() {
        let (_, _, service) = service(true);
        service
            .register_civil("Maria".into(), "Maria@Example.com".into(), "password123".into())
            .await
            .unwrap();

        let session = service
            .login("maria@example.com", "password123".into())
            .await
            .unwrap();
        assert_eq!(session.identity.role(), RoleType::Civil);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (_, _, service) = service(true);
        service
            .register_civil("A".into(), "a@example.com".into(), "password123".into())
            .await
            .unwrap();
        let err = service
            .register_civil("B".into(), "A@example.com".into(), "password123".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (store, _, service) = service(true);
        policial(&store, IdentityStatus::Aprovado);
        let err = service
            .login("agente@example.com", "wrongpassword".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_account_fails_like_a_wrong_password() {
        let (store, _, service) = service(true);
        policial(&store, IdentityStatus::Pendente);

        let unknown = service
            .login("ninguem@example.com", "password123".into())
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::InvalidCredentials));

        let unknown = service
            .police_login("9999", "password123".into(), "captcha", "127.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::InvalidCredentials));

        // A pending account's status stays hidden behind a wrong password
        let wrong = service
            .police_login("4242", "wrongpassword".into(), "captcha", "127.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn pending_and_dismissed_accounts_cannot_login() {
        let (store, _, service) = service(true);
        policial(&store, IdentityStatus::Pendente);
        let err = service
            .police_login("4242", "password123".into(), "captcha", "127.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountPending));

        let (store, _, service) = self::service(true);
        policial(&store, IdentityStatus::Reprovado);
        let err = service
            .police_login("4242", "password123".into(), "captcha", "127.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountInactive));
    }

    #[tokio::test]
    async fn failed_captcha_blocks_police_login() {
        let (store, _, service) = service(false);
        policial(&store, IdentityStatus::Aprovado);
        let err = service
            .police_login("4242", "password123".into(), "captcha", "127.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CaptchaFailed));
    }

    #[tokio::test]
    async fn logout_blacklists_the_token_id() {
        let (store, blacklist, service) = service(true);
        policial(&store, IdentityStatus::Aprovado);
        let session = service
            .police_login("4242", "password123".into(), "captcha", "127.0.0.1")
            .await
            .unwrap();

        let claims = test_keys::jwt_service()
            .validate_access_token(&session.token)
            .unwrap();
        service.logout(&claims).await.unwrap();
        assert!(blacklist.is_blacklisted(&claims.jti).await.unwrap());
    }
}
