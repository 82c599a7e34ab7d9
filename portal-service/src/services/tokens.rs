use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::RoleType;

pub const ACCESS_SCOPE: &str = "access";
pub const PASSWORD_RESET_SCOPE: &str = "password_reset";

/// RS256 issuer for session tokens and password reset tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
    reset_token_expiry_minutes: i64,
}

/// Claims for session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (identity ID)
    pub sub: String,
    /// `civil` or `policial`
    pub role: String,
    pub scope: String,
    /// JWT ID (for the logout denylist)
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn identity_id(&self) -> Result<Uuid, anyhow::Error> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow::anyhow!("Invalid subject: {}", e))
    }
}

/// Claims for the single-use token that gates the final recovery step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenClaims {
    pub sub: String,
    pub scope: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl ResetTokenClaims {
    pub fn identity_id(&self) -> Result<Uuid, anyhow::Error> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow::anyhow!("Invalid subject: {}", e))
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

impl JwtService {
    /// Create a new JWT service by loading RSA keys from files
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let private_key_pem = fs::read_to_string(&config.private_key_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read private key from {}: {}",
                config.private_key_path,
                e
            )
        })?;

        let public_key_pem = fs::read_to_string(&config.public_key_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read public key from {}: {}",
                config.public_key_path,
                e
            )
        })?;

        let service = Self::from_pem(
            &private_key_pem,
            &public_key_pem,
            config.access_token_expiry_minutes,
            config.reset_token_expiry_minutes,
        )?;

        tracing::info!("JWT service initialized with RS256 keys");
        Ok(service)
    }

    pub fn from_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_minutes: i64,
        reset_token_expiry_minutes: i64,
    ) -> Result<Self, anyhow::Error> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to parse private key: {}", e))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to parse public key: {}", e))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            access_token_expiry_minutes,
            reset_token_expiry_minutes,
        })
    }

    pub fn generate_access_token(
        &self,
        identity_id: Uuid,
        role: RoleType,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: identity_id.to_string(),
            role: role.as_str().to_string(),
            scope: ACCESS_SCOPE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn generate_reset_token(&self, identity_id: Uuid) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.reset_token_expiry_minutes);

        let claims = ResetTokenClaims {
            sub: identity_id.to_string(),
            scope: PASSWORD_RESET_SCOPE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode reset token: {}", e))
    }

    /// Validate and decode a session token. Reset tokens are rejected.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?
            .claims;

        if claims.scope != ACCESS_SCOPE {
            return Err(anyhow::anyhow!("Invalid access token: wrong scope"));
        }
        Ok(claims)
    }

    /// Validate and decode a reset token. Session tokens are rejected.
    pub fn validate_reset_token(&self, token: &str) -> Result<ResetTokenClaims, anyhow::Error> {
        let claims = decode::<ResetTokenClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| anyhow::anyhow!("Invalid reset token: {}", e))?
            .claims;

        if claims.scope != PASSWORD_RESET_SCOPE {
            return Err(anyhow::anyhow!("Invalid reset token: wrong scope"));
        }
        Ok(claims)
    }

    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }
}
