//! Recovery challenge model - one outstanding code per (email, flow).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Recovery flow codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryFlow {
    PasswordReset,
}

impl RecoveryFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryFlow::PasswordReset => "password_reset",
        }
    }
}

/// Recovery challenge entity. Only the sha256 of the code is stored.
#[derive(Debug, Clone, FromRow)]
pub struct RecoveryChallenge {
    pub challenge_id: Uuid,
    pub email: String,
    pub flow_code: String,
    pub code_hash: String,
    pub attempt_count: i32,
    pub attempt_max: i32,
    pub expiry_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl RecoveryChallenge {
    pub fn new(
        email: &str,
        flow: RecoveryFlow,
        code_hash: String,
        ttl: Duration,
        attempt_max: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            challenge_id: Uuid::new_v4(),
            email: email.to_lowercase(),
            flow_code: flow.as_str().to_string(),
            code_hash,
            attempt_count: 0,
            attempt_max,
            expiry_utc: now + ttl,
            created_utc: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_utc
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.attempt_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_exclusive_of_the_deadline() {
        let challenge = RecoveryChallenge::new(
            "a@b.com",
            RecoveryFlow::PasswordReset,
            "hash".to_string(),
            Duration::minutes(15),
            5,
        );
        assert!(!challenge.is_expired_at(challenge.created_utc));
        assert!(challenge.is_expired_at(challenge.expiry_utc));
    }

    #[test]
    fn exhausted_after_max_attempts() {
        let mut challenge = RecoveryChallenge::new(
            "a@b.com",
            RecoveryFlow::PasswordReset,
            "hash".to_string(),
            Duration::minutes(15),
            2,
        );
        challenge.attempt_count = 1;
        assert!(!challenge.is_exhausted());
        challenge.attempt_count = 2;
        assert!(challenge.is_exhausted());
    }
}
