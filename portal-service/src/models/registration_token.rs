//! Registration token model - bounded-use invitations into a corporation.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_DURATION_HOURS: i64 = 720;

/// Registration token entity. The bearer value is never stored, only its hash.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationToken {
    pub token_id: Uuid,
    pub token_hash: String,
    pub corporation: String,
    pub max_uses: i32,
    pub remaining_uses: i32,
    pub expiry_utc: DateTime<Utc>,
    pub issued_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl RegistrationToken {
    pub fn new(
        token_hash: String,
        corporation: String,
        max_uses: i32,
        duration_hours: i64,
        issued_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            token_id: Uuid::new_v4(),
            token_hash,
            corporation,
            max_uses,
            remaining_uses: max_uses,
            expiry_utc: now + Duration::hours(duration_hours),
            issued_by,
            created_utc: now,
        }
    }

    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_uses > 0 && now < self.expiry_utc
    }
}
