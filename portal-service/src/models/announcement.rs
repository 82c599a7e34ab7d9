use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Announcement (anúncio). `corporation: None` addresses everyone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Announcement {
    pub announcement_id: Uuid,
    #[schema(example = "Operação Verão")]
    pub title: String,
    pub body: String,
    #[schema(example = "PM")]
    pub corporation: Option<String>,
    pub author_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Announcement {
    pub fn new(title: String, body: String, corporation: Option<String>, author_id: Uuid) -> Self {
        Self {
            announcement_id: Uuid::new_v4(),
            title,
            body,
            corporation,
            author_id,
            created_utc: Utc::now(),
        }
    }
}
