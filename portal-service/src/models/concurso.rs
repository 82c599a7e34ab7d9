use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Public job posting (concurso) for a corporation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Concurso {
    pub concurso_id: Uuid,
    #[schema(example = "Concurso PM 2026")]
    pub title: String,
    pub description: String,
    #[schema(example = "PM")]
    pub corporation: Option<String>,
    pub open: bool,
    #[schema(example = 20)]
    pub vacancies: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Concurso {
    pub fn new(
        title: String,
        description: String,
        corporation: Option<String>,
        vacancies: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            concurso_id: Uuid::new_v4(),
            title,
            description,
            corporation,
            open: true,
            vacancies,
            created_utc: now,
            updated_utc: now,
        }
    }
}
