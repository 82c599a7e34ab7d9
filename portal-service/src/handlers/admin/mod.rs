pub mod content;
pub mod logs;
pub mod personnel;

pub use content::{create_announcement, create_concurso, delete_concurso, update_concurso};
pub use logs::get_logs;
pub use personnel::{generate_token, list_policiais, list_recruits, manage_career, review_recruit};

use service_core::error::AppError;

use crate::services::ActionOutcome;

/// The pipeline answered with an outcome of a different shape than the route asked for.
pub(crate) fn unexpected_outcome(outcome: ActionOutcome) -> AppError {
    AppError::InternalError(anyhow::anyhow!(
        "Unexpected action outcome: {:?}",
        outcome
    ))
}
