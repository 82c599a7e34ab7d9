use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::BoletimStatus;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBoletimRequest {
    #[validate(length(min = 1, max = 60, message = "Type is required"))]
    #[schema(example = "Furto")]
    pub tipo: String,
    #[validate(length(min = 1, max = 4000, message = "Description is required"))]
    pub descricao: String,
    #[serde(default)]
    #[schema(example = "Praça da Sé")]
    pub local: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BoletinsQuery {
    pub status: Option<BoletimStatus>,
}
