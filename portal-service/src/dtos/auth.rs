use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::IdentityResponse;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 80, message = "Name is required"))]
    #[schema(example = "Maria Souza")]
    pub nome: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "maria@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123", min_length = 8)]
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "maria@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub usuario: IdentityResponse,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PoliceLoginRequest {
    #[validate(length(min = 1, message = "Passaporte is required"))]
    #[schema(example = "12345")]
    pub passaporte: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub senha: String,

    #[serde(rename = "recaptchaToken", default)]
    pub recaptcha_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoliceSessionResponse {
    pub token: String,
    pub policial: IdentityResponse,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PoliceRegisterRequest {
    #[validate(length(min = 1, message = "Registration token is required"))]
    pub token: String,

    #[validate(length(min = 1, max = 80, message = "Name is required"))]
    #[schema(example = "Carlos Lima")]
    pub nome: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "carlos@example.com")]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "Passaporte is required"))]
    #[schema(example = "12345")]
    pub passaporte: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "maria@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeResponse {
    #[serde(rename = "resetToken")]
    pub reset_token: String,
    #[schema(example = "Code verified")]
    pub message: String,
}

/// Password length is checked by the recovery flow itself so a short
/// password is reported as a weak credential.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(rename = "resetToken")]
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub reset_token: String,

    #[serde(rename = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Password updated")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
