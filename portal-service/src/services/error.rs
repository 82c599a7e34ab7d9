use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account awaiting approval")]
    AccountPending,

    #[error("Account is no longer active")]
    AccountInactive,

    #[error("Captcha verification failed")]
    CaptchaFailed,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Passaporte already registered")]
    PassaporteAlreadyRegistered,

    #[error("Invalid or expired registration token")]
    InvalidRegistrationToken,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

/// Failures of the code / reset-token recovery flow.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("Email not registered")]
    NotRegistered,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Code expired, request a new one")]
    ExpiredChallenge,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Password must be at least 8 characters")]
    WeakCredential,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::App(e) => e,
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountPending => {
                AppError::Forbidden(anyhow::anyhow!("Account awaiting approval"))
            }
            ServiceError::AccountInactive => {
                AppError::Forbidden(anyhow::anyhow!("Account is no longer active"))
            }
            ServiceError::CaptchaFailed => {
                AppError::BadRequest(anyhow::anyhow!("Captcha verification failed"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::PassaporteAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Passaporte already registered"))
            }
            ServiceError::InvalidRegistrationToken => {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired registration token"))
            }
            ServiceError::PermissionDenied(e) => AppError::Forbidden(anyhow::anyhow!(e)),
            ServiceError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
            ServiceError::Conflict(e) => AppError::Conflict(anyhow::anyhow!(e)),
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Recovery(e) => e.into(),
        }
    }
}

impl From<RecoveryError> for AppError {
    fn from(err: RecoveryError) -> Self {
        match err {
            RecoveryError::NotRegistered => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            RecoveryError::InvalidCode
            | RecoveryError::ExpiredChallenge
            | RecoveryError::InvalidResetToken
            | RecoveryError::WeakCredential => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
        }
    }
}
