use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The stored session was cleared.
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::PermissionDenied(_) => Some(403),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::PasswordMismatch | ClientError::Transport(_) => None,
        }
    }
}
