use super::{ClientError, PortalClient};
use crate::dtos::auth::{
    ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, VerifyCodeRequest,
    VerifyCodeResponse,
};

/// A code was emailed; next step is [`RecoveryFlow::verify`].
#[derive(Debug)]
pub struct Requested;

/// The code was accepted; next step is [`RecoveryFlow::reset`].
#[derive(Debug)]
pub struct Verified {
    reset_token: String,
}

/// Password recovery as a sequence of typed steps.
pub struct RecoveryFlow<S> {
    client: PortalClient,
    email: String,
    state: S,
}

/// The password was replaced.
#[derive(Debug, Clone)]
pub struct Completed {
    pub email: String,
    pub message: String,
}

impl<S> RecoveryFlow<S> {
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl RecoveryFlow<Requested> {
    pub(super) async fn start(client: PortalClient, email: &str) -> Result<Self, ClientError> {
        let flow = Self {
            client,
            email: email.to_string(),
            state: Requested,
        };
        flow.resend().await?;
        Ok(flow)
    }

    /// Ask for a fresh code; the previous one stops working.
    pub async fn resend(&self) -> Result<(), ClientError> {
        let body = ForgotPasswordRequest {
            email: self.email.clone(),
        };
        let _: MessageResponse = self
            .client
            .post_json("/api/auth/forgot-password", &body)
            .await?;
        Ok(())
    }

    /// A rejected code leaves this step usable for another try.
    pub async fn verify(&self, code: &str) -> Result<RecoveryFlow<Verified>, ClientError> {
        let body = VerifyCodeRequest {
            email: self.email.clone(),
            code: code.trim().to_string(),
        };
        let response: VerifyCodeResponse = self
            .client
            .post_json("/api/auth/verify-code", &body)
            .await?;

        Ok(RecoveryFlow {
            client: self.client.clone(),
            email: self.email.clone(),
            state: Verified {
                reset_token: response.reset_token,
            },
        })
    }
}

impl RecoveryFlow<Verified> {
    /// Mismatched passwords are rejected locally and keep this step usable.
    pub async fn reset(
        &self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Completed, ClientError> {
        if new_password != confirmation {
            return Err(ClientError::PasswordMismatch);
        }

        let body = ResetPasswordRequest {
            reset_token: self.state.reset_token.clone(),
            new_password: new_password.to_string(),
        };
        let response: MessageResponse = self
            .client
            .post_json("/api/auth/reset-password", &body)
            .await?;

        Ok(Completed {
            email: self.email.clone(),
            message: response.message,
        })
    }
}
