//! reCAPTCHA verification for the police login form.

use async_trait::async_trait;
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` when the provider rejects the token.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, AppError>;
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[derive(Clone)]
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        Ok(Self { client, secret })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, AppError> {
        if token.is_empty() {
            return Ok(false);
        }

        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let res = self
            .client
            .post(SITEVERIFY_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reCAPTCHA request failed");
                AppError::BadGateway("Captcha provider unavailable".to_string())
            })?;

        if !res.status().is_success() {
            tracing::error!(status = %res.status(), "reCAPTCHA returned an error status");
            return Err(AppError::BadGateway(
                "Captcha provider unavailable".to_string(),
            ));
        }

        let body: SiteverifyResponse = res.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse reCAPTCHA response");
            AppError::BadGateway("Captcha provider unavailable".to_string())
        })?;

        if !body.success {
            tracing::warn!(errors = ?body.error_codes, "reCAPTCHA rejected token");
        }
        Ok(body.success)
    }
}

/// Used when no secret is configured. Accepts everything.
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Test double with a fixed answer.
pub struct StaticCaptcha(pub bool);

#[async_trait]
impl CaptchaVerifier for StaticCaptcha {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> Result<bool, AppError> {
        Ok(self.0)
    }
}
