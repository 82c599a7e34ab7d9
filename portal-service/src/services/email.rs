use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use service_core::axum::async_trait;
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a password recovery code. Only the raw code leaves the service
    /// through this call; it is never persisted.
    async fn send_recovery_code(
        &self,
        to_email: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &crate::config::GmailConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.app_password.clone());

        let mailer = SmtpTransport::relay("smtp.gmail.com")
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!("Email service initialized with Gmail SMTP");

        Ok(Self {
            mailer,
            from_email: config.user.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::BadRequest(e.into()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::InternalError(e.into()))?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_recovery_code(
        &self,
        to_email: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Recuperação de senha</h2>
        <p>Use o código abaixo para redefinir sua senha:</p>
        <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{}</p>
        <p style="color: #666; font-size: 12px;">
            O código expira em {} minutos. Se você não fez esta solicitação, ignore este email.
        </p>
    </body>
</html>
"###,
            code, expiry_minutes
        );

        let plain_body = format!(
            "Recuperação de senha\n\nSeu código: {}\n\nO código expira em {} minutos. Se você não fez esta solicitação, ignore este email.",
            code, expiry_minutes
        );

        self.send_email(to_email, "Código de recuperação de senha", &plain_body, &html_body)
            .await
    }
}

/// Records every code it is asked to deliver.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<(String, String)>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent.lock().ok().and_then(|sent| {
            sent.iter()
                .rev()
                .find(|(to, _)| to.eq_ignore_ascii_case(email))
                .map(|(_, code)| code.clone())
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_recovery_code(
        &self,
        to_email: &str,
        code: &str,
        _expiry_minutes: i64,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock mailbox poisoned: {}", e)))?
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_service_creation() {
        let config = crate::config::GmailConfig {
            user: "test@gmail.com".to_string(),
            app_password: "test_password".to_string(),
        };

        assert!(EmailService::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_mock_keeps_latest_code_per_recipient() {
        let mock = MockEmailService::new();
        mock.send_recovery_code("a@b.com", "111111", 15).await.unwrap();
        mock.send_recovery_code("A@B.com", "222222", 15).await.unwrap();
        mock.send_recovery_code("c@d.com", "333333", 15).await.unwrap();

        assert_eq!(mock.last_code_for("a@b.com").as_deref(), Some("222222"));
        assert_eq!(mock.sent_count(), 3);
        assert!(mock.last_code_for("x@y.com").is_none());
    }
}
