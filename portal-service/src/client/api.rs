use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{ClientError, CredentialStore, RecoveryFlow, Requested};
use crate::dtos::{
    admin::{GenerateTokenRequest, GenerateTokenResponse, LogsResponse, ReviewRecruitRequest},
    auth::{
        LoginRequest, MessageResponse, PoliceLoginRequest, PoliceSessionResponse,
        RegisterRequest, SessionResponse,
    },
    portal::CreateBoletimRequest,
    ErrorResponse,
};
use crate::models::{Announcement, Boletim, IdentityResponse, IdentityStatus};

#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl PortalClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.get().is_some()
    }

    // ==================== Session ====================

    pub async fn register(
        &self,
        nome: &str,
        email: &str,
        senha: &str,
    ) -> Result<IdentityResponse, ClientError> {
        let body = RegisterRequest {
            nome: nome.to_string(),
            email: email.to_string(),
            senha: senha.to_string(),
        };
        self.send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await
    }

    /// Log in and keep the session token.
    pub async fn login(&self, email: &str, senha: &str) -> Result<IdentityResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            senha: senha.to_string(),
        };
        let session: SessionResponse = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        self.credentials.set(session.token);
        Ok(session.usuario)
    }

    pub async fn police_login(
        &self,
        passaporte: &str,
        senha: &str,
        recaptcha_token: &str,
    ) -> Result<IdentityResponse, ClientError> {
        let body = PoliceLoginRequest {
            passaporte: passaporte.to_string(),
            senha: senha.to_string(),
            recaptcha_token: recaptcha_token.to_string(),
        };
        let session: PoliceSessionResponse = self
            .send(self.request(Method::POST, "/api/policia/login").json(&body))
            .await?;
        self.credentials.set(session.token);
        Ok(session.policial)
    }

    pub async fn me(&self) -> Result<IdentityResponse, ClientError> {
        self.send(self.request(Method::GET, "/api/auth/me")).await
    }

    /// Revoke the session server-side; the local token is dropped either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result: Result<MessageResponse, ClientError> =
            self.send(self.request(Method::POST, "/api/auth/logout")).await;
        self.credentials.clear();
        result.map(|_| ())
    }

    /// First recovery step: ask the server to email a code.
    pub async fn start_recovery(&self, email: &str) -> Result<RecoveryFlow<Requested>, ClientError> {
        RecoveryFlow::start(self.clone(), email).await
    }

    // ==================== Portal ====================

    /// Announcements with no corporation; no session needed.
    pub async fn announcements(&self) -> Result<Vec<Announcement>, ClientError> {
        self.send(self.request(Method::GET, "/api/anuncios")).await
    }

    /// Announcements visible to the logged-in account.
    pub async fn member_announcements(&self) -> Result<Vec<Announcement>, ClientError> {
        self.send(self.request(Method::GET, "/api/policia/anuncios"))
            .await
    }

    pub async fn file_boletim(
        &self,
        tipo: &str,
        descricao: &str,
        local: &str,
    ) -> Result<Boletim, ClientError> {
        let body = CreateBoletimRequest {
            tipo: tipo.to_string(),
            descricao: descricao.to_string(),
            local: local.to_string(),
        };
        self.send(self.request(Method::POST, "/api/boletins").json(&body))
            .await
    }

    // ==================== Admin ====================

    pub async fn list_recruits(&self) -> Result<Vec<IdentityResponse>, ClientError> {
        self.send(self.request(Method::GET, "/api/admin/recrutas")).await
    }

    pub async fn review_recruit(
        &self,
        recruit_id: Uuid,
        decision: IdentityStatus,
        patente: Option<&str>,
        divisao: Option<&str>,
    ) -> Result<IdentityResponse, ClientError> {
        let body = ReviewRecruitRequest {
            novo_status: decision,
            patente: patente.map(str::to_string),
            divisao: divisao.map(str::to_string),
        };
        let path = format!("/api/admin/recrutas/{}", recruit_id);
        self.send(self.request(Method::PUT, &path).json(&body)).await
    }

    pub async fn generate_token(
        &self,
        max_uses: i32,
        duration_hours: i64,
        corporacao: Option<&str>,
    ) -> Result<GenerateTokenResponse, ClientError> {
        let body = GenerateTokenRequest {
            max_uses,
            duration_hours,
            corporacao: corporacao.map(str::to_string),
        };
        self.send(self.request(Method::POST, "/api/admin/generate-token").json(&body))
            .await
    }

    pub async fn audit_logs(&self, page: u32, limit: u32) -> Result<LogsResponse, ClientError> {
        let request = self
            .request(Method::GET, "/api/admin/logs")
            .query(&[("page", page), ("limit", limit)]);
        self.send(request).await
    }

    // ==================== Transport ====================

    pub(super) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.credentials.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = self.check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::debug!("Session rejected, clearing stored credentials");
                self.credentials.clear();
                Err(ClientError::Unauthorized(message))
            }
            StatusCode::FORBIDDEN => Err(ClientError::PermissionDenied(message)),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    }
}
