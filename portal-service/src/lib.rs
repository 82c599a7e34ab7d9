pub mod client;
pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::PortalConfig;
use crate::services::{
    AdminPipeline, AuthService, CaptchaVerifier, EmailProvider, JwtService, PortalService,
    PortalStore, RecoveryService, RegistrationService, TokenBlacklist,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::registration::register,
        handlers::auth::registration::police_register,
        handlers::auth::session::login,
        handlers::auth::session::police_login,
        handlers::auth::session::me,
        handlers::auth::session::logout,
        handlers::auth::password::forgot_password,
        handlers::auth::password::verify_code,
        handlers::auth::password::reset_password,
        handlers::portal::list_announcements,
        handlers::portal::list_member_announcements,
        handlers::portal::list_concursos,
        handlers::boletins::create_boletim,
        handlers::boletins::list_boletins,
        handlers::boletins::assume_boletim,
        handlers::admin::personnel::list_recruits,
        handlers::admin::personnel::review_recruit,
        handlers::admin::personnel::list_policiais,
        handlers::admin::personnel::manage_career,
        handlers::admin::personnel::generate_token,
        handlers::admin::content::create_announcement,
        handlers::admin::content::create_concurso,
        handlers::admin::content::update_concurso,
        handlers::admin::content::delete_concurso,
        handlers::admin::logs::get_logs,
        handlers::staff::list_corporations,
        handlers::staff::create_corporation,
        handlers::staff::update_corporation_permissions,
        handlers::staff::create_rank,
        handlers::staff::create_division,
        handlers::internal::update_identity_permissions,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::SessionResponse,
            dtos::auth::PoliceLoginRequest,
            dtos::auth::PoliceSessionResponse,
            dtos::auth::PoliceRegisterRequest,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::VerifyCodeRequest,
            dtos::auth::VerifyCodeResponse,
            dtos::auth::ResetPasswordRequest,
            dtos::auth::MessageResponse,
            dtos::admin::ReviewRecruitRequest,
            dtos::admin::ManageCareerRequest,
            dtos::admin::GenerateTokenRequest,
            dtos::admin::GenerateTokenResponse,
            dtos::admin::CreateAnnouncementRequest,
            dtos::admin::CreateConcursoRequest,
            dtos::admin::UpdateConcursoRequest,
            dtos::admin::LogsResponse,
            dtos::staff::CreateCorporationRequest,
            dtos::staff::UpdatePermissionsRequest,
            dtos::staff::CreateRankRequest,
            dtos::staff::CreateDivisionRequest,
            dtos::portal::CreateBoletimRequest,
            models::IdentityResponse,
            models::IdentityStatus,
            models::RoleType,
            models::PermissionFlags,
            models::CorporationResponse,
            models::Rank,
            models::Division,
            models::Announcement,
            models::Concurso,
            models::Boletim,
            models::BoletimStatus,
            models::AuditLogResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Accounts and sessions"),
        (name = "Password Recovery", description = "Code, reset token, new password"),
        (name = "Portal", description = "Public listings"),
        (name = "Boletins", description = "Occurrence reports"),
        (name = "Admin", description = "RH panel: recruits, careers, tokens, content, audit log"),
        (name = "Staff", description = "Corporations and their hierarchy"),
        (name = "Internal", description = "Operator routes behind the admin key"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "admin_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-admin-api-key"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub store: Arc<dyn PortalStore>,
    pub jwt: JwtService,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub auth: AuthService,
    pub recovery: RecoveryService,
    pub registration: RegistrationService,
    pub admin: AdminPipeline,
    pub portal: PortalService,
}

impl AppState {
    /// Wire every service over one store.
    pub fn new(
        config: PortalConfig,
        store: Arc<dyn PortalStore>,
        jwt: JwtService,
        blacklist: Arc<dyn TokenBlacklist>,
        email: Arc<dyn EmailProvider>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        let auth = AuthService::new(store.clone(), jwt.clone(), blacklist.clone(), captcha);
        let recovery = RecoveryService::new(store.clone(), jwt.clone(), email, &config.recovery);
        let registration = RegistrationService::new(store.clone());
        let admin = AdminPipeline::new(store.clone());
        let portal = PortalService::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            jwt,
            blacklist,
            auth,
            recovery,
            registration,
            admin,
            portal,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Routes behind a session token
    let authenticated = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/boletins", post(handlers::boletins::create_boletim))
        .route(
            "/api/policia/anuncios",
            get(handlers::portal::list_member_announcements),
        )
        .route("/api/policia/boletins", get(handlers::boletins::list_boletins))
        .route(
            "/api/policia/boletins/:id/assumir",
            put(handlers::boletins::assume_boletim),
        )
        .route("/api/admin/recrutas", get(handlers::admin::list_recruits))
        .route("/api/admin/recrutas/:id", put(handlers::admin::review_recruit))
        .route("/api/admin/policiais", get(handlers::admin::list_policiais))
        .route(
            "/api/admin/gerenciar-policial",
            put(handlers::admin::manage_career),
        )
        .route(
            "/api/admin/generate-token",
            post(handlers::admin::generate_token),
        )
        .route("/api/admin/anuncios", post(handlers::admin::create_announcement))
        .route("/api/admin/concursos", post(handlers::admin::create_concurso))
        .route(
            "/api/admin/concursos/:id",
            put(handlers::admin::update_concurso).delete(handlers::admin::delete_concurso),
        )
        .route("/api/admin/logs", get(handlers::admin::get_logs))
        .route(
            "/api/staff/corporacoes",
            get(handlers::staff::list_corporations).post(handlers::staff::create_corporation),
        )
        .route(
            "/api/staff/corporacoes/:id/permissions",
            put(handlers::staff::update_corporation_permissions),
        )
        .route(
            "/api/staff/corporacoes/:id/patentes",
            post(handlers::staff::create_rank),
        )
        .route(
            "/api/staff/corporacoes/:id/divisoes",
            post(handlers::staff::create_division),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Operator routes
    let internal = Router::new()
        .route(
            "/api/internal/identities/:id/permissions",
            put(handlers::internal::update_identity_permissions),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route("/api/auth/verify-code", post(handlers::auth::verify_code))
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .route("/api/policia/login", post(handlers::auth::police_login))
        .route("/api/policia/register", post(handlers::auth::police_register))
        .route("/api/anuncios", get(handlers::portal::list_announcements))
        .route("/api/concursos", get(handlers::portal::list_concursos))
        .merge(authenticated)
        .merge(internal)
        .with_state(state.clone())
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(cors_layer(&state.config.security.allowed_origins));

    Ok(app)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(allowed_origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-api-key"),
        ])
}

fn parse_origins(allowed_origins: &[String]) -> Vec<HeaderValue> {
    allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect()
}
