use portal_service::{
    build_router,
    config::PortalConfig,
    db,
    services::{
        CaptchaVerifier, DisabledCaptcha, EmailService, JwtService, PgStore, RecaptchaVerifier,
        RedisService,
    },
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = PortalConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    portal_service::services::metrics::init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting portal service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool));
    tracing::info!("Database initialized successfully");

    let redis = RedisService::new(&config.redis).await?;
    let blacklist = Arc::new(redis);
    tracing::info!("Redis service initialized");

    let email = Arc::new(EmailService::new(&config.gmail)?);
    tracing::info!("Email service initialized");

    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    let captcha: Arc<dyn CaptchaVerifier> = match config.security.recaptcha_secret.clone() {
        Some(secret) => Arc::new(RecaptchaVerifier::new(secret)?),
        None => {
            // validate() refuses this in prod
            tracing::warn!("RECAPTCHA_SECRET not set, police login captcha disabled");
            Arc::new(DisabledCaptcha)
        }
    };

    let addr: SocketAddr = config.common.bind_address().parse().map_err(|e| {
        service_core::error::AppError::ConfigError(anyhow::anyhow!("Invalid bind address: {}", e))
    })?;
    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );

    let state = AppState::new(config, store, jwt, blacklist, email, captcha);
    let app = build_router(state).await?;

    let _guard = service_span.enter();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
