use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use subtle::ConstantTimeEq;

use crate::AppState;

pub const ADMIN_API_KEY_HEADER: &str = "X-Admin-Api-Key";

/// Guard for operator endpoints. Without a configured key every request is
/// rejected.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = headers
        .get(ADMIN_API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match (state.config.security.admin_api_key.as_deref(), provided) {
        (Some(expected), Some(key)) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("Failed admin authentication attempt");
            Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid or missing admin API key"
            )))
        }
    }
}
