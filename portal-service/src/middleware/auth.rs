use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    models::PermissionFlags,
    services::{AccessTokenClaims, Actor},
    AppState,
};

/// Require a valid, unrevoked session token and resolve the caller.
///
/// Inserts the [`AccessTokenClaims`] and the [`Actor`] into the request
/// extensions. Every failure is a 401 so clients drop the stored session.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    // Fail closed when the denylist is unreachable
    let revoked = state.blacklist.is_blacklisted(&claims.jti).await.map_err(|e| {
        tracing::error!(error = %e, "Redis error checking blacklist");
        AppError::ServiceUnavailable
    })?;
    if revoked {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Token has been revoked"
        )));
    }

    let identity_id = claims
        .identity_id()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token")))?;
    let identity = state
        .store
        .find_identity_by_id(identity_id)
        .await?
        .filter(|identity| identity.is_active())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Account is not active")))?;

    // A missing corporation row means no inherited flags
    let corporation_permissions = match identity.corporation.as_deref() {
        Some(sigla) => state
            .store
            .find_corporation_by_sigla(sigla)
            .await?
            .map(|corporation| corporation.permissions.0)
            .unwrap_or_default(),
        None => PermissionFlags::new(),
    };

    req.extensions_mut().insert(claims);
    req.extensions_mut()
        .insert(Actor::new(identity, corporation_permissions));

    Ok(next.run(req).await)
}

/// Claims of the current session token.
pub struct AuthUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}

/// Resolved caller of the current request.
pub struct AuthActor(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts.extensions.get::<Actor>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Actor missing from request extensions"))
        })?;

        Ok(AuthActor(actor.clone()))
    }
}
