//! Services layer for the portal.
//!
//! Business logic for sessions, credential recovery, the permission gate and
//! the administrative pipeline, over the [`store::PortalStore`] seam.

pub mod admin;
pub mod auth;
pub mod captcha;
mod email;
pub mod error;
pub mod metrics;
pub mod permissions;
pub mod portal;
pub mod recovery;
pub mod redis;
pub mod registration;
pub mod store;
pub mod tokens;

pub use admin::{ActionOutcome, AdminAction, AdminPipeline, CareerAction};
pub use auth::{AuthService, Session};
pub use captcha::{CaptchaVerifier, DisabledCaptcha, RecaptchaVerifier, StaticCaptcha};
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use error::{RecoveryError, ServiceError};
pub use permissions::{Actor, Scope};
pub use portal::PortalService;
pub use recovery::RecoveryService;
pub use redis::{MockBlacklist, RedisService, TokenBlacklist};
pub use registration::{PolicialRegistration, RegistrationService};
pub use store::{InMemoryStore, PgStore, PortalStore};
pub use tokens::{AccessTokenClaims, JwtService, ResetTokenClaims};
