pub mod announcement;
pub mod audit_log;
pub mod boletim;
pub mod concurso;
pub mod corporation;
pub mod identity;
pub mod permission;
pub mod recovery_challenge;
pub mod registration_token;

pub use announcement::Announcement;
pub use audit_log::{ActionKind, AuditLogEntry, AuditLogResponse};
pub use boletim::{Boletim, BoletimStatus};
pub use concurso::Concurso;
pub use corporation::{Corporation, CorporationResponse, Division, Rank};
pub use identity::{Identity, IdentityResponse, IdentityStatus, RoleType};
pub use permission::{Capability, PermissionFlags};
pub use recovery_challenge::{RecoveryChallenge, RecoveryFlow};
pub use registration_token::RegistrationToken;
