//! Typed HTTP client for the portal API.
//!
//! [`PortalClient`] keeps the session token in a [`CredentialStore`], drops
//! it on any 401 and reports 403 as [`ClientError::PermissionDenied`] while
//! keeping the session. Password recovery is driven by [`RecoveryFlow`],
//! whose type parameter tracks which step comes next.

mod api;
mod credentials;
mod error;
mod recovery;

pub use api::PortalClient;
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::ClientError;
pub use recovery::{Completed, RecoveryFlow, Requested, Verified};
