//! Permission gate.
//!
//! An [`Actor`] is the authenticated identity of a request together with the
//! flags of its corporation. Every privileged operation calls [`authorize`]
//! first and receives the [`Scope`] it may act in; targets outside that scope
//! are rejected with [`ensure_in_scope`] before anything is written.

use uuid::Uuid;

use crate::models::{Capability, Identity, PermissionFlags};
use crate::services::{metrics::PERMISSION_DENIALS, ServiceError};

/// Where a granted capability applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    /// Limited to one corporation (by sigla) plus general targets.
    Corporation(String),
}

impl Scope {
    /// General targets (no corporation) are in every scope.
    pub fn covers(&self, target_corporation: Option<&str>) -> bool {
        match (self, target_corporation) {
            (Scope::Global, _) | (_, None) => true,
            (Scope::Corporation(own), Some(target)) => own == target,
        }
    }

    /// Corporation filter for listings; `None` means unrestricted.
    pub fn corporation_filter(&self) -> Option<String> {
        match self {
            Scope::Global => None,
            Scope::Corporation(sigla) => Some(sigla.clone()),
        }
    }
}

/// Authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub identity: Identity,
    pub corporation_permissions: PermissionFlags,
    system: bool,
}

impl Actor {
    pub fn new(identity: Identity, corporation_permissions: PermissionFlags) -> Self {
        Self {
            identity,
            corporation_permissions,
            system: false,
        }
    }

    /// Operator acting through the admin API key. Holds every capability.
    pub fn system() -> Self {
        let mut identity = Identity::new_civil(
            "System".to_string(),
            "system@portal.internal".to_string(),
            String::new(),
        );
        identity.identity_id = Uuid::nil();
        Self {
            identity,
            corporation_permissions: PermissionFlags::new(),
            system: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.identity.identity_id
    }

    pub fn name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn corporation(&self) -> Option<&str> {
        self.identity.corporation.as_deref()
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn effective_permissions(&self) -> PermissionFlags {
        effective_permissions(&self.identity, &self.corporation_permissions)
    }
}

/// Corporation flags overlaid with the identity's own overrides.
pub fn effective_permissions(
    identity: &Identity,
    corporation_permissions: &PermissionFlags,
) -> PermissionFlags {
    corporation_permissions.overlaid_with(identity.overrides())
}

pub fn has_capability(actor: &Actor, capability: &Capability) -> bool {
    if actor.system {
        return true;
    }
    if !actor.identity.is_active() {
        return false;
    }
    if capability.requires_policial() && !actor.identity.is_policial() {
        return false;
    }
    actor.effective_permissions().grants(capability)
}

/// Staff, dev and the operator act across every corporation.
pub fn is_global(actor: &Actor) -> bool {
    actor.system
        || has_capability(actor, &Capability::IsStaff)
        || has_capability(actor, &Capability::IsDev)
}

/// Require any of `capabilities` and return the scope the actor may act in.
///
/// Staff and dev accounts pass every gate with global scope.
pub fn authorize(actor: &Actor, capabilities: &[Capability]) -> Result<Scope, ServiceError> {
    if is_global(actor) {
        return Ok(Scope::Global);
    }

    let Some(granted) = capabilities.iter().find(|c| has_capability(actor, c)) else {
        let required = capabilities
            .iter()
            .map(|c| c.key())
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(deny(actor, format!("{} required", required)));
    };

    match actor.corporation() {
        Some(sigla) => Ok(Scope::Corporation(sigla.to_string())),
        None => Err(deny(
            actor,
            format!("{} requires a corporation affiliation", granted),
        )),
    }
}

pub fn ensure_in_scope(
    actor: &Actor,
    scope: &Scope,
    target_corporation: Option<&str>,
) -> Result<(), ServiceError> {
    if scope.covers(target_corporation) {
        Ok(())
    } else {
        Err(deny(actor, "Target belongs to another corporation".to_string()))
    }
}

fn deny(actor: &Actor, reason: String) -> ServiceError {
    metrics::counter!(PERMISSION_DENIALS).increment(1);
    tracing::warn!(identity_id = %actor.id(), reason = %reason, "Permission denied");
    ServiceError::PermissionDenied(reason)
}
