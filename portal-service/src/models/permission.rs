//! Permission flags and the capabilities the portal gates on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Named capability keys.
///
/// Keys unknown to this build are kept verbatim in `Other` so flags written by
/// a newer panel survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    IsRh,
    IsStaff,
    IsDev,
    PodeAssumirBo,
    Other(String),
}

impl Capability {
    pub fn key(&self) -> &str {
        match self {
            Capability::IsRh => "is_rh",
            Capability::IsStaff => "is_staff",
            Capability::IsDev => "is_dev",
            Capability::PodeAssumirBo => "podeAssumirBO",
            Capability::Other(key) => key,
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            "is_rh" => Capability::IsRh,
            "is_staff" => Capability::IsStaff,
            "is_dev" => Capability::IsDev,
            "podeAssumirBO" => Capability::PodeAssumirBo,
            other => Capability::Other(other.to_string()),
        }
    }

    /// Police-only capabilities are meaningless on a civil account.
    pub fn requires_policial(&self) -> bool {
        matches!(self, Capability::IsRh | Capability::PodeAssumirBo)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Map of capability key to granted flag, stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PermissionFlags(#[schema(value_type = Object)] BTreeMap<String, bool>);

impl PermissionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability, granted: bool) -> Self {
        self.set(capability, granted);
        self
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        self.0.insert(capability.key().to_string(), granted);
    }

    pub fn get(&self, capability: &Capability) -> Option<bool> {
        self.0.get(capability.key()).copied()
    }

    pub fn grants(&self, capability: &Capability) -> bool {
        self.get(capability).unwrap_or(false)
    }

    /// Overlay `overrides` on top of these flags. An explicit `false` in the
    /// overrides revokes a flag the base grants.
    pub fn overlaid_with(&self, overrides: &PermissionFlags) -> PermissionFlags {
        let mut merged = self.0.clone();
        for (key, granted) in &overrides.0 {
            merged.insert(key.clone(), *granted);
        }
        PermissionFlags(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.0
            .iter()
            .map(|(key, granted)| (Capability::from_key(key), *granted))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, bool)> for PermissionFlags {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_base_flags() {
        let base = PermissionFlags::new()
            .with(Capability::IsRh, true)
            .with(Capability::PodeAssumirBo, true);
        let overrides = PermissionFlags::new().with(Capability::PodeAssumirBo, false);

        let merged = base.overlaid_with(&overrides);
        assert!(merged.grants(&Capability::IsRh));
        assert!(!merged.grants(&Capability::PodeAssumirBo));
    }

    #[test]
    fn unknown_keys_survive_serde() {
        let flags: PermissionFlags =
            serde_json::from_str(r#"{"podeEmitirMultas": true, "is_rh": false}"#).unwrap();
        assert!(flags.grants(&Capability::Other("podeEmitirMultas".to_string())));
        assert_eq!(flags.get(&Capability::IsRh), Some(false));

        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json["podeEmitirMultas"], true);
    }
}
