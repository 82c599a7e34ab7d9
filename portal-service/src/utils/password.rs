//! Account passwords: the length rule shared by registration and recovery,
//! and Argon2id hashing of what ends up in `identities.password_hash`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

/// Shortest password accepted on registration and reset.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Plaintext password as typed on a form. `Debug` is masked.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Counted in characters so accented passwords are not penalised.
    pub fn meets_minimum_length(&self) -> bool {
        self.0.chars().count() >= MIN_PASSWORD_LENGTH
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(****)")
    }
}

/// PHC-format Argon2 hash, as stored on the identity row.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Argon2id with a fresh random salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(PasswordHashString::new(hash.to_string()))
}

/// `Err` on mismatch and on a stored hash that does not parse.
pub fn verify_password(
    password: &Password,
    stored: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed = PasswordHash::new(stored.as_str())
        .map_err(|e| anyhow::anyhow!("Stored password hash is malformed: {}", e))?;

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .map_err(|_| anyhow::anyhow!("Password mismatch"))
}

/// Hash of a random throwaway password, with the same parameters as real
/// hashes. Logins for unknown accounts are verified against it so they cost
/// the same as a wrong password. `None` only if hashing itself failed.
pub fn dummy_hash() -> Option<&'static PasswordHashString> {
    static DUMMY: OnceLock<Option<PasswordHashString>> = OnceLock::new();
    DUMMY
        .get_or_init(|| {
            let throwaway = Password::new(uuid::Uuid::new_v4().to_string());
            hash_password(&throwaway)
                .map_err(|e| tracing::error!(error = %e, "Failed to build dummy password hash"))
                .ok()
        })
        .as_ref()
}
