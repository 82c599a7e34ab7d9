//! Generation and comparison of short-lived secrets: recovery codes and
//! registration token bearer values.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const RECOVERY_CODE_DIGITS: usize = 6;
const REGISTRATION_TOKEN_BYTES: usize = 32;

/// Uniform 6-digit numeric code, zero padded.
pub fn generate_numeric_code() -> String {
    let code: u32 = OsRng.gen_range(0..1_000_000);
    format!("{:0width$}", code, width = RECOVERY_CODE_DIGITS)
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; REGISTRATION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Hash `candidate` and compare it with `expected_hash` in constant time.
pub fn matches_hash(candidate: &str, expected_hash: &str) -> bool {
    let candidate_hash = sha256_hex(candidate);
    candidate_hash
        .as_bytes()
        .ct_eq(expected_hash.as_bytes())
        .into()
}
