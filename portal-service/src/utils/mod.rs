pub mod client_ip;
pub mod password;
pub mod secrets;
pub mod validation;

pub use client_ip::ClientIp;
pub use password::{dummy_hash, hash_password, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
