//! Password digest.
//!
//! Login compares digests by equality in the store, so the digest is unsalted
//! and deterministic: lowercase hex of SHA-256 over the UTF-8 password.

use sha2::{Digest, Sha256};

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
