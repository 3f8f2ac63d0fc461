//! Salted SHA-256 password digests, stored as `sha256$<salt>$<digest>`.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// Hash `password` under a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = generate_salt();
    format!("{SCHEME}${salt}${}", digest(&salt, password))
}

/// Check `candidate` against a stored field produced by [`hash_password`].
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(salt), Some(expected)) => {
            constant_time_eq(digest(salt, candidate).as_bytes(), expected.as_bytes())
        }
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
