//! Stored password hashes.
//!
//! New hashes are PBKDF2-HMAC-SHA256:
//! `pbkdf2-sha256$<iterations>$<salt-hex>$<digest-hex>`.
//!
//! Older user tables hold a bare hex SHA-256 of the password. Those still
//! verify, and [`PasswordHash::needs_rehash`] flags them so the caller can
//! replace them after a successful login.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;

pub const DEFAULT_ITERATIONS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `password` with a fresh random salt.
    pub fn new(password: &str, iterations: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(password, &salt, iterations)
    }

    pub fn with_salt(password: &str, salt: &[u8], iterations: u32) -> Self {
        let iterations = iterations.max(1);
        let digest = derive_key(password, salt, iterations);
        Self(format!(
            "{SCHEME}${iterations}${}${}",
            to_hex(salt),
            to_hex(&digest)
        ))
    }

    /// Wrap a value read from storage without checking it.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, password: &str) -> bool {
        if let Some(rest) = self.0.strip_prefix(SCHEME).and_then(|r| r.strip_prefix('$')) {
            let mut parts = rest.splitn(3, '$');
            let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
                return false;
            };
            let (Ok(iterations), Some(salt)) = (iterations.parse::<u32>(), from_hex(salt)) else {
                return false;
            };
            let actual = to_hex(&derive_key(password, &salt, iterations.max(1)));
            return constant_time_eq(actual.as_bytes(), expected.as_bytes());
        }

        if self.is_legacy() {
            let actual = to_hex(&Sha256::digest(password.as_bytes()));
            return constant_time_eq(actual.as_bytes(), self.0.to_ascii_lowercase().as_bytes());
        }

        false
    }

    /// True for unsalted legacy hashes.
    pub fn needs_rehash(&self) -> bool {
        self.is_legacy()
    }

    fn is_legacy(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
