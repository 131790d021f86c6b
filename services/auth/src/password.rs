//! Password hashing and verification
//!
//! Passwords are hashed with HMAC-SHA-512 where the per-user salt is the MAC
//! key. The salt is generated fresh for every user at registration and is
//! never reused. Verification recomputes the digest and compares it in
//! constant time.

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Length of the per-user salt in bytes
pub const SALT_LEN: usize = 64;

/// Generate a fresh random salt for a new user
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Compute the password digest for the given salt
pub fn hash_password(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha512::new_from_slice(salt).expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Verify a password against a stored digest and salt
///
/// Comparison is constant-time via `Mac::verify_slice`. Any mismatch,
/// including a digest of the wrong length, returns false rather than
/// an error.
pub fn verify_password(password: &str, stored_hash: &[u8], stored_salt: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha512::new_from_slice(stored_salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(stored_hash).is_ok()
}
