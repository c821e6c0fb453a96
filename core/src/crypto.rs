//! Password hashing for stored credentials
//!
//! Passwords are stored as Argon2id PHC strings in the user list.
//! Entries written by older builds hold the plaintext password instead;
//! those still verify and are flagged for rehashing.

use crate::error::{AppError, Result};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use rand::RngCore;

const SALT_SIZE: usize = 16; // 128 bits

/// Outcome of checking a password against a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Matched an Argon2 hash
    Valid,
    /// Matched a legacy plaintext entry that should be rehashed
    ValidLegacy,
    Invalid,
}

impl Verification {
    pub fn is_valid(self) -> bool {
        !matches!(self, Verification::Invalid)
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = vec![0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let salt_string = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::Crypto(format!("Salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Check `password` against a stored credential
pub fn verify_password(password: &str, stored: &str) -> Verification {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
            {
                Verification::Valid
            } else {
                Verification::Invalid
            }
        }
        // Not a PHC string: an entry saved before hashing was introduced
        Err(_) if stored == password => Verification::ValidLegacy,
        Err(_) => Verification::Invalid,
    }
}
