//! Credential hashing primitives.
//!
//! Two distinct one-way functions live here and must never be mixed up:
//! passwords get an adaptive, salted, deliberately slow hash (Argon2id),
//! while bearer tokens get a fast deterministic SHA-256 fingerprint that is
//! only ever used as a session lookup key. The fingerprint is useless for
//! password storage and the password hash is useless as a lookup key.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};

/// Hash a password with Argon2id and a per-call random salt.
///
/// The salt and cost parameters are embedded in the returned PHC string, so
/// verification needs nothing but the hash itself.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// A malformed or truncated stored hash yields `false`, not an error: the
/// caller treats it exactly like a wrong password.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Compute the SHA-256 hex fingerprint of a bearer token.
///
/// Sessions store only this fingerprint, so a leaked session table cannot be
/// replayed as tokens.
pub fn fingerprint_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(verify_password("Passw0rd!", &hash));
        assert!(!verify_password("passw0rd!", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b, "per-call salt must produce distinct hashes");
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn test_malformed_hash_is_false_not_error() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_fingerprint_is_deterministic_hex() {
        let fp = fingerprint_token("some.bearer.token");
        assert_eq!(fp, fingerprint_token("some.bearer.token"));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_distinguishes_tokens() {
        assert_ne!(fingerprint_token("token-a"), fingerprint_token("token-b"));
    }
}
