//! Bearer-token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying the user id and email. Verification
//! is pure computation over the in-process secret; whether a structurally
//! valid token is still *usable* is the session store's call, not ours.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's opaque id.
    pub sub: String,
    pub email: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies signed bearer tokens with a fixed validity window.
///
/// Built once at startup from the configured secret; cheap to clone and safe
/// to share across request tasks.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Lifetime of issued tokens; the session store uses the same window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for the given user identity.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify signature and expiry, returning the claims only if both hold.
    ///
    /// Malformed, tampered, and expired tokens are indistinguishable to the
    /// caller; the precise failure is only visible in debug logs.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(reason = %err, "Token verification failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret-long-enough-for-hmac", 7)
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let signer = signer();
        let token = signer.issue("user-1", "a@x.com").unwrap();

        let claims = signer.verify(&token).expect("fresh token must verify");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let signer = signer();
        let token = signer.issue("user-1", "a@x.com").unwrap();

        // Flip a character in the payload segment
        let mut chars: Vec<char> = token.chars().collect();
        let mid = token.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(signer.verify(&tampered).is_none());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(signer().verify("not-a-jwt").is_none());
        assert!(signer().verify("").is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue("user-1", "a@x.com").unwrap();
        let other = TokenSigner::new("a-completely-different-secret", 7);
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        // Craft claims already past the default 60s validation leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@x.com".to_string(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(&Header::default(), &claims, &signer.encoding).unwrap();

        assert!(signer.verify(&token).is_none());
    }
}
