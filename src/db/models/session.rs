//! Session rows: the server-side half of every issued bearer token.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One issued, still-possibly-valid token. `token_hash` is the SHA-256
/// fingerprint of the token, never the token itself.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
