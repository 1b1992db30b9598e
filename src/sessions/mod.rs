//! Server-side session store.
//!
//! The token issuer can only say a token is *structurally* valid; the row in
//! `user_sessions` is the sole source of truth for whether it is still
//! *usable*. Deleting the row revokes the token without any blocklist.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::crypto::fingerprint_token;

/// Persists one row per active (user, token-fingerprint) pair.
///
/// Rows are independent per pair, so concurrent logins from several devices
/// are ordinary inserts, not a race to resolve.
#[derive(Clone)]
pub struct SessionStore {
    db: PgPool,
}

impl SessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a session for a freshly issued token.
    ///
    /// Also kicks off an opportunistic [`sweep_expired`](Self::sweep_expired);
    /// a failed sweep is logged and never fails the login itself.
    pub async fn put(&self, user_id: &str, token: &str, ttl: Duration) -> Result<(), sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let token_hash = fingerprint_token(token);
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        if let Err(err) = self.sweep_expired().await {
            warn!(error = %err, "Expired-session sweep failed");
        }

        Ok(())
    }

    /// Whether a non-expired session row exists for this (user, token) pair.
    pub async fn is_valid(&self, user_id: &str, token: &str) -> Result<bool, sqlx::Error> {
        let token_hash = fingerprint_token(token);

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM user_sessions WHERE user_id = $1 AND token_hash = $2 AND expires_at > now()",
        )
        .bind(user_id)
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.is_some())
    }

    /// Delete the one session matching this token. Idempotent if absent.
    pub async fn revoke(&self, user_id: &str, token: &str) -> Result<(), sqlx::Error> {
        let token_hash = fingerprint_token(token);

        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND token_hash = $2")
            .bind(user_id)
            .bind(&token_hash)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Delete every session for the user ("sign out everywhere").
    pub async fn revoke_all(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Delete all expired rows, returning how many went away.
    ///
    /// Safe to run concurrently from any number of requests: it is a single
    /// conditional DELETE, idempotent under races.
    pub async fn sweep_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < now()")
            .execute(&self.db)
            .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            debug!(swept, "Removed expired sessions");
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, CreateUser};

    async fn seed_user(db: &PgPool, email: &str) -> String {
        let user = create_user(
            db,
            &CreateUser {
                email: email.to_string(),
                password_hash: "$argon2id$test-placeholder".to_string(),
                first_name: None,
                last_name: None,
                age: None,
                bio: None,
                location: None,
            },
        )
        .await
        .expect("seed user");
        user.id
    }

    #[sqlx::test]
    async fn test_put_then_valid_then_revoke(db: PgPool) {
        let store = SessionStore::new(db.clone());
        let user_id = seed_user(&db, "a@x.com").await;

        store.put(&user_id, "token-1", Duration::days(7)).await.unwrap();
        assert!(store.is_valid(&user_id, "token-1").await.unwrap());
        assert!(!store.is_valid(&user_id, "token-other").await.unwrap());

        store.revoke(&user_id, "token-1").await.unwrap();
        assert!(!store.is_valid(&user_id, "token-1").await.unwrap());

        // Revoking again is a no-op, not an error
        store.revoke(&user_id, "token-1").await.unwrap();
    }

    #[sqlx::test]
    async fn test_revoke_all_spares_other_users(db: PgPool) {
        let store = SessionStore::new(db.clone());
        let alice = seed_user(&db, "alice@x.com").await;
        let bob = seed_user(&db, "bob@x.com").await;

        store.put(&alice, "alice-phone", Duration::days(7)).await.unwrap();
        store.put(&alice, "alice-tablet", Duration::days(7)).await.unwrap();
        store.put(&bob, "bob-phone", Duration::days(7)).await.unwrap();

        store.revoke_all(&alice).await.unwrap();

        assert!(!store.is_valid(&alice, "alice-phone").await.unwrap());
        assert!(!store.is_valid(&alice, "alice-tablet").await.unwrap());
        assert!(store.is_valid(&bob, "bob-phone").await.unwrap());
    }

    /// Insert a session row directly, bypassing the opportunistic sweep
    /// that `put` performs.
    async fn seed_session(db: &PgPool, user_id: &str, token: &str, ttl: Duration) {
        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(fingerprint_token(token))
        .bind(Utc::now() + ttl)
        .execute(db)
        .await
        .expect("seed session");
    }

    #[sqlx::test]
    async fn test_expired_session_is_invalid_and_swept(db: PgPool) {
        let store = SessionStore::new(db.clone());
        let user_id = seed_user(&db, "c@x.com").await;

        seed_session(&db, &user_id, "stale", Duration::seconds(-60)).await;
        assert!(!store.is_valid(&user_id, "stale").await.unwrap());

        let swept = store.sweep_expired().await.unwrap();
        assert_eq!(swept, 1);
        // Sweep is idempotent
        assert_eq!(store.sweep_expired().await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_put_sweeps_expired_rows(db: PgPool) {
        let store = SessionStore::new(db.clone());
        let user_id = seed_user(&db, "e@x.com").await;

        seed_session(&db, &user_id, "long-dead", Duration::seconds(-60)).await;
        store.put(&user_id, "fresh", Duration::days(7)).await.unwrap();

        // The login's opportunistic sweep removed the expired row
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
        assert!(store.is_valid(&user_id, "fresh").await.unwrap());
    }

    #[sqlx::test]
    async fn test_multi_device_sessions_coexist(db: PgPool) {
        let store = SessionStore::new(db.clone());
        let user_id = seed_user(&db, "d@x.com").await;

        store.put(&user_id, "phone", Duration::days(7)).await.unwrap();
        store.put(&user_id, "laptop", Duration::days(7)).await.unwrap();

        assert!(store.is_valid(&user_id, "phone").await.unwrap());
        assert!(store.is_valid(&user_id, "laptop").await.unwrap());

        // Revoking one device leaves the other alone
        store.revoke(&user_id, "phone").await.unwrap();
        assert!(!store.is_valid(&user_id, "phone").await.unwrap());
        assert!(store.is_valid(&user_id, "laptop").await.unwrap());
    }
}
