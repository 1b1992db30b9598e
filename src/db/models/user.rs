//! User records and profile queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Full user row, including the password hash. Never serialized to clients
/// directly; use [`UserResponse`] for that.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            bio: user.bio,
            profile_image_url: user.profile_image_url,
            location: user.location,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a user. The email must already be lowercased and the
/// password already hashed by the caller.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Partial profile update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Insert a new user with a fresh random id.
pub async fn create_user(db: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, age, bio, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(input.age)
    .bind(&input.bio)
    .bind(&input.location)
    .fetch_one(db)
    .await
}

pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Apply a partial profile update, returning the fresh row or `None` when
/// the user no longer exists. Absent fields keep their current value.
pub async fn update_profile(
    db: &PgPool,
    id: &str,
    updates: &ProfileUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            first_name        = CASE WHEN $2  THEN $3  ELSE first_name END,
            last_name         = CASE WHEN $4  THEN $5  ELSE last_name END,
            age               = CASE WHEN $6  THEN $7  ELSE age END,
            bio               = CASE WHEN $8  THEN $9  ELSE bio END,
            location          = CASE WHEN $10 THEN $11 ELSE location END,
            profile_image_url = CASE WHEN $12 THEN $13 ELSE profile_image_url END,
            updated_at        = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(updates.first_name.is_some())
    .bind(&updates.first_name)
    .bind(updates.last_name.is_some())
    .bind(&updates.last_name)
    .bind(updates.age.is_some())
    .bind(updates.age)
    .bind(updates.bio.is_some())
    .bind(&updates.bio)
    .bind(updates.location.is_some())
    .bind(&updates.location)
    .bind(updates.profile_image_url.is_some())
    .bind(&updates.profile_image_url)
    .fetch_optional(db)
    .await
}

/// Set or clear the profile image URL. This is the only write path that can
/// store NULL in `profile_image_url`.
pub async fn set_profile_image(
    db: &PgPool,
    id: &str,
    url: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET profile_image_url = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(url)
    .fetch_optional(db)
    .await
}
