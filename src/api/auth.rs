//! Authentication endpoints and the request auth gate.
//!
//! A request is authenticated only when all three hold: the bearer token
//! verifies (signature + expiry), a live session row exists for it, and the
//! user still exists. Every rejection short-circuits; auth failures are
//! never retried server-side.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation;
use crate::crypto;
use crate::db::{self, CreateUser, ProfileUpdate, User, UserResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The authenticated caller, attached by the auth gate.
///
/// Carries the presented token alongside the user so logout can revoke
/// exactly the session it arrived on.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

        let claims = state
            .tokens
            .verify(token)
            .ok_or_else(|| ApiError::forbidden("Invalid or expired token"))?;

        // The token is structurally sound; the session row decides whether
        // it is still usable.
        if !state.sessions.is_valid(&claims.sub, token).await? {
            tracing::debug!(user_id = %claims.sub, "Rejected token without a live session");
            return Err(ApiError::forbidden("Session expired or invalid"));
        }

        let user = db::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %claims.sub, "Rejected token for a deleted user");
                ApiError::forbidden("User not found")
            })?;

        Ok(CurrentUser {
            user,
            token: token.to_string(),
        })
    }
}

/// Argon2 is CPU-bound; run it off the async workers.
async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || crypto::hash_password(&password))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Password hashing task failed");
            ApiError::internal("Password processing failed")
        })?
        .map_err(|err| {
            tracing::error!(error = %err, "Password hashing failed");
            ApiError::internal("Password processing failed")
        })
}

async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || crypto::verify_password(&password, &hash))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Password verification task failed");
            ApiError::internal("Password processing failed")
        })
}

fn validate_profile_fields(
    errors: &mut ValidationErrorBuilder,
    first_name: Option<&str>,
    last_name: Option<&str>,
    age: Option<i32>,
    bio: Option<&str>,
    location: Option<&str>,
) {
    if let Some(name) = first_name {
        if let Err(e) = validation::validate_name(name) {
            errors.add("first_name", e);
        }
    }
    if let Some(name) = last_name {
        if let Err(e) = validation::validate_name(name) {
            errors.add("last_name", e);
        }
    }
    if let Some(age) = age {
        if let Err(e) = validation::validate_age(age) {
            errors.add("age", e);
        }
    }
    if let Some(bio) = bio {
        if let Err(e) = validation::validate_bio(bio) {
            errors.add("bio", e);
        }
    }
    if let Some(location) = location {
        if let Err(e) = validation::validate_location(location) {
            errors.add("location", e);
        }
    }
}

/// Issue a token and record its session; shared by register and login.
async fn open_session(state: &AppState, user: &User) -> Result<String, ApiError> {
    let token = state.tokens.issue(&user.id, &user.email).map_err(|err| {
        tracing::error!(error = %err, "Token signing failed");
        ApiError::internal("Authentication failed")
    })?;
    state.sessions.put(&user.id, &token, state.tokens.ttl()).await?;
    Ok(token)
}

/// Create an account and log it in.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validation::validate_email(&req.email) {
        errors.add("email", e);
    }
    for e in validation::validate_password(&req.password) {
        errors.add("password", e);
    }
    validate_profile_fields(
        &mut errors,
        req.first_name.as_deref(),
        req.last_name.as_deref(),
        req.age,
        req.bio.as_deref(),
        req.location.as_deref(),
    );
    errors.finish()?;

    let email = req.email.to_lowercase();

    if db::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    // The unique index still backstops a concurrent registration of the same
    // email: the losing insert surfaces as a 409.
    let user = db::create_user(
        &state.db,
        &CreateUser {
            email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            age: req.age,
            bio: req.bio,
            location: req.location,
        },
    )
    .await?;

    let token = open_session(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Exchange credentials for a fresh token + session.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validation::validate_email(&req.email) {
        errors.add("email", e);
    }
    if req.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()?;

    let email = req.email.to_lowercase();

    // Unknown email and wrong password are deliberately indistinguishable
    let user = match db::find_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => return Err(ApiError::unauthorized("Invalid email or password")),
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = open_session(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token,
    }))
}

/// GET /api/auth/me
pub async fn me(current: CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: current.user.into(),
    })
}

/// Partial profile update; absent fields stay untouched.
///
/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    validate_profile_fields(
        &mut errors,
        req.first_name.as_deref(),
        req.last_name.as_deref(),
        req.age,
        req.bio.as_deref(),
        req.location.as_deref(),
    );
    errors.finish()?;

    let user = db::update_profile(&state.db, &current.user.id, &req)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: user.into(),
    }))
}

/// Revoke the session the request arrived on.
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.revoke(&current.user.id, &current.token).await?;

    tracing::info!(user_id = %current.user.id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Revoke every session of the caller ("sign out everywhere").
///
/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.revoke_all(&current.user.id).await?;

    tracing::info!(user_id = %current.user.id, "User logged out from all devices");

    Ok(Json(MessageResponse {
        message: "Logged out from all devices successfully".to_string(),
    }))
}
