//! Profile-picture upload and removal.
//!
//! Objects are stored under `profile-{user}-{millis}.{ext}` so a re-upload
//! never collides with the previous picture. Deleting the stale object is
//! best-effort: a failed cleanup is logged and the request proceeds, while a
//! failed upload aborts it.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::api::auth::{CurrentUser, ProfileResponse};
use crate::api::error::ApiError;
use crate::db::{self, UserResponse};
use crate::storage;
use crate::AppState;

/// Upload cap, matching the original client contract.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub user: UserResponse,
}

/// POST /api/upload/profile-picture (multipart field `image`)
pub async fn upload_profile_picture(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut image: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::bad_request("Only image files are allowed"));
        }

        let filename = field.file_name().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Failed to read image data"))?;

        image = Some((content_type, filename, data.to_vec()));
        break;
    }

    let Some((content_type, filename, data)) = image else {
        return Err(ApiError::bad_request("No image file provided"));
    };

    // Best-effort cleanup of the previous picture
    if let Some(old_url) = &current.user.profile_image_url {
        if let Some(old_key) = storage::key_from_url(old_url) {
            if let Err(err) = state.storage.delete(old_key).await {
                tracing::warn!(error = %err, key = old_key, "Failed to delete previous profile picture");
            }
        }
    }

    let key = format!(
        "profile-{}-{}.{}",
        current.user.id,
        Utc::now().timestamp_millis(),
        extension_for(filename.as_deref(), &content_type)
    );

    let image_url = state.storage.upload(&key, data, &content_type).await?;

    let user = db::set_profile_image(&state.db, &current.user.id, Some(&image_url))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = %user.id, key = %key, "Profile picture uploaded");

    Ok(Json(UploadResponse {
        message: "Profile picture uploaded successfully".to_string(),
        image_url,
        user: user.into(),
    }))
}

/// DELETE /api/upload/profile-picture
pub async fn delete_profile_picture(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(image_url) = current.user.profile_image_url.clone() else {
        return Err(ApiError::not_found("No profile picture found"));
    };

    if let Some(key) = storage::key_from_url(&image_url) {
        if let Err(err) = state.storage.delete(key).await {
            tracing::warn!(error = %err, key, "Failed to delete profile picture object");
        }
    }

    let user = db::set_profile_image(&state.db, &current.user.id, None)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = %user.id, "Profile picture deleted");

    Ok(Json(ProfileResponse {
        message: "Profile picture deleted successfully".to_string(),
        user: user.into(),
    }))
}

/// Pick an object-key extension: client filename first, then the MIME type,
/// then jpg.
fn extension_for(filename: Option<&str>, content_type: &str) -> String {
    if let Some(ext) = filename
        .and_then(|name| name.rsplit('.').next())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
    {
        return ext.to_lowercase();
    }

    mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "jpg".to_string())
}
