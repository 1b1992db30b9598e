//! Profile-picture object storage.
//!
//! Thin wrapper over an S3-compatible bucket: upload, best-effort delete,
//! and public URL construction. Image transforms are the CDN's business;
//! this module only hands out the canonical object URL.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, primitives::ByteStream, Client};
use thiserror::Error;

use crate::config::StorageConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to upload object {key}")]
    Upload {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to delete object {key}")]
    Delete {
        key: String,
        #[source]
        source: BoxError,
    },
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl ObjectStorage {
    /// Build a client from configuration. Credentials resolve through the
    /// standard AWS provider chain (environment, profile, instance role).
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if config.endpoint.is_some() {
            // S3-compatible providers generally require path-style requests
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base: resolve_public_base(config),
        }
    }

    /// Upload an object and return its public URL. Overwrites any existing
    /// object under the same key.
    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .cache_control("public, max-age=3600")
            .send()
            .await
            .map_err(|err| StorageError::Upload {
                key: key.to_string(),
                source: Box::new(err),
            })?;

        tracing::info!(key, bucket = %self.bucket, "Uploaded object");
        Ok(self.public_url(key))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Delete {
                key: key.to_string(),
                source: Box::new(err),
            })?;

        tracing::info!(key, bucket = %self.bucket, "Deleted object");
        Ok(())
    }

    /// Public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

fn resolve_public_base(config: &StorageConfig) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    match &config.endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
        None => format!(
            "https://{}.s3.{}.amazonaws.com",
            config.bucket, config.region
        ),
    }
}

/// Extract the object key from a public URL previously produced by
/// [`ObjectStorage::public_url`]. Keys contain no slashes, so the last path
/// segment is the key.
pub fn key_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>, public_base: Option<&str>) -> StorageConfig {
        StorageConfig {
            bucket: "avatars".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: endpoint.map(String::from),
            public_base_url: public_base.map(String::from),
        }
    }

    #[test]
    fn test_public_base_aws_default() {
        let base = resolve_public_base(&config(None, None));
        assert_eq!(base, "https://avatars.s3.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_public_base_with_endpoint() {
        let base = resolve_public_base(&config(Some("https://storage.example.com/"), None));
        assert_eq!(base, "https://storage.example.com/avatars");
    }

    #[test]
    fn test_public_base_explicit_override_wins() {
        let base = resolve_public_base(&config(
            Some("https://storage.example.com"),
            Some("https://cdn.example.com/avatars/"),
        ));
        assert_eq!(base, "https://cdn.example.com/avatars");
    }

    #[test]
    fn test_key_from_url() {
        assert_eq!(
            key_from_url("https://cdn.example.com/avatars/profile-u1-17.jpg"),
            Some("profile-u1-17.jpg")
        );
        assert_eq!(key_from_url("https://cdn.example.com/avatars/"), None);
        assert_eq!(key_from_url(""), None);
    }
}
