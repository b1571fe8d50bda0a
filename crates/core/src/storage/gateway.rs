//! Storage gateway implementation using Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use opendal::{Operator, services};
use uuid::Uuid;

use super::config::{GatewayConfig, StorageBackend};
use super::error::StorageError;

/// The backend's own record of a stored object, used to verify upload claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    /// Object size in bytes as reported by the backend.
    pub size_bytes: u64,
    /// Content type as reported by the backend. Filesystem backends do not
    /// record one.
    pub mime_type: Option<String>,
}

/// A time-limited presigned download URL.
#[derive(Debug, Clone)]
pub struct PresignedDownload {
    /// The presigned URL. Embeds a signature and expiry; not derivable from
    /// the key alone.
    pub url: String,
    /// Lifetime of the URL in seconds.
    pub expires_in_secs: u64,
}

/// Gateway to the object storage backend.
///
/// Holds no mutable state beyond configuration; all calls are independent.
pub struct StorageGateway {
    operator: Operator,
    config: GatewayConfig,
}

impl StorageGateway {
    /// Create a new storage gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized.
    pub fn from_config(config: GatewayConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.backend)?;
        Ok(Self { operator, config })
    }

    /// Create an OpenDAL operator from backend config.
    fn create_operator(backend: &StorageBackend) -> Result<Operator, StorageError> {
        match backend {
            StorageBackend::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageBackend::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Write an object under `key` with the declared content type.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the backend cannot be reached and
    /// `WriteRejected` if the backend refuses the object.
    pub async fn put(&self, key: &str, bytes: Bytes, declared_mime: &str) -> Result<(), StorageError> {
        self.operator
            .write_with(key, bytes)
            .content_type(declared_mime)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Fetch the backend's record of a stored object.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if the key does not exist.
    pub async fn inspect(&self, key: &str) -> Result<ObjectStat, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(ObjectStat {
            size_bytes: meta.content_length(),
            mime_type: meta.content_type().map(String::from),
        })
    }

    /// Issue a time-limited presigned download URL for `key`, with a
    /// content-disposition hint naming `download_filename`.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if the key is absent and
    /// `PresignNotSupported` if the backend cannot presign.
    pub async fn presign_get(
        &self,
        key: &str,
        download_filename: &str,
    ) -> Result<PresignedDownload, StorageError> {
        // A presigned URL for a missing object would 404 only at fetch
        // time; surface the absence now instead.
        self.operator.stat(key).await.map_err(StorageError::from)?;

        let ttl = Duration::from_secs(self.config.presign_ttl_secs);
        let disposition = format!("attachment; filename=\"{download_filename}\"");

        let presigned = self
            .operator
            .presign_read_with(key, ttl)
            .override_content_disposition(&disposition)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedDownload {
            url: presigned.uri().to_string(),
            expires_in_secs: self.config.presign_ttl_secs,
        })
    }

    /// Get the backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.config.backend.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build a globally unique storage key for an upload.
///
/// Format: `{namespace}/{owner_id}/{uuid}/{sanitized_filename}`. The v4
/// segment guarantees no two uploads collide even for the same owner and
/// filename; the trailing segment lets the download path derive a safe
/// display filename from the key alone.
#[must_use]
pub fn build_space_key(namespace: &str, owner_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        namespace,
        owner_id,
        Uuid::new_v4(),
        sanitize_filename(filename)
    )
}

/// Derive the display filename from a storage key.
#[must_use]
pub fn display_filename(space_key: &str) -> String {
    match space_key.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "attachment".to_string(),
    }
}

/// Sanitize a filename for use inside a storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_gateway() -> StorageGateway {
        let root = std::env::temp_dir().join(format!("mediref-gateway-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("should create temp dir");
        let config = GatewayConfig::new(StorageBackend::local_fs(root));
        StorageGateway::from_config(config).expect("should create gateway")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("lab-report.pdf"), "lab-report.pdf");
        assert_eq!(sanitize_filename("x ray (left).png"), "x_ray__left_.png");
        assert_eq!(sanitize_filename("scan@#$%.dcm"), "scan____.dcm");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_build_space_key_format() {
        let owner_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("valid uuid");

        let key = build_space_key("patients", owner_id, "consent form.pdf");
        let parts: Vec<&str> = key.split('/').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "patients");
        assert_eq!(parts[1], owner_id.to_string());
        assert!(Uuid::parse_str(parts[2]).is_ok());
        assert_eq!(parts[3], "consent_form.pdf");
    }

    #[test]
    fn test_build_space_key_unique_per_call() {
        let owner_id = Uuid::new_v4();
        let a = build_space_key("patients", owner_id, "same.pdf");
        let b = build_space_key("patients", owner_id, "same.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_filename() {
        assert_eq!(
            display_filename("patients/abc/def/report.pdf"),
            "report.pdf"
        );
        assert_eq!(display_filename("trailing/slash/"), "attachment");
        assert_eq!(display_filename(""), "attachment");
    }

    #[tokio::test]
    async fn test_put_then_inspect_reports_stored_size() {
        let gateway = temp_gateway();

        let bytes = Bytes::from_static(b"0123456789");
        gateway
            .put("patients/a/b/file.png", bytes, "image/png")
            .await
            .expect("put should succeed");

        let stat = gateway
            .inspect("patients/a/b/file.png")
            .await
            .expect("inspect should succeed");
        assert_eq!(stat.size_bytes, 10);
    }

    #[tokio::test]
    async fn test_inspect_missing_key() {
        let gateway = temp_gateway();

        let err = gateway.inspect("patients/missing/key").await.unwrap_err();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_presign_missing_key() {
        let gateway = temp_gateway();

        let err = gateway
            .presign_get("patients/missing/key", "file.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_presign_unsupported_on_fs() {
        let gateway = temp_gateway();

        gateway
            .put("patients/a/b/c.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .expect("put should succeed");

        let err = gateway
            .presign_get("patients/a/b/c.pdf", "c.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignNotSupported));
    }
}
