//! Storage gateway configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    /// S3-compatible storage: AWS S3, MinIO, Cloudflare R2
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageBackend {
    /// Create an S3-compatible backend.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create a local filesystem backend (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the backend name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Storage backend configuration.
    pub backend: StorageBackend,
    /// Presigned download URL lifetime in seconds (default: 900 = 15 minutes).
    pub presign_ttl_secs: u64,
}

impl GatewayConfig {
    /// Default presigned download URL lifetime: 15 minutes.
    pub const DEFAULT_PRESIGN_TTL: u64 = 900;

    /// Create a new gateway config with default settings.
    #[must_use]
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            presign_ttl_secs: Self::DEFAULT_PRESIGN_TTL,
        }
    }

    /// Set the presigned download URL lifetime.
    #[must_use]
    pub fn with_presign_ttl(mut self, secs: u64) -> Self {
        self.presign_ttl_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        let s3 = StorageBackend::s3(
            "http://localhost:9000",
            "attachments",
            "access_key",
            "secret_key",
            "auto",
        );
        assert_eq!(s3.name(), "s3");

        let fs = StorageBackend::local_fs("./storage");
        assert_eq!(fs.name(), "local");
    }

    #[test]
    fn test_gateway_config_defaults() {
        let config = GatewayConfig::new(StorageBackend::local_fs("./storage"));
        assert_eq!(config.presign_ttl_secs, GatewayConfig::DEFAULT_PRESIGN_TTL);

        let config = config.with_presign_ttl(120);
        assert_eq!(config.presign_ttl_secs, 120);
    }
}
