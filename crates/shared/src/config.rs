//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Object storage configuration.
///
/// `provider` selects the backend: `s3` for any S3-compatible endpoint
/// (AWS S3, MinIO, Cloudflare R2) or `fs` for a local directory in
/// development.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage provider: `s3` or `fs`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// S3 access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// S3 region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory for the `fs` provider.
    #[serde(default = "default_fs_root")]
    pub fs_root: String,
    /// Presigned download URL lifetime in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
}

fn default_provider() -> String {
    "s3".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_fs_root() -> String {
    "./storage".to_string()
}

fn default_presign_ttl() -> u64 {
    900 // 15 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MEDIREF").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_settings_defaults() {
        let settings: StorageSettings = serde_json::from_value(serde_json::json!({
            "bucket": "attachments"
        }))
        .expect("should deserialize");

        assert_eq!(settings.provider, "s3");
        assert_eq!(settings.region, "auto");
        assert_eq!(settings.presign_ttl_secs, 900);
        assert_eq!(settings.fs_root, "./storage");
    }

    #[test]
    fn test_server_defaults() {
        let server: ServerConfig =
            serde_json::from_value(serde_json::json!({})).expect("should deserialize");
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
    }
}
