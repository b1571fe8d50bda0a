//! Object storage gateway for attachment payloads, built on Apache OpenDAL.
//!
//! The gateway is the only component that touches the storage backend. It
//! exposes three operations: write an object (`put`), fetch the backend's
//! own record of a stored object (`inspect`), and issue a time-limited
//! presigned download URL (`presign_get`). Supported backends:
//! - S3-compatible: AWS S3, MinIO, Cloudflare R2
//! - Local filesystem (development only; presigning unsupported)

mod config;
mod error;
mod gateway;

pub use config::{GatewayConfig, StorageBackend};
pub use error::StorageError;
pub use gateway::{ObjectStat, PresignedDownload, StorageGateway, build_space_key, display_filename};
