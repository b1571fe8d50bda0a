//! Shared configuration for Mediref.
//!
//! This crate provides the configuration types consumed by every other
//! crate in the workspace: server binding, database pool settings, and
//! object-storage credentials.

pub mod config;

pub use config::{AppConfig, DatabaseConfig, ServerConfig, StorageSettings};
