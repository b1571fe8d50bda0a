//! Database layer with `SeaORM` entities and attachment metadata stores.
//!
//! This crate provides:
//! - `SeaORM` entity definitions (one attachment table per owner type,
//!   identical shape, plus the owner tables used for existence checks)
//! - Metadata store and owner lookup implementations of the core traits
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    EncounterAttachmentStore, EncounterLookup, InventoryTransactionAttachmentStore,
    InventoryTransactionLookup, InventoryTransferAttachmentStore, InventoryTransferLookup,
    PatientAttachmentStore, PatientLookup,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
