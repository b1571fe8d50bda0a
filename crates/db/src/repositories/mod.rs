//! Metadata store and owner lookup implementations.
//!
//! These implement the traits from `mediref_core::attachment`, hiding the
//! `SeaORM` details from the service layer. The four stores are generated
//! from one macro so the "same" persistence logic cannot drift per owner
//! type.

pub mod attachment;
pub mod owner;

pub use attachment::{
    EncounterAttachmentStore, InventoryTransactionAttachmentStore,
    InventoryTransferAttachmentStore, PatientAttachmentStore,
};
pub use owner::{
    EncounterLookup, InventoryTransactionLookup, InventoryTransferLookup, PatientLookup,
};
