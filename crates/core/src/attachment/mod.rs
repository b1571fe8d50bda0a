//! Attachment lifecycle logic, shared by all four owner types.
//!
//! One generic [`AttachmentService`] orchestrates the whole lifecycle:
//! - upload (validate owner -> store bytes -> verify claim -> persist row)
//! - active listings, newest first
//! - presigned download tickets
//! - idempotent soft deletion
//! - classification edits
//!
//! Per-owner persistence is abstracted behind the [`AttachmentStore`] and
//! [`OwnerLookup`] traits, implemented by the db crate.

mod error;
mod service;
mod types;

pub use error::AttachmentError;
pub use service::{AttachmentService, AttachmentStore, OwnerLookup};
pub use types::{
    Attachment, AttachmentSource, AttachmentType, ClassificationPatch, CreateAttachmentInput,
    OwnerKind, UploadInput,
};
