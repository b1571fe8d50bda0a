//! Attachment error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Bad client input: missing MIME type, missing filename, or
    /// non-positive size.
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),

    /// Owning entity does not exist.
    #[error("owner not found: {0}")]
    OwnerNotFound(Uuid),

    /// Claimed attributes disagree with what the backend stored. Not
    /// retryable; the upload attempt must be discarded.
    #[error(
        "stored object does not match claim: size {actual_size} (declared {declared_size}), \
         mime {actual_mime:?} (declared {declared_mime})"
    )]
    Mismatch {
        /// Size the client declared.
        declared_size: u64,
        /// Size the backend stored.
        actual_size: u64,
        /// MIME type the client declared.
        declared_mime: String,
        /// MIME type the backend recorded, when it records one.
        actual_mime: Option<String>,
    },

    /// Unknown or soft-deleted attachment id.
    #[error("attachment not found: {0}")]
    NotFound(Uuid),

    /// `(owner_id, space_key)` collision. Retryable: the key is regenerated
    /// on the next attempt.
    #[error("duplicate storage key: {0}")]
    DuplicateKey(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Metadata store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create an invalid-attachment error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidAttachment(msg.into())
    }

    /// Create a not-found error.
    #[must_use]
    pub const fn not_found(id: Uuid) -> Self {
        Self::NotFound(id)
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a duplicate-key error.
    #[must_use]
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey(key.into())
    }
}
