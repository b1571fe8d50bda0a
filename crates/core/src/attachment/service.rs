//! Attachment service implementation.

use std::sync::Arc;

use uuid::Uuid;

use super::error::AttachmentError;
use super::types::{
    Attachment, AttachmentSource, ClassificationPatch, CreateAttachmentInput, OwnerKind,
    UploadInput,
};
use crate::storage::{ObjectStat, PresignedDownload, StorageGateway, build_space_key, display_filename};

/// Metadata store trait for attachment persistence.
///
/// Implemented by the db crate once per owner table.
pub trait AttachmentStore: Send + Sync {
    /// Create a new attachment row. Maps a `(owner_id, space_key)` unique
    /// violation to [`AttachmentError::DuplicateKey`].
    fn create(
        &self,
        input: CreateAttachmentInput,
    ) -> impl std::future::Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Find an attachment by ID, soft-deleted rows included.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// List active attachments for a batch of owners, newest first.
    fn list_active(
        &self,
        owner_ids: &[Uuid],
        source: Option<AttachmentSource>,
    ) -> impl std::future::Future<Output = Result<Vec<Attachment>, AttachmentError>> + Send;

    /// Most recent active attachment with the given source tag.
    fn latest_active_by_source(
        &self,
        owner_id: Uuid,
        source: AttachmentSource,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// Mark an attachment deleted. No-op if already deleted; `NotFound` if
    /// the id does not exist.
    fn soft_delete(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<(), AttachmentError>> + Send;

    /// Partial update of classification fields. `None` when the id is absent.
    fn update_classification(
        &self,
        id: Uuid,
        patch: ClassificationPatch,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;
}

/// Existence lookup for the owning entity.
pub trait OwnerLookup: Send + Sync {
    /// Check whether the owner with the given id exists.
    fn exists(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;
}

/// Attachment service, one instantiation per owner kind.
///
/// All four owner types share this implementation; only the key namespace,
/// the metadata store, and the owner lookup differ per instantiation.
pub struct AttachmentService<S: AttachmentStore, L: OwnerLookup> {
    kind: OwnerKind,
    gateway: Arc<StorageGateway>,
    store: Arc<S>,
    lookup: Arc<L>,
}

impl<S: AttachmentStore, L: OwnerLookup> AttachmentService<S, L> {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(kind: OwnerKind, gateway: Arc<StorageGateway>, store: Arc<S>, lookup: Arc<L>) -> Self {
        Self {
            kind,
            gateway,
            store,
            lookup,
        }
    }

    /// Owner kind this service is bound to.
    #[must_use]
    pub const fn kind(&self) -> OwnerKind {
        self.kind
    }

    /// Upload a file on behalf of an owner.
    ///
    /// Validates the owner and the claim, stores the bytes, verifies the
    /// backend's record against the claim, and only then persists the
    /// metadata row. A failed verification never leaves a row behind; the
    /// stored object may remain orphaned (cleanup is operational).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Owner does not exist
    /// - Claimed MIME type/filename is empty or claimed size is not positive
    /// - The storage backend is unavailable or rejects the write
    /// - The stored object does not match the claim
    pub async fn upload(&self, input: UploadInput) -> Result<Attachment, AttachmentError> {
        if !self.lookup.exists(input.owner_id).await? {
            return Err(AttachmentError::OwnerNotFound(input.owner_id));
        }

        if input.filename.trim().is_empty() {
            return Err(AttachmentError::invalid("filename must not be empty"));
        }
        if input.mime_type.trim().is_empty() {
            return Err(AttachmentError::invalid("MIME type must not be empty"));
        }
        if input.size_bytes <= 0 {
            return Err(AttachmentError::invalid("size must be positive"));
        }

        let space_key = build_space_key(self.kind.key_prefix(), input.owner_id, &input.filename);

        // Fail fast: storage errors propagate unchanged, no row is written.
        self.gateway
            .put(&space_key, input.bytes.clone(), &input.mime_type)
            .await?;

        let stat = self.gateway.inspect(&space_key).await?;
        // Negative sizes were rejected above.
        let declared_size = u64::try_from(input.size_bytes).unwrap_or(0);
        verify_claim(&stat, declared_size, &input.mime_type)?;

        self.store
            .create(CreateAttachmentInput {
                id: Uuid::new_v4(),
                owner_id: input.owner_id,
                space_key,
                filename: input.filename,
                mime_type: input.mime_type,
                size_bytes: input.size_bytes,
                attachment_type: input.attachment_type,
                source: input.source,
                details: input.details,
                created_by: input.created_by,
            })
            .await
    }

    /// List active attachments for one or more owners, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata store fails.
    pub async fn list(
        &self,
        owner_ids: &[Uuid],
        source: Option<AttachmentSource>,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.store.list_active(owner_ids, source).await
    }

    /// Issue a presigned download ticket for an attachment.
    ///
    /// Never loads the object bytes; the URL lets the bearer fetch directly
    /// from the backend until expiry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the attachment is unknown or soft-deleted.
    pub async fn download_url(
        &self,
        attachment_id: Uuid,
    ) -> Result<PresignedDownload, AttachmentError> {
        let attachment = self
            .store
            .find_by_id(attachment_id)
            .await?
            .filter(Attachment::is_active)
            .ok_or(AttachmentError::NotFound(attachment_id))?;

        let filename = display_filename(&attachment.space_key);
        Ok(self.gateway.presign_get(&attachment.space_key, &filename).await?)
    }

    /// Resolve the most recent active attachment with the given source tag
    /// straight to a download ticket.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the owner has no active attachment with that tag.
    pub async fn latest_download_url(
        &self,
        owner_id: Uuid,
        source: AttachmentSource,
    ) -> Result<PresignedDownload, AttachmentError> {
        let attachment = self
            .store
            .latest_active_by_source(owner_id, source)
            .await?
            .ok_or(AttachmentError::NotFound(owner_id))?;

        let filename = display_filename(&attachment.space_key);
        Ok(self.gateway.presign_get(&attachment.space_key, &filename).await?)
    }

    /// Soft-delete an attachment. Idempotent; the stored object is never
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not exist.
    pub async fn soft_delete(&self, attachment_id: Uuid) -> Result<(), AttachmentError> {
        self.store.soft_delete(attachment_id).await
    }

    /// Update classification fields only; binary identity is immutable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not exist.
    pub async fn update_classification(
        &self,
        attachment_id: Uuid,
        patch: ClassificationPatch,
    ) -> Result<Attachment, AttachmentError> {
        self.store
            .update_classification(attachment_id, patch)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))
    }

    /// Get an attachment by ID, soft-deleted rows included (audit path).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not exist.
    pub async fn get_by_id(&self, attachment_id: Uuid) -> Result<Attachment, AttachmentError> {
        self.store
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))
    }
}

/// Compare the backend's record of a stored object against the uploader's
/// claim. Backends that do not record a content type (local fs) skip the
/// MIME half; size is always verified.
fn verify_claim(
    stat: &ObjectStat,
    declared_size: u64,
    declared_mime: &str,
) -> Result<(), AttachmentError> {
    let size_ok = stat.size_bytes == declared_size;
    let mime_ok = stat
        .mime_type
        .as_deref()
        .is_none_or(|actual| actual == declared_mime);

    if size_ok && mime_ok {
        return Ok(());
    }

    Err(AttachmentError::Mismatch {
        declared_size,
        actual_size: stat.size_bytes,
        declared_mime: declared_mime.to_string(),
        actual_mime: stat.mime_type.clone(),
    })
}
