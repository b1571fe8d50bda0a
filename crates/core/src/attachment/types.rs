//! Attachment types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of entity an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// Patient record.
    Patient,
    /// Clinical encounter.
    Encounter,
    /// Inventory transaction.
    InventoryTransaction,
    /// Inventory transfer.
    InventoryTransfer,
}

impl OwnerKind {
    /// Namespace prefix used in storage keys for this owner kind.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Patient => "patients",
            Self::Encounter => "encounters",
            Self::InventoryTransaction => "inventory-transactions",
            Self::InventoryTransfer => "inventory-transfers",
        }
    }

    /// Whether this owner kind carries a `source` origin tag.
    #[must_use]
    pub const fn has_source(self) -> bool {
        matches!(self, Self::Patient | Self::Encounter)
    }
}

/// Origin tag distinguishing where an attachment came from.
///
/// Only meaningful for patient and encounter attachments; used to filter
/// listings (e.g. profile pictures) without a separate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSource {
    /// Profile picture upload.
    ProfilePicture,
    /// General document upload.
    #[default]
    Document,
}

impl AttachmentSource {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProfilePicture => "profile_picture",
            Self::Document => "document",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "profile_picture" => Some(Self::ProfilePicture),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Attachment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    /// Laboratory report.
    LabReport,
    /// Prescription document.
    Prescription,
    /// Imaging study (X-ray, MRI, ultrasound).
    Imaging,
    /// Signed consent form.
    ConsentForm,
    /// Other document type.
    #[default]
    Other,
}

impl AttachmentType {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LabReport => "lab_report",
            Self::Prescription => "prescription",
            Self::Imaging => "imaging",
            Self::ConsentForm => "consent_form",
            Self::Other => "other",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lab_report" => Some(Self::LabReport),
            "prescription" => Some(Self::Prescription),
            "imaging" => Some(Self::Imaging),
            "consent_form" => Some(Self::ConsentForm),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Input for uploading a new attachment.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Owning entity ID.
    pub owner_id: Uuid,
    /// File payload.
    pub bytes: Bytes,
    /// Claimed original filename.
    pub filename: String,
    /// Claimed MIME type.
    pub mime_type: String,
    /// Claimed size in bytes.
    pub size_bytes: i64,
    /// Classification.
    pub attachment_type: AttachmentType,
    /// Origin tag (patient/encounter variants only).
    pub source: Option<AttachmentSource>,
    /// Free-form classification details.
    pub details: Option<String>,
    /// Caller identity.
    pub created_by: String,
}

/// Input for creating an attachment metadata row.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Attachment ID.
    pub id: Uuid,
    /// Owning entity ID.
    pub owner_id: Uuid,
    /// Storage key, unique per owner.
    pub space_key: String,
    /// Original filename.
    pub filename: String,
    /// Verified MIME type.
    pub mime_type: String,
    /// Verified size in bytes.
    pub size_bytes: i64,
    /// Classification.
    pub attachment_type: AttachmentType,
    /// Origin tag.
    pub source: Option<AttachmentSource>,
    /// Free-form classification details.
    pub details: Option<String>,
    /// Caller identity.
    pub created_by: String,
}

/// Partial update of classification fields. Binary identity (filename,
/// mime type, size, key) is immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPatch {
    /// New classification, if changing.
    pub attachment_type: Option<AttachmentType>,
    /// New details, if changing.
    pub details: Option<String>,
}

impl ClassificationPatch {
    /// Whether the patch changes anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.attachment_type.is_none() && self.details.is_none()
    }
}

/// Attachment domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning entity ID.
    pub owner_id: Uuid,
    /// Storage key.
    pub space_key: String,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Classification.
    pub attachment_type: AttachmentType,
    /// Origin tag.
    pub source: Option<AttachmentSource>,
    /// Free-form classification details.
    pub details: Option<String>,
    /// Caller identity that created the attachment.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete tombstone. `None` = active.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attachment {
    /// Whether the attachment is active (not soft-deleted).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_type_roundtrip() {
        let types = [
            AttachmentType::LabReport,
            AttachmentType::Prescription,
            AttachmentType::Imaging,
            AttachmentType::ConsentForm,
            AttachmentType::Other,
        ];

        for t in types {
            assert_eq!(AttachmentType::parse(t.as_str()), Some(t));
        }
        assert_eq!(AttachmentType::parse("unknown"), None);
    }

    #[test]
    fn test_attachment_source_roundtrip() {
        for s in [AttachmentSource::ProfilePicture, AttachmentSource::Document] {
            assert_eq!(AttachmentSource::parse(s.as_str()), Some(s));
        }
        assert_eq!(AttachmentSource::parse("thumbnail"), None);
    }

    #[test]
    fn test_owner_kind_prefixes_distinct() {
        let prefixes = [
            OwnerKind::Patient.key_prefix(),
            OwnerKind::Encounter.key_prefix(),
            OwnerKind::InventoryTransaction.key_prefix(),
            OwnerKind::InventoryTransfer.key_prefix(),
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_source_only_on_clinical_owners() {
        assert!(OwnerKind::Patient.has_source());
        assert!(OwnerKind::Encounter.has_source());
        assert!(!OwnerKind::InventoryTransaction.has_source());
        assert!(!OwnerKind::InventoryTransfer.has_source());
    }
}
