//! Attachment metadata stores.
//!
//! One store per owner table, all generated from the same macro. Listing
//! queries exclude tombstoned rows and order newest first; a unique
//! violation on `(owner_id, space_key)` surfaces as a retryable
//! `DuplicateKey`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities;
use mediref_core::attachment::{
    Attachment, AttachmentError, AttachmentSource, AttachmentStore, AttachmentType,
    ClassificationPatch, CreateAttachmentInput,
};

macro_rules! attachment_store {
    ($(#[$doc:meta])* $name:ident, $entity:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            db: DatabaseConnection,
        }

        impl $name {
            /// Create a new store.
            #[must_use]
            pub fn new(db: DatabaseConnection) -> Self {
                Self { db }
            }

            /// Convert a database model to the domain model.
            fn to_domain(model: entities::$entity::Model) -> Attachment {
                Attachment {
                    id: model.id,
                    owner_id: model.owner_id,
                    space_key: model.space_key,
                    filename: model.file_name,
                    mime_type: model.mime_type,
                    size_bytes: model.size_bytes,
                    attachment_type: AttachmentType::parse(&model.attachment_type)
                        .unwrap_or_default(),
                    source: model.source.as_deref().and_then(AttachmentSource::parse),
                    details: model.details,
                    created_by: model.created_by,
                    created_at: model.created_at.with_timezone(&Utc),
                    deleted_at: model.deleted_at.map(|t| t.with_timezone(&Utc)),
                }
            }
        }

        impl AttachmentStore for $name {
            async fn create(
                &self,
                input: CreateAttachmentInput,
            ) -> Result<Attachment, AttachmentError> {
                let active = entities::$entity::ActiveModel {
                    id: Set(input.id),
                    owner_id: Set(input.owner_id),
                    space_key: Set(input.space_key.clone()),
                    file_name: Set(input.filename),
                    mime_type: Set(input.mime_type),
                    size_bytes: Set(input.size_bytes),
                    attachment_type: Set(input.attachment_type.as_str().to_string()),
                    source: Set(input.source.map(|s| s.as_str().to_string())),
                    details: Set(input.details),
                    created_by: Set(input.created_by),
                    created_at: Set(Utc::now().into()),
                    deleted_at: Set(None),
                };

                match active.insert(&self.db).await {
                    Ok(model) => Ok(Self::to_domain(model)),
                    Err(e)
                        if matches!(
                            e.sql_err(),
                            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                        ) =>
                    {
                        Err(AttachmentError::duplicate_key(input.space_key))
                    }
                    Err(e) => Err(AttachmentError::repository(e.to_string())),
                }
            }

            async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AttachmentError> {
                let model = entities::$entity::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(model.map(Self::to_domain))
            }

            async fn list_active(
                &self,
                owner_ids: &[Uuid],
                source: Option<AttachmentSource>,
            ) -> Result<Vec<Attachment>, AttachmentError> {
                let mut query = entities::$entity::Entity::find()
                    .filter(entities::$entity::Column::OwnerId.is_in(owner_ids.iter().copied()))
                    .filter(entities::$entity::Column::DeletedAt.is_null());

                if let Some(source) = source {
                    query = query.filter(entities::$entity::Column::Source.eq(source.as_str()));
                }

                let models = query
                    .order_by_desc(entities::$entity::Column::CreatedAt)
                    .all(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(models.into_iter().map(Self::to_domain).collect())
            }

            async fn latest_active_by_source(
                &self,
                owner_id: Uuid,
                source: AttachmentSource,
            ) -> Result<Option<Attachment>, AttachmentError> {
                let model = entities::$entity::Entity::find()
                    .filter(entities::$entity::Column::OwnerId.eq(owner_id))
                    .filter(entities::$entity::Column::Source.eq(source.as_str()))
                    .filter(entities::$entity::Column::DeletedAt.is_null())
                    .order_by_desc(entities::$entity::Column::CreatedAt)
                    .one(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(model.map(Self::to_domain))
            }

            async fn soft_delete(&self, id: Uuid) -> Result<(), AttachmentError> {
                let model = entities::$entity::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?
                    .ok_or(AttachmentError::NotFound(id))?;

                // Already tombstoned: idempotent no-op.
                if model.deleted_at.is_some() {
                    return Ok(());
                }

                let mut active: entities::$entity::ActiveModel = model.into();
                active.deleted_at = Set(Some(Utc::now().into()));
                active
                    .update(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(())
            }

            async fn update_classification(
                &self,
                id: Uuid,
                patch: ClassificationPatch,
            ) -> Result<Option<Attachment>, AttachmentError> {
                let Some(model) = entities::$entity::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?
                else {
                    return Ok(None);
                };

                if patch.is_empty() {
                    return Ok(Some(Self::to_domain(model)));
                }

                let mut active: entities::$entity::ActiveModel = model.into();
                if let Some(t) = patch.attachment_type {
                    active.attachment_type = Set(t.as_str().to_string());
                }
                if let Some(d) = patch.details {
                    active.details = Set(Some(d));
                }

                let model = active
                    .update(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(Some(Self::to_domain(model)))
            }
        }
    };
}

attachment_store!(
    /// Metadata store for patient attachments.
    PatientAttachmentStore,
    patient_attachments
);
attachment_store!(
    /// Metadata store for encounter attachments.
    EncounterAttachmentStore,
    encounter_attachments
);
attachment_store!(
    /// Metadata store for inventory transaction attachments.
    InventoryTransactionAttachmentStore,
    inventory_transaction_attachments
);
attachment_store!(
    /// Metadata store for inventory transfer attachments.
    InventoryTransferAttachmentStore,
    inventory_transfer_attachments
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_domain_conversion() {
        let now = Utc::now();
        let model = entities::patient_attachments::Model {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            space_key: "patients/a/b/report.pdf".to_string(),
            file_name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 2048,
            attachment_type: "lab_report".to_string(),
            source: Some("document".to_string()),
            details: None,
            created_by: "clerk-3".to_string(),
            created_at: now.into(),
            deleted_at: None,
        };

        let attachment = PatientAttachmentStore::to_domain(model);
        assert_eq!(attachment.attachment_type, AttachmentType::LabReport);
        assert_eq!(attachment.source, Some(AttachmentSource::Document));
        assert_eq!(attachment.filename, "report.pdf");
        assert!(attachment.is_active());
    }

    #[test]
    fn test_to_domain_unknown_strings_degrade() {
        let now = Utc::now();
        let model = entities::encounter_attachments::Model {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            space_key: "encounters/a/b/x.bin".to_string(),
            file_name: "x.bin".to_string(),
            mime_type: "application/octet-stream".to_string(),
            size_bytes: 1,
            attachment_type: "legacy_value".to_string(),
            source: Some("legacy_source".to_string()),
            details: None,
            created_by: "import".to_string(),
            created_at: now.into(),
            deleted_at: Some(now.into()),
        };

        let attachment = EncounterAttachmentStore::to_domain(model);
        assert_eq!(attachment.attachment_type, AttachmentType::Other);
        assert_eq!(attachment.source, None);
        assert!(!attachment.is_active());
    }
}
