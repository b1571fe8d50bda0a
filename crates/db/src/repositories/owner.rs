//! Owner existence lookups.
//!
//! The attachment subsystem treats owner entities as an external
//! collaborator; all it ever asks is "does this id exist".

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use crate::entities;
use mediref_core::attachment::{AttachmentError, OwnerLookup};

macro_rules! owner_lookup {
    ($(#[$doc:meta])* $name:ident, $entity:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            db: DatabaseConnection,
        }

        impl $name {
            /// Create a new lookup.
            #[must_use]
            pub fn new(db: DatabaseConnection) -> Self {
                Self { db }
            }
        }

        impl OwnerLookup for $name {
            async fn exists(&self, id: Uuid) -> Result<bool, AttachmentError> {
                let count = entities::$entity::Entity::find_by_id(id)
                    .count(&self.db)
                    .await
                    .map_err(|e| AttachmentError::repository(e.to_string()))?;

                Ok(count > 0)
            }
        }
    };
}

owner_lookup!(
    /// Existence lookup against the patients table.
    PatientLookup,
    patients
);
owner_lookup!(
    /// Existence lookup against the encounters table.
    EncounterLookup,
    encounters
);
owner_lookup!(
    /// Existence lookup against the inventory transactions table.
    InventoryTransactionLookup,
    inventory_transactions
);
owner_lookup!(
    /// Existence lookup against the inventory transfers table.
    InventoryTransferLookup,
    inventory_transfers
);
