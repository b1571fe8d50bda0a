//! `SeaORM` entity definitions.
//!
//! The four attachment tables are intentionally identical in shape; a
//! macro keeps them in lockstep so the "same" schema cannot drift per
//! owner type. Foreign keys and indexes live in the migration SQL.

/// Defines an attachment entity module for one owner table.
macro_rules! attachment_entity {
    ($(#[$doc:meta])* $module:ident, $table:literal) => {
        $(#[$doc])*
        pub mod $module {
            use sea_orm::entity::prelude::*;
            use serde::{Deserialize, Serialize};

            #[allow(missing_docs)]
            #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
            #[sea_orm(table_name = $table)]
            pub struct Model {
                #[sea_orm(primary_key, auto_increment = false)]
                pub id: Uuid,
                pub owner_id: Uuid,
                pub space_key: String,
                pub file_name: String,
                pub mime_type: String,
                pub size_bytes: i64,
                pub attachment_type: String,
                pub source: Option<String>,
                pub details: Option<String>,
                pub created_by: String,
                pub created_at: DateTimeWithTimeZone,
                pub deleted_at: Option<DateTimeWithTimeZone>,
            }

            #[allow(missing_docs)]
            #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
            pub enum Relation {}

            impl ActiveModelBehavior for ActiveModel {}
        }
    };
}

/// Defines a minimal owner entity module, used only for existence checks.
macro_rules! owner_entity {
    ($(#[$doc:meta])* $module:ident, $table:literal) => {
        $(#[$doc])*
        pub mod $module {
            use sea_orm::entity::prelude::*;
            use serde::{Deserialize, Serialize};

            #[allow(missing_docs)]
            #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
            #[sea_orm(table_name = $table)]
            pub struct Model {
                #[sea_orm(primary_key, auto_increment = false)]
                pub id: Uuid,
                pub created_at: DateTimeWithTimeZone,
            }

            #[allow(missing_docs)]
            #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
            pub enum Relation {}

            impl ActiveModelBehavior for ActiveModel {}
        }
    };
}

attachment_entity!(
    /// Attachments owned by patient records.
    patient_attachments,
    "patient_attachments"
);
attachment_entity!(
    /// Attachments owned by clinical encounters.
    encounter_attachments,
    "encounter_attachments"
);
attachment_entity!(
    /// Attachments owned by inventory transactions.
    inventory_transaction_attachments,
    "inventory_transaction_attachments"
);
attachment_entity!(
    /// Attachments owned by inventory transfers.
    inventory_transfer_attachments,
    "inventory_transfer_attachments"
);

owner_entity!(
    /// Patient records (existence checks only).
    patients,
    "patients"
);
owner_entity!(
    /// Clinical encounters (existence checks only).
    encounters,
    "encounters"
);
owner_entity!(
    /// Inventory transactions (existence checks only).
    inventory_transactions,
    "inventory_transactions"
);
owner_entity!(
    /// Inventory transfers (existence checks only).
    inventory_transfers,
    "inventory_transfers"
);
