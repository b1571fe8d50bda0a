//! Initial schema: owner tables and the four attachment tables.
//!
//! The attachment tables are identical in shape; the SQL is generated from
//! one template so they cannot drift.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ATTACHMENT_TABLES: [(&str, &str); 4] = [
    ("patient_attachments", "patients"),
    ("encounter_attachments", "encounters"),
    ("inventory_transaction_attachments", "inventory_transactions"),
    ("inventory_transfer_attachments", "inventory_transfers"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(OWNER_TABLES_SQL).await?;
        for (table, owner_table) in ATTACHMENT_TABLES {
            db.execute_unprepared(&attachment_table_sql(table, owner_table))
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (table, _) in ATTACHMENT_TABLES {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {table} CASCADE;"))
                .await?;
        }
        db.execute_unprepared(
            "DROP TABLE IF EXISTS patients, encounters, inventory_transactions, \
             inventory_transfers CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const OWNER_TABLES_SQL: &str = r"
-- Owner tables. The wider reference-data schema manages these entities;
-- the attachment subsystem only checks existence against them.
CREATE TABLE IF NOT EXISTS patients (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS encounters (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS inventory_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS inventory_transfers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

/// One attachment table per owner type, identical shape.
fn attachment_table_sql(table: &str, owner_table: &str) -> String {
    format!(
        r"
CREATE TABLE {table} (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES {owner_table}(id) ON DELETE RESTRICT,
    space_key TEXT NOT NULL,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size_bytes BIGINT NOT NULL CHECK (size_bytes > 0),
    attachment_type TEXT NOT NULL DEFAULT 'other',
    source TEXT,
    details TEXT,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT uq_{table}_owner_key UNIQUE (owner_id, space_key)
);

-- Active listings: newest first per owner, tombstoned rows excluded
CREATE INDEX idx_{table}_owner_active
    ON {table}(owner_id, created_at DESC) WHERE deleted_at IS NULL;

-- Source-filtered listings (profile pictures)
CREATE INDEX idx_{table}_owner_source
    ON {table}(owner_id, source, created_at DESC) WHERE deleted_at IS NULL;
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_table_sql_references_owner() {
        let sql = attachment_table_sql("patient_attachments", "patients");
        assert!(sql.contains("CREATE TABLE patient_attachments"));
        assert!(sql.contains("REFERENCES patients(id)"));
        assert!(sql.contains("UNIQUE (owner_id, space_key)"));
        assert!(sql.contains("WHERE deleted_at IS NULL"));
    }
}
