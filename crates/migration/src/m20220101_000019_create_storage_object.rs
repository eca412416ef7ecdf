//! Create `storage_object` table.
//! Stores opaque client JSON documents keyed by a client-supplied id.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StorageObject::Table)
                    .if_not_exists()
                    .col(string_len(StorageObject::ObjectId, 128).primary_key())
                    .col(string_len(StorageObject::ObjectType, 64).not_null())
                    .col(text(StorageObject::ObjectData).not_null())
                    .col(float(StorageObject::ObjectScore).not_null())
                    .col(string_len(StorageObject::AclType, 16).not_null())
                    // empty string when the ACL is not owner-scoped
                    .col(string_len(StorageObject::AclParam, 128).not_null().default(""))
                    .col(timestamp_with_time_zone(StorageObject::CreatedOn).not_null())
                    .col(timestamp_with_time_zone(StorageObject::ModifiedOn).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(StorageObject::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum StorageObject {
    Table,
    ObjectId,
    ObjectType,
    ObjectData,
    ObjectScore,
    AclType,
    AclParam,
    CreatedOn,
    ModifiedOn,
}
