use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // StorageObject: query scans one type ordered by score
        manager
            .create_index(
                Index::create()
                    .name("idx_storage_object_type_score")
                    .table(StorageObject::Table)
                    .col(StorageObject::ObjectType)
                    .col(StorageObject::ObjectScore)
                    .to_owned(),
            )
            .await?;

        // StorageObject: owner lookup for account deletion
        manager
            .create_index(
                Index::create()
                    .name("idx_storage_object_acl_param")
                    .table(StorageObject::Table)
                    .col(StorageObject::AclParam)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_storage_object_acl_param").table(StorageObject::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_storage_object_type_score").table(StorageObject::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StorageObject { Table, ObjectType, ObjectScore, AclParam }
