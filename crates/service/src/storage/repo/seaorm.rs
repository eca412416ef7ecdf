use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};

use models::errors::ModelError;
use models::storage_object;

use crate::errors::ServiceError;
use crate::storage::domain::StorageObject;
use crate::storage::repository::{PendingWrite, StorageObjectRepository};

pub struct SeaOrmStorageRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmStorageRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Unique-key violations surface as conflicts so a lost create race reads like a duplicate id.
fn map_insert_error(object_id: &str, e: ModelError) -> ServiceError {
    match e {
        ModelError::Db(msg) if msg.contains("duplicate key") || msg.contains("UNIQUE constraint") => {
            ServiceError::Conflict(format!("object {} already exists", object_id))
        }
        other => other.into(),
    }
}

#[async_trait]
impl StorageObjectRepository for SeaOrmStorageRepository {
    async fn find(&self, object_id: &str) -> Result<Option<StorageObject>, ServiceError> {
        Ok(storage_object::find(&self.db, object_id).await?.map(StorageObject::from))
    }

    async fn find_many(&self, object_ids: &[String]) -> Result<Vec<StorageObject>, ServiceError> {
        let rows = storage_object::find_many(&self.db, object_ids).await?;
        Ok(rows.into_iter().map(StorageObject::from).collect())
    }

    async fn list_by_type(&self, object_type: &str) -> Result<Vec<StorageObject>, ServiceError> {
        let rows = storage_object::list_by_type(&self.db, object_type).await?;
        Ok(rows.into_iter().map(StorageObject::from).collect())
    }

    async fn insert(&self, object: StorageObject) -> Result<StorageObject, ServiceError> {
        let id = object.object_id.clone();
        let created = storage_object::insert(&self.db, object.into())
            .await
            .map_err(|e| map_insert_error(&id, e))?;
        Ok(created.into())
    }

    async fn overwrite(&self, object: StorageObject) -> Result<StorageObject, ServiceError> {
        Ok(storage_object::overwrite(&self.db, object.into()).await?.into())
    }

    async fn save_batch(&self, writes: Vec<PendingWrite>) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(|e| ServiceError::Db(e.to_string()))?;
        for w in writes {
            match w {
                PendingWrite::Insert(o) => {
                    let id = o.object_id.clone();
                    storage_object::insert(&txn, o.into()).await.map_err(|e| map_insert_error(&id, e))?;
                }
                PendingWrite::Overwrite(o) => {
                    storage_object::overwrite(&txn, o.into()).await?;
                }
            }
        }
        // dropping an uncommitted transaction rolls it back
        txn.commit().await.map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, object_id: &str) -> Result<bool, ServiceError> {
        Ok(storage_object::delete(&self.db, object_id).await?)
    }

    async fn delete_owned_by(&self, owner: &str) -> Result<u64, ServiceError> {
        Ok(storage_object::delete_owned_by(&self.db, owner).await?)
    }

    async fn top_by_score(&self, object_type: &str, limit: u64) -> Result<Vec<StorageObject>, ServiceError> {
        let rows = storage_object::top_by_score(&self.db, object_type, limit).await?;
        Ok(rows.into_iter().map(StorageObject::from).collect())
    }

    async fn count_above(&self, object_type: &str, score: f32) -> Result<u64, ServiceError> {
        Ok(storage_object::count_above(&self.db, object_type, score).await?)
    }
}
