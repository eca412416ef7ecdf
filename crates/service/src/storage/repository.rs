use async_trait::async_trait;

use super::domain::StorageObject;
use crate::errors::ServiceError;

/// One validated write waiting to be persisted as part of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Insert(StorageObject),
    Overwrite(StorageObject),
}

impl PendingWrite {
    pub fn object(&self) -> &StorageObject {
        match self {
            PendingWrite::Insert(o) | PendingWrite::Overwrite(o) => o,
        }
    }
}

/// Repository abstraction for storage object persistence.
#[async_trait]
pub trait StorageObjectRepository: Send + Sync {
    async fn find(&self, object_id: &str) -> Result<Option<StorageObject>, ServiceError>;
    async fn find_many(&self, object_ids: &[String]) -> Result<Vec<StorageObject>, ServiceError>;
    /// All rows of one type ordered by score ascending.
    async fn list_by_type(&self, object_type: &str) -> Result<Vec<StorageObject>, ServiceError>;
    /// Fails with `Conflict` when the id is taken.
    async fn insert(&self, object: StorageObject) -> Result<StorageObject, ServiceError>;
    async fn overwrite(&self, object: StorageObject) -> Result<StorageObject, ServiceError>;
    /// Persist every write or none of them.
    async fn save_batch(&self, writes: Vec<PendingWrite>) -> Result<(), ServiceError>;
    async fn delete(&self, object_id: &str) -> Result<bool, ServiceError>;
    async fn delete_owned_by(&self, owner: &str) -> Result<u64, ServiceError>;
    /// Highest scores of one type first.
    async fn top_by_score(&self, object_type: &str, limit: u64) -> Result<Vec<StorageObject>, ServiceError>;
    async fn count_above(&self, object_type: &str, score: f32) -> Result<u64, ServiceError>;
}

/// In-memory repository for tests, benches and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryStorageRepository {
        objects: RwLock<HashMap<String, StorageObject>>, // key: object_id
    }

    impl InMemoryStorageRepository {
        pub async fn len(&self) -> usize {
            self.objects.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.objects.read().await.is_empty()
        }
    }

    fn by_score_asc(a: &StorageObject, b: &StorageObject) -> std::cmp::Ordering {
        a.object_score
            .partial_cmp(&b.object_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.object_id.cmp(&b.object_id))
    }

    #[async_trait]
    impl StorageObjectRepository for InMemoryStorageRepository {
        async fn find(&self, object_id: &str) -> Result<Option<StorageObject>, ServiceError> {
            Ok(self.objects.read().await.get(object_id).cloned())
        }

        async fn find_many(&self, object_ids: &[String]) -> Result<Vec<StorageObject>, ServiceError> {
            let map = self.objects.read().await;
            Ok(object_ids.iter().filter_map(|id| map.get(id).cloned()).collect())
        }

        async fn list_by_type(&self, object_type: &str) -> Result<Vec<StorageObject>, ServiceError> {
            let map = self.objects.read().await;
            let mut rows: Vec<_> = map.values().filter(|o| o.object_type == object_type).cloned().collect();
            rows.sort_by(by_score_asc);
            Ok(rows)
        }

        async fn insert(&self, object: StorageObject) -> Result<StorageObject, ServiceError> {
            let mut map = self.objects.write().await;
            if map.contains_key(&object.object_id) {
                return Err(ServiceError::Conflict(format!("object {} already exists", object.object_id)));
            }
            map.insert(object.object_id.clone(), object.clone());
            Ok(object)
        }

        async fn overwrite(&self, object: StorageObject) -> Result<StorageObject, ServiceError> {
            let mut map = self.objects.write().await;
            let slot = map.get_mut(&object.object_id).ok_or_else(|| ServiceError::not_found("storage object"))?;
            *slot = object.clone();
            Ok(object)
        }

        async fn save_batch(&self, writes: Vec<PendingWrite>) -> Result<(), ServiceError> {
            let mut map = self.objects.write().await;
            // check everything before touching the map
            for w in &writes {
                match w {
                    PendingWrite::Insert(o) if map.contains_key(&o.object_id) => {
                        return Err(ServiceError::Conflict(format!("object {} already exists", o.object_id)));
                    }
                    PendingWrite::Overwrite(o) if !map.contains_key(&o.object_id) => {
                        return Err(ServiceError::not_found("storage object"));
                    }
                    _ => {}
                }
            }
            for w in writes {
                let o = match w {
                    PendingWrite::Insert(o) | PendingWrite::Overwrite(o) => o,
                };
                map.insert(o.object_id.clone(), o);
            }
            Ok(())
        }

        async fn delete(&self, object_id: &str) -> Result<bool, ServiceError> {
            Ok(self.objects.write().await.remove(object_id).is_some())
        }

        async fn delete_owned_by(&self, owner: &str) -> Result<u64, ServiceError> {
            let mut map = self.objects.write().await;
            let before = map.len();
            map.retain(|_, o| o.acl_param != owner);
            Ok((before - map.len()) as u64)
        }

        async fn top_by_score(&self, object_type: &str, limit: u64) -> Result<Vec<StorageObject>, ServiceError> {
            let map = self.objects.read().await;
            let mut rows: Vec<_> = map.values().filter(|o| o.object_type == object_type).cloned().collect();
            rows.sort_by(|a, b| {
                b.object_score
                    .partial_cmp(&a.object_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.object_id.cmp(&b.object_id))
            });
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(rows)
        }

        async fn count_above(&self, object_type: &str, score: f32) -> Result<u64, ServiceError> {
            let map = self.objects.read().await;
            Ok(map.values().filter(|o| o.object_type == object_type && o.object_score > score).count() as u64)
        }
    }
}
