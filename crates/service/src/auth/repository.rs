use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, email: &str, name: &str) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    /// Remove the user, its credentials and every storage object it owns, all or nothing.
    /// Returns the number of storage objects removed.
    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<u64, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::storage::repository::mock::InMemoryStorageRepository;
    use crate::storage::repository::StorageObjectRepository;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: RwLock<HashMap<String, AuthUser>>, // key: email
        creds: RwLock<HashMap<Uuid, Credentials>>, // key: user_id
        storage: Option<Arc<InMemoryStorageRepository>>,
    }

    impl MockAuthRepository {
        /// Cascade account deletion into `storage`.
        pub fn with_storage(storage: Arc<InMemoryStorageRepository>) -> Self {
            Self { storage: Some(storage), ..Default::default() }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.read().await.get(email).cloned())
        }

        async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.read().await.values().find(|u| u.id == user_id).cloned())
        }

        async fn create_user(&self, email: &str, name: &str) -> Result<AuthUser, AuthError> {
            let mut users = self.users.write().await;
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), email: email.to_string(), name: name.to_string() };
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            Ok(self.creds.read().await.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let c = Credentials { user_id, password_hash, password_algorithm };
            self.creds.write().await.insert(user_id, c.clone());
            Ok(c)
        }

        async fn delete_user_cascade(&self, user_id: Uuid) -> Result<u64, AuthError> {
            let mut users = self.users.write().await;
            let Some(email) = users.values().find(|u| u.id == user_id).map(|u| u.email.clone()) else {
                return Err(AuthError::NotFound);
            };
            let removed = match &self.storage {
                Some(storage) => storage
                    .delete_owned_by(&user_id.to_string())
                    .await
                    .map_err(|e| AuthError::Repository(e.to_string()))?,
                None => 0,
            };
            users.remove(&email);
            self.creds.write().await.remove(&user_id);
            Ok(removed)
        }
    }
}
