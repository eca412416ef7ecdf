use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use models::{storage_object, user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_user(u: user::Model) -> AuthUser {
    AuthUser { id: u.id, email: u.email, name: u.name }
}

fn to_credentials(c: user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_email(&self.db, email).await?.map(to_user))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        use sea_orm::EntityTrait;
        let res = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_user))
    }

    async fn create_user(&self, email: &str, name: &str) -> Result<AuthUser, AuthError> {
        match user::create(&self.db, email, name).await {
            Ok(created) => Ok(to_user(created)),
            // lost a registration race against the unique email index
            Err(models::errors::ModelError::Db(msg)) if msg.contains("duplicate key") => Err(AuthError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(user_credentials::find_by_user(&self.db, user_id).await?.map(to_credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(to_credentials(c))
    }

    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        let removed = storage_object::delete_owned_by(&txn, &user_id.to_string()).await?;
        if !user::hard_delete(&txn, user_id).await? {
            // nothing committed; the transaction rolls back on drop
            return Err(AuthError::NotFound);
        }
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(removed)
    }
}
