use std::sync::Arc;

use sea_orm::DatabaseConnection;

use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::repository::mock::MockAuthRepository;
use service::auth::repository::AuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::leaderboard::LeaderboardService;
use service::storage::repo::seaorm::SeaOrmStorageRepository;
use service::storage::repository::mock::InMemoryStorageRepository;
use service::storage::repository::StorageObjectRepository;
use service::storage::StorageObjectService;

/// Shared handler state; every service sits behind a trait object so the
/// same router runs against Postgres or the in-memory repositories.
#[derive(Clone)]
pub struct ServerState {
    pub storage: Arc<StorageObjectService<dyn StorageObjectRepository>>,
    pub leaderboard: Arc<LeaderboardService<dyn StorageObjectRepository>>,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
}

impl ServerState {
    pub fn new(storage_repo: Arc<dyn StorageObjectRepository>, auth_repo: Arc<dyn AuthRepository>, auth_cfg: AuthConfig) -> Self {
        Self {
            storage: Arc::new(StorageObjectService::new(storage_repo.clone())),
            leaderboard: Arc::new(LeaderboardService::new(storage_repo)),
            auth: Arc::new(AuthService::new(auth_repo, auth_cfg)),
        }
    }

    pub fn with_db(db: DatabaseConnection, auth_cfg: AuthConfig) -> Self {
        Self::new(
            Arc::new(SeaOrmStorageRepository::new(db.clone())),
            Arc::new(SeaOrmAuthRepository::new(db)),
            auth_cfg,
        )
    }

    /// Process-local state; account deletion cascades into the same object map.
    pub fn in_memory(auth_cfg: AuthConfig) -> Self {
        let storage = Arc::new(InMemoryStorageRepository::default());
        let auth = Arc::new(MockAuthRepository::with_storage(storage.clone()));
        Self::new(storage, auth, auth_cfg)
    }
}
