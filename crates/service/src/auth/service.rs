use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};
use uuid::Uuid;

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, ChangePasswordInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{self, Claims};

const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_hours: i64) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl_hours, password_algorithm: "argon2".into() }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self { Self::new("test-secret", 1) }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self { Self::new(c.jwt_secret.clone(), c.token_ttl_hours) }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn password_matches(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret", 12));
    /// let input = RegisterInput { email: "user@example.com".into(), name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        check_password(&input.password)?;
        models::user::validate_email(&input.email)?;
        models::user::validate_name(&input.name)?;
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self.repo.create_user(&input.email, &input.name).await?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret", 12));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(svc.verify_token(&session.token).is_ok());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !password_matches(&input.password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let token = token::issue(&user, &self.cfg.jwt_secret, self.cfg.token_ttl_hours)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        token::verify(token, &self.cfg.jwt_secret)
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> Result<(), AuthError> {
        check_password(&input.new_password)?;
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::NotFound)?;
        if !password_matches(&input.old_password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }
        let hash = hash_password(&input.new_password)?;
        self.repo.upsert_password(user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user_id, "password_changed");
        Ok(())
    }

    /// Remove the account together with every storage object it owns.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AuthError> {
        let removed = self.repo.delete_user_cascade(user_id).await?;
        info!(user_id = %user_id, removed_objects = removed, "account_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use crate::storage::domain::{AclType, Caller, StorageObjectInput};
    use crate::storage::repository::mock::InMemoryStorageRepository;
    use crate::storage::StorageObjectService;

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Player One".into(), password: "Passw0rd!".into() }
    }

    fn service() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::for_tests())
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let svc = service();
        let short = RegisterInput { password: "short".into(), ..register_input("a@b.c") };
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));
        let no_at = register_input("not-an-email");
        assert!(matches!(svc.register(no_at).await, Err(AuthError::Validation(_))));

        svc.register(register_input("a@b.c")).await.unwrap();
        assert!(matches!(svc.register(register_input("a@b.c")).await, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn login_issues_token_carrying_user_id() {
        let svc = service();
        let user = svc.register(register_input("a@b.c")).await.unwrap();
        let session = svc.login(LoginInput { email: "a@b.c".into(), password: "Passw0rd!".into() }).await.unwrap();
        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);

        let bad = svc.login(LoginInput { email: "a@b.c".into(), password: "wrong-pass".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let unknown = svc.login(LoginInput { email: "x@b.c".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let svc = service();
        let user = svc.register(register_input("a@b.c")).await.unwrap();
        let wrong = ChangePasswordInput { old_password: "nope-nope".into(), new_password: "NewPassw0rd".into() };
        assert!(matches!(svc.change_password(user.id, wrong).await, Err(AuthError::Unauthorized)));

        let ok = ChangePasswordInput { old_password: "Passw0rd!".into(), new_password: "NewPassw0rd".into() };
        svc.change_password(user.id, ok).await.unwrap();
        assert!(svc.login(LoginInput { email: "a@b.c".into(), password: "Passw0rd!".into() }).await.is_err());
        assert!(svc.login(LoginInput { email: "a@b.c".into(), password: "NewPassw0rd".into() }).await.is_ok());
    }

    #[tokio::test]
    async fn delete_account_removes_owned_objects() {
        let storage_repo = Arc::new(InMemoryStorageRepository::default());
        let storage = StorageObjectService::new(storage_repo.clone());
        let svc = AuthService::new(Arc::new(MockAuthRepository::with_storage(storage_repo)), AuthConfig::for_tests());

        let user = svc.register(register_input("a@b.c")).await.unwrap();
        let owner = Caller::user(user.id.to_string());
        storage
            .update(StorageObjectInput::new("save", "Save", "{}").with_acl(AclType::User, owner.user_id.clone()), &owner)
            .await
            .unwrap();
        storage.create(StorageObjectInput::new("shared", "Save", "{}")).await.unwrap();

        svc.delete_account(user.id).await.unwrap();
        assert!(storage.get("save").await.unwrap().is_none());
        assert!(storage.get("shared").await.unwrap().is_some());
        assert!(matches!(svc.delete_account(user.id).await, Err(AuthError::NotFound)));
    }
}
