//! User service for registration and profile management

use std::sync::Arc;

use tracing::{debug, error, info, warn, Span};

use crate::domain::user::{User, UserId, UserRepository, UserServiceError};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// User service.
///
/// Hashes passwords on registration and collapses every repository failure
/// into `UserServiceError::NotFound` or `UserServiceError::General`.
pub struct UserService<R: UserRepository + ?Sized, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    span: Span,
}

impl<R, H> UserService<R, H>
where
    R: UserRepository + ?Sized,
    H: PasswordHasher + 'static,
{
    /// Create a new user service that logs under `span`
    pub fn new(repository: Arc<R>, hasher: Arc<H>, span: Span) -> Self {
        Self {
            repository,
            hasher,
            span,
        }
    }

    /// Register a new user, storing a salted hash instead of the plaintext password
    pub async fn register_user(&self, mut user: User) -> Result<User, UserServiceError> {
        let plaintext = std::mem::take(&mut user.password);
        let hasher = Arc::clone(&self.hasher);

        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| {
                error!(parent: &self.span, error = %e, "Password hashing task failed");
                UserServiceError::General
            })?
            .map_err(|e| self.general("register user", e))?;

        user.password = hashed;

        let created = self
            .repository
            .create(user)
            .await
            .map_err(|e| self.general("register user", e))?;

        info!(parent: &self.span, user_id = %created.id, "User registered");
        Ok(created)
    }

    /// Update username, first name, last name and email
    pub async fn update_user_data(&self, user: User) -> Result<User, UserServiceError> {
        let id = user.id;

        self.repository
            .update(user)
            .await
            .map_err(|e| self.classify("update user", id, e))
    }

    /// Store `user.password` for `user.id`.
    ///
    /// The password is persisted exactly as given; unlike `register_user`, no
    /// hashing happens here.
    pub async fn change_password(&self, user: &User) -> Result<(), UserServiceError> {
        self.repository
            .update_password(user)
            .await
            .map_err(|e| self.classify("change password", user.id, e))?;

        info!(parent: &self.span, user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Get a user by id
    pub async fn get_user_by_id(&self, id: UserId) -> Result<User, UserServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| self.classify("get user", id, e))
    }

    /// List all users
    pub async fn get_all_users(&self) -> Result<Vec<User>, UserServiceError> {
        self.repository
            .find_all()
            .await
            .map_err(|e| self.general("list users", e))
    }

    fn classify(&self, operation: &'static str, id: UserId, err: DomainError) -> UserServiceError {
        let kind = UserServiceError::from(&err);

        match kind {
            UserServiceError::NotFound => {
                debug!(parent: &self.span, operation, user_id = %id, "User not found");
            }
            UserServiceError::General => {
                warn!(parent: &self.span, operation, user_id = %id, error = %err, "User operation failed");
            }
        }

        kind
    }

    fn general(&self, operation: &'static str, err: DomainError) -> UserServiceError {
        warn!(parent: &self.span, operation, error = %err, "User operation failed");
        UserServiceError::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::StubUserRepository;
    use crate::infrastructure::user::password::Argon2Hasher;
    use crate::infrastructure::user::repository::InMemoryUserRepository;
    use std::sync::Mutex;

    fn default_user() -> User {
        User::new("test", "test1", "last1", "test@last.com", "").with_id(UserId::new(1))
    }

    fn service_with(repo: StubUserRepository) -> UserService<StubUserRepository, Argon2Hasher> {
        UserService::new(Arc::new(repo), Arc::new(Argon2Hasher::new().unwrap()), Span::none())
    }

    #[derive(Debug)]
    struct FailingHasher;

    impl PasswordHasher for FailingHasher {
        fn hash(&self, _password: &str) -> Result<String, DomainError> {
            Err(DomainError::hashing("salt generation failed"))
        }

        fn verify(&self, _password: &str, _hash: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let service = service_with(StubUserRepository::new().on_find_by_id(|_| Ok(default_user())));

        let user = service.get_user_by_id(UserId::new(1)).await.unwrap();
        assert_eq!(user, default_user());
    }

    #[tokio::test]
    async fn test_get_non_existing_user() {
        let service = service_with(
            StubUserRepository::new()
                .on_find_by_id(|id| Err(DomainError::not_found(format!("User '{}' not found", id)))),
        );

        let err = service.get_user_by_id(UserId::new(1)).await.unwrap_err();
        assert_eq!(err, UserServiceError::NotFound);
    }

    #[tokio::test]
    async fn test_get_user_storage_failure() {
        let service = service_with(
            StubUserRepository::new().on_find_by_id(|_| Err(DomainError::storage("connection reset"))),
        );

        let err = service.get_user_by_id(UserId::new(1)).await.unwrap_err();
        assert_eq!(err, UserServiceError::General);
    }

    #[tokio::test]
    async fn test_get_all_users() {
        let service = service_with(
            StubUserRepository::new().on_find_all(|| Ok(vec![default_user(), default_user()])),
        );

        let users = service.get_all_users().await.unwrap();
        assert_eq!(users, vec![default_user(), default_user()]);
    }

    #[tokio::test]
    async fn test_get_all_users_empty() {
        let service = service_with(StubUserRepository::new().on_find_all(|| Ok(vec![])));

        assert!(service.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_users_any_error_is_general() {
        for failure in [
            DomainError::storage("some error"),
            DomainError::timeout("5s elapsed"),
            DomainError::not_found("users table is empty"),
        ] {
            let failure = Mutex::new(Some(failure));
            let service = service_with(StubUserRepository::new().on_find_all(move || {
                Err(failure.lock().unwrap().take().unwrap())
            }));

            let err = service.get_all_users().await.unwrap_err();
            assert_eq!(err, UserServiceError::General);
        }
    }

    #[tokio::test]
    async fn test_update_user_data() {
        let service = service_with(StubUserRepository::new().on_update(Ok));

        let user = service.update_user_data(default_user()).await.unwrap();
        assert_eq!(user, default_user());
    }

    #[tokio::test]
    async fn test_update_non_existing_user() {
        let service = service_with(
            StubUserRepository::new()
                .on_update(|u| Err(DomainError::not_found(format!("User '{}' not found", u.id)))),
        );

        let err = service.update_user_data(default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::NotFound);
    }

    #[tokio::test]
    async fn test_update_storage_failure() {
        let service = service_with(
            StubUserRepository::new().on_update(|_| Err(DomainError::storage("some error"))),
        );

        let err = service.update_user_data(default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::General);
    }

    #[tokio::test]
    async fn test_change_password() {
        let seen = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let service = service_with(StubUserRepository::new().on_update_password(move |u| {
            *captured.lock().unwrap() = Some(u.password.clone());
            Ok(())
        }));

        let mut user = default_user();
        user.password = "already-final".to_string();
        service.change_password(&user).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("already-final"));
    }

    #[tokio::test]
    async fn test_change_password_of_non_existing_user() {
        let service = service_with(
            StubUserRepository::new()
                .on_update_password(|u| Err(DomainError::not_found(format!("User '{}' not found", u.id)))),
        );

        let err = service.change_password(&default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::NotFound);
    }

    #[tokio::test]
    async fn test_register_user_hashes_password() {
        let stored = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&stored);
        let service = service_with(StubUserRepository::new().on_create(move |u| {
            *captured.lock().unwrap() = Some(u.password.clone());
            Ok(u.with_id(UserId::new(1)))
        }));

        let input = User::new("rostikts", "rostik", "Tsyapiura", "rostik@test.ua", "123245");
        let created = service.register_user(input.clone()).await.unwrap();

        assert_eq!(created.id, UserId::new(1));
        assert_eq!(created.username, "rostikts");
        assert_eq!(created.first_name, "rostik");
        assert_eq!(created.last_name, "Tsyapiura");
        assert_eq!(created.email, "rostik@test.ua");
        assert_ne!(created.password, "123245");

        let hash = stored.lock().unwrap().clone().unwrap();
        assert_ne!(hash, "123245");
        assert!(Argon2Hasher::new().unwrap().verify("123245", &hash));
    }

    #[tokio::test]
    async fn test_register_user_create_failure() {
        let service = service_with(
            StubUserRepository::new().on_create(|_| Err(DomainError::storage("unique violation"))),
        );

        let err = service.register_user(default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::General);
    }

    #[tokio::test]
    async fn test_register_user_hashing_failure() {
        let service = UserService::new(
            Arc::new(StubUserRepository::new()),
            Arc::new(FailingHasher),
            Span::none(),
        );

        let err = service.register_user(default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::General);
    }

    #[tokio::test]
    async fn test_register_then_get_with_in_memory_store() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let service = UserService::new(Arc::clone(&repo), Arc::new(Argon2Hasher::new().unwrap()), Span::none());

        let input = User::new("rostikts", "rostik", "Tsyapiura", "rostik@test.ua", "123245");
        let created = service.register_user(input.clone()).await.unwrap();

        let fetched = service.get_user_by_id(created.id).await.unwrap();
        assert_eq!(fetched, input.with_id(created.id).without_password());

        let stored = repo.stored_password(created.id).await.unwrap();
        assert_ne!(stored, "123245");
        assert!(Argon2Hasher::new().unwrap().verify("123245", &stored));

        let all = service.get_all_users().await.unwrap();
        assert!(all.iter().all(|u| u.password.is_empty()));
    }

    #[tokio::test]
    async fn test_service_over_dyn_repository() {
        let repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let service = UserService::new(repo, Arc::new(Argon2Hasher::new().unwrap()), Span::none());

        let err = service.update_user_data(default_user()).await.unwrap_err();
        assert_eq!(err, UserServiceError::NotFound);
    }
}
