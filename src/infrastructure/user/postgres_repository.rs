//! PostgreSQL user repository implementation

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, warn, Span};

use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;

/// Client-side grace period on top of the server's `statement_timeout`
const BACKSTOP_MARGIN: Duration = Duration::from_millis(500);

/// SQLSTATE `query_canceled`, raised when `statement_timeout` fires
const QUERY_CANCELED: &str = "57014";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
    statement_timeout: Duration,
    span: Span,
}

impl PostgresUserRepository {
    /// Create a new repository.
    ///
    /// `statement_timeout` must match the session setting the pool was built
    /// with (see `PostgresConfig::connect_options`). The server cancels and
    /// rolls back statements that exceed it; the client gives up
    /// [`BACKSTOP_MARGIN`] later in case the server never answers. Either way
    /// the call fails with `DomainError::Timeout`. Events are emitted under `span`.
    pub fn new(pool: PgPool, statement_timeout: Duration, span: Span) -> Self {
        Self {
            pool,
            statement_timeout,
            span,
        }
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, query: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let backstop = self.statement_timeout + BACKSTOP_MARGIN;

        match tokio::time::timeout(backstop, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) if is_query_canceled(sqlstate(&e).as_deref()) => {
                warn!(
                    parent: &self.span,
                    operation,
                    timeout_ms = self.statement_timeout.as_millis() as u64,
                    "User query cancelled by statement_timeout"
                );
                Err(DomainError::timeout(format!(
                    "{} did not finish within {:?}",
                    operation, self.statement_timeout
                )))
            }
            Ok(Err(e)) => {
                warn!(parent: &self.span, operation, error = %e, "User query failed");
                Err(DomainError::storage(format!("Failed to {}: {}", operation, e)))
            }
            Err(_) => {
                warn!(
                    parent: &self.span,
                    operation,
                    timeout_ms = backstop.as_millis() as u64,
                    "No answer from PostgreSQL before the client deadline"
                );
                Err(DomainError::timeout(format!(
                    "{} got no answer within {:?}",
                    operation, backstop
                )))
            }
        }
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

fn is_query_canceled(code: Option<&str>) -> bool {
    code == Some(QUERY_CANCELED)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, mut user: User) -> Result<User, DomainError> {
        let id: i64 = self
            .with_deadline(
                "create user",
                sqlx::query_scalar(
                    r#"
                    INSERT INTO users (username, first_name, last_name, email, password)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&user.username)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(&user.password)
                .fetch_one(&self.pool),
            )
            .await?;

        user.id = UserId::new(id);
        debug!(parent: &self.span, user_id = %user.id, "Inserted user");

        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let result = self
            .with_deadline(
                "update user",
                sqlx::query(
                    r#"
                    UPDATE users
                    SET username = $1, first_name = $2, last_name = $3, email = $4
                    WHERE id = $5
                    "#,
                )
                .bind(&user.username)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(user.id.value())
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("User '{}' not found", user.id)));
        }

        Ok(user)
    }

    async fn update_password(&self, user: &User) -> Result<(), DomainError> {
        let result = self
            .with_deadline(
                "update password",
                sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
                    .bind(&user.password)
                    .bind(user.id.value())
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("User '{}' not found", user.id)));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, DomainError> {
        let row = self
            .with_deadline(
                "find user",
                sqlx::query(
                    r#"
                    SELECT id, username, first_name, last_name, email
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id.value())
                .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::not_found(format!("User '{}' not found", id))),
        }
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let rows = self
            .with_deadline(
                "list users",
                sqlx::query("SELECT id, username, first_name, last_name, email FROM users")
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_user).collect()
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let decode = |e: sqlx::Error| DomainError::storage(format!("Failed to decode user row: {}", e));

    Ok(User {
        id: UserId::new(row.try_get("id").map_err(decode)?),
        username: row.try_get("username").map_err(decode)?,
        first_name: row.try_get("first_name").map_err(decode)?,
        last_name: row.try_get("last_name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password: String::new(),
    })
}

/// These run against a real database: `DATABASE_URL=postgres://... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{apply_statement_timeout, Migrator, PostgresMigrator};
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    async fn repository(timeout: Duration) -> PostgresUserRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let options: PgConnectOptions = url.parse().expect("valid DATABASE_URL");
        let pool = PgPoolOptions::new()
            .max_connections(3)
            .connect_with(apply_statement_timeout(options, timeout))
            .await
            .expect("connect to test database");

        PostgresMigrator::new(pool.clone())
            .run()
            .await
            .expect("apply migrations");

        PostgresUserRepository::new(pool, timeout, Span::none())
    }

    async fn stored_password(repo: &PostgresUserRepository, id: UserId) -> String {
        sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
            .bind(id.value())
            .fetch_one(&repo.pool)
            .await
            .unwrap()
    }

    fn rostik() -> User {
        User::new("rostikts", "rostik", "Tsyapiura", "rostik@test.ua", "123245")
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_then_find_by_id() {
        let repo = repository(Duration::from_secs(5)).await;

        let created = repo.create(rostik()).await.unwrap();
        assert!(created.id.value() > 0);

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, rostik().with_id(created.id).without_password());

        let all = repo.find_all().await.unwrap();
        assert!(all.iter().any(|u| u.id == created.id && u.password.is_empty()));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_and_update_password() {
        let repo = repository(Duration::from_secs(5)).await;
        let created = repo.create(rostik()).await.unwrap();

        let mut changed = created.clone();
        changed.username = "renamed".to_string();
        changed.password = "must-not-be-written".to_string();
        repo.update(changed).await.unwrap();

        let password_change = User {
            id: created.id,
            password: "new-hash".to_string(),
            ..User::default()
        };
        repo.update_password(&password_change).await.unwrap();

        assert_eq!(stored_password(&repo, created.id).await, "new-hash");

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found.username, "renamed");
        assert_eq!(found.email, "rostik@test.ua");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_missing_rows_are_not_found() {
        let repo = repository(Duration::from_secs(5)).await;
        let ghost = rostik().with_id(UserId::new(i64::MAX));

        assert!(repo.update(ghost.clone()).await.unwrap_err().is_not_found());
        assert!(repo.update_password(&ghost).await.unwrap_err().is_not_found());
        assert!(repo.find_by_id(ghost.id).await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_only_query_canceled_is_a_timeout() {
        assert!(is_query_canceled(Some("57014")));
        assert!(!is_query_canceled(Some("23505")));
        assert!(!is_query_canceled(None));
        assert_eq!(sqlstate(&sqlx::Error::RowNotFound), None);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_statement_timeout_maps_to_timeout() {
        let repo = repository(Duration::from_millis(50)).await;

        let err = repo
            .with_deadline(
                "sleep",
                sqlx::query("SELECT pg_sleep(1)").execute(&repo.pool),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Timeout { .. }));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_timed_out_write_is_not_committed() {
        let repo = repository(Duration::from_millis(200)).await;
        let created = repo.create(rostik()).await.unwrap();
        let before = stored_password(&repo, created.id).await;

        let mut lock = repo.pool.begin().await.unwrap();
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(created.id.value())
            .execute(&mut *lock)
            .await
            .unwrap();

        let change = User {
            id: created.id,
            password: "late-hash".to_string(),
            ..User::default()
        };
        let err = repo.update_password(&change).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout { .. }));

        lock.commit().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(stored_password(&repo, created.id).await, before);
    }
}
