//! PostgreSQL connection pooling

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::domain::DomainError;

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
    /// Server-side `statement_timeout` applied to every pooled session
    pub statement_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "social_network".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            statement_timeout: Duration::from_secs(5),
        }
    }
}

impl PostgresConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Connection options; TLS is disabled.
    ///
    /// The server aborts any statement running longer than `statement_timeout`
    /// with SQLSTATE 57014, so a write that misses its deadline is rolled back
    /// instead of committing after the caller has given up.
    pub fn connect_options(&self) -> PgConnectOptions {
        apply_statement_timeout(
            PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.database)
                .ssl_mode(PgSslMode::Disable),
            self.statement_timeout,
        )
    }

    /// Opens a connection pool, failing if the server cannot be reached
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect_with(self.connect_options())
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to connect to PostgreSQL at {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

/// Sets the session `statement_timeout` in milliseconds
pub fn apply_statement_timeout(options: PgConnectOptions, timeout: Duration) -> PgConnectOptions {
    options.options([("statement_timeout", format!("{}ms", timeout.as_millis()))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();

        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
        assert_eq!(config.statement_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_postgres_config_builder() {
        let config = PostgresConfig::new("db", 5433, "app", "secret", "users")
            .with_max_connections(20)
            .with_min_connections(5)
            .with_connect_timeout(60)
            .with_idle_timeout(300)
            .with_statement_timeout(Duration::from_millis(1500));

        assert_eq!(config.host, "db");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user, "app");
        assert_eq!(config.database, "users");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(config.idle_timeout_secs, 300);
        assert_eq!(config.statement_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_connect_options() {
        let options = PostgresConfig::new("db", 5433, "app", "secret", "users").connect_options();

        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("users"));
    }

    #[test]
    fn test_sessions_carry_statement_timeout() {
        let options = PostgresConfig::default()
            .with_statement_timeout(Duration::from_millis(250))
            .connect_options();

        let session = options.get_options().unwrap();
        assert!(session.contains("statement_timeout=250ms"), "{}", session);
    }
}
