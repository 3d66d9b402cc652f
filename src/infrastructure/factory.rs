//! Repository factory for runtime backend selection.
//!
//! Picks the task repository implementation from configuration and owns the
//! `PostgreSQL` pool settings.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `postgres` (default) | `in_memory`
//! - `DATABASE_URL`: full connection URL; takes precedence over the parts below
//! - `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`:
//!   `localhost` / `5432` / `postgres` / `password` / `todo_db`
//! - `DB_MAX_CONNECTIONS`: pool size (default `10`)
//! - `DB_ACQUIRE_TIMEOUT_MS`: wait for a free connection (default `10000`)
//! - `DB_IDLE_TIMEOUT_MS`: close idle connections after (default `60000`)
//!
//! # Example
//!
//! ```ignore
//! let factory = RepositoryFactory::from_env()?;
//! let task_repository = factory.create().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use super::{InMemoryTaskRepository, PostgresTaskRepository, TaskRepository};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// `PostgreSQL` storage for production use.
    #[default]
    Postgres,
    /// Process-local storage. Data is lost on restart.
    InMemory,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Where to connect when no `DATABASE_URL` is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionParts {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "password".to_string(),
            database: "todo_db".to_string(),
        }
    }
}

/// `PostgreSQL` connection and pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Full connection URL. When set, `parts` is ignored.
    pub url: Option<String>,
    pub parts: ConnectionParts,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            parts: ConnectionParts::default(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl DatabaseConfig {
    /// Builds connect options from the URL, or from the individual parts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidDatabaseUrl` if the URL cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigurationError> {
        match &self.url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|error| ConfigurationError::InvalidDatabaseUrl(error.to_string())),
            None => Ok(PgConnectOptions::new()
                .host(&self.parts.host)
                .port(self.parts.port)
                .username(&self.parts.user)
                .password(&self.parts.password)
                .database(&self.parts.database)),
        }
    }

    /// Pool options with the configured size and timeouts.
    #[must_use]
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
    }

    /// Host/database pair for log lines. Never includes credentials.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.connect_options() {
            Ok(options) => format!(
                "{}:{}/{}",
                options.get_host(),
                options.get_port(),
                options.get_database().unwrap_or_default()
            ),
            Err(_) => "<invalid DATABASE_URL>".to_string(),
        }
    }
}

/// Configuration for the repository factory.
///
/// Use `RepositoryConfigBuilder` for a fluent API to construct this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    pub database: DatabaseConfig,
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Creates a configuration from an arbitrary variable source.
    ///
    /// Empty or whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if any variable holds an invalid value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = DatabaseConfig::default();

        let storage_mode = read("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let parts = ConnectionParts {
            host: read("DB_HOST").unwrap_or(defaults.parts.host),
            port: parse_number("DB_PORT", read("DB_PORT"))?.unwrap_or(defaults.parts.port),
            user: read("DB_USER").unwrap_or(defaults.parts.user),
            password: read("DB_PASSWORD").unwrap_or(defaults.parts.password),
            database: read("DB_NAME").unwrap_or(defaults.parts.database),
        };

        let database = DatabaseConfig {
            url: read("DATABASE_URL"),
            parts,
            max_connections: parse_number("DB_MAX_CONNECTIONS", read("DB_MAX_CONNECTIONS"))?
                .unwrap_or(defaults.max_connections),
            acquire_timeout: parse_number("DB_ACQUIRE_TIMEOUT_MS", read("DB_ACQUIRE_TIMEOUT_MS"))?
                .map_or(defaults.acquire_timeout, Duration::from_millis),
            idle_timeout: parse_number("DB_IDLE_TIMEOUT_MS", read("DB_IDLE_TIMEOUT_MS"))?
                .map_or(defaults.idle_timeout, Duration::from_millis),
        };

        let config = Self {
            storage_mode,
            database,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` for a zero-sized pool.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database.max_connections == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigurationError> {
    value
        .map(|raw| {
            raw.parse()
                .map_err(|_| ConfigurationError::InvalidValue { name, value: raw })
        })
        .transpose()
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/todo_db")
///     .max_connections(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database: DatabaseConfig,
}

impl RepositoryConfigBuilder {
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database.url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.database.max_connections = max_connections;
        self
    }

    #[must_use]
    pub const fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.database.acquire_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.database.idle_timeout = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database: self.database,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'postgres' or 'in_memory'")]
    InvalidStorageMode(String),

    /// A numeric setting that does not parse or is out of range.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    /// `DATABASE_URL` is not a valid `PostgreSQL` URL.
    #[error("Invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating the task repository based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new repository factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates the task repository, connecting to `PostgreSQL` if required.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database URL is invalid or the initial
    /// connection fails.
    pub async fn create(&self) -> Result<Arc<dyn TaskRepository + Send + Sync>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryTaskRepository::new())),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                Ok(Arc::new(PostgresTaskRepository::new(pool)))
            }
        }
    }

    /// Creates a `PostgreSQL` connection pool.
    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database = &self.config.database;
        let options = database.connect_options()?;

        tracing::info!(
            database = %database.describe(),
            max_connections = database.max_connections,
            "Connecting to PostgreSQL"
        );

        database
            .pool_options()
            .connect_with(options)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
