//! Infrastructure module for external services.
//!
//! This module contains the task repositories, the SQL builder they share
//! and the factory that selects a backend at startup.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod query_builder;
pub mod repository;

pub use factory::{
    ConfigurationError, DatabaseConfig, FactoryError, RepositoryConfig, RepositoryFactory,
    StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use query_builder::{Pagination, SqlQuery, SqlValue, TaskFilter};
pub use repository::{PaginatedResult, RepositoryError, RepositoryFuture, TaskRepository};
