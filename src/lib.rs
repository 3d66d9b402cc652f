//! Todo Task API
//!
//! A CRUD HTTP service for todo tasks backed by `PostgreSQL`, with
//! pagination, filtering, name search and soft delete.
//!
//! # Modules
//!
//! - [`domain`]: the task entity, its value objects and validated inputs
//! - [`infrastructure`]: SQL builder, repositories and backend selection
//! - [`api`]: HTTP handlers, DTOs, error mapping and the router

pub mod api;
pub mod domain;
pub mod infrastructure;
