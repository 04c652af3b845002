//! Warden Database — SurrealDB connection management, schema
//! migrations and [`AccountDirectory`](warden_core::repository::AccountDirectory)
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - A SurrealDB-backed directory and an in-process one
//!   ([`repository`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
