//! Musica Catalog Server Library
//!
//! This library exposes the internal modules for testing and for the
//! `cli-auth` binary.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod error;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog::CatalogService;
pub use catalog_store::{CatalogStore, DeletePolicy, SqliteCatalogStore};
pub use error::{AppError, EntityKind};
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{AccountManager, SqliteUserStore, UserStore};
