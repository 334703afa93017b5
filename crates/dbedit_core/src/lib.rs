//! Core domain library for dbedit (config, storage, models, guard rules).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants (reserved names, placeholders, timeouts).
pub mod constants;
/// Versioned document store backed by redb.
pub mod db;
/// Application error types (storage/domain).
pub mod error;
/// Name and deletion guard rules shared by the editor and the CLI.
pub mod guard;
/// Data models for collections, documents, and versions.
pub mod models;
/// Database service contract consumed by the editor backend.
pub mod service;
#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::{
    DEFAULT_EDITOR_FALLBACK_MS, FORK_NAME_PREFIX, NEW_COLLECTION_NAME, NEW_COLLECTION_SEED_KEY,
    NEW_DOCUMENT_NAME, RESERVED_COLLECTION, RESERVED_DOCUMENT,
};
pub use db::Database;
pub use error::AppError;
pub use models::{DocumentMap, VersionRecord};
pub use service::DatabaseService;
