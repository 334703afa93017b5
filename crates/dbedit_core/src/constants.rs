//! Shared constants used across dbedit crates.

/// The one collection that can never be deleted.
pub const RESERVED_COLLECTION: &str = "system";

/// The one document inside [`RESERVED_COLLECTION`] that can never be deleted.
pub const RESERVED_DOCUMENT: &str = "publishinfo";

/// Placeholder name for a freshly created collection.
pub const NEW_COLLECTION_NAME: &str = "new database";

/// Name of the single empty document seeded into a new collection.
pub const NEW_COLLECTION_SEED_KEY: &str = "key";

/// Placeholder name for a freshly created document.
pub const NEW_DOCUMENT_NAME: &str = "new key";

/// Prefix prepended to the source name when forking a collection or document.
pub const FORK_NAME_PREFIX: &str = "copy of ";

/// Time the structured editor gets to signal readiness before plain-text fallback.
pub const DEFAULT_EDITOR_FALLBACK_MS: u64 = 2_000;

/// Author recorded on versions when none is configured.
pub const DEFAULT_AUTHOR: &str = "dbedit";

/// Email recorded on versions when none is configured.
pub const DEFAULT_AUTHOR_EMAIL: &str = "dbedit@localhost";

/// File type reported for collection/document downloads.
pub const DOWNLOAD_FILE_TYPE: &str = "json";
