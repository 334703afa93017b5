//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Current collection rows (`StoredCollection`, bincode-encoded).
pub const COLLECTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("collections");

/// Append-only version rows keyed by collection then sequence number
/// (`StoredVersion`, bincode-encoded).
pub const VERSIONS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("versions");
