//! Data models shared by the store, the editor session, and the CLI.

/// Collections and their documents.
pub mod collection;
/// Version history records.
pub mod version;

#[cfg(test)]
mod tests;

pub use collection::{Collection, Document, DocumentMap};
pub use version::VersionRecord;
