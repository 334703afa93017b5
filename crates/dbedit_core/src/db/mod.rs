//! Versioned document store backed by redb.
//!
//! Every mutation rewrites one collection row and appends one version row in
//! the same write transaction, so history and current state never diverge.

mod codec;
/// redb table definitions.
pub mod tables;

#[cfg(test)]
mod tests;

use self::codec::{
    decode_collection, decode_version, touched_keys, StoredCollection, StoredVersion,
};
use self::tables::{COLLECTIONS, REDB_FILE_NAME, VERSIONS};
use crate::config::Config;
use crate::constants::{DEFAULT_AUTHOR, DEFAULT_AUTHOR_EMAIL, RESERVED_COLLECTION, RESERVED_DOCUMENT};
use crate::error::AppError;
use crate::guard::{check_collection_delete, check_document_delete};
use crate::models::{DocumentMap, VersionRecord};
use crate::service::DatabaseService;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Identity recorded on every version this handle writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionAuthor {
    pub name: String,
    pub email: String,
}

impl Default for VersionAuthor {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

/// Database handle over the shared redb instance.
pub struct Database {
    pub db: Arc<redb::Database>,
    author: VersionAuthor,
}

type VersionTable<'txn> = redb::Table<'txn, (&'static str, u64), &'static [u8]>;

impl Database {
    /// Open (or create) the store at `path` with default author and the
    /// reserved collection seeded.
    ///
    /// # Errors
    /// Returns an error if the directory or redb file cannot be opened.
    pub fn new(path: &str) -> Result<Self, AppError> {
        Self::open_with(path, VersionAuthor::default(), true)
    }

    /// Open the store described by `config`.
    ///
    /// # Errors
    /// Returns an error if the directory or redb file cannot be opened.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let author = VersionAuthor {
            name: config.author.clone(),
            email: config.author_email.clone(),
        };
        Self::open_with(&config.db_path, author, config.seed_reserved)
    }

    fn open_with(path: &str, author: VersionAuthor, seed_reserved: bool) -> Result<Self, AppError> {
        std::fs::create_dir_all(path)?;
        let file = Path::new(path).join(REDB_FILE_NAME);
        let db = Arc::new(redb::Database::create(&file)?);

        let write_txn = db.begin_write()?;
        write_txn.open_table(COLLECTIONS)?;
        write_txn.open_table(VERSIONS)?;
        write_txn.commit()?;

        let database = Self { db, author };
        if seed_reserved {
            database.seed_reserved_collection()?;
        }
        info!("opened document store at {}", file.display());
        Ok(database)
    }

    /// Clone this handle for another subsystem in the same process.
    pub fn share(&self) -> Self {
        Self {
            db: self.db.clone(),
            author: self.author.clone(),
        }
    }

    fn seed_reserved_collection(&self) -> Result<(), AppError> {
        if self.collection_exists(RESERVED_COLLECTION)? {
            return Ok(());
        }
        let mut documents = DocumentMap::new();
        documents.insert(
            RESERVED_DOCUMENT.to_string(),
            json!({ "buckets": [], "branch_buckets": [] }),
        );
        self.put_collection(RESERVED_COLLECTION, &documents)?;
        info!("seeded reserved collection '{}'", RESERVED_COLLECTION);
        Ok(())
    }

    fn collection_exists(&self, name: &str) -> Result<bool, AppError> {
        let read_txn = self.db.begin_read()?;
        let collections = read_txn.open_table(COLLECTIONS)?;
        Ok(collections.get(name)?.is_some())
    }

    /// Every version recorded for `name`, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or decoding fails.
    pub fn collection_history(&self, name: &str) -> Result<Vec<VersionRecord>, AppError> {
        Ok(self
            .load_versions(name)?
            .into_iter()
            .map(|version| version.record)
            .collect())
    }

    fn load_versions(&self, name: &str) -> Result<Vec<StoredVersion>, AppError> {
        let read_txn = self.db.begin_read()?;
        let versions = read_txn.open_table(VERSIONS)?;
        let mut rows = Vec::new();
        for item in versions.range((name, 0u64)..=(name, u64::MAX))?.rev() {
            let (_, value) = item?;
            rows.push(decode_version(value.value())?);
        }
        Ok(rows)
    }

    fn load_collection(&self, name: &str) -> Result<Option<StoredCollection>, AppError> {
        let read_txn = self.db.begin_read()?;
        let collections = read_txn.open_table(COLLECTIONS)?;
        match collections.get(name)? {
            Some(value) => Ok(Some(decode_collection(value.value())?)),
            None => Ok(None),
        }
    }

    /// Apply `mutate` to the current body of `name` and record a version.
    ///
    /// `mutate` receives the current body (`None` if missing) and returns the
    /// new body (`None` removes the collection) plus the version message.
    fn commit<F>(&self, name: &str, mutate: F) -> Result<VersionRecord, AppError>
    where
        F: FnOnce(Option<StoredCollection>) -> Result<(Option<StoredCollection>, String), AppError>,
    {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut collections = write_txn.open_table(COLLECTIONS)?;
            let mut versions = write_txn.open_table(VERSIONS)?;

            let current = match collections.get(name)? {
                Some(guard) => Some(decode_collection(guard.value())?),
                None => None,
            };
            let before = current.clone().unwrap_or_default();
            let (next, message) = mutate(current)?;
            let after = next.clone().unwrap_or_default();
            let touched = touched_keys(&before, &after);

            match next.as_ref() {
                Some(body) => {
                    let encoded = bincode::serialize(body)?;
                    collections.insert(name, encoded.as_slice())?;
                }
                None => {
                    let _ = collections.remove(name)?;
                }
            }
            append_version(&mut versions, &self.author, name, next, touched, message)?
        };
        write_txn.commit()?;
        debug!(
            collection = name,
            version = record.version_id.as_str(),
            "{}",
            record.message
        );
        Ok(record)
    }
}

fn append_version(
    versions: &mut VersionTable<'_>,
    author: &VersionAuthor,
    name: &str,
    snapshot: Option<StoredCollection>,
    touched_keys: Vec<String>,
    message: String,
) -> Result<VersionRecord, AppError> {
    let head = {
        let mut range = versions.range((name, 0u64)..=(name, u64::MAX))?;
        match range.next_back() {
            Some(item) => {
                let (key, value) = item?;
                let (_, seq) = key.value();
                Some((seq, decode_version(value.value())?.record.version_id))
            }
            None => None,
        }
    };
    let next_seq = head.as_ref().map(|(seq, _)| seq + 1).unwrap_or(0);
    let parent_ids: Vec<String> = head.map(|(_, id)| vec![id]).unwrap_or_default();
    let timestamp = Utc::now();

    let mut hasher = blake3::Hasher::new();
    for parent in &parent_ids {
        hasher.update(parent.as_bytes());
    }
    hasher.update(name.as_bytes());
    hasher.update(&next_seq.to_le_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(message.as_bytes());
    hasher.update(&bincode::serialize(&snapshot)?);
    let version_id = hasher.finalize().to_hex().as_str()[..40].to_string();

    let record = VersionRecord {
        version_id,
        timestamp,
        author: author.name.clone(),
        email: author.email.clone(),
        message,
        parent_ids,
    };
    let row = StoredVersion {
        record: record.clone(),
        touched_keys,
        snapshot,
    };
    let encoded = bincode::serialize(&row)?;
    versions.insert((name, next_seq), encoded.as_slice())?;
    Ok(record)
}

impl DatabaseService for Database {
    fn list_collections(&self) -> Result<Vec<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let collections = read_txn.open_table(COLLECTIONS)?;
        let mut names = Vec::new();
        for item in collections.iter()? {
            let (key, _) = item?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    fn get_collection(&self, name: &str) -> Result<DocumentMap, AppError> {
        self.load_collection(name)?
            .ok_or(AppError::NotFound)?
            .to_documents()
    }

    fn get_key_history(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Vec<VersionRecord>, AppError> {
        Ok(self
            .load_versions(collection)?
            .into_iter()
            .filter(|version| version.touched_keys.iter().any(|touched| touched == key))
            .map(|version| version.record)
            .collect())
    }

    fn put_collection(&self, name: &str, documents: &DocumentMap) -> Result<(), AppError> {
        let body = StoredCollection::from_documents(documents)?;
        self.commit(name, |current| {
            let message = if current.is_some() {
                format!("Updated database [{}]", name)
            } else {
                format!("Added database [{}]", name)
            };
            Ok((Some(body), message))
        })?;
        Ok(())
    }

    fn delete_collection(&self, name: &str) -> Result<(), AppError> {
        check_collection_delete(name).map_err(|err| AppError::BadRequest(err.to_string()))?;
        self.commit(name, |current| {
            if current.is_none() {
                return Err(AppError::NotFound);
            }
            Ok((None, format!("Removed database [{}]", name)))
        })?;
        Ok(())
    }

    fn put_key(&self, collection: &str, key: &str, content: &Value) -> Result<(), AppError> {
        let text = serde_json::to_string(content)?;
        self.commit(collection, |current| {
            let mut body = current.ok_or(AppError::NotFound)?;
            body.upsert(key, text);
            Ok((
                Some(body),
                format!("Setting key [{}] in database [{}]", key, collection),
            ))
        })?;
        Ok(())
    }

    fn delete_key(&self, collection: &str, key: &str) -> Result<(), AppError> {
        check_document_delete(collection, key)
            .map_err(|err| AppError::BadRequest(err.to_string()))?;
        self.commit(collection, |current| {
            let mut body = current.ok_or(AppError::NotFound)?;
            if !body.remove(key) {
                return Err(AppError::NotFound);
            }
            Ok((
                Some(body),
                format!("Removed key [{}] from database [{}]", key, collection),
            ))
        })?;
        Ok(())
    }

    fn revert_to_version(&self, collection: &str, version_id: &str) -> Result<(), AppError> {
        let target = self
            .load_versions(collection)?
            .into_iter()
            .find(|version| version.record.version_id == version_id)
            .ok_or(AppError::NotFound)?;
        let snapshot = target.snapshot.ok_or_else(|| {
            AppError::BadRequest(format!(
                "Version [{}] removed database [{}]; nothing to restore",
                version_id, collection
            ))
        })?;
        self.commit(collection, |_| {
            Ok((
                Some(snapshot),
                format!(
                    "Reverted database [{}] to version [{}]",
                    collection, version_id
                ),
            ))
        })?;
        Ok(())
    }
}
