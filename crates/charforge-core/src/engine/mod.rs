//! Store Engine Module
//!
//! The embedded object-store engine the gateway runs on:
//! - Named databases opened at a target version, with an upgrade callback
//! - Collections of JSON records keyed by a key path
//! - Non-unique secondary indexes over a record field
//! - Scoped read-only / read-write transactions that commit or roll back as a unit
//!
//! Two engines are provided: [`MemoryEngine`] (in-process) and
//! [`SqliteEngine`] (persistent, one SQLite file per database).

mod memory;
mod sqlite;

use std::sync::Arc;

use serde_json::Value;

pub use memory::{EngineStats, Fault, MemoryEngine, RequestKind};
pub use sqlite::SqliteEngine;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Record (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Collection does not exist
    #[error("No collection named '{0}'")]
    UnknownCollection(String),
    /// Index does not exist on the collection
    #[error("No index named '{index}' on collection '{collection}'")]
    UnknownIndex { collection: String, index: String },
    /// Collection already exists
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),
    /// Index already exists
    #[error("Index '{index}' already exists on collection '{collection}'")]
    IndexExists { collection: String, index: String },
    /// Collection used outside the transaction scope
    #[error("Collection '{0}' is not part of this transaction")]
    OutOfScope(String),
    /// Write attempted in a read-only transaction
    #[error("Cannot write to '{0}' in a read-only transaction")]
    ReadOnly(String),
    /// Record has no string value at the collection's key path
    #[error("Record has no string key at '{0}'")]
    MissingKey(String),
    /// Name not usable as a collection, index or key path
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
    /// Requested version is below the stored version
    #[error("Requested version {requested} is lower than the stored version {stored}")]
    Version { requested: u32, stored: u32 },
    /// Connection already closed
    #[error("Connection is closed")]
    Closed,
    /// Opaque request failure, possibly without any message
    #[error("{}", .0.as_deref().unwrap_or("Request failed"))]
    Request(Option<String>),
}

impl EngineError {
    /// Human-readable reason, `None` when the failure carried no message
    pub fn reason(&self) -> Option<String> {
        match self {
            EngineError::Request(message) => {
                message.clone().filter(|m| !m.trim().is_empty())
            }
            other => Some(other.to_string()),
        }
    }
}

/// Engine result type
pub type EngineResult<T> = std::result::Result<T, EngineError>;

// ============================================================================
// SCHEMA TYPES
// ============================================================================

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Old/new version pair passed to the upgrade callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionChange {
    /// Version found on disk (0 when the database was never created)
    pub old_version: u32,
    /// Version being opened
    pub new_version: u32,
}

/// Secondary index definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub key_path: &'static str,
    pub unique: bool,
}

/// Upgrade callback signature
pub type UpgradeFn<'a> = dyn FnMut(&mut dyn Schema, VersionChange) -> EngineResult<()> + 'a;

/// Transaction body signature
pub type TransactionFn<'a> = dyn FnMut(&mut dyn Transaction) -> EngineResult<()> + 'a;

// ============================================================================
// TRAITS
// ============================================================================

/// An embedded store engine able to open versioned databases
pub trait Engine: Send + Sync {
    /// Open `name` at `version`, running `upgrade` when the stored version is lower.
    ///
    /// The upgrade is atomic: if `upgrade` fails nothing is persisted and the
    /// stored version is unchanged.
    fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: &mut UpgradeFn<'_>,
    ) -> EngineResult<Arc<dyn Connection>>;
}

/// Mutable schema handle, only available inside an upgrade
pub trait Schema {
    fn contains(&self, collection: &str) -> EngineResult<bool>;
    fn create_collection(&mut self, collection: &str, key_path: &str) -> EngineResult<()>;
    fn contains_index(&self, collection: &str, index: &str) -> EngineResult<bool>;
    fn create_index(&mut self, collection: &str, spec: &IndexSpec) -> EngineResult<()>;
}

/// An open database
pub trait Connection: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> u32;
    fn collection_names(&self) -> EngineResult<Vec<String>>;

    /// Run `body` in a transaction over `scope`.
    ///
    /// `Ok` from the body commits; `Err` rolls back every write it made.
    fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        body: &mut TransactionFn<'_>,
    ) -> EngineResult<()>;

    /// Release the connection. Later transactions fail with [`EngineError::Closed`].
    fn close(&self);
}

/// Record operations available inside a transaction
pub trait Transaction {
    fn mode(&self) -> TransactionMode;

    /// Insert or overwrite a record, returning its key
    fn put(&mut self, collection: &str, record: Value) -> EngineResult<String>;
    fn get(&mut self, collection: &str, key: &str) -> EngineResult<Option<Value>>;
    fn get_all(&mut self, collection: &str) -> EngineResult<Vec<Value>>;
    /// Deleting a missing key is not an error
    fn delete(&mut self, collection: &str, key: &str) -> EngineResult<()>;
    fn count(&mut self, collection: &str) -> EngineResult<usize>;

    /// First record (in key order) whose indexed field equals `value`
    fn index_get(&mut self, collection: &str, index: &str, value: &Value)
        -> EngineResult<Option<Value>>;
    fn index_get_all(&mut self, collection: &str, index: &str, value: &Value)
        -> EngineResult<Vec<Value>>;
    fn index_count(&mut self, collection: &str, index: &str, value: &Value)
        -> EngineResult<usize>;
    /// Cursor over the primary keys of matching records, in key order
    fn index_keys(&mut self, collection: &str, index: &str, value: &Value)
        -> EngineResult<Vec<String>>;
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Check that `collection` is usable for a read (or write) in this transaction
pub(crate) fn check_access(
    scope: &[String],
    mode: TransactionMode,
    collection: &str,
    write: bool,
) -> EngineResult<()> {
    if !scope.iter().any(|c| c == collection) {
        return Err(EngineError::OutOfScope(collection.to_string()));
    }
    if write && mode == TransactionMode::ReadOnly {
        return Err(EngineError::ReadOnly(collection.to_string()));
    }
    Ok(())
}

/// Extract the primary key of `record` at `key_path`
pub(crate) fn extract_key(record: &Value, key_path: &str) -> EngineResult<String> {
    record
        .get(key_path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EngineError::MissingKey(key_path.to_string()))
}

/// Collection names, index names and key paths end up in SQL, so keep them plain
pub(crate) fn validate_identifier(name: &str) -> EngineResult<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with('_');
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidIdentifier(name.to_string()))
    }
}
