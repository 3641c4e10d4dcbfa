//! SQLite Engine
//!
//! Persistent engine: one SQLite file per named database under a data
//! directory. Records are stored as JSON text, one table per collection.
//! Indexes are expression indexes over `json_extract`, and the schema
//! version lives in `PRAGMA user_version`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde_json::Value;

use super::{
    check_access, extract_key, validate_identifier, Connection, Engine, EngineError,
    EngineResult, IndexSpec, Schema, Transaction, TransactionFn, TransactionMode, UpgradeFn,
    VersionChange,
};

/// Catalog tables, created on every open
const CATALOG_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS _collections (
    name TEXT PRIMARY KEY,
    key_path TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS _indexes (
    collection TEXT NOT NULL REFERENCES _collections(name),
    name TEXT NOT NULL,
    key_path TEXT NOT NULL,
    is_unique INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (collection, name)
);
"#;

fn table_name(collection: &str) -> String {
    format!("\"rec_{}\"", collection)
}

/// SQLite-backed engine rooted at a data directory
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    data_dir: PathBuf,
}

impl SqliteEngine {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File backing the database called `name`
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.db", name))
    }

    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &rusqlite::Connection) -> EngineResult<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("CHARFORGE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }
}

impl Engine for SqliteEngine {
    fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: &mut UpgradeFn<'_>,
    ) -> EngineResult<Arc<dyn Connection>> {
        validate_identifier(name)?;
        std::fs::create_dir_all(&self.data_dir)?;

        let path = self.database_path(name);
        let mut conn = rusqlite::Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&conn)?;
        conn.execute_batch(CATALOG_SQL)?;

        let stored: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < stored {
            return Err(EngineError::Version {
                requested: version,
                stored,
            });
        }

        if version > stored {
            tracing::debug!(database = name, from = stored, to = version, "Upgrading SQLite schema");
            let tx = conn.transaction()?;
            let change = VersionChange {
                old_version: stored,
                new_version: version,
            };
            upgrade(&mut SqliteSchema { conn: &tx }, change)?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
        }

        let catalog = Catalog::load(&conn)?;

        Ok(Arc::new(SqliteConnection {
            name: name.to_string(),
            version,
            conn: Mutex::new(Some(conn)),
            catalog,
        }))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

struct SqliteSchema<'a> {
    conn: &'a rusqlite::Connection,
}

impl Schema for SqliteSchema<'_> {
    fn contains(&self, collection: &str) -> EngineResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM _collections WHERE name = ?1",
                params![collection],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn create_collection(&mut self, collection: &str, key_path: &str) -> EngineResult<()> {
        validate_identifier(collection)?;
        validate_identifier(key_path)?;
        if self.contains(collection)? {
            return Err(EngineError::CollectionExists(collection.to_string()));
        }

        self.conn.execute_batch(&format!(
            "CREATE TABLE {} (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL);",
            table_name(collection)
        ))?;
        self.conn.execute(
            "INSERT INTO _collections (name, key_path) VALUES (?1, ?2)",
            params![collection, key_path],
        )?;
        Ok(())
    }

    fn contains_index(&self, collection: &str, index: &str) -> EngineResult<bool> {
        if !self.contains(collection)? {
            return Err(EngineError::UnknownCollection(collection.to_string()));
        }
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM _indexes WHERE collection = ?1 AND name = ?2",
                params![collection, index],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn create_index(&mut self, collection: &str, spec: &IndexSpec) -> EngineResult<()> {
        validate_identifier(spec.name)?;
        validate_identifier(spec.key_path)?;
        if self.contains_index(collection, spec.name)? {
            return Err(EngineError::IndexExists {
                collection: collection.to_string(),
                index: spec.name.to_string(),
            });
        }

        let unique = if spec.unique { "UNIQUE " } else { "" };
        self.conn.execute_batch(&format!(
            "CREATE {}INDEX \"idx_{}_{}\" ON {} (json_extract(value, '$.{}'));",
            unique,
            collection,
            spec.name,
            table_name(collection),
            spec.key_path
        ))?;
        self.conn.execute(
            "INSERT INTO _indexes (collection, name, key_path, is_unique) VALUES (?1, ?2, ?3, ?4)",
            params![collection, spec.name, spec.key_path, spec.unique],
        )?;
        Ok(())
    }
}

/// Key paths of collections and indexes, fixed for the life of a connection
#[derive(Debug, Default)]
struct Catalog {
    collections: HashMap<String, String>,
    indexes: HashMap<(String, String), String>,
}

impl Catalog {
    fn load(conn: &rusqlite::Connection) -> EngineResult<Self> {
        let mut catalog = Catalog::default();

        let mut stmt = conn.prepare("SELECT name, key_path FROM _collections")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (name, key_path) = row?;
            catalog.collections.insert(name, key_path);
        }

        let mut stmt = conn.prepare("SELECT collection, name, key_path FROM _indexes")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (collection, name, key_path) = row?;
            catalog.indexes.insert((collection, name), key_path);
        }

        Ok(catalog)
    }

    fn key_path(&self, collection: &str) -> EngineResult<&str> {
        self.collections
            .get(collection)
            .map(String::as_str)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))
    }

    fn index_key_path(&self, collection: &str, index: &str) -> EngineResult<&str> {
        self.indexes
            .get(&(collection.to_string(), index.to_string()))
            .map(String::as_str)
            .ok_or_else(|| EngineError::UnknownIndex {
                collection: collection.to_string(),
                index: index.to_string(),
            })
    }
}

// ============================================================================
// CONNECTION
// ============================================================================

struct SqliteConnection {
    name: String,
    version: u32,
    conn: Mutex<Option<rusqlite::Connection>>,
    catalog: Catalog,
}

impl Connection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn collection_names(&self) -> EngineResult<Vec<String>> {
        let mut names: Vec<String> = self.catalog.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        body: &mut TransactionFn<'_>,
    ) -> EngineResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| EngineError::Request(Some("Connection lock poisoned".into())))?;
        let conn = guard.as_mut().ok_or(EngineError::Closed)?;

        for &collection in scope {
            self.catalog.key_path(collection)?;
        }

        let behavior = match mode {
            TransactionMode::ReadOnly => TransactionBehavior::Deferred,
            TransactionMode::ReadWrite => TransactionBehavior::Immediate,
        };
        // Dropping an uncommitted transaction rolls it back
        let tx = conn.transaction_with_behavior(behavior)?;
        {
            let mut handle = SqliteTransaction {
                conn: &tx,
                catalog: &self.catalog,
                scope: scope.iter().map(|s| s.to_string()).collect(),
                mode,
            };
            body(&mut handle)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn close(&self) {
        let Ok(mut guard) = self.conn.lock() else {
            return;
        };
        if let Some(conn) = guard.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Failed to close SQLite connection for {}: {}", self.name, e);
            }
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

struct SqliteTransaction<'a> {
    conn: &'a rusqlite::Connection,
    catalog: &'a Catalog,
    scope: Vec<String>,
    mode: TransactionMode,
}

impl SqliteTransaction<'_> {
    fn table(&self, collection: &str, write: bool) -> EngineResult<String> {
        check_access(&self.scope, self.mode, collection, write)?;
        self.catalog.key_path(collection)?;
        Ok(table_name(collection))
    }

    /// `(key, value)` rows whose indexed field equals `value`, in key order
    fn index_rows(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> EngineResult<Vec<(String, Value)>> {
        let table = self.table(collection, false)?;
        let key_path = self.catalog.index_key_path(collection, index)?;
        let limit = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT key, value FROM {} WHERE json_extract(value, '$.{}') = ?1 ORDER BY key{}",
            table, key_path, limit
        ))?;
        let rows = stmt.query_map(params![sql_value(value)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (key, text) = row?;
            result.push((key, serde_json::from_str(&text)?));
        }
        Ok(result)
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn put(&mut self, collection: &str, record: Value) -> EngineResult<String> {
        let table = self.table(collection, true)?;
        let key = extract_key(&record, self.catalog.key_path(collection)?)?;
        let text = serde_json::to_string(&record)?;
        self.conn.execute(
            &format!("INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)", table),
            params![key, text],
        )?;
        Ok(key)
    }

    fn get(&mut self, collection: &str, key: &str) -> EngineResult<Option<Value>> {
        let table = self.table(collection, false)?;
        let text: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn get_all(&mut self, collection: &str) -> EngineResult<Vec<Value>> {
        let table = self.table(collection, false)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT value FROM {} ORDER BY key", table))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(serde_json::from_str(&row?)?);
        }
        Ok(result)
    }

    fn delete(&mut self, collection: &str, key: &str) -> EngineResult<()> {
        let table = self.table(collection, true)?;
        self.conn
            .execute(&format!("DELETE FROM {} WHERE key = ?1", table), params![key])?;
        Ok(())
    }

    fn count(&mut self, collection: &str) -> EngineResult<usize> {
        let table = self.table(collection, false)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn index_get(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Option<Value>> {
        let mut rows = self.index_rows(collection, index, value, Some(1))?;
        Ok(rows.pop().map(|(_, record)| record))
    }

    fn index_get_all(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Vec<Value>> {
        let rows = self.index_rows(collection, index, value, None)?;
        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    fn index_count(&mut self, collection: &str, index: &str, value: &Value) -> EngineResult<usize> {
        let table = self.table(collection, false)?;
        let key_path = self.catalog.index_key_path(collection, index)?;
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE json_extract(value, '$.{}') = ?1",
                table, key_path
            ),
            params![sql_value(value)],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn index_keys(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Vec<String>> {
        let rows = self.index_rows(collection, index, value, None)?;
        Ok(rows.into_iter().map(|(key, _)| key).collect())
    }
}

/// SQL value `json_extract` yields for a JSON scalar
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
