//! In-Memory Engine
//!
//! BTreeMap-backed engine. Databases live as long as the engine value (and
//! its clones), so a gateway can close and re-open against the same data.
//! Transactions work on a copy of the scoped collections and swap it in on
//! commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{
    check_access, extract_key, validate_identifier, Connection, Engine, EngineError,
    EngineResult, IndexSpec, Schema, Transaction, TransactionFn, TransactionMode, UpgradeFn,
    VersionChange,
};

#[derive(Debug, Clone, Default)]
struct StoredDatabase {
    version: u32,
    collections: BTreeMap<String, StoredCollection>,
}

#[derive(Debug, Clone)]
struct StoredCollection {
    key_path: String,
    indexes: BTreeMap<String, IndexSpec>,
    records: BTreeMap<String, Value>,
}

impl StoredCollection {
    fn index_key_path(&self, collection: &str, index: &str) -> EngineResult<&str> {
        self.indexes
            .get(index)
            .map(|spec| spec.key_path)
            .ok_or_else(|| EngineError::UnknownIndex {
                collection: collection.to_string(),
                index: index.to_string(),
            })
    }

    fn matching<'a>(
        &'a self,
        key_path: &'a str,
        value: &'a Value,
    ) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
        self.records
            .iter()
            .filter(move |(_, record)| record.get(key_path) == Some(value))
    }
}

type Databases = Arc<Mutex<HashMap<String, StoredDatabase>>>;
type Faults = Arc<Mutex<Vec<Fault>>>;

fn lock(databases: &Databases) -> EngineResult<MutexGuard<'_, HashMap<String, StoredDatabase>>> {
    databases
        .lock()
        .map_err(|_| EngineError::Request(Some("Engine lock poisoned".into())))
}

/// Request counters, readable through [`MemoryEngine::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Calls to [`Engine::open`]
    pub opens: usize,
    /// Transactions started on any connection
    pub transactions: usize,
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    transactions: AtomicUsize,
}

/// In-process engine
#[derive(Clone, Default)]
pub struct MemoryEngine {
    databases: Databases,
    counters: Arc<Counters>,
    faults: Faults,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            opens: self.counters.opens.load(Ordering::SeqCst),
            transactions: self.counters.transactions.load(Ordering::SeqCst),
        }
    }

    /// Stored version of `name`, 0 when it was never created
    pub fn stored_version(&self, name: &str) -> u32 {
        self.databases
            .lock()
            .ok()
            .and_then(|dbs| dbs.get(name).map(|db| db.version))
            .unwrap_or(0)
    }
}

impl Engine for MemoryEngine {
    fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: &mut UpgradeFn<'_>,
    ) -> EngineResult<Arc<dyn Connection>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        check_fault(&self.faults, RequestKind::Open, None)?;

        let mut dbs = lock(&self.databases)?;
        let stored = dbs.get(name).cloned().unwrap_or_default();

        if version < stored.version {
            return Err(EngineError::Version {
                requested: version,
                stored: stored.version,
            });
        }

        if version > stored.version {
            let mut working = stored.clone();
            let change = VersionChange {
                old_version: stored.version,
                new_version: version,
            };
            upgrade(&mut MemorySchema { db: &mut working }, change)?;
            working.version = version;
            dbs.insert(name.to_string(), working);
        }

        Ok(Arc::new(MemoryConnection {
            name: name.to_string(),
            version,
            databases: Arc::clone(&self.databases),
            counters: Arc::clone(&self.counters),
            closed: AtomicBool::new(false),
            faults: Arc::clone(&self.faults),
        }))
    }
}

struct MemorySchema<'a> {
    db: &'a mut StoredDatabase,
}

impl Schema for MemorySchema<'_> {
    fn contains(&self, collection: &str) -> EngineResult<bool> {
        Ok(self.db.collections.contains_key(collection))
    }

    fn create_collection(&mut self, collection: &str, key_path: &str) -> EngineResult<()> {
        validate_identifier(collection)?;
        validate_identifier(key_path)?;
        if self.db.collections.contains_key(collection) {
            return Err(EngineError::CollectionExists(collection.to_string()));
        }
        self.db.collections.insert(
            collection.to_string(),
            StoredCollection {
                key_path: key_path.to_string(),
                indexes: BTreeMap::new(),
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn contains_index(&self, collection: &str, index: &str) -> EngineResult<bool> {
        self.db
            .collections
            .get(collection)
            .map(|c| c.indexes.contains_key(index))
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))
    }

    fn create_index(&mut self, collection: &str, spec: &IndexSpec) -> EngineResult<()> {
        validate_identifier(spec.name)?;
        validate_identifier(spec.key_path)?;
        let stored = self
            .db
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))?;
        if stored.indexes.contains_key(spec.name) {
            return Err(EngineError::IndexExists {
                collection: collection.to_string(),
                index: spec.name.to_string(),
            });
        }
        stored.indexes.insert(spec.name.to_string(), *spec);
        Ok(())
    }
}

struct MemoryConnection {
    name: String,
    version: u32,
    databases: Databases,
    counters: Arc<Counters>,
    closed: AtomicBool,
    faults: Faults,
}

impl Connection for MemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn collection_names(&self) -> EngineResult<Vec<String>> {
        let dbs = lock(&self.databases)?;
        Ok(dbs
            .get(&self.name)
            .map(|db| db.collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        body: &mut TransactionFn<'_>,
    ) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        self.counters.transactions.fetch_add(1, Ordering::SeqCst);

        let mut dbs = lock(&self.databases)?;
        let db = dbs
            .get_mut(&self.name)
            .ok_or_else(|| EngineError::Request(Some(format!("Database '{}' is gone", self.name))))?;

        let mut working = BTreeMap::new();
        for &collection in scope {
            let stored = db
                .collections
                .get(collection)
                .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))?;
            working.insert(collection.to_string(), stored.clone());
        }

        let mut tx = MemoryTransaction {
            scope: scope.iter().map(|s| s.to_string()).collect(),
            mode,
            collections: working,
            faults: Arc::clone(&self.faults),
        };
        body(&mut tx)?;

        if mode == TransactionMode::ReadWrite {
            db.collections.extend(tx.collections);
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct MemoryTransaction {
    scope: Vec<String>,
    mode: TransactionMode,
    collections: BTreeMap<String, StoredCollection>,
    faults: Faults,
}

impl MemoryTransaction {
    fn collection(&self, name: &str, op: RequestKind) -> EngineResult<&StoredCollection> {
        check_access(&self.scope, self.mode, name, false)?;
        check_fault(&self.faults, op, Some(name))?;
        self.collections
            .get(name)
            .ok_or_else(|| EngineError::UnknownCollection(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str, op: RequestKind) -> EngineResult<&mut StoredCollection> {
        check_access(&self.scope, self.mode, name, true)?;
        check_fault(&self.faults, op, Some(name))?;
        self.collections
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownCollection(name.to_string()))
    }
}

impl Transaction for MemoryTransaction {
    fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn put(&mut self, collection: &str, record: Value) -> EngineResult<String> {
        let stored = self.collection_mut(collection, RequestKind::Put)?;
        let key = extract_key(&record, &stored.key_path)?;
        stored.records.insert(key.clone(), record);
        Ok(key)
    }

    fn get(&mut self, collection: &str, key: &str) -> EngineResult<Option<Value>> {
        let stored = self.collection(collection, RequestKind::Get)?;
        Ok(stored.records.get(key).cloned())
    }

    fn get_all(&mut self, collection: &str) -> EngineResult<Vec<Value>> {
        let stored = self.collection(collection, RequestKind::Get)?;
        Ok(stored.records.values().cloned().collect())
    }

    fn delete(&mut self, collection: &str, key: &str) -> EngineResult<()> {
        let stored = self.collection_mut(collection, RequestKind::Delete)?;
        stored.records.remove(key);
        Ok(())
    }

    fn count(&mut self, collection: &str) -> EngineResult<usize> {
        let stored = self.collection(collection, RequestKind::Get)?;
        Ok(stored.records.len())
    }

    fn index_get(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Option<Value>> {
        let stored = self.collection(collection, RequestKind::Index)?;
        let key_path = stored.index_key_path(collection, index)?;
        Ok(stored.matching(key_path, value).next().map(|(_, r)| r.clone()))
    }

    fn index_get_all(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Vec<Value>> {
        let stored = self.collection(collection, RequestKind::Index)?;
        let key_path = stored.index_key_path(collection, index)?;
        Ok(stored.matching(key_path, value).map(|(_, r)| r.clone()).collect())
    }

    fn index_count(&mut self, collection: &str, index: &str, value: &Value) -> EngineResult<usize> {
        let stored = self.collection(collection, RequestKind::Index)?;
        let key_path = stored.index_key_path(collection, index)?;
        Ok(stored.matching(key_path, value).count())
    }

    fn index_keys(
        &mut self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> EngineResult<Vec<String>> {
        let stored = self.collection(collection, RequestKind::Index)?;
        let key_path = stored.index_key_path(collection, index)?;
        Ok(stored.matching(key_path, value).map(|(k, _)| k.clone()).collect())
    }
}

// ============================================================================
// FAULT INJECTION
// ============================================================================

/// Request kinds a [`Fault`] can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Open,
    Put,
    Get,
    Delete,
    Index,
}

/// Scripted request failure: let `skip` matching requests through, then fail the next `times`
#[derive(Debug, Clone)]
pub struct Fault {
    pub kind: RequestKind,
    pub collection: Option<String>,
    pub skip: usize,
    pub times: usize,
    /// `None` produces a failure without any message
    pub message: Option<String>,
}

impl Fault {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            collection: None,
            skip: 0,
            times: 1,
            message: Some("Injected failure".to_string()),
        }
    }

    pub fn on(mut self, collection: &str) -> Self {
        self.collection = Some(collection.to_string());
        self
    }

    pub fn after(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn without_message(mut self) -> Self {
        self.message = None;
        self
    }
}

impl MemoryEngine {
    /// Script a failure for later requests, used to exercise error paths
    pub fn inject_fault(&self, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(fault);
        }
    }
}

fn check_fault(faults: &Faults, kind: RequestKind, collection: Option<&str>) -> EngineResult<()> {
    let Ok(mut faults) = faults.lock() else {
        return Ok(());
    };
    for fault in faults.iter_mut() {
        let matches = fault.kind == kind
            && fault.times > 0
            && (fault.collection.is_none() || fault.collection.as_deref() == collection);
        if !matches {
            continue;
        }
        if fault.skip > 0 {
            fault.skip -= 1;
            continue;
        }
        fault.times -= 1;
        return Err(EngineError::Request(fault.message.clone()));
    }
    Ok(())
}
