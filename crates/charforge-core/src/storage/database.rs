//! Character Database Gateway
//!
//! Owns the connection lifecycle to the versioned character store and
//! exposes CRUD and indexed queries over concepts, thematic directions,
//! clichés, core motivations and metadata. Concept deletion cascades to
//! directions inside one transaction; orphaned directions can be detected
//! and cleaned up explicitly since the store has no foreign keys.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::migrations::{
    apply_migrations, CLICHES, CONCEPTS, CONCEPT_ID_INDEX, DIRECTIONS, DIRECTION_ID_INDEX,
    METADATA, MOTIVATIONS, SCHEMA_VERSION,
};
use crate::config::DatabaseConfig;
use crate::engine::{
    Connection, Engine, EngineError, EngineResult, Schema, SqliteEngine, Transaction,
    TransactionMode, VersionChange,
};
use crate::records::{
    CharacterConcept, Cliche, CoreMotivation, CoreMotivationUpdate, DatabaseStats, MetadataEntry,
    ThematicDirection,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Operation attempted before `initialize()` (or after `close()`)
    #[error("Database not initialized")]
    NotInitialized,
    /// Input rejected before touching the store
    #[error("{0}")]
    Validation(String),
    /// Record required by the operation does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    /// Store operation failed
    #[error("Failed to {action}: {reason}")]
    Operation { action: String, reason: String },
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// CONNECTION STATE
// ============================================================================

/// Gateway lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Opening,
    Ready,
    Closed,
}

struct Inner {
    state: ConnectionState,
    connection: Option<Arc<dyn Connection>>,
}

/// Gateway over the character store
///
/// All methods take `&self`; the connection is shared behind a mutex-guarded
/// handle, so `CharacterDatabase` is `Send + Sync`.
pub struct CharacterDatabase {
    engine: Arc<dyn Engine>,
    config: DatabaseConfig,
    inner: Mutex<Inner>,
}

impl CharacterDatabase {
    /// Gateway over `engine` with the default config. Call [`initialize`](Self::initialize) before use.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_config(engine, DatabaseConfig::default())
    }

    pub fn with_config(engine: Arc<dyn Engine>, config: DatabaseConfig) -> Self {
        Self {
            engine,
            config,
            inner: Mutex::new(Inner {
                state: ConnectionState::Uninitialized,
                connection: None,
            }),
        }
    }

    /// Gateway over a [`SqliteEngine`] in the configured data directory
    pub fn sqlite(config: DatabaseConfig) -> Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        Ok(Self::with_config(Arc::new(SqliteEngine::new(data_dir)), config))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Init("Connection state lock poisoned".into()))
    }

    pub fn state(&self) -> ConnectionState {
        self.lock()
            .map(|inner| inner.state)
            .unwrap_or(ConnectionState::Uninitialized)
    }

    /// Version of the open database, `None` unless ready
    pub fn schema_version(&self) -> Option<u32> {
        self.connection().ok().map(|conn| conn.version())
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Open the store at the current schema version, migrating as needed.
    ///
    /// A no-op when already ready. On failure the gateway stays
    /// uninitialized and the call can be retried.
    pub fn initialize(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.state == ConnectionState::Ready {
            debug!("Character database already initialized");
            return Ok(());
        }

        inner.state = ConnectionState::Opening;
        info!(
            database = %self.config.name,
            version = SCHEMA_VERSION,
            "Opening character database"
        );

        let mut upgrade = |schema: &mut dyn Schema, change: VersionChange| -> EngineResult<()> {
            info!(
                "Upgrading character database from v{} to v{}",
                change.old_version, change.new_version
            );
            let report = apply_migrations(schema, change)?;
            info!(
                "Schema upgrade created {} collections and {} indexes",
                report.collections_created, report.indexes_created
            );
            Ok(())
        };

        match self.engine.open(&self.config.name, SCHEMA_VERSION, &mut upgrade) {
            Ok(connection) => {
                inner.connection = Some(connection);
                inner.state = ConnectionState::Ready;
                info!("Character database initialized");
                Ok(())
            }
            Err(e) => {
                inner.state = ConnectionState::Uninitialized;
                Err(Self::failure("open database", e))
            }
        }
    }

    /// Release the connection. A no-op unless ready.
    pub fn close(&self) {
        let Ok(mut inner) = self.lock() else {
            return;
        };
        if inner.state != ConnectionState::Ready {
            debug!("Character database not open, nothing to close");
            return;
        }
        if let Some(connection) = inner.connection.take() {
            connection.close();
        }
        inner.state = ConnectionState::Closed;
        info!("Character database closed");
    }

    /// Fail with [`StorageError::NotInitialized`] unless ready
    fn ensure_ready(&self) -> Result<()> {
        self.connection().map(|_| ())
    }

    fn connection(&self) -> Result<Arc<dyn Connection>> {
        let inner = self.lock()?;
        match (&inner.state, &inner.connection) {
            (ConnectionState::Ready, Some(connection)) => Ok(Arc::clone(connection)),
            _ => Err(StorageError::NotInitialized),
        }
    }

    // ========================================================================
    // REQUEST HELPERS
    // ========================================================================

    /// Normalize and log a store failure
    fn failure(action: &str, err: EngineError) -> StorageError {
        let reason = err.reason().unwrap_or_else(|| "Unknown error".to_string());
        error!("Failed to {}: {}", action, reason);
        StorageError::Operation {
            action: action.to_string(),
            reason,
        }
    }

    /// Run `body` in one transaction over `scope`, normalizing any failure
    fn request<T>(
        &self,
        action: &str,
        scope: &[&str],
        mode: TransactionMode,
        body: impl FnOnce(&mut dyn Transaction) -> EngineResult<T>,
    ) -> Result<T> {
        let connection = self.connection()?;

        let mut body = Some(body);
        let mut output = None;
        let mut run_once = |tx: &mut dyn Transaction| -> EngineResult<()> {
            let run = body
                .take()
                .ok_or_else(|| EngineError::Request(Some("Transaction body ran twice".into())))?;
            output = Some(run(tx)?);
            Ok(())
        };
        let outcome = connection.transaction(scope, mode, &mut run_once);

        match (outcome, output) {
            (Ok(()), Some(output)) => Ok(output),
            (Ok(()), None) => Err(Self::failure(action, EngineError::Request(None))),
            (Err(e), _) => Err(Self::failure(action, e)),
        }
    }

    fn read<T>(
        &self,
        action: &str,
        scope: &[&str],
        body: impl FnOnce(&mut dyn Transaction) -> EngineResult<T>,
    ) -> Result<T> {
        self.request(action, scope, TransactionMode::ReadOnly, body)
    }

    fn write<T>(
        &self,
        action: &str,
        scope: &[&str],
        body: impl FnOnce(&mut dyn Transaction) -> EngineResult<T>,
    ) -> Result<T> {
        self.request(action, scope, TransactionMode::ReadWrite, body)
    }

    /// Upsert one typed record
    fn put_record<T: Serialize>(&self, action: &str, collection: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record).map_err(|e| Self::failure(action, e.into()))?;
        self.write(action, &[collection], |tx| tx.put(collection, value))?;
        Ok(())
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        action: &str,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        self.read(action, &[collection], |tx| {
            tx.get(collection, id)?.map(decode).transpose()
        })
    }

    fn get_all_records<T: DeserializeOwned>(&self, action: &str, collection: &str) -> Result<Vec<T>> {
        self.read(action, &[collection], |tx| decode_all(tx.get_all(collection)?))
    }

    fn delete_record(&self, action: &str, collection: &str, id: &str) -> Result<bool> {
        self.write(action, &[collection], |tx| tx.delete(collection, id))?;
        Ok(true)
    }

    // ========================================================================
    // CHARACTER CONCEPTS
    // ========================================================================

    /// Save (insert or overwrite) a character concept
    pub fn save_character_concept(&self, concept: &CharacterConcept) -> Result<CharacterConcept> {
        self.ensure_ready()?;
        require_id("Concept", &concept.id)?;
        self.put_record("save character concept", CONCEPTS, concept)?;
        debug!(concept_id = %concept.id, "Saved character concept");
        Ok(concept.clone())
    }

    pub fn get_character_concept(&self, id: &str) -> Result<Option<CharacterConcept>> {
        self.ensure_ready()?;
        require_id("Concept", id)?;
        self.get_record("get character concept", CONCEPTS, id)
    }

    pub fn get_all_character_concepts(&self) -> Result<Vec<CharacterConcept>> {
        self.get_all_records("get all character concepts", CONCEPTS)
    }

    /// Delete a concept together with every thematic direction that references it.
    ///
    /// Both collections are changed in one transaction: either everything is
    /// removed or nothing is.
    pub fn delete_character_concept(&self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        require_id("Concept", id)?;
        let key = Value::from(id);
        let directions_removed =
            self.write("delete character concept", &[CONCEPTS, DIRECTIONS], |tx| {
                tx.delete(CONCEPTS, id)?;
                let mut removed = 0;
                for direction_id in tx.index_keys(DIRECTIONS, CONCEPT_ID_INDEX, &key)? {
                    tx.delete(DIRECTIONS, &direction_id)?;
                    removed += 1;
                }
                Ok(removed)
            })?;

        info!(
            "Deleted character concept {} and {} associated thematic directions",
            id, directions_removed
        );
        Ok(true)
    }

    // ========================================================================
    // THEMATIC DIRECTIONS
    // ========================================================================

    pub fn save_thematic_direction(&self, direction: &ThematicDirection) -> Result<ThematicDirection> {
        self.ensure_ready()?;
        require_id("Direction", &direction.id)?;
        self.put_record("save thematic direction", DIRECTIONS, direction)?;
        Ok(direction.clone())
    }

    /// Save a batch of directions in one transaction. An empty batch returns immediately.
    pub fn save_thematic_directions(
        &self,
        directions: &[ThematicDirection],
    ) -> Result<Vec<ThematicDirection>> {
        self.ensure_ready()?;
        if directions.is_empty() {
            return Ok(Vec::new());
        }
        for direction in directions {
            require_id("Direction", &direction.id)?;
        }

        let action = "save thematic directions";
        let values = directions
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Self::failure(action, e.into()))?;
        self.write(action, &[DIRECTIONS], |tx| {
            for value in values {
                tx.put(DIRECTIONS, value)?;
            }
            Ok(())
        })?;

        info!("Saved {} thematic directions", directions.len());
        Ok(directions.to_vec())
    }

    pub fn get_thematic_direction(&self, id: &str) -> Result<Option<ThematicDirection>> {
        self.ensure_ready()?;
        require_id("Direction", id)?;
        self.get_record("get thematic direction", DIRECTIONS, id)
    }

    pub fn get_all_thematic_directions(&self) -> Result<Vec<ThematicDirection>> {
        self.get_all_records("get all thematic directions", DIRECTIONS)
    }

    pub fn get_thematic_directions_by_concept_id(
        &self,
        concept_id: &str,
    ) -> Result<Vec<ThematicDirection>> {
        self.ensure_ready()?;
        require_id("Concept", concept_id)?;
        let key = Value::from(concept_id);
        self.read("get thematic directions by concept", &[DIRECTIONS], |tx| {
            decode_all(tx.index_get_all(DIRECTIONS, CONCEPT_ID_INDEX, &key)?)
        })
    }

    pub fn delete_thematic_direction(&self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        require_id("Direction", id)?;
        self.delete_record("delete thematic direction", DIRECTIONS, id)
    }

    /// Directions whose concept no longer exists.
    ///
    /// Only the presence of the concept record is checked, not its shape. A
    /// failed lookup counts as "concept missing" so one bad record does not
    /// abort the scan.
    pub fn find_orphaned_directions(&self) -> Result<Vec<ThematicDirection>> {
        let directions = self.get_all_thematic_directions()?;

        let mut orphaned = Vec::new();
        for direction in directions {
            match self.concept_exists(&direction.concept_id) {
                Ok(true) => {}
                Ok(false) => orphaned.push(direction),
                Err(e) => {
                    warn!(
                        direction_id = %direction.id,
                        "Concept lookup failed, treating direction as orphaned: {}", e
                    );
                    orphaned.push(direction);
                }
            }
        }

        info!("Found {} orphaned thematic directions", orphaned.len());
        Ok(orphaned)
    }

    fn concept_exists(&self, id: &str) -> Result<bool> {
        self.read("get character concept", &[CONCEPTS], |tx| {
            Ok(tx.get(CONCEPTS, id)?.is_some())
        })
    }

    /// Delete every orphaned direction, returning how many were removed
    pub fn remove_orphaned_directions(&self) -> Result<usize> {
        let orphaned = self.find_orphaned_directions()?;

        let mut removed = 0;
        for direction in &orphaned {
            match self.delete_thematic_direction(&direction.id) {
                Ok(_) => removed += 1,
                Err(e) => warn!("Failed to remove orphaned direction {}: {}", direction.id, e),
            }
        }

        info!("Removed {} of {} orphaned thematic directions", removed, orphaned.len());
        Ok(removed)
    }

    // ========================================================================
    // CLICHES
    // ========================================================================

    pub fn save_cliche(&self, cliche: &Cliche) -> Result<Cliche> {
        self.ensure_ready()?;
        require_id("Cliche", &cliche.id)?;
        self.put_record("save cliche", CLICHES, cliche)?;
        debug!(cliche_id = %cliche.id, direction_id = %cliche.direction_id, "Saved cliche");
        Ok(cliche.clone())
    }

    pub fn get_cliche(&self, id: &str) -> Result<Option<Cliche>> {
        self.ensure_ready()?;
        require_id("Cliche", id)?;
        self.get_record("get cliche", CLICHES, id)
    }

    /// Clichés for a direction (first match on the `directionId` index)
    pub fn get_cliche_by_direction_id(&self, direction_id: &str) -> Result<Option<Cliche>> {
        self.ensure_ready()?;
        require_id("Direction", direction_id)?;
        let key = Value::from(direction_id);
        self.read("get cliche by direction", &[CLICHES], |tx| {
            tx.index_get(CLICHES, DIRECTION_ID_INDEX, &key)?
                .map(decode)
                .transpose()
        })
    }

    pub fn get_all_cliches(&self) -> Result<Vec<Cliche>> {
        self.get_all_records("get all cliches", CLICHES)
    }

    pub fn delete_cliche(&self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        require_id("Cliche", id)?;
        self.delete_record("delete cliche", CLICHES, id)
    }

    // ========================================================================
    // CORE MOTIVATIONS
    // ========================================================================

    /// Save a core motivation, assigning `id` and `created_at` when absent
    pub fn save_core_motivation(&self, motivation: &CoreMotivation) -> Result<CoreMotivation> {
        self.ensure_ready()?;
        validate_motivation(motivation)?;

        let mut record = motivation.clone();
        if record.id.as_deref().is_none_or(|id| id.trim().is_empty()) {
            record.id = Some(Uuid::new_v4().to_string());
        }
        if record.created_at.is_none() {
            record.created_at = Some(Utc::now());
        }

        self.put_record("save core motivation", MOTIVATIONS, &record)?;
        debug!(
            motivation_id = record.id.as_deref().unwrap_or_default(),
            direction_id = %record.direction_id,
            "Saved core motivation"
        );
        Ok(record)
    }

    /// Save each motivation on its own; failures are logged and left out of the result
    pub fn save_core_motivations(&self, motivations: &[CoreMotivation]) -> Result<Vec<CoreMotivation>> {
        self.ensure_ready()?;
        if motivations.is_empty() {
            return Err(StorageError::Validation(
                "Motivations must be a non-empty list".to_string(),
            ));
        }

        let mut saved = Vec::with_capacity(motivations.len());
        for motivation in motivations {
            match self.save_core_motivation(motivation) {
                Ok(record) => saved.push(record),
                Err(e) => warn!("Failed to save core motivation: {}", e),
            }
        }

        info!("Saved {} of {} core motivations", saved.len(), motivations.len());
        Ok(saved)
    }

    pub fn get_core_motivation(&self, id: &str) -> Result<Option<CoreMotivation>> {
        self.ensure_ready()?;
        require_id("Motivation", id)?;
        self.get_record("get core motivation", MOTIVATIONS, id)
    }

    pub fn get_all_core_motivations(&self) -> Result<Vec<CoreMotivation>> {
        let mut motivations = self.get_all_records("get all core motivations", MOTIVATIONS)?;
        newest_first(&mut motivations);
        Ok(motivations)
    }

    /// Motivations for a direction, newest first
    pub fn get_core_motivations_by_direction_id(
        &self,
        direction_id: &str,
    ) -> Result<Vec<CoreMotivation>> {
        self.ensure_ready()?;
        require_id("Direction", direction_id)?;
        self.motivations_by_index(
            "get core motivations by direction",
            DIRECTION_ID_INDEX,
            direction_id,
        )
    }

    /// Motivations for a concept, newest first
    pub fn get_core_motivations_by_concept_id(
        &self,
        concept_id: &str,
    ) -> Result<Vec<CoreMotivation>> {
        self.ensure_ready()?;
        require_id("Concept", concept_id)?;
        self.motivations_by_index("get core motivations by concept", CONCEPT_ID_INDEX, concept_id)
    }

    fn motivations_by_index(
        &self,
        action: &str,
        index: &str,
        id: &str,
    ) -> Result<Vec<CoreMotivation>> {
        let key = Value::from(id);
        let mut motivations = self.read(action, &[MOTIVATIONS], |tx| {
            decode_all(tx.index_get_all(MOTIVATIONS, index, &key)?)
        })?;
        newest_first(&mut motivations);
        Ok(motivations)
    }

    /// Delete a motivation. `false` when there was nothing to delete.
    pub fn delete_core_motivation(&self, id: &str) -> Result<bool> {
        if self.get_core_motivation(id)?.is_none() {
            debug!(motivation_id = id, "Core motivation not found, nothing to delete");
            return Ok(false);
        }
        self.delete_record("delete core motivation", MOTIVATIONS, id)
    }

    /// Merge `update` over a stored motivation; `id` and `created_at` never change
    pub fn update_core_motivation(
        &self,
        id: &str,
        update: &CoreMotivationUpdate,
    ) -> Result<CoreMotivation> {
        self.ensure_ready()?;
        require_id("Motivation", id)?;
        let patch = serde_json::to_value(update)
            .map_err(|e| Self::failure("update core motivation", e.into()))?;

        let updated = self.write("update core motivation", &[MOTIVATIONS], |tx| {
            let Some(Value::Object(mut merged)) = tx.get(MOTIVATIONS, id)? else {
                return Ok(None);
            };
            let original_id = merged.get("id").cloned();
            let original_created_at = merged.get("createdAt").cloned();

            if let Value::Object(fields) = patch {
                merged.extend(fields);
            }
            for (field, original) in [("id", original_id), ("createdAt", original_created_at)] {
                match original {
                    Some(value) => merged.insert(field.to_string(), value),
                    None => merged.remove(field),
                };
            }

            let record: CoreMotivation = serde_json::from_value(Value::Object(merged))?;
            tx.put(MOTIVATIONS, serde_json::to_value(&record)?)?;
            Ok(Some(record))
        })?;

        match updated {
            Some(record) => {
                info!(motivation_id = id, "Updated core motivation");
                Ok(record)
            }
            None => {
                error!("Core motivation {} not found for update", id);
                Err(StorageError::NotFound {
                    kind: "Core motivation",
                    id: id.to_string(),
                })
            }
        }
    }

    /// Delete every motivation of a direction, returning how many went away.
    ///
    /// Individual failures are logged and not counted.
    pub fn delete_all_core_motivations_for_direction(&self, direction_id: &str) -> Result<usize> {
        let motivations = self.get_core_motivations_by_direction_id(direction_id)?;

        let mut deleted = 0;
        for motivation in &motivations {
            let Some(id) = motivation.id.as_deref() else {
                continue;
            };
            match self.delete_core_motivation(id) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to delete core motivation {}: {}", id, e),
            }
        }

        info!(
            "Deleted {} core motivations for direction {}",
            deleted, direction_id
        );
        Ok(deleted)
    }

    /// Whether a direction has any motivations; `false` on error
    pub fn has_core_motivations_for_direction(&self, direction_id: &str) -> bool {
        self.get_core_motivations_count(direction_id) > 0
    }

    /// Number of motivations for a direction; 0 on error
    pub fn get_core_motivations_count(&self, direction_id: &str) -> usize {
        let key = Value::from(direction_id);
        let result = self.ensure_ready().and_then(|_| {
            require_id("Direction", direction_id)?;
            self.read("count core motivations", &[MOTIVATIONS], |tx| {
                tx.index_count(MOTIVATIONS, DIRECTION_ID_INDEX, &key)
            })
        });
        match result {
            Ok(count) => count,
            Err(e) => {
                debug!("Counting core motivations degraded to 0: {}", e);
                0
            }
        }
    }

    // ========================================================================
    // METADATA
    // ========================================================================

    pub fn save_metadata(&self, key: &str, value: Value) -> Result<()> {
        self.ensure_ready()?;
        require_key(key)?;
        let entry = MetadataEntry {
            key: key.to_string(),
            value,
            timestamp: Utc::now(),
        };
        self.put_record("save metadata", METADATA, &entry)
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<Value>> {
        self.ensure_ready()?;
        require_key(key)?;
        let entry: Option<MetadataEntry> = self.get_record("get metadata", METADATA, key)?;
        Ok(entry.map(|e| e.value))
    }

    pub fn get_all_metadata(&self) -> Result<Vec<MetadataEntry>> {
        self.get_all_records("get all metadata", METADATA)
    }

    pub fn delete_metadata(&self, key: &str) -> Result<bool> {
        self.ensure_ready()?;
        require_key(key)?;
        self.delete_record("delete metadata", METADATA, key)
    }

    // ========================================================================
    // STATS
    // ========================================================================

    /// Record counts for every collection, read in one transaction
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        self.read(
            "get database stats",
            &[CONCEPTS, DIRECTIONS, CLICHES, MOTIVATIONS, METADATA],
            |tx| {
                Ok(DatabaseStats {
                    character_concepts: tx.count(CONCEPTS)?,
                    thematic_directions: tx.count(DIRECTIONS)?,
                    cliches: tx.count(CLICHES)?,
                    core_motivations: tx.count(MOTIVATIONS)?,
                    metadata_entries: tx.count(METADATA)?,
                })
            },
        )
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn decode<T: DeserializeOwned>(value: Value) -> EngineResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> EngineResult<Vec<T>> {
    values.into_iter().map(decode).collect()
}

fn require_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(StorageError::Validation(format!("{} ID is required", kind)));
    }
    Ok(())
}

fn require_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StorageError::Validation("Metadata key is required".to_string()));
    }
    Ok(())
}

fn validate_motivation(motivation: &CoreMotivation) -> Result<()> {
    let required = [
        (&motivation.direction_id, "Direction ID is required"),
        (&motivation.concept_id, "Concept ID is required"),
        (&motivation.core_desire, "Core desire is required"),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(StorageError::Validation(message.to_string()));
        }
    }
    Ok(())
}

/// Sort by `created_at` descending; undated records go last
fn newest_first(motivations: &mut [CoreMotivation]) {
    motivations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
