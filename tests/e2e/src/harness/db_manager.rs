//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary SQLite databases that are automatically cleaned up
//! - Pre-seeded databases with test data
//! - Close and re-open against the same file
//! - Database snapshots and restoration

use std::path::{Path, PathBuf};

use charforge_core::{
    CharacterConcept, CharacterDatabase, Cliche, CoreMotivation, DatabaseConfig, DatabaseStats,
    ThematicDirection,
};
use tempfile::TempDir;

/// Every record in the database at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub concepts: Vec<CharacterConcept>,
    pub directions: Vec<ThematicDirection>,
    pub cliches: Vec<Cliche>,
    pub motivations: Vec<CoreMotivation>,
}

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = TestDatabaseManager::new_temp();
///
/// db.database.save_character_concept(&CharacterConcept::new("A cursed knight"))?;
///
/// // Same file, fresh gateway
/// db.reopen();
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The initialized gateway
    pub database: CharacterDatabase,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Directory holding the database file
    data_dir: PathBuf,
    /// Snapshot data for restore operations
    snapshot: Option<Snapshot>,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("charforge");

        Self {
            database: open_database(&data_dir),
            _temp_dir: Some(temp_dir),
            data_dir,
            snapshot: None,
        }
    }

    /// Create a test database in a specific directory
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(data_dir: PathBuf) -> Self {
        Self {
            database: open_database(&data_dir),
            _temp_dir: None,
            data_dir,
            snapshot: None,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the SQLite file backing the database
    pub fn path(&self) -> PathBuf {
        let name = &self.database.config().name;
        self.data_dir.join(format!("{}.db", name))
    }

    pub fn stats(&self) -> DatabaseStats {
        self.database.get_stats().unwrap_or_default()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.stats() == DatabaseStats::default()
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed the database with a number of concepts
    pub fn seed_concepts(&mut self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let concept = CharacterConcept::new(format!("Seeded concept {}", i));
                self.database
                    .save_character_concept(&concept)
                    .expect("Failed to seed concept")
                    .id
            })
            .collect()
    }

    /// Seed one concept with `count` thematic directions, returning the concept id
    pub fn seed_concept_with_directions(&mut self, count: usize) -> (String, Vec<String>) {
        let concept = self
            .database
            .save_character_concept(&CharacterConcept::new("Seeded concept with directions"))
            .expect("Failed to seed concept");

        let directions: Vec<_> = (0..count)
            .map(|i| ThematicDirection::new(&concept.id, format!("Seeded direction {}", i)))
            .collect();
        let saved = self
            .database
            .save_thematic_directions(&directions)
            .expect("Failed to seed directions");

        (concept.id, saved.into_iter().map(|d| d.id).collect())
    }

    // ========================================================================
    // REOPEN / SNAPSHOT / RESTORE
    // ========================================================================

    /// Close the gateway and open a fresh one on the same file
    pub fn reopen(&mut self) {
        self.database.close();
        self.database = open_database(&self.data_dir);
    }

    /// Take a snapshot of current database state
    pub fn take_snapshot(&mut self) {
        let snapshot = Snapshot {
            concepts: self.database.get_all_character_concepts().unwrap_or_default(),
            directions: self.database.get_all_thematic_directions().unwrap_or_default(),
            cliches: self.database.get_all_cliches().unwrap_or_default(),
            motivations: self.database.get_all_core_motivations().unwrap_or_default(),
        };
        self.snapshot = Some(snapshot);
    }

    /// Restore from the last snapshot
    ///
    /// Recreates the database file and saves every record again. Ids and
    /// creation times are preserved.
    pub fn restore_snapshot(&mut self) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };

        self.recreate();
        for concept in &snapshot.concepts {
            let _ = self.database.save_character_concept(concept);
        }
        let _ = self.database.save_thematic_directions(&snapshot.directions);
        for cliche in &snapshot.cliches {
            let _ = self.database.save_cliche(cliche);
        }
        for motivation in &snapshot.motivations {
            let _ = self.database.save_core_motivation(motivation);
        }

        true
    }

    /// Check if a snapshot exists
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Clear all records through the gateway
    pub fn clear(&mut self) {
        if let Ok(concepts) = self.database.get_all_character_concepts() {
            for concept in concepts {
                let _ = self.database.delete_character_concept(&concept.id);
            }
        }
        let _ = self.database.remove_orphaned_directions();
        if let Ok(cliches) = self.database.get_all_cliches() {
            for cliche in cliches {
                let _ = self.database.delete_cliche(&cliche.id);
            }
        }
        if let Ok(motivations) = self.database.get_all_core_motivations() {
            for id in motivations.into_iter().filter_map(|m| m.id) {
                let _ = self.database.delete_core_motivation(&id);
            }
        }
    }

    /// Delete the database file and start over (useful for testing migrations)
    pub fn recreate(&mut self) {
        self.database.close();
        let path = self.path();
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));

        self.database = open_database(&self.data_dir);
    }
}

impl Drop for TestDatabaseManager {
    fn drop(&mut self) {
        self.database.close();
    }
}

fn open_database(data_dir: &Path) -> CharacterDatabase {
    let database = CharacterDatabase::sqlite(DatabaseConfig::with_data_dir(data_dir))
        .expect("Failed to create test database");
    database.initialize().expect("Failed to initialize test database");
    database
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_concepts() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_concepts(10);

        assert_eq!(ids.len(), 10);
        assert_eq!(db.stats().character_concepts, 10);
    }

    #[test]
    fn test_reopen_keeps_records() {
        let mut db = TestDatabaseManager::new_temp();
        let (concept_id, direction_ids) = db.seed_concept_with_directions(3);

        db.reopen();

        let directions = db
            .database
            .get_thematic_directions_by_concept_id(&concept_id)
            .unwrap();
        assert_eq!(directions.len(), direction_ids.len());
    }

    #[test]
    fn test_clear_database() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_concepts(2);
        db.seed_concept_with_directions(2);
        assert!(!db.is_empty());

        db.clear();
        assert!(db.is_empty());
    }

    #[test]
    fn test_snapshot_restore_preserves_ids() {
        let mut db = TestDatabaseManager::new_temp();
        let (concept_id, _) = db.seed_concept_with_directions(2);

        db.take_snapshot();
        assert!(db.has_snapshot());

        db.clear();
        assert!(db.is_empty());

        assert!(db.restore_snapshot());
        assert_eq!(db.stats().thematic_directions, 2);
        assert!(db.database.get_character_concept(&concept_id).unwrap().is_some());
        assert!(!db.restore_snapshot());
    }
}
