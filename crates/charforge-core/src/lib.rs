//! # Charforge Core
//!
//! Persistence layer for a character-building workflow. A character concept
//! fans out into thematic directions, and each direction collects clichés to
//! avoid and core motivations to build on.
//!
//! - **Versioned schema**: databases open at [`SCHEMA_VERSION`] and migrate forward
//! - **Cascade delete**: removing a concept removes its directions atomically
//! - **Orphan detection**: find and clean up directions whose concept is gone
//! - **Pluggable engines**: [`SqliteEngine`] on disk, [`MemoryEngine`] in process
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use charforge_core::{CharacterConcept, CharacterDatabase, DatabaseConfig, ThematicDirection};
//!
//! let db = CharacterDatabase::sqlite(DatabaseConfig::default())?;
//! db.initialize()?;
//!
//! let concept = db.save_character_concept(&CharacterConcept::new("A tired oracle"))?;
//! db.save_thematic_direction(&ThematicDirection::new(&concept.id, "Prophecy as burden"))?;
//!
//! // Removes the concept and its direction in one transaction
//! db.delete_character_concept(&concept.id)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): bundled SQLite build
//! - `encryption`: SQLCipher build, keyed by `CHARFORGE_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod engine;
pub mod records;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{DatabaseConfig, DATA_DIR_ENV, DEFAULT_DATABASE_NAME};

pub use engine::{
    Connection, Engine, EngineError, EngineResult, MemoryEngine, SqliteEngine, Transaction,
    TransactionMode,
};

pub use records::{
    CharacterConcept, Cliche, ConceptStatus, CoreMotivation, CoreMotivationUpdate,
    DatabaseStats, MetadataEntry, ThematicDirection,
};

pub use storage::{
    CharacterDatabase, ConnectionState, Result, StorageError, MIGRATIONS, SCHEMA_VERSION,
};
