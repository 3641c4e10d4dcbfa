//! Storage Module
//!
//! Character database gateway on top of the store engine:
//! - Versioned schema with additive migrations
//! - CRUD and indexed lookups for every record collection
//! - Cascading concept deletion and orphan cleanup
//! - Normalized `Failed to <action>: <reason>` errors

mod database;
mod migrations;

pub use database::{CharacterDatabase, ConnectionState, Result, StorageError};
pub use migrations::{
    apply_migrations, CollectionSpec, Migration, MigrationReport, CLICHES, CONCEPTS,
    CONCEPT_ID_INDEX, CREATED_AT_INDEX, DIRECTIONS, DIRECTION_ID_INDEX, METADATA, MIGRATIONS,
    MOTIVATIONS, SCHEMA_VERSION,
};
