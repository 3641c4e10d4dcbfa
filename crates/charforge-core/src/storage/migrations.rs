//! Database Migrations
//!
//! Schema migration definitions for the character database. Every step is
//! additive: it names the collections and indexes that exist from its
//! version on, and applying it creates only what is missing.

use crate::engine::{EngineResult, IndexSpec, Schema, VersionChange};

/// Collection names
pub const CONCEPTS: &str = "characterConcepts";
pub const DIRECTIONS: &str = "thematicDirections";
pub const CLICHES: &str = "cliches";
pub const MOTIVATIONS: &str = "coreMotivations";
pub const METADATA: &str = "metadata";

/// Index names (each indexes the field of the same name)
pub const CONCEPT_ID_INDEX: &str = "conceptId";
pub const DIRECTION_ID_INDEX: &str = "directionId";
pub const CREATED_AT_INDEX: &str = "createdAt";

const fn non_unique(name: &'static str) -> IndexSpec {
    IndexSpec {
        name,
        key_path: name,
        unique: false,
    }
}

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Character concepts, thematic directions and metadata",
        collections: &[
            CollectionSpec {
                name: CONCEPTS,
                key_path: "id",
                indexes: &[],
            },
            CollectionSpec {
                name: DIRECTIONS,
                key_path: "id",
                indexes: &[non_unique(CONCEPT_ID_INDEX)],
            },
            CollectionSpec {
                name: METADATA,
                key_path: "key",
                indexes: &[],
            },
        ],
    },
    Migration {
        version: 2,
        description: "Cliches keyed by thematic direction",
        collections: &[CollectionSpec {
            name: CLICHES,
            key_path: "id",
            indexes: &[non_unique(DIRECTION_ID_INDEX)],
        }],
    },
    Migration {
        version: 3,
        description: "Core motivations indexed by direction, concept and creation time",
        collections: &[CollectionSpec {
            name: MOTIVATIONS,
            key_path: "id",
            indexes: &[
                non_unique(DIRECTION_ID_INDEX),
                non_unique(CONCEPT_ID_INDEX),
                non_unique(CREATED_AT_INDEX),
            ],
        }],
    },
];

/// Version the gateway opens the database at
pub const SCHEMA_VERSION: u32 = MIGRATIONS[MIGRATIONS.len() - 1].version;

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// Collections (and their indexes) that must exist from this version on
    pub collections: &'static [CollectionSpec],
}

/// A collection and its indexes
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub key_path: &'static str,
    pub indexes: &'static [IndexSpec],
}

/// What an upgrade actually created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub steps_applied: u32,
    pub collections_created: u32,
    pub indexes_created: u32,
}

impl Migration {
    /// Create whatever this step declares that `schema` does not have yet
    pub fn apply(&self, schema: &mut dyn Schema) -> EngineResult<MigrationReport> {
        let mut report = MigrationReport {
            steps_applied: 1,
            ..Default::default()
        };

        for collection in self.collections {
            if !schema.contains(collection.name)? {
                schema.create_collection(collection.name, collection.key_path)?;
                report.collections_created += 1;
            }
            for index in collection.indexes {
                if !schema.contains_index(collection.name, index.name)? {
                    schema.create_index(collection.name, index)?;
                    report.indexes_created += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Apply every step with `old_version < version <= new_version`
pub fn apply_migrations(
    schema: &mut dyn Schema,
    change: VersionChange,
) -> EngineResult<MigrationReport> {
    let mut total = MigrationReport::default();

    for migration in MIGRATIONS {
        if migration.version > change.old_version && migration.version <= change.new_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            let report = migration.apply(schema)?;
            total.steps_applied += report.steps_applied;
            total.collections_created += report.collections_created;
            total.indexes_created += report.indexes_created;
        }
    }

    Ok(total)
}
