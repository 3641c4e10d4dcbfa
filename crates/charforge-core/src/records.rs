//! Character Builder Records
//!
//! Record shapes stored by the gateway. Field names serialize in camelCase
//! because the index key paths (`conceptId`, `directionId`, `createdAt`)
//! address them directly. Every record keeps a flattened `extra` map so
//! fields this crate does not model survive a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// CONCEPTS
// ============================================================================
//
// Only the key field is required when reading. Records written by older
// builds or other tools may lack anything else.

/// Lifecycle status of a character concept
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConceptStatus {
    #[default]
    Draft,
    Processing,
    Completed,
    Error,
}

/// A character concept, the root every other record hangs off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterConcept {
    pub id: String,
    /// Free-form concept text entered by the user
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub status: ConceptStatus,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterConcept {
    /// New draft concept with a random id
    pub fn new(concept: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            concept: concept.into(),
            status: ConceptStatus::Draft,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// THEMATIC DIRECTIONS
// ============================================================================

/// A thematic direction generated for a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThematicDirection {
    pub id: String,
    /// Back-reference to [`CharacterConcept::id`]
    #[serde(default)]
    pub concept_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_tension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_twist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_potential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThematicDirection {
    pub fn new(concept_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            concept_id: concept_id.into(),
            title: title.into(),
            description: String::new(),
            core_tension: None,
            unique_twist: None,
            narrative_potential: None,
            created_at: Some(Utc::now()),
            extra: Map::new(),
        }
    }
}

// ============================================================================
// CLICHES
// ============================================================================

/// Clichés to avoid for one thematic direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliche {
    pub id: String,
    #[serde(default)]
    pub direction_id: String,
    #[serde(default)]
    pub concept_id: String,
    /// Category name to the clichés listed under it
    #[serde(default)]
    pub categories: Map<String, Value>,
    #[serde(default)]
    pub tropes_and_stereotypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cliche {
    pub fn new(direction_id: impl Into<String>, concept_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            direction_id: direction_id.into(),
            concept_id: concept_id.into(),
            categories: Map::new(),
            tropes_and_stereotypes: Vec::new(),
            created_at: Some(Utc::now()),
            extra: Map::new(),
        }
    }
}

// ============================================================================
// CORE MOTIVATIONS
// ============================================================================

/// A core motivation for a direction
///
/// `id` and `created_at` are assigned on first save when absent and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreMotivation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub direction_id: String,
    #[serde(default)]
    pub concept_id: String,
    #[serde(default)]
    pub core_desire: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_contradiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CoreMotivation {
    /// Unsaved motivation, without id or creation time
    pub fn new(
        direction_id: impl Into<String>,
        concept_id: impl Into<String>,
        core_desire: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            direction_id: direction_id.into(),
            concept_id: concept_id.into(),
            core_desire: core_desire.into(),
            internal_contradiction: None,
            central_question: None,
            created_at: None,
            extra: Map::new(),
        }
    }
}

/// Partial update merged over a stored [`CoreMotivation`]
///
/// `id` and `createdAt` in `extra` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreMotivationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_desire: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_contradiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_question: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// METADATA & STATS
// ============================================================================

/// Free-form key/value entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

/// Record counts per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub character_concepts: usize,
    pub thematic_directions: usize,
    pub cliches: usize,
    pub core_motivations: usize,
    pub metadata_entries: usize,
}
