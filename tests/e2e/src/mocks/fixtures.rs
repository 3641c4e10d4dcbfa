//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Concepts, directions, clichés and motivations with plausible content
//! - Batches of motivations with controlled creation times
//! - Pre-built scenarios for common test cases

use std::collections::HashMap;

use charforge_core::{
    CharacterConcept, CharacterDatabase, Cliche, CoreMotivation, ThematicDirection,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let concept = TestDataFactory::create_concept(&db, "A tired oracle");
/// let directions = TestDataFactory::create_directions(&db, &concept.id, 3);
///
/// let scenario = TestDataFactory::create_character_scenario(&db);
/// ```
pub struct TestDataFactory;

/// Ids created for a scenario
#[derive(Debug, Clone, Default)]
pub struct TestScenario {
    pub concept_ids: Vec<String>,
    pub direction_ids: Vec<String>,
    pub motivation_ids: Vec<String>,
    /// Description of the scenario
    pub description: String,
    /// Named ids for lookups in assertions
    pub metadata: HashMap<String, String>,
}

const CONCEPTS: &[&str] = &[
    "A lighthouse keeper who hoards undelivered letters",
    "A disgraced royal cartographer mapping forbidden borders",
    "A retired assassin running a bakery in a border town",
    "A choir singer who can hear the dead harmonize",
    "A clockmaker whose repairs slowly change the past",
];

const DESIRES: &[&str] = &[
    "To be forgiven by someone who is gone",
    "To prove that loyalty can be chosen",
    "To belong somewhere without earning it",
    "To leave something that outlasts the lie",
];

impl TestDataFactory {
    // ========================================================================
    // SINGLE RECORDS
    // ========================================================================

    pub fn create_concept(db: &CharacterDatabase, text: &str) -> CharacterConcept {
        db.save_character_concept(&CharacterConcept::new(text))
            .expect("Failed to save concept")
    }

    pub fn create_directions(
        db: &CharacterDatabase,
        concept_id: &str,
        count: usize,
    ) -> Vec<ThematicDirection> {
        let directions: Vec<_> = (0..count)
            .map(|i| Self::direction(concept_id, i))
            .collect();
        db.save_thematic_directions(&directions)
            .expect("Failed to save directions")
    }

    /// Unsaved direction with every narrative field filled in
    pub fn direction(concept_id: &str, seed: usize) -> ThematicDirection {
        let mut direction = ThematicDirection::new(concept_id, format!("Direction {}", seed));
        direction.description = Self::lorem_content(12, seed);
        direction.core_tension = Some("Duty against desire".to_string());
        direction.unique_twist = Some(format!("Twist number {}", seed));
        direction.narrative_potential = Some("Slow-burn reckoning".to_string());
        direction
    }

    pub fn create_cliche(db: &CharacterDatabase, direction: &ThematicDirection) -> Cliche {
        let mut cliche = Cliche::new(&direction.id, &direction.concept_id);
        cliche
            .categories
            .insert("names".to_string(), json!(["Raven", "Shadow", "Blade"]));
        cliche
            .categories
            .insert("personalityTraits".to_string(), json!(["brooding loner"]));
        cliche.tropes_and_stereotypes = vec!["The Chosen One".to_string()];
        db.save_cliche(&cliche).expect("Failed to save cliche")
    }

    pub fn motivation(direction: &ThematicDirection, seed: usize) -> CoreMotivation {
        let desire = DESIRES[seed % DESIRES.len()];
        let mut motivation = CoreMotivation::new(&direction.id, &direction.concept_id, desire);
        motivation.internal_contradiction = Some("Wants closeness, fears being known".to_string());
        motivation.central_question = Some(format!("What is owed after attempt {}?", seed));
        motivation
    }

    /// Motivations created one hour apart, oldest first
    pub fn dated_motivations(
        direction: &ThematicDirection,
        count: usize,
        start: DateTime<Utc>,
    ) -> Vec<CoreMotivation> {
        (0..count)
            .map(|i| {
                let mut motivation = Self::motivation(direction, i);
                motivation.created_at = Some(start + Duration::hours(i as i64));
                motivation
            })
            .collect()
    }

    // ========================================================================
    // SCENARIO CREATION
    // ========================================================================

    /// Two concepts, the first with two directions and motivations, the
    /// second with one direction and a cliché
    pub fn create_character_scenario(db: &CharacterDatabase) -> TestScenario {
        let mut scenario = TestScenario {
            description: "Two concepts with directions, motivations and cliches".to_string(),
            ..Default::default()
        };

        let primary = Self::create_concept(db, CONCEPTS[0]);
        let secondary = Self::create_concept(db, CONCEPTS[1]);
        scenario.metadata.insert("primary".to_string(), primary.id.clone());
        scenario.metadata.insert("secondary".to_string(), secondary.id.clone());

        let primary_directions = Self::create_directions(db, &primary.id, 2);
        let secondary_directions = Self::create_directions(db, &secondary.id, 1);
        Self::create_cliche(db, &secondary_directions[0]);

        let saved = db
            .save_core_motivations(&[
                Self::motivation(&primary_directions[0], 0),
                Self::motivation(&primary_directions[0], 1),
                Self::motivation(&primary_directions[1], 2),
            ])
            .expect("Failed to save motivations");

        scenario.concept_ids = vec![primary.id, secondary.id];
        scenario.direction_ids = primary_directions
            .iter()
            .chain(&secondary_directions)
            .map(|d| d.id.clone())
            .collect();
        scenario.motivation_ids = saved.into_iter().filter_map(|m| m.id).collect();
        scenario
    }

    // ========================================================================
    // UTILITIES
    // ========================================================================

    /// Deterministic filler text
    pub fn lorem_content(words: usize, seed: usize) -> String {
        const WORDS: &[&str] = &[
            "ember", "oath", "harbor", "lantern", "exile", "ledger", "thorn", "tide", "crown",
            "ashes", "compass", "vow",
        ];
        (0..words)
            .map(|i| WORDS[(seed + i * 7) % WORDS.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestDatabaseManager;

    #[test]
    fn test_create_directions() {
        let db = TestDatabaseManager::new_temp();
        let concept = TestDataFactory::create_concept(&db.database, "test concept");
        let directions = TestDataFactory::create_directions(&db.database, &concept.id, 4);

        assert_eq!(directions.len(), 4);
        assert!(directions.iter().all(|d| d.concept_id == concept.id));
        assert_eq!(db.stats().thematic_directions, 4);
    }

    #[test]
    fn test_create_character_scenario() {
        let db = TestDatabaseManager::new_temp();
        let scenario = TestDataFactory::create_character_scenario(&db.database);

        assert_eq!(scenario.concept_ids.len(), 2);
        assert_eq!(scenario.direction_ids.len(), 3);
        assert_eq!(scenario.motivation_ids.len(), 3);
        assert!(scenario.metadata.contains_key("primary"));
        assert!(scenario.metadata.contains_key("secondary"));
        assert_eq!(db.stats().cliches, 1);
    }

    #[test]
    fn test_dated_motivations_are_spaced() {
        let direction = TestDataFactory::direction("concept-1", 0);
        let start = Utc::now();
        let motivations = TestDataFactory::dated_motivations(&direction, 3, start);

        assert_eq!(motivations[2].created_at, Some(start + Duration::hours(2)));
        assert!(motivations.iter().all(|m| m.id.is_none()));
    }

    #[test]
    fn test_lorem_content() {
        let content = TestDataFactory::lorem_content(10, 42);
        assert_eq!(content.split_whitespace().count(), 10);
    }
}
