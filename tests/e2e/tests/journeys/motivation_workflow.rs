//! # Core Motivation Workflow Journey
//!
//! Motivations are generated for a direction in bulk, listed newest first,
//! edited, and cleared when the direction is regenerated.

use charforge_core::{CoreMotivation, CoreMotivationUpdate, StorageError};
use charforge_e2e_tests::{TestDataFactory, TestDatabaseManager};
use chrono::{TimeZone, Utc};

#[test]
fn test_bulk_generation_lists_newest_first() {
    let db = TestDatabaseManager::new_temp();
    let concept = TestDataFactory::create_concept(&db.database, "A healer who cannot feel pain");
    let direction = TestDataFactory::create_directions(&db.database, &concept.id, 1).remove(0);

    let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let batch = TestDataFactory::dated_motivations(&direction, 4, start);
    let saved = db.database.save_core_motivations(&batch).unwrap();
    assert_eq!(saved.len(), 4);
    assert!(saved.iter().all(|m| m.id.is_some()));

    let listed = db
        .database
        .get_core_motivations_by_direction_id(&direction.id)
        .unwrap();
    let times: Vec<_> = listed.iter().map(|m| m.created_at.unwrap()).collect();
    let mut expected = times.clone();
    expected.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, expected);
    assert_eq!(times[0], start + chrono::Duration::hours(3));

    assert_eq!(
        db.database
            .get_core_motivations_by_concept_id(&concept.id)
            .unwrap()
            .len(),
        4
    );
    assert!(db.database.has_core_motivations_for_direction(&direction.id));
    assert_eq!(db.database.get_core_motivations_count(&direction.id), 4);
}

#[test]
fn test_edit_keeps_identity_across_restart() {
    let mut db = TestDatabaseManager::new_temp();
    let direction = TestDataFactory::direction("concept-1", 0);
    let saved = db
        .database
        .save_core_motivation(&TestDataFactory::motivation(&direction, 0))
        .unwrap();
    let id = saved.id.clone().unwrap();

    let update = CoreMotivationUpdate {
        core_desire: Some("To be the last one standing".to_string()),
        central_question: Some("Is survival a victory?".to_string()),
        ..Default::default()
    };
    db.database.update_core_motivation(&id, &update).unwrap();
    db.reopen();

    let stored = db.database.get_core_motivation(&id).unwrap().unwrap();
    assert_eq!(stored.core_desire, "To be the last one standing");
    assert_eq!(stored.central_question.as_deref(), Some("Is survival a victory?"));
    assert_eq!(stored.internal_contradiction, saved.internal_contradiction);
    assert_eq!(stored.created_at, saved.created_at);
}

#[test]
fn test_update_of_unknown_motivation_fails() {
    let db = TestDatabaseManager::new_temp();
    let err = db
        .database
        .update_core_motivation("no-such-motivation", &CoreMotivationUpdate::default())
        .unwrap_err();

    assert!(matches!(err, StorageError::NotFound { .. }));
    assert_eq!(err.to_string(), "Core motivation no-such-motivation not found");
}

#[test]
fn test_invalid_motivations_are_rejected_before_storage() {
    let db = TestDatabaseManager::new_temp();

    let err = db
        .database
        .save_core_motivation(&CoreMotivation::new("dir-1", "", "To be seen"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Concept ID is required");

    let err = db.database.save_core_motivations(&[]).unwrap_err();
    assert_eq!(err.to_string(), "Motivations must be a non-empty list");
    assert_eq!(db.stats().core_motivations, 0);
}

#[test]
fn test_regenerating_a_direction_clears_its_motivations() {
    let db = TestDatabaseManager::new_temp();
    let scenario = TestDataFactory::create_character_scenario(&db.database);
    let first_direction = &scenario.direction_ids[0];
    let second_direction = &scenario.direction_ids[1];

    assert_eq!(
        db.database
            .delete_all_core_motivations_for_direction(first_direction)
            .unwrap(),
        2
    );
    assert!(!db.database.has_core_motivations_for_direction(first_direction));
    assert_eq!(db.database.get_core_motivations_count(second_direction), 1);

    let motivation_id = &scenario.motivation_ids[2];
    assert!(db.database.delete_core_motivation(motivation_id).unwrap());
    assert!(!db.database.delete_core_motivation(motivation_id).unwrap());
    assert_eq!(db.stats().core_motivations, 0);
}

#[test]
fn test_cliches_are_found_by_direction() {
    let db = TestDatabaseManager::new_temp();
    let concept = TestDataFactory::create_concept(&db.database, "A knight sworn to a dead king");
    let direction = TestDataFactory::create_directions(&db.database, &concept.id, 1).remove(0);
    let cliche = TestDataFactory::create_cliche(&db.database, &direction);

    let found = db
        .database
        .get_cliche_by_direction_id(&direction.id)
        .unwrap()
        .unwrap();
    assert_eq!(found, cliche);
    assert_eq!(found.categories["names"][0], "Raven");
}
