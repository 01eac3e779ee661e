//! World queries: NPC schedules, visibility and building hours.

use wayfarer_core::{
    config::GameData,
    world::{BuildingDef, PlaceKind, WorldView},
};

/// Garrick follows his schedule across the day, including the slot that
/// wraps past midnight.
#[test]
fn scheduled_npc_moves_through_the_day() {
    let data = GameData::default_test();
    let garrick = data.npc("garrick").expect("garrick exists");

    assert_eq!(garrick.whereabouts(600), (PlaceKind::Building, "general-store".to_string()));
    assert_eq!(garrick.whereabouts(1250), (PlaceKind::Building, "tavern".to_string()));
    assert_eq!(garrick.whereabouts(1400), (PlaceKind::Building, "garrick-home".to_string()));
    assert_eq!(garrick.whereabouts(120), (PlaceKind::Building, "garrick-home".to_string()));
}

/// NPCs without a schedule stay in their home building.
#[test]
fn unscheduled_npc_stays_home() {
    let data = GameData::default_test();
    let mira = data.npc("mira").unwrap();
    for t in [0, 480, 1000, 1439] {
        assert_eq!(mira.whereabouts(t), (PlaceKind::Building, "tavern".to_string()));
    }
}

/// District-level NPCs are only visible from the street.
#[test]
fn district_npcs_are_seen_outdoors() {
    let data = GameData::default_test();

    let street = data.visible_npcs("kingdom", "center", "", 600);
    assert!(street.contains("town-crier"));
    assert!(!street.contains("garrick"));

    let store = data.visible_npcs("kingdom", "center", "general-store", 600);
    assert!(store.contains("garrick"));
    assert!(!store.contains("town-crier"));

    let market = data.visible_npcs("kingdom", "market", "", 600);
    assert!(market.is_empty(), "the crier works the center only");

    // After 22:00 the crier is in the tavern with mira.
    let tavern = data.visible_npcs("kingdom", "center", "tavern", 1350);
    assert_eq!(tavern.into_iter().collect::<Vec<_>>(), vec!["mira".to_string(), "town-crier".to_string()]);
}

/// Unknown places yield nothing rather than an error.
#[test]
fn unknown_places_are_empty() {
    let data = GameData::default_test();
    assert!(data.visible_npcs("atlantis", "center", "", 600).is_empty());
    assert!(data.building_states("kingdom", "docks", 600).is_empty());
    assert!(!data.has_district("kingdom", "docks"));
    assert!(data.has_district("kingdom", "market"));
    assert!(data.npc("nobody").is_none());
}

/// Building states follow opening hours, wrapping past midnight.
#[test]
fn building_states_follow_hours() {
    let data = GameData::default_test();

    let morning = data.building_states("kingdom", "center", 600);
    assert!(morning["general-store"]);
    assert!(!morning["tavern"]);
    assert!(morning["temple"]);
    assert!(!morning["guild-vault"]);

    let late = data.building_states("kingdom", "center", 60);
    assert!(!late["general-store"]);
    assert!(late["tavern"], "tavern closes at 02:00");

    let smithy = data.building_states("kingdom", "market", 1080);
    assert!(!smithy["smithy"], "closing minute is exclusive");
}

/// Room and vault prices are optional; a building without them offers
/// neither.
#[test]
fn building_prices_are_optional() {
    let inn: BuildingDef = serde_json::from_str(
        r#"{ "id": "inn", "name": "Inn", "open": "always", "room_price": 50 }"#,
    )
    .unwrap();
    assert_eq!(inn.room_price, Some(50));
    assert_eq!(inn.vault_price, None);

    let data = GameData::default_test();
    let bank = data.building("kingdom", "center", "bank").unwrap();
    assert_eq!((bank.room_price, bank.vault_price), (None, Some(25)));
    let tavern = data.building("kingdom", "center", "tavern").unwrap();
    assert_eq!(tavern.room_price, Some(10));
}
