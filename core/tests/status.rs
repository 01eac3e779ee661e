//! Status reconciliation: encumbrance, fatigue and hunger tiers plus the
//! accumulators that drive the counters.

use wayfarer_core::{
    actions::{self, GameContext},
    character::{Character, Location, MAX_FATIGUE},
    config::GameData,
    effect::ActiveEffect,
    inventory::SlotRef,
    status::{
        encumbrance_percentage, StatusKind, StatusReconciler, FATIGUE_ACCUMULATION,
        HUNGER_ACCUMULATION_HUNGRY, HUNGER_ACCUMULATION_STUFFED, HUNGER_ACCUMULATION_WELLFED,
    },
};

fn character() -> Character {
    Character::new("Tester", Location {
        city:     "kingdom".into(),
        district: "center".into(),
        building: String::new(),
    })
}

fn ids(c: &Character) -> Vec<&str> {
    c.active_effects.iter().map(|e| e.effect_id.as_str()).collect()
}

fn count(c: &Character, effect_id: &str) -> usize {
    c.active_effects.iter().filter(|e| e.effect_id == effect_id).count()
}

/// Fatigue 9 plus a pickup that pushes load to 120% of capacity.
/// One encumbrance pass yields the overweight tier only and leaves the
/// fatigue tier exactly as it was.
#[test]
fn overweight_pickup_leaves_fatigue_tier_alone() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);
    let mut c = character();

    c.fatigue = 9;
    reconciler.reconcile(&mut c, StatusKind::Fatigue);
    reconciler.reconcile(&mut c, StatusKind::Encumbrance);
    assert!(c.has_effect("encumbrance-light"), "empty pack starts light");
    let fatigue_before: Vec<ActiveEffect> =
        c.active_effects.iter().filter(|e| e.effect_id == "fatigued").cloned().collect();
    assert_eq!(fatigue_before.len(), 3, "fatigued has three stat components");

    // 6 ingots × 10 = 60 against a capacity of 5 × 10 STR = 50.
    c.inventory.add_item(&data, "iron-ingot", 6).unwrap();
    let load = encumbrance_percentage(&c, &data).unwrap();
    assert!((load - 120.0).abs() < 1e-9, "expected 120% load, got {load}");
    reconciler.reconcile(&mut c, StatusKind::Encumbrance);

    let overweight: Vec<usize> = c
        .active_effects
        .iter()
        .filter(|e| e.effect_id == "encumbrance-overweight")
        .map(|e| e.effect_index)
        .collect();
    assert_eq!(overweight, vec![0, 1], "exactly one application of encumbrance-overweight");
    assert_eq!(count(&c, "encumbrance-light"), 0);
    assert_eq!(count(&c, "encumbrance-encumbered"), 0);

    let fatigue_after: Vec<ActiveEffect> =
        c.active_effects.iter().filter(|e| e.effect_id == "fatigued").cloned().collect();
    assert_eq!(fatigue_before, fatigue_after, "fatigue tier must be untouched");
}

/// Reconciling twice with no counter change leaves the list identical.
#[test]
fn reconcile_is_idempotent() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);
    let mut c = character();
    c.fatigue = 8;

    let first = reconciler.reconcile(&mut c, StatusKind::Fatigue);
    assert!(first.is_some(), "the first pass applies very-tired");
    let after_first = serde_json::to_string(&c.active_effects).unwrap();

    let second = reconciler.reconcile(&mut c, StatusKind::Fatigue);
    assert!(second.is_none());
    let after_second = serde_json::to_string(&c.active_effects).unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(count(&c, "very-tired"), 2);
}

/// Reconciling a ticking tier keeps its accumulated progress.
#[test]
fn reconcile_preserves_starving_progress() {
    let data = GameData::default_test();
    let ctx = GameContext::new(&data);
    let reconciler = ctx.reconciler();
    let mut c = character();
    c.hunger = 0;
    reconciler.reconcile(&mut c, StatusKind::Hunger);
    assert!(c.has_effect("starving"));

    actions::advance_time(&ctx, &mut c, 200);
    let starving = c.active_effects.iter().find(|e| e.effect_id == "starving").unwrap();
    assert_eq!(starving.tick_accumulator, 200);
    assert_eq!(c.hp, 20);

    actions::advance_time(&ctx, &mut c, 40);
    assert_eq!(c.hp, 19, "progress survived the reconcile after the first advance");
}

/// Moving between tiers swaps the old tier for the new one.
#[test]
fn tier_changes_replace_previous_tier() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);
    let mut c = character();

    c.fatigue = 6;
    reconciler.reconcile(&mut c, StatusKind::Fatigue);
    assert_eq!(count(&c, "tired"), 1);

    c.fatigue = MAX_FATIGUE;
    reconciler.reconcile(&mut c, StatusKind::Fatigue);
    assert_eq!(count(&c, "tired"), 0);
    assert_eq!(count(&c, "exhaustion"), 3);

    c.fatigue = 0;
    reconciler.reconcile(&mut c, StatusKind::Fatigue);
    for id in StatusKind::Fatigue.tier_effects() {
        assert_eq!(count(&c, id), 0, "{id} should be gone when rested");
    }
}

/// Duplicates left by older saves collapse to a single application.
#[test]
fn duplicate_tier_effects_are_collapsed() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);
    let mut c = character();
    c.hunger = 1;
    reconciler.reconcile(&mut c, StatusKind::Hunger);
    let hungry = c.active_effects[0].clone();
    c.active_effects.push(hungry);

    reconciler.reconcile(&mut c, StatusKind::Hunger);
    assert_eq!(count(&c, "hungry"), 1);
}

/// Fatigue accumulates one point per two hours and stops at max.
#[test]
fn fatigue_accumulates_until_max() {
    let data = GameData::default_test();
    let ctx = GameContext::new(&data);
    let mut c = character();
    ctx.reconciler().initialize_on_load(&mut c).unwrap();
    assert!(c.has_effect(FATIGUE_ACCUMULATION));

    actions::advance_time(&ctx, &mut c, 6 * 120);
    assert_eq!(c.fatigue, 6);
    assert!(c.has_effect("tired"));

    actions::advance_time(&ctx, &mut c, 10 * 120);
    assert_eq!(c.fatigue, MAX_FATIGUE);
    assert!(!c.has_effect(FATIGUE_ACCUMULATION), "accumulation stops at max");
    assert!(c.has_effect("exhaustion"));
}

/// The hunger accumulator switches interval with the current tier and
/// keeps partial progress across the switch.
#[test]
fn hunger_interval_follows_tier() {
    let data = GameData::default_test();
    let ctx = GameContext::new(&data);
    let mut c = character();
    c.hunger = 3;
    ctx.reconciler().initialize_on_load(&mut c).unwrap();
    assert!(c.has_effect(HUNGER_ACCUMULATION_STUFFED));
    assert!(c.has_effect("stuffed"));

    // Stuffed drops after 360 minutes, well-fed after a further 240.
    actions::advance_time(&ctx, &mut c, 359);
    assert_eq!(c.hunger, 3);
    actions::advance_time(&ctx, &mut c, 1);
    assert_eq!(c.hunger, 2);
    assert!(!c.has_effect("stuffed"));
    actions::advance_time(&ctx, &mut c, 240);
    assert_eq!(c.hunger, 1);
    assert!(c.has_effect("hungry"));

    actions::advance_time(&ctx, &mut c, 240);
    assert_eq!(c.hunger, 0);
    assert!(c.has_effect("starving"));
    assert!(
        !c.has_effect(HUNGER_ACCUMULATION_STUFFED),
        "hunger accumulation is removed at zero"
    );
}

/// A fresh character gets the accumulator matching its tier.
#[test]
fn ensure_hunger_accumulation_matches_tier() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);

    let mut wellfed = character();
    reconciler.ensure_hunger_accumulation(&mut wellfed).unwrap();
    assert_eq!(ids(&wellfed), vec![HUNGER_ACCUMULATION_WELLFED]);

    let mut hungry = character();
    hungry.hunger = 1;
    reconciler.ensure_hunger_accumulation(&mut hungry).unwrap();
    assert_eq!(ids(&hungry), vec![HUNGER_ACCUMULATION_HUNGRY]);
    reconciler.ensure_hunger_accumulation(&mut hungry).unwrap();
    assert_eq!(hungry.active_effects.len(), 1, "never duplicated");

    let mut starving = character();
    starving.hunger = 0;
    reconciler.ensure_hunger_accumulation(&mut starving).unwrap();
    assert!(starving.active_effects.is_empty());
}

/// Loading renames legacy ids before statuses are re-derived.
#[test]
fn initialize_on_load_migrates_legacy_ids() {
    let data = GameData::default_test();
    let reconciler = StatusReconciler::new(&data, &data);
    let mut c = character();
    c.hunger = 0;
    c.active_effects.push(ActiveEffect {
        effect_id:          "famished".into(),
        effect_index:       0,
        delay_remaining:    0,
        duration_remaining: 0,
        total_duration:     0,
        tick_accumulator:   120,
        applied_at:         0,
    });

    reconciler.initialize_on_load(&mut c).unwrap();
    let starving: Vec<_> = c.active_effects.iter().filter(|e| e.effect_id == "starving").collect();
    assert_eq!(starving.len(), 1);
    assert_eq!(starving[0].tick_accumulator, 120, "migrated instance keeps its progress");
    assert!(!c.has_effect("famished"));
}

/// An equipped bag raises capacity.
#[test]
fn bag_bonus_raises_capacity() {
    let data = GameData::default_test();
    let ctx = GameContext::new(&data);
    let mut c = character();
    actions::pick_up(&ctx, &mut c, "iron-ingot", 5).unwrap();
    actions::pick_up(&ctx, &mut c, "backpack", 1).unwrap();
    // 52 / 50
    assert!(c.has_effect("encumbrance-overweight"));

    let bag = c
        .inventory
        .general_slots
        .iter()
        .position(|s| s.as_ref().is_some_and(|s| s.item == "backpack"))
        .unwrap();
    actions::equip(&ctx, &mut c, SlotRef::General(bag)).unwrap();
    // 52 / 70
    assert!(!c.has_effect("encumbrance-overweight"));
    assert!(!c.has_effect("encumbrance-light"));
}
