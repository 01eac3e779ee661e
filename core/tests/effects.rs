//! Effect simulator: apply, tick, delay, expiry.
//!
//! These run the bare simulator (no status hooks) against the built-in
//! test data, so only template semantics are exercised.

use wayfarer_core::{
    character::{Character, Location},
    config::GameData,
    effect::{Ability, EffectComponent, EffectKind, EffectTemplate},
    error::GameError,
    simulator::EffectSimulator,
};

fn character() -> Character {
    Character::new("Tester", Location {
        city:     "kingdom".into(),
        district: "center".into(),
        building: String::new(),
    })
}

fn template(id: &str, components: Vec<EffectComponent>) -> EffectTemplate {
    EffectTemplate {
        id:          id.into(),
        name:        id.into(),
        description: String::new(),
        category:    "buff".into(),
        message:     format!("{id} applied"),
        color:       "green".into(),
        silent:      false,
        components,
    }
}

fn component(kind: EffectKind, value: i64) -> EffectComponent {
    EffectComponent { kind, value, delay: 0, duration: 0, tick_interval: 0, tick_message: None }
}

fn data_with(extra: Vec<EffectTemplate>) -> GameData {
    let mut data = GameData::default_test();
    for t in extra {
        data.effects.insert(t.id.clone(), t);
    }
    data
}

/// Advancing k·T at once fires exactly as many ticks as k steps of T.
#[test]
fn large_skip_matches_stepwise_ticks() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);

    let mut once = character();
    let mut stepped = character();
    sim.apply_template(&mut once, "starving").unwrap();
    sim.apply_template(&mut stepped, "starving").unwrap();

    sim.advance(&mut once, 5 * 240);
    for _ in 0..5 {
        sim.advance(&mut stepped, 240);
    }

    assert_eq!(once.hp, 15, "five starving ticks should cost 5 hp");
    assert_eq!(once.hp, stepped.hp, "one skip and five steps must agree");
    assert_eq!(once.active_effects, stepped.active_effects);
}

/// Uneven step sizes carry partial progress in the tick accumulator.
#[test]
fn partial_intervals_accumulate() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    sim.apply_template(&mut c, "starving").unwrap();

    sim.advance(&mut c, 100);
    sim.advance(&mut c, 100);
    assert_eq!(c.hp, 20, "200 of 240 minutes must not tick");
    sim.advance(&mut c, 40);
    assert_eq!(c.hp, 19);
    assert_eq!(c.active_effects[0].tick_accumulator, 0);
}

/// A delayed instance does nothing until its delay runs out, then the
/// overshoot counts toward ticks and duration.
#[test]
fn delay_gates_ticks_and_carries_overshoot() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    c.hp = 5;

    // regeneration: +1 hp every 30 min for 120 min, after a 10 min delay.
    sim.apply_template(&mut c, "regeneration").unwrap();
    sim.advance(&mut c, 6);
    let effect = &c.active_effects[0];
    assert_eq!(effect.delay_remaining, 4);
    assert_eq!(effect.duration_remaining, 120, "duration must not count down during the delay");
    assert_eq!(c.hp, 5);

    sim.advance(&mut c, 10);
    let effect = &c.active_effects[0];
    assert_eq!(effect.delay_remaining, 0);
    assert_eq!(effect.tick_accumulator, 6, "the 6 minutes past the delay must carry over");
    assert_eq!(effect.duration_remaining, 114);

    sim.advance(&mut c, 24);
    assert_eq!(c.hp, 6, "first tick lands 30 minutes after the delay ends");
}

/// A delayed stat modifier does not count until live.
#[test]
fn delayed_modifier_is_not_live() {
    let mut delayed = component(EffectKind::Strength, 3);
    delayed.delay = 30;
    delayed.duration = 60;
    let data = data_with(vec![template("slow-tonic", vec![delayed])]);
    let sim = EffectSimulator::new(&data);
    let mut c = character();

    sim.apply_template(&mut c, "slow-tonic").unwrap();
    assert_eq!(sim.effective_abilities(&c).strength, 10);
    sim.advance(&mut c, 30);
    assert_eq!(sim.effective_abilities(&c).strength, 13);
}

/// Permanent instances survive any advance; a 5-minute one expires on
/// the first advance that passes 5 minutes.
#[test]
fn permanent_survives_and_timed_expires() {
    let mut brief = component(EffectKind::Dexterity, 1);
    brief.duration = 5;
    let data = data_with(vec![
        template("brief", vec![brief]),
        template("lasting", vec![component(EffectKind::Wisdom, 1)]),
    ]);
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    sim.apply_template(&mut c, "brief").unwrap();
    sim.apply_template(&mut c, "lasting").unwrap();

    sim.advance(&mut c, 3);
    assert!(c.has_effect("brief"), "3 of 5 minutes elapsed");
    sim.advance(&mut c, 3);
    assert!(!c.has_effect("brief"), "cumulative 6 > 5 must expire");

    for elapsed in [1, 59, 1440, 100_000] {
        sim.advance(&mut c, elapsed);
    }
    assert!(c.has_effect("lasting"));
    assert_eq!(c.active_effects.len(), 1);
}

/// Counting down to exactly zero keeps the instance for this call; the
/// next advance removes it instead of leaving it behind as permanent.
#[test]
fn exact_expiry_boundary_is_kept_once() {
    let mut brief = component(EffectKind::Dexterity, 1);
    brief.duration = 5;
    let data = data_with(vec![template("brief", vec![brief])]);
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    sim.apply_template(&mut c, "brief").unwrap();

    sim.advance(&mut c, 2);
    sim.advance(&mut c, 3);
    assert!(c.has_effect("brief"), "cumulative 5 does not exceed 5");
    assert_eq!(c.active_effects[0].duration_remaining, 0);
    assert!(!c.active_effects[0].is_permanent());
    assert_eq!(sim.effective_abilities(&c).dexterity, 11);

    sim.advance(&mut c, 1);
    assert!(!c.has_effect("brief"));
}

/// Ticks landing on the last minute still fire before expiry.
#[test]
fn final_tick_fires_on_the_expiry_minute() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    c.hp = 1;

    // 10 min delay, then 120 min of ticks every 30.
    sim.apply_template(&mut c, "regeneration").unwrap();
    sim.advance(&mut c, 130);
    assert_eq!(c.hp, 5);
    assert!(c.has_effect("regeneration"));
    sim.advance(&mut c, 30);
    assert_eq!(c.hp, 5, "a spent instance does not tick again");
    assert!(!c.has_effect("regeneration"));
}

/// Ticks stop at expiry even when the skip runs far past it.
#[test]
fn ticks_are_capped_at_expiry() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    c.hp = 1;

    sim.apply_template(&mut c, "regeneration").unwrap();
    sim.advance(&mut c, 10_000);
    assert_eq!(c.hp, 5, "120 minutes at one tick per 30 gives 4 ticks");
    assert!(c.active_effects.is_empty());
}

/// Instant components change counters and leave nothing behind.
#[test]
fn instant_components_are_not_tracked() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    c.hp = 5;

    let message = sim.apply_template(&mut c, "minor-healing").unwrap();
    assert_eq!(c.hp, 15);
    assert!(c.active_effects.is_empty());
    assert_eq!(message.message, "minor-healing applied");
}

/// Unknown templates fail without creating any instance.
#[test]
fn unknown_template_is_rejected() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();

    let err = sim.apply_template(&mut c, "no-such-effect").unwrap_err();
    assert!(matches!(err, GameError::EffectNotFound { .. }));
    assert!(c.active_effects.is_empty());
}

/// An instance whose template vanished is kept for a later pass.
#[test]
fn missing_template_keeps_instance() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    sim.apply_template(&mut c, "starving").unwrap();
    c.active_effects[0].effect_id = "removed-from-data".into();

    sim.advance(&mut c, 1000);
    assert_eq!(c.active_effects.len(), 1);
    assert_eq!(c.hp, 20);
}

/// Sleep-style decay shortens timers without ticking.
#[test]
fn decay_only_skips_ticks() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    c.hp = 5;
    sim.apply_template(&mut c, "regeneration").unwrap();
    sim.apply_template(&mut c, "starving").unwrap();

    sim.decay_durations_only(&mut c, 60);
    assert_eq!(c.hp, 5);
    let regen = c.active_effects.iter().find(|e| e.effect_id == "regeneration").unwrap();
    assert_eq!(regen.duration_remaining, 60);
    assert_eq!(regen.delay_remaining, 0);

    sim.decay_durations_only(&mut c, 60);
    assert!(c.has_effect("regeneration"), "exactly used up is not yet expired");
    sim.decay_durations_only(&mut c, 1);
    assert!(!c.has_effect("regeneration"));
    assert!(c.has_effect("starving"), "permanent effects are not decayed");
}

/// Live modifiers sum per ability; enrichment resolves template metadata.
#[test]
fn modifiers_and_enrichment() {
    let data = GameData::default_test();
    let sim = EffectSimulator::new(&data);
    let mut c = character();
    sim.apply_template(&mut c, "stuffed").unwrap();
    sim.apply_template(&mut c, "strength-draught").unwrap();

    let mods = sim.stat_modifiers(&c.active_effects);
    assert_eq!(mods.get(&Ability::Strength), Some(&1));
    assert_eq!(mods.get(&Ability::Constitution), Some(&1));
    assert_eq!(mods.get(&Ability::Dexterity), Some(&-1));

    let abilities = sim.effective_abilities(&c);
    assert_eq!(abilities.strength, 11);
    assert_eq!(c.stats.strength, 10, "base stats are never modified");

    c.active_effects.push(c.active_effects[0].clone());
    c.active_effects.last_mut().unwrap().effect_id = "ghost".into();
    let enriched = sim.enrich(&c.active_effects);
    assert_eq!(enriched[0].category, "buff");
    let ghost = enriched.last().unwrap();
    assert_eq!(ghost.name, "ghost");
    assert_eq!(ghost.category, "modifier");
}
