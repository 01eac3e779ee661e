//! Status reconciler: maps fatigue, hunger and carried weight onto
//! exactly one tier effect each.
//!
//! RULE: after reconcile() a status carries the effect of its current
//! tier and nothing else from its tier set. Calling it twice in a row
//! leaves the effect list unchanged.
//!
//! Accumulation effects (the slow drift of fatigue up and hunger down)
//! are managed here too, since their presence depends on the same
//! counters.

use crate::{
    character::{Character, MAX_FATIGUE, MAX_HUNGER},
    effect::EffectMessage,
    error::GameResult,
    items::ItemCatalog,
    simulator::{EffectHook, EffectSimulator},
    templates::{normalize_effect_id, EffectTemplateStore},
    types::Minutes,
};

pub const FATIGUE_ACCUMULATION: &str = "fatigue-accumulation";

pub const HUNGER_ACCUMULATION_STUFFED: &str = "hunger-accumulation-stuffed";
pub const HUNGER_ACCUMULATION_WELLFED: &str = "hunger-accumulation-wellfed";
pub const HUNGER_ACCUMULATION_HUNGRY:  &str = "hunger-accumulation-hungry";

pub const HUNGER_ACCUMULATION: [&str; 3] = [
    HUNGER_ACCUMULATION_STUFFED,
    HUNGER_ACCUMULATION_WELLFED,
    HUNGER_ACCUMULATION_HUNGRY,
];

/// Base carry capacity per point of strength.
pub const CAPACITY_PER_STRENGTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Encumbrance,
    Fatigue,
    Hunger,
}

impl StatusKind {
    pub const ALL: [StatusKind; 3] = [Self::Encumbrance, Self::Fatigue, Self::Hunger];

    /// Closed set of effect ids owned by this status.
    pub fn tier_effects(&self) -> &'static [&'static str] {
        match self {
            Self::Encumbrance => &[
                "encumbrance-light",
                "encumbrance-overweight",
                "encumbrance-encumbered",
                "encumbrance-overloaded",
            ],
            Self::Fatigue => &["tired", "very-tired", "fatigued", "exhaustion"],
            Self::Hunger  => &["starving", "hungry", "stuffed"],
        }
    }
}

// ── Tiers ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncumbranceTier {
    Light,
    Normal,
    Overweight,
    Encumbered,
    Overloaded,
}

impl EncumbranceTier {
    /// Tier for a load expressed as a percentage of capacity.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage <= 50.0 {
            Self::Light
        } else if percentage <= 100.0 {
            Self::Normal
        } else if percentage <= 150.0 {
            Self::Overweight
        } else if percentage <= 200.0 {
            Self::Encumbered
        } else {
            Self::Overloaded
        }
    }

    pub fn effect_id(&self) -> Option<&'static str> {
        match self {
            Self::Light      => Some("encumbrance-light"),
            Self::Normal     => None,
            Self::Overweight => Some("encumbrance-overweight"),
            Self::Encumbered => Some("encumbrance-encumbered"),
            Self::Overloaded => Some("encumbrance-overloaded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FatigueTier {
    Fresh,
    Tired,
    VeryTired,
    Fatigued,
    Exhausted,
}

impl FatigueTier {
    pub fn from_counter(fatigue: i64) -> Self {
        match fatigue {
            f if f >= MAX_FATIGUE => Self::Exhausted,
            9 => Self::Fatigued,
            8 => Self::VeryTired,
            6 | 7 => Self::Tired,
            _ => Self::Fresh,
        }
    }

    pub fn effect_id(&self) -> Option<&'static str> {
        match self {
            Self::Fresh     => None,
            Self::Tired     => Some("tired"),
            Self::VeryTired => Some("very-tired"),
            Self::Fatigued  => Some("fatigued"),
            Self::Exhausted => Some("exhaustion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HungerTier {
    Starving,
    Hungry,
    WellFed,
    Stuffed,
}

impl HungerTier {
    pub fn from_counter(hunger: i64) -> Self {
        match hunger {
            h if h <= 0 => Self::Starving,
            1 => Self::Hungry,
            2 => Self::WellFed,
            _ => Self::Stuffed,
        }
    }

    pub fn effect_id(&self) -> Option<&'static str> {
        match self {
            Self::Starving => Some("starving"),
            Self::Hungry   => Some("hungry"),
            Self::WellFed  => None,
            Self::Stuffed  => Some("stuffed"),
        }
    }

    /// Minutes between hunger drops while at this tier. 0 = no drift.
    pub fn accumulation_interval(&self) -> Minutes {
        match self {
            Self::Stuffed  => 360,
            Self::WellFed  => 240,
            Self::Hungry   => 240,
            Self::Starving => 0,
        }
    }

    fn accumulation_effect(&self) -> Option<&'static str> {
        match self {
            Self::Stuffed  => Some(HUNGER_ACCUMULATION_STUFFED),
            Self::WellFed  => Some(HUNGER_ACCUMULATION_WELLFED),
            Self::Hungry   => Some(HUNGER_ACCUMULATION_HUNGRY),
            Self::Starving => None,
        }
    }
}

// ── Weight ───────────────────────────────────────────────────────────────────

/// Carry capacity: 5 × base strength plus the equipped bag's bonus.
///
/// Base strength is used so the encumbrance penalty itself cannot move
/// the tier it was derived from.
pub fn weight_capacity(character: &Character, items: &dyn ItemCatalog) -> f64 {
    CAPACITY_PER_STRENGTH * character.stats.strength as f64
        + character.inventory.capacity_bonus(items)
}

/// Carried weight as a percentage of capacity. None when capacity ≤ 0.
pub fn encumbrance_percentage(character: &Character, items: &dyn ItemCatalog) -> Option<f64> {
    let capacity = weight_capacity(character, items);
    if capacity <= 0.0 {
        return None;
    }
    Some(character.inventory.carried_weight(items) / capacity * 100.0)
}

pub fn encumbrance_tier(character: &Character, items: &dyn ItemCatalog) -> EncumbranceTier {
    encumbrance_percentage(character, items)
        .map(EncumbranceTier::from_percentage)
        .unwrap_or(EncumbranceTier::Normal)
}

// ── Hooks ────────────────────────────────────────────────────────────────────

/// Dynamic hunger interval and accumulation cut-offs.
pub struct StatusHooks;

fn is_hunger_accumulation(effect_id: &str) -> bool {
    HUNGER_ACCUMULATION.contains(&effect_id)
}

impl EffectHook for StatusHooks {
    fn tick_interval(&self, effect_id: &str, base: Minutes, character: &Character) -> Minutes {
        if is_hunger_accumulation(effect_id) {
            HungerTier::from_counter(character.hunger).accumulation_interval()
        } else {
            base
        }
    }

    fn retain(&self, effect_id: &str, character: &Character) -> bool {
        if effect_id == FATIGUE_ACCUMULATION && character.fatigue >= MAX_FATIGUE {
            log::debug!("fatigue at max, dropping {FATIGUE_ACCUMULATION}");
            return false;
        }
        if is_hunger_accumulation(effect_id) && character.hunger <= 0 {
            log::debug!("hunger at min, dropping {effect_id}");
            return false;
        }
        true
    }
}

/// Simulator wired with the status hooks, as used by the game.
pub fn game_simulator(templates: &dyn EffectTemplateStore) -> EffectSimulator<'_> {
    EffectSimulator::new(templates).with_hook(StatusHooks)
}

// ── Reconciler ───────────────────────────────────────────────────────────────

pub struct StatusReconciler<'a> {
    simulator: EffectSimulator<'a>,
    items:     &'a dyn ItemCatalog,
}

impl<'a> StatusReconciler<'a> {
    pub fn new(templates: &'a dyn EffectTemplateStore, items: &'a dyn ItemCatalog) -> Self {
        Self { simulator: game_simulator(templates), items }
    }

    pub fn simulator(&self) -> &EffectSimulator<'a> {
        &self.simulator
    }

    /// Tier effect id the character should carry for `kind` right now.
    pub fn target_effect(&self, character: &Character, kind: StatusKind) -> Option<&'static str> {
        match kind {
            StatusKind::Encumbrance => encumbrance_tier(character, self.items).effect_id(),
            StatusKind::Fatigue     => FatigueTier::from_counter(character.fatigue).effect_id(),
            StatusKind::Hunger      => HungerTier::from_counter(character.hunger).effect_id(),
        }
    }

    /// Replace the status's tier effects with the one matching the
    /// current counters. Failures are logged, never raised.
    ///
    /// Returns early with None when the character already carries exactly
    /// the target tier (or no tier and none is due): the instances are not
    /// touched, ticking tiers keep their progress and no message repeats.
    pub fn reconcile(&self, character: &mut Character, kind: StatusKind) -> Option<EffectMessage> {
        let owned = kind.tier_effects();
        let target = self.target_effect(character, kind);
        if self.already_reconciled(character, owned, target) {
            return None;
        }
        character
            .active_effects
            .retain(|e| !owned.contains(&e.effect_id.as_str()));

        let effect_id = target?;
        match self.simulator.apply_template(character, effect_id) {
            Ok(message) => {
                log::debug!("reconcile {kind:?}: applied {effect_id}");
                Some(message)
            }
            Err(e) => {
                log::warn!("reconcile {kind:?}: could not apply {effect_id}: {e}");
                None
            }
        }
    }

    fn already_reconciled(&self, character: &Character, owned: &[&str], target: Option<&str>) -> bool {
        let present: Vec<&str> = character
            .active_effects
            .iter()
            .map(|e| e.effect_id.as_str())
            .filter(|id| owned.contains(id))
            .collect();
        let Some(target) = target else {
            return present.is_empty();
        };
        let Ok(template) = self.simulator.templates().template(target) else {
            return false;
        };
        let tracked = template.components.iter().filter(|c| !c.is_instant()).count();
        present.len() == tracked && present.iter().all(|id| *id == target)
    }

    pub fn reconcile_all(&self, character: &mut Character) -> Vec<EffectMessage> {
        StatusKind::ALL
            .iter()
            .filter_map(|kind| self.reconcile(character, *kind))
            .collect()
    }

    /// Fatigue accumulation is present iff fatigue is below max.
    pub fn ensure_fatigue_accumulation(&self, character: &mut Character) -> GameResult<()> {
        if character.fatigue >= MAX_FATIGUE {
            remove_fatigue_accumulation(character);
            return Ok(());
        }
        if character.has_effect(FATIGUE_ACCUMULATION) {
            return Ok(());
        }
        self.simulator.apply_template(character, FATIGUE_ACCUMULATION)?;
        Ok(())
    }

    /// Hunger accumulation is present iff hunger is above zero. An
    /// existing instance is never replaced, so its progress is kept.
    pub fn ensure_hunger_accumulation(&self, character: &mut Character) -> GameResult<()> {
        if character.active_effects.iter().any(|e| is_hunger_accumulation(&e.effect_id)) {
            return Ok(());
        }
        let tier = HungerTier::from_counter(character.hunger.min(MAX_HUNGER));
        if let Some(effect_id) = tier.accumulation_effect() {
            self.simulator.apply_template(character, effect_id)?;
        }
        Ok(())
    }

    /// Fix up a freshly loaded save: rename legacy effect ids, restore the
    /// accumulators and re-derive every tier.
    pub fn initialize_on_load(&self, character: &mut Character) -> GameResult<()> {
        migrate_legacy_effect_ids(character);
        self.ensure_fatigue_accumulation(character)?;
        self.ensure_hunger_accumulation(character)?;
        for kind in [StatusKind::Fatigue, StatusKind::Hunger, StatusKind::Encumbrance] {
            self.reconcile(character, kind);
        }
        Ok(())
    }
}

pub fn remove_fatigue_accumulation(character: &mut Character) {
    character.active_effects.retain(|e| e.effect_id != FATIGUE_ACCUMULATION);
}

pub fn remove_hunger_accumulation(character: &mut Character) {
    character.active_effects.retain(|e| !is_hunger_accumulation(&e.effect_id));
}

pub fn reset_fatigue_accumulator(character: &mut Character) {
    if let Some(e) = character
        .active_effects
        .iter_mut()
        .find(|e| e.effect_id == FATIGUE_ACCUMULATION)
    {
        e.tick_accumulator = 0;
    }
}

pub fn reset_hunger_accumulator(character: &mut Character) {
    if let Some(e) = character
        .active_effects
        .iter_mut()
        .find(|e| is_hunger_accumulation(&e.effect_id))
    {
        e.tick_accumulator = 0;
    }
}

/// Rename effect ids written by older versions in place.
pub fn migrate_legacy_effect_ids(character: &mut Character) {
    for effect in character.active_effects.iter_mut() {
        let current = normalize_effect_id(&effect.effect_id);
        if current != effect.effect_id {
            log::info!("migrating effect id {} -> {current}", effect.effect_id);
            effect.effect_id = current.to_string();
        }
    }
}
