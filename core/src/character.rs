//! Character save state: the document persisted per save file.
//!
//! RULE: only the counters, inventory, clock, location, active effect
//! instances and vaults live here. Everything derived (tiers, effective abilities,
//! enriched effects) is recomputed from this plus game data.

use crate::{
    clock::GameClock,
    effect::{Ability, ActiveEffect, EffectKind},
    inventory::Inventory,
    items::GOLD_ITEM,
    storage::Vault,
};
use serde::{Deserialize, Serialize};

pub const MAX_FATIGUE: i64 = 10;
pub const MAX_HUNGER: i64 = 3;

/// Hunger a freshly created or freshly rested character starts at.
pub const BASELINE_HUNGER: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength:     i64,
    pub dexterity:    i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom:       i64,
    pub charisma:     i64,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength:     10,
            dexterity:    10,
            constitution: 10,
            intelligence: 10,
            wisdom:       10,
            charisma:     10,
        }
    }
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> i64 {
        match ability {
            Ability::Strength     => self.strength,
            Ability::Dexterity    => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom       => self.wisdom,
            Ability::Charisma     => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i64) {
        let slot = match ability {
            Ability::Strength     => &mut self.strength,
            Ability::Dexterity    => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom       => &mut self.wisdom,
            Ability::Charisma     => &mut self.charisma,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city:     String,
    pub district: String,
    /// Empty when outdoors.
    #[serde(default)]
    pub building: String,
}

impl Location {
    pub fn is_indoors(&self) -> bool {
        !self.building.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name:  String,
    #[serde(default)]
    pub race:  String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub experience: i64,

    pub hp:       i64,
    pub max_hp:   i64,
    pub mana:     i64,
    pub max_mana: i64,
    pub fatigue:  i64,
    pub hunger:   i64,

    pub stats: AbilityScores,

    #[serde(flatten)]
    pub location: Location,
    #[serde(flatten)]
    pub clock: GameClock,

    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub active_effects: Vec<ActiveEffect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vaults: Vec<Vault>,
}

impl Character {
    pub fn new(name: &str, location: Location) -> Self {
        Self {
            name:       name.to_string(),
            race:       String::new(),
            class:      String::new(),
            experience: 0,
            hp:         20,
            max_hp:     20,
            mana:       10,
            max_mana:   10,
            fatigue:    0,
            hunger:     BASELINE_HUNGER,
            stats:      AbilityScores::default(),
            location,
            clock:      GameClock::default(),
            inventory:  Inventory::new(),
            active_effects: Vec::new(),
            vaults:     Vec::new(),
        }
    }

    /// Apply a resource change once, clamped to the counter's range.
    /// Stat-modifier kinds are never instant and are ignored here.
    pub fn apply_instant(&mut self, kind: EffectKind, value: i64) {
        match kind {
            EffectKind::Hp      => self.hp = (self.hp + value).clamp(0, self.max_hp),
            EffectKind::Mana    => self.mana = (self.mana + value).clamp(0, self.max_mana),
            EffectKind::Fatigue => self.fatigue = (self.fatigue + value).clamp(0, MAX_FATIGUE),
            EffectKind::Hunger  => self.hunger = (self.hunger + value).clamp(0, MAX_HUNGER),
            EffectKind::Strength
            | EffectKind::Dexterity
            | EffectKind::Constitution
            | EffectKind::Intelligence
            | EffectKind::Wisdom
            | EffectKind::Charisma => {}
        }
    }

    pub fn gold(&self) -> u64 {
        self.inventory.count_item(GOLD_ITEM)
    }

    pub fn has_effect(&self, effect_id: &str) -> bool {
        self.active_effects.iter().any(|e| e.effect_id == effect_id)
    }
}
