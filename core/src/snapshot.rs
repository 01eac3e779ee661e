//! Snapshot capture: the client-visible projection of a character.
//!
//! A snapshot is an owned, immutable copy. Nothing in it borrows from the
//! character, so the "before" snapshot survives any later mutation and
//! can be diffed against the "after" one (see delta.rs).

use crate::{
    character::{AbilityScores, Character},
    effect::EnrichedEffect,
    inventory::{EquipmentSlot, Slot, GENERAL_SLOTS},
    simulator::EffectSimulator,
    storage::vault_at,
    types::{BuildingId, ItemId, Minutes, NpcId},
    world::WorldView,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Backpack slots always reported to the client, used or not.
pub const BACKPACK_SLOTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub item_id:  ItemId,
    pub quantity: u32,
}

impl SlotSnapshot {
    fn from_slot(slot: &Slot) -> Option<Self> {
        slot.as_ref().map(|s| Self { item_id: s.item.clone(), quantity: s.quantity })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hp:          i64,
    pub max_hp:      i64,
    pub mana:        i64,
    pub max_mana:    i64,
    pub fatigue:     i64,
    pub hunger:      i64,
    pub gold:        u64,
    pub experience:  i64,
    pub time_of_day: Minutes,
    pub current_day: i64,

    /// Base scores plus every live modifier.
    pub abilities: AbilityScores,

    pub city:     String,
    pub district: String,
    pub building: String,

    pub npcs:      BTreeSet<NpcId>,
    pub buildings: BTreeMap<BuildingId, bool>,

    pub general_slots:  Vec<Option<SlotSnapshot>>,
    pub backpack_slots: Vec<Option<SlotSnapshot>>,
    pub equipment:      BTreeMap<EquipmentSlot, SlotSnapshot>,
    /// The vault in the current building. Empty anywhere else.
    #[serde(default)]
    pub vault_slots:    Vec<Option<SlotSnapshot>>,

    pub effects: Vec<EnrichedEffect>,
}

impl Snapshot {
    /// Copy everything the client can see. World lookups that find
    /// nothing leave the collections empty; capture never fails.
    pub fn capture(character: &Character, simulator: &EffectSimulator<'_>, world: &dyn WorldView) -> Self {
        let location = &character.location;
        let time_of_day = character.clock.time_of_day;
        let inventory = &character.inventory;

        let mut general_slots: Vec<_> = inventory.general_slots.iter().map(SlotSnapshot::from_slot).collect();
        if general_slots.len() < GENERAL_SLOTS {
            general_slots.resize(GENERAL_SLOTS, None);
        }
        let mut backpack_slots: Vec<_> = inventory.backpack().iter().map(SlotSnapshot::from_slot).collect();
        if backpack_slots.len() < BACKPACK_SLOTS {
            backpack_slots.resize(BACKPACK_SLOTS, None);
        }

        let vault_slots = vault_at(&character.vaults, &location.building)
            .filter(|_| location.is_indoors())
            .map(|v| v.slots.iter().map(SlotSnapshot::from_slot).collect())
            .unwrap_or_default();

        let equipment = inventory
            .gear_slots
            .iter()
            .map(|(slot, e)| (*slot, SlotSnapshot { item_id: e.item.clone(), quantity: e.quantity }))
            .collect();

        Self {
            hp:          character.hp,
            max_hp:      character.max_hp,
            mana:        character.mana,
            max_mana:    character.max_mana,
            fatigue:     character.fatigue,
            hunger:      character.hunger,
            gold:        character.gold(),
            experience:  character.experience,
            time_of_day,
            current_day: character.clock.current_day,
            abilities:   simulator.effective_abilities(character),
            city:        location.city.clone(),
            district:    location.district.clone(),
            building:    location.building.clone(),
            npcs:        world.visible_npcs(&location.city, &location.district, &location.building, time_of_day),
            buildings:   world.building_states(&location.city, &location.district, time_of_day),
            general_slots,
            backpack_slots,
            equipment,
            vault_slots,
            effects:     simulator.enrich(&character.active_effects),
        }
    }
}
