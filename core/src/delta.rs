//! Delta calculation: the minimal structural difference between two
//! snapshots.
//!
//! RULE: diff() never mutates either snapshot and never fails. Every
//! section is None unless something in it changed, so an unchanged
//! character produces an empty delta and serializes to `{}`.

use crate::{
    effect::{Ability, EnrichedEffect},
    inventory::EquipmentSlot,
    snapshot::{SlotSnapshot, Snapshot},
    types::{BuildingId, EffectId, NpcId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abilities: Option<BTreeMap<Ability, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npcs: Option<NpcDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildings: Option<BuildingDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectsDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mana: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatigue: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunger: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_day: Option<i64>,
}

/// NPC visibility change. Both lists are sorted and disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<NpcId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<NpcId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDelta {
    /// Buildings whose open state flipped or that came into view.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state_changed: BTreeMap<BuildingId, bool>,
    /// Buildings no longer in view.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden: Vec<BuildingId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDelta {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub quantity: u32,
    /// True when the slot was cleared.
    #[serde(default)]
    pub empty: bool,
}

impl SlotDelta {
    fn from_slot(slot: &Option<SlotSnapshot>) -> Self {
        match slot {
            Some(s) => Self { item_id: s.item_id.clone(), quantity: s.quantity, empty: false },
            None    => Self { item_id: String::new(), quantity: 0, empty: true },
        }
    }

    fn to_slot(&self) -> Option<SlotSnapshot> {
        (!self.empty).then(|| SlotSnapshot { item_id: self.item_id.clone(), quantity: self.quantity })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDelta {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub general_slots: BTreeMap<usize, SlotDelta>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub backpack_slots: BTreeMap<usize, SlotDelta>,
    /// New backpack length, when a bigger or smaller bag changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backpack_size: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vault_slots: BTreeMap<usize, SlotDelta>,
    /// New vault length: the vault came into view or went out of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDelta {
    /// None = slot cleared.
    pub changed: BTreeMap<EquipmentSlot, Option<SlotSnapshot>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<EffectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<EffectId>,
    /// Ids present before and after whose timers moved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<EffectId>,
    /// The full list after the change.
    pub active: Vec<EnrichedEffect>,
}

fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
    (old != new).then(|| new.clone())
}

fn non_default<T: Default + PartialEq>(value: T) -> Option<T> {
    (value != T::default()).then_some(value)
}

/// Compute the difference from `old` to `new`.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Delta {
    Delta {
        character: diff_character(old, new),
        abilities: diff_abilities(old, new),
        npcs:      diff_npcs(&old.npcs, &new.npcs),
        buildings: diff_buildings(&old.buildings, &new.buildings),
        inventory: diff_inventory(old, new),
        equipment: diff_equipment(old, new),
        location:  non_default(LocationDelta {
            city:     changed(&old.city, &new.city),
            district: changed(&old.district, &new.district),
            building: changed(&old.building, &new.building),
        }),
        effects:   diff_effects(&old.effects, &new.effects),
    }
}

fn diff_character(old: &Snapshot, new: &Snapshot) -> Option<CharacterDelta> {
    non_default(CharacterDelta {
        hp:          changed(&old.hp, &new.hp),
        max_hp:      changed(&old.max_hp, &new.max_hp),
        mana:        changed(&old.mana, &new.mana),
        max_mana:    changed(&old.max_mana, &new.max_mana),
        fatigue:     changed(&old.fatigue, &new.fatigue),
        hunger:      changed(&old.hunger, &new.hunger),
        gold:        changed(&old.gold, &new.gold),
        experience:  changed(&old.experience, &new.experience),
        time_of_day: changed(&old.time_of_day, &new.time_of_day),
        current_day: changed(&old.current_day, &new.current_day),
    })
}

fn diff_abilities(old: &Snapshot, new: &Snapshot) -> Option<BTreeMap<Ability, i64>> {
    let changes: BTreeMap<_, _> = Ability::ALL
        .iter()
        .filter(|a| old.abilities.get(**a) != new.abilities.get(**a))
        .map(|a| (*a, new.abilities.get(*a)))
        .collect();
    (!changes.is_empty()).then_some(changes)
}

fn diff_npcs(old: &BTreeSet<NpcId>, new: &BTreeSet<NpcId>) -> Option<NpcDelta> {
    non_default(NpcDelta {
        added:   new.difference(old).cloned().collect(),
        removed: old.difference(new).cloned().collect(),
    })
}

fn diff_buildings(old: &BTreeMap<BuildingId, bool>, new: &BTreeMap<BuildingId, bool>) -> Option<BuildingDelta> {
    non_default(BuildingDelta {
        state_changed: new
            .iter()
            .filter(|(id, open)| old.get(*id) != Some(*open))
            .map(|(id, open)| (id.clone(), *open))
            .collect(),
        hidden: old.keys().filter(|id| !new.contains_key(*id)).cloned().collect(),
    })
}

fn diff_slots(old: &[Option<SlotSnapshot>], new: &[Option<SlotSnapshot>]) -> BTreeMap<usize, SlotDelta> {
    new.iter()
        .enumerate()
        .filter(|(i, slot)| old.get(*i).unwrap_or(&None) != *slot)
        .map(|(i, slot)| (i, SlotDelta::from_slot(slot)))
        .collect()
}

fn diff_inventory(old: &Snapshot, new: &Snapshot) -> Option<InventoryDelta> {
    non_default(InventoryDelta {
        general_slots:  diff_slots(&old.general_slots, &new.general_slots),
        backpack_slots: diff_slots(&old.backpack_slots, &new.backpack_slots),
        backpack_size:  (old.backpack_slots.len() != new.backpack_slots.len())
            .then_some(new.backpack_slots.len()),
        vault_slots:    diff_slots(&old.vault_slots, &new.vault_slots),
        vault_size:     (old.vault_slots.len() != new.vault_slots.len()).then_some(new.vault_slots.len()),
    })
}

fn diff_equipment(old: &Snapshot, new: &Snapshot) -> Option<EquipmentDelta> {
    let slots: BTreeSet<_> = old.equipment.keys().chain(new.equipment.keys()).copied().collect();
    non_default(EquipmentDelta {
        changed: slots
            .into_iter()
            .filter(|slot| old.equipment.get(slot) != new.equipment.get(slot))
            .map(|slot| (slot, new.equipment.get(&slot).cloned()))
            .collect(),
    })
}

fn diff_effects(old: &[EnrichedEffect], new: &[EnrichedEffect]) -> Option<EffectsDelta> {
    if old == new {
        return None;
    }
    let old_ids: BTreeSet<&str> = old.iter().map(|e| e.effect.effect_id.as_str()).collect();
    let new_ids: BTreeSet<&str> = new.iter().map(|e| e.effect.effect_id.as_str()).collect();

    let updated = new_ids
        .intersection(&old_ids)
        .filter(|id| {
            let before = old.iter().filter(|e| e.effect.effect_id == **id);
            let after = new.iter().filter(|e| e.effect.effect_id == **id);
            !before.eq(after)
        })
        .map(|id| id.to_string())
        .collect();

    Some(EffectsDelta {
        added:   new_ids.difference(&old_ids).map(|id| id.to_string()).collect(),
        removed: old_ids.difference(&new_ids).map(|id| id.to_string()).collect(),
        updated,
        active:  new.to_vec(),
    })
}

fn apply_slots(slots: &mut Vec<Option<SlotSnapshot>>, changes: &BTreeMap<usize, SlotDelta>) {
    for (index, change) in changes {
        if *index >= slots.len() {
            slots.resize(index + 1, None);
        }
        slots[*index] = change.to_slot();
    }
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        *self == Delta::default()
    }

    /// Replay this delta on top of `old`. For any two snapshots,
    /// `diff(a, b).apply_to(a) == b`.
    pub fn apply_to(&self, old: &Snapshot) -> Snapshot {
        let mut next = old.clone();

        if let Some(c) = &self.character {
            if let Some(v) = c.hp          { next.hp = v; }
            if let Some(v) = c.max_hp      { next.max_hp = v; }
            if let Some(v) = c.mana        { next.mana = v; }
            if let Some(v) = c.max_mana    { next.max_mana = v; }
            if let Some(v) = c.fatigue     { next.fatigue = v; }
            if let Some(v) = c.hunger      { next.hunger = v; }
            if let Some(v) = c.gold        { next.gold = v; }
            if let Some(v) = c.experience  { next.experience = v; }
            if let Some(v) = c.time_of_day { next.time_of_day = v; }
            if let Some(v) = c.current_day { next.current_day = v; }
        }

        if let Some(abilities) = &self.abilities {
            for (ability, value) in abilities {
                next.abilities.set(*ability, *value);
            }
        }

        if let Some(npcs) = &self.npcs {
            for id in &npcs.removed {
                next.npcs.remove(id);
            }
            next.npcs.extend(npcs.added.iter().cloned());
        }

        if let Some(buildings) = &self.buildings {
            for id in &buildings.hidden {
                next.buildings.remove(id);
            }
            next.buildings.extend(buildings.state_changed.iter().map(|(k, v)| (k.clone(), *v)));
        }

        if let Some(inventory) = &self.inventory {
            if let Some(size) = inventory.backpack_size {
                next.backpack_slots.resize(size, None);
            }
            apply_slots(&mut next.general_slots, &inventory.general_slots);
            apply_slots(&mut next.backpack_slots, &inventory.backpack_slots);
            if let Some(size) = inventory.vault_size {
                next.vault_slots.resize(size, None);
            }
            apply_slots(&mut next.vault_slots, &inventory.vault_slots);
        }

        if let Some(equipment) = &self.equipment {
            for (slot, item) in &equipment.changed {
                match item {
                    Some(item) => next.equipment.insert(*slot, item.clone()),
                    None       => next.equipment.remove(slot),
                };
            }
        }

        if let Some(location) = &self.location {
            if let Some(v) = &location.city     { next.city = v.clone(); }
            if let Some(v) = &location.district { next.district = v.clone(); }
            if let Some(v) = &location.building { next.building = v.clone(); }
        }

        if let Some(effects) = &self.effects {
            next.effects = effects.active.clone();
        }

        next
    }
}
