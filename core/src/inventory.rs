//! Slot-indexed inventory: general slots, equipment slots, and the
//! nested contents of an equipped bag.
//!
//! RULE: inventory methods only move items around. They never touch
//! effects; encumbrance is reconciled by the wrappers in actions.rs.

use crate::{
    error::{GameError, GameResult},
    items::ItemCatalog,
    types::ItemId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GENERAL_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item:     ItemId,
    pub quantity: u32,
}

/// A single slot: empty, or one stack.
pub type Slot = Option<ItemStack>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Neck,
    Head,
    Ammo,
    Mainhand,
    Chest,
    Offhand,
    Ring1,
    Legs,
    Ring2,
    Gloves,
    Boots,
    Bag,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 12] = [
        Self::Neck, Self::Head, Self::Ammo,
        Self::Mainhand, Self::Chest, Self::Offhand,
        Self::Ring1, Self::Legs, Self::Ring2,
        Self::Gloves, Self::Boots, Self::Bag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Neck     => "neck",
            Self::Head     => "head",
            Self::Ammo     => "ammo",
            Self::Mainhand => "mainhand",
            Self::Chest    => "chest",
            Self::Offhand  => "offhand",
            Self::Ring1    => "ring1",
            Self::Legs     => "legs",
            Self::Ring2    => "ring2",
            Self::Gloves   => "gloves",
            Self::Boots    => "boots",
            Self::Bag      => "bag",
        }
    }

    /// Map an item's `gear_slot` property to its primary equipment slot.
    pub fn from_gear_slot(gear_slot: &str) -> Option<Self> {
        match gear_slot {
            "hands" | "mainhand"                 => Some(Self::Mainhand),
            "offhand"                            => Some(Self::Offhand),
            "chest" | "armor" | "body"           => Some(Self::Chest),
            "head" | "helmet" | "hat"            => Some(Self::Head),
            "legs" | "leg" | "greaves"           => Some(Self::Legs),
            "gloves" | "glove" | "gauntlets"     => Some(Self::Gloves),
            "boots" | "boot" | "feet"            => Some(Self::Boots),
            "neck" | "necklace" | "amulet"       => Some(Self::Neck),
            "ring" | "finger" | "ring1" | "ring2" => Some(Self::Ring1),
            "ammo" | "ammunition"                => Some(Self::Ammo),
            "bag" | "backpack"                   => Some(Self::Bag),
            _ => None,
        }
    }

    /// Fallback slot tried when the primary one is taken.
    pub fn alternate(&self) -> Option<Self> {
        match self {
            Self::Mainhand => Some(Self::Offhand),
            Self::Ring1    => Some(Self::Ring2),
            _ => None,
        }
    }
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipped {
    pub item: ItemId,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Nested slots, only for containers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Slot>,
}

impl Equipped {
    fn is_empty_container(&self) -> bool {
        self.contents.iter().all(Option::is_none)
    }
}

/// Address of a carried (non-equipment) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "area", content = "index", rename_all = "snake_case")]
pub enum SlotRef {
    General(usize),
    Backpack(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub general_slots: Vec<Slot>,
    #[serde(default)]
    pub gear_slots: BTreeMap<EquipmentSlot, Equipped>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            general_slots: vec![None; GENERAL_SLOTS],
            gear_slots:    BTreeMap::new(),
        }
    }

    pub fn equipped(&self, slot: EquipmentSlot) -> Option<&Equipped> {
        self.gear_slots.get(&slot)
    }

    /// Contents of the equipped bag (empty when no bag is worn).
    pub fn backpack(&self) -> &[Slot] {
        self.gear_slots
            .get(&EquipmentSlot::Bag)
            .map(|bag| bag.contents.as_slice())
            .unwrap_or(&[])
    }

    pub fn slot(&self, at: SlotRef) -> GameResult<&Slot> {
        let found = match at {
            SlotRef::General(i)  => self.general_slots.get(i),
            SlotRef::Backpack(i) => self.backpack().get(i),
        };
        found.ok_or_else(|| GameError::InvalidSlot(format!("{at:?} does not exist")))
    }

    pub fn slot_mut(&mut self, at: SlotRef) -> GameResult<&mut Slot> {
        let found = match at {
            SlotRef::General(i) => self.general_slots.get_mut(i),
            SlotRef::Backpack(i) => self
                .gear_slots
                .get_mut(&EquipmentSlot::Bag)
                .and_then(|bag| bag.contents.get_mut(i)),
        };
        found.ok_or_else(|| GameError::InvalidSlot(format!("{at:?} does not exist")))
    }

    /// Add items with stacking priority: existing backpack stacks, existing
    /// general stacks, empty backpack slots, empty general slots.
    ///
    /// Returns how many units fit. Fails only when none fit.
    pub fn add_item(
        &mut self,
        catalog:  &dyn ItemCatalog,
        item_id:  &str,
        quantity: u32,
    ) -> GameResult<u32> {
        let def = catalog
            .item(item_id)
            .ok_or_else(|| GameError::ItemNotFound { id: item_id.to_string() })?;
        if quantity == 0 {
            return Ok(0);
        }
        let max_stack = def.stack.max(1);
        let mut remaining = quantity;

        if let Some(bag) = self.gear_slots.get_mut(&EquipmentSlot::Bag) {
            stack_into(&mut bag.contents, item_id, max_stack, &mut remaining);
        }
        stack_into(&mut self.general_slots, item_id, max_stack, &mut remaining);
        if let Some(bag) = self.gear_slots.get_mut(&EquipmentSlot::Bag) {
            fill_empty(&mut bag.contents, item_id, max_stack, &mut remaining);
        }
        fill_empty(&mut self.general_slots, item_id, max_stack, &mut remaining);

        let added = quantity - remaining;
        if added == 0 {
            return Err(GameError::InventoryFull { item: item_id.to_string() });
        }
        if remaining > 0 {
            log::warn!("inventory full: added {added}/{quantity} {item_id}");
        } else {
            log::debug!("added {added} {item_id}");
        }
        Ok(added)
    }

    /// Take up to `quantity` units out of a slot. 0 takes the whole stack.
    pub fn remove_from_slot(&mut self, at: SlotRef, quantity: u32) -> GameResult<ItemStack> {
        let slot = self.slot_mut(at)?;
        let stack = slot
            .as_mut()
            .ok_or_else(|| GameError::InvalidSlot(format!("{at:?} is empty")))?;

        let taken = if quantity == 0 { stack.quantity } else { quantity.min(stack.quantity) };
        stack.quantity -= taken;
        let removed = ItemStack { item: stack.item.clone(), quantity: taken };
        if stack.quantity == 0 {
            *slot = None;
        }
        Ok(removed)
    }

    /// Put a stack back into the slot it came from, merging with whatever
    /// is left there.
    pub fn return_to_slot(&mut self, at: SlotRef, stack: ItemStack) -> GameResult<()> {
        let slot = self.slot_mut(at)?;
        match slot {
            Some(s) if s.item == stack.item => s.quantity += stack.quantity,
            Some(s) => {
                return Err(GameError::InvalidSlot(format!("{at:?} now holds {}", s.item)));
            }
            None => *slot = Some(stack),
        }
        Ok(())
    }

    /// Remove up to `quantity` units of an item from carried slots,
    /// general slots first. Returns the number removed.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> u32 {
        let mut remaining = quantity;
        let general = self.general_slots.iter_mut();
        let backpack = self
            .gear_slots
            .get_mut(&EquipmentSlot::Bag)
            .map(|bag| bag.contents.iter_mut())
            .into_iter()
            .flatten();

        for slot in general.chain(backpack) {
            if remaining == 0 {
                break;
            }
            let Some(stack) = slot.as_mut() else { continue };
            if stack.item != item_id {
                continue;
            }
            let taken = remaining.min(stack.quantity);
            stack.quantity -= taken;
            remaining -= taken;
            if stack.quantity == 0 {
                *slot = None;
            }
        }
        quantity - remaining
    }

    /// Units of an item across every slot, equipment included.
    pub fn count_item(&self, item_id: &str) -> u64 {
        let carried: u64 = self
            .general_slots
            .iter()
            .chain(self.backpack().iter())
            .flatten()
            .filter(|s| s.item == item_id)
            .map(|s| u64::from(s.quantity))
            .sum();
        let worn: u64 = self
            .gear_slots
            .values()
            .filter(|e| e.item == item_id)
            .map(|e| u64::from(e.quantity))
            .sum();
        carried + worn
    }

    /// Move a stack between carried slots. Same items merge up to the
    /// stack limit; anything else swaps.
    pub fn move_item(
        &mut self,
        catalog: &dyn ItemCatalog,
        from:    SlotRef,
        to:      SlotRef,
    ) -> GameResult<()> {
        self.slot(from)?;
        self.slot(to)?;
        if from == to {
            return Ok(());
        }

        let source = self.slot_mut(from)?.take();
        let target = self.slot_mut(to)?.take();

        let (new_source, new_target) = match (source, target) {
            (Some(mut src), Some(mut dst)) if src.item == dst.item => {
                let max_stack = catalog.item(&src.item).map(|d| d.stack.max(1)).unwrap_or(1);
                let moved = max_stack.saturating_sub(dst.quantity).min(src.quantity);
                dst.quantity += moved;
                src.quantity -= moved;
                ((src.quantity > 0).then_some(src), Some(dst))
            }
            (src, dst) => (dst, src),
        };

        *self.slot_mut(from)? = new_source;
        *self.slot_mut(to)? = new_target;
        Ok(())
    }

    /// Move `quantity` units out of a stack into an empty slot. Both
    /// halves must end up non-empty.
    pub fn split_item(&mut self, from: SlotRef, to: SlotRef, quantity: u32) -> GameResult<()> {
        let current = self
            .slot(from)?
            .as_ref()
            .map(|s| s.quantity)
            .ok_or_else(|| GameError::InvalidSlot(format!("{from:?} is empty")))?;
        if quantity == 0 || quantity >= current {
            return Err(GameError::InvalidAction(format!(
                "cannot split {quantity} from a stack of {current}"
            )));
        }
        if self.slot(to)?.is_some() {
            return Err(GameError::InvalidSlot(format!("{to:?} is not empty")));
        }
        let taken = self.remove_from_slot(from, quantity)?;
        *self.slot_mut(to)? = Some(taken);
        Ok(())
    }

    /// Top up the stack in `to` from the same item in `from`. Unlike
    /// move_item this never swaps: mismatched items or a full target fail.
    pub fn stack_item(&mut self, catalog: &dyn ItemCatalog, from: SlotRef, to: SlotRef) -> GameResult<u32> {
        if from == to {
            return Err(GameError::InvalidAction("cannot stack a slot onto itself".into()));
        }
        let (Some(src), Some(dst)) = (self.slot(from)?.clone(), self.slot(to)?.clone()) else {
            return Err(GameError::InvalidSlot("both slots must hold items".into()));
        };
        if src.item != dst.item {
            return Err(GameError::InvalidAction("items don't match for stacking".into()));
        }
        let max_stack = catalog
            .item(&src.item)
            .ok_or_else(|| GameError::ItemNotFound { id: src.item.clone() })?
            .stack
            .max(1);
        if dst.quantity >= max_stack {
            return Err(GameError::InvalidAction(format!("destination stack is full (max {max_stack})")));
        }
        let moved = (max_stack - dst.quantity).min(src.quantity);
        self.remove_from_slot(from, moved)?;
        if let Some(target) = self.slot_mut(to)? {
            target.quantity += moved;
        }
        Ok(dst.quantity + moved)
    }

    /// Equip the stack in `from`. Whatever occupied the target slot moves
    /// back into `from`.
    pub fn equip(&mut self, catalog: &dyn ItemCatalog, from: SlotRef) -> GameResult<EquipmentSlot> {
        let stack = self
            .slot(from)?
            .clone()
            .ok_or_else(|| GameError::InvalidSlot(format!("{from:?} is empty")))?;
        let def = catalog
            .item(&stack.item)
            .ok_or_else(|| GameError::ItemNotFound { id: stack.item.clone() })?;
        let primary = def
            .gear_slot
            .as_deref()
            .and_then(EquipmentSlot::from_gear_slot)
            .ok_or_else(|| GameError::InvalidAction(format!("{} cannot be equipped", def.name)))?;

        let target = match primary.alternate() {
            Some(alt)
                if self.gear_slots.contains_key(&primary)
                    && !self.gear_slots.contains_key(&alt) => alt,
            _ => primary,
        };

        if target == EquipmentSlot::Bag {
            if matches!(from, SlotRef::Backpack(_)) {
                return Err(GameError::InvalidAction("cannot equip a bag from inside the bag".into()));
            }
            if self.gear_slots.get(&target).is_some_and(|bag| !bag.is_empty_container()) {
                return Err(GameError::InvalidAction("empty the bag before swapping it".into()));
            }
        }

        let previous = self.gear_slots.remove(&target);
        *self.slot_mut(from)? = previous.map(|p| ItemStack { item: p.item, quantity: p.quantity });

        let contents = if target == EquipmentSlot::Bag {
            vec![None; def.container_slots]
        } else {
            Vec::new()
        };
        self.gear_slots.insert(target, Equipped {
            item:     stack.item,
            quantity: stack.quantity,
            contents,
        });
        Ok(target)
    }

    /// Move an equipped item into the first free general slot (or the
    /// backpack). Returns where it landed.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> GameResult<SlotRef> {
        let equipped = self
            .gear_slots
            .get(&slot)
            .ok_or_else(|| GameError::InvalidSlot(format!("nothing equipped in {}", slot.name())))?;
        if !equipped.is_empty_container() {
            return Err(GameError::InvalidAction("empty the bag before removing it".into()));
        }

        let free_general = self.general_slots.iter().position(Option::is_none).map(SlotRef::General);
        let free_backpack = (slot != EquipmentSlot::Bag)
            .then(|| self.backpack().iter().position(Option::is_none).map(SlotRef::Backpack))
            .flatten();
        let destination = free_general
            .or(free_backpack)
            .ok_or_else(|| GameError::InventoryFull { item: equipped.item.clone() })?;

        if let Some(item) = self.gear_slots.remove(&slot) {
            *self.slot_mut(destination)? = Some(ItemStack { item: item.item, quantity: item.quantity });
        }
        Ok(destination)
    }

    /// Total carried weight: equipment, the bag and its contents, and the
    /// general slots.
    pub fn carried_weight(&self, catalog: &dyn ItemCatalog) -> f64 {
        let worn: f64 = self
            .gear_slots
            .values()
            .map(|e| catalog.item_weight(&e.item) * f64::from(e.quantity))
            .sum();
        let carried: f64 = self
            .general_slots
            .iter()
            .chain(self.backpack().iter())
            .flatten()
            .map(|s| catalog.item_weight(&s.item) * f64::from(s.quantity))
            .sum();
        worn + carried
    }

    /// Extra carry capacity granted by the equipped bag.
    pub fn capacity_bonus(&self, catalog: &dyn ItemCatalog) -> f64 {
        self.gear_slots
            .get(&EquipmentSlot::Bag)
            .and_then(|bag| catalog.item(&bag.item))
            .map(|def| def.weight_increase)
            .unwrap_or(0.0)
    }
}

pub(crate) fn stack_into(slots: &mut [Slot], item_id: &str, max_stack: u32, remaining: &mut u32) {
    for stack in slots.iter_mut().flatten() {
        if *remaining == 0 {
            break;
        }
        if stack.item != item_id || stack.quantity >= max_stack {
            continue;
        }
        let added = (max_stack - stack.quantity).min(*remaining);
        stack.quantity += added;
        *remaining -= added;
    }
}

pub(crate) fn fill_empty(slots: &mut [Slot], item_id: &str, max_stack: u32, remaining: &mut u32) {
    for slot in slots.iter_mut() {
        if *remaining == 0 {
            break;
        }
        if slot.is_none() {
            let added = max_stack.min(*remaining);
            *slot = Some(ItemStack { item: item_id.to_string(), quantity: added });
            *remaining -= added;
        }
    }
}
