//! Vaults: per-building item storage registered by the player.
//!
//! Vault contents are part of the save but are not carried, so they never
//! count toward weight or gold. A vault is only reachable while standing
//! in the building it was registered at.

use crate::{
    error::{GameError, GameResult},
    inventory::{fill_empty, stack_into, ItemStack, Slot},
    items::ItemCatalog,
    types::BuildingId,
};
use serde::{Deserialize, Serialize};

pub const VAULT_SLOTS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub building: BuildingId,
    pub slots:    Vec<Slot>,
}

impl Vault {
    pub fn new(building: &str) -> Self {
        Self { building: building.to_string(), slots: vec![None; VAULT_SLOTS] }
    }

    /// Store a stack, topping up matching stacks before using empty slots.
    /// Returns how many units fit.
    pub fn deposit(&mut self, catalog: &dyn ItemCatalog, stack: &ItemStack) -> GameResult<u32> {
        let max_stack = catalog
            .item(&stack.item)
            .ok_or_else(|| GameError::ItemNotFound { id: stack.item.clone() })?
            .stack
            .max(1);
        let mut remaining = stack.quantity;
        stack_into(&mut self.slots, &stack.item, max_stack, &mut remaining);
        fill_empty(&mut self.slots, &stack.item, max_stack, &mut remaining);
        Ok(stack.quantity - remaining)
    }

    /// Take up to `quantity` units from one slot. 0 takes the whole stack.
    pub fn withdraw(&mut self, index: usize, quantity: u32) -> GameResult<ItemStack> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| GameError::InvalidSlot(format!("vault slot {index} does not exist")))?;
        let stack = slot
            .as_mut()
            .ok_or_else(|| GameError::InvalidSlot(format!("vault slot {index} is empty")))?;
        let taken = if quantity == 0 { stack.quantity } else { quantity.min(stack.quantity) };
        stack.quantity -= taken;
        let removed = ItemStack { item: stack.item.clone(), quantity: taken };
        if stack.quantity == 0 {
            *slot = None;
        }
        Ok(removed)
    }

    /// Put units back into a slot after a withdrawal could not be carried.
    pub fn restore(&mut self, index: usize, stack: ItemStack) {
        if let Some(slot) = self.slots.get_mut(index) {
            match slot {
                Some(s) => s.quantity += stack.quantity,
                None    => *slot = Some(stack),
            }
        }
    }
}

pub fn vault_at<'a>(vaults: &'a [Vault], building: &str) -> Option<&'a Vault> {
    vaults.iter().find(|v| v.building == building)
}

pub fn vault_at_mut<'a>(vaults: &'a mut [Vault], building: &str) -> Option<&'a mut Vault> {
    vaults.iter_mut().find(|v| v.building == building)
}
