//! Item definitions and the read-only catalog interface.

use crate::types::{EffectId, ItemId};
use serde::{Deserialize, Serialize};

/// The item whose stacks make up a character's gold.
pub const GOLD_ITEM: &str = "gold-piece";

fn default_stack() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id:   ItemId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    /// Weight of a single unit.
    #[serde(default)]
    pub weight: f64,
    /// Maximum units per slot.
    #[serde(default = "default_stack")]
    pub stack: u32,
    /// Raw gear slot name from game data ("hands", "ring", "bag", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear_slot: Option<String>,
    /// Carry capacity added while equipped as the bag.
    #[serde(default)]
    pub weight_increase: f64,
    /// Nested slots provided when equipped as the bag.
    #[serde(default)]
    pub container_slots: usize,
    /// Effect templates applied when the item is used.
    #[serde(default)]
    pub effects: Vec<EffectId>,
    #[serde(default)]
    pub consumable: bool,
    #[serde(default)]
    pub price: i64,
}

pub trait ItemCatalog {
    fn item(&self, item_id: &str) -> Option<&ItemDef>;

    /// Unit weight, 0 for unknown items.
    fn item_weight(&self, item_id: &str) -> f64 {
        self.item(item_id).map(|i| i.weight).unwrap_or(0.0)
    }
}
