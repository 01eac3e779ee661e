//! World data (locations, building hours, NPC schedules) and the
//! read-only WorldView the snapshot pulls derived state from.
//!
//! All lookups take the clock's time of day explicitly; nothing here
//! reads wall time.

use crate::types::{BuildingId, ItemId, Minutes, NpcId, MINUTES_PER_DAY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Buildings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenHours {
    /// "always"
    Keyword(String),
    /// Opening minute of the day. Negative = never open to the public.
    Minute(Minutes),
}

impl Default for OpenHours {
    fn default() -> Self {
        Self::Keyword("always".into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub id:   BuildingId,
    pub name: String,
    #[serde(default)]
    pub open: OpenHours,
    /// Closing minute. Missing = open until midnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<Minutes>,
    /// Gold for one night's room. None = no rooms to rent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_price: Option<u32>,
    /// One-off gold to register a vault. None = no vaults here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_price: Option<u32>,
}

impl BuildingDef {
    /// Whether the doors are open at `time_of_day`. Ranges whose close
    /// precedes their open wrap past midnight.
    pub fn is_open(&self, time_of_day: Minutes) -> bool {
        let open = match &self.open {
            OpenHours::Keyword(k) => return k == "always",
            OpenHours::Minute(m) if *m < 0 => return false,
            OpenHours::Minute(m) => *m,
        };
        let close = self.close.unwrap_or(MINUTES_PER_DAY);
        let now = time_of_day.rem_euclid(MINUTES_PER_DAY);
        if close < open {
            now >= open || now < close
        } else {
            now >= open && now < close
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictDef {
    pub name: String,
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDef {
    pub id:   String,
    pub name: String,
    /// District key ("center") → district.
    #[serde(default)]
    pub districts: BTreeMap<String, DistrictDef>,
}

impl LocationDef {
    pub fn building(&self, district: &str, building_id: &str) -> Option<&BuildingDef> {
        self.districts
            .get(district)?
            .buildings
            .iter()
            .find(|b| b.id == building_id)
    }
}

/// Full id of a district as NPC schedules refer to it ("kingdom-center").
pub fn district_place_id(city: &str, district: &str) -> String {
    format!("{city}-{district}")
}

// ── NPCs ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Building,
    District,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcScheduleSlot {
    pub start: Minutes,
    pub end:   Minutes,
    pub location_type: PlaceKind,
    /// Building id, or full district id for district slots.
    pub location: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub dialogue_options: Vec<String>,
    #[serde(default)]
    pub available_actions: Vec<String>,
}

impl NpcScheduleSlot {
    pub fn covers(&self, time_of_day: Minutes) -> bool {
        let now = time_of_day.rem_euclid(MINUTES_PER_DAY);
        if self.end < self.start {
            now >= self.start || now < self.end
        } else {
            now >= self.start && now < self.end
        }
    }
}

/// Active slot at `time_of_day`. A schedule with gaps falls back to its
/// first slot; an empty schedule has none.
pub fn current_schedule_slot(schedule: &[NpcScheduleSlot], time_of_day: Minutes) -> Option<&NpcScheduleSlot> {
    schedule
        .iter()
        .find(|slot| slot.covers(time_of_day))
        .or_else(|| schedule.first())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopStock {
    pub item:      ItemId,
    pub max_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    pub starting_gold: u64,
    /// Real-time minutes between restocks.
    pub restock_interval: i64,
    #[serde(default)]
    pub inventory: Vec<ShopStock>,
    /// Fraction of the list price paid when buying from the player.
    #[serde(default = "default_buy_back")]
    pub buy_back_rate: f64,
}

fn default_buy_back() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDef {
    pub id:   NpcId,
    pub name: String,
    #[serde(default)]
    pub title: String,
    /// City id.
    pub location: String,
    pub district: String,
    /// Home building; where an unscheduled NPC is found.
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub schedule: Vec<NpcScheduleSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_config: Option<ShopConfig>,
}

impl NpcDef {
    /// Where the NPC is at `time_of_day`.
    pub fn whereabouts(&self, time_of_day: Minutes) -> (PlaceKind, String) {
        if let Some(slot) = current_schedule_slot(&self.schedule, time_of_day) {
            return (slot.location_type, slot.location.clone());
        }
        if self.building.is_empty() {
            (PlaceKind::District, district_place_id(&self.location, &self.district))
        } else {
            (PlaceKind::Building, self.building.clone())
        }
    }

    /// Whether the player at (city, district, building) can see this NPC.
    pub fn is_visible_from(&self, city: &str, district: &str, building: &str, time_of_day: Minutes) -> bool {
        if self.location != city {
            return false;
        }
        match self.whereabouts(time_of_day) {
            (PlaceKind::Building, id) => !building.is_empty() && id == building,
            (PlaceKind::District, id) => building.is_empty() && id == district_place_id(city, district),
        }
    }
}

// ── Collaborator ─────────────────────────────────────────────────────────────

/// Read-only world queries. Missing data yields empty collections.
pub trait WorldView {
    fn visible_npcs(&self, city: &str, district: &str, building: &str, time_of_day: Minutes) -> BTreeSet<NpcId>;

    fn building_states(&self, city: &str, district: &str, time_of_day: Minutes) -> BTreeMap<BuildingId, bool>;

    fn has_district(&self, _city: &str, _district: &str) -> bool {
        false
    }

    fn npc(&self, _npc_id: &str) -> Option<&NpcDef> {
        None
    }

    fn building(&self, _city: &str, _district: &str, _building_id: &str) -> Option<&BuildingDef> {
        None
    }
}

/// A world with nothing in it.
pub struct NoWorld;

impl WorldView for NoWorld {
    fn visible_npcs(&self, _: &str, _: &str, _: &str, _: Minutes) -> BTreeSet<NpcId> {
        BTreeSet::new()
    }

    fn building_states(&self, _: &str, _: &str, _: Minutes) -> BTreeMap<BuildingId, bool> {
        BTreeMap::new()
    }
}
