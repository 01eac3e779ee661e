//! Game data: effect templates, items, locations and NPCs.
//!
//! RULE: game data is loaded once and then only read. GameData is the
//! stock implementation of every read-only collaborator trait.

use crate::{
    effect::{EffectComponent, EffectKind, EffectTemplate},
    items::{ItemCatalog, ItemDef},
    templates::EffectTemplateStore,
    types::{BuildingId, EffectId, ItemId, Minutes, NpcId},
    world::{
        BuildingDef, DistrictDef, LocationDef, NpcDef, NpcScheduleSlot, OpenHours, PlaceKind,
        ShopConfig, ShopStock, WorldView,
    },
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Deserialize)]
struct EffectsFile {
    effects: Vec<EffectTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemsFile {
    items: Vec<ItemDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct LocationsFile {
    locations: Vec<LocationDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct NpcsFile {
    npcs: Vec<NpcDef>,
}

#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub effects:   HashMap<EffectId, EffectTemplate>,
    pub items:     HashMap<ItemId, ItemDef>,
    pub locations: HashMap<String, LocationDef>,
    /// Sorted so NPC queries are deterministic.
    pub npcs:      BTreeMap<NpcId, NpcDef>,
}

impl GameData {
    pub fn from_parts(
        effects:   Vec<EffectTemplate>,
        items:     Vec<ItemDef>,
        locations: Vec<LocationDef>,
        npcs:      Vec<NpcDef>,
    ) -> Self {
        Self {
            effects:   effects.into_iter().map(|e| (e.id.clone(), e)).collect(),
            items:     items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            locations: locations.into_iter().map(|l| (l.id.clone(), l)).collect(),
            npcs:      npcs.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    /// Load the four JSON files from `data_dir`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let effects: EffectsFile = read_json(&format!("{data_dir}/effects.json"))?;
        let items: ItemsFile = read_json(&format!("{data_dir}/items.json"))?;
        let locations: LocationsFile = read_json(&format!("{data_dir}/locations.json"))?;
        let npcs: NpcsFile = read_json(&format!("{data_dir}/npcs.json"))?;

        let data = Self::from_parts(effects.effects, items.items, locations.locations, npcs.npcs);
        data.validate()?;
        log::info!(
            "loaded game data from {data_dir}: {} effects, {} items, {} locations, {} npcs",
            data.effects.len(),
            data.items.len(),
            data.locations.len(),
            data.npcs.len()
        );
        Ok(data)
    }

    /// The data set shipped in the repository's `data/` directory.
    pub fn bundled() -> anyhow::Result<Self> {
        let effects: EffectsFile = serde_json::from_str(include_str!("../../data/effects.json"))?;
        let items: ItemsFile = serde_json::from_str(include_str!("../../data/items.json"))?;
        let locations: LocationsFile = serde_json::from_str(include_str!("../../data/locations.json"))?;
        let npcs: NpcsFile = serde_json::from_str(include_str!("../../data/npcs.json"))?;

        let data = Self::from_parts(effects.effects, items.items, locations.locations, npcs.npcs);
        data.validate()?;
        Ok(data)
    }

    /// Every item effect and shop item must resolve.
    pub fn validate(&self) -> anyhow::Result<()> {
        for item in self.items.values() {
            for effect_id in &item.effects {
                if self.find_template(effect_id).is_none() {
                    anyhow::bail!("item {} references unknown effect {effect_id}", item.id);
                }
            }
        }
        for npc in self.npcs.values() {
            for stock in npc.shop_config.iter().flat_map(|s| s.inventory.iter()) {
                if !self.items.contains_key(&stock.item) {
                    anyhow::bail!("npc {} sells unknown item {}", npc.id, stock.item);
                }
            }
        }
        Ok(())
    }

    /// Minimal built-in data used by tests.
    pub fn default_test() -> Self {
        use EffectKind::*;

        let effects = vec![
            system("fatigue-accumulation", vec![ticking(Fatigue, 1, 120)]),
            system("hunger-accumulation-stuffed", vec![ticking(Hunger, -1, 360)]),
            system("hunger-accumulation-wellfed", vec![ticking(Hunger, -1, 240)]),
            system("hunger-accumulation-hungry", vec![ticking(Hunger, -1, 240)]),
            template(
                "starving",
                "debuff",
                vec![EffectComponent {
                    tick_message: Some("You're starving! You lose 1 HP from lack of food.".into()),
                    ..ticking(Hp, -1, 240)
                }],
            ),
            template("hungry", "debuff", vec![stat(Dexterity, -1)]),
            template("stuffed", "buff", vec![stat(Constitution, 1), stat(Strength, -1), stat(Dexterity, -1)]),
            template("tired", "debuff", vec![stat(Dexterity, -1)]),
            template("very-tired", "debuff", vec![stat(Dexterity, -1), stat(Wisdom, -1)]),
            template("fatigued", "debuff", vec![stat(Strength, -1), stat(Dexterity, -2), stat(Wisdom, -1)]),
            template("exhaustion", "debuff", vec![stat(Strength, -2), stat(Dexterity, -3), stat(Wisdom, -2)]),
            template("encumbrance-light", "buff", vec![stat(Dexterity, 1)]),
            template("encumbrance-overweight", "debuff", vec![stat(Dexterity, -1), stat(Strength, -1)]),
            template("encumbrance-encumbered", "debuff", vec![stat(Dexterity, -2), stat(Strength, -2)]),
            template(
                "encumbrance-overloaded",
                "debuff",
                vec![stat(Dexterity, -3), stat(Strength, -3), stat(Constitution, -2)],
            ),
            template("minor-healing", "buff", vec![stat(Hp, 10)]),
            template("eat-bread", "buff", vec![stat(Hunger, 1)]),
            template("strength-draught", "buff", vec![EffectComponent { duration: 60, ..stat(Strength, 2) }]),
            template(
                "regeneration",
                "buff",
                vec![EffectComponent { delay: 10, duration: 120, ..ticking(Hp, 1, 30) }],
            ),
        ];

        let items = vec![
            ItemDef { stack: 1000, price: 1, ..item("gold-piece", 0.0) },
            ItemDef {
                stack: 10,
                consumable: true,
                effects: vec!["eat-bread".into()],
                price: 2,
                ..item("bread", 0.5)
            },
            ItemDef { stack: 5, price: 20, ..item("iron-ingot", 10.0) },
            ItemDef {
                gear_slot: Some("bag".into()),
                weight_increase: 20.0,
                container_slots: 20,
                price: 15,
                ..item("backpack", 2.0)
            },
            ItemDef { gear_slot: Some("hands".into()), price: 30, ..item("longsword", 3.0) },
            ItemDef { gear_slot: Some("hands".into()), price: 8, ..item("dagger", 1.0) },
            ItemDef { gear_slot: Some("chest".into()), price: 25, ..item("leather-armor", 10.0) },
            ItemDef { gear_slot: Some("ring".into()), price: 40, ..item("iron-ring", 0.1) },
            ItemDef {
                stack: 5,
                consumable: true,
                effects: vec!["minor-healing".into()],
                price: 20,
                ..item("health-potion", 0.5)
            },
            ItemDef {
                stack: 5,
                consumable: true,
                effects: vec!["strength-draught".into()],
                price: 35,
                ..item("strength-draught", 0.5)
            },
        ];

        let center = DistrictDef {
            name:      "Kingdom Center".into(),
            buildings: vec![
                building("general-store", OpenHours::Minute(480), Some(1200)),
                BuildingDef { room_price: Some(10), ..building("tavern", OpenHours::Minute(960), Some(120)) },
                building("temple", OpenHours::default(), None),
                building("guild-vault", OpenHours::Minute(-1), None),
                BuildingDef { vault_price: Some(25), ..building("bank", OpenHours::Minute(480), Some(1080)) },
            ],
        };
        let market = DistrictDef {
            name:      "Market Row".into(),
            buildings: vec![building("smithy", OpenHours::Minute(360), Some(1080))],
        };
        let locations = vec![LocationDef {
            id:        "kingdom".into(),
            name:      "The Kingdom".into(),
            districts: BTreeMap::from([("center".into(), center), ("market".into(), market)]),
        }];

        let npcs = vec![
            NpcDef {
                building: "general-store".into(),
                schedule: vec![
                    slot(480, 1200, PlaceKind::Building, "general-store"),
                    slot(1200, 1320, PlaceKind::Building, "tavern"),
                    slot(1320, 480, PlaceKind::Building, "garrick-home"),
                ],
                shop_config: Some(ShopConfig {
                    starting_gold:    500,
                    restock_interval: 60,
                    inventory:        vec![
                        ShopStock { item: "bread".into(), max_stock: 20 },
                        ShopStock { item: "health-potion".into(), max_stock: 5 },
                        ShopStock { item: "backpack".into(), max_stock: 2 },
                        ShopStock { item: "iron-ingot".into(), max_stock: 10 },
                    ],
                    buy_back_rate:    0.5,
                }),
                ..npc("garrick")
            },
            NpcDef { building: "tavern".into(), ..npc("mira") },
            NpcDef {
                schedule: vec![
                    slot(360, 1320, PlaceKind::District, "kingdom-center"),
                    slot(1320, 360, PlaceKind::Building, "tavern"),
                ],
                ..npc("town-crier")
            },
        ];

        Self::from_parts(effects, items, locations, npcs)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

// ── Fixture helpers ──────────────────────────────────────────────────────────

fn stat(kind: EffectKind, value: i64) -> EffectComponent {
    EffectComponent { kind, value, delay: 0, duration: 0, tick_interval: 0, tick_message: None }
}

fn ticking(kind: EffectKind, value: i64, interval: Minutes) -> EffectComponent {
    EffectComponent { tick_interval: interval, ..stat(kind, value) }
}

fn template(id: &str, category: &str, components: Vec<EffectComponent>) -> EffectTemplate {
    EffectTemplate {
        id:          id.into(),
        name:        id.into(),
        description: String::new(),
        category:    category.into(),
        message:     format!("{id} applied"),
        color:       String::new(),
        silent:      false,
        components,
    }
}

fn system(id: &str, components: Vec<EffectComponent>) -> EffectTemplate {
    EffectTemplate { silent: true, ..template(id, "system", components) }
}

fn item(id: &str, weight: f64) -> ItemDef {
    ItemDef {
        id:              id.into(),
        name:            id.into(),
        item_type:       String::new(),
        weight,
        stack:           1,
        gear_slot:       None,
        weight_increase: 0.0,
        container_slots: 0,
        effects:         Vec::new(),
        consumable:      false,
        price:           0,
    }
}

fn building(id: &str, open: OpenHours, close: Option<Minutes>) -> BuildingDef {
    BuildingDef { id: id.into(), name: id.into(), open, close, room_price: None, vault_price: None }
}

fn slot(start: Minutes, end: Minutes, location_type: PlaceKind, location: &str) -> NpcScheduleSlot {
    NpcScheduleSlot {
        start,
        end,
        location_type,
        location: location.into(),
        state: String::new(),
        dialogue_options: Vec::new(),
        available_actions: Vec::new(),
    }
}

fn npc(id: &str) -> NpcDef {
    NpcDef {
        id:          id.into(),
        name:        id.into(),
        title:       String::new(),
        location:    "kingdom".into(),
        district:    "center".into(),
        building:    String::new(),
        schedule:    Vec::new(),
        shop_config: None,
    }
}

// ── Collaborator impls ───────────────────────────────────────────────────────

impl EffectTemplateStore for GameData {
    fn find_template(&self, effect_id: &str) -> Option<&EffectTemplate> {
        self.effects.get(effect_id)
    }
}

impl ItemCatalog for GameData {
    fn item(&self, item_id: &str) -> Option<&ItemDef> {
        self.items.get(item_id)
    }
}

impl WorldView for GameData {
    fn visible_npcs(&self, city: &str, district: &str, building: &str, time_of_day: Minutes) -> BTreeSet<NpcId> {
        self.npcs
            .values()
            .filter(|npc| npc.is_visible_from(city, district, building, time_of_day))
            .map(|npc| npc.id.clone())
            .collect()
    }

    fn building_states(&self, city: &str, district: &str, time_of_day: Minutes) -> BTreeMap<BuildingId, bool> {
        self.locations
            .get(city)
            .and_then(|l| l.districts.get(district))
            .map(|d| {
                d.buildings
                    .iter()
                    .map(|b| (b.id.clone(), b.is_open(time_of_day)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_district(&self, city: &str, district: &str) -> bool {
        self.locations
            .get(city)
            .is_some_and(|l| l.districts.contains_key(district))
    }

    fn npc(&self, npc_id: &str) -> Option<&NpcDef> {
        self.npcs.get(npc_id)
    }

    fn building(&self, city: &str, district: &str, building_id: &str) -> Option<&BuildingDef> {
        self.locations.get(city)?.building(district, building_id)
    }
}
