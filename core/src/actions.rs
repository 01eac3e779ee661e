//! Game actions: every state mutation paired with the reconciliation it
//! requires.
//!
//! RULE: nothing outside this module mutates a character's counters,
//! inventory or clock during play. Each wrapper mutates first, then
//! reconciles the statuses the mutation can move, so callers can never
//! forget a step.
//!
//! Order per action: validate → mutate → advance/reconcile. Snapshots and
//! deltas are taken around dispatch() by session.rs.

use crate::{
    character::{Character, BASELINE_HUNGER, MAX_FATIGUE, MAX_HUNGER},
    config::GameData,
    effect::EffectMessage,
    error::{GameError, GameResult},
    inventory::{EquipmentSlot, ItemStack, SlotRef},
    items::{ItemCatalog, GOLD_ITEM},
    lodging::Lodging,
    merchant::{MerchantRegistry, Trade},
    simulator::EffectSimulator,
    status::{
        remove_hunger_accumulation, reset_fatigue_accumulator, reset_hunger_accumulator, StatusKind,
        StatusReconciler,
    },
    storage::{vault_at, vault_at_mut, Vault},
    templates::EffectTemplateStore,
    types::Minutes,
    world::{BuildingDef, ShopConfig, WorldView},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sleep always ends at 6 AM.
pub const WAKE_UP_TIME: Minutes = 6 * 60;

/// Going to bed in this window (6 AM to noon) leaves the character tired.
const POOR_SLEEP_WINDOW: (Minutes, Minutes) = (360, 720);

/// A rest passes eight hours.
pub const REST_MINUTES: Minutes = 8 * 60;

pub const MIN_WAIT: Minutes = 15;
pub const MAX_WAIT: Minutes = 360;

// ── Context ──────────────────────────────────────────────────────────────────

/// Read-only collaborators an action needs.
#[derive(Clone, Copy)]
pub struct GameContext<'a> {
    pub effects:   &'a dyn EffectTemplateStore,
    pub items:     &'a dyn ItemCatalog,
    pub world:     &'a dyn WorldView,
    pub merchants: Option<&'a MerchantRegistry>,
}

impl<'a> GameContext<'a> {
    pub fn new(data: &'a GameData) -> Self {
        Self { effects: data, items: data, world: data, merchants: None }
    }

    pub fn with_merchants(mut self, merchants: &'a MerchantRegistry) -> Self {
        self.merchants = Some(merchants);
        self
    }

    pub fn reconciler(&self) -> StatusReconciler<'a> {
        StatusReconciler::new(self.effects, self.items)
    }
}

// ── Outcome ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub message: String,
    pub color:   String,
    /// Messages from applied effects, tier changes and ticks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effect_messages: Vec<EffectMessage>,
}

impl ActionOutcome {
    fn new(message: impl Into<String>, color: &str) -> Self {
        Self { message: message.into(), color: color.into(), effect_messages: Vec::new() }
    }

    fn with_effects(mut self, messages: Vec<EffectMessage>) -> Self {
        self.effect_messages.extend(messages);
        self
    }
}

// ── Reconciliation helpers ───────────────────────────────────────────────────

/// Bring accumulators and every tier back in line with the counters.
fn settle(reconciler: &StatusReconciler<'_>, character: &mut Character) -> Vec<EffectMessage> {
    if let Err(e) = reconciler.ensure_fatigue_accumulation(character) {
        log::warn!("could not ensure fatigue accumulation: {e}");
    }
    if character.hunger <= 0 {
        remove_hunger_accumulation(character);
    } else if let Err(e) = reconciler.ensure_hunger_accumulation(character) {
        log::warn!("could not ensure hunger accumulation: {e}");
    }
    reconciler.reconcile_all(character)
}

fn settle_encumbrance(reconciler: &StatusReconciler<'_>, character: &mut Character) -> Vec<EffectMessage> {
    reconciler.reconcile(character, StatusKind::Encumbrance).into_iter().collect()
}

fn item_name(ctx: &GameContext<'_>, item_id: &str) -> String {
    ctx.items.item(item_id).map(|i| i.name.clone()).unwrap_or_else(|| item_id.to_string())
}

// ── Inventory ────────────────────────────────────────────────────────────────

pub fn pick_up(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    item_id:   &str,
    quantity:  u32,
) -> GameResult<ActionOutcome> {
    let added = character.inventory.add_item(ctx.items, item_id, quantity)?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    let name = item_name(ctx, item_id);
    let outcome = if added < quantity {
        ActionOutcome::new(format!("Picked up {added} {name}; no room for the rest"), "yellow")
    } else {
        ActionOutcome::new(format!("Picked up {added} {name}"), "white")
    };
    Ok(outcome.with_effects(messages))
}

/// Drop from a slot. Quantity 0 drops the whole stack.
pub fn drop_item(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    at:        SlotRef,
    quantity:  u32,
) -> GameResult<ActionOutcome> {
    let dropped = character.inventory.remove_from_slot(at, quantity)?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    let name = item_name(ctx, &dropped.item);
    Ok(ActionOutcome::new(format!("Dropped {} {name}", dropped.quantity), "white").with_effects(messages))
}

pub fn move_item(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    from:      SlotRef,
    to:        SlotRef,
) -> GameResult<ActionOutcome> {
    character.inventory.move_item(ctx.items, from, to)?;
    Ok(ActionOutcome::new("Moved item", "white"))
}

pub fn split_item(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    from:      SlotRef,
    to:        SlotRef,
    quantity:  u32,
) -> GameResult<ActionOutcome> {
    character.inventory.split_item(from, to, quantity)?;
    let name = character
        .inventory
        .slot(to)?
        .as_ref()
        .map(|s| item_name(ctx, &s.item))
        .unwrap_or_default();
    Ok(ActionOutcome::new(format!("Split off {quantity} {name}"), "white"))
}

pub fn stack_item(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    from:      SlotRef,
    to:        SlotRef,
) -> GameResult<ActionOutcome> {
    let total = character.inventory.stack_item(ctx.items, from, to)?;
    Ok(ActionOutcome::new(format!("Stacked items ({total} total)"), "white"))
}

pub fn equip(ctx: &GameContext<'_>, character: &mut Character, from: SlotRef) -> GameResult<ActionOutcome> {
    let slot = character.inventory.equip(ctx.items, from)?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    let name = character
        .inventory
        .equipped(slot)
        .map(|e| item_name(ctx, &e.item))
        .unwrap_or_default();
    Ok(ActionOutcome::new(format!("Equipped {name} ({})", slot.name()), "white").with_effects(messages))
}

pub fn unequip(ctx: &GameContext<'_>, character: &mut Character, slot: EquipmentSlot) -> GameResult<ActionOutcome> {
    character.inventory.unequip(slot)?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    Ok(ActionOutcome::new(format!("Unequipped {}", slot.name()), "white").with_effects(messages))
}

/// Use the item in a slot: apply its effects, consume one if consumable.
pub fn use_item(ctx: &GameContext<'_>, character: &mut Character, at: SlotRef) -> GameResult<ActionOutcome> {
    let stack = character
        .inventory
        .slot(at)?
        .clone()
        .ok_or_else(|| GameError::InvalidSlot(format!("{at:?} is empty")))?;
    let def = ctx
        .items
        .item(&stack.item)
        .ok_or_else(|| GameError::ItemNotFound { id: stack.item.clone() })?;
    if def.effects.is_empty() {
        return Err(GameError::InvalidAction(format!("{} cannot be used", def.name)));
    }
    // Resolve every template before touching the character.
    for effect_id in &def.effects {
        ctx.effects.template(effect_id)?;
    }

    let reconciler = ctx.reconciler();
    let mut messages = Vec::new();
    for effect_id in &def.effects {
        messages.push(reconciler.simulator().apply_template(character, effect_id)?);
    }
    if def.consumable {
        character.inventory.remove_from_slot(at, 1)?;
    }
    messages.extend(settle(&reconciler, character));

    log::debug!("used item={} effects={:?}", def.id, def.effects);
    Ok(ActionOutcome::new(format!("You use the {}", def.name), "green").with_effects(messages))
}

// ── Counters ─────────────────────────────────────────────────────────────────

pub fn set_fatigue(ctx: &GameContext<'_>, character: &mut Character, value: i64) -> Vec<EffectMessage> {
    character.fatigue = value.clamp(0, MAX_FATIGUE);
    settle(&ctx.reconciler(), character)
}

pub fn change_fatigue(ctx: &GameContext<'_>, character: &mut Character, delta: i64) -> Vec<EffectMessage> {
    let value = character.fatigue + delta;
    set_fatigue(ctx, character, value)
}

pub fn set_hunger(ctx: &GameContext<'_>, character: &mut Character, value: i64) -> Vec<EffectMessage> {
    character.hunger = value.clamp(0, MAX_HUNGER);
    settle(&ctx.reconciler(), character)
}

pub fn change_hunger(ctx: &GameContext<'_>, character: &mut Character, delta: i64) -> Vec<EffectMessage> {
    let value = character.hunger + delta;
    set_hunger(ctx, character, value)
}

/// Apply an effect template directly (scripted events, debug tools).
pub fn apply_effect(ctx: &GameContext<'_>, character: &mut Character, effect_id: &str) -> GameResult<ActionOutcome> {
    let reconciler = ctx.reconciler();
    let message = reconciler.simulator().apply_template(character, effect_id)?;
    let mut messages = vec![message.clone()];
    messages.extend(settle(&reconciler, character));
    Ok(ActionOutcome::new(message.message, &message.color).with_effects(messages))
}

// ── Time ─────────────────────────────────────────────────────────────────────

/// Move the clock and every active effect forward by `minutes`.
pub fn advance_time(ctx: &GameContext<'_>, character: &mut Character, minutes: Minutes) -> Vec<EffectMessage> {
    if minutes <= 0 {
        return Vec::new();
    }
    let reconciler = ctx.reconciler();
    character.clock.advance(minutes);
    let mut messages = reconciler.simulator().advance(character, minutes);
    messages.extend(settle(&reconciler, character));
    log::debug!(
        "advanced {minutes}m -> day={} tod={} fatigue={} hunger={}",
        character.clock.current_day,
        character.clock.time_of_day,
        character.fatigue,
        character.hunger
    );
    messages
}

pub fn wait(ctx: &GameContext<'_>, character: &mut Character, minutes: Minutes) -> GameResult<ActionOutcome> {
    if !(MIN_WAIT..=MAX_WAIT).contains(&minutes) {
        return Err(GameError::InvalidAction(format!(
            "wait must be between {MIN_WAIT} and {MAX_WAIT} minutes"
        )));
    }
    let messages = advance_time(ctx, character, minutes);
    Ok(ActionOutcome::new(format!("You wait for {minutes} minutes"), "white").with_effects(messages))
}

/// Sleep until 6 AM in a room rented at the current building. Timed
/// effects decay without ticking; counters reset; the room is used up.
pub fn sleep(ctx: &GameContext<'_>, character: &mut Character, lodging: &mut Lodging) -> GameResult<ActionOutcome> {
    let building = current_building(character)?;
    let room = lodging
        .room_at(&building)
        .ok_or_else(|| GameError::InvalidAction("You don't have a room rented here".into()))?;
    if room.is_expired(&character.clock) {
        lodging.check_out(&building);
        return Err(GameError::InvalidAction(
            "Your room rental has expired. Please rent another room.".into(),
        ));
    }

    let bedtime = character.clock.time_of_day;
    let poor_sleep = (POOR_SLEEP_WINDOW.0..=POOR_SLEEP_WINDOW.1).contains(&bedtime);
    let slept = character.clock.minutes_until(WAKE_UP_TIME);

    let reconciler = ctx.reconciler();
    character.clock.advance(slept);
    reconciler.simulator().decay_durations_only(character, slept);

    character.fatigue = if poor_sleep { 1 } else { 0 };
    reset_fatigue_accumulator(character);
    character.hunger = BASELINE_HUNGER;
    reset_hunger_accumulator(character);
    character.hp = character.max_hp;
    character.mana = character.max_mana;
    let messages = settle(&reconciler, character);
    lodging.check_out(&building);

    log::info!("slept {slept}m at {building} (poor={poor_sleep}) -> day={}", character.clock.current_day);
    let outcome = if poor_sleep {
        ActionOutcome::new("You wake up at 6 AM, but didn't sleep well due to going to bed late.", "yellow")
    } else {
        ActionOutcome::new("You wake up refreshed at 6 AM.", "green")
    };
    Ok(outcome.with_effects(messages))
}

/// Rest for eight hours anywhere: HP, mana and fatigue recover and timed
/// effects decay without ticking. Hunger is left alone.
pub fn rest(ctx: &GameContext<'_>, character: &mut Character) -> GameResult<ActionOutcome> {
    let reconciler = ctx.reconciler();
    character.clock.advance(REST_MINUTES);
    reconciler.simulator().decay_durations_only(character, REST_MINUTES);

    character.fatigue = 0;
    reset_fatigue_accumulator(character);
    character.hp = character.max_hp;
    character.mana = character.max_mana;
    let messages = settle(&reconciler, character);

    log::debug!("rested -> day={} tod={}", character.clock.current_day, character.clock.time_of_day);
    Ok(ActionOutcome::new("Rested and restored HP/Mana", "green").with_effects(messages))
}

// ── Housing ──────────────────────────────────────────────────────────────────

fn current_building(character: &Character) -> GameResult<String> {
    if !character.location.is_indoors() {
        return Err(GameError::InvalidAction("not in a building".into()));
    }
    Ok(character.location.building.clone())
}

fn building_here<'c>(ctx: &GameContext<'c>, character: &Character) -> GameResult<&'c BuildingDef> {
    let building = current_building(character)?;
    let location = &character.location;
    ctx.world
        .building(&location.city, &location.district, &building)
        .ok_or_else(|| GameError::InvalidAction(format!("no building {building} here")))
}

fn pay(character: &mut Character, cost: u32, what: &str) -> GameResult<()> {
    let gold = character.gold();
    if gold < u64::from(cost) {
        return Err(GameError::InvalidAction(format!(
            "You need {cost} gold to {what}. You have {gold} gold."
        )));
    }
    character.inventory.remove_item(GOLD_ITEM, cost);
    Ok(())
}

/// Rent a room for the night at the current building.
pub fn rent_room(ctx: &GameContext<'_>, character: &mut Character, lodging: &mut Lodging) -> GameResult<ActionOutcome> {
    let building = building_here(ctx, character)?;
    let price = building
        .room_price
        .ok_or_else(|| GameError::InvalidAction(format!("{} has no rooms", building.name)))?;
    if lodging.room_at(&building.id).is_some() {
        return Err(GameError::InvalidAction("You already have a room rented here".into()));
    }
    pay(character, price, "rent a room")?;
    lodging.rent(&building.id, &character.clock)?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    Ok(ActionOutcome::new(
        format!("Rented a room for {price} gold. You can sleep here until tomorrow night."),
        "green",
    )
    .with_effects(messages))
}

/// Pay once to open a vault at the current building.
pub fn register_vault(ctx: &GameContext<'_>, character: &mut Character) -> GameResult<ActionOutcome> {
    let building = building_here(ctx, character)?;
    let price = building
        .vault_price
        .ok_or_else(|| GameError::InvalidAction(format!("{} keeps no vaults", building.name)))?;
    if vault_at(&character.vaults, &building.id).is_some() {
        return Err(GameError::InvalidAction("You already have a vault here".into()));
    }
    pay(character, price, "register a vault")?;
    character.vaults.push(Vault::new(&building.id));
    log::info!("registered vault at {}", building.id);
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    Ok(ActionOutcome::new("Vault registered successfully", "green").with_effects(messages))
}

/// Move a carried stack into the vault here. Quantity 0 moves the whole
/// stack; whatever does not fit stays in the slot.
pub fn vault_deposit(
    ctx:       &GameContext<'_>,
    character: &mut Character,
    at:        SlotRef,
    quantity:  u32,
) -> GameResult<ActionOutcome> {
    let building = current_building(character)?;
    if vault_at(&character.vaults, &building).is_none() {
        return Err(GameError::InvalidAction("no vault registered at this location".into()));
    }
    let taken = character.inventory.remove_from_slot(at, quantity)?;
    let stored = match vault_at_mut(&mut character.vaults, &building) {
        Some(vault) => vault.deposit(ctx.items, &taken),
        None => Ok(0),
    };
    let stored = match stored {
        Ok(stored) => stored,
        Err(e) => {
            character.inventory.return_to_slot(at, taken)?;
            return Err(e);
        }
    };
    let left = taken.quantity - stored;
    if left > 0 {
        let rest = ItemStack { item: taken.item.clone(), quantity: left };
        character.inventory.return_to_slot(at, rest)?;
    }
    if stored == 0 {
        return Err(GameError::InvalidAction("The vault is full".into()));
    }

    let messages = settle_encumbrance(&ctx.reconciler(), character);
    let name = item_name(ctx, &taken.item);
    log::debug!("deposited {stored} {} at {building}", taken.item);
    Ok(ActionOutcome::new(format!("Deposited {stored} {name} in the vault"), "white").with_effects(messages))
}

/// Take a stack out of the vault here. Quantity 0 takes the whole stack;
/// whatever cannot be carried stays in the vault.
pub fn vault_withdraw(
    ctx:        &GameContext<'_>,
    character:  &mut Character,
    vault_slot: usize,
    quantity:   u32,
) -> GameResult<ActionOutcome> {
    let building = current_building(character)?;
    let vault = vault_at_mut(&mut character.vaults, &building)
        .ok_or_else(|| GameError::InvalidAction("no vault registered at this location".into()))?;
    let taken = vault.withdraw(vault_slot, quantity)?;

    let added = character
        .inventory
        .add_item(ctx.items, &taken.item, taken.quantity)
        .unwrap_or(0);
    let left = taken.quantity - added;
    if left > 0 {
        if let Some(vault) = vault_at_mut(&mut character.vaults, &building) {
            vault.restore(vault_slot, ItemStack { item: taken.item.clone(), quantity: left });
        }
    }
    if added == 0 {
        return Err(GameError::InventoryFull { item: taken.item });
    }

    let messages = settle_encumbrance(&ctx.reconciler(), character);
    let name = item_name(ctx, &taken.item);
    log::debug!("withdrew {added} {} at {building}", taken.item);
    Ok(ActionOutcome::new(format!("Withdrew {added} {name} from the vault"), "white").with_effects(messages))
}

// ── Movement ─────────────────────────────────────────────────────────────────

pub fn move_to(ctx: &GameContext<'_>, character: &mut Character, district: &str) -> GameResult<ActionOutcome> {
    if !ctx.world.has_district(&character.location.city, district) {
        return Err(GameError::InvalidAction(format!("unknown district {district}")));
    }
    character.location.district = district.to_string();
    character.location.building.clear();
    Ok(ActionOutcome::new(format!("You travel to {district}"), "white"))
}

pub fn enter_building(ctx: &GameContext<'_>, character: &mut Character, building_id: &str) -> GameResult<ActionOutcome> {
    if character.location.is_indoors() {
        return Err(GameError::InvalidAction("already inside a building".into()));
    }
    let building = ctx
        .world
        .building(&character.location.city, &character.location.district, building_id)
        .ok_or_else(|| GameError::InvalidAction(format!("no building {building_id} here")))?;
    if !building.is_open(character.clock.time_of_day) {
        return Err(GameError::InvalidAction(format!("{} is closed", building.name)));
    }
    character.location.building = building.id.clone();
    Ok(ActionOutcome::new(format!("You enter {}", building.name), "white"))
}

pub fn exit_building(character: &mut Character) -> GameResult<ActionOutcome> {
    if !character.location.is_indoors() {
        return Err(GameError::InvalidAction("not inside a building".into()));
    }
    character.location.building.clear();
    Ok(ActionOutcome::new("You step outside", "white"))
}

// ── Trade ────────────────────────────────────────────────────────────────────

fn open_shop<'c>(
    ctx:       &GameContext<'c>,
    character: &Character,
    npc_id:    &str,
) -> GameResult<(&'c MerchantRegistry, &'c ShopConfig)> {
    let merchants = ctx
        .merchants
        .ok_or_else(|| GameError::InvalidAction("trading is not available".into()))?;
    let location = &character.location;
    let visible = ctx
        .world
        .visible_npcs(&location.city, &location.district, &location.building, character.clock.time_of_day);
    if !visible.contains(npc_id) {
        return Err(GameError::InvalidAction(format!("{npc_id} is not here")));
    }
    let shop = ctx
        .world
        .npc(npc_id)
        .and_then(|n| n.shop_config.as_ref())
        .ok_or_else(|| GameError::InvalidAction(format!("{npc_id} does not trade")))?;
    Ok((merchants, shop))
}

fn to_units(amount: u64) -> GameResult<u32> {
    u32::try_from(amount).map_err(|_| GameError::InvalidAction("amount too large".into()))
}

pub fn buy(
    ctx:       &GameContext<'_>,
    player:    &str,
    character: &mut Character,
    npc_id:    &str,
    item_id:   &str,
    quantity:  u32,
    now:       DateTime<Utc>,
) -> GameResult<ActionOutcome> {
    let (merchants, shop) = open_shop(ctx, character, npc_id)?;
    let def = ctx
        .items
        .item(item_id)
        .ok_or_else(|| GameError::ItemNotFound { id: item_id.to_string() })?;
    let (state, _) = merchants.get_or_init(player, npc_id, shop, now)?;
    if quantity == 0 || state.stock_of(item_id) < quantity {
        return Err(GameError::InvalidAction(format!("{npc_id} does not have {quantity} {}", def.name)));
    }

    let unit_price = def.price.max(0) as u64;
    let cost = unit_price * u64::from(quantity);
    if character.gold() < cost {
        return Err(GameError::InvalidAction(format!("you need {cost} gold")));
    }

    character.inventory.remove_item(GOLD_ITEM, to_units(cost)?);
    let added = match character.inventory.add_item(ctx.items, item_id, quantity) {
        Ok(added) => added,
        Err(e) => {
            character.inventory.add_item(ctx.items, GOLD_ITEM, to_units(cost)?)?;
            return Err(e);
        }
    };
    let refund = unit_price * u64::from(quantity - added);
    if refund > 0 {
        character.inventory.add_item(ctx.items, GOLD_ITEM, to_units(refund)?)?;
    }
    let paid = cost - refund;

    merchants.record_trade(player, npc_id, Trade {
        item_id,
        stock_change: -i64::from(added),
        gold_change:  paid as i64,
    })?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    Ok(ActionOutcome::new(format!("Bought {added} {} for {paid} gold", def.name), "green").with_effects(messages))
}

/// Sell from a slot. Quantity 0 sells the whole stack.
pub fn sell(
    ctx:       &GameContext<'_>,
    player:    &str,
    character: &mut Character,
    npc_id:    &str,
    at:        SlotRef,
    quantity:  u32,
    now:       DateTime<Utc>,
) -> GameResult<ActionOutcome> {
    let (merchants, shop) = open_shop(ctx, character, npc_id)?;
    let stack = character
        .inventory
        .slot(at)?
        .clone()
        .ok_or_else(|| GameError::InvalidSlot(format!("{at:?} is empty")))?;
    if stack.item == GOLD_ITEM {
        return Err(GameError::InvalidAction("gold cannot be sold".into()));
    }
    let def = ctx
        .items
        .item(&stack.item)
        .ok_or_else(|| GameError::ItemNotFound { id: stack.item.clone() })?;
    let quantity = if quantity == 0 { stack.quantity } else { quantity.min(stack.quantity) };

    let unit_price = (def.price.max(0) as f64 * shop.buy_back_rate).floor() as u64;
    let total = unit_price * u64::from(quantity);
    let (state, _) = merchants.get_or_init(player, npc_id, shop, now)?;
    if state.gold < total {
        return Err(GameError::InvalidAction(format!("{npc_id} cannot afford that")));
    }

    let sold = character.inventory.remove_from_slot(at, quantity)?;
    if total > 0 {
        if let Err(e) = character.inventory.add_item(ctx.items, GOLD_ITEM, to_units(total)?) {
            character.inventory.return_to_slot(at, sold)?;
            return Err(e);
        }
    }

    merchants.record_trade(player, npc_id, Trade {
        item_id:      &def.id,
        stock_change: i64::from(quantity),
        gold_change:  -(total as i64),
    })?;
    let messages = settle_encumbrance(&ctx.reconciler(), character);
    Ok(ActionOutcome::new(format!("Sold {quantity} {} for {total} gold", def.name), "green").with_effects(messages))
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    PickUp { item_id: String, #[serde(default = "one")] quantity: u32 },
    Drop { slot: SlotRef, #[serde(default)] quantity: u32 },
    MoveItem { from: SlotRef, to: SlotRef },
    SplitItem { from: SlotRef, to: SlotRef, quantity: u32 },
    StackItem { from: SlotRef, to: SlotRef },
    Equip { slot: SlotRef },
    Unequip { slot: EquipmentSlot },
    UseItem { slot: SlotRef },
    Wait { minutes: Minutes },
    AdvanceTime { minutes: Minutes },
    Sleep,
    Rest,
    RentRoom,
    Move { district: String },
    EnterBuilding { building_id: String },
    ExitBuilding,
    Buy { npc_id: String, item_id: String, #[serde(default = "one")] quantity: u32 },
    Sell { npc_id: String, slot: SlotRef, #[serde(default)] quantity: u32 },
    ApplyEffect { effect_id: String },
    RegisterVault,
    VaultDeposit { slot: SlotRef, #[serde(default)] quantity: u32 },
    VaultWithdraw { vault_slot: usize, #[serde(default)] quantity: u32 },
}

impl GameAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PickUp { .. }        => "pick_up",
            Self::Drop { .. }          => "drop",
            Self::MoveItem { .. }      => "move_item",
            Self::SplitItem { .. }     => "split_item",
            Self::StackItem { .. }     => "stack_item",
            Self::Equip { .. }         => "equip",
            Self::Unequip { .. }       => "unequip",
            Self::UseItem { .. }       => "use_item",
            Self::Wait { .. }          => "wait",
            Self::AdvanceTime { .. }   => "advance_time",
            Self::Sleep                => "sleep",
            Self::Rest                 => "rest",
            Self::RentRoom             => "rent_room",
            Self::Move { .. }          => "move",
            Self::EnterBuilding { .. } => "enter_building",
            Self::ExitBuilding         => "exit_building",
            Self::Buy { .. }           => "buy",
            Self::Sell { .. }          => "sell",
            Self::ApplyEffect { .. }   => "apply_effect",
            Self::RegisterVault        => "register_vault",
            Self::VaultDeposit { .. }  => "vault_deposit",
            Self::VaultWithdraw { .. } => "vault_withdraw",
        }
    }
}

/// Route one action to its wrapper. `lodging` holds the session's rooms.
pub fn dispatch(
    ctx:       &GameContext<'_>,
    player:    &str,
    character: &mut Character,
    lodging:   &mut Lodging,
    action:    &GameAction,
) -> GameResult<ActionOutcome> {
    log::debug!("player={player} action={}", action.name());
    match action {
        GameAction::PickUp { item_id, quantity } => pick_up(ctx, character, item_id, *quantity),
        GameAction::Drop { slot, quantity }      => drop_item(ctx, character, *slot, *quantity),
        GameAction::MoveItem { from, to }        => move_item(ctx, character, *from, *to),
        GameAction::SplitItem { from, to, quantity } => split_item(ctx, character, *from, *to, *quantity),
        GameAction::StackItem { from, to }       => stack_item(ctx, character, *from, *to),
        GameAction::Equip { slot }               => equip(ctx, character, *slot),
        GameAction::Unequip { slot }             => unequip(ctx, character, *slot),
        GameAction::UseItem { slot }             => use_item(ctx, character, *slot),
        GameAction::Wait { minutes }             => wait(ctx, character, *minutes),
        GameAction::AdvanceTime { minutes } => {
            let messages = advance_time(ctx, character, *minutes);
            Ok(ActionOutcome::new(format!("{minutes} minutes pass"), "white").with_effects(messages))
        }
        GameAction::Sleep                        => sleep(ctx, character, lodging),
        GameAction::Rest                         => rest(ctx, character),
        GameAction::RentRoom                     => rent_room(ctx, character, lodging),
        GameAction::Move { district }            => move_to(ctx, character, district),
        GameAction::EnterBuilding { building_id } => enter_building(ctx, character, building_id),
        GameAction::ExitBuilding                 => exit_building(character),
        GameAction::Buy { npc_id, item_id, quantity } => {
            buy(ctx, player, character, npc_id, item_id, *quantity, Utc::now())
        }
        GameAction::Sell { npc_id, slot, quantity } => {
            sell(ctx, player, character, npc_id, *slot, *quantity, Utc::now())
        }
        GameAction::ApplyEffect { effect_id }    => apply_effect(ctx, character, effect_id),
        GameAction::RegisterVault                => register_vault(ctx, character),
        GameAction::VaultDeposit { slot, quantity } => vault_deposit(ctx, character, *slot, *quantity),
        GameAction::VaultWithdraw { vault_slot, quantity } => {
            vault_withdraw(ctx, character, *vault_slot, *quantity)
        }
    }
}

/// Simulator with the status hooks, for callers outside an action.
pub fn simulator<'a>(ctx: &GameContext<'a>) -> EffectSimulator<'a> {
    crate::status::game_simulator(ctx.effects)
}
