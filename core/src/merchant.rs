//! Per-player merchant stock.
//!
//! RULE: each player sees their own copy of a merchant's gold and stock.
//! Restocking runs on real time (chrono), not game time, and only when a
//! merchant is looked up.

use crate::{
    error::{GameError, GameResult},
    types::{ItemId, NpcId, PlayerId},
    world::ShopConfig,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::{BTreeMap, HashMap}, sync::RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub current: u32,
    pub max:     u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantState {
    pub merchant_id:      NpcId,
    pub gold:             u64,
    pub stock:            BTreeMap<ItemId, StockLevel>,
    pub last_restock:     DateTime<Utc>,
    /// Real-time minutes.
    pub restock_interval: i64,
}

impl MerchantState {
    fn fresh(merchant_id: &str, config: &ShopConfig, now: DateTime<Utc>) -> Self {
        Self {
            merchant_id:      merchant_id.to_string(),
            gold:             config.starting_gold,
            stock:            config
                .inventory
                .iter()
                .map(|s| (s.item.clone(), StockLevel { current: s.max_stock, max: s.max_stock }))
                .collect(),
            last_restock:     now,
            restock_interval: config.restock_interval,
        }
    }

    fn restock(&mut self, config: &ShopConfig, now: DateTime<Utc>) {
        self.gold = config.starting_gold;
        for entry in &config.inventory {
            let level = self
                .stock
                .entry(entry.item.clone())
                .or_insert(StockLevel { current: 0, max: entry.max_stock });
            level.max = entry.max_stock;
            level.current = entry.max_stock;
        }
        self.restock_interval = config.restock_interval;
        self.last_restock = now;
    }

    fn restock_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_restock >= Duration::minutes(self.restock_interval)
    }

    pub fn stock_of(&self, item_id: &str) -> u32 {
        self.stock.get(item_id).map(|s| s.current).unwrap_or(0)
    }
}

/// Change applied to a merchant after a trade, from the merchant's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade<'a> {
    pub item_id: &'a str,
    /// Positive when the merchant gains stock (player sold).
    pub stock_change: i64,
    /// Positive when the merchant gains gold (player bought).
    pub gold_change: i64,
}

#[derive(Default)]
pub struct MerchantRegistry {
    states: RwLock<HashMap<PlayerId, HashMap<NpcId, MerchantState>>>,
}

impl MerchantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for (player, merchant), creating it on first sight and
    /// restocking it when the interval has passed. Returns the state and
    /// whether a restock happened.
    pub fn get_or_init(
        &self,
        player:      &str,
        merchant_id: &str,
        config:      &ShopConfig,
        now:         DateTime<Utc>,
    ) -> GameResult<(MerchantState, bool)> {
        let mut states = self.write()?;
        let merchants = states.entry(player.to_string()).or_default();

        match merchants.get_mut(merchant_id) {
            Some(state) => {
                let restocked = state.restock_due(now);
                if restocked {
                    log::info!("restocking merchant={merchant_id} for player={player}");
                    state.restock(config, now);
                }
                Ok((state.clone(), restocked))
            }
            None => {
                log::debug!("initializing merchant={merchant_id} for player={player}");
                let state = MerchantState::fresh(merchant_id, config, now);
                merchants.insert(merchant_id.to_string(), state.clone());
                Ok((state, false))
            }
        }
    }

    /// Apply a completed trade. Stock and gold never go below zero.
    pub fn record_trade(&self, player: &str, merchant_id: &str, trade: Trade<'_>) -> GameResult<()> {
        let mut states = self.write()?;
        let state = states
            .get_mut(player)
            .and_then(|m| m.get_mut(merchant_id))
            .ok_or_else(|| GameError::InvalidAction(format!("no open shop {merchant_id}")))?;

        if let Some(level) = state.stock.get_mut(trade.item_id) {
            level.current = (i64::from(level.current) + trade.stock_change).max(0) as u32;
        } else if trade.stock_change > 0 {
            state.stock.insert(trade.item_id.to_string(), StockLevel {
                current: trade.stock_change as u32,
                max:     0,
            });
        }
        state.gold = (state.gold as i64 + trade.gold_change).max(0) as u64;
        log::debug!(
            "merchant={merchant_id} item={} stock{:+} gold={} ({:+})",
            trade.item_id,
            trade.stock_change,
            state.gold,
            trade.gold_change
        );
        Ok(())
    }

    /// Real-time minutes until the next restock. 0 when due or unknown.
    pub fn minutes_until_restock(&self, player: &str, merchant_id: &str, now: DateTime<Utc>) -> i64 {
        let Ok(states) = self.states.read() else {
            return 0;
        };
        states
            .get(player)
            .and_then(|m| m.get(merchant_id))
            .map(|s| (s.restock_interval - (now - s.last_restock).num_minutes()).max(0))
            .unwrap_or(0)
    }

    /// Forget everything about a player (on logout).
    pub fn cleanup_player(&self, player: &str) {
        if let Ok(mut states) = self.states.write() {
            states.remove(player);
        }
    }

    /// Copy of every merchant state a player has touched.
    pub fn states_for_player(&self, player: &str) -> BTreeMap<NpcId, MerchantState> {
        self.states
            .read()
            .map(|s| {
                s.get(player)
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn write(&self) -> GameResult<std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, HashMap<NpcId, MerchantState>>>> {
        self.states
            .write()
            .map_err(|_| GameError::Other(anyhow::anyhow!("merchant registry lock poisoned")))
    }
}
