//! SQLite persistence layer: game definitions and save files.
//!
//! RULE: Only store.rs talks to the database.
//! The rest of the core works on in-memory GameData and Character values;
//! the store loads and persists them as JSON documents.

use crate::{
    character::Character,
    config::GameData,
    effect::EffectTemplate,
    error::GameResult,
    items::ItemDef,
    world::{LocationDef, NpcDef},
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSummary {
    pub save_id:        String,
    pub character_name: String,
    pub updated_at:     String,
}

pub struct GameStore {
    conn: Connection,
}

impl GameStore {
    /// Open (or create) the game database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_game_data.sql"))?;
        self.conn.execute_batch(include_str!("../../migrations/002_saves.sql"))?;
        Ok(())
    }

    // ── Game data ──────────────────────────────────────────────

    pub fn insert_effect(&self, effect: &EffectTemplate) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO effects (id, properties) VALUES (?1, ?2)",
            params![effect.id, serde_json::to_string(effect)?],
        )?;
        Ok(())
    }

    pub fn insert_item(&self, item: &ItemDef) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO items (id, name, item_type, properties) VALUES (?1, ?2, ?3, ?4)",
            params![item.id, item.name, item.item_type, serde_json::to_string(item)?],
        )?;
        Ok(())
    }

    pub fn insert_location(&self, location: &LocationDef) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO locations (id, properties) VALUES (?1, ?2)",
            params![location.id, serde_json::to_string(location)?],
        )?;
        Ok(())
    }

    pub fn insert_npc(&self, npc: &NpcDef) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO npcs (id, location, properties) VALUES (?1, ?2, ?3)",
            params![npc.id, npc.location, serde_json::to_string(npc)?],
        )?;
        Ok(())
    }

    /// Write every definition in `data`, replacing rows with the same id.
    pub fn seed_from(&self, data: &GameData) -> GameResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for effect in data.effects.values() {
            self.insert_effect(effect)?;
        }
        for item in data.items.values() {
            self.insert_item(item)?;
        }
        for location in data.locations.values() {
            self.insert_location(location)?;
        }
        for npc in data.npcs.values() {
            self.insert_npc(npc)?;
        }
        tx.commit()?;
        log::info!(
            "seeded store: {} effects, {} items, {} locations, {} npcs",
            data.effects.len(),
            data.items.len(),
            data.locations.len(),
            data.npcs.len()
        );
        Ok(())
    }

    pub fn effect_template(&self, id: &str) -> GameResult<Option<EffectTemplate>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT properties FROM effects WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    /// Rebuild a GameData from the four definition tables.
    pub fn load_game_data(&self) -> GameResult<GameData> {
        Ok(GameData::from_parts(
            self.all_properties("SELECT properties FROM effects ORDER BY id")?,
            self.all_properties("SELECT properties FROM items ORDER BY id")?,
            self.all_properties("SELECT properties FROM locations ORDER BY id")?,
            self.all_properties("SELECT properties FROM npcs ORDER BY id")?,
        ))
    }

    fn all_properties<T: DeserializeOwned>(&self, sql: &str) -> GameResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }

    // ── Saves ──────────────────────────────────────────────────

    pub fn save_character(&self, player: &str, save_id: &str, character: &Character) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO saves (player, save_id, character_name, document, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(player, save_id) DO UPDATE SET
                character_name = excluded.character_name,
                document       = excluded.document,
                updated_at     = excluded.updated_at",
            params![
                player,
                save_id,
                character.name,
                serde_json::to_string(character)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        log::debug!("saved player={player} save={save_id}");
        Ok(())
    }

    pub fn load_character(&self, player: &str, save_id: &str) -> GameResult<Option<Character>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM saves WHERE player = ?1 AND save_id = ?2",
                params![player, save_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    pub fn list_saves(&self, player: &str) -> GameResult<Vec<SaveSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT save_id, character_name, updated_at FROM saves
             WHERE player = ?1
             ORDER BY updated_at DESC, save_id ASC",
        )?;
        let saves = stmt
            .query_map(params![player], |row| {
                Ok(SaveSummary {
                    save_id:        row.get(0)?,
                    character_name: row.get(1)?,
                    updated_at:     row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(saves)
    }

    /// Returns whether a save was deleted.
    pub fn delete_save(&self, player: &str, save_id: &str) -> GameResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM saves WHERE player = ?1 AND save_id = ?2",
            params![player, save_id],
        )?;
        Ok(deleted > 0)
    }
}
