//! Game sessions: one loaded character plus the last snapshot sent to
//! its client.
//!
//! RULE: a session is mutated by one action at a time. The registry hands
//! sessions out behind a Mutex and only holds its own lock for the map
//! lookup itself.

use crate::{
    actions::{dispatch, simulator, ActionOutcome, GameAction, GameContext},
    character::Character,
    delta::{diff, Delta},
    error::{GameError, GameResult},
    lodging::Lodging,
    snapshot::Snapshot,
    types::{PlayerId, SaveId},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

pub struct GameSession {
    pub player:     PlayerId,
    pub save_id:    SaveId,
    pub character:  Character,
    /// Rooms rented this session. Not saved.
    pub lodging:    Lodging,
    pub loaded_at:  DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    last_snapshot:  Snapshot,
}

fn capture(ctx: &GameContext<'_>, character: &Character) -> Snapshot {
    Snapshot::capture(character, &simulator(ctx), ctx.world)
}

impl GameSession {
    /// Wrap a freshly loaded save. Legacy effect ids are migrated and all
    /// statuses re-derived before the first snapshot is taken.
    pub fn load(
        ctx:           &GameContext<'_>,
        player:        &str,
        save_id:       &str,
        mut character: Character,
    ) -> GameResult<Self> {
        ctx.reconciler().initialize_on_load(&mut character)?;
        let snapshot = capture(ctx, &character);
        let now = Utc::now();
        log::info!("session loaded player={player} save={save_id}");
        Ok(Self {
            player:        player.to_string(),
            save_id:       save_id.to_string(),
            character,
            lodging:       Lodging::new(),
            loaded_at:     now,
            updated_at:    now,
            last_snapshot: snapshot,
        })
    }

    /// The snapshot the client currently holds.
    pub fn snapshot(&self) -> &Snapshot {
        &self.last_snapshot
    }

    /// Capture the current state, diff it against the last snapshot and
    /// make it the new baseline.
    pub fn update_snapshot_and_diff(&mut self, ctx: &GameContext<'_>) -> Delta {
        let next = capture(ctx, &self.character);
        let delta = diff(&self.last_snapshot, &next);
        self.last_snapshot = next;
        delta
    }

    /// Run one action and return its outcome with the resulting delta.
    /// A failed action leaves the baseline snapshot untouched.
    pub fn perform(&mut self, ctx: &GameContext<'_>, action: &GameAction) -> GameResult<(ActionOutcome, Delta)> {
        let outcome = dispatch(ctx, &self.player, &mut self.character, &mut self.lodging, action)?;
        let delta = self.update_snapshot_and_diff(ctx);
        self.updated_at = Utc::now();
        Ok((outcome, delta))
    }
}

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

fn session_key(player: &str, save_id: &str) -> String {
    format!("{player}:{save_id}")
}

fn poisoned() -> GameError {
    GameError::Other(anyhow::anyhow!("session registry lock poisoned"))
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh save id.
    pub fn new_save_id() -> SaveId {
        uuid::Uuid::new_v4().to_string()
    }

    /// Return the loaded session for (player, save), loading `character`
    /// only if none is open yet.
    pub fn open(
        &self,
        ctx:       &GameContext<'_>,
        player:    &str,
        save_id:   &str,
        character: Character,
    ) -> GameResult<SharedSession> {
        let key = session_key(player, save_id);
        if let Some(existing) = self.sessions.read().map_err(|_| poisoned())?.get(&key) {
            log::debug!("session {key} already open");
            return Ok(Arc::clone(existing));
        }
        let session = Arc::new(Mutex::new(GameSession::load(ctx, player, save_id, character)?));
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        Ok(Arc::clone(sessions.entry(key).or_insert(session)))
    }

    /// Replace whatever is open for (player, save) with `character`.
    pub fn reload(
        &self,
        ctx:       &GameContext<'_>,
        player:    &str,
        save_id:   &str,
        character: Character,
    ) -> GameResult<SharedSession> {
        let session = Arc::new(Mutex::new(GameSession::load(ctx, player, save_id, character)?));
        self.sessions
            .write()
            .map_err(|_| poisoned())?
            .insert(session_key(player, save_id), Arc::clone(&session));
        log::info!("session reloaded player={player} save={save_id}");
        Ok(session)
    }

    pub fn get(&self, player: &str, save_id: &str) -> GameResult<SharedSession> {
        let key = session_key(player, save_id);
        self.sessions
            .read()
            .map_err(|_| poisoned())?
            .get(&key)
            .cloned()
            .ok_or(GameError::SessionNotFound { key })
    }

    /// Drop a session. Returns it so the caller can persist the character.
    pub fn unload(&self, player: &str, save_id: &str) -> GameResult<Option<SharedSession>> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| poisoned())?
            .remove(&session_key(player, save_id));
        if removed.is_some() {
            log::info!("session unloaded player={player} save={save_id}");
        }
        Ok(removed)
    }

    /// Whether the player still has any session open.
    pub fn has_player(&self, player: &str) -> bool {
        let prefix = format!("{player}:");
        self.sessions
            .read()
            .map(|s| s.keys().any(|k| k.starts_with(&prefix)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
