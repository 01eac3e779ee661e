//! Rented rooms. Session-only: rooms are not written to the save and are
//! lost when the session unloads.
//!
//! RULE: a room is good until 23:59 of the day after it was rented and is
//! used up by one night's sleep.

use crate::{
    clock::GameClock,
    error::{GameError, GameResult},
    types::{BuildingId, Minutes, MINUTES_PER_DAY},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentedRoom {
    pub building:    BuildingId,
    pub expires_day: i64,
    /// Last minute of `expires_day` the room can be slept in.
    pub expires_at:  Minutes,
}

impl RentedRoom {
    pub fn is_expired(&self, clock: &GameClock) -> bool {
        clock.current_day > self.expires_day
            || (clock.current_day == self.expires_day && clock.time_of_day > self.expires_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lodging {
    rooms: Vec<RentedRoom>,
}

impl Lodging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooms(&self) -> &[RentedRoom] {
        &self.rooms
    }

    pub fn room_at(&self, building: &str) -> Option<&RentedRoom> {
        self.rooms.iter().find(|r| r.building == building)
    }

    /// Book a room at `building`, one per building.
    pub fn rent(&mut self, building: &str, clock: &GameClock) -> GameResult<&RentedRoom> {
        if self.room_at(building).is_some() {
            return Err(GameError::InvalidAction("You already have a room rented here".into()));
        }
        self.rooms.push(RentedRoom {
            building:    building.to_string(),
            expires_day: clock.current_day + 1,
            expires_at:  MINUTES_PER_DAY - 1,
        });
        log::info!("rented room at {building} until day {}", clock.current_day + 1);
        self.rooms
            .last()
            .ok_or_else(|| GameError::Other(anyhow::anyhow!("room list empty after rent")))
    }

    /// Give up the room at `building`, if any.
    pub fn check_out(&mut self, building: &str) -> Option<RentedRoom> {
        let index = self.rooms.iter().position(|r| r.building == building)?;
        Some(self.rooms.remove(index))
    }
}
