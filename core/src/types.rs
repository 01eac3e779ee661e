//! Shared primitive types used across the character core.

/// In-game minutes. Delays, durations, tick intervals and the clock all
/// count in this unit.
pub type Minutes = i64;

/// Effect template identifier (e.g. "fatigue-accumulation").
pub type EffectId = String;

pub type ItemId = String;

pub type NpcId = String;

pub type BuildingId = String;

/// Stable player identity (the public key that owns the saves).
pub type PlayerId = String;

pub type SaveId = String;

pub const MINUTES_PER_DAY: Minutes = 1440;
