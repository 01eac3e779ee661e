//! wayfarer-core: character simulation for Wayfarer.
//!
//! Timed effects, derived statuses (encumbrance, fatigue, hunger),
//! inventory, world queries, and the snapshot/delta pair a client syncs
//! against. Persistence lives behind store.rs.

pub mod actions;
pub mod character;
pub mod clock;
pub mod config;
pub mod delta;
pub mod effect;
pub mod error;
pub mod inventory;
pub mod items;
pub mod lodging;
pub mod merchant;
pub mod session;
pub mod simulator;
pub mod snapshot;
pub mod status;
pub mod storage;
pub mod store;
pub mod templates;
pub mod types;
pub mod world;
