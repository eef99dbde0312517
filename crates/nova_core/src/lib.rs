//! # Nova Core
//!
//! Deterministic colony economy core for Dark Nova.
//!
//! This crate contains **only** deterministic logic:
//! - No IO
//! - No wall clock (the current instant is always a parameter)
//! - No background ticking
//! - No floating-point math (uses fixed-point)
//!
//! A planet's stockpiles and building levels are advanced lazily: whenever a
//! planet is observed or mutated, the [`accumulator`] replays everything that
//! happened since its last update. New work enters through the [`scheduler`]
//! inside a serializable [`store`] transaction, wrapped by [`service`].
//!
//! ## Crate Structure
//!
//! - [`data`] - Static catalog of buildings, ships, defense and research
//! - [`cost`] - Costs and build durations
//! - [`economy`] - Production, storage and energy from building levels
//! - [`technology`] - Prerequisite checks
//! - [`queue`] - Chained, capacity-bounded task queues
//! - [`accumulator`] - The catch-up engine
//! - [`scheduler`] - Task admission
//! - [`store`] - Persistence traits and the in-memory store
//! - [`service`] - Caller-facing operations
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod accumulator;
pub mod config;
pub mod cost;
pub mod data;
pub mod economy;
pub mod error;
pub mod levels;
pub mod math;
pub mod planet;
pub mod player;
pub mod queue;
pub mod resources;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod technology;
pub mod time;

pub use error::{GameError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::accumulator::{catch_up, CatchUp, Delivery};
    pub use crate::config::GameConfig;
    pub use crate::cost::{EconomyModifiers, Structure};
    pub use crate::data::{BuildingId, DefenseId, ResearchId, ShipId, ShipyardItem, StructureKind};
    pub use crate::error::{GameError, PlayerError, Result};
    pub use crate::levels::Levels;
    pub use crate::math::Fixed;
    pub use crate::planet::{Planet, PlanetId, PlanetState};
    pub use crate::player::{Player, PlayerId};
    pub use crate::queue::{BuildQueue, BuildTask, BuildTaskKind, ShipyardQueue, ShipyardTask};
    pub use crate::resources::{ResourceCost, Resources};
    pub use crate::scheduler::{Admission, QueueKind, Rejection, TaskHandle};
    pub use crate::service::{ColonyService, PlanetView};
    pub use crate::store::{MemoryStore, Store, Transaction};
    pub use crate::time::Timestamp;
}
