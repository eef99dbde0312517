//! Persistence seam.
//!
//! The core needs point-in-time loads, serializable transaction scopes and
//! save-on-commit. [`Store::run_serializable`] opens a scope, hands the
//! operation a [`Transaction`], and commits only if the operation returns
//! `Ok`. A store that cannot serialize the scope against concurrent commits
//! fails it with [`crate::GameError::ConcurrencyConflict`].

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::planet::{Planet, PlanetId, PlanetState};
use crate::player::{Player, PlayerId};
use crate::queue::{BuildQueue, ShipyardQueue};

/// Reads and buffered writes inside one serializable scope.
pub trait Transaction {
    /// Load a planet with both queues, for modification.
    ///
    /// # Errors
    /// [`crate::GameError::PlanetNotFound`] if no such planet exists.
    fn load_planet_for_update(&mut self, id: PlanetId) -> Result<PlanetState>;

    /// Load a player.
    ///
    /// # Errors
    /// [`crate::GameError::PlayerNotFound`] if no such player exists.
    fn load_player(&mut self, id: PlayerId) -> Result<Player>;

    /// Insert or replace a planet row.
    fn save_planet(&mut self, planet: &Planet) -> Result<()>;

    /// Replace the build queue of `planet`.
    fn save_build_queue(&mut self, planet: PlanetId, queue: &BuildQueue) -> Result<()>;

    /// Replace the shipyard queue of `planet`.
    fn save_shipyard_queue(&mut self, planet: PlanetId, queue: &ShipyardQueue) -> Result<()>;

    /// Insert or replace a player row.
    fn save_player(&mut self, player: &Player) -> Result<()>;

    /// Player whose normalised nickname is `nickname_key`.
    fn find_player_by_nickname(&mut self, nickname_key: &str) -> Result<Option<Player>>;

    /// Player owned by `user_id`.
    fn find_player_by_user(&mut self, user_id: &str) -> Result<Option<Player>>;

    /// Fresh identifier, unique across the store. Not rolled back.
    fn allocate_id(&mut self) -> Result<u64>;

    /// Save a planet and both of its queues.
    fn save_planet_state(&mut self, state: &PlanetState) -> Result<()> {
        self.save_planet(&state.planet)?;
        self.save_build_queue(state.planet.id, &state.build_queue)?;
        self.save_shipyard_queue(state.planet.id, &state.shipyard_queue)
    }
}

/// Source of serializable transaction scopes.
pub trait Store {
    /// Run `op` in a serializable scope.
    ///
    /// Buffered writes are committed when `op` returns `Ok` and discarded
    /// when it returns `Err`.
    ///
    /// # Errors
    /// The error returned by `op`, or
    /// [`crate::GameError::ConcurrencyConflict`] if the scope lost a race
    /// against another commit. Nothing is written in either case.
    fn run_serializable<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>;
}
