//! Caller-facing colony operations.
//!
//! Every operation runs in one serializable scope. Mutations reload the
//! planet as their first step, catch it up to `now`, admit the request and
//! save the aggregate. Callers retry on
//! [`GameError::ConcurrencyConflict`].
//!
//! Queue capacities are those of the service's [`GameConfig`]; they replace
//! whatever capacity a queue was last saved with.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::accumulator::{catch_up, CatchUp};
use crate::config::GameConfig;
use crate::data::StructureKind;
use crate::error::{GameError, PlayerError, Result};
use crate::planet::{Planet, PlanetId, PlanetState};
use crate::player::{nickname_key, validate_nickname, Player, PlayerId};
use crate::scheduler::{schedule_build, schedule_demolition, schedule_shipyard, Admission};
use crate::store::{Store, Transaction};
use crate::time::Timestamp;

/// A planet as observed at some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetView {
    /// The caught-up aggregate.
    pub state: PlanetState,
    /// What the catch-up changed.
    pub report: CatchUp,
}

/// Colony economy operations over a [`Store`].
#[derive(Debug)]
pub struct ColonyService<S> {
    store: S,
    config: GameConfig,
}

impl<S: Store> ColonyService<S> {
    /// Wrap `store`. Queue capacities come from `config`.
    #[must_use]
    pub const fn new(store: S, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Load `planet` and bring it up to `now`.
    ///
    /// The caught-up aggregate is saved only when a build task completed or
    /// was abandoned, or units were delivered; plain accrual is recomputed
    /// on every read instead.
    ///
    /// # Errors
    /// [`GameError::PlanetNotFound`], store failures, or
    /// [`GameError::ConcurrencyConflict`] if a concurrent commit touched the
    /// planet.
    pub fn get_current_planet_state(&self, planet: PlanetId, now: Timestamp) -> Result<PlanetView> {
        self.store
            .run_serializable(|tx| {
                let mut state = self.load(tx, planet)?;
                let report = catch_up(&mut state, now)?;
                if report.is_persistent() {
                    tx.save_planet_state(&state)?;
                }
                Ok(PlanetView { state, report })
            })
            .map_err(log_invariant)
    }

    /// Queue `quantity` levels of the building named `key`.
    ///
    /// # Errors
    /// Infrastructure failures only; refusals are the inner
    /// [`crate::scheduler::Rejection`].
    pub fn schedule_build_task(
        &self,
        planet: PlanetId,
        key: &str,
        quantity: u32,
        now: Timestamp,
    ) -> Admission {
        self.store
            .run_serializable(|tx| {
                let mut state = self.load(tx, planet)?;
                let report = catch_up(&mut state, now)?;
                let player = tx.load_player(state.planet.owner)?;
                let admission = schedule_build(&mut state, &player, key, quantity, now)?;
                persist(tx, &state, &report, admission.is_ok())?;
                Ok(admission)
            })
            .map_err(log_invariant)
    }

    /// Queue the demolition of one level of the building named `key`.
    ///
    /// # Errors
    /// Infrastructure failures only; refusals are the inner
    /// [`crate::scheduler::Rejection`].
    pub fn schedule_demolition_task(&self, planet: PlanetId, key: &str, now: Timestamp) -> Admission {
        self.store
            .run_serializable(|tx| {
                let mut state = self.load(tx, planet)?;
                let report = catch_up(&mut state, now)?;
                let admission = schedule_demolition(&mut state, key, now)?;
                persist(tx, &state, &report, admission.is_ok())?;
                Ok(admission)
            })
            .map_err(log_invariant)
    }

    /// Queue a batch of `quantity` ships or defense structures.
    ///
    /// # Errors
    /// Infrastructure failures only; refusals are the inner
    /// [`crate::scheduler::Rejection`].
    pub fn schedule_shipyard_task(
        &self,
        planet: PlanetId,
        kind: StructureKind,
        key: &str,
        quantity: u32,
        now: Timestamp,
    ) -> Admission {
        self.store
            .run_serializable(|tx| {
                let mut state = self.load(tx, planet)?;
                let report = catch_up(&mut state, now)?;
                let player = tx.load_player(state.planet.owner)?;
                let admission = schedule_shipyard(&mut state, &player, kind, key, quantity, now)?;
                persist(tx, &state, &report, admission.is_ok())?;
                Ok(admission)
            })
            .map_err(log_invariant)
    }

    /// Register a player for `user_id` together with a homeworld.
    ///
    /// # Errors
    /// [`GameError::Player`] if the nickname is invalid or taken, or the
    /// user already has a player. Store failures and conflicts otherwise.
    pub fn create_player(
        &self,
        user_id: &str,
        nickname: &str,
        now: Timestamp,
    ) -> Result<(Player, PlanetState)> {
        validate_nickname(nickname)?;
        let key = nickname_key(nickname);

        self.store
            .run_serializable(|tx| {
                if tx.find_player_by_nickname(&key)?.is_some() {
                    return Err(PlayerError::NicknameInUse(nickname.to_string()).into());
                }
                if tx.find_player_by_user(user_id)?.is_some() {
                    return Err(PlayerError::UserAlreadyHasPlayer(user_id.to_string()).into());
                }

                let player_id = PlayerId(tx.allocate_id()?);
                let planet_id = PlanetId(tx.allocate_id()?);
                let mut player = Player::new(player_id, user_id, nickname)?;
                player.planet = Some(planet_id);

                let homeworld = Planet::new(
                    planet_id,
                    player_id,
                    "Homeworld",
                    self.config.homeworld_max_temperature,
                    self.config.starting_resources(),
                    now,
                );
                let state = PlanetState::new(
                    homeworld,
                    self.config.build_queue_capacity,
                    self.config.shipyard_queue_capacity,
                );

                tx.save_player(&player)?;
                tx.save_planet_state(&state)?;
                info!(player = %player_id, planet = %planet_id, nickname, "Player created");
                Ok((player, state))
            })
            .map_err(log_invariant)
    }
}

impl<S> ColonyService<S> {
    fn load(&self, tx: &mut dyn Transaction, planet: PlanetId) -> Result<PlanetState> {
        let mut state = tx.load_planet_for_update(planet)?;
        state.set_capacities(
            self.config.build_queue_capacity,
            self.config.shipyard_queue_capacity,
        );
        Ok(state)
    }
}

/// Save the aggregate if the request was admitted or the catch-up did
/// something irreversible.
fn persist(
    tx: &mut dyn Transaction,
    state: &PlanetState,
    report: &CatchUp,
    admitted: bool,
) -> Result<()> {
    if admitted || report.is_persistent() {
        tx.save_planet_state(state)?;
    }
    Ok(())
}

fn log_invariant(err: GameError) -> GameError {
    if let GameError::InvariantViolation(message) = &err {
        error!(%message, "Invariant violated");
    }
    err
}
