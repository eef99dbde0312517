//! Test fixtures and helpers.
//!
//! Pre-built planets, players and stores for consistent testing.

use fixed::types::I32F32;
use nova_core::config::GameConfig;
use nova_core::data::{BuildingId, ResearchId, ShipyardItem};
use nova_core::planet::{Planet, PlanetId, PlanetState};
use nova_core::player::{Player, PlayerId};
use nova_core::queue::{BuildQueue, BuildTask, ShipyardQueue, ShipyardTask};
use nova_core::resources::Resources;
use nova_core::store::{MemoryStore, Store};
use nova_core::time::Timestamp;

/// Reference instant used by fixtures: 2023-11-14T22:13:20Z.
pub const T0: Timestamp = Timestamp(1_700_000_000_000);

/// Milliseconds in `n` minutes.
#[must_use]
pub const fn minutes(n: u64) -> u64 {
    n * 60_000
}

/// Milliseconds in `n` hours.
#[must_use]
pub const fn hours(n: u64) -> u64 {
    n * 3_600_000
}

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Whole units of a fixed-point amount, rounded down.
#[must_use]
pub fn floor(value: I32F32) -> i64 {
    value.floor().to_num::<i64>()
}

/// Builder for a [`PlanetState`] with arbitrary levels, stock and queues.
///
/// The economy is recalculated from the final building levels on
/// [`PlanetBuilder::build`]; stockpiles are left exactly as given, even
/// above storage capacity.
#[derive(Debug, Clone)]
pub struct PlanetBuilder {
    planet: Planet,
    build_tasks: Vec<BuildTask>,
    shipyard_tasks: Vec<ShipyardTask>,
    build_capacity: usize,
    shipyard_capacity: usize,
}

impl Default for PlanetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanetBuilder {
    /// Planet 1 of player 1 at [`T0`] with 500 metal and 500 crystal.
    #[must_use]
    pub fn new() -> Self {
        let config = GameConfig::default();
        Self {
            planet: Planet::new(
                PlanetId(1),
                PlayerId(1),
                "Fixture",
                config.homeworld_max_temperature,
                config.starting_resources(),
                T0,
            ),
            build_tasks: Vec::new(),
            shipyard_tasks: Vec::new(),
            build_capacity: config.build_queue_capacity,
            shipyard_capacity: config.shipyard_queue_capacity,
        }
    }

    /// Planet identifier.
    #[must_use]
    pub fn id(mut self, id: u64) -> Self {
        self.planet.id = PlanetId(id);
        self
    }

    /// Owning player.
    #[must_use]
    pub fn owner(mut self, player: u64) -> Self {
        self.planet.owner = PlayerId(player);
        self
    }

    /// Stored resources.
    #[must_use]
    pub fn resources(mut self, metal: i32, crystal: i32, deuterium: i32) -> Self {
        self.planet.resources = Resources::new(metal, crystal, deuterium);
        self
    }

    /// Maximum temperature.
    #[must_use]
    pub fn temperature(mut self, max_temperature: i32) -> Self {
        self.planet.max_temperature = max_temperature;
        self
    }

    /// Level of one building.
    #[must_use]
    pub fn building(mut self, building: BuildingId, level: u32) -> Self {
        self.planet.buildings.set_level(building, level);
        self
    }

    /// Installed ships or defense.
    #[must_use]
    pub fn installed(mut self, item: ShipyardItem, count: u64) -> Self {
        self.planet.install(item, count);
        self
    }

    /// Instant of the last update.
    #[must_use]
    pub fn last_update(mut self, at: Timestamp) -> Self {
        self.planet.last_update = at;
        self
    }

    /// Queue capacities.
    #[must_use]
    pub fn capacities(mut self, build: usize, shipyard: usize) -> Self {
        self.build_capacity = build;
        self.shipyard_capacity = shipyard;
        self
    }

    /// Append a build task. Tasks must be chained.
    #[must_use]
    pub fn queued(mut self, task: BuildTask) -> Self {
        self.build_tasks.push(task);
        self
    }

    /// Append a shipyard batch. Batches must be chained.
    #[must_use]
    pub fn queued_batch(mut self, task: ShipyardTask) -> Self {
        self.shipyard_tasks.push(task);
        self
    }

    /// Assemble the aggregate.
    ///
    /// # Panics
    ///
    /// Panics if the queued tasks are not chained.
    #[must_use]
    pub fn build(self) -> PlanetState {
        let mut planet = self.planet;
        planet.recalculate_economy();
        let build_queue = BuildQueue::from_tasks(self.build_capacity, self.build_tasks)
            .expect("fixture build tasks must be chained");
        let shipyard_queue = ShipyardQueue::from_tasks(self.shipyard_capacity, self.shipyard_tasks)
            .expect("fixture shipyard tasks must be chained");
        PlanetState {
            planet,
            build_queue,
            shipyard_queue,
        }
    }
}

/// A player with no research, owning planet `id` if given.
///
/// # Panics
///
/// Never; the fixture nickname is valid.
#[must_use]
pub fn player(id: u64, planet: Option<u64>) -> Player {
    let mut player = Player::new(PlayerId(id), format!("user-{id}"), &format!("Tester{id}"))
        .expect("fixture nickname is valid");
    player.planet = planet.map(PlanetId);
    player
}

/// [`player`] with research levels.
#[must_use]
pub fn researched(id: u64, planet: Option<u64>, levels: &[(ResearchId, u32)]) -> Player {
    let mut player = player(id, planet);
    for &(research, level) in levels {
        player.research.set_level(research, level);
    }
    player
}

/// A store holding `players` and `planets`.
///
/// # Panics
///
/// Panics if the seeding transaction fails.
#[must_use]
pub fn seeded_store(players: &[Player], planets: &[PlanetState]) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .run_serializable(|tx| {
            for player in players {
                tx.save_player(player)?;
            }
            for state in planets {
                tx.save_planet_state(state)?;
            }
            Ok(())
        })
        .expect("seeding an empty store cannot conflict");
    store
}
