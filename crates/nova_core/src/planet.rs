//! Planets and the aggregate persisted with them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cost::EconomyModifiers;
use crate::data::{BuildingId, DefenseId, ShipId, ShipyardItem};
use crate::economy::Economy;
use crate::levels::Levels;
use crate::math::{fixed_serde, Fixed};
use crate::player::PlayerId;
use crate::queue::{BuildQueue, ShipyardQueue};
use crate::resources::{ResourceCost, ResourceKind, Resources};
use crate::time::Timestamp;

/// Unique planet identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PlanetId(pub u64);

impl std::fmt::Display for PlanetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A colony with stockpiles, buildings and installed units.
///
/// `production`, `storage` and the energy fields are derived from `buildings`
/// and refreshed by [`Planet::recalculate_economy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Planet identifier.
    pub id: PlanetId,
    /// Owning player.
    pub owner: PlayerId,
    /// Display name.
    pub name: String,
    /// Maximum surface temperature in degrees.
    pub max_temperature: i32,
    /// Stored resources.
    pub resources: Resources,
    /// Net hourly production.
    pub production: Resources,
    /// Storage capacity.
    pub storage: Resources,
    /// Energy produced.
    #[serde(with = "fixed_serde")]
    pub energy_produced: Fixed,
    /// Energy consumed.
    #[serde(with = "fixed_serde")]
    pub energy_used: Fixed,
    /// Building levels.
    pub buildings: Levels<BuildingId>,
    /// Installed ships.
    pub ships: BTreeMap<ShipId, u64>,
    /// Installed defense.
    pub defense: BTreeMap<DefenseId, u64>,
    /// Instant the stockpiles were last brought up to date.
    pub last_update: Timestamp,
}

impl Planet {
    /// Create a planet with no buildings and a computed economy.
    #[must_use]
    pub fn new(
        id: PlanetId,
        owner: PlayerId,
        name: impl Into<String>,
        max_temperature: i32,
        resources: Resources,
        now: Timestamp,
    ) -> Self {
        let mut planet = Self {
            id,
            owner,
            name: name.into(),
            max_temperature,
            resources,
            production: Resources::ZERO,
            storage: Resources::ZERO,
            energy_produced: Fixed::ZERO,
            energy_used: Fixed::ZERO,
            buildings: Levels::new(),
            ships: BTreeMap::new(),
            defense: BTreeMap::new(),
            last_update: now,
        };
        planet.recalculate_economy();
        planet
    }

    /// Refresh production, storage and energy from the building levels.
    pub fn recalculate_economy(&mut self) {
        let economy = Economy::compute(&self.buildings, self.max_temperature);
        self.production = economy.production;
        self.storage = economy.storage;
        self.energy_produced = economy.energy_produced;
        self.energy_used = economy.energy_used;
    }

    /// Lower every stockpile above capacity to the capacity.
    pub fn clamp_to_storage(&mut self) {
        for kind in ResourceKind::ALL {
            let capacity = self.storage.get(kind);
            let stored = self.resources.get_mut(kind);
            if *stored > capacity {
                *stored = capacity;
            }
        }
    }

    /// Current level of `building`.
    #[must_use]
    pub fn level(&self, building: BuildingId) -> u32 {
        self.buildings.level(building)
    }

    /// Factory levels for duration formulas.
    #[must_use]
    pub fn modifiers(&self) -> EconomyModifiers {
        EconomyModifiers::from_levels(&self.buildings)
    }

    /// Energy left after every consumer is served.
    #[must_use]
    pub fn spare_energy(&self) -> Fixed {
        self.energy_produced.saturating_sub(self.energy_used)
    }

    /// Whether the stockpiles cover `cost` and spare energy covers its
    /// energy requirement.
    #[must_use]
    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        self.resources.covers(cost)
            && (cost.energy <= Fixed::ZERO || self.spare_energy() >= cost.energy)
    }

    /// Subtract the stockpiled part of `cost`. Energy is never consumed.
    pub fn pay(&mut self, cost: &ResourceCost) {
        self.resources.spend(cost);
    }

    /// Installed count of a shipyard item.
    #[must_use]
    pub fn installed(&self, item: ShipyardItem) -> u64 {
        match item {
            ShipyardItem::Ship(ship) => self.ships.get(&ship).copied().unwrap_or(0),
            ShipyardItem::Defense(defense) => self.defense.get(&defense).copied().unwrap_or(0),
        }
    }

    /// Add `count` finished units.
    pub fn install(&mut self, item: ShipyardItem, count: u64) {
        let slot = match item {
            ShipyardItem::Ship(ship) => self.ships.entry(ship).or_insert(0),
            ShipyardItem::Defense(defense) => self.defense.entry(defense).or_insert(0),
        };
        *slot = slot.saturating_add(count);
    }
}

/// A planet together with its queues, loaded and saved as one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetState {
    /// The planet.
    pub planet: Planet,
    /// Pending building level changes.
    pub build_queue: BuildQueue,
    /// Pending ship and defense batches.
    pub shipyard_queue: ShipyardQueue,
}

impl PlanetState {
    /// Wrap a planet with empty queues of the given capacities.
    #[must_use]
    pub fn new(planet: Planet, build_capacity: usize, shipyard_capacity: usize) -> Self {
        Self {
            planet,
            build_queue: BuildQueue::new(build_capacity),
            shipyard_queue: ShipyardQueue::new(shipyard_capacity),
        }
    }

    /// Resize both queues.
    pub fn set_capacities(&mut self, build_capacity: usize, shipyard_capacity: usize) {
        self.build_queue.set_capacity(build_capacity);
        self.shipyard_queue.set_capacity(shipyard_capacity);
    }

    /// Level of `building` once every queued task for it has completed.
    #[must_use]
    pub fn projected_level(&self, building: BuildingId) -> u32 {
        let current = i64::from(self.planet.level(building));
        let queued: i64 = self
            .build_queue
            .iter()
            .filter(|task| task.building == building)
            .map(|task| task.level_delta())
            .sum();
        u32::try_from((current + queued).max(0)).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet() -> Planet {
        Planet::new(
            PlanetId(1),
            PlayerId(1),
            "Homeworld",
            40,
            Resources::new(500, 500, 0),
            Timestamp(0),
        )
    }

    #[test]
    fn test_new_planet_has_computed_economy() {
        let planet = planet();
        assert_eq!(planet.production, Resources::new(30, 15, 0));
        assert_eq!(planet.storage.metal, Fixed::from_num(100_000));
    }

    #[test]
    fn test_energy_is_a_requirement_not_a_stock() {
        let mut planet = planet();
        planet.buildings.set_level(BuildingId::SolarPlant, 1);
        planet.recalculate_economy();

        let cost = ResourceCost::new(100, 100, 0, 20);
        assert!(planet.can_afford(&cost));
        planet.pay(&cost);
        assert_eq!(planet.resources, Resources::new(400, 400, 0));
        assert_eq!(planet.spare_energy(), Fixed::from_num(22));

        let hungry = ResourceCost::new(0, 0, 0, 23);
        assert!(!planet.can_afford(&hungry));
        assert!(planet.can_afford(&hungry.without_energy()));
    }

    #[test]
    fn test_clamp_to_storage() {
        let mut planet = planet();
        planet.resources = Resources::new(150_000, 10, 0);
        planet.clamp_to_storage();
        assert_eq!(planet.resources, Resources::new(100_000, 10, 0));
    }

    #[test]
    fn test_install_counts() {
        let mut planet = planet();
        let fighter = ShipyardItem::Ship(ShipId::LightFighter);
        planet.install(fighter, 3);
        planet.install(fighter, 2);
        assert_eq!(planet.installed(fighter), 5);
        assert_eq!(
            planet.installed(ShipyardItem::Defense(DefenseId::SmallShieldDome)),
            0
        );
    }

    #[test]
    fn test_projected_level_counts_queue() {
        use crate::queue::{BuildTask, BuildTaskKind};

        let mut state = PlanetState::new(planet(), 5, 20);
        state.planet.buildings.set_level(BuildingId::MetalMine, 2);
        state
            .build_queue
            .push(BuildTask::new(
                BuildTaskKind::Build,
                BuildingId::MetalMine,
                Timestamp(0),
                10,
            ))
            .unwrap();
        state
            .build_queue
            .push(BuildTask::new(
                BuildTaskKind::Build,
                BuildingId::MetalMine,
                Timestamp(10),
                10,
            ))
            .unwrap();
        assert_eq!(state.projected_level(BuildingId::MetalMine), 4);
        assert_eq!(state.projected_level(BuildingId::CrystalMine), 0);
    }
}
