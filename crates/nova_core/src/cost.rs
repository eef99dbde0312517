//! Cost model: prices and durations for every structure.
//!
//! Pure, total functions over the catalog enums. Durations are whole
//! milliseconds computed in 128-bit integers and never drop below
//! [`MIN_DURATION_MS`], which keeps queue finish instants strictly increasing.

use serde::{Deserialize, Serialize};

use crate::data::{BuildingId, DefenseId, ShipId, ShipyardItem};
use crate::levels::Levels;
use crate::math::{whole, MILLIS_PER_HOUR};
use crate::resources::ResourceCost;

/// Shortest possible task duration.
pub const MIN_DURATION_MS: u64 = 1_000;

/// Structural resources (metal + crystal) processed per hour by a bare factory.
const BASE_THROUGHPUT: u128 = 2_500;

/// Anything that can be queued on a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Structure {
    /// A building level.
    Building(BuildingId),
    /// A ship hull.
    Ship(ShipId),
    /// A defense structure.
    Defense(DefenseId),
}

impl From<ShipyardItem> for Structure {
    fn from(item: ShipyardItem) -> Self {
        match item {
            ShipyardItem::Ship(ship) => Self::Ship(ship),
            ShipyardItem::Defense(defense) => Self::Defense(defense),
        }
    }
}

/// Factory levels that shorten construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EconomyModifiers {
    /// Robotics factory level.
    pub robotics: u32,
    /// Nanite factory level; each level halves durations.
    pub nanite: u32,
    /// Shipyard level.
    pub shipyard: u32,
}

impl EconomyModifiers {
    /// Read the modifiers off a planet's building levels.
    #[must_use]
    pub fn from_levels(levels: &Levels<BuildingId>) -> Self {
        Self {
            robotics: levels.level(BuildingId::RoboticsFactory),
            nanite: levels.level(BuildingId::NaniteFactory),
            shipyard: levels.level(BuildingId::Shipyard),
        }
    }

    fn nanite_factor(self) -> u128 {
        1u128.checked_shl(self.nanite).unwrap_or(u128::MAX)
    }
}

/// Price of `structure`.
///
/// Buildings cost the step from `current_level` to the next level; ships and
/// defense ignore the level and cost one unit.
#[must_use]
pub fn cost(structure: Structure, current_level: u32) -> ResourceCost {
    match structure {
        Structure::Building(building) => building.data().cost_at(current_level),
        Structure::Ship(ship) => ship.unit_cost(),
        Structure::Defense(defense) => defense.unit_cost(),
    }
}

/// Milliseconds needed to raise a building from `current_level` at `cost`.
///
/// `(metal + crystal) h / (2500 * max(4 - level/2, 1) * (1 + robotics) * 2^nanite)`
#[must_use]
pub fn build_duration_ms(cost: &ResourceCost, current_level: u32, modifiers: EconomyModifiers) -> u64 {
    // Doubled on both sides so the half-level term stays integral.
    let level_term = u128::from(8u32.saturating_sub(current_level).max(2));
    let numerator = whole(cost.structural()) * u128::from(MILLIS_PER_HOUR) * 2;
    let denominator = BASE_THROUGHPUT
        .saturating_mul(level_term)
        .saturating_mul(1 + u128::from(modifiers.robotics))
        .saturating_mul(modifiers.nanite_factor());
    clamp_duration(numerator / denominator)
}

/// Milliseconds the shipyard needs for one unit at `unit_cost`.
#[must_use]
pub fn shipyard_unit_duration_ms(unit_cost: &ResourceCost, modifiers: EconomyModifiers) -> u64 {
    let numerator = whole(unit_cost.structural()) * u128::from(MILLIS_PER_HOUR);
    let denominator = BASE_THROUGHPUT
        .saturating_mul(1 + u128::from(modifiers.shipyard))
        .saturating_mul(modifiers.nanite_factor());
    clamp_duration(numerator / denominator)
}

fn clamp_duration(ms: u128) -> u64 {
    u64::try_from(ms).unwrap_or(u64::MAX).max(MIN_DURATION_MS)
}
