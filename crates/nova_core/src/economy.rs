//! Planetary economy: hourly production, storage capacity and energy balance.
//!
//! Everything here is derived from building levels (and the planet's maximum
//! temperature for deuterium) and must be recomputed whenever a level changes.
//! All calculations use fixed-point math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::data::BuildingId;
use crate::levels::Levels;
use crate::math::{compound, fixed_serde, Fixed, Ratio};
use crate::resources::Resources;

/// Base metal income of every planet, per hour.
const NATURAL_METAL: i32 = 30;
/// Base crystal income of every planet, per hour.
const NATURAL_CRYSTAL: i32 = 15;
/// Capacity of a store at level 0.
const BASE_STORAGE: i32 = 100_000;
/// Capacity added per storage step.
const STORAGE_STEP: i64 = 50_000;

/// Derived economy of one planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Economy {
    /// Net hourly production, never negative.
    pub production: Resources,
    /// Storage capacity per resource.
    pub storage: Resources,
    /// Energy produced by solar plants and fusion reactors.
    #[serde(with = "fixed_serde")]
    pub energy_produced: Fixed,
    /// Energy consumed by mines.
    #[serde(with = "fixed_serde")]
    pub energy_used: Fixed,
}

impl Economy {
    /// Compute the economy for `levels` on a planet at `max_temperature`.
    #[must_use]
    pub fn compute(levels: &Levels<BuildingId>, max_temperature: i32) -> Self {
        let level = |building: BuildingId| levels.level(building);

        let energy_produced = level_curve(20, level(BuildingId::SolarPlant), Ratio::ONE_POINT_ONE)
            .saturating_add(level_curve(
                30,
                level(BuildingId::FusionReactor),
                Ratio::ONE_POINT_OH_FIVE,
            ));
        let energy_used = level_curve(10, level(BuildingId::MetalMine), Ratio::ONE_POINT_ONE)
            .saturating_add(level_curve(10, level(BuildingId::CrystalMine), Ratio::ONE_POINT_ONE))
            .saturating_add(level_curve(
                20,
                level(BuildingId::DeuteriumSynthesizer),
                Ratio::ONE_POINT_ONE,
            ));

        let factor = if energy_used <= Fixed::ZERO {
            Fixed::ONE
        } else {
            (energy_produced / energy_used).min(Fixed::ONE)
        };

        let metal = Fixed::from_num(NATURAL_METAL).saturating_add(
            level_curve(30, level(BuildingId::MetalMine), Ratio::ONE_POINT_ONE)
                .saturating_mul(factor),
        );
        let crystal = Fixed::from_num(NATURAL_CRYSTAL).saturating_add(
            level_curve(20, level(BuildingId::CrystalMine), Ratio::ONE_POINT_ONE)
                .saturating_mul(factor),
        );
        let synthesized = compound(
            scaled(10, level(BuildingId::DeuteriumSynthesizer)),
            Ratio::ONE_POINT_ONE,
            level(BuildingId::DeuteriumSynthesizer),
        )
        .saturating_mul(temperature_factor(max_temperature))
        .floor()
        .max(Fixed::ZERO);
        let fusion_burn = level_curve(10, level(BuildingId::FusionReactor), Ratio::ONE_POINT_ONE);
        let deuterium = synthesized
            .saturating_mul(factor)
            .saturating_sub(fusion_burn)
            .max(Fixed::ZERO);

        Self {
            production: Resources {
                metal,
                crystal,
                deuterium,
            },
            storage: Resources {
                metal: storage_capacity(level(BuildingId::MetalStorage)),
                crystal: storage_capacity(level(BuildingId::CrystalStorage)),
                deuterium: storage_capacity(level(BuildingId::DeuteriumStorage)),
            },
            energy_produced,
            energy_used,
        }
    }

    /// Energy left over after every consumer is served.
    #[must_use]
    pub fn spare_energy(&self) -> Fixed {
        self.energy_produced.saturating_sub(self.energy_used)
    }
}

/// Capacity of a store at `level`: `100000 + 50000 * (ceil(1.6^level) - 1)`.
#[must_use]
pub fn storage_capacity(level: u32) -> Fixed {
    let steps = compound(Fixed::ONE, Ratio::ONE_POINT_SIX, level).saturating_ceil() - Fixed::ONE;
    Fixed::from_num(BASE_STORAGE).saturating_add(steps.saturating_mul_int(STORAGE_STEP))
}

/// `floor(base * level * ratio^level)`
fn level_curve(base: i32, level: u32, ratio: Ratio) -> Fixed {
    compound(scaled(base, level), ratio, level).floor()
}

fn scaled(base: i32, level: u32) -> Fixed {
    Fixed::from_num(base).saturating_mul_int(i64::from(level))
}

/// `1.44 - 0.004 * max_temperature`
fn temperature_factor(max_temperature: i32) -> Fixed {
    let thousandths = 1_440 - 4 * i64::from(max_temperature);
    Fixed::saturating_from_num(thousandths) / 1_000
}
