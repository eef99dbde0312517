//! Research identifiers and the static prerequisite table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::building_data::{BuildingId, UnknownKey};
use super::unit_data::{DefenseId, ShipId};
use crate::levels::LevelKey;

/// Every research topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResearchId {
    /// Energy technology.
    Energy,
    /// Laser technology.
    Laser,
    /// Ion technology.
    Ion,
    /// Hyperspace technology.
    Hyperspace,
    /// Plasma technology.
    Plasma,
    /// Combustion drive.
    Combustion,
    /// Impulse drive.
    Impulse,
    /// Hyperspace drive.
    HyperspaceDrive,
    /// Espionage technology.
    Espionage,
    /// Computer technology.
    Computer,
    /// Astrophysics.
    Astrophysics,
    /// Intergalactic research network.
    IntergalacticResearchNetwork,
    /// Graviton technology.
    Graviton,
    /// Weapons technology.
    Weapons,
    /// Shielding technology.
    Shielding,
    /// Armour technology.
    Armour,
}

impl ResearchId {
    /// Every research topic, in catalog order.
    pub const ALL: [Self; 16] = [
        Self::Energy,
        Self::Laser,
        Self::Ion,
        Self::Hyperspace,
        Self::Plasma,
        Self::Combustion,
        Self::Impulse,
        Self::HyperspaceDrive,
        Self::Espionage,
        Self::Computer,
        Self::Astrophysics,
        Self::IntergalacticResearchNetwork,
        Self::Graviton,
        Self::Weapons,
        Self::Shielding,
        Self::Armour,
    ];

    /// Stable key used in persisted rows.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Laser => "laser",
            Self::Ion => "ion",
            Self::Hyperspace => "hyperspace",
            Self::Plasma => "plasma",
            Self::Combustion => "combustion",
            Self::Impulse => "impulse",
            Self::HyperspaceDrive => "hyperspaceDrive",
            Self::Espionage => "espionage",
            Self::Computer => "computer",
            Self::Astrophysics => "astrophysics",
            Self::IntergalacticResearchNetwork => "intergalacticResearchNetwork",
            Self::Graviton => "graviton",
            Self::Weapons => "weapons",
            Self::Shielding => "shielding",
            Self::Armour => "armour",
        }
    }
}

impl LevelKey for ResearchId {
    const ALL: &'static [Self] = &Self::ALL;

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for ResearchId {
    type Err = UnknownKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|research| research.key() == key)
            .ok_or_else(|| UnknownKey(key.to_string()))
    }
}

/// A minimum level that must be reached before something can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Requirement {
    /// A building on the same planet.
    Building(BuildingId, u32),
    /// A research topic of the owning player.
    Research(ResearchId, u32),
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Building(building, level) => write!(f, "{} {level}", building.key()),
            Self::Research(research, level) => write!(f, "{} {level}", research.key()),
        }
    }
}

use BuildingId as B;
use Requirement::{Building as Bld, Research as Res};
use ResearchId as R;

/// Prerequisites of a building. Empty when it is always available.
#[must_use]
pub const fn building_requirements(building: BuildingId) -> &'static [Requirement] {
    match building {
        B::FusionReactor => &[Bld(B::DeuteriumSynthesizer, 5), Res(R::Energy, 3)],
        B::NaniteFactory => &[Bld(B::RoboticsFactory, 10), Res(R::Computer, 10)],
        B::Shipyard => &[Bld(B::RoboticsFactory, 2)],
        B::MissileSilo => &[Bld(B::Shipyard, 1)],
        B::SpaceDock => &[Bld(B::Shipyard, 2)],
        B::Terraformer => &[Bld(B::NaniteFactory, 1), Res(R::Energy, 12)],
        _ => &[],
    }
}

/// Prerequisites of a ship hull.
#[must_use]
pub const fn ship_requirements(ship: ShipId) -> &'static [Requirement] {
    match ship {
        ShipId::SmallCargo => &[Bld(B::Shipyard, 2), Res(R::Combustion, 2)],
        ShipId::LargeCargo => &[Bld(B::Shipyard, 4), Res(R::Combustion, 6)],
        ShipId::LightFighter => &[Bld(B::Shipyard, 1), Res(R::Combustion, 1)],
        ShipId::HeavyFighter => &[
            Bld(B::Shipyard, 3),
            Res(R::Armour, 2),
            Res(R::Impulse, 2),
        ],
        ShipId::Cruiser => &[Bld(B::Shipyard, 5), Res(R::Impulse, 4), Res(R::Ion, 2)],
        ShipId::Battleship => &[Bld(B::Shipyard, 7), Res(R::HyperspaceDrive, 4)],
        ShipId::ColonyShip => &[Bld(B::Shipyard, 4), Res(R::Impulse, 3)],
        ShipId::Recycler => &[
            Bld(B::Shipyard, 4),
            Res(R::Combustion, 6),
            Res(R::Shielding, 2),
        ],
        ShipId::EspionageProbe => &[
            Bld(B::Shipyard, 3),
            Res(R::Combustion, 3),
            Res(R::Espionage, 2),
        ],
        ShipId::Bomber => &[Bld(B::Shipyard, 8), Res(R::Impulse, 6), Res(R::Plasma, 5)],
        ShipId::SolarSatellite => &[Bld(B::Shipyard, 1)],
        ShipId::Destroyer => &[
            Bld(B::Shipyard, 9),
            Res(R::HyperspaceDrive, 6),
            Res(R::Hyperspace, 5),
        ],
        ShipId::Deathstar => &[
            Bld(B::Shipyard, 12),
            Res(R::HyperspaceDrive, 7),
            Res(R::Hyperspace, 6),
            Res(R::Graviton, 1),
        ],
        ShipId::Battlecruiser => &[
            Bld(B::Shipyard, 8),
            Res(R::Hyperspace, 5),
            Res(R::HyperspaceDrive, 5),
            Res(R::Laser, 12),
        ],
    }
}

/// Prerequisites of a defense structure.
#[must_use]
pub const fn defense_requirements(defense: DefenseId) -> &'static [Requirement] {
    match defense {
        DefenseId::RocketLauncher => &[Bld(B::Shipyard, 1)],
        DefenseId::LightLaser => &[Bld(B::Shipyard, 2), Res(R::Laser, 3)],
        DefenseId::HeavyLaser => &[Bld(B::Shipyard, 4), Res(R::Energy, 3), Res(R::Laser, 6)],
        DefenseId::GaussCannon => &[
            Bld(B::Shipyard, 6),
            Res(R::Energy, 6),
            Res(R::Weapons, 3),
            Res(R::Shielding, 1),
        ],
        DefenseId::IonCannon => &[Bld(B::Shipyard, 4), Res(R::Ion, 4)],
        DefenseId::PlasmaTurret => &[Bld(B::Shipyard, 8), Res(R::Plasma, 7)],
        DefenseId::SmallShieldDome => &[Bld(B::Shipyard, 1), Res(R::Shielding, 2)],
        DefenseId::LargeShieldDome => &[Bld(B::Shipyard, 6), Res(R::Shielding, 6)],
        DefenseId::AntiBallisticMissile => &[Bld(B::MissileSilo, 2)],
        DefenseId::InterplanetaryMissile => &[Bld(B::MissileSilo, 4), Res(R::Impulse, 1)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_index_matches_catalog_order() {
        for (position, research) in ResearchId::ALL.into_iter().enumerate() {
            assert_eq!(research.index(), position);
            assert_eq!(research.key().parse::<ResearchId>(), Ok(research));
        }
    }

    #[test]
    fn test_basic_buildings_have_no_prerequisites() {
        assert!(building_requirements(BuildingId::MetalMine).is_empty());
        assert!(building_requirements(BuildingId::RoboticsFactory).is_empty());
    }

    #[test]
    fn test_silo_and_dock_need_shipyard() {
        assert_eq!(
            building_requirements(BuildingId::MissileSilo),
            &[Requirement::Building(BuildingId::Shipyard, 1)]
        );
        assert_eq!(
            building_requirements(BuildingId::SpaceDock),
            &[Requirement::Building(BuildingId::Shipyard, 2)]
        );
    }

    #[test]
    fn test_every_ship_needs_a_shipyard() {
        for ship in ShipId::ALL {
            assert!(ship_requirements(ship)
                .iter()
                .any(|req| matches!(req, Requirement::Building(BuildingId::Shipyard, _))));
        }
    }

    #[test]
    fn test_requirement_display() {
        assert_eq!(
            Requirement::Research(ResearchId::HyperspaceDrive, 4).to_string(),
            "hyperspaceDrive 4"
        );
    }
}
