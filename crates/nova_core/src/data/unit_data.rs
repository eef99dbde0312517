//! Shipyard catalog: ships and planetary defense.
//!
//! Shipyard units have a fixed unit cost; quantity multiplies it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::building_data::UnknownKey;
use crate::resources::ResourceCost;

/// Whether a shipyard item is a ship or a defense structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureKind {
    /// Mobile fleet unit.
    Ship,
    /// Planetary defense.
    Defense,
}

/// Every ship hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShipId {
    /// Small cargo.
    SmallCargo,
    /// Large cargo.
    LargeCargo,
    /// Light fighter.
    LightFighter,
    /// Heavy fighter.
    HeavyFighter,
    /// Cruiser.
    Cruiser,
    /// Battleship.
    Battleship,
    /// Colony ship.
    ColonyShip,
    /// Recycler.
    Recycler,
    /// Espionage probe.
    EspionageProbe,
    /// Bomber.
    Bomber,
    /// Solar satellite.
    SolarSatellite,
    /// Destroyer.
    Destroyer,
    /// Deathstar.
    Deathstar,
    /// Battlecruiser.
    Battlecruiser,
}

/// Every defense structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefenseId {
    /// Rocket launcher.
    RocketLauncher,
    /// Light laser.
    LightLaser,
    /// Heavy laser.
    HeavyLaser,
    /// Gauss cannon.
    GaussCannon,
    /// Ion cannon.
    IonCannon,
    /// Plasma turret.
    PlasmaTurret,
    /// Small shield dome, at most one per planet.
    SmallShieldDome,
    /// Large shield dome, at most one per planet.
    LargeShieldDome,
    /// Anti-ballistic missile.
    AntiBallisticMissile,
    /// Interplanetary missile.
    InterplanetaryMissile,
}

impl ShipId {
    /// Every ship, in catalog order.
    pub const ALL: [Self; 14] = [
        Self::SmallCargo,
        Self::LargeCargo,
        Self::LightFighter,
        Self::HeavyFighter,
        Self::Cruiser,
        Self::Battleship,
        Self::ColonyShip,
        Self::Recycler,
        Self::EspionageProbe,
        Self::Bomber,
        Self::SolarSatellite,
        Self::Destroyer,
        Self::Deathstar,
        Self::Battlecruiser,
    ];

    /// Stable key used in persisted rows and requests.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SmallCargo => "smallCargo",
            Self::LargeCargo => "largeCargo",
            Self::LightFighter => "lightFighter",
            Self::HeavyFighter => "heavyFighter",
            Self::Cruiser => "cruiser",
            Self::Battleship => "battleship",
            Self::ColonyShip => "colonyShip",
            Self::Recycler => "recycler",
            Self::EspionageProbe => "espionageProbe",
            Self::Bomber => "bomber",
            Self::SolarSatellite => "solarSatellite",
            Self::Destroyer => "destroyer",
            Self::Deathstar => "deathstar",
            Self::Battlecruiser => "battlecruiser",
        }
    }

    /// Price of one hull.
    #[must_use]
    pub fn unit_cost(self) -> ResourceCost {
        let (metal, crystal, deuterium) = match self {
            Self::SmallCargo => (2000, 2000, 0),
            Self::LargeCargo => (6000, 6000, 0),
            Self::LightFighter => (3000, 1000, 0),
            Self::HeavyFighter => (6000, 4000, 0),
            Self::Cruiser => (20_000, 7000, 2000),
            Self::Battleship => (45_000, 15_000, 0),
            Self::ColonyShip => (10_000, 20_000, 10_000),
            Self::Recycler => (10_000, 6000, 2000),
            Self::EspionageProbe => (0, 1000, 0),
            Self::Bomber => (50_000, 25_000, 15_000),
            Self::SolarSatellite => (0, 2000, 500),
            Self::Destroyer => (60_000, 50_000, 15_000),
            Self::Deathstar => (5_000_000, 4_000_000, 1_000_000),
            Self::Battlecruiser => (30_000, 40_000, 15_000),
        };
        ResourceCost::new(metal, crystal, deuterium, 0)
    }
}

impl DefenseId {
    /// Every defense structure, in catalog order.
    pub const ALL: [Self; 10] = [
        Self::RocketLauncher,
        Self::LightLaser,
        Self::HeavyLaser,
        Self::GaussCannon,
        Self::IonCannon,
        Self::PlasmaTurret,
        Self::SmallShieldDome,
        Self::LargeShieldDome,
        Self::AntiBallisticMissile,
        Self::InterplanetaryMissile,
    ];

    /// Stable key used in persisted rows and requests.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RocketLauncher => "rocketLauncher",
            Self::LightLaser => "lightLaser",
            Self::HeavyLaser => "heavyLaser",
            Self::GaussCannon => "gaussCannon",
            Self::IonCannon => "ionCannon",
            Self::PlasmaTurret => "plasmaTurret",
            Self::SmallShieldDome => "smallShieldDome",
            Self::LargeShieldDome => "largeShieldDome",
            Self::AntiBallisticMissile => "antiBallisticMissile",
            Self::InterplanetaryMissile => "interplanetaryMissile",
        }
    }

    /// Shield domes are unique per planet.
    #[must_use]
    pub const fn is_shield(self) -> bool {
        matches!(self, Self::SmallShieldDome | Self::LargeShieldDome)
    }

    /// Price of one structure.
    #[must_use]
    pub fn unit_cost(self) -> ResourceCost {
        let (metal, crystal, deuterium) = match self {
            Self::RocketLauncher => (2000, 0, 0),
            Self::LightLaser => (1500, 500, 0),
            Self::HeavyLaser => (6000, 2000, 0),
            Self::GaussCannon => (20_000, 15_000, 2000),
            Self::IonCannon => (5000, 3000, 0),
            Self::PlasmaTurret => (50_000, 50_000, 30_000),
            Self::SmallShieldDome => (10_000, 10_000, 0),
            Self::LargeShieldDome => (50_000, 50_000, 0),
            Self::AntiBallisticMissile => (8000, 0, 2000),
            Self::InterplanetaryMissile => (12_500, 2500, 10_000),
        };
        ResourceCost::new(metal, crystal, deuterium, 0)
    }
}

/// Anything the shipyard can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShipyardItem {
    /// A ship hull.
    Ship(ShipId),
    /// A defense structure.
    Defense(DefenseId),
}

impl ShipyardItem {
    /// Look up `key` among the items of `kind`.
    pub fn parse(kind: StructureKind, key: &str) -> Result<Self, UnknownKey> {
        let found = match kind {
            StructureKind::Ship => ShipId::ALL
                .into_iter()
                .find(|ship| ship.key() == key)
                .map(Self::Ship),
            StructureKind::Defense => DefenseId::ALL
                .into_iter()
                .find(|defense| defense.key() == key)
                .map(Self::Defense),
        };
        found.ok_or_else(|| UnknownKey(key.to_string()))
    }

    /// Ship or defense.
    #[must_use]
    pub const fn kind(self) -> StructureKind {
        match self {
            Self::Ship(_) => StructureKind::Ship,
            Self::Defense(_) => StructureKind::Defense,
        }
    }

    /// Stable key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ship(ship) => ship.key(),
            Self::Defense(defense) => defense.key(),
        }
    }

    /// Price of one unit.
    #[must_use]
    pub fn unit_cost(self) -> ResourceCost {
        match self {
            Self::Ship(ship) => ship.unit_cost(),
            Self::Defense(defense) => defense.unit_cost(),
        }
    }

    /// Whether at most one of this item may exist on a planet.
    #[must_use]
    pub const fn is_shield(self) -> bool {
        match self {
            Self::Ship(_) => false,
            Self::Defense(defense) => defense.is_shield(),
        }
    }
}

impl FromStr for ShipId {
    type Err = UnknownKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match ShipyardItem::parse(StructureKind::Ship, key)? {
            ShipyardItem::Ship(ship) => Ok(ship),
            ShipyardItem::Defense(_) => Err(UnknownKey(key.to_string())),
        }
    }
}

impl FromStr for DefenseId {
    type Err = UnknownKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match ShipyardItem::parse(StructureKind::Defense, key)? {
            ShipyardItem::Defense(defense) => Ok(defense),
            ShipyardItem::Ship(_) => Err(UnknownKey(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_respects_kind() {
        assert_eq!(
            ShipyardItem::parse(StructureKind::Ship, "lightFighter"),
            Ok(ShipyardItem::Ship(ShipId::LightFighter))
        );
        assert!(ShipyardItem::parse(StructureKind::Defense, "lightFighter").is_err());
        assert!(ShipyardItem::parse(StructureKind::Ship, "warpDrive").is_err());
    }

    #[test]
    fn test_only_domes_are_shields() {
        let shields: Vec<_> = DefenseId::ALL
            .into_iter()
            .filter(|defense| defense.is_shield())
            .collect();
        assert_eq!(
            shields,
            vec![DefenseId::SmallShieldDome, DefenseId::LargeShieldDome]
        );
        assert!(!ShipyardItem::Ship(ShipId::Deathstar).is_shield());
    }

    #[test]
    fn test_unit_costs_carry_no_energy() {
        for ship in ShipId::ALL {
            assert_eq!(ship.unit_cost().energy, crate::math::Fixed::ZERO);
        }
        for defense in DefenseId::ALL {
            assert_eq!(defense.unit_cost().energy, crate::math::Fixed::ZERO);
        }
    }

    #[test]
    fn test_keys_parse_back() {
        for ship in ShipId::ALL {
            assert_eq!(ship.key().parse::<ShipId>(), Ok(ship));
        }
        for defense in DefenseId::ALL {
            assert_eq!(defense.key().parse::<DefenseId>(), Ok(defense));
        }
    }
}
