//! Building catalog: identifiers, base costs and growth factors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::levels::LevelKey;
use crate::math::{exact_growth, Ratio};
use crate::resources::ResourceCost;

/// Every planetary building.
///
/// Serialized with stable camelCase keys (`metalMine`, `naniteFactory`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingId {
    /// Metal mine.
    MetalMine,
    /// Crystal mine.
    CrystalMine,
    /// Deuterium synthesizer.
    DeuteriumSynthesizer,
    /// Solar plant.
    SolarPlant,
    /// Fusion reactor.
    FusionReactor,
    /// Metal storage.
    MetalStorage,
    /// Crystal storage.
    CrystalStorage,
    /// Deuterium tank.
    DeuteriumStorage,
    /// Robotics factory, shortens building construction.
    RoboticsFactory,
    /// Nanite factory, halves construction and shipyard time per level.
    NaniteFactory,
    /// Shipyard, required for ships and defense.
    Shipyard,
    /// Research laboratory.
    ResearchLab,
    /// Missile silo.
    MissileSilo,
    /// Terraformer.
    Terraformer,
    /// Alliance depot.
    AllianceDepot,
    /// Space dock.
    SpaceDock,
}

/// Static cost data for one building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Which building.
    pub id: BuildingId,
    /// Metal for level 1.
    pub metal: u32,
    /// Crystal for level 1.
    pub crystal: u32,
    /// Deuterium for level 1.
    pub deuterium: u32,
    /// Energy required for level 1.
    pub energy: u32,
    /// Cost multiplier per level already built.
    pub growth: Ratio,
}

impl BuildingData {
    const fn new(id: BuildingId, metal: u32, crystal: u32, deuterium: u32, growth: Ratio) -> Self {
        Self {
            id,
            metal,
            crystal,
            deuterium,
            energy: 0,
            growth,
        }
    }

    const fn with_energy(mut self, energy: u32) -> Self {
        self.energy = energy;
        self
    }

    /// Cost of raising the building from `current_level` to the next level.
    #[must_use]
    pub fn cost_at(&self, current_level: u32) -> ResourceCost {
        ResourceCost {
            metal: exact_growth(self.metal, self.growth, current_level),
            crystal: exact_growth(self.crystal, self.growth, current_level),
            deuterium: exact_growth(self.deuterium, self.growth, current_level),
            energy: exact_growth(self.energy, self.growth, current_level),
        }
    }
}

impl BuildingId {
    /// Every building, in catalog order.
    pub const ALL: [Self; 16] = [
        Self::MetalMine,
        Self::CrystalMine,
        Self::DeuteriumSynthesizer,
        Self::SolarPlant,
        Self::FusionReactor,
        Self::MetalStorage,
        Self::CrystalStorage,
        Self::DeuteriumStorage,
        Self::RoboticsFactory,
        Self::NaniteFactory,
        Self::Shipyard,
        Self::ResearchLab,
        Self::MissileSilo,
        Self::Terraformer,
        Self::AllianceDepot,
        Self::SpaceDock,
    ];

    /// Stable key used in persisted rows and requests.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MetalMine => "metalMine",
            Self::CrystalMine => "crystalMine",
            Self::DeuteriumSynthesizer => "deuteriumSynthesizer",
            Self::SolarPlant => "solarPlant",
            Self::FusionReactor => "fusionReactor",
            Self::MetalStorage => "metalStorage",
            Self::CrystalStorage => "crystalStorage",
            Self::DeuteriumStorage => "deuteriumStorage",
            Self::RoboticsFactory => "roboticsFactory",
            Self::NaniteFactory => "naniteFactory",
            Self::Shipyard => "shipyard",
            Self::ResearchLab => "researchLab",
            Self::MissileSilo => "missileSilo",
            Self::Terraformer => "terraformer",
            Self::AllianceDepot => "allianceDepot",
            Self::SpaceDock => "spaceDock",
        }
    }

    /// Catalog entry for this building.
    #[must_use]
    pub const fn data(self) -> BuildingData {
        use Ratio as R;
        match self {
            Self::MetalMine => BuildingData::new(self, 60, 15, 0, R::ONE_POINT_FIVE),
            Self::CrystalMine => BuildingData::new(self, 48, 24, 0, R::ONE_POINT_SIX),
            Self::DeuteriumSynthesizer => BuildingData::new(self, 225, 75, 0, R::ONE_POINT_FIVE),
            Self::SolarPlant => BuildingData::new(self, 75, 30, 0, R::ONE_POINT_FIVE),
            Self::FusionReactor => BuildingData::new(self, 900, 360, 180, R::ONE_POINT_EIGHT),
            Self::MetalStorage => BuildingData::new(self, 1000, 0, 0, R::TWO),
            Self::CrystalStorage => BuildingData::new(self, 1000, 500, 0, R::TWO),
            Self::DeuteriumStorage => BuildingData::new(self, 1000, 1000, 0, R::TWO),
            Self::RoboticsFactory => BuildingData::new(self, 400, 120, 200, R::TWO),
            Self::NaniteFactory => BuildingData::new(self, 1_000_000, 500_000, 100_000, R::TWO),
            Self::Shipyard => BuildingData::new(self, 400, 200, 100, R::TWO),
            Self::ResearchLab => BuildingData::new(self, 200, 400, 200, R::TWO),
            Self::MissileSilo => BuildingData::new(self, 20_000, 20_000, 1000, R::TWO),
            Self::Terraformer => {
                BuildingData::new(self, 0, 50_000, 100_000, R::TWO).with_energy(1000)
            }
            Self::AllianceDepot => BuildingData::new(self, 20_000, 40_000, 0, R::TWO),
            Self::SpaceDock => BuildingData::new(self, 200, 0, 50, R::FIVE).with_energy(50),
        }
    }
}

impl LevelKey for BuildingId {
    const ALL: &'static [Self] = &Self::ALL;

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for BuildingId {
    type Err = UnknownKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|building| building.key() == key)
            .ok_or_else(|| UnknownKey(key.to_string()))
    }
}

impl std::fmt::Display for BuildingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A key that names nothing in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl std::fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown catalog key {:?}", self.0)
    }
}

impl std::error::Error for UnknownKey {}
