//! Technology gate: whether a structure's prerequisites are met.

use crate::cost::Structure;
use crate::data::{
    building_requirements, defense_requirements, ship_requirements, BuildingId, Requirement,
    ResearchId,
};
use crate::levels::Levels;

/// Prerequisite check against a planet's buildings and its owner's research.
#[derive(Debug, Clone, Copy)]
pub struct TechnologyGate<'a> {
    buildings: &'a Levels<BuildingId>,
    research: &'a Levels<ResearchId>,
}

impl<'a> TechnologyGate<'a> {
    /// Create a gate over the given levels.
    #[must_use]
    pub const fn new(buildings: &'a Levels<BuildingId>, research: &'a Levels<ResearchId>) -> Self {
        Self {
            buildings,
            research,
        }
    }

    /// Static prerequisites of `structure`.
    #[must_use]
    pub const fn requirements(structure: Structure) -> &'static [Requirement] {
        match structure {
            Structure::Building(building) => building_requirements(building),
            Structure::Ship(ship) => ship_requirements(ship),
            Structure::Defense(defense) => defense_requirements(defense),
        }
    }

    /// Whether one requirement is met.
    #[must_use]
    pub fn is_met(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Building(building, level) => self.buildings.level(building) >= level,
            Requirement::Research(research, level) => self.research.level(research) >= level,
        }
    }

    /// Whether `structure` may be queued.
    #[must_use]
    pub fn allows(&self, structure: Structure) -> bool {
        Self::requirements(structure)
            .iter()
            .all(|&requirement| self.is_met(requirement))
    }

    /// Unmet prerequisites of `structure`, in table order.
    #[must_use]
    pub fn missing(&self, structure: Structure) -> Vec<Requirement> {
        Self::requirements(structure)
            .iter()
            .copied()
            .filter(|&requirement| !self.is_met(requirement))
            .collect()
    }
}
