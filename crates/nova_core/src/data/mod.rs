//! Static catalog: buildings, ships, defense and research.
//!
//! Every identifier is a closed enum with a stable camelCase key. Costs and
//! prerequisites are compiled in; nothing here performs IO.

mod building_data;
mod tech_data;
mod unit_data;

pub use building_data::{BuildingData, BuildingId, UnknownKey};
pub use tech_data::{
    building_requirements, defense_requirements, ship_requirements, Requirement, ResearchId,
};
pub use unit_data::{DefenseId, ShipId, ShipyardItem, StructureKind};
