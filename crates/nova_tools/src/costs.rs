//! Cost and duration tables for the building catalog.

use std::fmt::Write as _;

use nova_core::cost::{build_duration_ms, cost, EconomyModifiers, Structure};
use nova_core::data::BuildingId;
use nova_core::math::whole;
use serde::Serialize;

use crate::Result;

/// Price and duration of one level step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostRow {
    /// Level the step starts from.
    pub level: u32,
    /// Metal.
    pub metal: u128,
    /// Crystal.
    pub crystal: u128,
    /// Deuterium.
    pub deuterium: u128,
    /// Energy required while building.
    pub energy: u128,
    /// Build time.
    pub duration_ms: u64,
}

/// Rows for levels `0..levels` of the building named `key`.
///
/// # Errors
///
/// [`crate::ToolError::UnknownKey`] if `key` names no building.
pub fn cost_table(key: &str, levels: u32, modifiers: EconomyModifiers) -> Result<Vec<CostRow>> {
    let building: BuildingId = key.parse()?;
    Ok((0..levels)
        .map(|level| {
            let price = cost(Structure::Building(building), level);
            CostRow {
                level,
                metal: whole(price.metal),
                crystal: whole(price.crystal),
                deuterium: whole(price.deuterium),
                energy: whole(price.energy),
                duration_ms: build_duration_ms(&price, level, modifiers),
            }
        })
        .collect())
}

/// Plain-text rendering of a cost table.
#[must_use]
pub fn render(key: &str, rows: &[CostRow]) -> String {
    let mut out = format!(
        "{key}\n{:>5} {:>14} {:>14} {:>14} {:>8} {:>14}\n",
        "level", "metal", "crystal", "deuterium", "energy", "duration_s"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5} {:>14} {:>14} {:>14} {:>8} {:>14}",
            row.level,
            row.metal,
            row.crystal,
            row.deuterium,
            row.energy,
            row.duration_ms / 1000
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_mine_table() {
        let rows = cost_table("metalMine", 3, EconomyModifiers::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].metal, rows[0].crystal), (60, 15));
        assert_eq!((rows[1].metal, rows[1].crystal), (90, 22));
        assert_eq!((rows[2].metal, rows[2].crystal), (135, 33));
        assert!(rows.windows(2).all(|w| w[0].duration_ms <= w[1].duration_ms));
    }

    #[test]
    fn test_unknown_building() {
        assert!(cost_table("stargate", 1, EconomyModifiers::default()).is_err());
    }

    #[test]
    fn test_render_has_one_line_per_level() {
        let rows = cost_table("shipyard", 4, EconomyModifiers::default()).unwrap();
        assert_eq!(render("shipyard", &rows).lines().count(), 6);
    }
}
