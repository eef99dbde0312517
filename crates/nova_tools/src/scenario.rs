//! Scenario replay.
//!
//! A scenario describes a homeworld, a list of timed requests and an
//! observation instant, in RON:
//!
//! ```text
//! (
//!     start: Some(0),
//!     planet: (
//!         max_temperature: Some(40),
//!         stock: Some((metal: 5000, crystal: 5000, deuterium: 0)),
//!         buildings: {"metalMine": 4, "solarPlant": 4},
//!     ),
//!     research: {"combustion": 1},
//!     requests: [
//!         (at: 0, action: Build(building: "metalMine", quantity: 2)),
//!         (at: 600000, action: Demolish(building: "solarPlant")),
//!     ],
//!     observe_at: 7200000,
//! )
//! ```
//!
//! Instants are milliseconds after `start`. Without a `start` the caller
//! supplies one, typically the wall clock.

use std::collections::BTreeMap;

use nova_core::config::GameConfig;
use nova_core::data::{BuildingId, ResearchId, StructureKind, UnknownKey};
use nova_core::planet::PlanetId;
use nova_core::resources::Resources;
use nova_core::scheduler::{Admission, Rejection, TaskHandle};
use nova_core::service::{ColonyService, PlanetView};
use nova_core::store::{MemoryStore, Store};
use nova_core::time::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Result, ToolError};

/// Stockpiles of the scenario planet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stock {
    /// Metal.
    pub metal: i32,
    /// Crystal.
    pub crystal: i32,
    /// Deuterium.
    pub deuterium: i32,
}

/// Initial state of the scenario planet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetSetup {
    /// Maximum temperature; the config default when absent.
    pub max_temperature: Option<i32>,
    /// Stored resources; the config default when absent.
    pub stock: Option<Stock>,
    /// Building levels by key.
    pub buildings: BTreeMap<String, u32>,
}

/// A request to replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Action {
    /// Queue building levels.
    Build {
        /// Building key.
        building: String,
        /// Levels to queue.
        quantity: u32,
    },
    /// Queue the removal of one level.
    Demolish {
        /// Building key.
        building: String,
    },
    /// Queue a ship or defense batch.
    Shipyard {
        /// Ship or defense.
        kind: StructureKind,
        /// Structure key.
        key: String,
        /// Units to produce.
        quantity: u32,
    },
}

/// A request at an offset from the scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedAction {
    /// Milliseconds after start.
    pub at: u64,
    /// What to request.
    pub action: Action,
}

/// A complete scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Absolute start instant in milliseconds.
    #[serde(default)]
    pub start: Option<i64>,
    /// Initial planet.
    #[serde(default)]
    pub planet: PlanetSetup,
    /// Research levels of the owner by key.
    #[serde(default)]
    pub research: BTreeMap<String, u32>,
    /// Requests in chronological order.
    #[serde(default)]
    pub requests: Vec<TimedAction>,
    /// Milliseconds after start at which the planet is observed.
    pub observe_at: u64,
}

impl Scenario {
    /// Parse a RON scenario.
    ///
    /// # Errors
    ///
    /// [`ToolError::Scenario`] on malformed text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }
}

/// Outcome of one replayed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    /// Absolute instant of the request.
    pub at: Timestamp,
    /// The request.
    pub action: Action,
    /// Where the task landed, or why it was refused.
    pub outcome: std::result::Result<TaskHandle, Rejection>,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Each request with its outcome.
    pub requests: Vec<RequestOutcome>,
    /// The planet at the observation instant.
    pub view: PlanetView,
}

/// Replay `scenario` against a fresh in-memory store.
///
/// `fallback_start` is used when the scenario has no `start`.
///
/// # Errors
///
/// Unknown keys, out-of-order requests, and infrastructure errors from the
/// core. Rejected requests are not errors; they are reported.
pub fn run_scenario(scenario: &Scenario, config: GameConfig, fallback_start: Timestamp) -> Result<ScenarioReport> {
    let start = scenario.start.map_or(fallback_start, Timestamp::from_millis);
    let buildings = parse_levels::<BuildingId>(&scenario.planet.buildings)?;
    let research = parse_levels::<ResearchId>(&scenario.research)?;

    let service = ColonyService::new(MemoryStore::new(), config);
    let (player, homeworld) = service.create_player("scenario", "Scenario", start)?;
    let planet = homeworld.planet.id;

    service.store().run_serializable(|tx| {
        let mut owner = tx.load_player(player.id)?;
        for &(topic, level) in &research {
            owner.research.set_level(topic, level);
        }
        tx.save_player(&owner)?;

        let mut state = tx.load_planet_for_update(planet)?;
        for &(building, level) in &buildings {
            state.planet.buildings.set_level(building, level);
        }
        if let Some(temperature) = scenario.planet.max_temperature {
            state.planet.max_temperature = temperature;
        }
        if let Some(stock) = scenario.planet.stock {
            state.planet.resources = Resources::new(stock.metal, stock.crystal, stock.deuterium);
        }
        state.planet.recalculate_economy();
        tx.save_planet_state(&state)
    })?;
    debug!(%planet, buildings = buildings.len(), "Scenario planet prepared");

    let mut requests = Vec::with_capacity(scenario.requests.len());
    let mut previous = 0;
    for timed in &scenario.requests {
        if timed.at < previous {
            return Err(ToolError::OutOfOrder {
                at: i64::try_from(timed.at).unwrap_or(i64::MAX),
            });
        }
        previous = timed.at;
        let at = start.after(timed.at);
        let outcome = replay(&service, planet, &timed.action, at)?;
        info!(%at, action = ?timed.action, ?outcome, "Replayed request");
        requests.push(RequestOutcome {
            at,
            action: timed.action.clone(),
            outcome,
        });
    }

    let view = service.get_current_planet_state(planet, start.after(scenario.observe_at))?;
    Ok(ScenarioReport { requests, view })
}

fn replay(
    service: &ColonyService<MemoryStore>,
    planet: PlanetId,
    action: &Action,
    at: Timestamp,
) -> Admission {
    match action {
        Action::Build { building, quantity } => {
            service.schedule_build_task(planet, building, *quantity, at)
        }
        Action::Demolish { building } => service.schedule_demolition_task(planet, building, at),
        Action::Shipyard {
            kind,
            key,
            quantity,
        } => service.schedule_shipyard_task(planet, *kind, key, *quantity, at),
    }
}

fn parse_levels<K>(levels: &BTreeMap<String, u32>) -> Result<Vec<(K, u32)>>
where
    K: std::str::FromStr<Err = UnknownKey>,
{
    levels
        .iter()
        .map(|(key, &level)| Ok((key.parse::<K>()?, level)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"(
        start: Some(1000000),
        planet: (
            stock: Some((metal: 10000, crystal: 10000, deuterium: 0)),
            buildings: {"metalMine": 2, "solarPlant": 3},
        ),
        requests: [
            (at: 0, action: Build(building: "metalMine", quantity: 2)),
            (at: 1000, action: Build(building: "warpGate", quantity: 1)),
        ],
        observe_at: 86400000,
    )"#;

    #[test]
    fn test_scenario_replays_and_completes() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        let report = run_scenario(&scenario, GameConfig::default(), Timestamp(0)).unwrap();

        assert_eq!(report.requests.len(), 2);
        assert!(report.requests[0].outcome.is_ok());
        assert_eq!(report.requests[1].outcome, Err(Rejection::UnknownStructure));
        assert_eq!(report.view.state.planet.level(BuildingId::MetalMine), 4);
        assert!(report.view.state.build_queue.is_empty());
    }

    #[test]
    fn test_out_of_order_requests() {
        let mut scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        scenario.requests.reverse();
        let err = run_scenario(&scenario, GameConfig::default(), Timestamp(0)).unwrap_err();
        assert!(matches!(err, ToolError::OutOfOrder { at: 0 }));
    }

    #[test]
    fn test_unknown_building_level() {
        let scenario = Scenario::from_ron_str("(planet: (buildings: {\"stargate\": 1}), observe_at: 0)").unwrap();
        let err = run_scenario(&scenario, GameConfig::default(), Timestamp(0)).unwrap_err();
        assert!(matches!(err, ToolError::UnknownKey(_)));
    }
}
