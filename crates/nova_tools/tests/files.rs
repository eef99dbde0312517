//! File-based tool entry points.

use std::io::Write;

use nova_core::data::BuildingId;
use nova_core::time::Timestamp;
use nova_tools::scenario::{run_scenario, Scenario};
use nova_tools::validate::{load_config, validate_config_file};
use nova_tools::{read_file, ToolError};
use nova_test_utils::fixtures::{hours, T0};

fn write_temp(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_validate_config_file() {
    let file = write_temp("(build_queue_capacity: 7, starting_metal: 1500)");
    let config = validate_config_file(file.path()).unwrap();
    assert_eq!(config.build_queue_capacity, 7);
    assert_eq!(config.starting_metal, 1500);
    assert_eq!(config.shipyard_queue_capacity, 20);
}

#[test]
fn test_invalid_config_file() {
    let file = write_temp("(build_queue_capacity: 0)");
    assert!(matches!(
        validate_config_file(file.path()),
        Err(ToolError::Core(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = validate_config_file(&dir.path().join("absent.ron")).unwrap_err();
    assert!(matches!(err, ToolError::Io { .. }));
}

#[test]
fn test_default_config_without_path() {
    assert_eq!(load_config(None).unwrap().build_queue_capacity, 5);
}

#[test]
fn test_simulate_scenario_file() {
    let config = write_temp("(build_queue_capacity: 2)");
    let scenario = write_temp(
        r#"(
            planet: (
                stock: Some((metal: 20000, crystal: 20000, deuterium: 5000)),
                buildings: {"roboticsFactory": 2, "shipyard": 1, "solarPlant": 5},
            ),
            research: {"combustion": 1},
            requests: [
                (at: 0, action: Build(building: "crystalMine", quantity: 2)),
                (at: 0, action: Build(building: "metalMine", quantity: 1)),
                (at: 60000, action: Shipyard(kind: ship, key: "lightFighter", quantity: 3)),
            ],
            observe_at: 172800000,
        )"#,
    );

    let config = load_config(Some(config.path())).unwrap();
    let scenario = Scenario::from_ron_str(&read_file(scenario.path()).unwrap()).unwrap();
    let report = run_scenario(&scenario, config, T0).unwrap();

    assert!(report.requests[0].outcome.is_ok());
    assert!(report.requests[1].outcome.is_err());
    assert!(report.requests[2].outcome.is_ok());
    assert_eq!(report.requests[2].at, T0.after(60_000));

    let planet = &report.view.state.planet;
    assert_eq!(planet.level(BuildingId::CrystalMine), 2);
    assert_eq!(planet.last_update, T0.after(hours(48)));
    assert_eq!(
        planet.installed(nova_core::data::ShipyardItem::Ship(
            nova_core::data::ShipId::LightFighter
        )),
        3
    );

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"lightFighter\""));
}

#[test]
fn test_malformed_scenario() {
    let err = Scenario::from_ron_str("(requests: [").unwrap_err();
    assert!(matches!(err, ToolError::Scenario(_)));
}

#[test]
fn test_scenario_start_overrides_fallback() {
    let scenario = Scenario::from_ron_str("(start: Some(5000), observe_at: 1000)").unwrap();
    let report = run_scenario(&scenario, load_config(None).unwrap(), Timestamp(0)).unwrap();
    assert_eq!(report.view.state.planet.last_update, Timestamp(6000));
}
