//! End-to-end catch-up scenarios on fixture planets.

use nova_core::accumulator::{advance, catch_up, head_terms};
use nova_core::cost::build_duration_ms;
use nova_core::data::{BuildingId, ShipId, ShipyardItem};
use nova_core::economy::Economy;
use nova_core::math::{produced_over, Fixed};
use nova_core::queue::{BuildTask, BuildTaskKind, QueuedTask, ShipyardTask};
use nova_core::resources::Resources;
use nova_test_utils::fixtures::{fixed, floor, hours, minutes, PlanetBuilder, T0};

fn flat_rate_planet() -> nova_core::planet::PlanetState {
    let mut state = PlanetBuilder::new().resources(500, 0, 0).build();
    state.planet.production = Resources::new(100, 0, 0);
    state.planet.storage = Resources::new(1000, 1000, 1000);
    state
}

#[test]
fn test_two_hours_of_income() {
    let mut state = flat_rate_planet();
    advance(&mut state.planet, &mut state.build_queue, T0.after(hours(2)));
    assert_eq!(state.planet.resources.metal, fixed(700));
    assert_eq!(state.planet.last_update, T0.after(hours(2)));
}

#[test]
fn test_ten_hours_of_income_is_capped() {
    let mut state = flat_rate_planet();
    advance(&mut state.planet, &mut state.build_queue, T0.after(hours(10)));
    assert_eq!(state.planet.resources.metal, fixed(1000));
}

#[test]
fn test_completion_mid_interval_rechains_next_task() {
    let first = BuildTask::new(BuildTaskKind::Build, BuildingId::MetalMine, T0, minutes(30));
    let second = BuildTask::new(BuildTaskKind::Build, BuildingId::Shipyard, first.finish, minutes(5));
    let mut state = PlanetBuilder::new()
        .resources(50_000, 50_000, 5_000)
        .building(BuildingId::MetalMine, 19)
        .building(BuildingId::SolarPlant, 20)
        .building(BuildingId::Shipyard, 3)
        .queued(first)
        .queued(second)
        .build();

    let rate_before = state.planet.production.metal;
    let upgraded = state.planet.buildings.clone().with(BuildingId::MetalMine, 20);
    let rate_after = Economy::compute(&upgraded, state.planet.max_temperature)
        .production
        .metal;
    assert!(rate_after > rate_before);

    let shipyard_cost = BuildingId::Shipyard.data().cost_at(3);
    let now = T0.after(minutes(45));
    let report = catch_up(&mut state, now).unwrap();

    assert_eq!(report.completed.len(), 1);
    assert!(report.abandoned.is_empty());
    assert_eq!(state.planet.level(BuildingId::MetalMine), 20);
    assert_eq!(state.planet.production.metal, rate_after);

    let head = state.build_queue.front().unwrap();
    assert_eq!(head.building, BuildingId::Shipyard);
    assert_eq!(head.start, T0.after(minutes(30)));
    let duration = build_duration_ms(&shipyard_cost, 3, state.planet.modifiers());
    assert_eq!(head.finish, head.start.after(duration));
    assert!(head.finish > now);

    let expected = fixed(50_000) + produced_over(rate_before, minutes(30))
        + produced_over(rate_after, minutes(15))
        - shipyard_cost.metal;
    assert_eq!(state.planet.resources.metal, expected);
    assert_eq!(state.planet.last_update, now);
}

#[test]
fn test_head_terms_match_the_rescheduled_head() {
    let first = BuildTask::new(BuildTaskKind::Build, BuildingId::CrystalMine, T0, minutes(1));
    let second = BuildTask::new(BuildTaskKind::Build, BuildingId::CrystalMine, first.finish, minutes(1));
    let mut state = PlanetBuilder::new()
        .resources(10_000, 10_000, 0)
        .queued(first)
        .queued(second)
        .build();

    catch_up(&mut state, T0.after(minutes(1) + 1)).unwrap();

    let head = state.build_queue.front().unwrap().clone();
    let (_, duration) = head_terms(&state.planet, &head).unwrap();
    assert_eq!(head.duration_ms(), duration);
}

#[test]
fn test_long_absence_replays_whole_queue() {
    let mut tasks = Vec::new();
    let mut start = T0;
    for _ in 0..5 {
        let task = BuildTask::new(BuildTaskKind::Build, BuildingId::MetalMine, start, minutes(10));
        start = task.finish;
        tasks.push(task);
    }
    let mut state = tasks
        .into_iter()
        .fold(PlanetBuilder::new().resources(90_000, 90_000, 0), PlanetBuilder::queued)
        .building(BuildingId::SolarPlant, 10)
        .build();

    let report = catch_up(&mut state, T0.after(hours(24 * 7))).unwrap();

    assert_eq!(report.completed.len(), 5);
    assert!(state.build_queue.is_empty());
    assert_eq!(state.planet.level(BuildingId::MetalMine), 5);
    assert_eq!(state.planet.resources.metal, state.planet.storage.metal);
}

#[test]
fn test_shipyard_and_build_queue_advance_together() {
    let light_fighter = ShipyardItem::Ship(ShipId::LightFighter);
    let batch = ShipyardTask::new(light_fighter, 4, minutes(10), T0);
    let upgrade = BuildTask::new(BuildTaskKind::Build, BuildingId::CrystalMine, T0, minutes(15));
    let mut state = PlanetBuilder::new()
        .building(BuildingId::Shipyard, 1)
        .queued(upgrade)
        .queued_batch(batch)
        .build();

    let report = catch_up(&mut state, T0.after(minutes(25))).unwrap();

    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].count, 2);
    assert_eq!(state.planet.installed(light_fighter), 2);
    assert_eq!(state.shipyard_queue.front().unwrap().delivered, 2);
    assert!(report.is_persistent());

    let report = catch_up(&mut state, T0.after(hours(1))).unwrap();
    assert_eq!(report.delivered[0].count, 2);
    assert_eq!(state.planet.installed(light_fighter), 4);
    assert!(state.shipyard_queue.is_empty());
}

#[test]
fn test_plain_accrual_is_not_persistent() {
    let mut state = PlanetBuilder::new().building(BuildingId::MetalMine, 3).build();
    let report = catch_up(&mut state, T0.after(hours(3))).unwrap();
    assert!(!report.is_persistent());
    assert!(state.planet.resources.metal > Fixed::from_num(500));
    assert!(floor(state.planet.resources.metal) < 100_000);
}
