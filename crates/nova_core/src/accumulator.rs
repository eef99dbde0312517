//! Lazy catch-up engine.
//!
//! A planet is never advanced by a running clock. Whenever it is observed or
//! mutated, [`catch_up`] replays everything that happened between
//! `last_update` and the instant supplied by the caller:
//!
//! 1. Resources accrue segment by segment, each segment ending at the next
//!    build completion, so production changes take effect exactly when the
//!    building finishes.
//! 2. After each completion the next head of the build queue is re-costed at
//!    the now-current level and paid for, or abandoned if unaffordable.
//! 3. Shipyard batches deliver every unit whose slot has elapsed.
//!
//! The result depends only on the planet, its queues and `now`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cost::build_duration_ms;
use crate::data::ShipyardItem;
use crate::error::Result;
use crate::math::produced_over;
use crate::planet::{Planet, PlanetState};
use crate::queue::{BuildQueue, BuildTask, BuildTaskKind, ShipyardQueue};
use crate::resources::{ResourceCost, ResourceKind};
use crate::time::Timestamp;

/// Units handed over by the shipyard during one catch-up pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// What was delivered.
    pub item: ShipyardItem,
    /// How many units.
    pub count: u32,
    /// Instant the last of these units finished.
    pub at: Timestamp,
}

/// What a catch-up pass changed beyond plain resource accrual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchUp {
    /// Build tasks applied, in completion order.
    pub completed: Vec<BuildTask>,
    /// Build tasks dropped because the planet could not pay for them when
    /// they reached the head of the queue.
    pub abandoned: Vec<BuildTask>,
    /// Shipyard deliveries.
    pub delivered: Vec<Delivery>,
}

impl CatchUp {
    /// Whether the pass did something irreversible that must be saved.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !self.completed.is_empty() || !self.abandoned.is_empty() || !self.delivered.is_empty()
    }
}

/// Bring a planet aggregate up to `now`.
///
/// Runs the shipyard pass and the build pass, then sets `last_update` to
/// `now`. A `now` at or before `last_update` is a no-op.
///
/// # Errors
/// With the `debug-validation` feature, returns
/// [`crate::GameError::InvariantViolation`] if either queue is no longer
/// chained after the pass.
pub fn catch_up(state: &mut PlanetState, now: Timestamp) -> Result<CatchUp> {
    if now <= state.planet.last_update {
        return Ok(CatchUp::default());
    }

    let delivered = advance_shipyard(&mut state.planet, &mut state.shipyard_queue, now);
    let mut report = advance(&mut state.planet, &mut state.build_queue, now);
    report.delivered = delivered;

    #[cfg(feature = "debug-validation")]
    {
        if let Err(err) = state
            .build_queue
            .validate()
            .and_then(|()| state.shipyard_queue.validate())
        {
            tracing::error!(planet = %state.planet.id, error = %err, "Queue broken after catch-up");
            return Err(err);
        }
    }

    Ok(report)
}

/// Replay the build queue and accrue resources up to `now`.
///
/// A task completes only if it finishes strictly before `now`. Sets
/// `last_update` to `now`; a `now` at or before `last_update` is a no-op.
pub fn advance(planet: &mut Planet, queue: &mut BuildQueue, now: Timestamp) -> CatchUp {
    let mut report = CatchUp::default();
    if now <= planet.last_update {
        return report;
    }

    let mut cursor = planet.last_update;
    while let Some(finish) = queue.front().map(|head| head.finish) {
        if finish >= now {
            break;
        }
        let segment_end = finish.max(cursor);
        accrue(planet, segment_end.millis_since(cursor));
        cursor = segment_end;

        let Some(task) = queue.pop() else { break };
        apply(planet, &task);
        info!(
            planet = %planet.id,
            building = %task.building,
            kind = ?task.kind,
            level = planet.level(task.building),
            at = %cursor,
            "Build task completed"
        );
        report.completed.push(task);

        schedule_head(planet, queue, cursor, &mut report.abandoned);
    }

    debug!(planet = %planet.id, from = %cursor, to = %now, "Accruing final segment");
    accrue(planet, now.millis_since(cursor));
    planet.last_update = now;
    report
}

/// Deliver every shipyard unit whose slot has elapsed by `now`.
///
/// Fully delivered batches leave the queue; the first unfinished batch keeps
/// its progress in `delivered`.
pub fn advance_shipyard(planet: &mut Planet, queue: &mut ShipyardQueue, now: Timestamp) -> Vec<Delivery> {
    let mut deliveries = Vec::new();
    loop {
        let finished = match queue.front_mut() {
            Some(task) => {
                let due = task.completed_by(now);
                let fresh = due.saturating_sub(task.delivered);
                if fresh > 0 {
                    task.delivered = due;
                    planet.install(task.item, u64::from(fresh));
                    let at = task
                        .start
                        .after(task.unit_duration_ms.saturating_mul(u64::from(due)));
                    debug!(
                        planet = %planet.id,
                        item = task.item.key(),
                        count = fresh,
                        "Shipyard delivered units"
                    );
                    deliveries.push(Delivery {
                        item: task.item,
                        count: fresh,
                        at,
                    });
                }
                task.remaining() == 0
            }
            None => false,
        };
        if !finished {
            break;
        }
        queue.pop();
    }
    deliveries
}

/// Price and duration of `task` if it became the head right now.
///
/// `None` for a demolition of a building that no longer exists.
#[must_use]
pub fn head_terms(planet: &Planet, task: &BuildTask) -> Option<(ResourceCost, u64)> {
    let level = planet.level(task.building);
    let priced_level = match task.kind {
        BuildTaskKind::Build => level,
        BuildTaskKind::Destroy => level.checked_sub(1)?,
    };
    let cost = task.building.data().cost_at(priced_level);
    let duration = build_duration_ms(&cost, priced_level, planet.modifiers());
    Some((cost, duration))
}

/// Re-cost the head at the current level and pay for it, abandoning heads
/// the planet cannot afford. The surviving head starts at `cursor`.
fn schedule_head(planet: &mut Planet, queue: &mut BuildQueue, cursor: Timestamp, abandoned: &mut Vec<BuildTask>) {
    while let Some(head) = queue.front() {
        match head_terms(planet, head) {
            Some((cost, duration)) if planet.can_afford(&cost) => {
                planet.pay(&cost);
                queue.reschedule_front(cursor, duration);
                return;
            }
            _ => {
                if let Some(task) = queue.pop() {
                    info!(
                        planet = %planet.id,
                        building = %task.building,
                        kind = ?task.kind,
                        at = %cursor,
                        "Build task abandoned, planet cannot pay for it"
                    );
                    abandoned.push(task);
                }
            }
        }
    }
}

fn apply(planet: &mut Planet, task: &BuildTask) {
    match task.kind {
        BuildTaskKind::Build => planet.buildings.increment(task.building),
        BuildTaskKind::Destroy => planet.buildings.decrement(task.building),
    }
    planet.recalculate_economy();
    planet.clamp_to_storage();
}

/// Add production over `elapsed_ms` to every stockpile below capacity.
fn accrue(planet: &mut Planet, elapsed_ms: u64) {
    if elapsed_ms == 0 {
        return;
    }
    for kind in ResourceKind::ALL {
        let capacity = planet.storage.get(kind);
        let rate = planet.production.get(kind);
        let stored = planet.resources.get_mut(kind);
        if *stored >= capacity {
            continue;
        }
        *stored = stored.saturating_add(produced_over(rate, elapsed_ms)).min(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BuildingId, ShipId};
    use crate::math::{Fixed, MILLIS_PER_HOUR};
    use crate::planet::PlanetId;
    use crate::player::PlayerId;
    use crate::queue::ShipyardTask;
    use crate::resources::Resources;

    const HOUR: u64 = MILLIS_PER_HOUR;

    fn planet(metal: i32, rate: i32, capacity: i32) -> Planet {
        let mut planet = Planet::new(
            PlanetId(1),
            PlayerId(1),
            "Test",
            40,
            Resources::new(metal, 0, 0),
            Timestamp(0),
        );
        planet.production = Resources::new(rate, 0, 0);
        planet.storage = Resources::new(capacity, capacity, capacity);
        planet
    }

    #[test]
    fn test_accrues_over_elapsed_hours() {
        let mut planet = planet(500, 100, 1000);
        let mut queue = BuildQueue::new(5);
        let report = advance(&mut planet, &mut queue, Timestamp(0).after(2 * HOUR));

        assert_eq!(planet.resources.metal, Fixed::from_num(700));
        assert_eq!(planet.last_update, Timestamp(0).after(2 * HOUR));
        assert!(!report.is_persistent());
    }

    #[test]
    fn test_accrual_stops_at_capacity() {
        let mut planet = planet(500, 100, 1000);
        let mut queue = BuildQueue::new(5);
        advance(&mut planet, &mut queue, Timestamp(0).after(10 * HOUR));
        assert_eq!(planet.resources.metal, Fixed::from_num(1000));
    }

    #[test]
    fn test_overfull_stock_is_left_alone() {
        let mut planet = planet(1500, 100, 1000);
        let mut queue = BuildQueue::new(5);
        advance(&mut planet, &mut queue, Timestamp(0).after(HOUR));
        assert_eq!(planet.resources.metal, Fixed::from_num(1500));
    }

    #[test]
    fn test_clock_skew_is_a_noop() {
        let mut planet = planet(500, 100, 1000);
        planet.last_update = Timestamp(10_000);
        let before = planet.clone();
        let mut queue = BuildQueue::new(5);

        let report = advance(&mut planet, &mut queue, Timestamp(5_000));
        assert_eq!(planet, before);
        assert_eq!(report, CatchUp::default());
    }

    #[test]
    fn test_completion_requires_finish_before_now() {
        let mut planet = planet(500, 0, 1000);
        let mut queue = BuildQueue::new(5);
        queue
            .push(BuildTask::new(
                BuildTaskKind::Build,
                BuildingId::MetalMine,
                Timestamp(0),
                1_000,
            ))
            .unwrap();

        let report = advance(&mut planet, &mut queue, Timestamp(1_000));
        assert!(report.completed.is_empty());
        assert_eq!(queue.len(), 1);

        let report = advance(&mut planet, &mut queue, Timestamp(1_001));
        assert_eq!(report.completed.len(), 1);
        assert_eq!(planet.level(BuildingId::MetalMine), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unaffordable_head_is_abandoned_and_next_starts_at_cursor() {
        let mut planet = planet(0, 0, 100_000);
        planet.resources = Resources::new(100, 100, 0);
        let mut queue = BuildQueue::new(5);
        let first = BuildTask::new(BuildTaskKind::Build, BuildingId::MetalMine, Timestamp(0), 1_000);
        let pricey = BuildTask::new(BuildTaskKind::Build, BuildingId::NaniteFactory, first.finish, 5_000);
        let cheap = BuildTask::new(BuildTaskKind::Build, BuildingId::CrystalMine, pricey.finish, 9_000);
        queue.push(first).unwrap();
        queue.push(pricey).unwrap();
        queue.push(cheap).unwrap();

        let report = advance(&mut planet, &mut queue, Timestamp(1_500));

        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.abandoned.len(), 1);
        assert_eq!(report.abandoned[0].building, BuildingId::NaniteFactory);

        let head = queue.front().unwrap();
        assert_eq!(head.building, BuildingId::CrystalMine);
        assert_eq!(head.start, Timestamp(1_000));
        // crystal mine level 0 costs 48/24, paid at head time; the metal
        // mine finished with no power, so only natural income trickles in
        assert_eq!(planet.resources.metal.floor(), Fixed::from_num(52));
        assert_eq!(planet.resources.crystal.floor(), Fixed::from_num(76));
    }

    #[test]
    fn test_demolition_of_missing_building_is_abandoned() {
        let mut planet = planet(1000, 0, 100_000);
        let mut queue = BuildQueue::new(5);
        let first = BuildTask::new(BuildTaskKind::Build, BuildingId::MetalMine, Timestamp(0), 1_000);
        let destroy = BuildTask::new(BuildTaskKind::Destroy, BuildingId::Shipyard, first.finish, 1_000);
        queue.push(first).unwrap();
        queue.push(destroy).unwrap();

        let report = advance(&mut planet, &mut queue, Timestamp(1_200));
        assert_eq!(report.abandoned.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_completion_changes_production_mid_interval() {
        let mut planet = Planet::new(
            PlanetId(1),
            PlayerId(1),
            "Test",
            40,
            Resources::new(1000, 1000, 0),
            Timestamp(0),
        );
        let mut queue = BuildQueue::new(5);
        queue
            .push(BuildTask::new(
                BuildTaskKind::Build,
                BuildingId::SolarPlant,
                Timestamp(0),
                HOUR,
            ))
            .unwrap();

        advance(&mut planet, &mut queue, Timestamp(0).after(2 * HOUR + 1));
        assert_eq!(planet.level(BuildingId::SolarPlant), 1);
        assert_eq!(planet.energy_produced, Fixed::from_num(22));
        // natural income of 30/h for just over two hours
        assert!(planet.resources.metal >= Fixed::from_num(1060));
        assert!(planet.resources.metal < Fixed::from_num(1061));
    }

    #[test]
    fn test_storage_demolition_clamps_stock() {
        let mut planet = planet(0, 0, 0);
        planet.buildings.set_level(BuildingId::MetalStorage, 1);
        planet.recalculate_economy();
        planet.resources = Resources::new(140_000, 0, 0);
        planet.production = Resources::ZERO;

        let mut queue = BuildQueue::new(5);
        queue
            .push(BuildTask::new(
                BuildTaskKind::Destroy,
                BuildingId::MetalStorage,
                Timestamp(0),
                1_000,
            ))
            .unwrap();
        advance(&mut planet, &mut queue, Timestamp(2_000));

        assert_eq!(planet.level(BuildingId::MetalStorage), 0);
        assert_eq!(planet.resources.metal, Fixed::from_num(100_000));
    }

    #[test]
    fn test_shipyard_delivers_progressively() {
        let mut planet = planet(0, 0, 1000);
        let mut queue = ShipyardQueue::new(20);
        let fighters = ShipyardItem::Ship(ShipId::LightFighter);
        queue
            .push(ShipyardTask::new(fighters, 10, 1_000, Timestamp(0)))
            .unwrap();
        queue
            .push(ShipyardTask::new(fighters, 2, 500, Timestamp(10_000)))
            .unwrap();

        let first = advance_shipyard(&mut planet, &mut queue, Timestamp(3_500));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].count, 3);
        assert_eq!(first[0].at, Timestamp(3_000));
        assert_eq!(planet.installed(fighters), 3);

        let rest = advance_shipyard(&mut planet, &mut queue, Timestamp(10_600));
        assert_eq!(rest.iter().map(|d| d.count).sum::<u32>(), 8);
        assert_eq!(planet.installed(fighters), 11);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.front().unwrap().delivered, 1);
    }

    #[test]
    fn test_catch_up_sets_last_update_and_reports() {
        let planet = planet(500, 100, 1000);
        let mut state = PlanetState::new(planet, 5, 20);
        state
            .shipyard_queue
            .push(ShipyardTask::new(
                ShipyardItem::Ship(ShipId::SmallCargo),
                1,
                1_000,
                Timestamp(0),
            ))
            .unwrap();

        let report = catch_up(&mut state, Timestamp(5_000)).unwrap();
        assert!(report.is_persistent());
        assert_eq!(report.delivered.len(), 1);
        assert_eq!(state.planet.last_update, Timestamp(5_000));
        assert!(state.shipyard_queue.is_empty());
    }
}
