//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the catch-up engine produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A planet may be observed at any instant, by any server process, any
//! number of times. Every observation must agree. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`nova_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Catalog tables are ordered maps or enum-indexed slices.
//!
//! - **Wall clock reads**: The current instant is always a parameter.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual formulas and queue operations
//! 2. **Property tests**: Random planets and instants still agree
//! 3. **Integration tests**: Full scenarios are reproducible
//! 4. **Parallel tests**: Catching up N copies on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use nova_core::accumulator::catch_up;
use nova_core::planet::PlanetState;
use nova_core::time::Timestamp;
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of observations replayed per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Catch-up is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped process several times and verify every run ends equal.
///
/// # Example
///
/// ```
/// use nova_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash of the persisted form of a planet aggregate.
///
/// # Panics
///
/// Panics if the aggregate cannot be encoded.
#[must_use]
pub fn state_hash(state: &PlanetState) -> u64 {
    let bytes = bincode::serialize(state).expect("planet state must encode");
    compute_hash(&bytes)
}

/// Catch `state` up at each instant in order.
///
/// # Panics
///
/// Panics if a catch-up pass fails.
pub fn observe_at(state: &mut PlanetState, instants: &[Timestamp]) {
    for &now in instants {
        catch_up(state, now).expect("catch-up must succeed");
    }
}

/// Observe a freshly built planet at `instants`, `runs` times, and compare.
pub fn verify_catch_up_determinism<F>(runs: usize, setup_fn: F, instants: &[Timestamp]) -> DeterminismResult
where
    F: Fn() -> PlanetState,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut state = setup_fn();
        observe_at(&mut state, instants);
        hashes.push(state_hash(&state));
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        steps: instants.len(),
    }
}

/// Catch up `num_copies` copies of a planet to `now` on scoped threads.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_catch_ups<F>(setup_fn: F, num_copies: usize, now: Timestamp) -> DeterminismResult
where
    F: Fn() -> PlanetState + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_copies)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    observe_at(&mut state, &[now]);
                    state_hash(&state)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        steps: 1,
    }
}

/// Compare two runs observation by observation, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(i)` if they differ after the
/// `i`-th observation (0 meaning the initial state).
pub fn find_first_divergence<F>(setup_fn: F, instants: &[Timestamp]) -> Option<usize>
where
    F: Fn() -> PlanetState,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if state_hash(&first) != state_hash(&second) {
        return Some(0);
    }

    for (i, &now) in instants.iter().enumerate() {
        observe_at(&mut first, &[now]);
        observe_at(&mut second, &[now]);
        if state_hash(&first) != state_hash(&second) {
            debug!(step = i + 1, %now, "Runs diverged");
            return Some(i + 1);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for catch-up and admission testing.
///
/// These strategies generate random but reproducible planets, requests
/// and observation instants.
pub mod strategies {
    use nova_core::data::{BuildingId, DefenseId, ShipId, ShipyardItem};
    use nova_core::planet::PlanetState;
    use nova_core::queue::{BuildQueue, BuildTask, BuildTaskKind};
    use nova_core::time::Timestamp;
    use proptest::prelude::*;

    use crate::fixtures::{PlanetBuilder, T0};

    /// Any building.
    pub fn arb_building() -> impl Strategy<Value = BuildingId> {
        proptest::sample::select(BuildingId::ALL.to_vec())
    }

    /// A building that affects production, storage or build speed.
    pub fn arb_economy_building() -> impl Strategy<Value = BuildingId> {
        proptest::sample::select(vec![
            BuildingId::MetalMine,
            BuildingId::CrystalMine,
            BuildingId::DeuteriumSynthesizer,
            BuildingId::SolarPlant,
            BuildingId::FusionReactor,
            BuildingId::MetalStorage,
            BuildingId::CrystalStorage,
            BuildingId::DeuteriumStorage,
            BuildingId::RoboticsFactory,
        ])
    }

    /// Any ship or defense structure.
    pub fn arb_shipyard_item() -> impl Strategy<Value = ShipyardItem> {
        prop_oneof![
            proptest::sample::select(ShipId::ALL.to_vec()).prop_map(ShipyardItem::Ship),
            proptest::sample::select(DefenseId::ALL.to_vec()).prop_map(ShipyardItem::Defense),
        ]
    }

    /// A building level in a realistic mid-game range.
    pub fn arb_level() -> impl Strategy<Value = u32> {
        0u32..15
    }

    /// Stored amount of one resource.
    pub fn arb_amount() -> impl Strategy<Value = i32> {
        0i32..2_000_000
    }

    /// Maximum planet temperature.
    pub fn arb_temperature() -> impl Strategy<Value = i32> {
        -130i32..260
    }

    /// Elapsed time up to 30 days.
    pub fn arb_elapsed_ms() -> impl Strategy<Value = u64> {
        0u64..2_592_000_000
    }

    /// Up to `max_len` increasing instants after [`T0`].
    pub fn arb_instants(max_len: usize) -> impl Strategy<Value = Vec<Timestamp>> {
        proptest::collection::vec(1u64..86_400_000, 1..max_len).prop_map(|gaps| {
            let mut now = T0;
            gaps.into_iter()
                .map(|gap| {
                    now = now.after(gap);
                    now
                })
                .collect()
        })
    }

    /// A planet at [`T0`] with random economy levels, stock and temperature.
    pub fn arb_planet() -> impl Strategy<Value = PlanetState> {
        (
            proptest::collection::vec((arb_economy_building(), arb_level()), 0..6),
            (arb_amount(), arb_amount(), arb_amount()),
            arb_temperature(),
        )
            .prop_map(|(levels, (metal, crystal, deuterium), temperature)| {
                levels
                    .into_iter()
                    .fold(PlanetBuilder::new(), |builder, (building, level)| {
                        builder.building(building, level)
                    })
                    .resources(metal, crystal, deuterium)
                    .temperature(temperature)
                    .build()
            })
    }

    /// A planet from [`arb_planet`] whose build queue holds up to `max_tasks`
    /// chained level-ups of economy buildings, the first one starting at
    /// [`T0`] and already paid for.
    pub fn arb_busy_planet(max_tasks: usize) -> impl Strategy<Value = PlanetState> {
        (
            arb_planet(),
            proptest::collection::vec((arb_economy_building(), 60_000u64..21_600_000), 1..=max_tasks),
        )
            .prop_map(|(mut state, tasks)| {
                let mut start = T0;
                let tasks: Vec<BuildTask> = tasks
                    .into_iter()
                    .map(|(building, duration)| {
                        let task = BuildTask::new(BuildTaskKind::Build, building, start, duration);
                        start = task.finish;
                        task
                    })
                    .collect();
                let capacity = state.build_queue.capacity().max(tasks.len());
                state.build_queue =
                    BuildQueue::from_tasks(capacity, tasks).expect("generated tasks are chained");
                state
            })
    }

    /// A build request: building key and level count.
    pub fn arb_build_request() -> impl Strategy<Value = (BuildingId, u32)> {
        (arb_building(), 1u32..4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{hours, minutes, PlanetBuilder, T0};
    use nova_core::data::BuildingId;
    use nova_core::queue::{BuildTask, BuildTaskKind};
    use proptest::prelude::*;

    fn queued_planet() -> PlanetState {
        let first = BuildTask::new(BuildTaskKind::Build, BuildingId::MetalMine, T0, minutes(20));
        let second = BuildTask::new(
            BuildTaskKind::Build,
            BuildingId::CrystalMine,
            first.finish,
            minutes(20),
        );
        PlanetBuilder::new()
            .resources(5_000, 5_000, 0)
            .building(BuildingId::SolarPlant, 3)
            .queued(first)
            .queued(second)
            .build()
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_repeated_catch_up_is_deterministic() {
        let instants = [T0.after(minutes(10)), T0.after(minutes(50)), T0.after(hours(6))];
        verify_catch_up_determinism(4, queued_planet, &instants).assert_deterministic();
    }

    #[test]
    fn test_parallel_catch_ups_agree() {
        run_parallel_catch_ups(queued_planet, 8, T0.after(hours(3))).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        let instants = [T0.after(minutes(15)), T0.after(minutes(45))];
        assert_eq!(find_first_divergence(queued_planet, &instants), None);
    }

    #[test]
    fn test_state_hash_sees_changes() {
        let before = queued_planet();
        let mut after = before.clone();
        observe_at(&mut after, &[T0.after(hours(1))]);
        assert_ne!(state_hash(&before), state_hash(&after));
    }

    proptest! {
        #[test]
        fn prop_busy_planet_queue_is_chained_from_t0(planet in strategies::arb_busy_planet(4)) {
            prop_assert!(planet.build_queue.validate().is_ok());
            prop_assert_eq!(planet.build_queue.front().map(|task| task.start), Some(T0));
            prop_assert!(planet.build_queue.len() <= 4);
        }

        #[test]
        fn prop_catch_up_is_deterministic(
            planet in strategies::arb_planet(),
            instants in strategies::arb_instants(5),
        ) {
            let result = verify_catch_up_determinism(2, || planet.clone(), &instants);
            prop_assert!(result.is_deterministic);
        }
    }
}
