//! Task admission.
//!
//! Each admission runs against a planet aggregate that the caller has just
//! reloaded inside a serializable transaction and caught up to `now`. Checks
//! run in a fixed order and stop at the first failure; a failure leaves the
//! aggregate untouched.
//!
//! Build tasks are paid for when they reach the head of the queue, so only a
//! task admitted into an empty build queue is paid here. Shipyard batches are
//! always paid at admission.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cost::{build_duration_ms, shipyard_unit_duration_ms, Structure};
use crate::data::{BuildingId, ShipyardItem, StructureKind};
use crate::error::Result;
use crate::math::Fixed;
use crate::planet::{PlanetId, PlanetState};
use crate::player::Player;
use crate::queue::{BuildTask, BuildTaskKind, QueuedTask, ShipyardTask};
use crate::resources::ResourceCost;
use crate::technology::TechnologyGate;
use crate::time::Timestamp;

/// Why a request was refused. These are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The key names nothing in the catalog.
    UnknownStructure,
    /// The planet lacks the structure the request depends on.
    StructureUnavailable,
    /// The queue has no room for the request.
    QueueFull,
    /// A shield dome is already installed or queued.
    DuplicateShield,
    /// The planet cannot pay for the request.
    InsufficientResources,
    /// Building or research prerequisites are not met.
    TechnologyNotMet,
    /// A shipyard or nanite factory upgrade is pending.
    ConflictingQueueState,
    /// Zero units or levels were requested.
    InvalidQuantity,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStructure => write!(f, "Unknown structure"),
            Self::StructureUnavailable => write!(f, "Required structure is not available"),
            Self::QueueFull => write!(f, "Queue is full"),
            Self::DuplicateShield => write!(f, "Shield dome already installed or queued"),
            Self::InsufficientResources => write!(f, "Insufficient resources"),
            Self::TechnologyNotMet => write!(f, "Technology requirements not met"),
            Self::ConflictingQueueState => {
                write!(f, "Shipyard or nanite factory upgrade in progress")
            }
            Self::InvalidQuantity => write!(f, "Quantity must be at least one"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Which queue a task went into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueKind {
    /// Building queue.
    Build,
    /// Shipyard queue.
    Shipyard,
}

/// Where an admitted request landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Planet the tasks belong to.
    pub planet: PlanetId,
    /// Queue the tasks went into.
    pub queue: QueueKind,
    /// Queue position of the first new task.
    pub position: usize,
    /// Levels or units admitted.
    pub count: u32,
    /// Start of the first new task.
    pub start: Timestamp,
    /// Finish of the last new task.
    pub finish: Timestamp,
}

/// Outcome of an admission: infrastructure errors outside, rejections inside.
pub type Admission = Result<std::result::Result<TaskHandle, Rejection>>;

fn reject(state: &PlanetState, request: &str, reason: Rejection) -> Admission {
    debug!(planet = %state.planet.id, request, %reason, "Request rejected");
    Ok(Err(reason))
}

/// Queue `quantity` levels of the building named `key`.
///
/// One task is enqueued per level. Each is timed at its projected level;
/// the accumulator re-costs it when it reaches the head.
pub fn schedule_build(
    state: &mut PlanetState,
    player: &Player,
    key: &str,
    quantity: u32,
    now: Timestamp,
) -> Admission {
    let Ok(building) = key.parse::<BuildingId>() else {
        return reject(state, key, Rejection::UnknownStructure);
    };
    if quantity == 0 {
        return reject(state, key, Rejection::InvalidQuantity);
    }
    if state.build_queue.remaining_capacity() < usize::try_from(quantity).unwrap_or(usize::MAX) {
        return reject(state, key, Rejection::QueueFull);
    }

    let first_level = state.projected_level(building);
    let data = building.data();
    let levels = (0..quantity).map(|offset| first_level.saturating_add(offset));
    let costs: Vec<ResourceCost> = levels.clone().map(|level| data.cost_at(level)).collect();
    // Energy is held while building, never spent: the dearest level decides.
    let total = ResourceCost {
        energy: costs.iter().map(|cost| cost.energy).max().unwrap_or(Fixed::ZERO),
        ..costs.iter().copied().sum()
    };
    if !state.planet.can_afford(&total) {
        return reject(state, key, Rejection::InsufficientResources);
    }

    let gate = TechnologyGate::new(&state.planet.buildings, &player.research);
    if !gate.allows(Structure::Building(building)) {
        return reject(state, key, Rejection::TechnologyNotMet);
    }

    let modifiers = state.planet.modifiers();
    let was_idle = state.build_queue.is_empty();
    let position = state.build_queue.len();
    let start = state.build_queue.next_start(now);
    let mut cursor = start;
    for level in levels {
        let cost = data.cost_at(level);
        let duration = build_duration_ms(&cost, level, modifiers);
        let task = BuildTask::new(BuildTaskKind::Build, building, cursor, duration);
        cursor = task.finish;
        state.build_queue.push(task)?;
    }
    if was_idle {
        state.planet.pay(&data.cost_at(first_level));
    }

    info!(
        planet = %state.planet.id,
        building = %building,
        quantity,
        from_level = first_level,
        finish = %cursor,
        "Build task admitted"
    );
    Ok(Ok(TaskHandle {
        planet: state.planet.id,
        queue: QueueKind::Build,
        position,
        count: quantity,
        start,
        finish: cursor,
    }))
}

/// Queue the removal of one level of the building named `key`.
///
/// The projected level (current level adjusted by queued tasks) must be
/// positive. Demolitions ignore prerequisites.
pub fn schedule_demolition(state: &mut PlanetState, key: &str, now: Timestamp) -> Admission {
    let Ok(building) = key.parse::<BuildingId>() else {
        return reject(state, key, Rejection::UnknownStructure);
    };
    let projected = state.projected_level(building);
    let Some(removed_level) = projected.checked_sub(1) else {
        return reject(state, key, Rejection::StructureUnavailable);
    };
    if state.build_queue.is_full() {
        return reject(state, key, Rejection::QueueFull);
    }

    let cost = building.data().cost_at(removed_level);
    if !state.planet.can_afford(&cost) {
        return reject(state, key, Rejection::InsufficientResources);
    }

    let was_idle = state.build_queue.is_empty();
    let position = state.build_queue.len();
    let duration = build_duration_ms(&cost, removed_level, state.planet.modifiers());
    let task = BuildTask::new(
        BuildTaskKind::Destroy,
        building,
        state.build_queue.next_start(now),
        duration,
    );
    let (start, finish) = (task.start, task.finish);
    state.build_queue.push(task)?;
    if was_idle {
        state.planet.pay(&cost);
    }

    info!(
        planet = %state.planet.id,
        building = %building,
        from_level = projected,
        finish = %finish,
        "Demolition admitted"
    );
    Ok(Ok(TaskHandle {
        planet: state.planet.id,
        queue: QueueKind::Build,
        position,
        count: 1,
        start,
        finish,
    }))
}

/// Queue a batch of `quantity` ships or defense structures named `key`.
pub fn schedule_shipyard(
    state: &mut PlanetState,
    player: &Player,
    kind: StructureKind,
    key: &str,
    quantity: u32,
    now: Timestamp,
) -> Admission {
    let Ok(item) = ShipyardItem::parse(kind, key) else {
        return reject(state, key, Rejection::UnknownStructure);
    };
    if state.planet.level(BuildingId::Shipyard) == 0 {
        return reject(state, key, Rejection::StructureUnavailable);
    }
    if quantity == 0 {
        return reject(state, key, Rejection::InvalidQuantity);
    }
    if state.shipyard_queue.is_full() {
        return reject(state, key, Rejection::QueueFull);
    }

    if item.is_shield() {
        let installed = state.planet.installed(item);
        let queued = state
            .shipyard_queue
            .count_matching(|task| task.item == item);
        if installed > 0 || queued > 0 || quantity > 1 {
            return reject(state, key, Rejection::DuplicateShield);
        }
    }

    let unit_cost = item.unit_cost();
    let total = (unit_cost * quantity).without_energy();
    if !state.planet.can_afford(&total) {
        return reject(state, key, Rejection::InsufficientResources);
    }

    let gate = TechnologyGate::new(&state.planet.buildings, &player.research);
    if !gate.allows(Structure::from(item)) {
        return reject(state, key, Rejection::TechnologyNotMet);
    }

    let upgrading = state.build_queue.count_matching(|task| {
        matches!(task.building, BuildingId::Shipyard | BuildingId::NaniteFactory)
    });
    if upgrading > 0 {
        return reject(state, key, Rejection::ConflictingQueueState);
    }

    let unit_ms = shipyard_unit_duration_ms(&unit_cost, state.planet.modifiers());
    let position = state.shipyard_queue.len();
    let task = ShipyardTask::new(item, quantity, unit_ms, state.shipyard_queue.next_start(now));
    let (start, finish) = (task.start(), task.finish());
    state.shipyard_queue.push(task)?;
    state.planet.pay(&total);

    info!(
        planet = %state.planet.id,
        item = item.key(),
        quantity,
        unit_ms,
        finish = %finish,
        "Shipyard task admitted"
    );
    Ok(Ok(TaskHandle {
        planet: state.planet.id,
        queue: QueueKind::Shipyard,
        position,
        count: quantity,
        start,
        finish,
    }))
}
