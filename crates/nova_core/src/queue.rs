//! Capacity-bounded task queues.
//!
//! A queue holds the pending tasks of one planet ordered by finish instant.
//! Tasks are chained: each task starts exactly when the previous one
//! finishes, and every task finishes strictly after it starts. Only the
//! scheduler and the accumulator may push or pop.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::data::{BuildingId, ShipyardItem};
use crate::error::{GameError, Result};
use crate::time::Timestamp;

/// A task with a scheduled start and finish.
pub trait QueuedTask: Clone + std::fmt::Debug {
    /// Instant the task starts.
    fn start(&self) -> Timestamp;

    /// Instant the task finishes.
    fn finish(&self) -> Timestamp;

    /// Move the task to `start`, finishing after `duration_ms`.
    fn reschedule(&mut self, start: Timestamp, duration_ms: u64);

    /// Scheduled duration in milliseconds.
    fn duration_ms(&self) -> u64 {
        self.finish().millis_since(self.start())
    }
}

/// Whether a build task adds or removes a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildTaskKind {
    /// Raise the building by one level.
    Build,
    /// Lower the building by one level.
    Destroy,
}

/// One pending building level change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildTask {
    /// Build or destroy.
    pub kind: BuildTaskKind,
    /// Target building.
    pub building: BuildingId,
    /// Scheduled start.
    pub start: Timestamp,
    /// Scheduled finish.
    pub finish: Timestamp,
}

impl BuildTask {
    /// Create a task running from `start` for `duration_ms`.
    #[must_use]
    pub fn new(kind: BuildTaskKind, building: BuildingId, start: Timestamp, duration_ms: u64) -> Self {
        Self {
            kind,
            building,
            start,
            finish: start.after(duration_ms),
        }
    }

    /// Level change applied on completion.
    #[must_use]
    pub const fn level_delta(&self) -> i64 {
        match self.kind {
            BuildTaskKind::Build => 1,
            BuildTaskKind::Destroy => -1,
        }
    }
}

impl QueuedTask for BuildTask {
    fn start(&self) -> Timestamp {
        self.start
    }

    fn finish(&self) -> Timestamp {
        self.finish
    }

    fn reschedule(&mut self, start: Timestamp, duration_ms: u64) {
        self.start = start;
        self.finish = start.after(duration_ms);
    }
}

/// One batch of ships or defense structures.
///
/// Units are delivered one at a time, every `unit_duration_ms` from `start`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipyardTask {
    /// What is being produced.
    pub item: ShipyardItem,
    /// Units ordered.
    pub quantity: u32,
    /// Time to produce one unit.
    pub unit_duration_ms: u64,
    /// Units already handed over to the planet.
    pub delivered: u32,
    /// Scheduled start.
    pub start: Timestamp,
    /// Scheduled finish of the last unit.
    pub finish: Timestamp,
}

impl ShipyardTask {
    /// Create a batch starting at `start`.
    #[must_use]
    pub fn new(item: ShipyardItem, quantity: u32, unit_duration_ms: u64, start: Timestamp) -> Self {
        let total = unit_duration_ms.saturating_mul(u64::from(quantity));
        Self {
            item,
            quantity,
            unit_duration_ms,
            delivered: 0,
            start,
            finish: start.after(total),
        }
    }

    /// Units whose slot has elapsed by `now`, delivered or not.
    #[must_use]
    pub fn completed_by(&self, now: Timestamp) -> u32 {
        if self.unit_duration_ms == 0 {
            return self.quantity;
        }
        let slots = now.millis_since(self.start) / self.unit_duration_ms;
        u32::try_from(slots).unwrap_or(u32::MAX).min(self.quantity)
    }

    /// Units not yet delivered.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.delivered)
    }
}

impl QueuedTask for ShipyardTask {
    fn start(&self) -> Timestamp {
        self.start
    }

    fn finish(&self) -> Timestamp {
        self.finish
    }

    fn reschedule(&mut self, start: Timestamp, duration_ms: u64) {
        self.start = start;
        self.finish = start.after(duration_ms);
    }
}

/// Ordered, capacity-bounded queue of chained tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "QueueRows<T>",
    into = "QueueRows<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Deserialize<'de>"
    )
)]
pub struct TaskQueue<T: QueuedTask> {
    tasks: VecDeque<T>,
    capacity: usize,
}

/// Persisted form of a [`TaskQueue`].
#[derive(Serialize, Deserialize)]
struct QueueRows<T> {
    capacity: usize,
    tasks: Vec<T>,
}

impl<T: QueuedTask> TryFrom<QueueRows<T>> for TaskQueue<T> {
    type Error = GameError;

    fn try_from(rows: QueueRows<T>) -> Result<Self> {
        Self::from_tasks(rows.capacity, rows.tasks)
    }
}

impl<T: QueuedTask> From<TaskQueue<T>> for QueueRows<T> {
    fn from(queue: TaskQueue<T>) -> Self {
        Self {
            capacity: queue.capacity,
            tasks: queue.tasks.into(),
        }
    }
}

/// Queue of building level changes.
pub type BuildQueue = TaskQueue<BuildTask>;

/// Queue of ship and defense batches.
pub type ShipyardQueue = TaskQueue<ShipyardTask>;

impl<T: QueuedTask> TaskQueue<T> {
    /// Create an empty queue holding at most `capacity` tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a queue from persisted tasks, validating the chain.
    ///
    /// A queue persisted under a larger capacity is kept whole; it simply
    /// reports full until it drains.
    pub fn from_tasks(capacity: usize, tasks: impl IntoIterator<Item = T>) -> Result<Self> {
        let queue = Self {
            tasks: tasks.into_iter().collect(),
            capacity,
        };
        queue.validate()?;
        Ok(queue)
    }

    /// Maximum number of tasks.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the maximum number of tasks. Tasks beyond a lowered capacity
    /// stay queued; the queue reports full until it drains below it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Check if the queue is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Free slots.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.tasks.len())
    }

    /// Task that finishes first.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.tasks.front()
    }

    /// Task that finishes last.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.tasks.back()
    }

    /// Tasks in finish order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.tasks.iter()
    }

    /// Number of tasks matching `predicate`.
    pub fn count_matching(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.tasks.iter().filter(|task| predicate(task)).count()
    }

    /// Where the next pushed task must start: the tail's finish, or
    /// `otherwise` for an empty queue.
    #[must_use]
    pub fn next_start(&self, otherwise: Timestamp) -> Timestamp {
        self.tasks.back().map_or(otherwise, T::finish)
    }

    /// Check the chaining invariant over the whole queue.
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<&T> = None;
        for task in &self.tasks {
            check_link(previous, task)?;
            previous = Some(task);
        }
        Ok(())
    }

    /// Append a task to the tail.
    pub(crate) fn push(&mut self, task: T) -> Result<()> {
        if self.is_full() {
            return Err(GameError::InvariantViolation(format!(
                "push into full queue of capacity {}",
                self.capacity
            )));
        }
        check_link(self.tasks.back(), &task)?;
        self.tasks.push_back(task);
        Ok(())
    }

    /// Remove the head.
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }

    /// Mutable head, for in-place progress such as shipyard deliveries.
    pub(crate) fn front_mut(&mut self) -> Option<&mut T> {
        self.tasks.front_mut()
    }

    /// Move the head to `start` with a new duration and re-chain every task
    /// behind it, each keeping its own duration.
    pub(crate) fn reschedule_front(&mut self, start: Timestamp, duration_ms: u64) {
        let mut cursor = start;
        for (position, task) in self.tasks.iter_mut().enumerate() {
            let duration = if position == 0 {
                duration_ms
            } else {
                task.duration_ms()
            };
            task.reschedule(cursor, duration);
            cursor = task.finish();
        }
    }
}

fn check_link<T: QueuedTask>(previous: Option<&T>, task: &T) -> Result<()> {
    if task.finish() <= task.start() {
        return Err(GameError::InvariantViolation(format!(
            "task {task:?} does not finish after it starts"
        )));
    }
    if let Some(previous) = previous {
        if task.start() != previous.finish() {
            return Err(GameError::InvariantViolation(format!(
                "task {task:?} starts at {} but the previous task finishes at {}",
                task.start(),
                previous.finish()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ShipId;

    fn build(start: i64, duration_ms: u64) -> BuildTask {
        BuildTask::new(
            BuildTaskKind::Build,
            BuildingId::MetalMine,
            Timestamp(start),
            duration_ms,
        )
    }

    #[test]
    fn test_push_requires_chaining() {
        let mut queue = BuildQueue::new(5);
        queue.push(build(0, 100)).unwrap();
        queue.push(build(100, 50)).unwrap();

        let gap = queue.push(build(200, 10));
        assert!(matches!(gap, Err(GameError::InvariantViolation(_))));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_start(Timestamp(0)), Timestamp(150));
    }

    #[test]
    fn test_push_rejects_zero_duration() {
        let mut queue = BuildQueue::new(5);
        assert!(queue.push(build(0, 0)).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut queue = BuildQueue::new(2);
        queue.push(build(0, 10)).unwrap();
        assert!(!queue.is_full());
        assert_eq!(queue.remaining_capacity(), 1);
        queue.push(build(10, 10)).unwrap();
        assert!(queue.is_full());
        assert!(queue.push(build(20, 10)).is_err());
    }

    #[test]
    fn test_pop_in_finish_order() {
        let mut queue = BuildQueue::new(3);
        queue.push(build(0, 10)).unwrap();
        queue.push(build(10, 10)).unwrap();
        assert_eq!(queue.pop().map(|task| task.finish), Some(Timestamp(10)));
        assert_eq!(queue.front().map(|task| task.finish), Some(Timestamp(20)));
    }

    #[test]
    fn test_reschedule_front_keeps_following_durations() {
        let mut queue = BuildQueue::new(3);
        queue.push(build(0, 100)).unwrap();
        queue.push(build(100, 30)).unwrap();
        queue.push(build(130, 20)).unwrap();
        queue.pop();

        queue.reschedule_front(Timestamp(80), 60);
        let spans: Vec<_> = queue.iter().map(|task| (task.start.0, task.finish.0)).collect();
        assert_eq!(spans, vec![(80, 140), (140, 160)]);
        assert!(queue.validate().is_ok());
    }

    #[test]
    fn test_from_tasks_validates() {
        let broken = vec![build(0, 10), build(11, 10)];
        assert!(BuildQueue::from_tasks(5, broken).is_err());

        let chained = vec![build(0, 10), build(10, 10)];
        let queue = BuildQueue::from_tasks(1, chained).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_count_matching() {
        let mut queue = BuildQueue::new(3);
        queue.push(build(0, 10)).unwrap();
        queue
            .push(BuildTask::new(
                BuildTaskKind::Destroy,
                BuildingId::Shipyard,
                Timestamp(10),
                10,
            ))
            .unwrap();
        assert_eq!(
            queue.count_matching(|task| task.building == BuildingId::Shipyard),
            1
        );
    }

    #[test]
    fn test_shipyard_progressive_completion() {
        let task = ShipyardTask::new(
            ShipyardItem::Ship(ShipId::LightFighter),
            10,
            1_000,
            Timestamp(0),
        );
        assert_eq!(task.finish, Timestamp(10_000));
        assert_eq!(task.completed_by(Timestamp(0)), 0);
        assert_eq!(task.completed_by(Timestamp(3_500)), 3);
        assert_eq!(task.completed_by(Timestamp(99_000)), 10);
    }

    #[test]
    fn test_deserialize_validates_chain() {
        let queue = BuildQueue::from_tasks(5, vec![build(0, 10), build(10, 5)]).unwrap();
        let text = ron::to_string(&queue).unwrap();
        let back: BuildQueue = ron::from_str(&text).unwrap();
        assert_eq!(back, queue);

        let broken = "(capacity: 5, tasks: [\
            (kind: build, building: metalMine, start: (0), finish: (10)),\
            (kind: build, building: metalMine, start: (11), finish: (20)),\
        ])";
        assert!(ron::from_str::<BuildQueue>(broken).is_err());
    }
}
