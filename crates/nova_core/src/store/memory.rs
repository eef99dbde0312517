//! In-memory store with optimistic concurrency control.
//!
//! Rows are kept bincode-encoded together with a version number. A
//! transaction reads the latest committed version of each row and remembers
//! it, buffers its writes, and at commit re-checks under the store lock that
//! nothing it read has changed since. Any change aborts the whole
//! transaction.
//!
//! Queues are stored whole, capacity included, so a planet reloads with the
//! capacities it was saved with.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, warn};

use super::{Store, Transaction};
use crate::error::{GameError, Result};
use crate::planet::{Planet, PlanetId, PlanetState};
use crate::player::{Player, PlayerId};
use crate::queue::{BuildQueue, QueuedTask, ShipyardQueue, TaskQueue};

/// Identity of one stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Player(PlayerId),
    Planet(PlanetId),
    BuildQueue(PlanetId),
    ShipyardQueue(PlanetId),
    /// Bumped on every player insert; read by nickname and user lookups.
    PlayerIndex,
}

impl RowKey {
    const fn entity(self) -> &'static str {
        match self {
            Self::Player(_) => "player",
            Self::Planet(_) => "planet",
            Self::BuildQueue(_) => "build queue",
            Self::ShipyardQueue(_) => "shipyard queue",
            Self::PlayerIndex => "player index",
        }
    }

    const fn planet(self) -> Option<PlanetId> {
        match self {
            Self::Planet(id) | Self::BuildQueue(id) | Self::ShipyardQueue(id) => Some(id),
            Self::Player(_) | Self::PlayerIndex => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    version: u64,
    bytes: Vec<u8>,
}

/// Thread-safe in-memory [`Store`].
#[derive(Debug)]
pub struct MemoryStore {
    rows: Mutex<HashMap<RowKey, Row>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<RowKey, Row>>> {
        self.rows
            .lock()
            .map_err(|_| GameError::Storage("memory store lock poisoned".to_string()))
    }

    /// Latest committed version and bytes of a row; version 0 when absent.
    fn read_committed(&self, key: RowKey) -> Result<(u64, Option<Vec<u8>>)> {
        let rows = self.lock()?;
        Ok(rows
            .get(&key)
            .map_or((0, None), |row| (row.version, Some(row.bytes.clone()))))
    }

    /// Every committed player row.
    fn committed_players(&self) -> Result<Vec<(RowKey, Vec<u8>)>> {
        let rows = self.lock()?;
        Ok(rows
            .iter()
            .filter(|(key, _)| matches!(key, RowKey::Player(_)))
            .map(|(key, row)| (*key, row.bytes.clone()))
            .collect())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn run_serializable<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        let mut tx = MemoryTransaction {
            store: self,
            reads: HashMap::new(),
            writes: HashMap::new(),
            inserts_player: false,
            focus: None,
        };
        let value = op(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    /// Version of every row as first seen by this transaction.
    reads: HashMap<RowKey, u64>,
    writes: HashMap<RowKey, Vec<u8>>,
    inserts_player: bool,
    /// First planet touched, reported on conflicts over non-planet rows.
    focus: Option<PlanetId>,
}

impl MemoryTransaction<'_> {
    fn touch(&mut self, key: RowKey) {
        if self.focus.is_none() {
            self.focus = key.planet();
        }
    }

    /// Bytes of a row as this transaction sees it: its own write if any,
    /// otherwise the committed row, recording the version read.
    fn read(&mut self, key: RowKey) -> Result<Option<Vec<u8>>> {
        self.touch(key);
        if let Some(bytes) = self.writes.get(&key) {
            return Ok(Some(bytes.clone()));
        }
        let (version, bytes) = self.store.read_committed(key)?;
        self.reads.entry(key).or_insert(version);
        Ok(bytes)
    }

    fn read_row<T: DeserializeOwned>(&mut self, key: RowKey) -> Result<Option<T>> {
        self.read(key)?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    fn write_row<T: Serialize + ?Sized>(&mut self, key: RowKey, value: &T) -> Result<()> {
        self.touch(key);
        let bytes = bincode::serialize(value).map_err(|e| GameError::Codec {
            action: "encode",
            entity: key.entity(),
            message: e.to_string(),
        })?;
        self.writes.insert(key, bytes);
        Ok(())
    }

    fn load_queue<T>(&mut self, key: RowKey, planet: PlanetId) -> Result<TaskQueue<T>>
    where
        T: QueuedTask + DeserializeOwned,
    {
        self.read_row(key)?.ok_or_else(|| {
            GameError::InvariantViolation(format!("planet {planet} has no {} row", key.entity()))
        })
    }

    fn scan_players(&mut self, matches: impl Fn(&Player) -> bool) -> Result<Option<Player>> {
        // The index version guards against a concurrent insert of a match.
        self.read(RowKey::PlayerIndex)?;

        let own = self
            .writes
            .iter()
            .filter(|(key, _)| matches!(key, RowKey::Player(_)))
            .map(|(key, bytes)| decode::<Player>(*key, bytes))
            .collect::<Result<Vec<_>>>()?;
        if let Some(player) = own.into_iter().find(|player| matches(player)) {
            return Ok(Some(player));
        }

        for (key, bytes) in self.store.committed_players()? {
            let player: Player = decode(key, &bytes)?;
            if matches(&player) {
                return self.read_row(key);
            }
        }
        Ok(None)
    }

    fn commit(self) -> Result<()> {
        let mut rows = self.store.lock()?;

        for (key, seen) in &self.reads {
            let current = rows.get(key).map_or(0, |row| row.version);
            if current != *seen {
                let planet = key.planet().or(self.focus).unwrap_or_default();
                warn!(
                    planet = %planet,
                    row = key.entity(),
                    seen = *seen,
                    current,
                    "Serializable transaction aborted"
                );
                return Err(GameError::ConcurrencyConflict { planet });
            }
        }

        let mut writes: Vec<(RowKey, Vec<u8>)> = self.writes.into_iter().collect();
        if self.inserts_player {
            writes.push((RowKey::PlayerIndex, Vec::new()));
        }
        for (key, bytes) in writes {
            let version = rows.get(&key).map_or(0, |row| row.version) + 1;
            trace!(row = key.entity(), version, "Committing row");
            rows.insert(key, Row { version, bytes });
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: RowKey, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| GameError::Codec {
        action: "decode",
        entity: key.entity(),
        message: e.to_string(),
    })
}

impl Transaction for MemoryTransaction<'_> {
    fn load_planet_for_update(&mut self, id: PlanetId) -> Result<PlanetState> {
        let planet: Planet = self
            .read_row(RowKey::Planet(id))?
            .ok_or(GameError::PlanetNotFound(id))?;
        let build_queue: BuildQueue = self.load_queue(RowKey::BuildQueue(id), id)?;
        let shipyard_queue: ShipyardQueue = self.load_queue(RowKey::ShipyardQueue(id), id)?;
        Ok(PlanetState {
            planet,
            build_queue,
            shipyard_queue,
        })
    }

    fn load_player(&mut self, id: PlayerId) -> Result<Player> {
        self.read_row(RowKey::Player(id))?
            .ok_or(GameError::PlayerNotFound(id))
    }

    fn save_planet(&mut self, planet: &Planet) -> Result<()> {
        self.write_row(RowKey::Planet(planet.id), planet)
    }

    fn save_build_queue(&mut self, planet: PlanetId, queue: &BuildQueue) -> Result<()> {
        self.write_row(RowKey::BuildQueue(planet), queue)
    }

    fn save_shipyard_queue(&mut self, planet: PlanetId, queue: &ShipyardQueue) -> Result<()> {
        self.write_row(RowKey::ShipyardQueue(planet), queue)
    }

    fn save_player(&mut self, player: &Player) -> Result<()> {
        let key = RowKey::Player(player.id);
        if !self.writes.contains_key(&key) {
            let (version, _) = self.store.read_committed(key)?;
            if version == 0 {
                self.reads.entry(key).or_insert(0);
                self.inserts_player = true;
            }
        }
        self.write_row(key, player)
    }

    fn find_player_by_nickname(&mut self, nickname_key: &str) -> Result<Option<Player>> {
        self.scan_players(|player| player.nickname_key == nickname_key)
    }

    fn find_player_by_user(&mut self, user_id: &str) -> Result<Option<Player>> {
        self.scan_players(|player| player.user_id == user_id)
    }

    fn allocate_id(&mut self) -> Result<u64> {
        Ok(self.store.next_id.fetch_add(1, Ordering::Relaxed))
    }
}
