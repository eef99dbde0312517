//! Enum-indexed level tables for buildings and research.
//!
//! Levels are stored in a dense slice indexed by the identifier's position in
//! its catalog, and persisted as a map keyed by the identifier's stable
//! camelCase name. Missing keys load as level 0.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// An identifier with a fixed position in a closed catalog.
pub trait LevelKey: Copy + Ord + fmt::Debug + 'static {
    /// Every identifier, in catalog order.
    const ALL: &'static [Self];

    /// Position of this identifier in [`LevelKey::ALL`].
    fn index(self) -> usize;
}

/// Level of every identifier of one catalog.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<K, u32>",
    from = "BTreeMap<K, u32>",
    bound(
        serialize = "K: Serialize",
        deserialize = "K: Deserialize<'de>"
    )
)]
pub struct Levels<K: LevelKey> {
    values: Vec<u32>,
    _key: PhantomData<K>,
}

impl<K: LevelKey> Levels<K> {
    /// Every identifier at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: vec![0; K::ALL.len()],
            _key: PhantomData,
        }
    }

    /// Current level of `key`.
    #[must_use]
    pub fn level(&self, key: K) -> u32 {
        self.values[key.index()]
    }

    /// Overwrite the level of `key`.
    pub fn set_level(&mut self, key: K, level: u32) {
        self.values[key.index()] = level;
    }

    /// Raise `key` by one level.
    pub fn increment(&mut self, key: K) {
        let slot = &mut self.values[key.index()];
        *slot = slot.saturating_add(1);
    }

    /// Lower `key` by one level, stopping at zero.
    pub fn decrement(&mut self, key: K) {
        let slot = &mut self.values[key.index()];
        *slot = slot.saturating_sub(1);
    }

    /// Builder-style [`Levels::set_level`].
    #[must_use]
    pub fn with(mut self, key: K, level: u32) -> Self {
        self.set_level(key, level);
        self
    }

    /// Every identifier with its level, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        K::ALL.iter().map(|&key| (key, self.level(key)))
    }
}

impl<K: LevelKey> Default for Levels<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: LevelKey> fmt::Debug for Levels<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().filter(|(_, level)| *level > 0))
            .finish()
    }
}

impl<K: LevelKey> From<Levels<K>> for BTreeMap<K, u32> {
    fn from(levels: Levels<K>) -> Self {
        levels.iter().collect()
    }
}

impl<K: LevelKey> From<BTreeMap<K, u32>> for Levels<K> {
    fn from(map: BTreeMap<K, u32>) -> Self {
        let mut levels = Self::new();
        for (key, level) in map {
            levels.set_level(key, level);
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BuildingId;

    #[test]
    fn test_level_accessors() {
        let mut levels = Levels::<BuildingId>::new();
        assert_eq!(levels.level(BuildingId::MetalMine), 0);

        levels.set_level(BuildingId::MetalMine, 19);
        levels.increment(BuildingId::MetalMine);
        assert_eq!(levels.level(BuildingId::MetalMine), 20);

        levels.decrement(BuildingId::Shipyard);
        assert_eq!(levels.level(BuildingId::Shipyard), 0);
    }

    #[test]
    fn test_persisted_as_map_with_stable_keys() {
        let levels = Levels::<BuildingId>::new()
            .with(BuildingId::MetalMine, 3)
            .with(BuildingId::NaniteFactory, 1);

        let text = ron::to_string(&levels).unwrap();
        assert!(text.contains("metalMine:3") || text.contains("metalMine: 3"));
        assert!(text.contains("naniteFactory"));

        let back: Levels<BuildingId> = ron::from_str(&text).unwrap();
        assert_eq!(back, levels);
    }

    #[test]
    fn test_missing_keys_load_as_zero() {
        let levels: Levels<BuildingId> = ron::from_str("{metalMine: 4}").unwrap();
        assert_eq!(levels.level(BuildingId::MetalMine), 4);
        assert_eq!(levels.level(BuildingId::CrystalMine), 0);
    }
}
