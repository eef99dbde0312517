//! Game configuration.
//!
//! Loaded from RON text by the caller; the core never touches the filesystem.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::resources::Resources;

/// Tunables of one game world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum pending build tasks per planet.
    pub build_queue_capacity: usize,
    /// Maximum pending shipyard batches per planet.
    pub shipyard_queue_capacity: usize,
    /// Metal on a new homeworld.
    pub starting_metal: i32,
    /// Crystal on a new homeworld.
    pub starting_crystal: i32,
    /// Deuterium on a new homeworld.
    pub starting_deuterium: i32,
    /// Maximum temperature of a new homeworld.
    pub homeworld_max_temperature: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            build_queue_capacity: 5,
            shipyard_queue_capacity: 20,
            starting_metal: 500,
            starting_crystal: 500,
            starting_deuterium: 0,
            homeworld_max_temperature: 40,
        }
    }
}

impl GameConfig {
    /// Parse and validate a RON document. Missing fields take defaults.
    ///
    /// # Errors
    /// [`GameError::ConfigParse`] on malformed text or invalid values.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot run with.
    ///
    /// # Errors
    /// [`GameError::ConfigParse`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.build_queue_capacity == 0 {
            return Err(GameError::ConfigParse(
                "build_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.shipyard_queue_capacity == 0 {
            return Err(GameError::ConfigParse(
                "shipyard_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.starting_metal < 0 || self.starting_crystal < 0 || self.starting_deuterium < 0 {
            return Err(GameError::ConfigParse(
                "starting resources must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Stockpiles of a new homeworld.
    #[must_use]
    pub fn starting_resources(&self) -> Resources {
        Resources::new(
            self.starting_metal,
            self.starting_crystal,
            self.starting_deuterium,
        )
    }
}
