//! Session configuration loaded from RON.
//!
//! # Example RON
//!
//! ```ron
//! SessionConfig(
//!     logic_ticks_per_second: 4,
//!     cost_policy: WaterPenalty,
//!     seed: 7,
//!     map: [
//!         "#######",
//!         "#..~..#",
//!         "#.111.#",
//!         "#######",
//!     ],
//!     creatures: [
//!         (name: "imp", x: 1, y: 1, capability: (owner: (1), can_move_diagonally: true)),
//!     ],
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cost::CostPolicy;
use crate::error::ConfigError;
use crate::game_loop::{tick_interval, LoopKind};
use crate::map::{GridMap, TileMap, TilePos};
use crate::navigable::Capability;

/// Everything needed to set up one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rate of the logic loop.
    #[serde(default = "default_logic_tps")]
    pub logic_ticks_per_second: u32,

    /// Rate of the animation loop.
    #[serde(default = "default_render_tps")]
    pub animation_ticks_per_second: u32,

    /// Rate of the steering loop.
    #[serde(default = "default_render_tps")]
    pub steering_ticks_per_second: u32,

    /// How water and lava are priced.
    #[serde(default)]
    pub cost_policy: CostPolicy,

    /// How far wandering creatures look for a destination.
    #[serde(default = "default_wander_radius")]
    pub wander_radius: u32,

    /// Seed for every random choice in the session.
    #[serde(default)]
    pub seed: u64,

    /// ASCII map rows. See [`Tile::from_glyph`](crate::map::Tile::from_glyph).
    pub map: Vec<String>,

    /// Creatures present at session start.
    #[serde(default)]
    pub creatures: Vec<CreatureSpawn>,
}

/// A creature placed at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSpawn {
    /// Display name.
    pub name: String,
    /// Spawn column.
    pub x: u32,
    /// Spawn row.
    pub y: u32,
    /// Traversal abilities.
    #[serde(default)]
    pub capability: Capability,
}

/// Fastest loop rate whose interval is still at least one nanosecond.
pub const MAX_TICKS_PER_SECOND: u32 = 1_000_000_000;

/// Default logic rate.
const fn default_logic_tps() -> u32 {
    4
}

/// Default animation and steering rate.
const fn default_render_tps() -> u32 {
    30
}

/// Default wander radius.
const fn default_wander_radius() -> u32 {
    5
}

impl SessionConfig {
    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check rates, the map and spawn positions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, tps) in self.tick_rates() {
            if tps == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind} loop needs a positive tick rate"
                )));
            }
            // Rates above one tick per nanosecond truncate to a zero interval.
            if tick_interval(tps).is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{kind} loop rate {tps} exceeds {MAX_TICKS_PER_SECOND} ticks per second"
                )));
            }
        }

        let map = self.build_map()?;
        for creature in &self.creatures {
            let pos = TilePos::new(creature.x, creature.y);
            if !map.in_bounds(pos) {
                return Err(ConfigError::Invalid(format!(
                    "creature '{}' spawns outside the map at {pos}",
                    creature.name
                )));
            }
        }
        Ok(())
    }

    /// Build the tile map.
    pub fn build_map(&self) -> Result<GridMap, ConfigError> {
        Ok(GridMap::from_ascii(&self.map)?)
    }

    /// Tick rate of every loop.
    #[must_use]
    pub fn tick_rates(&self) -> [(LoopKind, u32); 3] {
        [
            (LoopKind::Logic, self.logic_ticks_per_second),
            (LoopKind::Animation, self.animation_ticks_per_second),
            (LoopKind::Steering, self.steering_ticks_per_second),
        ]
    }

    /// Fixed interval of a loop.
    #[must_use]
    pub fn interval(&self, kind: LoopKind) -> Duration {
        let tps = match kind {
            LoopKind::Logic => self.logic_ticks_per_second,
            LoopKind::Animation => self.animation_ticks_per_second,
            LoopKind::Steering => self.steering_ticks_per_second,
        };
        tick_interval(tps)
    }
}
