//! # Keeper Core
//!
//! Tile navigation and fixed-tick simulation for a dungeon-keeper style game.
//!
//! This crate contains no rendering and no asset handling. Costs use
//! fixed-point math so that path searches are reproducible across machines.
//!
//! ## Crate Structure
//!
//! - [`map`] - Tile grid, terrain flags and ownership
//! - [`navigable`] - What a moving entity is able to traverse
//! - [`cost`] - Step cost between adjacent tiles and occupancy
//! - [`graph`] - Indexed graph view of a map for one capability
//! - [`pathfinding`] - Generic A* search
//! - [`navigation`] - Path and reachability queries used by systems
//! - [`game_loop`] - Fixed-rate loops driving [`game_loop::GameSystem`]s
//! - [`systems`] - Wandering, steering and animation systems
//! - [`config`] - RON session configuration
//! - [`session`] - Map, world and loops wired together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod cost;
pub mod error;
pub mod game_loop;
pub mod graph;
pub mod map;
pub mod math;
pub mod navigable;
pub mod navigation;
pub mod pathfinding;
pub mod session;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CreatureSpawn, SessionConfig};
    pub use crate::cost::{step_cost, BlockedTiles, CostPolicy, Occupancy, Unoccupied};
    pub use crate::error::{ConfigError, KeeperError, LoopError, MapError, Result, SystemError};
    pub use crate::game_loop::{
        tick_interval, GameLoopManager, GameSystem, LoopKind, LoopStatus, ManagerState, TickInfo,
    };
    pub use crate::graph::{Connection, IndexedGraph, MapIndexedGraph};
    pub use crate::map::{GridMap, PlayerId, RoomId, TerrainFlags, Tile, TileMap, TilePos};
    pub use crate::math::Fixed;
    pub use crate::navigable::Capability;
    pub use crate::navigation::NavigationService;
    pub use crate::pathfinding::{find_path, Heuristic, MapDistance, Metric, Path};
    pub use crate::session::Session;
    pub use crate::systems::{Creature, CreatureId, SharedWorld, World, WorldStats};
}
