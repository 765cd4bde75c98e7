//! A running game session: map, navigation, world and loops.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::cost::BlockedTiles;
use crate::error::Result;
use crate::game_loop::{GameLoopManager, GameSystem, LoopKind, LoopStatus};
use crate::map::{GridMap, TerrainFlags, TileMap, TilePos};
use crate::navigation::NavigationService;
use crate::systems::{
    AnimationClockSystem, SharedWorld, SteeringSystem, WanderSystem, World, WorldStats,
};

/// Navigation service type used by sessions.
pub type SessionNavigation = NavigationService<GridMap, BlockedTiles>;

/// Occupancy derived from the map's doors.
///
/// A door owned by a player lets only that player's creatures through.
/// Neutral doors are left open.
#[must_use]
pub fn doors_of(map: &GridMap) -> BlockedTiles {
    let mut doors = BlockedTiles::default();
    for pos in map.positions() {
        let Some(tile) = map.tile(pos) else {
            continue;
        };
        if tile.terrain.contains(TerrainFlags::DOOR) && !tile.owner.is_neutral() {
            doors.block_except(pos, tile.owner);
        }
    }
    doors
}

/// Everything one game session needs, wired together.
#[derive(Debug)]
pub struct Session {
    manager: GameLoopManager,
    world: SharedWorld,
    navigation: Arc<SessionNavigation>,
}

impl Session {
    /// Build a session from a validated config. Loops are registered but not started.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let map = config.build_map()?;
        let doors = doors_of(&map);
        tracing::info!(
            width = map.width(),
            height = map.height(),
            doors = doors.len(),
            policy = ?config.cost_policy,
            "map loaded"
        );

        let navigation = Arc::new(NavigationService::new(map, doors, config.cost_policy));

        let mut world = World::new();
        for spawn in &config.creatures {
            let id = world.spawn(
                spawn.name.clone(),
                TilePos::new(spawn.x, spawn.y),
                spawn.capability,
            );
            tracing::debug!(id, name = %spawn.name, x = spawn.x, y = spawn.y, "creature spawned");
        }
        let world = world.into_shared();

        let mut manager = GameLoopManager::new();
        let logic: Vec<Box<dyn GameSystem>> = vec![Box::new(WanderSystem::new(
            Arc::clone(&navigation),
            Arc::clone(&world),
            config.wander_radius,
            config.seed,
        ))];
        let steering: Vec<Box<dyn GameSystem>> = vec![Box::new(SteeringSystem::new(
            Arc::clone(&navigation),
            Arc::clone(&world),
        ))];
        let animation: Vec<Box<dyn GameSystem>> =
            vec![Box::new(AnimationClockSystem::new(Arc::clone(&world)))];

        manager.register_loop(LoopKind::Logic, config.interval(LoopKind::Logic), logic)?;
        manager.register_loop(
            LoopKind::Steering,
            config.interval(LoopKind::Steering),
            steering,
        )?;
        manager.register_loop(
            LoopKind::Animation,
            config.interval(LoopKind::Animation),
            animation,
        )?;

        Ok(Self {
            manager,
            world,
            navigation,
        })
    }

    /// Start all loops on the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        Ok(self.manager.start()?)
    }

    /// Pause all loops.
    pub fn pause(&mut self) -> Result<()> {
        Ok(self.manager.pause()?)
    }

    /// Resume all loops.
    pub fn resume(&mut self) -> Result<()> {
        Ok(self.manager.resume()?)
    }

    /// Stop all loops and wait for them to exit.
    pub async fn stop(&mut self) -> Result<()> {
        Ok(self.manager.stop().await?)
    }

    /// Loop manager.
    #[must_use]
    pub fn manager(&self) -> &GameLoopManager {
        &self.manager
    }

    /// Shared world handle.
    #[must_use]
    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// Navigation service shared by the systems.
    #[must_use]
    pub fn navigation(&self) -> &Arc<SessionNavigation> {
        &self.navigation
    }

    /// Snapshot of the world counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        self.world.read().stats()
    }

    /// Loops that ended because a system failed.
    #[must_use]
    pub fn failed_loops(&self) -> Vec<LoopKind> {
        self.manager
            .loop_kinds()
            .into_iter()
            .filter(|&kind| matches!(self.manager.loop_status(kind), Some(LoopStatus::Failed(_))))
            .collect()
    }
}
