//! Simulation systems that consume navigation.
//!
//! All systems share one [`World`] behind a [`parking_lot::RwLock`]. Loops
//! run concurrently, so every system takes the lock for the shortest span it
//! can and never holds it across a path search.
//!
//! - [`WanderSystem`] (logic loop): idle creatures pick a random reachable
//!   tile and plan a path to it.
//! - [`SteeringSystem`] (steering loop): creatures advance one tile per tick.
//! - [`AnimationClockSystem`] (animation loop): advances the animation clock.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::cost::Occupancy;
use crate::error::SystemError;
use crate::game_loop::{GameSystem, TickInfo};
use crate::map::{TileMap, TilePos};
use crate::navigable::Capability;
use crate::navigation::NavigationService;

/// Unique creature identifier.
pub type CreatureId = u32;

/// A creature moving around the dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    /// Identifier.
    pub id: CreatureId,
    /// Display name.
    pub name: String,
    /// Current tile.
    pub position: TilePos,
    /// Traversal abilities.
    pub capability: Capability,
    /// Remaining tiles of the planned path, next step first.
    pub route: VecDeque<TilePos>,
    /// Tiles moved so far.
    pub steps_taken: u64,
}

impl Creature {
    /// True if the creature has nowhere to go.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.route.is_empty()
    }
}

/// Session-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    /// Path queries issued.
    pub path_requests: u64,
    /// Queries that produced a path.
    pub paths_found: u64,
    /// Queries with no destination or no path.
    pub paths_failed: u64,
    /// Steps abandoned because the next tile became inaccessible.
    pub routes_abandoned: u64,
    /// Tiles moved by all creatures.
    pub steps: u64,
    /// Animation frames advanced.
    pub animation_frames: u64,
}

/// Entity state shared by the loops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    creatures: BTreeMap<CreatureId, Creature>,
    next_id: CreatureId,
    animation_time: Duration,
    stats: WorldStats,
}

/// World handle shared between systems.
pub type SharedWorld = Arc<RwLock<World>>;

impl World {
    /// Empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in a shared handle.
    #[must_use]
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    /// Add a creature and return its id.
    pub fn spawn(&mut self, name: impl Into<String>, position: TilePos, capability: Capability) -> CreatureId {
        self.next_id += 1;
        let id = self.next_id;
        self.creatures.insert(
            id,
            Creature {
                id,
                name: name.into(),
                position,
                capability,
                route: VecDeque::new(),
                steps_taken: 0,
            },
        );
        id
    }

    /// Look up a creature.
    #[must_use]
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Mutable creature lookup.
    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    /// All creatures in id order.
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Number of creatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    /// True if no creatures exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    /// Animation clock.
    #[must_use]
    pub fn animation_time(&self) -> Duration {
        self.animation_time
    }

    /// Session counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        self.stats
    }
}

/// Sends idle creatures to random reachable tiles.
pub struct WanderSystem<M, O> {
    navigation: Arc<NavigationService<M, O>>,
    world: SharedWorld,
    radius: u32,
    rng: ChaCha8Rng,
}

impl<M, O> WanderSystem<M, O> {
    /// Create a wander system with a seeded RNG.
    pub fn new(
        navigation: Arc<NavigationService<M, O>>,
        world: SharedWorld,
        radius: u32,
        seed: u64,
    ) -> Self {
        Self {
            navigation,
            world,
            radius,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<M, O> GameSystem for WanderSystem<M, O>
where
    M: TileMap + Send + Sync,
    O: Occupancy + Send + Sync,
{
    fn name(&self) -> &str {
        "wander"
    }

    fn process_tick(&mut self, _tick: &TickInfo) -> Result<(), SystemError> {
        let idle: Vec<(CreatureId, TilePos, Capability)> = self
            .world
            .read()
            .creatures()
            .filter(|c| c.is_idle())
            .map(|c| (c.id, c.position, c.capability))
            .collect();

        let mut plans = Vec::with_capacity(idle.len());
        for (id, position, capability) in idle {
            let route = self
                .navigation
                .find_random_accessible_tile(position, self.radius, &capability, &mut self.rng)
                .and_then(|target| self.navigation.find_path(position, target, &capability));
            plans.push((id, route));
        }

        let mut world = self.world.write();
        for (id, route) in plans {
            world.stats.path_requests += 1;
            let Some(path) = route else {
                // Nothing reachable this tick; try again next tick.
                world.stats.paths_failed += 1;
                continue;
            };
            world.stats.paths_found += 1;
            if let Some(creature) = world.creature_mut(id) {
                creature.route = path.tiles().skip(1).collect();
            }
        }
        Ok(())
    }
}

/// Moves creatures one tile along their route per tick.
pub struct SteeringSystem<M, O> {
    navigation: Arc<NavigationService<M, O>>,
    world: SharedWorld,
}

impl<M, O> SteeringSystem<M, O> {
    /// Create a steering system.
    pub fn new(navigation: Arc<NavigationService<M, O>>, world: SharedWorld) -> Self {
        Self { navigation, world }
    }
}

impl<M, O> GameSystem for SteeringSystem<M, O>
where
    M: TileMap + Send + Sync,
    O: Occupancy + Send + Sync,
{
    fn name(&self) -> &str {
        "steering"
    }

    fn process_tick(&mut self, _tick: &TickInfo) -> Result<(), SystemError> {
        let mut world = self.world.write();
        let mut moved = 0;
        let mut abandoned = 0;

        for creature in world.creatures.values_mut() {
            let Some(&next) = creature.route.front() else {
                continue;
            };
            if !self
                .navigation
                .is_accessible(creature.position, next, &creature.capability)
            {
                creature.route.clear();
                abandoned += 1;
                continue;
            }
            creature.route.pop_front();
            creature.position = next;
            creature.steps_taken += 1;
            moved += 1;
        }

        world.stats.steps += moved;
        world.stats.routes_abandoned += abandoned;
        Ok(())
    }
}

/// Advances the world's animation clock by the loop's fixed step.
pub struct AnimationClockSystem {
    world: SharedWorld,
}

impl AnimationClockSystem {
    /// Create an animation clock system.
    #[must_use]
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl GameSystem for AnimationClockSystem {
    fn name(&self) -> &str {
        "animation_clock"
    }

    fn process_tick(&mut self, tick: &TickInfo) -> Result<(), SystemError> {
        let mut world = self.world.write();
        world.animation_time += tick.delta;
        world.stats.animation_frames += 1;
        Ok(())
    }
}
