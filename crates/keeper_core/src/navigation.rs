//! Navigation facade used by simulation systems.
//!
//! [`NavigationService`] owns the map handle, the occupancy collaborator and
//! the cost policy. Every query builds its own [`MapIndexedGraph`], so one
//! service can be shared between loops without locking.
//!
//! # Example
//!
//! ```
//! use keeper_core::cost::{CostPolicy, Unoccupied};
//! use keeper_core::map::{GridMap, PlayerId, TilePos};
//! use keeper_core::navigable::Capability;
//! use keeper_core::navigation::NavigationService;
//!
//! let map = GridMap::from_ascii(["....", ".##.", "...."]).unwrap();
//! let nav = NavigationService::new(map, Unoccupied, CostPolicy::WaterPenalty);
//!
//! let imp = Capability::walker(PlayerId::KEEPER);
//! let path = nav.find_path(TilePos::new(0, 1), TilePos::new(3, 1), &imp).unwrap();
//! assert_eq!(path.step_count(), 5);
//! ```

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cost::{step_cost, CostPolicy, Occupancy};
use crate::graph::MapIndexedGraph;
use crate::map::{Tile, TileMap, TilePos};
use crate::navigable::Capability;
use crate::pathfinding::{find_path_with_stats, MapDistance, Path};

/// The eight neighbour offsets, clockwise from north.
const NEIGHBORS_8: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Path and reachability queries over one map.
#[derive(Debug, Clone)]
pub struct NavigationService<M, O> {
    map: M,
    occupancy: O,
    policy: CostPolicy,
}

impl<M, O> NavigationService<M, O>
where
    M: TileMap,
    O: Occupancy,
{
    /// Create a service over `map`.
    pub fn new(map: M, occupancy: O, policy: CostPolicy) -> Self {
        Self {
            map,
            occupancy,
            policy,
        }
    }

    /// The map being navigated.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// The occupancy collaborator.
    pub fn occupancy(&self) -> &O {
        &self.occupancy
    }

    /// Liquid cost policy in use.
    pub fn policy(&self) -> CostPolicy {
        self.policy
    }

    /// Graph adapter configured for `capability`.
    pub fn graph_for(&self, capability: Capability) -> MapIndexedGraph<'_, M, O> {
        MapIndexedGraph::new(&self.map, &self.occupancy, capability, self.policy)
    }

    /// Path from `start` to `end` for an entity with `capability`.
    ///
    /// `None` if either tile is off the map or the goal is unreachable.
    pub fn find_path(&self, start: TilePos, end: TilePos, capability: &Capability) -> Option<Path> {
        if self.map.tile(start).is_none() || self.map.tile(end).is_none() {
            return None;
        }

        let graph = self.graph_for(*capability);
        let heuristic = MapDistance::for_capability(capability, self.policy);
        let (path, stats) = find_path_with_stats(&graph, &heuristic, start, end);

        tracing::trace!(
            %start,
            %end,
            expanded = stats.expanded,
            pushed = stats.pushed,
            "path search finished"
        );
        match &path {
            Some(found) => tracing::debug!(%start, %end, steps = found.step_count(), "path found"),
            None => tracing::debug!(%start, %end, "no path"),
        }

        path
    }

    /// Cheapest path from `start` to any of `goals`.
    ///
    /// Ties go to the goal listed first.
    pub fn find_path_to_any(
        &self,
        start: TilePos,
        goals: &[TilePos],
        capability: &Capability,
    ) -> Option<Path> {
        let mut best: Option<Path> = None;
        for &goal in goals {
            let Some(path) = self.find_path(start, goal, capability) else {
                continue;
            };
            let better = best
                .as_ref()
                .map_or(true, |current| path.total_cost() < current.total_cost());
            if better {
                best = Some(path);
            }
        }
        best
    }

    /// True if an entity with `capability` may step from `from` to `to`.
    pub fn is_accessible(&self, from: TilePos, to: TilePos, capability: &Capability) -> bool {
        step_cost(&self.map, &self.occupancy, from, to, capability, self.policy).is_some()
    }

    /// Every tile reachable from `start` within `radius` steps, in discovery order.
    ///
    /// The flood walks the 8-neighbourhood and only moves between tiles that
    /// are accessible one from the other. `start` itself is never included.
    pub fn accessible_tiles_within(
        &self,
        start: TilePos,
        radius: u32,
        capability: &Capability,
    ) -> Vec<TilePos> {
        self.flood(start, radius, capability, |_| true)
    }

    /// Uniformly random tile reachable from `start` within `radius` steps.
    pub fn find_random_accessible_tile<R>(
        &self,
        start: TilePos,
        radius: u32,
        capability: &Capability,
        rng: &mut R,
    ) -> Option<TilePos>
    where
        R: Rng + ?Sized,
    {
        self.accessible_tiles_within(start, radius, capability)
            .choose(rng)
            .copied()
    }

    /// Uniformly random tile of the room `start` stands in, within `radius` steps.
    ///
    /// `start` is expected to be a room tile. When it is not, the flood is
    /// confined to roomless tiles instead.
    pub fn find_random_tile_in_room<R>(
        &self,
        start: TilePos,
        radius: u32,
        capability: &Capability,
        rng: &mut R,
    ) -> Option<TilePos>
    where
        R: Rng + ?Sized,
    {
        let room = self.map.tile(start)?.room;
        self.flood(start, radius, capability, |tile| tile.room == room)
            .choose(rng)
            .copied()
    }

    fn flood<F>(&self, start: TilePos, radius: u32, capability: &Capability, admit: F) -> Vec<TilePos>
    where
        F: Fn(&Tile) -> bool,
    {
        let mut found = Vec::new();
        if radius == 0 || self.map.tile(start).is_none() {
            return found;
        }

        let mut visited = FixedBitSet::with_capacity(self.map.tile_count());
        visited.insert(self.map.index_of(start));

        let mut frontier = VecDeque::new();
        frontier.push_back((start, 0u32));

        while let Some((pos, depth)) = frontier.pop_front() {
            if depth >= radius {
                continue;
            }
            for &(dx, dy) in &NEIGHBORS_8 {
                let Some(next) = pos.offset(dx, dy) else {
                    continue;
                };
                let Some(tile) = self.map.tile(next) else {
                    continue;
                };
                let index = self.map.index_of(next);
                if visited.contains(index) || !admit(tile) {
                    continue;
                }
                // A tile refused from this side may still be reached from another.
                if !self.is_accessible(pos, next, capability) {
                    continue;
                }
                visited.insert(index);
                found.push(next);
                frontier.push_back((next, depth + 1));
            }
        }

        found
    }
}
