//! The tile map seen as an indexed graph.
//!
//! [`MapIndexedGraph`] is built per query: it holds the map, the occupancy
//! collaborator, one [`Capability`] and the cost policy, all by reference or
//! by value. Two searches for different movers therefore never share a
//! mutable "current capability".

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cost::{step_cost, CostPolicy, Occupancy};
use crate::map::{TileMap, TilePos};
use crate::math::{fixed_serde, Fixed};
use crate::navigable::Capability;

/// Directed, weighted edge between two adjacent tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Tile the step starts on.
    pub from: TilePos,
    /// Tile the step ends on.
    pub to: TilePos,
    /// Cost of the step.
    #[serde(with = "fixed_serde")]
    pub cost: Fixed,
}

/// Connections out of one node. Never more than eight on a tile grid.
pub type Connections = SmallVec<[Connection; 8]>;

/// Graph interface used by the path finder.
pub trait IndexedGraph {
    /// Number of nodes; valid indices are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Dense index of a node. Nodes outside the graph map to an index of at
    /// least `node_count()`.
    fn index_of(&self, node: TilePos) -> usize;

    /// Outgoing connections of `node`.
    fn connections(&self, node: TilePos) -> Connections;
}

/// Cardinal offsets in N, E, S, W order.
const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Diagonals as (offset, first cardinal, second cardinal) indices into [`CARDINALS`].
///
/// A diagonal is only offered when both cardinals beside it are valid, so
/// movers never cut through the corner of a wall.
const DIAGONALS: [((i32, i32), usize, usize); 4] = [
    ((1, -1), 0, 1),  // NE needs N and E
    ((1, 1), 2, 1),   // SE needs S and E
    ((-1, 1), 2, 3),  // SW needs S and W
    ((-1, -1), 0, 3), // NW needs N and W
];

/// Tile map adapter for one mover.
#[derive(Debug, Clone)]
pub struct MapIndexedGraph<'a, M: ?Sized, O: ?Sized> {
    map: &'a M,
    occupancy: &'a O,
    capability: Capability,
    policy: CostPolicy,
}

impl<'a, M, O> MapIndexedGraph<'a, M, O>
where
    M: TileMap + ?Sized,
    O: Occupancy + ?Sized,
{
    /// Create an adapter for `capability`.
    pub fn new(map: &'a M, occupancy: &'a O, capability: Capability, policy: CostPolicy) -> Self {
        Self {
            map,
            occupancy,
            capability,
            policy,
        }
    }

    /// Capability the adapter currently evaluates connections for.
    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Replace the capability, for sequential reuse of one adapter.
    pub fn set_capability(&mut self, capability: Capability) {
        self.capability = capability;
    }

    /// Cost policy in use.
    #[must_use]
    pub fn policy(&self) -> CostPolicy {
        self.policy
    }

    fn connect(&self, from: TilePos, dx: i32, dy: i32) -> Option<Connection> {
        let to = from.offset(dx, dy)?;
        let cost = step_cost(
            self.map,
            self.occupancy,
            from,
            to,
            &self.capability,
            self.policy,
        )?;
        Some(Connection { from, to, cost })
    }
}

impl<M, O> IndexedGraph for MapIndexedGraph<'_, M, O>
where
    M: TileMap + ?Sized,
    O: Occupancy + ?Sized,
{
    fn node_count(&self) -> usize {
        self.map.tile_count()
    }

    fn index_of(&self, node: TilePos) -> usize {
        if self.map.in_bounds(node) {
            self.map.index_of(node)
        } else {
            usize::MAX
        }
    }

    fn connections(&self, node: TilePos) -> Connections {
        let mut out = Connections::new();
        let mut valid = [false; 4];

        for (i, &(dx, dy)) in CARDINALS.iter().enumerate() {
            if let Some(connection) = self.connect(node, dx, dy) {
                valid[i] = true;
                out.push(connection);
            }
        }

        if self.capability.can_move_diagonally {
            for &((dx, dy), a, b) in &DIAGONALS {
                if !(valid[a] && valid[b]) {
                    continue;
                }
                if let Some(connection) = self.connect(node, dx, dy) {
                    out.push(connection);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{Unoccupied, DEFAULT_COST};
    use crate::map::{GridMap, PlayerId};

    fn targets(connections: &Connections) -> Vec<TilePos> {
        let mut out: Vec<_> = connections.iter().map(|c| c.to).collect();
        out.sort();
        out
    }

    #[test]
    fn test_node_count_and_index() {
        let map = GridMap::new(6, 4).unwrap();
        let graph = MapIndexedGraph::new(
            &map,
            &Unoccupied,
            Capability::walker(PlayerId::KEEPER),
            CostPolicy::WaterPenalty,
        );
        assert_eq!(graph.node_count(), 24);
        assert_eq!(graph.index_of(TilePos::new(5, 3)), 23);
        assert_eq!(graph.index_of(TilePos::new(2, 1)), 8);
    }

    #[test]
    fn test_four_directional_neighbours() {
        let map = GridMap::new(3, 3).unwrap();
        let graph = MapIndexedGraph::new(
            &map,
            &Unoccupied,
            Capability::walker(PlayerId::KEEPER),
            CostPolicy::WaterPenalty,
        );

        let centre = graph.connections(TilePos::new(1, 1));
        assert_eq!(centre.len(), 4);
        assert!(centre.iter().all(|c| c.cost == DEFAULT_COST && c.from == TilePos::new(1, 1)));

        let corner = graph.connections(TilePos::new(0, 0));
        assert_eq!(targets(&corner), vec![TilePos::new(0, 1), TilePos::new(1, 0)]);
    }

    #[test]
    fn test_eight_directional_neighbours() {
        let map = GridMap::new(3, 3).unwrap();
        let graph = MapIndexedGraph::new(
            &map,
            &Unoccupied,
            Capability::walker(PlayerId::KEEPER).with_diagonal(),
            CostPolicy::WaterPenalty,
        );
        assert_eq!(graph.connections(TilePos::new(1, 1)).len(), 8);
        assert_eq!(graph.connections(TilePos::new(0, 0)).len(), 3);
    }

    #[test]
    fn test_no_corner_cutting() {
        // Wall to the north of the centre blocks NE and NW.
        let map = GridMap::from_ascii([".#.", "...", "..."]).unwrap();
        let graph = MapIndexedGraph::new(
            &map,
            &Unoccupied,
            Capability::walker(PlayerId::KEEPER).with_diagonal(),
            CostPolicy::WaterPenalty,
        );

        let found = targets(&graph.connections(TilePos::new(1, 1)));
        assert!(!found.contains(&TilePos::new(1, 0)));
        assert!(!found.contains(&TilePos::new(0, 0)));
        assert!(!found.contains(&TilePos::new(2, 0)));
        assert!(found.contains(&TilePos::new(0, 2)));
        assert!(found.contains(&TilePos::new(2, 2)));
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_set_capability_changes_connections() {
        let map = GridMap::from_ascii(["~.~", "~.~", "~~~"]).unwrap();
        let mut graph = MapIndexedGraph::new(
            &map,
            &Unoccupied,
            Capability::walker(PlayerId::KEEPER),
            CostPolicy::WaterPenalty,
        );
        assert_eq!(graph.connections(TilePos::new(1, 1)).len(), 1);

        graph.set_capability(Capability::walker(PlayerId::KEEPER).with_water());
        assert!(graph.capability().can_walk_on_water);
        assert_eq!(graph.connections(TilePos::new(1, 1)).len(), 4);
    }
}
