//! Best-first (A*) search over an [`IndexedGraph`].
//!
//! Costs and estimates are fixed-point so equal-cost alternatives are
//! always broken the same way: by lowest node index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::cost::CostPolicy;
use crate::graph::{Connection, IndexedGraph};
use crate::map::TilePos;
use crate::math::{hypot, Fixed};
use crate::navigable::Capability;

/// Estimate of the remaining cost between two tiles.
///
/// The search only returns cheapest paths when the estimate never exceeds
/// the true remaining cost.
pub trait Heuristic {
    /// Estimated cost from `from` to `to`.
    fn estimate(&self, from: TilePos, to: TilePos) -> Fixed;
}

impl<F> Heuristic for F
where
    F: Fn(TilePos, TilePos) -> Fixed,
{
    fn estimate(&self, from: TilePos, to: TilePos) -> Fixed {
        self(from, to)
    }
}

/// Distance metric on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Metric {
    /// `|dx| + |dy|`. Exact for 4-directional movement.
    #[default]
    Manhattan,
    /// `max(|dx|, |dy|)`. Exact for 8-directional movement with uniform step cost.
    Chebyshev,
    /// Straight-line distance. Overestimates when diagonal steps cost the same
    /// as cardinal ones.
    Euclidean,
}

impl Metric {
    /// Distance between two tiles, in steps.
    #[must_use]
    pub fn distance(self, a: TilePos, b: TilePos) -> Fixed {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        match self {
            Self::Manhattan => {
                Fixed::saturating_from_num(dx).saturating_add(Fixed::saturating_from_num(dy))
            }
            Self::Chebyshev => Fixed::saturating_from_num(dx.max(dy)),
            Self::Euclidean => hypot(dx, dy),
        }
    }
}

/// Grid distance scaled by the cheapest possible step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDistance {
    /// Metric used.
    pub metric: Metric,
    /// Multiplier applied to the metric.
    pub scale: Fixed,
}

impl MapDistance {
    /// Unscaled distance.
    #[must_use]
    pub const fn new(metric: Metric) -> Self {
        Self {
            metric,
            scale: Fixed::ONE,
        }
    }

    /// Admissible distance for a mover under a cost policy.
    ///
    /// Chebyshev for diagonal movers, Manhattan otherwise, times the
    /// policy's smallest step cost.
    #[must_use]
    pub fn for_capability(capability: &Capability, policy: CostPolicy) -> Self {
        let metric = if capability.can_move_diagonally {
            Metric::Chebyshev
        } else {
            Metric::Manhattan
        };
        Self {
            metric,
            scale: policy.min_step_cost(),
        }
    }
}

impl Heuristic for MapDistance {
    fn estimate(&self, from: TilePos, to: TilePos) -> Fixed {
        self.metric.distance(from, to).saturating_mul(self.scale)
    }
}

/// Ordered steps from a start tile to a goal tile.
///
/// A path from a tile to itself has no connections but still names its tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    start: TilePos,
    connections: Vec<Connection>,
}

impl Path {
    /// Zero-step path that stays on `tile`.
    #[must_use]
    pub fn trivial(tile: TilePos) -> Self {
        Self {
            start: tile,
            connections: Vec::new(),
        }
    }

    /// First tile.
    #[must_use]
    pub fn start(&self) -> TilePos {
        self.start
    }

    /// Last tile.
    #[must_use]
    pub fn goal(&self) -> TilePos {
        self.connections.last().map_or(self.start, |c| c.to)
    }

    /// Steps in order.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Tiles visited in order, starting tile included.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        std::iter::once(self.start).chain(self.connections.iter().map(|c| c.to))
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.connections.len()
    }

    /// True for a start-equals-goal path.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sum of step costs.
    #[must_use]
    pub fn total_cost(&self) -> Fixed {
        self.connections
            .iter()
            .fold(Fixed::ZERO, |acc, c| acc.saturating_add(c.cost))
    }
}

/// Counters from one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes taken off the open set and expanded.
    pub expanded: usize,
    /// Entries pushed onto the open set.
    pub pushed: usize,
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OpenNode {
    pos: TilePos,
    index: usize,
    /// f_score = g_score + heuristic
    f_score: Fixed,
    g_score: Fixed,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so we reverse the comparison for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            // Deterministic tie-breaking: prefer lower node index
            Ordering::Equal => other.index.cmp(&self.index),
            ord => ord,
        }
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path from `start` to `goal`.
///
/// Returns `None` if the goal cannot be reached or either tile lies outside
/// the graph. `start == goal` yields a trivial path.
pub fn find_path<G, H>(graph: &G, heuristic: &H, start: TilePos, goal: TilePos) -> Option<Path>
where
    G: IndexedGraph + ?Sized,
    H: Heuristic + ?Sized,
{
    find_path_with_stats(graph, heuristic, start, goal).0
}

/// [`find_path`], also returning search counters.
pub fn find_path_with_stats<G, H>(
    graph: &G,
    heuristic: &H,
    start: TilePos,
    goal: TilePos,
) -> (Option<Path>, SearchStats)
where
    G: IndexedGraph + ?Sized,
    H: Heuristic + ?Sized,
{
    let mut stats = SearchStats::default();
    let node_count = graph.node_count();
    let start_index = graph.index_of(start);
    let goal_index = graph.index_of(goal);

    if start_index >= node_count || goal_index >= node_count {
        return (None, stats);
    }

    if start == goal {
        return (Some(Path::trivial(start)), stats);
    }

    let mut open_set: BinaryHeap<OpenNode> = BinaryHeap::new();
    let mut closed = FixedBitSet::with_capacity(node_count);
    let mut g_score = vec![Fixed::MAX; node_count];
    let mut came_from: Vec<Option<Connection>> = vec![None; node_count];

    g_score[start_index] = Fixed::ZERO;
    open_set.push(OpenNode {
        pos: start,
        index: start_index,
        f_score: heuristic.estimate(start, goal),
        g_score: Fixed::ZERO,
    });
    stats.pushed += 1;

    while let Some(current) = open_set.pop() {
        if closed.contains(current.index) || current.g_score > g_score[current.index] {
            continue;
        }

        if current.index == goal_index {
            let path = reconstruct_path(&came_from, start_index, goal_index, start, graph);
            return (path, stats);
        }

        closed.insert(current.index);
        stats.expanded += 1;

        for connection in graph.connections(current.pos) {
            let neighbor = graph.index_of(connection.to);
            if neighbor >= node_count || closed.contains(neighbor) {
                continue;
            }

            let tentative_g = current.g_score.saturating_add(connection.cost);
            if tentative_g < g_score[neighbor] {
                // This path is better
                g_score[neighbor] = tentative_g;
                came_from[neighbor] = Some(connection);
                open_set.push(OpenNode {
                    pos: connection.to,
                    index: neighbor,
                    f_score: tentative_g.saturating_add(heuristic.estimate(connection.to, goal)),
                    g_score: tentative_g,
                });
                stats.pushed += 1;
            }
        }
    }

    (None, stats)
}

/// Walk predecessor links back from the goal and reverse them.
fn reconstruct_path<G>(
    came_from: &[Option<Connection>],
    start_index: usize,
    goal_index: usize,
    start: TilePos,
    graph: &G,
) -> Option<Path>
where
    G: IndexedGraph + ?Sized,
{
    let mut connections = Vec::new();
    let mut index = goal_index;

    while index != start_index {
        let step = came_from[index]?;
        connections.push(step);
        index = graph.index_of(step.from);
    }

    connections.reverse();
    Some(Path { start, connections })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{Unoccupied, DEFAULT_COST, WATER_COST};
    use crate::graph::{Connections, MapIndexedGraph};
    use crate::map::{GridMap, PlayerId, TerrainFlags};

    fn walker() -> Capability {
        Capability::walker(PlayerId::KEEPER)
    }

    fn search(map: &GridMap, capability: Capability, start: (u32, u32), goal: (u32, u32)) -> Option<Path> {
        let policy = CostPolicy::WaterPenalty;
        let graph = MapIndexedGraph::new(map, &Unoccupied, capability, policy);
        let heuristic = MapDistance::for_capability(&capability, policy);
        find_path(&graph, &heuristic, start.into(), goal.into())
    }

    fn assert_contiguous(path: &Path) {
        let tiles: Vec<_> = path.tiles().collect();
        for pair in tiles.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{} -> {} is not a step", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_metric_distances() {
        let a = TilePos::new(0, 0);
        let b = TilePos::new(3, 4);
        assert_eq!(Metric::Manhattan.distance(a, b), Fixed::from_num(7));
        assert_eq!(Metric::Chebyshev.distance(a, b), Fixed::from_num(4));
        let epsilon = Fixed::ONE / Fixed::from_num(1000);
        assert!((Metric::Euclidean.distance(a, b) - Fixed::from_num(5)).abs() < epsilon);
        assert_eq!(Metric::Chebyshev.distance(b, b), Fixed::ZERO);
    }

    #[test]
    fn test_metric_distances_on_large_offsets() {
        let origin = TilePos::new(0, 0);
        let far = TilePos::new(50_000, 0);
        assert_eq!(Metric::Euclidean.distance(origin, far), Fixed::from_num(50_000));
        assert_eq!(Metric::Manhattan.distance(origin, far), Fixed::from_num(50_000));

        let corner = TilePos::new(u32::MAX, u32::MAX);
        assert_eq!(Metric::Manhattan.distance(origin, corner), Fixed::MAX);
        assert_eq!(Metric::Chebyshev.distance(origin, corner), Fixed::MAX);
        assert_eq!(Metric::Euclidean.distance(origin, corner), Fixed::MAX);
        assert_eq!(Metric::Chebyshev.distance(corner, corner), Fixed::ZERO);
    }

    #[test]
    fn test_heuristic_for_capability() {
        let h = MapDistance::for_capability(&walker(), CostPolicy::WaterPenalty);
        assert_eq!(h.metric, Metric::Manhattan);
        assert_eq!(h.scale, DEFAULT_COST);

        let h = MapDistance::for_capability(&walker().with_diagonal(), CostPolicy::WaterDiscount);
        assert_eq!(h.metric, Metric::Chebyshev);
        assert_eq!(h.scale, CostPolicy::WaterDiscount.min_step_cost());
    }

    #[test]
    fn test_manhattan_optimal_on_open_map() {
        let map = GridMap::new(5, 5).unwrap();
        let path = search(&map, walker(), (0, 0), (4, 4)).unwrap();
        assert_eq!(path.step_count(), 8);
        assert_eq!(path.total_cost(), Fixed::from_num(8));
        assert_eq!(path.start(), TilePos::new(0, 0));
        assert_eq!(path.goal(), TilePos::new(4, 4));
        assert_contiguous(&path);
    }

    #[test]
    fn test_diagonal_shortcut() {
        let map = GridMap::new(5, 5).unwrap();
        let path = search(&map, walker().with_diagonal(), (0, 0), (4, 4)).unwrap();
        assert_eq!(path.step_count(), 4);
        assert_contiguous(&path);
    }

    #[test]
    fn test_route_around_solid() {
        let mut map = GridMap::new(5, 5).unwrap();
        map.set_terrain(TilePos::new(2, 2), TerrainFlags::SOLID);
        let path = search(&map, walker(), (0, 0), (4, 4)).unwrap();
        assert!(path.step_count() >= 8);
        assert!(path.tiles().all(|t| t != TilePos::new(2, 2)));
        assert_contiguous(&path);
    }

    #[test]
    fn test_enclosed_goal_has_no_path() {
        let map = GridMap::from_ascii([".....", ".###.", ".#.#.", ".###.", "....."]).unwrap();
        assert!(search(&map, walker(), (0, 0), (2, 2)).is_none());
        assert!(search(&map, walker().with_diagonal().with_water().with_lava(), (0, 0), (2, 2)).is_none());
    }

    #[test]
    fn test_same_tile_is_trivial() {
        let map = GridMap::new(3, 3).unwrap();
        let path = search(&map, walker(), (1, 1), (1, 1)).unwrap();
        assert!(path.is_trivial());
        assert_eq!(path.tiles().collect::<Vec<_>>(), vec![TilePos::new(1, 1)]);
        assert_eq!(path.total_cost(), Fixed::ZERO);
    }

    #[test]
    fn test_adjacent_goal_is_single_step() {
        let map = GridMap::new(3, 3).unwrap();
        let path = search(&map, walker(), (1, 1), (2, 1)).unwrap();
        assert_eq!(path.step_count(), 1);
    }

    #[test]
    fn test_out_of_graph_goal() {
        let map = GridMap::new(3, 3).unwrap();
        assert!(search(&map, walker(), (0, 0), (0, 7)).is_none());
    }

    fn search_with(map: &GridMap, capability: Capability, policy: CostPolicy) -> Path {
        let graph = MapIndexedGraph::new(map, &Unoccupied, capability, policy);
        let heuristic = MapDistance::for_capability(&capability, policy);
        find_path(&graph, &heuristic, TilePos::new(0, 0), TilePos::new(2, 2)).unwrap()
    }

    #[test]
    fn test_liquid_policies_pull_in_opposite_directions() {
        // Every 4-directional route corner to corner is four steps; only the
        // policy decides whether the pool in the middle is worth crossing.
        let map = GridMap::from_ascii(["...", ".~.", "..."]).unwrap();
        let swimmer = walker().with_water();
        let pool = TilePos::new(1, 1);

        let dry = search_with(&map, swimmer, CostPolicy::WaterPenalty);
        assert!(dry.tiles().all(|t| t != pool));
        assert_eq!(dry.total_cost(), Fixed::from_num(4));

        let wet = search_with(&map, swimmer, CostPolicy::WaterDiscount);
        assert!(wet.tiles().any(|t| t == pool));
        assert!(wet.total_cost() < Fixed::from_num(4));
        assert_eq!(wet.step_count(), 4);
    }

    #[test]
    fn test_short_ford_beats_long_detour() {
        let map = GridMap::from_ascii([".....", "..~..", "....."]).unwrap();
        let path = search(&map, walker().with_water(), (0, 1), (4, 1)).unwrap();
        assert_eq!(path.step_count(), 4);
        assert_eq!(path.total_cost(), Fixed::from_num(3) + WATER_COST);
    }

    #[test]
    fn test_cost_equals_sum_of_steps() {
        let map = GridMap::from_ascii(["..~..", ".#~#.", "..~.."]).unwrap();
        let path = search(&map, walker().with_water().with_diagonal(), (0, 0), (4, 2)).unwrap();
        let sum = path
            .connections()
            .iter()
            .fold(Fixed::ZERO, |acc, c| acc + c.cost);
        assert_eq!(path.total_cost(), sum);
        assert_contiguous(&path);
    }

    #[test]
    fn test_determinism() {
        let mut map = GridMap::new(20, 20).unwrap();
        for y in 5..15 {
            map.set_terrain(TilePos::new(10, y), TerrainFlags::SOLID);
        }

        let path1 = search(&map, walker().with_diagonal(), (5, 10), (15, 10)).unwrap();
        let path2 = search(&map, walker().with_diagonal(), (5, 10), (15, 10)).unwrap();
        let path3 = search(&map, walker().with_diagonal(), (5, 10), (15, 10)).unwrap();

        assert_eq!(path1, path2);
        assert_eq!(path2, path3);
    }

    #[test]
    fn test_zero_heuristic_matches_astar_cost() {
        let map = GridMap::from_ascii([
            "..........",
            ".####.###.",
            ".#......#.",
            ".#.####.#.",
            "...#..#...",
        ])
        .unwrap();
        let capability = walker();
        let graph = MapIndexedGraph::new(&map, &Unoccupied, capability, CostPolicy::WaterPenalty);
        let dijkstra = |_: TilePos, _: TilePos| Fixed::ZERO;
        let astar = MapDistance::for_capability(&capability, CostPolicy::WaterPenalty);

        let (a, a_stats) = find_path_with_stats(&graph, &astar, TilePos::new(0, 4), TilePos::new(9, 4));
        let (d, d_stats) = find_path_with_stats(&graph, &dijkstra, TilePos::new(0, 4), TilePos::new(9, 4));
        assert_eq!(a.unwrap().total_cost(), d.unwrap().total_cost());
        assert!(a_stats.expanded <= d_stats.expanded);
    }

    /// Two-node synthetic graph to exercise the trait seam.
    struct Line;

    impl IndexedGraph for Line {
        fn node_count(&self) -> usize {
            2
        }

        fn index_of(&self, node: TilePos) -> usize {
            node.x as usize
        }

        fn connections(&self, node: TilePos) -> Connections {
            let mut out = Connections::new();
            if node.x == 0 {
                out.push(Connection {
                    from: node,
                    to: TilePos::new(1, 0),
                    cost: Fixed::from_num(3),
                });
            }
            out
        }
    }

    #[test]
    fn test_custom_graph() {
        let zero = |_: TilePos, _: TilePos| Fixed::ZERO;
        let path = find_path(&Line, &zero, TilePos::new(0, 0), TilePos::new(1, 0)).unwrap();
        assert_eq!(path.total_cost(), Fixed::from_num(3));
        assert!(find_path(&Line, &zero, TilePos::new(1, 0), TilePos::new(0, 0)).is_none());
    }
}
