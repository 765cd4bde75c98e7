//! Property-based checks of navigation invariants.

use std::collections::HashSet;

use keeper_core::cost::{step_cost, Unoccupied};
use keeper_core::graph::{IndexedGraph, MapIndexedGraph};
use keeper_core::map::{TerrainFlags, TileMap, TilePos};
use keeper_core::math::Fixed;
use keeper_core::navigable::Capability;
use keeper_core::navigation::NavigationService;
use keeper_core::pathfinding::{find_path, MapDistance};
use proptest::prelude::*;
use keeper_test_utils::strategies::{
    arb_capability, arb_map, arb_map_with_endpoints, arb_policy,
};

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

proptest! {
    #[test]
    fn prop_tile_index_is_a_bijection(map in arb_map()) {
        let mut seen = HashSet::new();
        for pos in map.positions() {
            let index = map.index_of(pos);
            prop_assert!(index < map.tile_count());
            prop_assert!(seen.insert(index));
            prop_assert_eq!(map.pos_of(index), Some(pos));
        }
        prop_assert_eq!(seen.len(), map.tile_count());
    }

    #[test]
    fn prop_flyers_reach_every_neighbour(map in arb_map(), policy in arb_policy()) {
        let bat = Capability { can_fly: true, ..Capability::default() };
        let nav = NavigationService::new(&map, Unoccupied, policy);
        for pos in map.positions() {
            for (dx, dy) in NEIGHBORS_8 {
                let Some(next) = pos.offset(dx, dy) else { continue };
                if map.in_bounds(next) {
                    prop_assert!(nav.is_accessible(pos, next, &bat));
                }
            }
        }
    }

    #[test]
    fn prop_liquids_refuse_plain_walkers(map in arb_map(), policy in arb_policy()) {
        let nav = NavigationService::new(&map, Unoccupied, policy);
        let plain = Capability::default();
        for pos in map.positions() {
            for (dx, dy) in NEIGHBORS_8 {
                let Some(next) = pos.offset(dx, dy) else { continue };
                let Some(tile) = map.tile(next) else { continue };
                if tile.terrain.intersects(TerrainFlags::WATER | TerrainFlags::LAVA) {
                    prop_assert!(!nav.is_accessible(pos, next, &plain));
                }
            }
        }
    }

    #[test]
    fn prop_diagonals_need_both_cardinals(map in arb_map(), capability in arb_capability(), policy in arb_policy()) {
        let capability = Capability { can_move_diagonally: true, ..capability };
        let graph = MapIndexedGraph::new(&map, &Unoccupied, capability, policy);
        for pos in map.positions() {
            let targets: Vec<TilePos> = graph.connections(pos).iter().map(|c| c.to).collect();
            for (dx, dy) in [(1, -1), (1, 1), (-1, 1), (-1, -1)] {
                let Some(corner) = pos.offset(dx, dy) else { continue };
                if !targets.contains(&corner) {
                    continue;
                }
                let side_x = pos.offset(dx, 0);
                let side_y = pos.offset(0, dy);
                prop_assert!(side_x.is_some_and(|t| targets.contains(&t)));
                prop_assert!(side_y.is_some_and(|t| targets.contains(&t)));
            }
        }
    }

    #[test]
    fn prop_start_equals_goal_is_trivial((map, start, _goal) in arb_map_with_endpoints(), capability in arb_capability()) {
        let nav = NavigationService::new(&map, Unoccupied, Default::default());
        let path = nav.find_path(start, start, &capability);
        prop_assert!(path.is_some_and(|p| p.is_trivial() && p.goal() == start));
    }

    #[test]
    fn prop_paths_are_valid_and_costed(
        (map, start, goal) in arb_map_with_endpoints(),
        capability in arb_capability(),
        policy in arb_policy(),
    ) {
        let nav = NavigationService::new(&map, Unoccupied, policy);
        if let Some(path) = nav.find_path(start, goal, &capability) {
            prop_assert_eq!(path.start(), start);
            prop_assert_eq!(path.goal(), goal);

            let graph = nav.graph_for(capability);
            let mut total = Fixed::ZERO;
            for step in path.connections() {
                prop_assert!(graph.connections(step.from).contains(step));
                prop_assert_eq!(
                    step_cost(&map, &Unoccupied, step.from, step.to, &capability, policy),
                    Some(step.cost)
                );
                total += step.cost;
            }
            prop_assert_eq!(path.total_cost(), total);
        }
    }

    #[test]
    fn prop_astar_matches_uniform_cost_search(
        (map, start, goal) in arb_map_with_endpoints(),
        capability in arb_capability(),
        policy in arb_policy(),
    ) {
        let graph = MapIndexedGraph::new(&map, &Unoccupied, capability, policy);
        let guided = find_path(&graph, &MapDistance::for_capability(&capability, policy), start, goal);
        let blind = find_path(&graph, &|_: TilePos, _: TilePos| Fixed::ZERO, start, goal);
        prop_assert_eq!(
            guided.map(|p| p.total_cost()),
            blind.map(|p| p.total_cost())
        );
    }
}
