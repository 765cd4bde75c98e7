//! Path search benchmarks for keeper_core.
//!
//! Run with: `cargo bench -p keeper_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use keeper_core::cost::{CostPolicy, Unoccupied};
use keeper_core::map::{GridMap, PlayerId, TerrainFlags, TilePos};
use keeper_core::navigable::Capability;
use keeper_core::navigation::NavigationService;

/// Square map with staggered wall segments every fourth row.
fn maze(side: u32) -> GridMap {
    let Ok(mut map) = GridMap::new(side, side) else {
        panic!("bench map size rejected");
    };
    for y in (3..side).step_by(4) {
        let gap = if (y / 4) % 2 == 0 { side - 1 } else { 0 };
        for x in 0..side {
            if x != gap {
                map.set_terrain(TilePos::new(x, y), TerrainFlags::SOLID);
            }
        }
    }
    map
}

/// Corner-to-corner searches on growing mazes.
pub fn path_search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for side in [32u32, 64, 128] {
        let nav = NavigationService::new(maze(side), Unoccupied, CostPolicy::WaterPenalty);
        let goal = TilePos::new(side - 1, side - 1);
        for (label, capability) in [
            ("walker", Capability::walker(PlayerId::KEEPER)),
            ("diagonal", Capability::walker(PlayerId::KEEPER).with_diagonal()),
        ] {
            group.bench_with_input(BenchmarkId::new(label, side), &side, |b, _| {
                b.iter(|| black_box(nav.find_path(TilePos::new(0, 0), goal, &capability)));
            });
        }
    }
    group.finish();
}

/// Reachability flood used by wandering creatures.
pub fn flood_benchmark(c: &mut Criterion) {
    let nav = NavigationService::new(maze(64), Unoccupied, CostPolicy::WaterPenalty);
    let imp = Capability::walker(PlayerId::KEEPER).with_diagonal();
    c.bench_function("accessible_tiles_within_r10", |b| {
        b.iter(|| black_box(nav.accessible_tiles_within(TilePos::new(32, 32), 10, &imp)));
    });
}

criterion_group!(benches, path_search_benchmark, flood_benchmark);
criterion_main!(benches);
