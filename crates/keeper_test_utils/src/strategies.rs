//! Proptest strategies for navigation testing.
//!
//! These strategies generate random but reproducible maps, positions and
//! capabilities for property-based testing.

use keeper_core::cost::CostPolicy;
use keeper_core::map::{GridMap, PlayerId, TerrainFlags, TileMap, TilePos};
use keeper_core::navigable::Capability;
use proptest::prelude::*;

/// Largest side of a generated map.
pub const MAX_SIDE: u32 = 12;

/// Terrain for one generated tile, mostly open ground.
pub fn arb_terrain() -> impl Strategy<Value = TerrainFlags> {
    prop_oneof![
        6 => Just(TerrainFlags::empty()),
        2 => Just(TerrainFlags::SOLID),
        1 => Just(TerrainFlags::WATER),
        1 => Just(TerrainFlags::LAVA),
    ]
}

/// Random map between 1x1 and `MAX_SIDE` x `MAX_SIDE`.
pub fn arb_map() -> impl Strategy<Value = GridMap> {
    (1..=MAX_SIDE, 1..=MAX_SIDE).prop_flat_map(|(width, height)| {
        let count = (width * height) as usize;
        prop::collection::vec(arb_terrain(), count).prop_map(move |terrain| {
            let mut map = match GridMap::new(width, height) {
                Ok(map) => map,
                Err(err) => panic!("generated size rejected: {err}"),
            };
            for (i, flags) in terrain.into_iter().enumerate() {
                let i = i as u32;
                map.set_terrain(TilePos::new(i % width, i / width), flags);
            }
            map
        })
    })
}

/// Random map together with two positions inside it.
pub fn arb_map_with_endpoints() -> impl Strategy<Value = (GridMap, TilePos, TilePos)> {
    arb_map().prop_flat_map(|map| {
        let (w, h) = (map.width(), map.height());
        (
            Just(map),
            (0..w, 0..h).prop_map(|(x, y)| TilePos::new(x, y)),
            (0..w, 0..h).prop_map(|(x, y)| TilePos::new(x, y)),
        )
    })
}

/// Any combination of traversal abilities, owned by the keeper.
pub fn arb_capability() -> impl Strategy<Value = Capability> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(can_fly, water, lava, diagonal)| Capability {
            owner: PlayerId::KEEPER,
            can_fly,
            can_walk_on_water: water,
            can_walk_on_lava: lava,
            can_move_diagonally: diagonal,
        },
    )
}

/// Either liquid cost policy.
pub fn arb_policy() -> impl Strategy<Value = CostPolicy> {
    prop_oneof![Just(CostPolicy::WaterPenalty), Just(CostPolicy::WaterDiscount)]
}
