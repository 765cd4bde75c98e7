//! Test fixtures and helpers.
//!
//! Pre-built maps and capabilities for consistent testing.

use keeper_core::cost::{CostPolicy, Unoccupied};
use keeper_core::map::{GridMap, PlayerId, TilePos};
use keeper_core::math::Fixed;
use keeper_core::navigable::Capability;
use keeper_core::navigation::NavigationService;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Shorthand for a tile position.
#[must_use]
pub fn pos(x: u32, y: u32) -> TilePos {
    TilePos::new(x, y)
}

/// Build a map from ASCII rows, panicking on malformed input.
#[must_use]
pub fn ascii_map(rows: &[&str]) -> GridMap {
    match GridMap::from_ascii(rows) {
        Ok(map) => map,
        Err(err) => panic!("bad fixture map: {err}"),
    }
}

/// Open map of the given size.
#[must_use]
pub fn open_map(width: u32, height: u32) -> GridMap {
    match GridMap::new(width, height) {
        Ok(map) => map,
        Err(err) => panic!("bad fixture size: {err}"),
    }
}

/// Service over `rows` with no occupancy and the default cost policy.
#[must_use]
pub fn navigation(rows: &[&str]) -> NavigationService<GridMap, Unoccupied> {
    NavigationService::new(ascii_map(rows), Unoccupied, CostPolicy::default())
}

/// Keeper-owned walker, cardinal moves only.
#[must_use]
pub fn walker() -> Capability {
    Capability::walker(PlayerId::KEEPER)
}

/// Keeper-owned walker that may cut corners.
#[must_use]
pub fn diagonal_walker() -> Capability {
    walker().with_diagonal()
}

/// Keeper-owned walker that may wade through water.
#[must_use]
pub fn swimmer() -> Capability {
    walker().with_water()
}

/// Keeper-owned flyer.
#[must_use]
pub fn flyer() -> Capability {
    Capability::flyer(PlayerId::KEEPER)
}

/// Reference 5x5 map with interior walls.
///
/// ```text
/// .....
/// .###.
/// .#...
/// .#.#.
/// ...#.
/// ```
pub const POCKET_5X5: [&str; 5] = [".....", ".###.", ".#...", ".#.#.", "...#."];

/// Corridor with a water ford in the middle and a long dry detour.
pub const FORD: [&str; 5] = [
    ".........",
    ".#######.",
    ".#######.",
    ".#######.",
    "....~....",
];

/// Two rooms joined by a keeper door.
pub const ROOMS_WITH_DOOR: [&str; 5] = [
    "#########",
    "#111#222#",
    "#111D222#",
    "#111#222#",
    "#########",
];
