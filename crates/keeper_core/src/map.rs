//! Tile grid consulted by navigation.
//!
//! The map is a rectangular, row-major grid of [`Tile`]s. Lookups outside
//! the grid return `None`; there is no sentinel tile.
//!
//! # Example
//!
//! ```
//! use keeper_core::map::{GridMap, TerrainFlags, TileMap, TilePos};
//!
//! let map = GridMap::from_ascii(["..#", ".~.", "..."]).unwrap();
//! assert_eq!(map.width(), 3);
//! assert!(map.tile(TilePos::new(2, 0)).unwrap().terrain.contains(TerrainFlags::SOLID));
//! assert!(map.tile(TilePos::new(3, 0)).is_none());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: u32,
    /// Row. `y - 1` is north.
    pub y: u32,
}

impl TilePos {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Offset this coordinate, returning `None` if a component would go negative.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// True if `other` is one of the eight tiles around `self`.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

impl From<(u32, u32)> for TilePos {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain classification of a tile, stored as a bit set.
///
/// ```
/// use keeper_core::map::TerrainFlags;
///
/// let flags = TerrainFlags::WATER | TerrainFlags::OWNABLE;
/// assert!(flags.contains(TerrainFlags::WATER));
/// assert!(flags.is_liquid());
/// assert!(!flags.contains(TerrainFlags::SOLID));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TerrainFlags(u16);

impl TerrainFlags {
    /// Rock, earth or wall. Walkers cannot enter.
    pub const SOLID: Self = Self(1 << 0);
    /// Water. Needs water walking.
    pub const WATER: Self = Self(1 << 1);
    /// Lava. Needs lava walking.
    pub const LAVA: Self = Self(1 << 2);
    /// Can be claimed by a player.
    pub const OWNABLE: Self = Self(1 << 3);
    /// Door tile; passage is decided by the occupancy collaborator.
    pub const DOOR: Self = Self(1 << 4);
    /// Part of a room.
    pub const ROOM: Self = Self(1 << 5);

    /// No flags set (open ground).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove the flags in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Water or lava.
    #[inline]
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        self.intersects(Self::WATER.union(Self::LAVA))
    }

    /// Get raw bits for serialization.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Create from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }
}

impl std::ops::BitOr for TerrainFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TerrainFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Player identity. `0` is neutral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Unowned.
    pub const NEUTRAL: Self = Self(0);
    /// The local keeper.
    pub const KEEPER: Self = Self(1);

    /// True for the neutral player.
    #[must_use]
    pub const fn is_neutral(self) -> bool {
        self.0 == 0
    }
}

/// Identity of a room instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u16);

/// A single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain classification.
    pub terrain: TerrainFlags,
    /// Owning player.
    pub owner: PlayerId,
    /// Room this tile belongs to, if any.
    pub room: Option<RoomId>,
}

impl Tile {
    /// Open, neutral ground.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            terrain: TerrainFlags::empty(),
            owner: PlayerId::NEUTRAL,
            room: None,
        }
    }

    /// Tile with the given terrain, neutral and roomless.
    #[must_use]
    pub const fn with_terrain(terrain: TerrainFlags) -> Self {
        Self {
            terrain,
            owner: PlayerId::NEUTRAL,
            room: None,
        }
    }

    /// Map an ASCII glyph to a tile.
    ///
    /// `.` open, `#` solid, `~` water, `%` lava, `D` keeper door,
    /// `1`-`9` keeper room floor of that room id.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        let tile = match glyph {
            '.' => Self::open(),
            '#' => Self::with_terrain(TerrainFlags::SOLID),
            '~' => Self::with_terrain(TerrainFlags::WATER),
            '%' => Self::with_terrain(TerrainFlags::LAVA),
            'D' => Self {
                terrain: TerrainFlags::DOOR | TerrainFlags::OWNABLE,
                owner: PlayerId::KEEPER,
                room: None,
            },
            '1'..='9' => Self {
                terrain: TerrainFlags::ROOM | TerrainFlags::OWNABLE,
                owner: PlayerId::KEEPER,
                room: glyph.to_digit(10).map(|d| RoomId(d as u16)),
            },
            _ => return None,
        };
        Some(tile)
    }
}

/// Read access to a tile grid.
///
/// This is the seam navigation uses to consult the map; the map controller
/// that mutates ownership during play lives outside this crate.
pub trait TileMap {
    /// Width in tiles.
    fn width(&self) -> u32;

    /// Height in tiles.
    fn height(&self) -> u32;

    /// Tile at `pos`, or `None` outside the grid.
    fn tile(&self, pos: TilePos) -> Option<&Tile>;

    /// Check if coordinates are within grid bounds.
    fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x < self.width() && pos.y < self.height()
    }

    /// Total number of tiles.
    fn tile_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Row-major index of `pos`. Only meaningful for in-bounds positions.
    #[inline]
    fn index_of(&self, pos: TilePos) -> usize {
        pos.y as usize * self.width() as usize + pos.x as usize
    }

    /// Inverse of [`index_of`](Self::index_of).
    fn pos_of(&self, index: usize) -> Option<TilePos> {
        if index >= self.tile_count() {
            return None;
        }
        let width = self.width() as usize;
        Some(TilePos::new((index % width) as u32, (index / width) as u32))
    }
}

impl<T: TileMap + ?Sized> TileMap for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn tile(&self, pos: TilePos) -> Option<&Tile> {
        (**self).tile(pos)
    }
}

impl<T: TileMap + ?Sized> TileMap for Arc<T> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn tile(&self, pos: TilePos) -> Option<&Tile> {
        (**self).tile(pos)
    }
}

/// Rectangular tile grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Tile data stored in row-major order.
    tiles: Vec<Tile>,
}

impl GridMap {
    /// Create a map of open, neutral ground.
    pub fn new(width: u32, height: u32) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyMap { width, height });
        }
        let count = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::open(); count],
        })
    }

    /// Build a map from ASCII rows. See [`Tile::from_glyph`] for the legend.
    pub fn from_ascii<I, S>(rows: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tiles = Vec::new();
        let mut width = 0usize;
        let mut height = 0usize;

        for (y, row) in rows.into_iter().enumerate() {
            let row = row.as_ref().trim();
            let mut columns = 0usize;
            for (x, glyph) in row.chars().enumerate() {
                let tile =
                    Tile::from_glyph(glyph).ok_or(MapError::UnknownGlyph { glyph, x, y })?;
                tiles.push(tile);
                columns += 1;
            }
            if y == 0 {
                width = columns;
            } else if columns != width {
                return Err(MapError::RaggedRow {
                    row: y,
                    expected: width,
                    found: columns,
                });
            }
            height += 1;
        }

        if width == 0 || height == 0 {
            return Err(MapError::EmptyMap {
                width: width as u32,
                height: height as u32,
            });
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            tiles,
        })
    }

    /// Tile at raw coordinates.
    #[must_use]
    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tile(TilePos::new(x, y))
    }

    /// Mutable tile at `pos`.
    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        if self.in_bounds(pos) {
            let index = self.index_of(pos);
            self.tiles.get_mut(index)
        } else {
            None
        }
    }

    /// Replace the terrain of a tile.
    /// Returns `false` if out of bounds.
    pub fn set_terrain(&mut self, pos: TilePos, terrain: TerrainFlags) -> bool {
        self.tile_mut(pos).map(|t| t.terrain = terrain).is_some()
    }

    /// Change the owner of a tile.
    /// Returns `false` if out of bounds.
    pub fn set_owner(&mut self, pos: TilePos, owner: PlayerId) -> bool {
        self.tile_mut(pos).map(|t| t.owner = owner).is_some()
    }

    /// Assign a tile to a room, marking it with [`TerrainFlags::ROOM`].
    /// Returns `false` if out of bounds.
    pub fn set_room(&mut self, pos: TilePos, room: Option<RoomId>) -> bool {
        self.tile_mut(pos)
            .map(|t| {
                t.room = room;
                t.terrain = if room.is_some() {
                    t.terrain | TerrainFlags::ROOM
                } else {
                    t.terrain.difference(TerrainFlags::ROOM)
                };
            })
            .is_some()
    }

    /// Iterate over all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| TilePos::new(x, y)))
    }

    /// Encode the map as a binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MapError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a map from a binary snapshot.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MapError> {
        let map: Self = bincode::deserialize(data)?;
        let expected = map.width as usize * map.height as usize;
        if map.width == 0 || map.height == 0 {
            return Err(MapError::EmptyMap {
                width: map.width,
                height: map.height,
            });
        }
        if map.tiles.len() != expected {
            return Err(MapError::TileCountMismatch {
                expected,
                found: map.tiles.len(),
            });
        }
        Ok(map)
    }
}

impl TileMap for GridMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, pos: TilePos) -> Option<&Tile> {
        if self.in_bounds(pos) {
            self.tiles.get(self.index_of(pos))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            GridMap::new(0, 5),
            Err(MapError::EmptyMap { width: 0, height: 5 })
        ));
        assert!(GridMap::new(5, 0).is_err());
    }

    #[test]
    fn test_out_of_bounds_is_absent() {
        let map = GridMap::new(4, 3).unwrap();
        assert!(map.tile_at(3, 2).is_some());
        assert!(map.tile_at(4, 0).is_none());
        assert!(map.tile_at(0, 3).is_none());
    }

    #[test]
    fn test_index_round_trip() {
        let map = GridMap::new(7, 5).unwrap();
        let mut seen = vec![false; map.tile_count()];
        for pos in map.positions() {
            let index = map.index_of(pos);
            assert!(index < 35);
            assert!(!seen[index], "index {index} reused");
            seen[index] = true;
            assert_eq!(map.pos_of(index), Some(pos));
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(map.pos_of(35), None);
    }

    #[test]
    fn test_offset_never_wraps() {
        let origin = TilePos::new(0, 0);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(0, -1), None);
        assert_eq!(origin.offset(1, 1), Some(TilePos::new(1, 1)));
    }

    #[test]
    fn test_adjacency() {
        let p = TilePos::new(3, 3);
        assert!(p.is_adjacent(TilePos::new(4, 2)));
        assert!(!p.is_adjacent(p));
        assert!(!p.is_adjacent(TilePos::new(5, 3)));
    }

    #[test]
    fn test_from_ascii_legend() {
        let map = GridMap::from_ascii([".#~", "%D1"]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.tile_at(0, 0), Some(&Tile::open()));
        assert!(map.tile_at(1, 0).unwrap().terrain.contains(TerrainFlags::SOLID));
        assert!(map.tile_at(2, 0).unwrap().terrain.contains(TerrainFlags::WATER));
        assert!(map.tile_at(0, 1).unwrap().terrain.contains(TerrainFlags::LAVA));

        let door = map.tile_at(1, 1).unwrap();
        assert!(door.terrain.contains(TerrainFlags::DOOR));
        assert_eq!(door.owner, PlayerId::KEEPER);

        let room = map.tile_at(2, 1).unwrap();
        assert_eq!(room.room, Some(RoomId(1)));
        assert!(room.terrain.contains(TerrainFlags::ROOM));
    }

    #[test]
    fn test_from_ascii_errors() {
        assert!(matches!(
            GridMap::from_ascii(["..", "x."]),
            Err(MapError::UnknownGlyph { glyph: 'x', x: 0, y: 1 })
        ));
        assert!(matches!(
            GridMap::from_ascii(["...", ".."]),
            Err(MapError::RaggedRow { row: 1, expected: 3, found: 2 })
        ));
        assert!(GridMap::from_ascii(Vec::<&str>::new()).is_err());
    }

    #[test]
    fn test_setters() {
        let mut map = GridMap::new(3, 3).unwrap();
        let pos = TilePos::new(1, 1);

        assert!(map.set_terrain(pos, TerrainFlags::WATER));
        assert!(map.set_owner(pos, PlayerId(2)));
        assert!(map.set_room(pos, Some(RoomId(4))));
        let tile = map.tile(pos).unwrap();
        assert!(tile.terrain.contains(TerrainFlags::WATER | TerrainFlags::ROOM));
        assert_eq!(tile.owner, PlayerId(2));

        assert!(map.set_room(pos, None));
        assert!(!map.tile(pos).unwrap().terrain.contains(TerrainFlags::ROOM));

        assert!(!map.set_terrain(TilePos::new(3, 0), TerrainFlags::SOLID));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let map = GridMap::from_ascii([".#.", "~1%"]).unwrap();
        let bytes = map.to_bytes().unwrap();
        assert_eq!(GridMap::from_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(GridMap::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_terrain_flags_ops() {
        let mut flags = TerrainFlags::empty();
        flags |= TerrainFlags::LAVA;
        assert!(flags.is_liquid());
        assert!(!flags.contains(TerrainFlags::LAVA | TerrainFlags::SOLID));
        assert!(flags.intersects(TerrainFlags::LAVA | TerrainFlags::SOLID));
        assert_eq!(TerrainFlags::from_bits(flags.bits()), flags);
    }
}
