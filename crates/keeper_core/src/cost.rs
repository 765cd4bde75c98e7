//! Traversal cost between adjacent tiles.
//!
//! [`step_cost`] is a pure function of the map, the occupancy collaborator,
//! the two tiles and the mover's [`Capability`]. It returns `None` when the
//! step is impossible.
//!
//! Two liquid cost policies exist and are kept side by side:
//! - [`CostPolicy::WaterPenalty`] makes water and lava more expensive, so
//!   walkers that may swim still prefer dry ground when it is available.
//! - [`CostPolicy::WaterDiscount`] makes them cheaper, per liquid endpoint.
//!
//! The session picks one through configuration.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::map::{PlayerId, TerrainFlags, TileMap, TilePos};
use crate::math::{tenths, Fixed};
use crate::navigable::Capability;

/// Cost of an ordinary step.
pub const DEFAULT_COST: Fixed = Fixed::ONE;

/// Cost of stepping into water or lava under [`CostPolicy::WaterPenalty`].
pub const WATER_COST: Fixed = tenths(14);

/// Reduction per liquid endpoint under [`CostPolicy::WaterDiscount`].
pub const WATER_DISCOUNT: Fixed = tenths(4);

/// How water and lava affect the cost of a permitted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CostPolicy {
    /// Entering liquid costs [`WATER_COST`].
    #[default]
    WaterPenalty,
    /// Each liquid endpoint subtracts [`WATER_DISCOUNT`] from [`DEFAULT_COST`].
    WaterDiscount,
}

impl CostPolicy {
    /// Cost of a walking step between tiles with the given terrain.
    ///
    /// Only called once the step is known to be permitted.
    #[must_use]
    pub fn walking_cost(self, from: TerrainFlags, to: TerrainFlags) -> Fixed {
        match self {
            Self::WaterPenalty => {
                if to.is_liquid() {
                    WATER_COST
                } else {
                    DEFAULT_COST
                }
            }
            Self::WaterDiscount => {
                let liquid_ends = i32::from(from.is_liquid()) + i32::from(to.is_liquid());
                DEFAULT_COST - WATER_DISCOUNT * Fixed::from_num(liquid_ends)
            }
        }
    }

    /// Smallest cost any single step can have under this policy.
    ///
    /// Heuristics scale by this to stay admissible.
    #[must_use]
    pub fn min_step_cost(self) -> Fixed {
        match self {
            Self::WaterPenalty => DEFAULT_COST,
            Self::WaterDiscount => DEFAULT_COST - WATER_DISCOUNT * Fixed::from_num(2),
        }
    }
}

/// Whether a tile is currently blocked by something other than terrain.
///
/// This is the entity/world collaborator: closed doors, claimed tiles,
/// creatures standing in the way.
pub trait Occupancy {
    /// True if an entity with `capability` may not enter `pos` right now.
    fn is_blocked(&self, pos: TilePos, capability: &Capability) -> bool;
}

impl<T: Occupancy + ?Sized> Occupancy for &T {
    fn is_blocked(&self, pos: TilePos, capability: &Capability) -> bool {
        (**self).is_blocked(pos, capability)
    }
}

impl<T: Occupancy + ?Sized> Occupancy for Arc<T> {
    fn is_blocked(&self, pos: TilePos, capability: &Capability) -> bool {
        (**self).is_blocked(pos, capability)
    }
}

/// Nothing is ever blocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unoccupied;

impl Occupancy for Unoccupied {
    fn is_blocked(&self, _pos: TilePos, _capability: &Capability) -> bool {
        false
    }
}

/// Explicit set of blocked tiles, optionally passable for one owner.
///
/// ```
/// use keeper_core::cost::{BlockedTiles, Occupancy};
/// use keeper_core::map::{PlayerId, TilePos};
/// use keeper_core::navigable::Capability;
///
/// let mut doors = BlockedTiles::default();
/// doors.block_except(TilePos::new(2, 2), PlayerId::KEEPER);
///
/// assert!(!doors.is_blocked(TilePos::new(2, 2), &Capability::walker(PlayerId::KEEPER)));
/// assert!(doors.is_blocked(TilePos::new(2, 2), &Capability::walker(PlayerId(2))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlockedTiles {
    blocked: HashMap<TilePos, Option<PlayerId>>,
}

impl BlockedTiles {
    /// Block `pos` for everyone.
    pub fn block(&mut self, pos: TilePos) {
        self.blocked.insert(pos, None);
    }

    /// Block `pos` for everyone except entities owned by `owner`.
    pub fn block_except(&mut self, pos: TilePos, owner: PlayerId) {
        self.blocked.insert(pos, Some(owner));
    }

    /// Clear any block on `pos`.
    pub fn unblock(&mut self, pos: TilePos) {
        self.blocked.remove(&pos);
    }

    /// Number of blocked tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    /// True if nothing is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

impl Occupancy for BlockedTiles {
    fn is_blocked(&self, pos: TilePos, capability: &Capability) -> bool {
        match self.blocked.get(&pos) {
            None => false,
            Some(None) => true,
            Some(Some(owner)) => *owner != capability.owner,
        }
    }
}

/// Cost of stepping from `from` to `to`, or `None` if the step is impossible.
///
/// Flying skips terrain checks and always pays [`DEFAULT_COST`]; the
/// occupancy check still applies.
pub fn step_cost<M, O>(
    map: &M,
    occupancy: &O,
    from: TilePos,
    to: TilePos,
    capability: &Capability,
    policy: CostPolicy,
) -> Option<Fixed>
where
    M: TileMap + ?Sized,
    O: Occupancy + ?Sized,
{
    let target = map.tile(to)?;

    if occupancy.is_blocked(to, capability) {
        return None;
    }

    if capability.can_fly {
        return Some(DEFAULT_COST);
    }

    let terrain = target.terrain;
    if terrain.contains(TerrainFlags::SOLID) {
        return None;
    }
    if terrain.contains(TerrainFlags::WATER) && !capability.can_walk_on_water {
        return None;
    }
    if terrain.contains(TerrainFlags::LAVA) && !capability.can_walk_on_lava {
        return None;
    }

    let origin = map
        .tile(from)
        .map_or(TerrainFlags::empty(), |tile| tile.terrain);
    Some(policy.walking_cost(origin, terrain))
}
