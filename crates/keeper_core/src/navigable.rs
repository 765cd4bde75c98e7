//! Traversal capabilities of a navigating entity.

use serde::{Deserialize, Serialize};

use crate::map::PlayerId;

/// What an entity can cross, plus who it belongs to.
///
/// Passed by value into every cost and graph call; nothing stores it on the map.
///
/// ```
/// use keeper_core::map::PlayerId;
/// use keeper_core::navigable::Capability;
///
/// let imp = Capability::walker(PlayerId::KEEPER).with_diagonal();
/// assert!(imp.can_move_diagonally);
/// assert!(!imp.can_fly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capability {
    /// Owning player.
    #[serde(default)]
    pub owner: PlayerId,
    /// Ignores terrain entirely.
    #[serde(default)]
    pub can_fly: bool,
    /// May enter water tiles.
    #[serde(default)]
    pub can_walk_on_water: bool,
    /// May enter lava tiles.
    #[serde(default)]
    pub can_walk_on_lava: bool,
    /// Uses the 8-neighbourhood instead of the 4-neighbourhood.
    #[serde(default)]
    pub can_move_diagonally: bool,
}

impl Capability {
    /// Ground walker with no special abilities.
    #[must_use]
    pub const fn walker(owner: PlayerId) -> Self {
        Self {
            owner,
            can_fly: false,
            can_walk_on_water: false,
            can_walk_on_lava: false,
            can_move_diagonally: false,
        }
    }

    /// Flying creature.
    #[must_use]
    pub const fn flyer(owner: PlayerId) -> Self {
        Self {
            can_fly: true,
            ..Self::walker(owner)
        }
    }

    /// Enable diagonal movement.
    #[must_use]
    pub const fn with_diagonal(mut self) -> Self {
        self.can_move_diagonally = true;
        self
    }

    /// Enable water walking.
    #[must_use]
    pub const fn with_water(mut self) -> Self {
        self.can_walk_on_water = true;
        self
    }

    /// Enable lava walking.
    #[must_use]
    pub const fn with_lava(mut self) -> Self {
        self.can_walk_on_lava = true;
        self
    }
}
