//! Read-only snapshots handed to rendering, minimap and UI collaborators.

use serde::Serialize;

use crate::components::{Archetype, EntityId};
use crate::math::{fixed_decimal_serde, option_fixed_decimal_serde, Fixed, Vec2Fixed};
use crate::team::Team;
use crate::weapon::WeaponKind;

/// One active entity as a renderer needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityView {
    /// Entity id.
    pub id: EntityId,
    /// What to draw.
    pub archetype: Archetype,
    /// Colour side, if any.
    pub team: Option<Team>,
    /// World position.
    pub position: Vec2Fixed,
    /// Unit-length facing.
    pub facing: Vec2Fixed,
    /// Body radius.
    #[serde(with = "fixed_decimal_serde")]
    pub radius: Fixed,
    /// Health bar fill, for damageable entities.
    #[serde(with = "option_fixed_decimal_serde")]
    pub health_ratio: Option<Fixed>,
}

/// A base, destroyed or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildingView {
    /// Entity id.
    pub id: EntityId,
    /// Owning side.
    pub team: Team,
    /// Centre.
    pub position: Vec2Fixed,
    /// Footprint radius.
    #[serde(with = "fixed_decimal_serde")]
    pub radius: Fixed,
    /// Remaining health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
}

impl BuildingView {
    /// Whether the base has fallen.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health == 0
    }
}

/// A dot on the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinimapDot {
    /// Side the dot is coloured for.
    pub team: Team,
    /// World position.
    pub position: Vec2Fixed,
}

/// Everything the minimap draws.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MinimapView {
    /// Map width in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub width: Fixed,
    /// Map height in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub height: Fixed,
    /// Both bases.
    pub buildings: Vec<MinimapDot>,
    /// Living soldiers, hero excluded.
    pub units: Vec<MinimapDot>,
    /// The hero, while alive.
    pub hero: Option<(EntityId, Vec2Fixed)>,
}

/// A selectable hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroCard {
    /// Roster id passed to `select_hero`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short text drawn on the avatar.
    pub avatar_text: String,
    /// Starting weapon.
    pub weapon: WeaponKind,
}
