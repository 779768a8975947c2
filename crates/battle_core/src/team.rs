//! Team definitions.

use serde::{Deserialize, Serialize};

/// The two sides of a match.
///
/// Every combatant belongs to exactly one team for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// The side the hero fights for.
    Player,
    /// The opposing side.
    Enemy,
}

impl Team {
    /// Both teams in a fixed order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Enemy];

    /// Whether `other` is hostile to this team.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }

    /// Get the short name for this team.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }

    /// Horizontal direction this team's units advance in.
    ///
    /// The player base sits on the left of the map and the enemy base on
    /// the right, so player units push toward `+x`.
    #[must_use]
    pub const fn advance_sign(self) -> i32 {
        match self {
            Self::Player => 1,
            Self::Enemy => -1,
        }
    }
}
