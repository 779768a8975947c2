//! Base building definitions, wave composition and the opening enemy group.

use serde::{Deserialize, Serialize};

use crate::components::UnitKind;
use crate::data::unit_data::MAX_HEALTH;
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, Fixed, Vec2Fixed};
use crate::team::Team;

/// Data-driven definition of one team's base.
///
/// # Example RON
///
/// ```ron
/// BuildingConfig(
///     position: (x: 12.0, y: 20.0),
///     radius: 3.0,
///     health: 2000,
///     spawn_interval: 10.0,
///     first_spawn_time: 3.0,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingConfig {
    /// Centre of the building in world space.
    pub position: Vec2Fixed,

    /// Footprint radius in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub radius: Fixed,

    /// Maximum health points.
    pub health: u32,

    /// Seconds between waves. Non-positive values are clamped when the
    /// spawner is built.
    #[serde(with = "fixed_decimal_serde")]
    pub spawn_interval: Fixed,

    /// Seconds until the first wave.
    #[serde(with = "fixed_decimal_serde")]
    pub first_spawn_time: Fixed,
}

impl BuildingConfig {
    fn validate(&self, path: &str, width: Fixed, height: Fixed) -> Result<()> {
        if self.health == 0 || self.health > MAX_HEALTH {
            return Err(GameError::invalid_config(
                format!("{path}.health"),
                format!("must be in 1..={MAX_HEALTH}"),
            ));
        }
        if self.radius <= Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.radius"),
                "must be positive",
            ));
        }
        let p = self.position;
        if p.x < Fixed::ZERO || p.y < Fixed::ZERO || p.x > width || p.y > height {
            return Err(GameError::invalid_config(
                format!("{path}.position"),
                "must lie inside the map",
            ));
        }
        if self.first_spawn_time < Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.first_spawn_time"),
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// The two bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBuildings {
    /// The player's base.
    pub player: BuildingConfig,
    /// The enemy's base.
    pub enemy: BuildingConfig,
}

impl TeamBuildings {
    /// Building definition for a team.
    #[must_use]
    pub const fn for_team(&self, team: Team) -> &BuildingConfig {
        match team {
            Team::Player => &self.player,
            Team::Enemy => &self.enemy,
        }
    }

    pub(crate) fn validate(&self, width: Fixed, height: Fixed) -> Result<()> {
        self.player.validate("buildings.player", width, height)?;
        self.enemy.validate("buildings.enemy", width, height)
    }
}

/// Most units of one kind a wave may hold, before or after level scaling.
pub const MAX_WAVE_UNITS: u32 = 64;

/// Number of each unit kind in one wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnComposition {
    /// Infantry per wave.
    #[serde(default)]
    pub infantry: u32,
    /// Archers per wave.
    #[serde(default)]
    pub archer: u32,
    /// Cavalry per wave.
    #[serde(default)]
    pub cavalry: u32,
}

impl SpawnComposition {
    /// Count for one unit kind.
    #[must_use]
    pub const fn count(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Infantry => self.infantry,
            UnitKind::Archer => self.archer,
            UnitKind::Cavalry => self.cavalry,
        }
    }

    /// Units in one wave.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.infantry
            .saturating_add(self.archer)
            .saturating_add(self.cavalry)
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        for kind in UnitKind::ALL {
            if self.count(kind) > MAX_WAVE_UNITS {
                return Err(GameError::invalid_config(
                    format!("{path}.{}", kind.archetype().name()),
                    format!("at most {MAX_WAVE_UNITS} per wave"),
                ));
            }
        }
        Ok(())
    }
}

/// A unit placed next to the enemy base when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialUnit {
    /// What to spawn.
    pub kind: UnitKind,
    /// Offset from the enemy building's centre.
    pub offset: Vec2Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BuildingConfig {
        BuildingConfig {
            position: Vec2Fixed::from_num(10, 10),
            radius: Fixed::from_num(3),
            health: 1000,
            spawn_interval: Fixed::from_num(10),
            first_spawn_time: Fixed::from_num(3),
        }
    }

    #[test]
    fn test_composition_counts() {
        let wave = SpawnComposition {
            infantry: 4,
            archer: 2,
            cavalry: 1,
        };
        assert_eq!(wave.count(UnitKind::Archer), 2);
        assert_eq!(wave.total(), 7);
    }

    #[test]
    fn test_building_outside_map_rejected() {
        let far = BuildingConfig {
            position: Vec2Fixed::from_num(500, 10),
            ..base()
        };
        let err = far
            .validate("buildings.enemy", Fixed::from_num(100), Fixed::from_num(40))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::invalid_config("buildings.enemy.position", "must lie inside the map")
        );
    }

    #[test]
    fn test_zero_interval_is_not_a_config_error() {
        let fast = BuildingConfig {
            spawn_interval: Fixed::ZERO,
            ..base()
        };
        assert!(fast
            .validate("buildings.player", Fixed::from_num(100), Fixed::from_num(40))
            .is_ok());
    }
}
