//! Per-archetype character stat blocks.

use serde::{Deserialize, Serialize};

use crate::components::{Archetype, Movement, UnitKind};
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, Fixed};

/// Largest health a character or building may be configured with.
///
/// Keeps level-scaled health well inside the fixed-point range.
pub const MAX_HEALTH: u32 = 1_000_000;

/// Stat block for one character archetype.
///
/// # Example RON
///
/// ```ron
/// UnitStats(
///     health: 100,
///     speed: 3.0,
///     acceleration: 12.0,
///     radius: 0.5,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum health points.
    pub health: u32,

    /// Top speed on foot in m/s.
    #[serde(with = "fixed_decimal_serde")]
    pub speed: Fixed,

    /// Acceleration in m/s².
    #[serde(with = "fixed_decimal_serde")]
    pub acceleration: Fixed,

    /// Body radius in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub radius: Fixed,

    /// Mounted characters move with their mount's stats instead.
    #[serde(default)]
    pub mounted: bool,
}

impl UnitStats {
    /// Movement component for a character with these stats.
    #[must_use]
    pub fn movement(&self, mount: &MountStats) -> Movement {
        if self.mounted {
            Movement::new(mount.speed, mount.acceleration)
        } else {
            Movement::new(self.speed, self.acceleration)
        }
    }

    /// Same stats with health multiplied by `scale`, rounded to nearest.
    ///
    /// Saturates at the fixed-point maximum and never drops below 1.
    #[must_use]
    pub fn with_health_scale(mut self, scale: Fixed) -> Self {
        let scaled = Fixed::saturating_from_num(self.health)
            .saturating_mul(scale)
            .saturating_round();
        self.health = scaled.max(Fixed::ONE).to_num::<u32>();
        self
    }

    /// Check the block for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field
    /// under `path`.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.health == 0 || self.health > MAX_HEALTH {
            return Err(GameError::invalid_config(
                format!("{path}.health"),
                format!("must be in 1..={MAX_HEALTH}"),
            ));
        }
        if self.speed < Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.speed"),
                "must not be negative",
            ));
        }
        if self.acceleration < Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.acceleration"),
                "must not be negative",
            ));
        }
        if self.radius <= Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.radius"),
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Stats of a riding animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountStats {
    /// Top speed in m/s.
    #[serde(with = "fixed_decimal_serde")]
    pub speed: Fixed,

    /// Acceleration in m/s².
    #[serde(with = "fixed_decimal_serde")]
    pub acceleration: Fixed,
}

impl MountStats {
    /// Check the block for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for negative values.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.speed < Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.speed"),
                "must not be negative",
            ));
        }
        if self.acceleration < Fixed::ZERO {
            return Err(GameError::invalid_config(
                format!("{path}.acceleration"),
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// One stat block per character archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRoster {
    /// Base stats of the hero, before hero overrides.
    pub player: UnitStats,
    /// Infantry stats.
    pub infantry: UnitStats,
    /// Archer stats.
    pub archer: UnitStats,
    /// Cavalry stats.
    pub cavalry: UnitStats,
}

impl CharacterRoster {
    /// Stats for a spawnable unit kind.
    #[must_use]
    pub const fn unit(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Infantry => &self.infantry,
            UnitKind::Archer => &self.archer,
            UnitKind::Cavalry => &self.cavalry,
        }
    }

    /// Stats for any character archetype; `None` for non-characters.
    #[must_use]
    pub const fn get(&self, archetype: Archetype) -> Option<&UnitStats> {
        match archetype {
            Archetype::Player => Some(&self.player),
            Archetype::Infantry => Some(&self.infantry),
            Archetype::Archer => Some(&self.archer),
            Archetype::Cavalry => Some(&self.cavalry),
            Archetype::Building | Archetype::Projectile | Archetype::Coin => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.player.validate("characters.player")?;
        self.infantry.validate("characters.infantry")?;
        self.archer.validate("characters.archer")?;
        self.cavalry.validate("characters.cavalry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    fn infantry() -> UnitStats {
        UnitStats {
            health: 100,
            speed: Fixed::from_num(3),
            acceleration: Fixed::from_num(12),
            radius: ratio(1, 2),
            mounted: false,
        }
    }

    #[test]
    fn test_health_scale_rounds() {
        let scaled = infantry().with_health_scale(ratio(3, 2));
        assert_eq!(scaled.health, 150);

        let odd = UnitStats {
            health: 70,
            ..infantry()
        }
        .with_health_scale(ratio(5, 4));
        // 87.5 rounds away from zero
        assert_eq!(odd.health, 88);
    }

    #[test]
    fn test_mounted_units_use_mount_speed() {
        let mount = MountStats {
            speed: Fixed::from_num(7),
            acceleration: Fixed::from_num(9),
        };
        let foot = infantry().movement(&mount);
        assert_eq!(foot.max_speed, Fixed::from_num(3));

        let rider = UnitStats {
            mounted: true,
            ..infantry()
        }
        .movement(&mount);
        assert_eq!(rider.max_speed, Fixed::from_num(7));
        assert_eq!(rider.acceleration, Fixed::from_num(9));
    }

    #[test]
    fn test_validate_names_field() {
        let bad = UnitStats {
            radius: Fixed::ZERO,
            ..infantry()
        };
        let err = bad.validate("characters.archer").unwrap_err();
        assert_eq!(
            err,
            GameError::invalid_config("characters.archer.radius", "must be positive")
        );
        assert!(infantry().validate("x").is_ok());
    }
}
