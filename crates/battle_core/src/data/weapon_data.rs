//! Weapon stat blocks and per-hero weapon overrides.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{option_fixed_decimal_serde, Fixed};
use crate::weapon::{WeaponKind, WeaponStats};

/// One stat block per weapon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRoster {
    /// Sword stats.
    pub sword: WeaponStats,
    /// Bow stats.
    pub bow: WeaponStats,
    /// Lance stats.
    pub lance: WeaponStats,
}

impl WeaponRoster {
    /// Stats for a weapon kind.
    #[must_use]
    pub const fn get(&self, kind: WeaponKind) -> &WeaponStats {
        match kind {
            WeaponKind::Sword => &self.sword,
            WeaponKind::Bow => &self.bow,
            WeaponKind::Lance => &self.lance,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for kind in WeaponKind::ALL {
            validate_weapon(kind, self.get(kind), &format!("weapons.{}", kind.key()))?;
        }
        Ok(())
    }
}

/// Check a weapon stat block for out-of-range values.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfig`] naming the first bad field.
pub fn validate_weapon(kind: WeaponKind, stats: &WeaponStats, path: &str) -> Result<()> {
    if stats.cooldown < Fixed::ZERO {
        return Err(GameError::invalid_config(
            format!("{path}.cooldown"),
            "must not be negative",
        ));
    }
    if stats.range <= Fixed::ZERO {
        return Err(GameError::invalid_config(
            format!("{path}.range"),
            "must be positive",
        ));
    }
    if stats.knockback < Fixed::ZERO {
        return Err(GameError::invalid_config(
            format!("{path}.knockback"),
            "must not be negative",
        ));
    }
    if stats.max_targets == 0 {
        return Err(GameError::invalid_config(
            format!("{path}.max_targets"),
            "must be at least 1",
        ));
    }
    if kind == WeaponKind::Bow && !stats.is_ranged() {
        return Err(GameError::invalid_config(
            format!("{path}.projectile_speed"),
            "a bow needs a positive projectile speed",
        ));
    }
    Ok(())
}

/// Partial weapon stats layered over a base block.
///
/// Missing fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponOverrides {
    /// Replacement damage.
    #[serde(default)]
    pub damage: Option<u32>,

    /// Replacement cooldown.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub cooldown: Option<Fixed>,

    /// Replacement range.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub range: Option<Fixed>,

    /// Replacement knockback.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub knockback: Option<Fixed>,

    /// Replacement target cap.
    #[serde(default)]
    pub max_targets: Option<u32>,

    /// Replacement projectile speed.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub projectile_speed: Option<Fixed>,
}

impl WeaponOverrides {
    /// Apply the overrides to `base`.
    #[must_use]
    pub fn apply(&self, base: &WeaponStats) -> WeaponStats {
        WeaponStats {
            damage: self.damage.unwrap_or(base.damage),
            cooldown: self.cooldown.unwrap_or(base.cooldown),
            range: self.range.unwrap_or(base.range),
            knockback: self.knockback.unwrap_or(base.knockback),
            max_targets: self.max_targets.unwrap_or(base.max_targets),
            projectile_speed: self.projectile_speed.unwrap_or(base.projectile_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> WeaponStats {
        WeaponStats {
            damage: 20,
            cooldown: Fixed::ONE,
            range: Fixed::from_num(2),
            knockback: Fixed::ZERO,
            max_targets: 3,
            projectile_speed: Fixed::ZERO,
        }
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let overrides = WeaponOverrides {
            damage: Some(35),
            max_targets: Some(5),
            ..Default::default()
        };
        let stats = overrides.apply(&sword());
        assert_eq!(stats.damage, 35);
        assert_eq!(stats.max_targets, 5);
        assert_eq!(stats.range, Fixed::from_num(2));
        assert_eq!(stats.cooldown, Fixed::ONE);
    }

    #[test]
    fn test_overrides_parse_from_ron() {
        let overrides: WeaponOverrides = ron::from_str("(damage: Some(30), range: Some(2.5))").unwrap();
        assert_eq!(overrides.damage, Some(30));
        assert_eq!(overrides.range, Some(Fixed::from_num(2.5)));
        assert_eq!(overrides.cooldown, None);
    }

    #[test]
    fn test_bow_must_be_ranged() {
        let err = validate_weapon(WeaponKind::Bow, &sword(), "weapons.bow").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig { ref field, .. } if field == "weapons.bow.projectile_speed"));
        assert!(validate_weapon(WeaponKind::Sword, &sword(), "weapons.sword").is_ok());
    }

    #[test]
    fn test_zero_targets_rejected() {
        let stats = WeaponStats {
            max_targets: 0,
            ..sword()
        };
        assert!(validate_weapon(WeaponKind::Sword, &stats, "weapons.sword").is_err());
    }
}
