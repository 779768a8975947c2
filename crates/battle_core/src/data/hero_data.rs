//! Hero roster entries.
//!
//! A hero is the player archetype with optional stat, weapon and mount
//! overrides layered over the base blocks.

use serde::{Deserialize, Serialize};

use super::unit_data::{MountStats, UnitStats};
use super::weapon_data::WeaponOverrides;
use crate::math::{option_fixed_decimal_serde, Fixed};
use crate::weapon::WeaponKind;

/// One selectable hero.
///
/// # Example RON
///
/// ```ron
/// HeroConfig(
///     id: "guanyu",
///     name: "Guan Yu",
///     avatar_text: "关",
///     stats: (health: Some(420)),
///     weapon: (kind: Sword, overrides: (damage: Some(30))),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroConfig {
    /// Stable identifier used by `select_hero`.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Short label for avatar badges.
    #[serde(default)]
    pub avatar_text: String,

    /// Overrides on the base player stats.
    #[serde(default)]
    pub stats: StatOverrides,

    /// Starting weapon.
    #[serde(default)]
    pub weapon: HeroWeapon,

    /// Overrides on the default mount.
    #[serde(default)]
    pub mount: MountOverrides,
}

impl HeroConfig {
    /// Hero used when the roster is empty: base stats and a plain sword.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: "default".to_string(),
            name: "Hero".to_string(),
            avatar_text: String::new(),
            stats: StatOverrides::default(),
            weapon: HeroWeapon::default(),
            mount: MountOverrides::default(),
        }
    }

    /// Player stats with this hero's overrides applied.
    #[must_use]
    pub fn resolve_stats(&self, base: &UnitStats) -> UnitStats {
        UnitStats {
            health: self.stats.health.unwrap_or(base.health),
            speed: self.stats.speed.unwrap_or(base.speed),
            acceleration: self.stats.acceleration.unwrap_or(base.acceleration),
            radius: self.stats.radius.unwrap_or(base.radius),
            mounted: base.mounted,
        }
    }

    /// Mount stats with this hero's overrides applied.
    #[must_use]
    pub fn resolve_mount(&self, base: &MountStats) -> MountStats {
        MountStats {
            speed: self.mount.speed.unwrap_or(base.speed),
            acceleration: self.mount.acceleration.unwrap_or(base.acceleration),
        }
    }
}

/// Partial character stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatOverrides {
    /// Replacement maximum health.
    #[serde(default)]
    pub health: Option<u32>,
    /// Replacement speed on foot.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub speed: Option<Fixed>,
    /// Replacement acceleration on foot.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub acceleration: Option<Fixed>,
    /// Replacement body radius.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub radius: Option<Fixed>,
}

/// Partial mount stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOverrides {
    /// Replacement mount speed.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub speed: Option<Fixed>,
    /// Replacement mount acceleration.
    #[serde(default, with = "option_fixed_decimal_serde")]
    pub acceleration: Option<Fixed>,
}

/// A hero's starting weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroWeapon {
    /// Weapon kind; counts as unlocked from the start of the session.
    pub kind: WeaponKind,
    /// Overrides on the roster stats for that kind.
    #[serde(default)]
    pub overrides: WeaponOverrides,
}

impl Default for HeroWeapon {
    fn default() -> Self {
        Self {
            kind: WeaponKind::Sword,
            overrides: WeaponOverrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_parses_with_defaults() {
        let hero: HeroConfig = ron::from_str(r#"(id: "zhaoyun", name: "Zhao Yun")"#).unwrap();
        assert_eq!(hero.weapon.kind, WeaponKind::Sword);
        assert_eq!(hero.stats, StatOverrides::default());
        assert!(hero.avatar_text.is_empty());
    }

    #[test]
    fn test_stat_overrides_layer_over_base() {
        let base = UnitStats {
            health: 300,
            speed: Fixed::from_num(5),
            acceleration: Fixed::from_num(20),
            radius: Fixed::from_num(0.5),
            mounted: true,
        };
        let hero = HeroConfig {
            stats: StatOverrides {
                health: Some(420),
                ..Default::default()
            },
            ..HeroConfig::fallback()
        };
        let stats = hero.resolve_stats(&base);
        assert_eq!(stats.health, 420);
        assert_eq!(stats.speed, Fixed::from_num(5));
        assert!(stats.mounted);
    }
}
