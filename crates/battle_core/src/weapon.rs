//! Weapons: stat blocks and the per-entity weapon instance.
//!
//! A weapon belongs to exactly one entity. The combat system queries it
//! when its cooldown elapses; the weapon itself only tracks timing.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal_serde, Fixed};

/// The three weapon behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Melee blade; hits every enemy in reach up to its target cap.
    Sword,
    /// Ranged; each attack looses one arrow per selected target.
    Bow,
    /// Mounted melee; knockback is multiplied while charging.
    Lance,
}

impl WeaponKind {
    /// All weapon kinds in upgrade-offer order.
    pub const ALL: [Self; 3] = [Self::Sword, Self::Bow, Self::Lance];

    /// Stable lowercase key, matching the config field names.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sword => "sword",
            Self::Bow => "bow",
            Self::Lance => "lance",
        }
    }

    /// Human-readable label for upgrade menus.
    #[must_use]
    pub const fn unlock_label(self) -> &'static str {
        match self {
            Self::Sword => "Unlock sword",
            Self::Bow => "Unlock bow",
            Self::Lance => "Unlock lance",
        }
    }
}

/// Stat block for one weapon type.
///
/// All durations are in seconds and all distances in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Damage per hit.
    pub damage: u32,

    /// Seconds between attacks.
    #[serde(with = "fixed_decimal_serde")]
    pub cooldown: Fixed,

    /// Reach measured from the wielder's centre to the target's edge.
    #[serde(with = "fixed_decimal_serde")]
    pub range: Fixed,

    /// Displacement applied to a mobile target on hit.
    #[serde(with = "fixed_decimal_serde")]
    pub knockback: Fixed,

    /// Number of distinct targets a single attack may hit.
    pub max_targets: u32,

    /// Projectile speed in m/s; zero means the weapon strikes instantly.
    #[serde(default, with = "fixed_decimal_serde")]
    pub projectile_speed: Fixed,
}

impl WeaponStats {
    /// Whether attacks travel as projectiles.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.projectile_speed > Fixed::ZERO
    }
}

/// A weapon held by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Which behaviour this weapon has.
    pub kind: WeaponKind,
    /// Tuning for this instance.
    pub stats: WeaponStats,
    /// Seconds until the weapon may fire again.
    #[serde(with = "fixed_decimal_serde")]
    pub cooldown_remaining: Fixed,
}

impl Weapon {
    /// Create a ready-to-fire weapon.
    #[must_use]
    pub const fn new(kind: WeaponKind, stats: WeaponStats) -> Self {
        Self {
            kind,
            stats,
            cooldown_remaining: Fixed::ZERO,
        }
    }

    /// Advance the cooldown timer; never goes below zero.
    pub fn tick(&mut self, dt: Fixed) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(Fixed::ZERO);
    }

    /// Check if ready to attack.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= Fixed::ZERO
    }

    /// Restart the cooldown after an attack.
    pub fn reset_cooldown(&mut self) {
        self.cooldown_remaining = self.stats.cooldown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> WeaponStats {
        WeaponStats {
            damage: 10,
            cooldown: Fixed::from_num(1),
            range: Fixed::from_num(2),
            knockback: Fixed::ZERO,
            max_targets: 3,
            projectile_speed: Fixed::ZERO,
        }
    }

    #[test]
    fn test_cooldown_counts_down_and_clamps() {
        let mut weapon = Weapon::new(WeaponKind::Sword, sword());
        assert!(weapon.is_ready());

        weapon.reset_cooldown();
        assert!(!weapon.is_ready());

        weapon.tick(Fixed::from_num(0.5));
        assert!(!weapon.is_ready());

        weapon.tick(Fixed::from_num(3));
        assert!(weapon.is_ready());
        assert_eq!(weapon.cooldown_remaining, Fixed::ZERO);
    }

    #[test]
    fn test_melee_is_not_ranged() {
        assert!(!sword().is_ranged());
        let bow = WeaponStats {
            projectile_speed: Fixed::from_num(20),
            ..sword()
        };
        assert!(bow.is_ranged());
    }
}
