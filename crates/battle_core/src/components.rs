//! Component definitions.
//!
//! Components are pure data with little behavior. Every entity is a
//! single [`Entity`](crate::world::Entity) record carrying whichever of
//! these components its archetype needs.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal_serde, ratio, Fixed, Vec2Fixed};
use crate::weapon::WeaponKind;

/// Unique identifier for entities.
///
/// Identifiers are handed out in increasing order and never reused within
/// a session, so sorting by id reproduces registration order.
pub type EntityId = u64;

/// Tag describing what an entity is.
///
/// Consulted for tuning constants and AI behavior; capabilities come from
/// the components actually present on the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// The hero steered by the player.
    Player,
    /// Sword-wielding foot soldier.
    Infantry,
    /// Bow-wielding foot soldier that keeps its distance.
    Archer,
    /// Mounted lancer that charges.
    Cavalry,
    /// A team's base.
    Building,
    /// An arrow in flight.
    Projectile,
    /// A coin dropped by a kill.
    Coin,
}

impl Archetype {
    /// Whether this archetype takes part in combat (deals or receives damage).
    #[must_use]
    pub const fn is_combatant(self) -> bool {
        matches!(
            self,
            Self::Player | Self::Infantry | Self::Archer | Self::Cavalry | Self::Building
        )
    }

    /// Whether this archetype is a mobile fighting unit.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        matches!(
            self,
            Self::Player | Self::Infantry | Self::Archer | Self::Cavalry
        )
    }

    /// Lowercase name for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Infantry => "infantry",
            Self::Archer => "archer",
            Self::Cavalry => "cavalry",
            Self::Building => "building",
            Self::Projectile => "projectile",
            Self::Coin => "coin",
        }
    }
}

/// The unit archetypes a building can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// See [`Archetype::Infantry`].
    Infantry,
    /// See [`Archetype::Archer`].
    Archer,
    /// See [`Archetype::Cavalry`].
    Cavalry,
}

impl UnitKind {
    /// All unit kinds in spawn order.
    pub const ALL: [Self; 3] = [Self::Infantry, Self::Archer, Self::Cavalry];

    /// The entity archetype for this unit kind.
    #[must_use]
    pub const fn archetype(self) -> Archetype {
        match self {
            Self::Infantry => Archetype::Infantry,
            Self::Archer => Archetype::Archer,
            Self::Cavalry => Archetype::Cavalry,
        }
    }

    /// The weapon this unit kind is issued.
    #[must_use]
    pub const fn weapon(self) -> WeaponKind {
        match self {
            Self::Infantry => WeaponKind::Sword,
            Self::Archer => WeaponKind::Bow,
            Self::Cavalry => WeaponKind::Lance,
        }
    }
}

/// Position component in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// World position in meters.
    pub value: Vec2Fixed,
}

impl Position {
    /// Create a new position at the given coordinates.
    #[must_use]
    pub const fn new(value: Vec2Fixed) -> Self {
        Self { value }
    }

    /// Create a position at the origin.
    pub const ORIGIN: Self = Self {
        value: Vec2Fixed::ZERO,
    };
}

/// Health component for damageable entities.
///
/// `current` is always within `[0, max]`. Nothing in the simulation heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Health as a fraction of maximum in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        if self.max == 0 {
            Fixed::ZERO
        } else {
            (Fixed::saturating_from_num(self.current) / Fixed::saturating_from_num(self.max)).min(Fixed::ONE)
        }
    }

}

/// Movement component for mobile entities.
///
/// The AI (or player input) writes `desired`; the movement phase of the
/// next tick accelerates `velocity` toward `desired * max_speed *
/// speed_multiplier` and integrates the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Top speed in m/s.
    #[serde(with = "fixed_decimal_serde")]
    pub max_speed: Fixed,
    /// Acceleration in m/s²; zero or less snaps straight to the target velocity.
    #[serde(with = "fixed_decimal_serde")]
    pub acceleration: Fixed,
    /// Current velocity in m/s.
    pub velocity: Vec2Fixed,
    /// Unit-length desired heading, or zero to stop.
    pub desired: Vec2Fixed,
    /// Temporary multiplier on `max_speed` (cavalry charge).
    #[serde(with = "fixed_decimal_serde")]
    pub speed_multiplier: Fixed,
}

impl Movement {
    /// Create a stationary movement component.
    #[must_use]
    pub const fn new(max_speed: Fixed, acceleration: Fixed) -> Self {
        Self {
            max_speed,
            acceleration,
            velocity: Vec2Fixed::ZERO,
            desired: Vec2Fixed::ZERO,
            speed_multiplier: Fixed::ONE,
        }
    }

    /// Set the desired heading; the input is normalized.
    pub fn steer(&mut self, direction: Vec2Fixed) {
        self.desired = direction.normalize();
    }

    /// Stop steering.
    pub fn halt(&mut self) {
        self.desired = Vec2Fixed::ZERO;
    }

    /// Velocity the entity is accelerating toward.
    #[must_use]
    pub fn target_velocity(&self) -> Vec2Fixed {
        self.desired.scale(self.max_speed * self.speed_multiplier)
    }

    /// Advance velocity by `dt` seconds and return the displacement.
    pub fn integrate(&mut self, dt: Fixed) -> Vec2Fixed {
        let target = self.target_velocity();
        self.velocity = if self.acceleration <= Fixed::ZERO {
            target
        } else {
            self.velocity.move_toward(target, self.acceleration * dt)
        };
        self.velocity.scale(dt)
    }
}

/// An arrow in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Entity that loosed the arrow.
    pub source: EntityId,
    /// Damage on impact.
    pub damage: u32,
    /// Knockback on impact.
    #[serde(with = "fixed_decimal_serde")]
    pub knockback: Fixed,
    /// Unit-length flight direction.
    pub direction: Vec2Fixed,
    /// Speed in m/s.
    #[serde(with = "fixed_decimal_serde")]
    pub speed: Fixed,
    /// Distance flown so far.
    #[serde(with = "fixed_decimal_serde")]
    pub travelled: Fixed,
    /// Distance after which the arrow drops harmlessly.
    #[serde(with = "fixed_decimal_serde")]
    pub max_distance: Fixed,
    /// Position at the start of the current tick, for swept hit tests.
    pub previous: Vec2Fixed,
}

impl Projectile {
    /// Arrows fly this many times their weapon's range before expiring.
    #[must_use]
    pub fn flight_distance(range: Fixed) -> Fixed {
        range * ratio(3, 2)
    }

    /// Whether the arrow has used up its flight distance.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.travelled >= self.max_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(10);
        assert_eq!(health.apply_damage(4), 4);
        assert_eq!(health.apply_damage(100), 6);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
        assert_eq!(health.apply_damage(5), 0);
    }

    #[test]
    fn test_health_ratio() {
        let mut health = Health::new(200);
        health.apply_damage(50);
        assert_eq!(health.ratio(), ratio(3, 4));
        assert_eq!(Health::new(0).ratio(), Fixed::ZERO);
    }

    #[test]
    fn test_health_ratio_of_huge_pools() {
        let health = Health::new(u32::MAX);
        assert_eq!(health.ratio(), Fixed::ONE);
        let half = Health {
            current: 1_000_000,
            max: 2_000_000,
        };
        assert_eq!(half.ratio(), ratio(1, 2));
    }

    fn close(a: Vec2Fixed, b: Vec2Fixed) -> bool {
        a.distance_squared(b) < ratio(1, 1_000_000)
    }

    #[test]
    fn test_movement_snaps_without_acceleration() {
        let mut movement = Movement::new(Fixed::from_num(4), Fixed::ZERO);
        movement.steer(Vec2Fixed::from_num(10, 0));
        let step = movement.integrate(ratio(1, 2));
        assert!(close(step, Vec2Fixed::from_num(2, 0)), "{step:?}");
    }

    #[test]
    fn test_movement_accelerates_gradually() {
        let mut movement = Movement::new(Fixed::from_num(10), Fixed::from_num(5));
        movement.steer(Vec2Fixed::UNIT_X);
        movement.integrate(Fixed::ONE);
        assert!(close(movement.velocity, Vec2Fixed::from_num(5, 0)));
        movement.integrate(Fixed::ONE);
        assert!(close(movement.velocity, Vec2Fixed::from_num(10, 0)));
    }

    #[test]
    fn test_unit_kinds_map_to_weapons() {
        assert_eq!(UnitKind::Infantry.weapon(), WeaponKind::Sword);
        assert_eq!(UnitKind::Archer.weapon(), WeaponKind::Bow);
        assert_eq!(UnitKind::Cavalry.weapon(), WeaponKind::Lance);
        assert!(Archetype::Building.is_combatant());
        assert!(!Archetype::Building.is_unit());
        assert!(!Archetype::Coin.is_combatant());
    }
}
