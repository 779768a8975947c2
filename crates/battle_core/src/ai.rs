//! Autonomous behavior for spawned units.
//!
//! Each AI-driven entity keeps only a target reference, its current
//! behavior and the cavalry charge timers. Everything else comes from the
//! fixed [`AiProfile`] of its archetype, so rebuilding the AI system at
//! session setup leaves nothing behind.
//!
//! The AI never moves anything itself: it writes a desired heading and a
//! speed multiplier that the next motion pass integrates.

use serde::{Deserialize, Serialize};

use crate::components::{Archetype, EntityId};
use crate::math::{fixed_decimal_serde, ratio, Fixed, Vec2Fixed};
use crate::team::Team;
use crate::world::{Entity, EntityStorage};

/// What an AI unit is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Behavior {
    /// No target.
    #[default]
    Idle,
    /// Closing on a target that is out of reach.
    Pursue,
    /// Holding position with the target in reach.
    Engage,
    /// Backing away from a target that came too close.
    Retreat,
    /// Cavalry charge: faster, harder-hitting, for a short time.
    Charge,
}

/// Cavalry charge tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeProfile {
    /// Start a charge when the target's edge is within this distance.
    pub trigger_distance: Fixed,
    /// Speed multiplier while charging.
    pub speed_multiplier: Fixed,
    /// Knockback multiplier while charging.
    pub knockback_multiplier: Fixed,
    /// Seconds a charge lasts.
    pub duration: Fixed,
    /// Seconds after a charge before the next may start.
    pub cooldown: Fixed,
}

/// Fixed behavioral parameters of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiProfile {
    /// Units farther than this are ignored; the enemy base is always known.
    pub sight_range: Fixed,
    /// Archers back away from units closer than this.
    pub keep_away: Option<Fixed>,
    /// Cavalry charge, if the archetype charges.
    pub charge: Option<ChargeProfile>,
}

impl AiProfile {
    /// Profile for an archetype.
    #[must_use]
    pub fn for_archetype(archetype: Archetype) -> Self {
        let base = Self {
            sight_range: Fixed::from_num(25),
            keep_away: None,
            charge: None,
        };
        match archetype {
            Archetype::Archer => Self {
                keep_away: Some(Fixed::from_num(5)),
                ..base
            },
            Archetype::Cavalry => Self {
                charge: Some(ChargeProfile {
                    trigger_distance: Fixed::from_num(12),
                    speed_multiplier: ratio(8, 5),
                    knockback_multiplier: Fixed::from_num(2),
                    duration: ratio(3, 2),
                    cooldown: Fixed::from_num(4),
                }),
                ..base
            },
            _ => base,
        }
    }
}

/// Per-entity AI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AiState {
    /// Current target, re-validated every tick.
    pub target: Option<EntityId>,
    /// Current behavior.
    pub behavior: Behavior,
    /// Seconds of charge left; zero when not charging.
    #[serde(with = "fixed_decimal_serde")]
    pub charge_remaining: Fixed,
    /// Seconds until another charge may start.
    #[serde(with = "fixed_decimal_serde")]
    pub charge_cooldown: Fixed,
    /// Knockback multiplier of the running charge.
    #[serde(with = "fixed_decimal_serde")]
    pub charge_knockback: Fixed,
}

impl AiState {
    /// Whether a charge is running.
    #[must_use]
    pub fn is_charging(&self) -> bool {
        self.charge_remaining > Fixed::ZERO
    }

    /// Knockback multiplier applied to this entity's attacks.
    #[must_use]
    pub fn knockback_multiplier(&self) -> Fixed {
        if self.is_charging() {
            self.charge_knockback
        } else {
            Fixed::ONE
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Seen {
    id: EntityId,
    position: Vec2Fixed,
    radius: Fixed,
    is_unit: bool,
}

impl Seen {
    fn of(entity: &Entity) -> Option<Self> {
        Some(Self {
            id: entity.id,
            position: entity.pos()?,
            radius: entity.radius,
            is_unit: entity.archetype.is_unit(),
        })
    }
}

/// Drives every registered AI unit.
#[derive(Debug, Clone, Default)]
pub struct AiSystem {
    registered: Vec<EntityId>,
}

impl AiSystem {
    /// Create an empty AI system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Registering twice has no effect.
    pub fn add_entity(&mut self, id: EntityId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    /// Re-target and steer every registered unit.
    pub fn update(&mut self, entities: &mut EntityStorage, dt: Fixed) {
        self.registered
            .retain(|id| entities.get(*id).is_some_and(|e| e.active));

        let ids = entities.sorted_ids();
        for &id in &self.registered {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            let (Some(team), Some(position)) = (entity.team, entity.pos()) else {
                tracing::warn!(entity = id, "Skipping AI unit without team or position");
                continue;
            };
            if entity.movement.is_none() || entity.ai.is_none() || !entity.is_alive() {
                continue;
            }

            let profile = AiProfile::for_archetype(entity.archetype);
            let reach = entity.max_weapon_range();
            let current = entity.ai.and_then(|ai| ai.target);
            let target = choose_target(entities, &ids, team, position, current, &profile);

            let Some(entity) = entities.get_mut(id) else {
                continue;
            };
            steer(entity, position, target, reach, &profile, dt);
        }
    }
}

fn choose_target(
    entities: &EntityStorage,
    ids: &[EntityId],
    team: Team,
    position: Vec2Fixed,
    current: Option<EntityId>,
    profile: &AiProfile,
) -> Option<Seen> {
    let in_sight = |seen: &Seen| position.distance(seen.position) - seen.radius <= profile.sight_range;

    let kept = current
        .and_then(|id| entities.get(id))
        .filter(|e| e.is_target_for(team))
        .and_then(Seen::of)
        .filter(|s| !s.is_unit || in_sight(s));

    if let Some(kept) = kept.filter(|s| s.is_unit) {
        return Some(kept);
    }

    let mut nearest: Option<(Fixed, Seen)> = None;
    let mut building = None;
    for &id in ids {
        let Some(candidate) = entities.get(id) else {
            continue;
        };
        if !candidate.is_target_for(team) {
            continue;
        }
        let Some(seen) = Seen::of(candidate) else {
            continue;
        };
        if !seen.is_unit {
            if candidate.archetype == Archetype::Building && building.is_none() {
                building = Some(seen);
            }
            continue;
        }
        let distance_sq = position.distance_squared(seen.position);
        if !in_sight(&seen) {
            continue;
        }
        if nearest.map_or(true, |(best, _)| distance_sq < best) {
            nearest = Some((distance_sq, seen));
        }
    }

    nearest.map(|(_, seen)| seen).or(kept).or(building)
}

fn steer(
    entity: &mut Entity,
    position: Vec2Fixed,
    target: Option<Seen>,
    reach: Fixed,
    profile: &AiProfile,
    dt: Fixed,
) {
    let (Some(ai), Some(movement)) = (entity.ai.as_mut(), entity.movement.as_mut()) else {
        return;
    };

    if ai.is_charging() {
        ai.charge_remaining = (ai.charge_remaining - dt).max(Fixed::ZERO);
        if !ai.is_charging() {
            if let Some(charge) = profile.charge {
                ai.charge_cooldown = charge.cooldown;
            }
        }
    } else {
        ai.charge_cooldown = (ai.charge_cooldown - dt).max(Fixed::ZERO);
    }

    ai.target = target.map(|t| t.id);
    let Some(target) = target else {
        ai.behavior = Behavior::Idle;
        movement.halt();
        movement.speed_multiplier = Fixed::ONE;
        return;
    };

    let toward = target.position - position;
    let gap = toward.length() - target.radius;
    let heading = toward.normalize();
    if !heading.is_zero() {
        entity.facing = heading;
    }

    if let Some(keep_away) = profile.keep_away {
        if target.is_unit && gap + target.radius < keep_away {
            ai.behavior = Behavior::Retreat;
            movement.steer(-toward);
            movement.speed_multiplier = Fixed::ONE;
            return;
        }
    }

    if let Some(charge) = profile.charge {
        let ready = !ai.is_charging() && ai.charge_cooldown == Fixed::ZERO;
        if ready && gap > reach && gap <= charge.trigger_distance {
            ai.charge_remaining = charge.duration;
            ai.charge_knockback = charge.knockback_multiplier;
        }
        if ai.is_charging() {
            ai.behavior = Behavior::Charge;
            movement.speed_multiplier = charge.speed_multiplier;
            if gap > reach {
                movement.steer(toward);
            } else {
                movement.halt();
            }
            return;
        }
    }

    movement.speed_multiplier = Fixed::ONE;
    if gap > reach {
        ai.behavior = Behavior::Pursue;
        movement.steer(toward);
    } else {
        ai.behavior = Behavior::Engage;
        movement.halt();
    }
}
