//! Attack timing, damage, knockback, death and reward emission.
//!
//! The combat system is the only code that lowers health. Every hit goes
//! through one path that clamps at zero, fires the death transition at
//! most once and reports the reward drop to the injected [`RewardSink`].
//!
//! # Targeting
//!
//! When a weapon is ready, the candidates reported by collision are
//! ordered nearest-first by edge gap, ties broken by collision
//! registration order, and the first `max_targets` are struck. Identical
//! snapshots therefore always pick identical targets.

use crate::collision::{CollisionReport, TargetCandidate};
use crate::components::{Archetype, EntityId};
use crate::economy::RewardSink;
use crate::math::{Fixed, Vec2Fixed};
use crate::team::Team;
use crate::units;
use crate::weapon::WeaponKind;
use crate::world::EntityStorage;

/// Events generated by the combat system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    /// A weapon fired at one or more targets.
    AttackStarted {
        /// Entity performing the attack.
        attacker: EntityId,
        /// Weapon used.
        weapon: WeaponKind,
        /// Targets selected, nearest first.
        targets: Vec<EntityId>,
    },
    /// Damage was dealt to a target.
    DamageDealt {
        /// Entity that dealt the damage (the archer for arrows).
        attacker: EntityId,
        /// Entity that received damage.
        target: EntityId,
        /// Health actually removed.
        damage: u32,
    },
    /// An arrow was loosed.
    ProjectileLaunched {
        /// The archer.
        source: EntityId,
        /// The new arrow entity.
        projectile: EntityId,
        /// Entity it was aimed at.
        target: EntityId,
    },
    /// A combatant's health reached zero.
    Killed {
        /// Entity responsible for the kill.
        killer: EntityId,
        /// Entity that died.
        victim: EntityId,
        /// What died.
        archetype: Archetype,
        /// Side it fought for.
        team: Option<Team>,
    },
}

/// Tracks attackers and resolves their attacks.
#[derive(Debug, Clone, Default)]
pub struct CombatSystem {
    registered: Vec<EntityId>,
}

impl CombatSystem {
    /// Create an empty combat system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attacker. Registering twice has no effect.
    pub fn add_entity(&mut self, id: EntityId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    /// Resolve one tick of combat.
    ///
    /// Arrow hits land first, then each registered attacker fires every
    /// weapon whose cooldown has elapsed and which has a target in reach.
    pub fn update(
        &mut self,
        entities: &mut EntityStorage,
        report: &CollisionReport,
        dt: Fixed,
        rewards: &mut dyn RewardSink,
    ) -> Vec<CombatEvent> {
        let mut events = Vec::new();

        for hit in &report.projectile_hits {
            resolve_projectile_hit(entities, hit.projectile, hit.target, rewards, &mut events);
        }

        self.registered
            .retain(|id| entities.get(*id).is_some_and(|e| e.active));

        for i in 0..self.registered.len() {
            let attacker = self.registered[i];
            attack(entities, attacker, report.targets_for(attacker), dt, rewards, &mut events);
        }

        events
    }
}

fn resolve_projectile_hit(
    entities: &mut EntityStorage,
    projectile_id: EntityId,
    target: EntityId,
    rewards: &mut dyn RewardSink,
    events: &mut Vec<CombatEvent>,
) {
    let Some(arrow) = entities.get(projectile_id) else {
        return;
    };
    let Some(projectile) = arrow.projectile.filter(|_| arrow.active) else {
        return;
    };
    if !entities.get(target).is_some_and(|t| t.is_alive()) {
        return;
    }
    if let Some(arrow) = entities.get_mut(projectile_id) {
        arrow.active = false;
    }
    let push = projectile.direction.scale(projectile.knockback);
    strike(
        entities,
        projectile.source,
        target,
        projectile.damage,
        push,
        rewards,
        events,
    );
}

fn attack(
    entities: &mut EntityStorage,
    attacker: EntityId,
    candidates: &[TargetCandidate],
    dt: Fixed,
    rewards: &mut dyn RewardSink,
    events: &mut Vec<CombatEvent>,
) {
    let Some(entity) = entities.get_mut(attacker) else {
        return;
    };
    if !entity.is_alive() {
        return;
    }
    let (Some(team), Some(origin)) = (entity.team, entity.pos()) else {
        tracing::warn!(entity = attacker, "Skipping attacker without team or position");
        return;
    };
    let knockback_multiplier = entity.knockback_multiplier();
    for weapon in &mut entity.weapons {
        weapon.tick(dt);
    }

    let weapon_count = entities.get(attacker).map_or(0, |e| e.weapons.len());
    for index in 0..weapon_count {
        let Some(weapon) = entities.get(attacker).and_then(|e| e.weapons.get(index).copied()) else {
            continue;
        };
        if !weapon.is_ready() {
            continue;
        }

        let mut in_reach: Vec<TargetCandidate> = candidates
            .iter()
            .filter(|c| c.gap <= weapon.stats.range)
            .filter(|c| entities.get(c.id).is_some_and(|t| t.is_target_for(team)))
            .copied()
            .collect();
        if in_reach.is_empty() {
            continue;
        }
        in_reach.sort_by(|a, b| (a.gap, a.order).cmp(&(b.gap, b.order)));
        in_reach.truncate(weapon.stats.max_targets as usize);
        let targets: Vec<EntityId> = in_reach.iter().map(|c| c.id).collect();

        tracing::trace!(attacker, weapon = weapon.kind.key(), ?targets, "Attack");
        events.push(CombatEvent::AttackStarted {
            attacker,
            weapon: weapon.kind,
            targets: targets.clone(),
        });

        for &target in &targets {
            let Some(target_pos) = entities.get(target).and_then(|t| t.pos()) else {
                continue;
            };
            let direction = (target_pos - origin).normalize();
            if weapon.kind == WeaponKind::Bow {
                let arrow = units::arrow(attacker, team, origin, direction, &weapon.stats);
                let projectile = entities.insert(arrow);
                events.push(CombatEvent::ProjectileLaunched {
                    source: attacker,
                    projectile,
                    target,
                });
            } else {
                let push = direction.scale(weapon.stats.knockback * knockback_multiplier);
                strike(entities, attacker, target, weapon.stats.damage, push, rewards, events);
            }
        }

        if let Some(w) = entities
            .get_mut(attacker)
            .and_then(|e| e.weapons.get_mut(index))
        {
            w.reset_cooldown();
        }
    }
}

/// Apply one hit. Dead or missing targets are ignored, so a second hit on
/// an entity that died earlier in the tick changes nothing.
fn strike(
    entities: &mut EntityStorage,
    attacker: EntityId,
    target: EntityId,
    damage: u32,
    push: Vec2Fixed,
    rewards: &mut dyn RewardSink,
    events: &mut Vec<CombatEvent>,
) {
    let Some(entity) = entities.get_mut(target) else {
        return;
    };
    if !entity.is_alive() {
        return;
    }
    let Some(health) = entity.health.as_mut() else {
        return;
    };

    let dealt = health.apply_damage(damage);
    let died = health.is_dead();
    events.push(CombatEvent::DamageDealt {
        attacker,
        target,
        damage: dealt,
    });

    if entity.movement.is_some() {
        if let Some(position) = entity.position.as_mut() {
            position.value += push;
        }
    }

    if died {
        entity.active = false;
        if let Some(movement) = entity.movement.as_mut() {
            movement.halt();
        }
        tracing::debug!(
            victim = target,
            killer = attacker,
            archetype = entity.archetype.name(),
            "Combatant killed"
        );
        events.push(CombatEvent::Killed {
            killer: attacker,
            victim: target,
            archetype: entity.archetype,
            team: entity.team,
        });
        if entity.archetype.is_unit() {
            if let Some(at) = entity.pos() {
                rewards.drop_reward(target, at);
            }
        }
    }
}
