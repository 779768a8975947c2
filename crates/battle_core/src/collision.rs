//! Spatial queries: body separation, weapon proximity and arrow hits.
//!
//! The collision system only reports and corrects overlaps; it never
//! applies damage. Everything it produces for combat is collected into a
//! [`CollisionReport`].
//!
//! All scans are linear over the registered bodies, in registration order,
//! so identical inputs always yield identical reports. A uniform grid would
//! be the next step if entity counts grow well past a few hundred.

use std::collections::BTreeMap;

use crate::components::EntityId;
use crate::math::{fixed_sqrt, ratio, Fixed, Vec2Fixed};
use crate::team::Team;
use crate::world::EntityStorage;

/// Radius of an arrow for hit tests.
pub fn projectile_radius() -> Fixed {
    ratio(1, 10)
}

/// A hostile body inside an attacker's reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    /// The target entity.
    pub id: EntityId,
    /// Centre-to-edge distance from the attacker.
    pub gap: Fixed,
    /// Position in the collision registry; lower registered first.
    pub order: usize,
}

/// An arrow that struck a body this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileHit {
    /// The arrow.
    pub projectile: EntityId,
    /// The body it struck first.
    pub target: EntityId,
}

/// Everything the combat system needs from one collision pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Hostile bodies within each armed entity's longest reach, in
    /// registration order.
    pub proximity: BTreeMap<EntityId, Vec<TargetCandidate>>,
    /// At most one hit per arrow, in arrow id order.
    pub projectile_hits: Vec<ProjectileHit>,
}

impl CollisionReport {
    /// Candidates in reach of `attacker`; empty if none.
    #[must_use]
    pub fn targets_for(&self, attacker: EntityId) -> &[TargetCandidate] {
        self.proximity.get(&attacker).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    id: EntityId,
    order: usize,
    team: Team,
    position: Vec2Fixed,
    radius: Fixed,
    mobile: bool,
    alive: bool,
    damageable: bool,
    reach: Option<Fixed>,
}

/// Tracks the bodies that take part in spatial queries.
#[derive(Debug, Clone, Default)]
pub struct CollisionSystem {
    registered: Vec<EntityId>,
}

impl CollisionSystem {
    /// Create an empty collision system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body. Registering twice has no effect.
    pub fn add_entity(&mut self, id: EntityId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    /// Run one collision pass.
    ///
    /// Prunes inactive bodies, pushes overlapping bodies apart, then
    /// reports weapon proximity and arrow hits against the corrected
    /// positions.
    pub fn update(&mut self, entities: &mut EntityStorage) -> CollisionReport {
        self.registered
            .retain(|id| entities.get(*id).is_some_and(|e| e.active));

        let mut bodies = self.snapshot(entities);
        separate(&mut bodies);
        for body in &bodies {
            if let Some(position) = entities.get_mut(body.id).and_then(|e| e.position.as_mut()) {
                position.value = body.position;
            }
        }

        CollisionReport {
            proximity: proximity(&bodies),
            projectile_hits: projectile_hits(entities, &bodies),
        }
    }

    fn snapshot(&self, entities: &EntityStorage) -> Vec<Body> {
        let mut bodies = Vec::with_capacity(self.registered.len());
        for (order, &id) in self.registered.iter().enumerate() {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            let (Some(team), Some(position)) = (entity.team, entity.pos()) else {
                tracing::warn!(entity = id, "Skipping body without team or position");
                continue;
            };
            bodies.push(Body {
                id,
                order,
                team,
                position,
                radius: entity.radius,
                mobile: entity.movement.is_some(),
                alive: entity.is_alive(),
                damageable: entity.health.is_some() && entity.archetype.is_combatant(),
                reach: (!entity.weapons.is_empty()).then(|| entity.max_weapon_range()),
            });
        }
        bodies
    }
}

/// Push overlapping pairs apart, earlier pairs first.
///
/// Two mobile bodies each move half the overlap; a mobile body overlapping
/// a static one moves the full overlap.
fn separate(bodies: &mut [Body]) {
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = (bodies[i], bodies[j]);
            if !a.alive || !b.alive || (!a.mobile && !b.mobile) {
                continue;
            }
            let min_distance = a.radius + b.radius;
            let delta = b.position - a.position;
            let distance_sq = delta.dot(delta);
            if distance_sq >= min_distance * min_distance {
                continue;
            }
            let distance = fixed_sqrt(distance_sq);
            let normal = if distance == Fixed::ZERO {
                Vec2Fixed::UNIT_X
            } else {
                delta.scale(Fixed::ONE / distance)
            };
            let overlap = min_distance - distance;
            match (a.mobile, b.mobile) {
                (true, true) => {
                    let half = overlap / Fixed::from_num(2);
                    bodies[i].position -= normal.scale(half);
                    bodies[j].position += normal.scale(half);
                }
                (true, false) => bodies[i].position -= normal.scale(overlap),
                _ => bodies[j].position += normal.scale(overlap),
            }
        }
    }
}

fn proximity(bodies: &[Body]) -> BTreeMap<EntityId, Vec<TargetCandidate>> {
    let mut report = BTreeMap::new();
    for attacker in bodies {
        let Some(reach) = attacker.reach else {
            continue;
        };
        if !attacker.alive {
            continue;
        }
        let targets: Vec<_> = bodies
            .iter()
            .filter(|t| t.alive && t.damageable && t.team.is_hostile_to(attacker.team))
            .filter_map(|t| {
                let gap = attacker.position.distance(t.position) - t.radius;
                (gap <= reach).then_some(TargetCandidate {
                    id: t.id,
                    gap,
                    order: t.order,
                })
            })
            .collect();
        if !targets.is_empty() {
            report.insert(attacker.id, targets);
        }
    }
    report
}

fn projectile_hits(entities: &EntityStorage, bodies: &[Body]) -> Vec<ProjectileHit> {
    let mut hits = Vec::new();
    for id in entities.sorted_ids() {
        let Some(entity) = entities.get(id) else {
            continue;
        };
        if !entity.active {
            continue;
        }
        let (Some(projectile), Some(end), Some(team)) = (entity.projectile, entity.pos(), entity.team)
        else {
            continue;
        };

        let mut best: Option<(Fixed, usize, EntityId)> = None;
        for body in bodies {
            if !body.alive || !body.damageable || !body.team.is_hostile_to(team) {
                continue;
            }
            let reach = body.radius + projectile_radius();
            if let Some(t) = segment_entry(projectile.previous, end, body.position, reach) {
                let candidate = (t, body.order, body.id);
                let better = match best {
                    None => true,
                    Some((t_best, order_best, _)) => (t, body.order) < (t_best, order_best),
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        if let Some((_, _, target)) = best {
            hits.push(ProjectileHit {
                projectile: id,
                target,
            });
        }
    }
    hits
}

/// Fraction along `start -> end` where the segment first touches the
/// circle, or `None` if it misses.
fn segment_entry(start: Vec2Fixed, end: Vec2Fixed, center: Vec2Fixed, radius: Fixed) -> Option<Fixed> {
    let f = start - center;
    let c = f.dot(f) - radius * radius;
    if c <= Fixed::ZERO {
        return Some(Fixed::ZERO);
    }
    let d = end - start;
    let a = d.dot(d);
    if a == Fixed::ZERO {
        return None;
    }
    let b = f.dot(d) * Fixed::from_num(2);
    let discriminant = b * b - Fixed::from_num(4) * a * c;
    if discriminant < Fixed::ZERO {
        return None;
    }
    let t = (-b - fixed_sqrt(discriminant)) / (Fixed::from_num(2) * a);
    (t >= Fixed::ZERO && t <= Fixed::ONE).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Archetype, Health, Movement, Position, Projectile};
    use crate::weapon::{Weapon, WeaponKind, WeaponStats};
    use crate::world::Entity;

    fn body(entities: &mut EntityStorage, team: Team, x: i32, y: i32) -> EntityId {
        let mut e = Entity::new(Archetype::Infantry);
        e.team = Some(team);
        e.position = Some(Position::new(Vec2Fixed::from_num(x, y)));
        e.radius = ratio(1, 2);
        e.health = Some(Health::new(100));
        e.movement = Some(Movement::new(Fixed::from_num(3), Fixed::ZERO));
        entities.insert(e)
    }

    fn arm(entities: &mut EntityStorage, id: EntityId, range: i32) {
        let stats = WeaponStats {
            damage: 10,
            cooldown: Fixed::ONE,
            range: Fixed::from_num(range),
            knockback: Fixed::ZERO,
            max_targets: 1,
            projectile_speed: Fixed::ZERO,
        };
        if let Some(e) = entities.get_mut(id) {
            e.weapons.push(Weapon::new(WeaponKind::Sword, stats));
        }
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut collision = CollisionSystem::new();
        collision.add_entity(4);
        collision.add_entity(4);
        assert_eq!(collision.registered, vec![4]);
    }

    #[test]
    fn test_overlapping_units_are_pushed_apart() {
        let mut entities = EntityStorage::new();
        let a = body(&mut entities, Team::Player, 10, 10);
        let b = body(&mut entities, Team::Player, 10, 10);
        let mut collision = CollisionSystem::new();
        collision.add_entity(a);
        collision.add_entity(b);

        collision.update(&mut entities);

        let pa = entities.get(a).unwrap().pos().unwrap();
        let pb = entities.get(b).unwrap().pos().unwrap();
        assert!(pa.x < pb.x);
        let epsilon = ratio(1, 1000);
        assert!((pa.distance(pb) - Fixed::ONE).abs() < epsilon);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut entities = EntityStorage::new();
        let building = body(&mut entities, Team::Enemy, 10, 10);
        if let Some(e) = entities.get_mut(building) {
            e.movement = None;
            e.radius = Fixed::from_num(3);
        }
        let unit = body(&mut entities, Team::Player, 12, 10);
        let mut collision = CollisionSystem::new();
        collision.add_entity(building);
        collision.add_entity(unit);

        collision.update(&mut entities);

        assert_eq!(entities.get(building).unwrap().pos().unwrap(), Vec2Fixed::from_num(10, 10));
        let unit_x = entities.get(unit).unwrap().pos().unwrap().x;
        let epsilon = ratio(1, 1000);
        assert!((unit_x - ratio(27, 2)).abs() < epsilon, "{unit_x}");
    }

    #[test]
    fn test_proximity_lists_hostiles_in_registration_order() {
        let mut entities = EntityStorage::new();
        let attacker = body(&mut entities, Team::Player, 0, 0);
        arm(&mut entities, attacker, 5);
        let far = body(&mut entities, Team::Enemy, 20, 0);
        let second = body(&mut entities, Team::Enemy, 4, 0);
        let friend = body(&mut entities, Team::Player, 0, 3);
        let first = body(&mut entities, Team::Enemy, 0, -3);

        let mut collision = CollisionSystem::new();
        for id in [attacker, far, second, friend, first] {
            collision.add_entity(id);
        }
        let report = collision.update(&mut entities);

        let ids: Vec<_> = report.targets_for(attacker).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(report.targets_for(far).is_empty());
    }

    #[test]
    fn test_inactive_entities_are_pruned() {
        let mut entities = EntityStorage::new();
        let a = body(&mut entities, Team::Player, 0, 0);
        let b = body(&mut entities, Team::Enemy, 1, 0);
        let mut collision = CollisionSystem::new();
        collision.add_entity(a);
        collision.add_entity(b);
        if let Some(e) = entities.get_mut(b) {
            e.active = false;
        }
        collision.update(&mut entities);
        assert_eq!(collision.registered, vec![a]);
    }

    #[test]
    fn test_malformed_body_is_skipped() {
        let mut entities = EntityStorage::new();
        let attacker = body(&mut entities, Team::Player, 0, 0);
        arm(&mut entities, attacker, 5);
        let broken = body(&mut entities, Team::Enemy, 1, 0);
        if let Some(e) = entities.get_mut(broken) {
            e.position = None;
        }
        let mut collision = CollisionSystem::new();
        collision.add_entity(attacker);
        collision.add_entity(broken);

        let report = collision.update(&mut entities);
        assert!(report.targets_for(attacker).is_empty());
    }

    #[test]
    fn test_arrow_hits_first_body_on_path() {
        let mut entities = EntityStorage::new();
        let near = body(&mut entities, Team::Enemy, 6, 0);
        let nearer = body(&mut entities, Team::Enemy, 3, 0);
        let mut arrow = Entity::new(Archetype::Projectile);
        arrow.team = Some(Team::Player);
        arrow.position = Some(Position::new(Vec2Fixed::from_num(8, 0)));
        arrow.projectile = Some(Projectile {
            source: 99,
            damage: 5,
            knockback: Fixed::ZERO,
            direction: Vec2Fixed::UNIT_X,
            speed: Fixed::from_num(20),
            travelled: Fixed::ZERO,
            max_distance: Fixed::from_num(30),
            previous: Vec2Fixed::ZERO,
        });
        let arrow = entities.insert(arrow);

        let mut collision = CollisionSystem::new();
        collision.add_entity(near);
        collision.add_entity(nearer);
        let report = collision.update(&mut entities);

        assert_eq!(
            report.projectile_hits,
            vec![ProjectileHit {
                projectile: arrow,
                target: nearer
            }]
        );
    }

    #[test]
    fn test_segment_miss() {
        let hit = segment_entry(
            Vec2Fixed::ZERO,
            Vec2Fixed::from_num(10, 0),
            Vec2Fixed::from_num(5, 3),
            Fixed::ONE,
        );
        assert!(hit.is_none());
    }
}
