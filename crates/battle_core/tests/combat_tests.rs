//! Collision, combat and motion working together on hand-built arenas.

use battle_core::collision::CollisionSystem;
use battle_core::combat::{CombatEvent, CombatSystem};
use battle_core::components::{Archetype, EntityId, Health, Movement, Position};
use battle_core::economy::CoinDrops;
use battle_core::math::{ratio, Fixed, Vec2Fixed};
use battle_core::motion::motion_system;
use battle_core::team::Team;
use battle_core::weapon::{Weapon, WeaponKind, WeaponStats};
use battle_core::world::{Entity, EntityStorage, RectBounds};
use battle_test_utils::determinism::strategies::{arb_damage, arb_health, arb_weapon_range};
use battle_test_utils::fixtures::{fixed, frame};
use proptest::prelude::*;

fn sword(damage: u32, range: Fixed, max_targets: u32) -> WeaponStats {
    WeaponStats {
        damage,
        cooldown: ratio(1, 2),
        range,
        knockback: Fixed::ZERO,
        max_targets,
        projectile_speed: Fixed::ZERO,
    }
}

struct Arena {
    entities: EntityStorage,
    collision: CollisionSystem,
    combat: CombatSystem,
    bounds: RectBounds,
    drops: CoinDrops,
}

impl Arena {
    fn new() -> Self {
        Self {
            entities: EntityStorage::new(),
            collision: CollisionSystem::new(),
            combat: CombatSystem::new(),
            bounds: RectBounds::new(fixed(200), fixed(200)),
            drops: CoinDrops::default(),
        }
    }

    fn add(&mut self, team: Team, at: Vec2Fixed, health: u32, weapon: Option<(WeaponKind, WeaponStats)>) -> EntityId {
        let mut e = Entity::new(Archetype::Infantry);
        e.team = Some(team);
        e.position = Some(Position::new(at));
        e.radius = ratio(1, 2);
        e.health = Some(Health::new(health));
        e.movement = Some(Movement::new(fixed(3), Fixed::ZERO));
        if let Some((kind, stats)) = weapon {
            e.weapons.push(Weapon::new(kind, stats));
        }
        let id = self.entities.insert(e);
        self.collision.add_entity(id);
        self.combat.add_entity(id);
        id
    }

    fn step(&mut self) -> Vec<CombatEvent> {
        motion_system(&mut self.entities, &self.bounds, frame());
        let report = self.collision.update(&mut self.entities);
        self.combat
            .update(&mut self.entities, &report, frame(), &mut self.drops)
    }

    fn health(&self, id: EntityId) -> u32 {
        self.entities.get(id).and_then(|e| e.health).map_or(0, |h| h.current)
    }
}

fn first_targets(events: &[CombatEvent]) -> Option<Vec<EntityId>> {
    events.iter().find_map(|e| match e {
        CombatEvent::AttackStarted { targets, .. } => Some(targets.clone()),
        _ => None,
    })
}

#[test]
fn test_single_target_prefers_nearest() {
    let mut arena = Arena::new();
    let hero = arena.add(
        Team::Player,
        Vec2Fixed::from_num(50, 50),
        100,
        Some((WeaponKind::Lance, sword(10, fixed(4), 1))),
    );
    let _far = arena.add(Team::Enemy, Vec2Fixed::from_num(53, 50), 100, None);
    let near = arena.add(Team::Enemy, Vec2Fixed::from_num(50, 48), 100, None);

    let events = arena.step();
    assert_eq!(first_targets(&events), Some(vec![near]));
    assert!(matches!(
        events.first(),
        Some(CombatEvent::AttackStarted { attacker, .. }) if *attacker == hero
    ));
}

#[test]
fn test_equidistant_targets_break_ties_by_registration() {
    for _ in 0..5 {
        let mut arena = Arena::new();
        arena.add(
            Team::Player,
            Vec2Fixed::from_num(50, 50),
            100,
            Some((WeaponKind::Sword, sword(10, fixed(4), 1))),
        );
        let first = arena.add(Team::Enemy, Vec2Fixed::from_num(52, 50), 100, None);
        let second = arena.add(Team::Enemy, Vec2Fixed::from_num(48, 50), 100, None);

        arena.step();
        assert_eq!(arena.health(first), 90);
        assert_eq!(arena.health(second), 100);
    }
}

#[test]
fn test_overkill_dies_once() {
    let mut arena = Arena::new();
    for x in [48, 52] {
        arena.add(
            Team::Player,
            Vec2Fixed::from_num(x, 50),
            100,
            Some((WeaponKind::Sword, sword(80, fixed(3), 3))),
        );
    }
    let victim = arena.add(Team::Enemy, Vec2Fixed::from_num(50, 50), 100, None);

    let mut kills = 0;
    for _ in 0..20 {
        kills += arena
            .step()
            .iter()
            .filter(|e| matches!(e, CombatEvent::Killed { victim: v, .. } if *v == victim))
            .count();
    }
    assert_eq!(kills, 1);
    assert_eq!(arena.drops.drops.len(), 1);
    assert_eq!(arena.health(victim), 0);
}

#[test]
fn test_arrow_flies_and_hits() {
    let mut arena = Arena::new();
    let bow = WeaponStats {
        damage: 15,
        cooldown: ratio(3, 2),
        range: fixed(14),
        knockback: Fixed::ZERO,
        max_targets: 1,
        projectile_speed: fixed(25),
    };
    let archer = arena.add(Team::Player, Vec2Fixed::from_num(10, 10), 70, Some((WeaponKind::Bow, bow)));
    let target = arena.add(Team::Enemy, Vec2Fixed::from_num(18, 10), 100, None);

    let mut hit_from = None;
    for _ in 0..20 {
        for event in arena.step() {
            if let CombatEvent::DamageDealt { attacker, target: t, damage } = event {
                assert_eq!(t, target);
                assert_eq!(damage, 15);
                hit_from = Some(attacker);
            }
        }
    }
    assert_eq!(hit_from, Some(archer));
    assert_eq!(arena.health(target), 85);
    let arrows_in_flight = arena
        .entities
        .iter()
        .filter(|e| e.archetype == Archetype::Projectile && e.active)
        .count();
    assert_eq!(arrows_in_flight, 0);
}

#[test]
fn test_friendly_units_are_never_targets() {
    let mut arena = Arena::new();
    arena.add(
        Team::Player,
        Vec2Fixed::from_num(50, 50),
        100,
        Some((WeaponKind::Sword, sword(10, fixed(4), 3))),
    );
    let ally = arena.add(Team::Player, Vec2Fixed::from_num(52, 50), 100, None);

    for _ in 0..10 {
        assert!(arena.step().is_empty());
    }
    assert_eq!(arena.health(ally), 100);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Health never rises and never leaves `[0, max]`.
    #[test]
    fn prop_health_is_monotonic(
        damage in arb_damage(),
        range in arb_weapon_range(),
        health in arb_health(),
        offsets in proptest::collection::vec((-6i32..=6, -6i32..=6), 1..6),
    ) {
        let mut arena = Arena::new();
        let mut ids = Vec::new();
        for (i, (dx, dy)) in offsets.iter().enumerate() {
            let team = if i % 2 == 0 { Team::Player } else { Team::Enemy };
            let at = Vec2Fixed::from_num(100 + dx * 2, 100 + dy * 2);
            ids.push(arena.add(team, at, health, Some((WeaponKind::Sword, sword(damage, range, 2)))));
        }

        let mut last: Vec<u32> = ids.iter().map(|id| arena.health(*id)).collect();
        for _ in 0..40 {
            arena.step();
            for (i, id) in ids.iter().enumerate() {
                let now = arena.health(*id);
                prop_assert!(now <= last[i]);
                prop_assert!(now <= health);
                last[i] = now;
            }
        }
    }

    /// Whichever single target is chosen has the smallest gap.
    #[test]
    fn prop_single_target_is_nearest(
        offsets in proptest::collection::btree_set((1i32..=5, -5i32..=5), 1..6),
    ) {
        let mut arena = Arena::new();
        let origin = Vec2Fixed::from_num(100, 100);
        arena.add(Team::Player, origin, 100, Some((WeaponKind::Sword, sword(1, fixed(40), 1))));
        let mut enemies = Vec::new();
        for (dx, dy) in &offsets {
            // Three metres apart, so separation never moves anyone.
            let at = Vec2Fixed::from_num(100 + dx * 3, 100 + dy * 3);
            enemies.push(arena.add(Team::Enemy, at, 100, None));
        }

        let events = arena.step();
        let targets = first_targets(&events).unwrap_or_default();
        prop_assert_eq!(targets.len(), 1);
        let distance = |id: EntityId| {
            arena.entities.get(id).and_then(|e| e.pos()).map(|p| p.distance_squared(origin))
        };
        let chosen = distance(targets[0]);
        for id in &enemies {
            prop_assert!(chosen <= distance(*id));
        }
    }
}
