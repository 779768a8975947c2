//! Entity factories.
//!
//! Each function assembles the component set for one kind of entity.
//! Registration with the systems is left to the caller.

use crate::ai::AiState;
use crate::collision::projectile_radius;
use crate::components::{Archetype, EntityId, Health, Position, Projectile, UnitKind};
use crate::data::{BuildingConfig, MountStats, UnitStats};
use crate::economy::{coin_radius, Coin};
use crate::math::{Fixed, Vec2Fixed};
use crate::spawner::Spawner;
use crate::team::Team;
use crate::weapon::{Weapon, WeaponKind, WeaponStats};
use crate::world::Entity;

/// Facing for a freshly placed entity of `team`.
fn initial_facing(team: Team) -> Vec2Fixed {
    Vec2Fixed::UNIT_X.scale(Fixed::from_num(team.advance_sign()))
}

/// A team's base with its wave spawner.
#[must_use]
pub fn building(team: Team, config: &BuildingConfig, spawner: Spawner) -> Entity {
    let mut entity = Entity::new(Archetype::Building);
    entity.team = Some(team);
    entity.position = Some(Position::new(config.position));
    entity.facing = initial_facing(team);
    entity.radius = config.radius;
    entity.health = Some(Health::new(config.health));
    entity.spawner = Some(spawner);
    entity
}

fn character(
    archetype: Archetype,
    team: Team,
    position: Vec2Fixed,
    stats: &UnitStats,
    mount: &MountStats,
) -> Entity {
    let mut entity = Entity::new(archetype);
    entity.team = Some(team);
    entity.position = Some(Position::new(position));
    entity.facing = initial_facing(team);
    entity.radius = stats.radius;
    entity.health = Some(Health::new(stats.health));
    entity.movement = Some(stats.movement(mount));
    entity
}

/// An AI-driven soldier armed with its kind's weapon.
///
/// `stats` should already carry any difficulty scaling.
#[must_use]
pub fn soldier(
    kind: UnitKind,
    team: Team,
    position: Vec2Fixed,
    stats: &UnitStats,
    mount: &MountStats,
    weapon: WeaponStats,
) -> Entity {
    let mut entity = character(kind.archetype(), team, position, stats, mount);
    entity.weapons.push(Weapon::new(kind.weapon(), weapon));
    entity.ai = Some(AiState::default());
    entity
}

/// The player's hero, steered by input rather than AI.
#[must_use]
pub fn hero(
    position: Vec2Fixed,
    stats: &UnitStats,
    mount: &MountStats,
    weapon_kind: WeaponKind,
    weapon: WeaponStats,
) -> Entity {
    let mut entity = character(Archetype::Player, Team::Player, position, stats, mount);
    entity.weapons.push(Weapon::new(weapon_kind, weapon));
    entity
}

/// An arrow loosed by `source` from `from` along the unit vector `direction`.
#[must_use]
pub fn arrow(
    source: EntityId,
    team: Team,
    from: Vec2Fixed,
    direction: Vec2Fixed,
    bow: &WeaponStats,
) -> Entity {
    let mut entity = Entity::new(Archetype::Projectile);
    entity.team = Some(team);
    entity.position = Some(Position::new(from));
    entity.facing = direction;
    entity.radius = projectile_radius();
    entity.projectile = Some(Projectile {
        source,
        damage: bow.damage,
        knockback: bow.knockback,
        direction,
        speed: bow.projectile_speed,
        travelled: Fixed::ZERO,
        max_distance: Projectile::flight_distance(bow.range),
        previous: from,
    });
    entity
}

/// A coin hopping out of a body at `at`.
#[must_use]
pub fn coin(at: Vec2Fixed, seed: u64) -> Entity {
    let mut entity = Entity::new(Archetype::Coin);
    entity.position = Some(Position::new(at));
    entity.radius = coin_radius();
    entity.coin = Some(Coin::new(seed, at.y));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameConfig;
    use crate::economy::CoinState;
    use crate::math::ratio;

    #[test]
    fn test_soldier_carries_kind_weapon_and_ai() {
        let config = GameConfig::default();
        let entity = soldier(
            UnitKind::Cavalry,
            Team::Enemy,
            Vec2Fixed::from_num(50, 20),
            &config.characters.cavalry,
            &config.mount,
            config.weapons.lance,
        );
        assert_eq!(entity.archetype, Archetype::Cavalry);
        assert_eq!(entity.weapons.len(), 1);
        assert_eq!(entity.weapons[0].kind, WeaponKind::Lance);
        assert!(entity.ai.is_some());
        assert_eq!(entity.movement.map(|m| m.max_speed), Some(config.mount.speed));
        assert_eq!(entity.facing, -Vec2Fixed::UNIT_X);
    }

    #[test]
    fn test_hero_has_no_ai() {
        let config = GameConfig::default();
        let entity = hero(
            Vec2Fixed::from_num(17, 20),
            &config.characters.player,
            &config.mount,
            WeaponKind::Sword,
            config.weapons.sword,
        );
        assert_eq!(entity.team, Some(Team::Player));
        assert!(entity.ai.is_none());
        assert_eq!(entity.health.map(|h| h.max), Some(config.characters.player.health));
    }

    #[test]
    fn test_arrow_flight_budget() {
        let bow = GameConfig::default().weapons.bow;
        let entity = arrow(4, Team::Player, Vec2Fixed::from_num(1, 1), Vec2Fixed::UNIT_X, &bow);
        let projectile = entity.projectile.unwrap();
        assert_eq!(projectile.source, 4);
        assert_eq!(projectile.max_distance, bow.range * ratio(3, 2));
        assert_eq!(projectile.previous, Vec2Fixed::from_num(1, 1));
    }

    #[test]
    fn test_coin_rests_at_drop_height() {
        let entity = coin(Vec2Fixed::from_num(3, 7), 11);
        let coin = entity.coin.unwrap();
        assert_eq!(coin.state, CoinState::Spawn);
        assert_eq!(coin.rest_y, Fixed::from_num(7));
        assert!(entity.team.is_none());
    }
}
