//! Entity records, their storage and the map boundary.
//!
//! # Determinism
//!
//! Storage is a `HashMap` for O(1) lookup; every system iterates through
//! [`EntityStorage::sorted_ids`] so processing order is registration order.

use std::collections::HashMap;

use crate::ai::AiState;
use crate::components::{Archetype, EntityId, Health, Movement, Position, Projectile};
use crate::economy::Coin;
use crate::math::{Fixed, Vec2Fixed};
use crate::spawner::Spawner;
use crate::team::Team;
use crate::weapon::Weapon;

/// An entity with optional components.
///
/// Entities are composed of optional components. Only components that are
/// `Some` are active for this entity; the [`Archetype`] tag selects tuning
/// constants and AI behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// What kind of thing this is.
    pub archetype: Archetype,
    /// Side the entity fights for. Fixed at creation.
    pub team: Option<Team>,
    /// World position.
    pub position: Option<Position>,
    /// Unit-length facing, for rendering and AI.
    pub facing: Vec2Fixed,
    /// Body radius in meters.
    pub radius: Fixed,
    /// Health for damageable entities.
    pub health: Option<Health>,
    /// Movement for mobile entities.
    pub movement: Option<Movement>,
    /// Weapons owned by this entity, in equip order.
    pub weapons: Vec<Weapon>,
    /// AI behavior state.
    pub ai: Option<AiState>,
    /// Wave spawner for buildings.
    pub spawner: Option<Spawner>,
    /// Flight data for arrows.
    pub projectile: Option<Projectile>,
    /// Pickup state for coins.
    pub coin: Option<Coin>,
    /// Inactive entities are skipped by every system and swept at tick end.
    pub active: bool,
}

impl Entity {
    /// Create a new active entity with no components.
    #[must_use]
    pub fn new(archetype: Archetype) -> Self {
        Self {
            id: 0,
            archetype,
            team: None,
            position: None,
            facing: Vec2Fixed::UNIT_X,
            radius: Fixed::ZERO,
            health: None,
            movement: None,
            weapons: Vec::new(),
            ai: None,
            spawner: None,
            projectile: None,
            coin: None,
            active: true,
        }
    }

    /// World position, if the entity has one.
    #[must_use]
    pub fn pos(&self) -> Option<Vec2Fixed> {
        self.position.map(|p| p.value)
    }

    /// Active and, if it has health, not dead.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.active && !self.health.is_some_and(|h| h.is_dead())
    }

    /// Whether this entity can be hit by `team`'s attacks.
    #[must_use]
    pub fn is_target_for(&self, team: Team) -> bool {
        self.is_alive()
            && self.archetype.is_combatant()
            && self.health.is_some()
            && self.position.is_some()
            && self.team.is_some_and(|t| t.is_hostile_to(team))
    }

    /// Longest reach over all weapons.
    #[must_use]
    pub fn max_weapon_range(&self) -> Fixed {
        self.weapons
            .iter()
            .map(|w| w.stats.range)
            .max()
            .unwrap_or(Fixed::ZERO)
    }

    /// Knockback multiplier from the current AI state.
    #[must_use]
    pub fn knockback_multiplier(&self) -> Fixed {
        self.ai.as_ref().map_or(Fixed::ONE, AiState::knockback_multiplier)
    }
}

/// Storage for all entities in a session.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    entities: HashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Remove inactive entities, keeping those `keep` accepts.
    ///
    /// Returns the removed ids in ascending order.
    pub fn sweep(&mut self, keep: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        let mut removed: Vec<_> = self
            .entities
            .values()
            .filter(|e| !e.active && !keep(e))
            .map(|e| e.id)
            .collect();
        removed.sort_unstable();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }
}

/// The playable area.
///
/// The map owns boundary enforcement; systems never clamp positions
/// themselves.
pub trait MapBounds {
    /// Pull `point` back inside the map.
    fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed;

    /// Whether `point` lies inside the map.
    fn contains(&self, point: Vec2Fixed) -> bool {
        self.clamp(point) == point
    }
}

/// Axis-aligned rectangular map anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectBounds {
    /// Map width in meters.
    pub width: Fixed,
    /// Map height in meters.
    pub height: Fixed,
}

impl RectBounds {
    /// Create bounds of the given size.
    #[must_use]
    pub const fn new(width: Fixed, height: Fixed) -> Self {
        Self { width, height }
    }
}

impl MapBounds for RectBounds {
    fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            point.x.clamp(Fixed::ZERO, self.width),
            point.y.clamp(Fixed::ZERO, self.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut storage = EntityStorage::new();
        let a = storage.insert(Entity::new(Archetype::Infantry));
        let b = storage.insert(Entity::new(Archetype::Archer));
        assert_eq!((a, b), (1, 2));
        assert_eq!(storage.sorted_ids(), vec![1, 2]);
        assert_eq!(storage.get(b).map(|e| e.archetype), Some(Archetype::Archer));
    }

    #[test]
    fn test_default_storage_starts_at_one() {
        let mut storage = EntityStorage::default();
        assert_eq!(storage.insert(Entity::new(Archetype::Coin)), 1);
    }

    #[test]
    fn test_sweep_keeps_requested() {
        let mut storage = EntityStorage::new();
        let unit = storage.insert(Entity::new(Archetype::Infantry));
        let building = storage.insert(Entity::new(Archetype::Building));
        let live = storage.insert(Entity::new(Archetype::Archer));
        for id in [unit, building] {
            if let Some(e) = storage.get_mut(id) {
                e.active = false;
            }
        }
        let removed = storage.sweep(|e| e.archetype == Archetype::Building);
        assert_eq!(removed, vec![unit]);
        assert!(storage.contains(building));
        assert!(storage.contains(live));
    }

    #[test]
    fn test_target_requires_hostile_team() {
        let mut e = Entity::new(Archetype::Infantry);
        e.team = Some(Team::Enemy);
        e.position = Some(Position::ORIGIN);
        e.health = Some(Health::new(10));
        assert!(e.is_target_for(Team::Player));
        assert!(!e.is_target_for(Team::Enemy));

        e.health = Some(Health { current: 0, max: 10 });
        assert!(!e.is_target_for(Team::Player));
    }

    #[test]
    fn test_rect_bounds_clamp() {
        let bounds = RectBounds::new(Fixed::from_num(100), Fixed::from_num(40));
        let clamped = bounds.clamp(Vec2Fixed::from_num(-3, 55));
        assert_eq!(clamped, Vec2Fixed::from_num(0, 40));
        assert!(bounds.contains(Vec2Fixed::from_num(50, 20)));
        assert!(!bounds.contains(Vec2Fixed::from_num(101, 20)));
    }
}
