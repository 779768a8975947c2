//! Self-driven entity updates: walking, riding and arrow flight.

use crate::components::EntityId;
use crate::math::Fixed;
use crate::world::{EntityStorage, MapBounds};

/// Integrate movement and arrow flight for every active entity.
///
/// Mobile entities are clamped to the map afterwards. An arrow that has
/// used up its flight distance, or left the map, is deactivated at the
/// start of the following tick so its final segment is still hit-tested.
///
/// Returns the ids of arrows that expired without hitting anything.
pub fn motion_system(entities: &mut EntityStorage, bounds: &dyn MapBounds, dt: Fixed) -> Vec<EntityId> {
    let mut expired = Vec::new();

    for id in entities.sorted_ids() {
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        if !entity.active {
            continue;
        }
        let Some(position) = entity.position.as_mut() else {
            continue;
        };

        if let Some(projectile) = entity.projectile.as_mut() {
            if projectile.is_spent() || !bounds.contains(position.value) {
                entity.active = false;
                expired.push(id);
                continue;
            }
            let step = projectile.speed * dt;
            projectile.previous = position.value;
            position.value += projectile.direction.scale(step);
            projectile.travelled += step;
            continue;
        }

        if let Some(movement) = entity.movement.as_mut() {
            let displacement = movement.integrate(dt);
            position.value = bounds.clamp(position.value + displacement);
            if !movement.desired.is_zero() {
                entity.facing = movement.desired;
            }
        }
    }

    expired
}
