//! Scripted hero pilots for headless playtesting.
//!
//! A pilot stands in for the player: each tick it reads the session's
//! views and returns a movement direction, and when an upgrade is offered
//! it picks a weapon by preference.

use std::str::FromStr;

use battle_core::math::{Fixed, Vec2Fixed};
use battle_core::progression::UpgradeOffer;
use battle_core::session::{PlayerInput, Session};
use battle_core::team::Team;
use battle_core::view::{BuildingView, MinimapView};
use battle_core::weapon::WeaponKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for pilot lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PilotError {
    /// No preset with that name.
    #[error("Unknown pilot '{0}', expected one of: idle, defender, raider, skirmisher")]
    Unknown(String),
}

/// How the pilot moves the hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behaviour {
    /// Never moves.
    Idle,
    /// Guards the home base, chasing enemies that come close to it.
    Defend,
    /// Walks straight to the enemy base and hits it.
    Raid,
    /// Engages nearby enemies, otherwise pushes toward the enemy base.
    Skirmish,
}

/// A scripted player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pilot {
    /// Preset name.
    pub name: String,
    /// Movement behaviour.
    pub behaviour: Behaviour,
    /// Upgrade choices, most wanted first.
    pub upgrade_preference: Vec<WeaponKind>,
}

fn guard_radius() -> Fixed {
    Fixed::from_num(20)
}

fn engage_radius() -> Fixed {
    Fixed::from_num(12)
}

/// Stop this close to a target's edge.
fn stand_off() -> Fixed {
    Fixed::ONE
}

impl Pilot {
    /// Stands still all match.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            behaviour: Behaviour::Idle,
            upgrade_preference: vec![WeaponKind::Sword, WeaponKind::Bow, WeaponKind::Lance],
        }
    }

    /// Holds the line in front of the home base.
    #[must_use]
    pub fn defender() -> Self {
        Self {
            name: "defender".to_string(),
            behaviour: Behaviour::Defend,
            upgrade_preference: vec![WeaponKind::Bow, WeaponKind::Sword, WeaponKind::Lance],
        }
    }

    /// Ignores the armies and goes for the enemy base.
    #[must_use]
    pub fn raider() -> Self {
        Self {
            name: "raider".to_string(),
            behaviour: Behaviour::Raid,
            upgrade_preference: vec![WeaponKind::Lance, WeaponKind::Sword, WeaponKind::Bow],
        }
    }

    /// Fights whatever is near, then pushes on.
    #[must_use]
    pub fn skirmisher() -> Self {
        Self {
            name: "skirmisher".to_string(),
            behaviour: Behaviour::Skirmish,
            upgrade_preference: vec![WeaponKind::Sword, WeaponKind::Lance, WeaponKind::Bow],
        }
    }

    /// Every preset.
    #[must_use]
    pub fn presets() -> Vec<Self> {
        vec![Self::idle(), Self::defender(), Self::raider(), Self::skirmisher()]
    }

    /// Input for the coming tick.
    #[must_use]
    pub fn steer(&self, session: &Session) -> PlayerInput {
        let map = session.minimap();
        let Some((_, hero)) = map.hero else {
            return PlayerInput::default();
        };
        let buildings = session.building_views();
        let base = |team: Team| buildings.iter().find(|b| b.team == team);

        let target = match self.behaviour {
            Behaviour::Idle => None,
            Behaviour::Raid => base(Team::Enemy).map(approach_building),
            Behaviour::Defend => base(Team::Player).map(|home| {
                let post = Vec2Fixed::new(home.radius * Fixed::from_num(2), Fixed::ZERO);
                nearest_enemy(&map, home.position, guard_radius())
                    .unwrap_or(home.position + post)
            }),
            Behaviour::Skirmish => nearest_enemy(&map, hero, engage_radius())
                .or_else(|| base(Team::Enemy).map(approach_building)),
        };

        let direction = match target {
            Some(target) if hero.distance(target) > stand_off() => target - hero,
            _ => Vec2Fixed::ZERO,
        };
        PlayerInput { direction }
    }

    /// Pick from an offer; falls back to the first option.
    #[must_use]
    pub fn choose(&self, offer: &UpgradeOffer) -> Option<WeaponKind> {
        self.upgrade_preference
            .iter()
            .copied()
            .find(|kind| offer.options.contains(kind))
            .or_else(|| offer.options.first().copied())
    }
}

impl FromStr for Pilot {
    type Err = PilotError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::presets()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PilotError::Unknown(name.to_string()))
    }
}

/// The point just short of a building's near edge, on its left side.
fn approach_building(building: &BuildingView) -> Vec2Fixed {
    building.position - Vec2Fixed::new(building.radius, Fixed::ZERO)
}

fn nearest_enemy(map: &MinimapView, around: Vec2Fixed, radius: Fixed) -> Option<Vec2Fixed> {
    let limit = radius * radius;
    map.units
        .iter()
        .filter(|u| u.team == Team::Enemy)
        .map(|u| (u.position.distance_squared(around), u.position))
        .filter(|(d, _)| *d <= limit)
        .min_by_key(|(d, _)| *d)
        .map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::data::GameConfig;
    use battle_test_utils::fixtures::{quiet_config, started_session};

    #[test]
    fn test_presets_parse_by_name() {
        for preset in Pilot::presets() {
            assert_eq!(preset.name.parse::<Pilot>().unwrap(), preset);
        }
        assert_eq!(
            "berserker".parse::<Pilot>(),
            Err(PilotError::Unknown("berserker".to_string()))
        );
    }

    #[test]
    fn test_raider_heads_for_enemy_base() {
        let session = started_session(quiet_config(), None);
        let input = Pilot::raider().steer(&session);
        assert!(input.direction.x > Fixed::ZERO);
    }

    #[test]
    fn test_idle_never_moves() {
        let session = started_session(GameConfig::default(), None);
        assert!(Pilot::idle().steer(&session).direction.is_zero());
    }

    #[test]
    fn test_choice_follows_preference() {
        let offer = UpgradeOffer {
            threshold: 10,
            options: vec![WeaponKind::Bow, WeaponKind::Lance],
        };
        assert_eq!(Pilot::raider().choose(&offer), Some(WeaponKind::Lance));
        assert_eq!(Pilot::defender().choose(&offer), Some(WeaponKind::Bow));

        let mut pilot = Pilot::idle();
        pilot.upgrade_preference.clear();
        assert_eq!(pilot.choose(&offer), Some(WeaponKind::Bow));
    }
}
