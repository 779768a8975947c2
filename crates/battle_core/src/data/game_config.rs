//! The complete battle configuration snapshot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::building_data::{BuildingConfig, InitialUnit, SpawnComposition, TeamBuildings};
use super::hero_data::HeroConfig;
use super::unit_data::{CharacterRoster, MountStats, UnitStats};
use super::weapon_data::{validate_weapon, WeaponRoster};
use crate::components::UnitKind;
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, option_fixed_decimal_serde, ratio, Fixed, Vec2Fixed};
use crate::weapon::{WeaponKind, WeaponStats};

/// Everything a session needs to know about the battle.
///
/// A session takes an immutable copy at construction; changing a config
/// never affects a running session.
///
/// # Example RON
///
/// ```ron
/// GameConfig(
///     world: (width: 160.0, height: 40.0),
///     characters: (player: (...), infantry: (...), archer: (...), cavalry: (...)),
///     weapons: (sword: (...), bow: (...), lance: (...)),
///     mount: (speed: 7.0, acceleration: 14.0),
///     buildings: (player: (...), enemy: (...)),
///     spawn: (infantry: 4, archer: 2, cavalry: 1),
///     initial_enemies: [(kind: Cavalry, offset: (x: -8.0, y: 0.0))],
///     hero_offset: (x: 5.0, y: 0.0),
///     heroes: [],
///     upgrade_thresholds: [10, 50],
///     difficulty: (),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Map extent.
    pub world: WorldConfig,

    /// Character stat blocks.
    pub characters: CharacterRoster,

    /// Weapon stat blocks.
    pub weapons: WeaponRoster,

    /// Default mount for every mounted character.
    pub mount: MountStats,

    /// The two bases.
    pub buildings: TeamBuildings,

    /// Base wave composition, before difficulty scaling.
    pub spawn: SpawnComposition,

    /// Enemy units present at session start.
    #[serde(default)]
    pub initial_enemies: Vec<InitialUnit>,

    /// Hero spawn offset from the player building.
    #[serde(default = "default_hero_offset")]
    pub hero_offset: Vec2Fixed,

    /// Selectable heroes. Empty means no selection step.
    #[serde(default)]
    pub heroes: Vec<HeroConfig>,

    /// Coin totals that each trigger one upgrade offer, ascending.
    #[serde(default = "default_upgrade_thresholds")]
    pub upgrade_thresholds: Vec<u32>,

    /// Enemy scaling per level.
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

fn default_hero_offset() -> Vec2Fixed {
    Vec2Fixed::from_num(5, 0)
}

fn default_upgrade_thresholds() -> Vec<u32> {
    vec![10, 50]
}

/// Map extent; positions are clamped to `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Map width in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub width: Fixed,
    /// Map height in meters.
    #[serde(with = "fixed_decimal_serde")]
    pub height: Fixed,
}

/// How the enemy side scales with the session level.
///
/// Every multiplier is `1 + (level - 1) * step`, so level 1 is the base
/// game and higher levels never get easier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Added to the enemy health multiplier per level.
    #[serde(with = "fixed_decimal_serde")]
    pub health_step: Fixed,

    /// Added to the enemy wave-size multiplier per level.
    #[serde(with = "fixed_decimal_serde")]
    pub count_step: Fixed,

    /// Level-independent multiplier on the enemy spawn interval.
    #[serde(with = "fixed_decimal_serde")]
    pub enemy_spawn_interval_multiplier: Fixed,

    /// Replaces the enemy building's first spawn time when set.
    #[serde(with = "option_fixed_decimal_serde")]
    pub enemy_first_spawn_time: Option<Fixed>,

    /// Removed from the enemy cadence multiplier per level.
    #[serde(with = "fixed_decimal_serde")]
    pub cadence_step: Fixed,

    /// Floor for the per-level cadence multiplier.
    #[serde(with = "fixed_decimal_serde")]
    pub min_cadence_multiplier: Fixed,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            health_step: ratio(1, 4),
            count_step: ratio(1, 5),
            enemy_spawn_interval_multiplier: ratio(4, 5),
            enemy_first_spawn_time: Some(ratio(12, 5)),
            cadence_step: Fixed::ZERO,
            min_cadence_multiplier: ratio(1, 2),
        }
    }
}

impl DifficultyConfig {
    fn validate(&self) -> Result<()> {
        if self.health_step < Fixed::ZERO {
            return Err(GameError::invalid_config(
                "difficulty.health_step",
                "must not be negative",
            ));
        }
        if self.count_step < Fixed::ZERO {
            return Err(GameError::invalid_config(
                "difficulty.count_step",
                "must not be negative",
            ));
        }
        if self.enemy_spawn_interval_multiplier <= Fixed::ZERO {
            return Err(GameError::invalid_config(
                "difficulty.enemy_spawn_interval_multiplier",
                "must be positive",
            ));
        }
        if self.cadence_step < Fixed::ZERO {
            return Err(GameError::invalid_config(
                "difficulty.cadence_step",
                "must not be negative",
            ));
        }
        if self.min_cadence_multiplier <= Fixed::ZERO || self.min_cadence_multiplier > Fixed::ONE {
            return Err(GameError::invalid_config(
                "difficulty.min_cadence_multiplier",
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let foot = |health, radius| UnitStats {
            health,
            speed: Fixed::from_num(3),
            acceleration: Fixed::from_num(12),
            radius,
            mounted: false,
        };
        let building = |x| BuildingConfig {
            position: Vec2Fixed::from_num(x, 20),
            radius: Fixed::from_num(3),
            health: 2000,
            spawn_interval: Fixed::from_num(10),
            first_spawn_time: Fixed::from_num(3),
        };
        let hero = |id: &str, name: &str, avatar: &str| HeroConfig {
            id: id.to_string(),
            name: name.to_string(),
            avatar_text: avatar.to_string(),
            ..HeroConfig::fallback()
        };

        let mut guanyu = hero("guanyu", "Guan Yu", "关");
        guanyu.stats.health = Some(420);
        guanyu.weapon.overrides.damage = Some(30);

        let mut zhangfei = hero("zhangfei", "Zhang Fei", "张");
        zhangfei.weapon.overrides.knockback = Some(ratio(4, 5));
        zhangfei.weapon.overrides.range = Some(Fixed::from_num(2));

        let mut huangzhong = hero("huangzhong", "Huang Zhong", "黄");
        huangzhong.weapon.kind = WeaponKind::Bow;
        huangzhong.mount.speed = Some(Fixed::from_num(6));

        Self {
            world: WorldConfig {
                width: Fixed::from_num(160),
                height: Fixed::from_num(40),
            },
            characters: CharacterRoster {
                player: UnitStats {
                    health: 300,
                    speed: Fixed::from_num(5),
                    acceleration: Fixed::from_num(30),
                    radius: ratio(1, 2),
                    mounted: true,
                },
                infantry: foot(100, ratio(1, 2)),
                archer: foot(70, ratio(1, 2)),
                cavalry: UnitStats {
                    mounted: true,
                    ..foot(160, ratio(4, 5))
                },
            },
            weapons: WeaponRoster {
                sword: WeaponStats {
                    damage: 20,
                    cooldown: Fixed::ONE,
                    range: ratio(3, 2),
                    knockback: ratio(3, 10),
                    max_targets: 3,
                    projectile_speed: Fixed::ZERO,
                },
                bow: WeaponStats {
                    damage: 15,
                    cooldown: ratio(3, 2),
                    range: Fixed::from_num(14),
                    knockback: ratio(1, 5),
                    max_targets: 1,
                    projectile_speed: Fixed::from_num(25),
                },
                lance: WeaponStats {
                    damage: 30,
                    cooldown: ratio(9, 5),
                    range: ratio(5, 2),
                    knockback: Fixed::ONE,
                    max_targets: 1,
                    projectile_speed: Fixed::ZERO,
                },
            },
            mount: MountStats {
                speed: Fixed::from_num(7),
                acceleration: Fixed::from_num(14),
            },
            buildings: TeamBuildings {
                player: building(12),
                enemy: building(148),
            },
            spawn: SpawnComposition {
                infantry: 4,
                archer: 2,
                cavalry: 1,
            },
            initial_enemies: vec![
                InitialUnit {
                    kind: UnitKind::Cavalry,
                    offset: Vec2Fixed::from_num(-8, 0),
                },
                InitialUnit {
                    kind: UnitKind::Infantry,
                    offset: Vec2Fixed::from_num(-10, -5),
                },
                InitialUnit {
                    kind: UnitKind::Infantry,
                    offset: Vec2Fixed::from_num(-10, 5),
                },
                InitialUnit {
                    kind: UnitKind::Archer,
                    offset: Vec2Fixed::from_num(-15, 0),
                },
            ],
            hero_offset: default_hero_offset(),
            heroes: vec![guanyu, zhangfei, huangzhong],
            upgrade_thresholds: default_upgrade_thresholds(),
            difficulty: DifficultyConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a configuration from RON text and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] for malformed text and
    /// [`GameError::InvalidConfig`] for out-of-range values.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Find a hero by id.
    #[must_use]
    pub fn hero(&self, id: &str) -> Option<&HeroConfig> {
        self.heroes.iter().find(|h| h.id == id)
    }

    /// Check every block, returning the first error found.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.world.width <= Fixed::ZERO || self.world.height <= Fixed::ZERO {
            return Err(GameError::invalid_config("world", "map size must be positive"));
        }
        self.characters.validate()?;
        self.weapons.validate()?;
        self.mount.validate("mount")?;
        self.buildings.validate(self.world.width, self.world.height)?;
        self.spawn.validate("spawn")?;
        self.difficulty.validate()?;

        let mut previous = 0;
        for (i, &threshold) in self.upgrade_thresholds.iter().enumerate() {
            if threshold <= previous {
                return Err(GameError::invalid_config(
                    format!("upgrade_thresholds[{i}]"),
                    "thresholds must be positive and strictly ascending",
                ));
            }
            previous = threshold;
        }

        let mut seen = HashSet::new();
        for (i, hero) in self.heroes.iter().enumerate() {
            let path = format!("heroes[{i}]");
            if hero.id.is_empty() {
                return Err(GameError::invalid_config(
                    format!("{path}.id"),
                    "must not be empty",
                ));
            }
            if !seen.insert(hero.id.as_str()) {
                return Err(GameError::invalid_config(
                    format!("{path}.id"),
                    format!("duplicate hero id '{}'", hero.id),
                ));
            }
            hero.resolve_stats(&self.characters.player)
                .validate(&format!("{path}.stats"))?;
            hero.resolve_mount(&self.mount)
                .validate(&format!("{path}.mount"))?;
            let kind = hero.weapon.kind;
            validate_weapon(
                kind,
                &hero.weapon.overrides.apply(self.weapons.get(kind)),
                &format!("{path}.weapon"),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MAX_HEALTH, MAX_WAVE_UNITS};

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_of_default() {
        let config = GameConfig::default();
        let text = config.to_ron_string().unwrap();
        let parsed = GameConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed.upgrade_thresholds, vec![10, 50]);
        assert_eq!(parsed.heroes.len(), 3);
        assert_eq!(parsed.spawn, config.spawn);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = GameConfig::from_ron_str("GameConfig(world: nope)").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_thresholds_must_ascend() {
        let config = GameConfig {
            upgrade_thresholds: vec![10, 10],
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, GameError::InvalidConfig { ref field, .. } if field == "upgrade_thresholds[1]")
        );
    }

    #[test]
    fn test_health_above_bound_rejected() {
        let mut config = GameConfig::default();
        config.characters.infantry.health = 3_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, GameError::InvalidConfig { ref field, .. } if field == "characters.infantry.health")
        );

        let mut config = GameConfig::default();
        config.buildings.enemy.health = MAX_HEALTH + 1;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.characters.cavalry.health = MAX_HEALTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_wave_rejected() {
        let mut config = GameConfig::default();
        config.spawn.archer = MAX_WAVE_UNITS + 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig { ref field, .. } if field == "spawn.archer"));
    }

    #[test]
    fn test_duplicate_hero_rejected() {
        let mut config = GameConfig::default();
        let copy = config.heroes[0].clone();
        config.heroes.push(copy);
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_hero_lookup() {
        let config = GameConfig::default();
        assert_eq!(config.hero("zhangfei").map(|h| h.name.as_str()), Some("Zhang Fei"));
        assert!(config.hero("lubu").is_none());
    }

    #[test]
    fn test_difficulty_defaults() {
        let difficulty = DifficultyConfig::default();
        assert_eq!(difficulty.health_step, ratio(1, 4));
        assert_eq!(difficulty.cadence_step, Fixed::ZERO);
        assert!(difficulty.enemy_first_spawn_time.is_some());
    }
}
