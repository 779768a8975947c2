//! Data structures for battle configuration.
//!
//! This module contains pure data structures describing characters,
//! weapons, bases, heroes and difficulty scaling. All structs are designed
//! to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `battle_headless`.

mod building_data;
mod game_config;
mod hero_data;
mod unit_data;
mod weapon_data;

pub use building_data::{BuildingConfig, InitialUnit, SpawnComposition, TeamBuildings, MAX_WAVE_UNITS};
pub use game_config::{DifficultyConfig, GameConfig, WorldConfig};
pub use hero_data::{HeroConfig, HeroWeapon, MountOverrides, StatOverrides};
pub use unit_data::{CharacterRoster, MountStats, UnitStats, MAX_HEALTH};
pub use weapon_data::{validate_weapon, WeaponOverrides, WeaponRoster};
