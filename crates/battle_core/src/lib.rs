//! # Battle Core
//!
//! Deterministic simulation core for a top-down base-siege battle.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and batch balance checks
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`session`] - Match controller: tick order, hero selection, upgrades, levels
//! - [`world`] - Entity records, storage and map bounds
//! - [`components`] - Component definitions
//! - [`collision`], [`combat`], [`ai`], [`motion`], [`spawner`] - Per-tick systems
//! - [`economy`], [`progression`] - Coins, unlocks, thresholds and difficulty
//! - [`data`] - Data-driven game configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod collision;
pub mod combat;
pub mod components;
pub mod data;
pub mod economy;
pub mod error;
pub mod math;
pub mod motion;
pub mod progression;
pub mod session;
pub mod spawner;
pub mod team;
pub mod units;
pub mod view;
pub mod weapon;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::CombatEvent;
    pub use crate::components::*;
    pub use crate::data::GameConfig;
    pub use crate::economy::{CoinState, CurrencySink, RewardSink, Wallet};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{ratio, Fixed, Vec2Fixed};
    pub use crate::progression::{CoinProgress, Outcome, UpgradeOffer};
    pub use crate::session::{Phase, PlayerInput, Session, TickEvents};
    pub use crate::team::Team;
    pub use crate::view::{BuildingView, EntityView, HeroCard, MinimapView};
    pub use crate::weapon::{Weapon, WeaponKind, WeaponStats};
    pub use crate::world::{Entity, EntityStorage};
}
