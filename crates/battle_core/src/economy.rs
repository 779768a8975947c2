//! Coins, the session wallet and the sinks that connect them.
//!
//! Kills drop coins through a [`RewardSink`]; coins reaching the hero
//! credit a [`CurrencySink`]. Neither side holds a reference to the
//! session, so both can be driven directly in tests.
//!
//! All calculations use fixed-point math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{fixed_decimal_serde, ratio, Fixed, Vec2Fixed};
use crate::world::EntityStorage;

/// Receives currency from collected coins.
pub trait CurrencySink {
    /// Add `amount` to the balance.
    fn credit(&mut self, amount: u32);
}

/// Receives reward drops from kills.
pub trait RewardSink {
    /// A combatant `source` died at `position` and should drop its reward.
    fn drop_reward(&mut self, source: EntityId, position: Vec2Fixed);
}

/// The session's coin balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wallet {
    coins: u32,
}

impl Wallet {
    /// Create an empty wallet.
    #[must_use]
    pub const fn new() -> Self {
        Self { coins: 0 }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.coins
    }
}

impl CurrencySink for Wallet {
    fn credit(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }
}

/// Reward drops buffered during combat, turned into coins afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinDrops {
    /// `(dead entity, drop position)` in emission order.
    pub drops: Vec<(EntityId, Vec2Fixed)>,
}

impl RewardSink for CoinDrops {
    fn drop_reward(&mut self, source: EntityId, position: Vec2Fixed) {
        self.drops.push((source, position));
    }
}

/// Currency credited per coin.
pub const COIN_VALUE: u32 = 1;

/// Coin body radius in meters.
pub fn coin_radius() -> Fixed {
    ratio(3, 10)
}

/// Distance at which an idle coin starts flying to the hero.
pub fn pickup_radius() -> Fixed {
    ratio(7, 5)
}

/// Coin flight speed toward the hero, m/s.
pub fn collect_speed() -> Fixed {
    Fixed::from_num(14)
}

/// Downward acceleration during the drop hop, m/s².
pub fn coin_gravity() -> Fixed {
    Fixed::from_num(14)
}

/// A collecting coin within this distance of the hero is banked.
pub fn collect_distance() -> Fixed {
    ratio(1, 5)
}

/// Lifecycle of a dropped coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoinState {
    /// Hopping out of the body.
    #[default]
    Spawn,
    /// Resting, waiting for the hero.
    Idle,
    /// Flying toward the hero.
    Collect,
}

/// Coin component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Current state.
    pub state: CoinState,
    /// Hop velocity while spawning.
    pub velocity: Vec2Fixed,
    /// Height at which the hop lands.
    #[serde(with = "fixed_decimal_serde")]
    pub rest_y: Fixed,
    /// Currency credited on collection.
    pub value: u32,
}

impl Coin {
    /// A coin starting its hop from height `rest_y`.
    ///
    /// The hop velocity is scattered from `seed` so identical sessions drop
    /// identical coins.
    #[must_use]
    pub fn new(seed: u64, rest_y: Fixed) -> Self {
        Self {
            state: CoinState::Spawn,
            velocity: hop_velocity(seed),
            rest_y,
            value: COIN_VALUE,
        }
    }
}

/// Deterministic hop: x in `[-1.2, 1.2]`, y in `[-5.0, -3.5]` (upward).
fn hop_velocity(seed: u64) -> Vec2Fixed {
    let bits = splitmix64(seed);
    let unit = |shift: u32| Fixed::from_num((bits >> shift) & 0xFFFF) / Fixed::from_num(0x1_0000);
    let x = ratio(-6, 5) + unit(0) * ratio(12, 5);
    let y = Fixed::from_num(-5) + unit(16) * ratio(3, 2);
    Vec2Fixed::new(x, y)
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A coin that finished collecting this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinCollected {
    /// The coin entity.
    pub coin: EntityId,
    /// Currency credited.
    pub amount: u32,
}

/// Advance every active coin by `dt` seconds.
///
/// `hero` is the position of the living hero, or `None` if there is none.
/// A collecting coin with no hero to fly to is credited on the spot.
pub fn coin_system(
    entities: &mut EntityStorage,
    hero: Option<Vec2Fixed>,
    dt: Fixed,
    sink: &mut dyn CurrencySink,
) -> Vec<CoinCollected> {
    let mut collected = Vec::new();

    for id in entities.sorted_ids() {
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        if !entity.active {
            continue;
        }
        let (Some(coin), Some(position)) = (entity.coin.as_mut(), entity.position.as_mut()) else {
            continue;
        };

        match coin.state {
            CoinState::Spawn => {
                coin.velocity.y += coin_gravity() * dt;
                position.value += coin.velocity.scale(dt);
                if position.value.y >= coin.rest_y {
                    position.value.y = coin.rest_y;
                    coin.velocity = Vec2Fixed::ZERO;
                    coin.state = CoinState::Idle;
                }
            }
            CoinState::Idle => {
                if let Some(hero) = hero {
                    if position.value.distance_squared(hero) <= pickup_radius() * pickup_radius() {
                        coin.state = CoinState::Collect;
                    }
                }
            }
            CoinState::Collect => {
                let banked = match hero {
                    None => true,
                    Some(hero) => {
                        let distance = position.value.distance(hero);
                        if distance <= collect_distance() {
                            true
                        } else {
                            let step = distance.min(collect_speed() * dt);
                            position.value = position.value.move_toward(hero, step);
                            false
                        }
                    }
                };
                if banked {
                    let amount = coin.value;
                    entity.active = false;
                    sink.credit(amount);
                    collected.push(CoinCollected { coin: id, amount });
                }
            }
        }
    }

    collected
}
