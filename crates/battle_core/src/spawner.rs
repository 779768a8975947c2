//! Wave spawning for base buildings.
//!
//! A [`Spawner`] lives on each building entity. It counts down to the
//! next wave and, when due, hands out one [`SpawnOrder`] per unit at a
//! fixed formation offset on the building's advancing side.

use serde::{Deserialize, Serialize};

use crate::components::UnitKind;
use crate::data::{SpawnComposition, MAX_WAVE_UNITS};
use crate::math::{fixed_decimal_serde, ratio, Fixed, Vec2Fixed};

/// Smallest allowed spawn interval, 0.1 s.
pub const MIN_SPAWN_INTERVAL: Fixed = Fixed::from_bits(0x1999_999A);

/// Spawner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnerState {
    /// Counting down to the next wave.
    #[default]
    Waiting,
    /// The timer elapsed and the wave has not been taken yet.
    SpawnDue,
}

/// One unit of a wave, placed relative to the building centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Unit to create.
    pub kind: UnitKind,
    /// Offset from the building centre.
    pub offset: Vec2Fixed,
}

/// Wave timer component for buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawner {
    /// Current state.
    pub state: SpawnerState,
    /// Seconds between waves, at least [`MIN_SPAWN_INTERVAL`].
    #[serde(with = "fixed_decimal_serde")]
    pub interval: Fixed,
    /// Seconds until the next wave.
    #[serde(with = "fixed_decimal_serde")]
    pub timer: Fixed,
    /// Ticks since the countdown last restarted.
    #[serde(default)]
    pub elapsed_ticks: u32,
    /// Units per wave.
    pub composition: SpawnComposition,
    /// Distance from the building centre to the nearest formation rank.
    #[serde(with = "fixed_decimal_serde")]
    pub clearance: Fixed,
}

impl Spawner {
    /// Create a spawner whose first wave is due after `first_spawn_time`.
    ///
    /// Intervals below [`MIN_SPAWN_INTERVAL`] are raised to it.
    #[must_use]
    pub fn new(
        interval: Fixed,
        first_spawn_time: Fixed,
        composition: SpawnComposition,
        clearance: Fixed,
    ) -> Self {
        let interval = if interval < MIN_SPAWN_INTERVAL {
            tracing::warn!(%interval, "Spawn interval clamped to minimum");
            MIN_SPAWN_INTERVAL
        } else {
            interval
        };
        Self {
            state: SpawnerState::Waiting,
            interval,
            timer: first_spawn_time.max(Fixed::ZERO),
            elapsed_ticks: 0,
            composition,
            clearance,
        }
    }

    /// Advance the countdown. Returns `true` when a wave became due.
    ///
    /// A frame delta such as 1/20 s is not exact in fixed point and may be
    /// short by one ulp, so the countdown tolerates one ulp per tick.
    pub fn tick(&mut self, dt: Fixed) -> bool {
        if self.state == SpawnerState::SpawnDue {
            return false;
        }
        self.timer = self.timer.saturating_sub(dt);
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.timer <= Fixed::from_bits(i64::from(self.elapsed_ticks)) {
            self.state = SpawnerState::SpawnDue;
            return true;
        }
        false
    }

    /// Take the due wave, if any, and restart the countdown.
    pub fn take_wave(&mut self, advance_sign: i32) -> Option<Vec<SpawnOrder>> {
        if self.state != SpawnerState::SpawnDue {
            return None;
        }
        self.state = SpawnerState::Waiting;
        self.timer = self.interval;
        self.elapsed_ticks = 0;
        Some(formation(&self.composition, advance_sign, self.clearance))
    }

    /// Tick and take in one step. At most one wave per call.
    pub fn update(&mut self, dt: Fixed, advance_sign: i32) -> Option<Vec<SpawnOrder>> {
        self.tick(dt);
        self.take_wave(advance_sign)
    }
}

/// Formation rank of each kind, counted outward from the building.
fn rank(kind: UnitKind) -> i32 {
    match kind {
        UnitKind::Archer => 0,
        UnitKind::Cavalry => 1,
        UnitKind::Infantry => 2,
    }
}

/// Offsets for a whole wave.
///
/// Each kind forms a column at its rank, units spread evenly along `y`.
/// Orders are listed infantry, archers, cavalry. Each kind is capped at
/// [`MAX_WAVE_UNITS`].
#[must_use]
pub fn formation(composition: &SpawnComposition, advance_sign: i32, clearance: Fixed) -> Vec<SpawnOrder> {
    let spacing = ratio(3, 2);
    let mut orders = Vec::with_capacity(composition.total().min(3 * MAX_WAVE_UNITS) as usize);
    for kind in UnitKind::ALL {
        let count = composition.count(kind).min(MAX_WAVE_UNITS);
        let x = Fixed::from_num(advance_sign) * (clearance + spacing * Fixed::from_num(rank(kind) + 1));
        for i in 0..count {
            // Centred on the building's axis.
            let y = (Fixed::from_num(2 * i) - Fixed::from_num(count - 1)) * ratio(3, 4);
            orders.push(SpawnOrder {
                kind,
                offset: Vec2Fixed::new(x, y),
            });
        }
    }
    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composition() -> SpawnComposition {
        SpawnComposition {
            infantry: 4,
            archer: 2,
            cavalry: 1,
        }
    }

    #[test]
    fn test_first_wave_then_interval() {
        let mut spawner = Spawner::new(Fixed::from_num(10), Fixed::from_num(3), composition(), Fixed::from_num(3));
        let spawned: Vec<u32> = (1..=25)
            .filter(|_| spawner.update(Fixed::ONE, 1).is_some())
            .collect();
        assert_eq!(spawned, vec![3, 13, 23]);
    }

    #[test]
    fn test_cadence_holds_at_twenty_hertz() {
        let mut spawner = Spawner::new(Fixed::from_num(10), Fixed::from_num(3), composition(), Fixed::from_num(3));
        let frame = ratio(1, 20);
        let spawned: Vec<u32> = (1..=480)
            .filter(|_| spawner.update(frame, 1).is_some())
            .collect();
        // 3 s, 13 s and 23 s at 20 ticks per second.
        assert_eq!(spawned, vec![60, 260, 460]);
    }

    #[test]
    fn test_cadence_holds_at_inexact_rates() {
        for hz in [3, 7, 30, 60, 120] {
            let mut spawner = Spawner::new(Fixed::from_num(2), Fixed::ONE, composition(), Fixed::ONE);
            let frame = ratio(1, hz);
            let spawned: Vec<i32> = (1..=3 * hz)
                .filter(|_| spawner.update(frame, 1).is_some())
                .collect();
            assert_eq!(spawned, vec![hz, 3 * hz], "{hz} Hz");
        }
    }

    #[test]
    fn test_interval_is_clamped() {
        let spawner = Spawner::new(Fixed::ZERO, Fixed::ONE, composition(), Fixed::ONE);
        assert_eq!(spawner.interval, MIN_SPAWN_INTERVAL);
        let spawner = Spawner::new(Fixed::from_num(-4), Fixed::ONE, composition(), Fixed::ONE);
        assert_eq!(spawner.interval, MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn test_one_wave_per_tick_even_when_far_overdue() {
        let mut spawner = Spawner::new(MIN_SPAWN_INTERVAL, Fixed::ZERO, composition(), Fixed::ONE);
        assert!(spawner.update(Fixed::from_num(5), 1).is_some());
        assert_eq!(spawner.state, SpawnerState::Waiting);
        assert_eq!(spawner.timer, MIN_SPAWN_INTERVAL);
        assert_eq!(spawner.elapsed_ticks, 0);
    }

    #[test]
    fn test_due_wave_waits_to_be_taken() {
        let mut spawner = Spawner::new(Fixed::from_num(10), Fixed::ONE, composition(), Fixed::ONE);
        assert!(spawner.tick(Fixed::ONE));
        assert!(!spawner.tick(Fixed::ONE));
        assert_eq!(spawner.state, SpawnerState::SpawnDue);
        assert_eq!(spawner.take_wave(1).map(|w| w.len()), Some(7));
        assert!(spawner.take_wave(1).is_none());
    }

    #[test]
    fn test_formation_faces_advance_side() {
        let clearance = Fixed::from_num(3);
        for sign in [1, -1] {
            let orders = formation(&composition(), sign, clearance);
            assert_eq!(orders.len(), 7);
            for order in &orders {
                assert!(order.offset.x * Fixed::from_num(sign) > clearance);
            }
        }
        let orders = formation(&composition(), 1, clearance);
        let kinds: Vec<_> = orders.iter().map(|o| o.kind).collect();
        assert_eq!(kinds[..4], [UnitKind::Infantry; 4]);
        assert_eq!(kinds[6], UnitKind::Cavalry);
        // Infantry column spread symmetrically around the axis.
        assert_eq!(orders[0].offset.y, -orders[3].offset.y);
        assert_ne!(orders[0].offset, orders[1].offset);
    }
}
