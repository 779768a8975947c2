//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a session produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`battle_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Systems iterate in registration or sorted entity ID order.
//!
//! - **System randomness**: Coin scatter is seeded from entity ids.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (collision, combat, etc.)
//! 2. **Property tests**: Random input scripts must still replay identically
//! 3. **Parallel tests**: Running N sessions on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use battle_core::math::Fixed;
use battle_core::session::{PlayerInput, Session};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Session is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use battle_core::data::GameConfig;
/// use battle_core::session::{PlayerInput, Session};
/// use battle_test_utils::determinism::verify_determinism;
/// use battle_test_utils::fixtures::{frame, started_session};
///
/// let result = verify_determinism(
///     3,
///     60,
///     || started_session(GameConfig::default(), None),
///     |s: &mut Session| { s.tick(frame(), &PlayerInput::default()); },
///     |s| s.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Play an input script against a fresh session and return the hash after
/// every tick.
///
/// Each script entry is `(dt, input)`.
pub fn replay_hashes<F>(setup_fn: F, script: &[(Fixed, PlayerInput)]) -> Vec<u64>
where
    F: Fn() -> Session,
{
    let mut session = setup_fn();
    script
        .iter()
        .map(|(dt, input)| {
            session.tick(*dt, input);
            session.state_hash()
        })
        .collect()
}

/// Result of parallel session runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each session.
    pub hashes: Vec<u64>,
    /// Number of ticks each session ran.
    pub ticks: u64,
    /// Number of sessions run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all sessions produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all sessions matched.
    ///
    /// # Panics
    ///
    /// Panics if sessions produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel sessions diverged!\n\
                 Sessions: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N sessions on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_sessions<F>(setup_fn: F, num_sims: usize, num_ticks: u64, dt: Fixed) -> ParallelSimResult
where
    F: Fn() -> Session + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut session = setup_fn();
                    let idle = PlayerInput::default();
                    for _ in 0..num_ticks {
                        session.tick(dt, &idle);
                    }
                    session.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two session runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the sessions stay identical, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Option<u64>
where
    F: Fn() -> Session,
{
    let mut a = setup_fn();
    let mut b = setup_fn();
    let idle = PlayerInput::default();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick(dt, &idle);
        b.tick(dt, &idle);

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for session and system testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use battle_core::math::{ratio, Fixed, Vec2Fixed};
    use battle_core::session::PlayerInput;
    use proptest::prelude::*;

    /// Generate a fixed-point coordinate inside the default 160 x 40 map.
    pub fn arb_map_x() -> impl Strategy<Value = Fixed> {
        (0i32..160i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point coordinate inside the default map height.
    pub fn arb_map_y() -> impl Strategy<Value = Fixed> {
        (0i32..40i32).prop_map(Fixed::from_num)
    }

    /// Generate a position inside the default map.
    pub fn arb_map_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_map_x(), arb_map_y()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate an eight-way joystick direction, or standing still.
    pub fn arb_direction() -> impl Strategy<Value = Vec2Fixed> {
        (-1i32..=1, -1i32..=1).prop_map(|(x, y)| Vec2Fixed::from_num(x, y))
    }

    /// Generate a frame delta between 1/120 s and 1/5 s.
    ///
    /// Values above the session's 0.1 s cap exercise the clamp.
    pub fn arb_dt() -> impl Strategy<Value = Fixed> {
        (1i32..=24).prop_map(|n| ratio(n, 120))
    }

    /// Generate one tick of input.
    pub fn arb_step() -> impl Strategy<Value = (Fixed, PlayerInput)> {
        (arb_dt(), arb_direction()).prop_map(|(dt, direction)| (dt, PlayerInput { direction }))
    }

    /// Generate an input script.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<(Fixed, PlayerInput)>> {
        proptest::collection::vec(arb_step(), 1..max_len)
    }

    /// Generate health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Generate damage values (1-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate weapon range in fixed-point, 1 to 15 m.
    pub fn arb_weapon_range() -> impl Strategy<Value = Fixed> {
        (2i32..=30i32).prop_map(|n| ratio(n, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame, quiet_config, started_session};
    use battle_core::data::GameConfig;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes(), vec![10]);
    }

    #[test]
    fn test_hero_selection_session_is_stable() {
        let result = verify_determinism(
            2,
            20,
            || Session::new(GameConfig::default()).unwrap(),
            |s| {
                s.tick(frame(), &PlayerInput::default());
            },
            Session::state_hash,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_default_battle_determinism() {
        let result = verify_determinism(
            3,
            400,
            || started_session(GameConfig::default(), None),
            |s| {
                s.tick(frame(), &PlayerInput::default());
            },
            Session::state_hash,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_no_divergence_in_default_battle() {
        let divergence =
            find_first_divergence(|| started_session(GameConfig::default(), Some("huangzhong")), 300, frame());
        assert_eq!(divergence, None);
    }

    #[test]
    fn test_parallel_sessions_match() {
        run_parallel_sessions(|| started_session(GameConfig::default(), None), 4, 200, frame())
            .assert_deterministic();
    }

    #[test]
    fn test_hash_changes_as_session_advances() {
        let mut session = started_session(GameConfig::default(), None);
        let before = session.state_hash();
        session.tick(frame(), &PlayerInput::default());
        assert_ne!(before, session.state_hash());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// A random input script replays to identical hashes every tick.
        #[test]
        fn prop_input_scripts_are_replayable(script in strategies::arb_script(120)) {
            let setup = || started_session(GameConfig::default(), None);
            let first = replay_hashes(setup, &script);
            let second = replay_hashes(setup, &script);
            prop_assert_eq!(first, second);
        }

        /// The quiet arena never produces a game over from hero movement alone.
        #[test]
        fn prop_quiet_arena_stays_active(script in strategies::arb_script(80)) {
            let mut session = started_session(quiet_config(), None);
            for (dt, input) in &script {
                session.tick(*dt, input);
            }
            prop_assert!(session.outcome().is_none());
        }
    }
}
