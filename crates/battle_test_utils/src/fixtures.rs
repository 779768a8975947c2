//! Test fixtures and helpers.
//!
//! Pre-built configs and session states for consistent testing.

use battle_core::data::GameConfig;
use battle_core::economy::CoinState;
use battle_core::math::{ratio, Fixed, Vec2Fixed};
use battle_core::session::{PlayerInput, Session, TickEvents};
use battle_core::team::Team;
use battle_core::units;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// A 20 Hz frame.
#[must_use]
pub fn frame() -> Fixed {
    ratio(1, 20)
}

/// Shipped tuning with no opening enemies and no waves for a long time.
///
/// Useful when a test wants the hero and the two bases to itself.
#[must_use]
pub fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.initial_enemies.clear();
    config.buildings.player.first_spawn_time = fixed(10_000);
    config.buildings.enemy.first_spawn_time = fixed(10_000);
    config.difficulty.enemy_first_spawn_time = None;
    config
}

/// A session past hero selection.
///
/// Picks `hero`, or the first roster entry when `None`.
///
/// # Panics
///
/// Panics if the config is invalid or the hero is unknown.
#[must_use]
pub fn started_session(config: GameConfig, hero: Option<&str>) -> Session {
    let first = config.heroes.first().map(|h| h.id.clone());
    let mut session = Session::new(config).expect("fixture config must be valid");
    if let Some(id) = hero.map(str::to_string).or(first) {
        session.select_hero(&id).expect("fixture hero must exist");
    }
    session
}

/// Tick `session` `ticks` times with a 20 Hz frame and fixed input.
pub fn run_ticks(session: &mut Session, ticks: usize, input: &PlayerInput) -> Vec<TickEvents> {
    (0..ticks).map(|_| session.tick(frame(), input)).collect()
}

/// Tick with no input until `done` holds or `max_ticks` pass.
///
/// Returns the number of ticks run.
pub fn run_until(session: &mut Session, max_ticks: usize, done: impl Fn(&Session) -> bool) -> usize {
    let idle = PlayerInput::default();
    for tick in 0..max_ticks {
        if done(session) {
            return tick;
        }
        session.tick(frame(), &idle);
    }
    max_ticks
}

/// Overwrite a base's current health.
///
/// # Panics
///
/// Panics if the session has no building for `team`.
pub fn set_building_health(session: &mut Session, team: Team, health: u32) {
    let id = session.building_id(team).expect("session has buildings");
    if let Some(h) = session
        .entities_mut()
        .get_mut(id)
        .and_then(|e| e.health.as_mut())
    {
        h.current = health.min(h.max);
    }
}

/// Move the hero to `position`.
///
/// # Panics
///
/// Panics if the hero is gone.
pub fn place_hero(session: &mut Session, position: Vec2Fixed) {
    let id = session.hero_id().expect("hero alive");
    if let Some(p) = session
        .entities_mut()
        .get_mut(id)
        .and_then(|e| e.position.as_mut())
    {
        p.value = position;
    }
}

/// Drop `count` coins onto the hero, already flying, and tick once so
/// they are banked.
///
/// # Panics
///
/// Panics if the hero is gone.
pub fn bank_coins(session: &mut Session, count: u32) -> TickEvents {
    let id = session.hero_id().expect("hero alive");
    let at = session
        .entities()
        .get(id)
        .and_then(|e| e.pos())
        .expect("hero has a position");
    for seed in 0..count {
        let mut coin = units::coin(at, u64::from(seed));
        if let Some(c) = coin.coin.as_mut() {
            c.state = CoinState::Collect;
        }
        session.entities_mut().insert(coin);
    }
    session.tick(frame(), &PlayerInput::default())
}
