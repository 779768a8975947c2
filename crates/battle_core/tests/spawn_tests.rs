//! Wave cadence and per-level enemy scaling, driven through a session.

use battle_core::components::Archetype;
use battle_core::data::GameConfig;
use battle_core::math::{ratio, Fixed};
use battle_core::progression::Outcome;
use battle_core::session::{Phase, PlayerInput, Session};
use battle_core::spawner::Spawner;
use battle_core::team::Team;
use battle_test_utils::fixtures::{frame, set_building_health, started_session};

/// Exact in fixed point.
fn sixteenth() -> Fixed {
    ratio(1, 16)
}

fn open_field() -> GameConfig {
    let mut config = GameConfig::default();
    config.initial_enemies.clear();
    config.difficulty.enemy_first_spawn_time = None;
    config
}

fn spawn_ticks(session: &mut Session, dt: Fixed, ticks: usize, team: Team) -> Vec<usize> {
    let idle = PlayerInput::default();
    let mut hits = Vec::new();
    for tick in 1..=ticks {
        let events = session.tick(dt, &idle);
        let any = events
            .spawned
            .iter()
            .filter_map(|id| session.entities().get(*id))
            .any(|e| e.team == Some(team));
        if any {
            hits.push(tick);
        }
    }
    hits
}

fn spawner(session: &Session, team: Team) -> Spawner {
    let id = session.building_id(team).unwrap();
    session.entities().get(id).unwrap().spawner.unwrap()
}

#[test]
fn test_player_waves_follow_first_spawn_then_interval() {
    let mut session = started_session(open_field(), None);
    // First wave after 3 s, then every 10 s.
    assert_eq!(spawn_ticks(&mut session, sixteenth(), 210, Team::Player), vec![48, 208]);
}

#[test]
fn test_enemy_waves_run_faster() {
    let mut session = started_session(open_field(), None);
    // Same first wave, then the 0.8 interval multiplier.
    assert_eq!(spawn_ticks(&mut session, sixteenth(), 180, Team::Enemy), vec![48, 176]);
}

#[test]
fn test_waves_keep_time_at_twenty_hertz() {
    let mut session = started_session(open_field(), None);
    let player = spawn_ticks(&mut session, frame(), 270, Team::Player);
    assert_eq!(player, vec![60, 260]);

    let mut session = started_session(open_field(), None);
    let enemy = spawn_ticks(&mut session, frame(), 230, Team::Enemy);
    assert_eq!(enemy, vec![60, 220]);
}

#[test]
fn test_first_wave_composition() {
    let mut session = started_session(open_field(), None);
    let idle = PlayerInput::default();
    for _ in 0..47 {
        assert!(session.tick(sixteenth(), &idle).spawned.is_empty());
    }
    let events = session.tick(sixteenth(), &idle);
    assert_eq!(events.spawned.len(), 14);

    let count = |team: Team, archetype: Archetype| {
        events
            .spawned
            .iter()
            .filter_map(|id| session.entities().get(*id))
            .filter(|e| e.team == Some(team) && e.archetype == archetype)
            .count()
    };
    for team in Team::ALL {
        assert_eq!(count(team, Archetype::Infantry), 4);
        assert_eq!(count(team, Archetype::Archer), 2);
        assert_eq!(count(team, Archetype::Cavalry), 1);
    }
}

#[test]
fn test_wave_spawns_beside_its_base() {
    let mut session = started_session(open_field(), None);
    let idle = PlayerInput::default();
    let mut events = session.tick(sixteenth(), &idle);
    while events.spawned.is_empty() {
        events = session.tick(sixteenth(), &idle);
    }
    let config = session.config().clone();
    for id in &events.spawned {
        let unit = session.entities().get(*id).unwrap();
        let x = unit.pos().unwrap().x;
        match unit.team.unwrap() {
            Team::Player => assert!(x > config.buildings.player.position.x),
            Team::Enemy => assert!(x < config.buildings.enemy.position.x),
        }
    }
}

fn win_level(session: &mut Session) {
    set_building_health(session, Team::Enemy, 0);
    let events = session.tick(sixteenth(), &PlayerInput::default());
    assert_eq!(events.outcome, Some(Outcome::Victory));
    session.next_level().unwrap();
}

#[test]
fn test_level_three_scales_enemy_only() {
    let mut session = started_session(open_field(), None);
    win_level(&mut session);
    win_level(&mut session);
    assert_eq!(session.level(), 3);
    assert_eq!(session.phase(), Phase::Active);

    let base_interval = Fixed::from_num(10);
    assert_eq!(spawner(&session, Team::Enemy).interval, base_interval * ratio(4, 5));
    assert_eq!(spawner(&session, Team::Player).interval, base_interval);

    let idle = PlayerInput::default();
    let mut spawned = Vec::new();
    for _ in 0..48 {
        spawned.extend(session.tick(sixteenth(), &idle).spawned);
    }

    let units: Vec<_> = spawned
        .iter()
        .filter_map(|id| session.entities().get(*id))
        .collect();
    let enemy_infantry: Vec<_> = units
        .iter()
        .filter(|e| e.team == Some(Team::Enemy) && e.archetype == Archetype::Infantry)
        .collect();
    let player_infantry: Vec<_> = units
        .iter()
        .filter(|e| e.team == Some(Team::Player) && e.archetype == Archetype::Infantry)
        .collect();

    // 4 x 1.4 rounded up.
    assert_eq!(enemy_infantry.len(), 6);
    assert_eq!(player_infantry.len(), 4);
    // 100 x 1.5.
    assert!(enemy_infantry.iter().all(|e| e.health.unwrap().max == 150));
    assert!(player_infantry.iter().all(|e| e.health.unwrap().max == 100));
}

#[test]
fn test_destroyed_base_stops_spawning() {
    let mut session = started_session(open_field(), None);
    set_building_health(&mut session, Team::Player, 0);
    set_building_health(&mut session, Team::Enemy, 0);
    let events = session.tick(sixteenth(), &PlayerInput::default());
    assert_eq!(events.outcome, Some(Outcome::Draw));
    // Ticks after game over do nothing.
    for _ in 0..100 {
        assert!(session.tick(sixteenth(), &PlayerInput::default()).spawned.is_empty());
    }
}
