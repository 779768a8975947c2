//! The match controller.
//!
//! A [`Session`] owns every entity and system of one match and advances
//! them in a fixed order each tick. It is also the state machine the UI
//! drives: hero selection, weapon upgrade offers, game over and
//! continuing to the next level.
//!
//! # Determinism
//!
//! Given the same config, hero choice and sequence of `(dt, input)`
//! pairs, two sessions produce the same [`Session::state_hash`] after
//! every tick:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness (coin scatter is seeded from entity ids)
//! - Consistent iteration order (registration order, sorted entity IDs)
//!
//! # Example
//!
//! ```
//! use battle_core::data::GameConfig;
//! use battle_core::math::{ratio, Vec2Fixed};
//! use battle_core::session::{Phase, PlayerInput, Session};
//!
//! let mut session = Session::new(GameConfig::default()).unwrap();
//! assert_eq!(session.phase(), Phase::HeroSelection);
//! session.select_hero("guanyu").unwrap();
//!
//! let input = PlayerInput { direction: Vec2Fixed::UNIT_X };
//! for _ in 0..10 {
//!     session.tick(ratio(1, 20), &input);
//! }
//! assert_eq!(session.phase(), Phase::Active);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ai::AiSystem;
use crate::collision::CollisionSystem;
use crate::combat::{CombatEvent, CombatSystem};
use crate::components::{Archetype, EntityId, UnitKind};
use crate::data::{GameConfig, HeroConfig, UnitStats};
use crate::economy::{coin_system, CoinCollected, CoinDrops, Wallet};
use crate::error::{GameError, Result};
use crate::math::{ratio, Fixed, Vec2Fixed};
use crate::motion::motion_system;
use crate::progression::{CoinProgress, Difficulty, Outcome, UnlockSet, UpgradeLadder, UpgradeOffer};
use crate::spawner::Spawner;
use crate::team::Team;
use crate::units;
use crate::view::{BuildingView, EntityView, HeroCard, MinimapDot, MinimapView};
use crate::weapon::{Weapon, WeaponKind};
use crate::world::{Entity, EntityStorage, MapBounds, RectBounds};

/// Longest frame delta a single tick will simulate, in seconds.
pub fn max_frame_delta() -> Fixed {
    ratio(1, 10)
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for [`Session::select_hero`].
    HeroSelection,
    /// Ticks advance the match.
    Active,
    /// Waiting for [`Session::resolve_upgrade`].
    UpgradePaused,
    /// The match is over.
    GameOver(Outcome),
}

impl Phase {
    /// Snake-case name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeroSelection => "hero_selection",
            Self::Active => "active",
            Self::UpgradePaused => "upgrade_paused",
            Self::GameOver(_) => "game_over",
        }
    }
}

/// Player input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    /// Movement direction; normalized by the session, zero to stand still.
    pub direction: Vec2Fixed,
}

/// Events generated during a session tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Attacks, damage, arrows and kills.
    pub combat: Vec<CombatEvent>,
    /// Coins banked by the hero.
    pub coins_collected: Vec<CoinCollected>,
    /// Coins dropped by kills.
    pub coins_dropped: Vec<EntityId>,
    /// Soldiers created by building waves.
    pub spawned: Vec<EntityId>,
    /// Arrows that fell without hitting anything.
    pub expired_projectiles: Vec<EntityId>,
    /// Entities swept from the world at the end of the tick.
    pub removed: Vec<EntityId>,
    /// A weapon offer opened this tick.
    pub upgrade_offered: Option<UpgradeOffer>,
    /// The match ended this tick.
    pub outcome: Option<Outcome>,
}

/// One match, from hero selection to game over.
#[derive(Debug, Clone)]
pub struct Session {
    config: GameConfig,
    bounds: RectBounds,
    phase: Phase,
    level: u32,
    difficulty: Difficulty,
    selected_hero: Option<HeroConfig>,
    entities: EntityStorage,
    collision: CollisionSystem,
    combat: CombatSystem,
    ai: AiSystem,
    wallet: Wallet,
    unlocks: UnlockSet,
    ladder: UpgradeLadder,
    pending: Option<UpgradeOffer>,
    hero: Option<EntityId>,
    player_building: Option<EntityId>,
    enemy_building: Option<EntityId>,
    tick: u64,
    elapsed: Fixed,
}

impl Session {
    /// Create a session at level 1.
    ///
    /// With heroes configured the session waits for
    /// [`select_hero`](Self::select_hero); with an empty roster it starts
    /// straight away with the default hero.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    /// No entity is created in that case.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let bounds = RectBounds::new(config.world.width, config.world.height);
        let difficulty = Difficulty::new(1, config.difficulty);
        let mut session = Self {
            ladder: UpgradeLadder::new(config.upgrade_thresholds.clone()),
            config,
            bounds,
            phase: Phase::HeroSelection,
            level: 1,
            difficulty,
            selected_hero: None,
            entities: EntityStorage::new(),
            collision: CollisionSystem::new(),
            combat: CombatSystem::new(),
            ai: AiSystem::new(),
            wallet: Wallet::new(),
            unlocks: UnlockSet::new(),
            pending: None,
            hero: None,
            player_building: None,
            enemy_building: None,
            tick: 0,
            elapsed: Fixed::ZERO,
        };
        if session.config.heroes.is_empty() {
            tracing::info!("Hero roster empty, starting with the default hero");
            session.setup(HeroConfig::fallback());
        }
        Ok(session)
    }

    /// Pick the hero and start the match.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidPhase`] outside hero selection,
    /// [`GameError::UnknownHero`] if `id` is not in the roster.
    pub fn select_hero(&mut self, id: &str) -> Result<()> {
        self.expect_phase(Phase::HeroSelection)?;
        let hero = self
            .config
            .hero(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownHero(id.to_string()))?;
        self.setup(hero);
        Ok(())
    }

    /// Advance the match by `dt` seconds.
    ///
    /// Does nothing unless the session is [`Phase::Active`]. `dt` is
    /// clamped to `[0, 0.1]`.
    pub fn tick(&mut self, dt: Fixed, input: &PlayerInput) -> TickEvents {
        let mut events = TickEvents::default();
        if self.phase != Phase::Active {
            return events;
        }
        let dt = dt.clamp(Fixed::ZERO, max_frame_delta());

        // 1. Input
        if let Some(movement) = self
            .hero
            .and_then(|id| self.entities.get_mut(id))
            .filter(|e| e.is_alive())
            .and_then(|e| e.movement.as_mut())
        {
            movement.steer(input.direction);
        }

        // 2. Movement, arrow flight and map clamp
        events.expired_projectiles = motion_system(&mut self.entities, &self.bounds, dt);

        // 3. Coins
        let hero_position = self.hero_position();
        events.coins_collected = coin_system(&mut self.entities, hero_position, dt, &mut self.wallet);

        // 4. AI
        self.ai.update(&mut self.entities, dt);

        // 5. Collision
        let report = self.collision.update(&mut self.entities);

        // 6. Combat
        let mut drops = CoinDrops::default();
        events.combat = self.combat.update(&mut self.entities, &report, dt, &mut drops);
        for (source, at) in drops.drops {
            events.coins_dropped.push(self.entities.insert(units::coin(at, source)));
        }

        // 7. Spawners
        self.run_spawners(dt, &mut events.spawned);

        self.tick += 1;
        self.elapsed += dt;

        // 8. End of match
        if let Some(outcome) = self.check_outcome() {
            self.phase = Phase::GameOver(outcome);
            self.pending = None;
            events.outcome = Some(outcome);
            tracing::info!(
                level = self.level,
                outcome = outcome.name(),
                tick = self.tick,
                "Match over"
            );
        } else {
            // 9. Upgrade thresholds
            events.upgrade_offered = self.check_upgrades();
        }

        // 10. Sweep
        events.removed = self
            .entities
            .sweep(|e| e.archetype == Archetype::Building);

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Session state hash");
        }

        events
    }

    /// The weapon choice waiting for the player, if any.
    #[must_use]
    pub fn pending_offer(&self) -> Option<&UpgradeOffer> {
        self.pending.as_ref()
    }

    /// Take `kind` from the pending offer.
    ///
    /// Unlocks the weapon, equips a fresh instance on the hero and
    /// resumes the match. If the balance already covers the next
    /// threshold, that offer opens immediately and is returned.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidPhase`] unless paused for an upgrade,
    /// [`GameError::NoPendingOffer`] if nothing is offered,
    /// [`GameError::UpgradeNotOffered`] if `kind` is not an option.
    pub fn resolve_upgrade(&mut self, kind: WeaponKind) -> Result<Option<UpgradeOffer>> {
        self.expect_phase(Phase::UpgradePaused)?;
        let offer = self.pending.as_ref().ok_or(GameError::NoPendingOffer)?;
        if !offer.options.contains(&kind) {
            return Err(GameError::UpgradeNotOffered(kind));
        }

        self.unlocks.unlock(kind);
        let stats = *self.config.weapons.get(kind);
        if let Some(hero) = self.hero.and_then(|id| self.entities.get_mut(id)) {
            hero.weapons.push(Weapon::new(kind, stats));
        }
        tracing::info!(weapon = kind.key(), coins = self.wallet.balance(), "Weapon unlocked");

        self.ladder.advance();
        self.pending = None;
        self.phase = Phase::Active;
        Ok(self.check_upgrades())
    }

    /// Start the next level after a victory, keeping the same hero.
    ///
    /// # Errors
    ///
    /// [`GameError::ContinueNotPermitted`] unless the last match was won.
    pub fn next_level(&mut self) -> Result<()> {
        if self.phase != Phase::GameOver(Outcome::Victory) {
            return Err(GameError::ContinueNotPermitted);
        }
        self.level += 1;
        let hero = self.selected_hero.clone().unwrap_or_else(HeroConfig::fallback);
        self.setup(hero);
        Ok(())
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                expected: expected.name(),
                actual: self.phase.name(),
            })
        }
    }

    /// Reset every per-match value and populate the world.
    fn setup(&mut self, hero: HeroConfig) {
        self.difficulty = Difficulty::new(self.level, self.config.difficulty);
        self.entities = EntityStorage::new();
        self.collision = CollisionSystem::new();
        self.combat = CombatSystem::new();
        self.ai = AiSystem::new();
        self.wallet = Wallet::new();
        self.unlocks = UnlockSet::new();
        self.ladder = UpgradeLadder::new(self.config.upgrade_thresholds.clone());
        self.pending = None;
        self.tick = 0;
        self.elapsed = Fixed::ZERO;

        self.player_building = Some(self.spawn_building(Team::Player));
        self.enemy_building = Some(self.spawn_building(Team::Enemy));
        self.hero = Some(self.spawn_hero(&hero));

        let enemy_base = self.config.buildings.enemy.position;
        let initial = self.config.initial_enemies.clone();
        for unit in initial {
            let stats = *self.config.characters.unit(unit.kind);
            self.spawn_soldier(unit.kind, Team::Enemy, enemy_base + unit.offset, &stats);
        }

        tracing::info!(
            level = self.level,
            hero = %hero.id,
            entities = self.entities.len(),
            "Session ready"
        );
        self.selected_hero = Some(hero);
        self.phase = Phase::Active;
    }

    fn spawn_building(&mut self, team: Team) -> EntityId {
        let config = *self.config.buildings.for_team(team);
        let spawner = Spawner::new(
            self.difficulty.spawn_interval(team, config.spawn_interval),
            self.difficulty.first_spawn_time(team, config.first_spawn_time),
            self.difficulty.composition(team, &self.config.spawn),
            config.radius,
        );
        let id = self.entities.insert(units::building(team, &config, spawner));
        self.collision.add_entity(id);
        id
    }

    fn spawn_hero(&mut self, hero: &HeroConfig) -> EntityId {
        let stats = hero.resolve_stats(&self.config.characters.player);
        let mount = hero.resolve_mount(&self.config.mount);
        let kind = hero.weapon.kind;
        let weapon = hero.weapon.overrides.apply(self.config.weapons.get(kind));
        let position = self
            .bounds
            .clamp(self.config.buildings.player.position + self.config.hero_offset);

        let id = self
            .entities
            .insert(units::hero(position, &stats, &mount, kind, weapon));
        self.collision.add_entity(id);
        self.combat.add_entity(id);
        self.unlocks.unlock(kind);
        id
    }

    fn spawn_soldier(
        &mut self,
        kind: UnitKind,
        team: Team,
        position: Vec2Fixed,
        stats: &UnitStats,
    ) -> EntityId {
        let position = self.bounds.clamp(position);
        let weapon = *self.config.weapons.get(kind.weapon());
        let entity = units::soldier(kind, team, position, stats, &self.config.mount, weapon);
        let id = self.entities.insert(entity);
        self.collision.add_entity(id);
        self.combat.add_entity(id);
        self.ai.add_entity(id);
        id
    }

    fn run_spawners(&mut self, dt: Fixed, spawned: &mut Vec<EntityId>) {
        for building in [self.player_building, self.enemy_building].into_iter().flatten() {
            let Some(entity) = self.entities.get_mut(building) else {
                continue;
            };
            if !entity.is_alive() {
                continue;
            }
            let (Some(team), Some(origin)) = (entity.team, entity.pos()) else {
                tracing::warn!(entity = building, "Skipping building without team or position");
                continue;
            };
            let Some(wave) = entity
                .spawner
                .as_mut()
                .and_then(|s| s.update(dt, team.advance_sign()))
            else {
                continue;
            };

            tracing::debug!(team = team.short_name(), units = wave.len(), "Wave spawned");
            for order in wave {
                let stats = self
                    .difficulty
                    .unit_stats(team, self.config.characters.unit(order.kind));
                spawned.push(self.spawn_soldier(order.kind, team, origin + order.offset, &stats));
            }
        }
    }

    fn building_down(&self, id: Option<EntityId>) -> bool {
        id.and_then(|id| self.entities.get(id))
            .and_then(|e| e.health)
            .is_some_and(|h| h.is_dead())
    }

    fn check_outcome(&self) -> Option<Outcome> {
        Outcome::from_destroyed(
            self.building_down(self.player_building),
            self.building_down(self.enemy_building),
        )
    }

    /// Open an offer for the next reached threshold.
    ///
    /// Thresholds with nothing left to unlock are consumed silently.
    fn check_upgrades(&mut self) -> Option<UpgradeOffer> {
        while let Some(threshold) = self.ladder.due(self.wallet.balance()) {
            let options = self.unlocks.locked();
            if options.is_empty() {
                self.ladder.advance();
                continue;
            }
            let offer = UpgradeOffer { threshold, options };
            tracing::info!(threshold, options = ?offer.options, "Upgrade offered");
            self.pending = Some(offer.clone());
            self.phase = Phase::UpgradePaused;
            return Some(offer);
        }
        None
    }

    fn hero_position(&self) -> Option<Vec2Fixed> {
        self.hero
            .and_then(|id| self.entities.get(id))
            .filter(|e| e.is_alive())
            .and_then(|e| e.pos())
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcome of the finished match, if any.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Current level, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Ticks advanced in the current match.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds in the current match.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Coin balance.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.wallet.balance()
    }

    /// Weapon kinds unlocked this match.
    #[must_use]
    pub const fn unlocks(&self) -> &UnlockSet {
        &self.unlocks
    }

    /// The config this session was built from.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Entity storage, for inspection.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Mutable entity storage, for scripted scenarios.
    pub fn entities_mut(&mut self) -> &mut EntityStorage {
        &mut self.entities
    }

    /// The hero's entity id, while one exists.
    #[must_use]
    pub fn hero_id(&self) -> Option<EntityId> {
        self.hero.filter(|id| self.entities.contains(*id))
    }

    /// A team's base entity id.
    #[must_use]
    pub const fn building_id(&self, team: Team) -> Option<EntityId> {
        match team {
            Team::Player => self.player_building,
            Team::Enemy => self.enemy_building,
        }
    }

    /// Heroes the player may choose from.
    #[must_use]
    pub fn hero_roster(&self) -> Vec<HeroCard> {
        self.config
            .heroes
            .iter()
            .map(|hero| HeroCard {
                id: hero.id.clone(),
                name: hero.name.clone(),
                avatar_text: hero.avatar_text.clone(),
                weapon: hero.weapon.kind,
            })
            .collect()
    }

    /// Coin bar data.
    #[must_use]
    pub fn coin_progress(&self) -> CoinProgress {
        self.ladder.progress(self.wallet.balance())
    }

    /// Every active positioned entity, in id order.
    #[must_use]
    pub fn entity_views(&self) -> Vec<EntityView> {
        self.entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.active)
            .filter_map(Self::view_of)
            .collect()
    }

    /// Render data for one entity.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] if `id` is gone, inactive or has no
    /// position.
    pub fn entity_view(&self, id: EntityId) -> Result<EntityView> {
        self.entities
            .get(id)
            .filter(|e| e.active)
            .and_then(Self::view_of)
            .ok_or(GameError::EntityNotFound(id))
    }

    fn view_of(e: &Entity) -> Option<EntityView> {
        Some(EntityView {
            id: e.id,
            archetype: e.archetype,
            team: e.team,
            position: e.pos()?,
            facing: e.facing,
            radius: e.radius,
            health_ratio: e.health.map(|h| h.ratio()),
        })
    }

    /// Both bases, player first, including destroyed ones.
    #[must_use]
    pub fn building_views(&self) -> Vec<BuildingView> {
        Team::ALL
            .into_iter()
            .filter_map(|team| {
                let id = self.building_id(team)?;
                let entity = self.entities.get(id)?;
                let health = entity.health?;
                Some(BuildingView {
                    id,
                    team,
                    position: entity.pos()?,
                    radius: entity.radius,
                    health: health.current,
                    max_health: health.max,
                })
            })
            .collect()
    }

    /// Minimap snapshot.
    #[must_use]
    pub fn minimap(&self) -> MinimapView {
        let buildings = self
            .building_views()
            .into_iter()
            .map(|b| MinimapDot {
                team: b.team,
                position: b.position,
            })
            .collect();
        let units = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.is_alive() && e.archetype.is_unit() && Some(e.id) != self.hero)
            .filter_map(|e| {
                Some(MinimapDot {
                    team: e.team?,
                    position: e.pos()?,
                })
            })
            .collect();
        MinimapView {
            width: self.bounds.width,
            height: self.bounds.height,
            buildings,
            units,
            hero: self.hero.zip(self.hero_position()),
        }
    }

    /// Calculate a hash of the current match state.
    ///
    /// Used for determinism verification.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.level.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.wallet.balance().hash(&mut hasher);
        self.ladder.index().hash(&mut hasher);

        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);

        for id in ids {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            id.hash(&mut hasher);
            entity.archetype.hash(&mut hasher);
            entity.active.hash(&mut hasher);

            if let Some(ref pos) = entity.position {
                pos.value.x.to_bits().hash(&mut hasher);
                pos.value.y.to_bits().hash(&mut hasher);
            }

            if let Some(ref health) = entity.health {
                health.current.hash(&mut hasher);
                health.max.hash(&mut hasher);
            }

            if let Some(ref movement) = entity.movement {
                movement.velocity.x.to_bits().hash(&mut hasher);
                movement.velocity.y.to_bits().hash(&mut hasher);
            }

            for weapon in &entity.weapons {
                weapon.kind.hash(&mut hasher);
                weapon.cooldown_remaining.to_bits().hash(&mut hasher);
            }

            if let Some(ref projectile) = entity.projectile {
                projectile.source.hash(&mut hasher);
                projectile.travelled.to_bits().hash(&mut hasher);
            }

            if let Some(ref spawner) = entity.spawner {
                spawner.timer.to_bits().hash(&mut hasher);
                spawner.elapsed_ticks.hash(&mut hasher);
            }

            if let Some(ref coin) = entity.coin {
                coin.state.hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
