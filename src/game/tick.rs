//! Session Simulation Tick
//!
//! The progression state machine and the loop that drives it.
//!
//! ## Tick Order
//!
//! ```text
//! 1. drain outcomes deferred from the previous tick (FIFO)
//! 2. fall-through check against the first platform
//! 3. advance the session clock
//! 4. controller update from the latest input intent
//! 5. level update: moving platforms, enemy steering
//! 6. physics step
//! 7. classify contacts; grounding applies now, everything else is deferred
//! 8. sync visuals
//! ```
//!
//! Any respawn or level change ends the tick where it happens, so the player
//! is never stepped in the same tick it was teleported.

use std::collections::VecDeque;

use tracing::{debug, error, info, warn};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::math::{horizontal_distance, vertical_distance, Vec3};
use crate::error::ConfigurationError;
use crate::game::collision::{CollisionRouter, Outcome};
use crate::game::config::GameConfig;
use crate::game::container::LevelContainer;
use crate::game::controller::{CharacterController, PlayerPose};
use crate::game::events::{DeathCause, GameEvent, GameEventData};
use crate::game::input::{InputIntent, InputRecording};
use crate::game::level::LevelData;
use crate::game::state::{GameSession, GameState, SessionSummary};
use crate::physics::{ArcadeWorld, BodyDesc, CollisionGroups, PhysicsWorld, Shape};
use crate::render::{HeadlessScene, Material, Scene, VisualHandle};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Session tick after this call
    pub tick: u64,
    /// State after this call
    pub state: GameState,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the tick did any work
    pub ran: bool,
}

/// Whether the current tick may keep going after an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Player was teleported or the level changed
    Respawned,
    /// Session left PLAYING for good
    Halted,
}

/// Drives one play session over a list of levels.
pub struct GameStateMachine<W: PhysicsWorld, S: Scene> {
    world: W,
    scene: S,
    config: GameConfig,
    levels: Vec<LevelData>,
    session: GameSession,
    level: Option<LevelContainer>,
    controller: CharacterController,
    router: CollisionRouter,
    player_visual: VisualHandle,
    intent: InputIntent,
    deferred: VecDeque<Outcome>,
    loading_level: bool,
    recording: Option<InputRecording>,
}

impl<W: PhysicsWorld, S: Scene> GameStateMachine<W, S> {
    /// Create a machine in STARTING. The player body and visual are created
    /// now and live as long as the machine.
    pub fn new(
        mut world: W,
        mut scene: S,
        config: GameConfig,
        levels: Vec<LevelData>,
    ) -> Result<Self, ConfigurationError> {
        if levels.is_empty() {
            return Err(ConfigurationError::NoLevels);
        }

        let size = config.player_size;
        let shape = Shape::cuboid(size, size, size);
        let player = world.create_body(
            BodyDesc::dynamic(config.player_mass, Vec3::ZERO, shape).with_groups(CollisionGroups::player()),
        );
        world.add_body(player);
        let player_visual = scene.create_visual(&shape, Material::color(config.player_color));
        scene.add_visual(player_visual);

        let controller = CharacterController::new(player, config.controller.clone(), world.gravity());

        Ok(Self {
            world,
            scene,
            session: GameSession::new(levels.len()),
            levels,
            config,
            level: None,
            controller,
            router: CollisionRouter::new(player),
            player_visual,
            intent: InputIntent::idle(),
            deferred: VecDeque::new(),
            loading_level: false,
            recording: None,
        })
    }

    // =========================================================================
    // Session control
    // =========================================================================

    /// Leave STARTING: load level 0, spawn the player and start the clock.
    ///
    /// Ignored outside STARTING. On a configuration error the machine stays
    /// in STARTING.
    pub fn begin_session(&mut self) -> Result<(), ConfigurationError> {
        if self.session.state != GameState::Starting {
            warn!("begin_session ignored in state {:?}", self.session.state);
            return Ok(());
        }

        self.session = GameSession::new(self.levels.len());
        self.load_level(0)?;
        self.respawn()?;
        self.push_event(GameEventData::SessionStarted {
            level_count: self.levels.len(),
        });
        self.transition(GameState::Playing);
        self.push_level_loaded(0);
        info!("Session started with {} levels", self.levels.len());
        Ok(())
    }

    /// Tear everything down and return to STARTING with zeroed stats.
    pub fn restart(&mut self) {
        if let Some(level) = self.level.take() {
            level.teardown(&mut self.world, &mut self.scene);
        }
        self.deferred.clear();
        self.loading_level = false;
        self.session = GameSession::new(self.levels.len());
        debug!("Session reset to STARTING");
    }

    /// Latest input intent. Last write before a tick wins.
    pub fn set_input_intent(&mut self, intent: InputIntent) {
        self.intent = intent;
    }

    /// Current input intent.
    pub fn input_intent(&self) -> &InputIntent {
        &self.intent
    }

    /// Start recording the intent used on every tick.
    pub fn start_recording(&mut self) {
        self.recording = Some(InputRecording::new(self.config.tick_dt()));
    }

    /// Stop recording and hand back what was captured.
    pub fn take_recording(&mut self) -> Option<InputRecording> {
        self.recording.take()
    }

    /// Queue an outcome for the start of the next tick, as if a contact had
    /// produced it.
    pub fn deliver(&mut self, outcome: Outcome) {
        if outcome != Outcome::None {
            self.deferred.push_back(outcome);
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Run one simulation tick.
    ///
    /// Does nothing unless PLAYING with `dt > 0`. Returns an error only when
    /// a level transition hits a malformed level; the session then halts in
    /// LEVEL_COMPLETE.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, ConfigurationError> {
        if !self.session.state.is_active() || dt <= 0.0 {
            return Ok(self.report(false));
        }

        // 0. Advance tick counter
        self.session.tick += 1;
        if let Some(recording) = self.recording.as_mut() {
            recording.record(self.session.tick, self.intent);
        }

        // 1. Outcomes deferred from the previous step
        while let Some(outcome) = self.deferred.pop_front() {
            match self.apply_outcome(outcome)? {
                Flow::Continue => {}
                Flow::Respawned | Flow::Halted => return Ok(self.report(true)),
            }
        }

        // 2. Fall-through-world
        if self.fell_out_of_world() {
            self.kill(DeathCause::Fall)?;
            return Ok(self.report(true));
        }

        // 3. Clock
        self.session.elapsed_time += dt;

        // 4. Controller
        let pose = self.controller.update(&mut self.world, dt, &self.intent);

        // 5. Level
        if let Some(level) = self.level.as_mut() {
            level.update(dt, pose.position, &mut self.world, &mut self.scene);
        }

        // 6. Physics
        self.world.step(dt);

        // 7. Contacts
        self.route_contacts();

        // 8. Visuals
        self.sync_visuals();

        #[cfg(feature = "debug-tracing")]
        {
            let pose = self.controller.pose(&self.world);
            tracing::trace!(
                "tick {} pos={:?} vel={:?} ground={} jump={} queued={}",
                self.session.tick,
                pose.position,
                pose.velocity,
                pose.is_on_ground,
                pose.is_jumping,
                self.deferred.len()
            );
        }

        Ok(self.report(true))
    }

    fn route_contacts(&mut self) {
        let Some(level) = self.level.as_ref() else {
            self.world.drain_contacts();
            return;
        };
        for contact in self.world.drain_contacts() {
            let outcome = self.router.classify_contact(&contact, |body| level.tag(body));
            if outcome.grounds_player() {
                self.controller.ground();
            }
            match outcome {
                Outcome::GoalReached | Outcome::HazardHit | Outcome::EnemyActivated(_) => {
                    self.deferred.push_back(outcome);
                }
                Outcome::Grounded | Outcome::None => {}
            }
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) -> Result<Flow, ConfigurationError> {
        if !self.session.state.is_active() {
            return Ok(Flow::Halted);
        }
        match outcome {
            Outcome::GoalReached => {
                if self.within_goal_threshold() {
                    self.complete_level()
                } else {
                    Ok(Flow::Continue)
                }
            }
            Outcome::HazardHit => self.kill(DeathCause::Hazard),
            Outcome::EnemyActivated(trigger) => {
                let activated = match self.level.as_mut() {
                    Some(level) => level.activate_enemy(trigger, &mut self.world, &mut self.scene),
                    None => false,
                };
                if activated {
                    self.push_event(GameEventData::EnemyActivated { trigger });
                }
                Ok(Flow::Continue)
            }
            Outcome::Grounded | Outcome::None => Ok(Flow::Continue),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// PLAYING -> GAME_OVER -> PLAYING.
    fn kill(&mut self, cause: DeathCause) -> Result<Flow, ConfigurationError> {
        let position = self.controller.pose(&self.world).position;
        self.transition(GameState::GameOver);
        self.session.deaths += 1;
        self.push_event(GameEventData::PlayerDied {
            cause,
            position,
            deaths: self.session.deaths,
        });
        debug!("Player died ({:?}) at {:?}, deaths={}", cause, position, self.session.deaths);

        self.respawn()?;
        self.transition(GameState::Playing);
        Ok(Flow::Respawned)
    }

    /// PLAYING -> LEVEL_COMPLETE -> PLAYING | WIN.
    fn complete_level(&mut self) -> Result<Flow, ConfigurationError> {
        let completed = self.session.current_level_index;
        if self.loading_level {
            warn!("Level load for index {} rejected: a load is already in progress", completed + 1);
            self.push_event(GameEventData::LoadRejected {
                requested_index: completed + 1,
            });
            return Ok(Flow::Continue);
        }
        self.loading_level = true;

        self.transition(GameState::LevelComplete);
        self.push_event(GameEventData::LevelCompleted {
            index: completed,
            elapsed_time: self.session.elapsed_time,
        });
        info!("Level {} complete at {:.2}s", completed + 1, self.session.elapsed_time);
        self.session.current_level_index += 1;
        self.deferred.clear();

        if self.session.levels_exhausted() {
            self.loading_level = false;
            self.transition(GameState::Win);
            let summary = self.session.summary();
            self.push_event(GameEventData::SessionWon {
                deaths: summary.deaths,
                elapsed_time: summary.elapsed_time,
            });
            info!(
                "All {} levels complete: {} deaths in {}",
                self.session.level_count,
                summary.deaths,
                summary.formatted_time()
            );
            return Ok(Flow::Halted);
        }

        let next = self.session.current_level_index;
        let loaded = self.load_level(next).and_then(|_| self.respawn());
        self.loading_level = false;
        if let Err(err) = loaded {
            error!("Session halted in LEVEL_COMPLETE: {}", err);
            return Err(err);
        }

        self.transition(GameState::Playing);
        self.push_level_loaded(next);
        Ok(Flow::Respawned)
    }

    /// Replace the active level. Validation happens before teardown, so a bad
    /// descriptor leaves the current level in place.
    fn load_level(&mut self, index: usize) -> Result<(), ConfigurationError> {
        let data = &self.levels[index];
        data.validate()
            .map_err(|source| ConfigurationError::Level { index, source })?;

        if let Some(old) = self.level.take() {
            old.teardown(&mut self.world, &mut self.scene);
        }
        let level = LevelContainer::load(&mut self.world, &mut self.scene, data, &self.config)
            .map_err(|source| ConfigurationError::Level { index, source })?;
        self.level = Some(level);
        Ok(())
    }

    /// Teleport the player to the spawn point and put enemies back to sleep.
    fn respawn(&mut self) -> Result<(), ConfigurationError> {
        let spawn = self
            .level
            .as_ref()
            .map(|level| level.spawn_point(self.config.player_size));
        self.controller.reset(&mut self.world, spawn)?;
        if let Some(level) = self.level.as_mut() {
            level.reset_enemies(&mut self.world, &mut self.scene);
        }
        self.world.drain_contacts();
        self.deferred.clear();
        self.sync_visuals();
        Ok(())
    }

    fn transition(&mut self, to: GameState) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;
        let tick = self.session.tick;
        self.session.push_event(GameEvent::state_changed(tick, from, to));
        debug!("State {:?} -> {:?}", from, to);
    }

    // =========================================================================
    // Checks
    // =========================================================================

    fn fell_out_of_world(&self) -> bool {
        let Some(level) = self.level.as_ref() else {
            return false;
        };
        let kill_height = level.first_platform_position().y - self.config.fall_margin;
        self.controller.pose(&self.world).position.y < kill_height
    }

    fn within_goal_threshold(&self) -> bool {
        let Some(goal) = self.level.as_ref().and_then(LevelContainer::goal_anchor) else {
            return false;
        };
        let player = self.controller.pose(&self.world).position;
        horizontal_distance(player, goal) <= self.config.completion_horizontal_threshold
            && vertical_distance(player, goal) <= self.config.vertical_threshold()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn sync_visuals(&mut self) {
        let pose = self.controller.pose(&self.world);
        self.scene.set_transform(self.player_visual, pose.position, pose.orientation);
        if let Some(level) = self.level.as_ref() {
            level.sync_visuals(&self.world, &mut self.scene);
        }
    }

    fn push_event(&mut self, data: GameEventData) {
        let tick = self.session.tick;
        self.session.push_event(GameEvent::new(tick, data));
    }

    fn push_level_loaded(&mut self, index: usize) {
        let name = self.level.as_ref().map(|l| l.name().to_string()).unwrap_or_default();
        let tick = self.session.tick;
        self.session.push_event(GameEvent::level_loaded(tick, index, name));
    }

    fn report(&mut self, ran: bool) -> TickReport {
        TickReport {
            tick: self.session.tick,
            state: self.session.state,
            events: self.session.take_events(),
            ran,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current state.
    pub fn state(&self) -> GameState {
        self.session.state
    }

    /// Session record.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Stats for the UI.
    pub fn summary(&self) -> SessionSummary {
        self.session.summary()
    }

    /// Active level, if loaded.
    pub fn level(&self) -> Option<&LevelContainer> {
        self.level.as_ref()
    }

    /// Number of levels in the session.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Player controller.
    pub fn controller(&self) -> &CharacterController {
        &self.controller
    }

    /// Player pose read back from the world.
    pub fn player_pose(&self) -> PlayerPose {
        self.controller.pose(&self.world)
    }

    /// Player visual.
    pub fn player_visual(&self) -> VisualHandle {
        self.player_visual
    }

    /// Whether a level transition is in progress.
    pub fn is_loading_level(&self) -> bool {
        self.loading_level
    }

    /// Number of outcomes waiting for the next tick.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Physics world.
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Physics world, mutably. Changes made here are seen by the next tick.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Scene.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Fingerprint of the session, player and level state.
    pub fn state_hash(&self) -> StateHash {
        let pose = self.player_pose();
        compute_state_hash(self.session.tick, |hasher| {
            self.session.hash_into(hasher);
            hasher.update_vec3(pose.position);
            hasher.update_vec3(pose.velocity);
            hasher.update_quat(pose.orientation);
            hasher.update_bool(pose.is_on_ground);
            hasher.update_bool(pose.is_jumping);

            if let Some(level) = self.level.as_ref() {
                hasher.update_f32(level.elapsed());
                for enemy in level.enemies().values() {
                    hasher.update_u32(enemy.trigger.0);
                    hasher.update_bool(enemy.active);
                    if let Some(position) = self.world.position(enemy.body) {
                        hasher.update_vec3(position);
                    }
                }
            }
        })
    }
}

/// Result of replaying a recording.
#[derive(Debug)]
pub struct ReplayResult {
    /// Session record at the end of the replay
    pub session: GameSession,
    /// Every event emitted during the replay
    pub events: Vec<GameEvent>,
    /// Final state hash
    pub hash: StateHash,
}

/// Replay a session from a recording on a fresh headless world.
pub fn replay_session(
    levels: Vec<LevelData>,
    config: GameConfig,
    recording: &InputRecording,
) -> Result<ReplayResult, ConfigurationError> {
    let world = ArcadeWorld::new(config.gravity);
    let mut machine = GameStateMachine::new(world, HeadlessScene::new(), config, levels)?;
    machine.begin_session()?;

    let mut events = machine.session.take_events();
    for (_, intent) in recording.replay_iter() {
        machine.set_input_intent(intent);
        let report = machine.tick(recording.dt)?;
        events.extend(report.events);
        if report.state == GameState::Win {
            break;
        }
    }

    Ok(ReplayResult {
        hash: machine.state_hash(),
        session: machine.session.clone(),
        events,
    })
}
