//! End-to-end state machine behavior on the headless world.

use skyhop::game::collision::Outcome;
use skyhop::game::events::{DeathCause, GameEventData};
use skyhop::game::level::PlatformDesc;
use skyhop::{
    ArcadeWorld, ConfigurationError, GameConfig, GameState, GameStateMachine, HeadlessScene,
    LevelData, LevelFormatError, PhysicsWorld, TickReport, Vec3,
};

const DT: f32 = 1.0 / 60.0;

type Machine = GameStateMachine<ArcadeWorld, HeadlessScene>;

fn first(x: f32, y: f32, z: f32) -> PlatformDesc {
    let mut p = PlatformDesc::at(x, y, z, 6.0, 6.0);
    p.is_first = true;
    p
}

fn goal(x: f32, y: f32, z: f32) -> PlatformDesc {
    let mut p = PlatformDesc::at(x, y, z, 6.0, 6.0);
    p.is_final = true;
    p
}

fn level(name: &str, platforms: Vec<PlatformDesc>) -> LevelData {
    LevelData {
        name: name.into(),
        platform_color: "8DF9C1".into(),
        background: None,
        platforms,
    }
}

fn simple(name: &str) -> LevelData {
    level(name, vec![first(0.0, 0.0, 0.0), goal(0.0, 0.0, -20.0)])
}

fn started(levels: Vec<LevelData>) -> Machine {
    let mut machine =
        GameStateMachine::new(ArcadeWorld::default(), HeadlessScene::new(), GameConfig::default(), levels).unwrap();
    machine.begin_session().unwrap();
    machine
}

fn place_player(machine: &mut Machine, position: Vec3) {
    let body = machine.controller().body();
    machine.world_mut().set_position(body, position);
}

fn count_events(report: &TickReport, pred: impl Fn(&GameEventData) -> bool) -> usize {
    report.events.iter().filter(|e| pred(&e.data)).count()
}

#[test]
fn test_fall_through_world_respawns_same_tick() {
    let mut machine = started(vec![simple("A")]);
    let spawn = machine.player_pose().position;
    place_player(&mut machine, Vec3::new(0.0, -20.0001, 0.0));

    let report = machine.tick(DT).unwrap();

    assert_eq!(report.state, GameState::Playing);
    assert_eq!(machine.session().deaths, 1);
    assert_eq!(machine.player_pose().position, spawn);
    assert_eq!(machine.player_pose().velocity, Vec3::ZERO);
    assert_eq!(
        count_events(&report, |d| matches!(d, GameEventData::PlayerDied { cause: DeathCause::Fall, .. })),
        1
    );
    // PLAYING -> GAME_OVER -> PLAYING inside the one tick.
    let states: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e.data {
            GameEventData::StateChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![GameState::GameOver, GameState::Playing]);
}

#[test]
fn test_exactly_at_kill_height_survives() {
    let mut machine = started(vec![simple("A")]);
    place_player(&mut machine, Vec3::new(0.0, -20.0, 0.0));
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().deaths, 0);
}

#[test]
fn test_kill_height_follows_first_platform() {
    let mut machine = started(vec![level("High", vec![first(0.0, 10.0, 0.0), goal(0.0, 10.0, -20.0)])]);
    assert_eq!(machine.player_pose().position, Vec3::new(0.0, 11.0, 0.0));

    place_player(&mut machine, Vec3::new(0.0, -10.5, 0.0));
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().deaths, 1);
    assert_eq!(machine.player_pose().position, Vec3::new(0.0, 11.0, 0.0));
}

#[test]
fn test_completion_boundary_is_inclusive() {
    let mut machine = started(vec![simple("A"), simple("B")]);
    place_player(&mut machine, Vec3::new(5.0, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 1);
    assert_eq!(machine.state(), GameState::Playing);
    assert_eq!(machine.level().unwrap().name(), "B");
}

#[test]
fn test_completion_just_outside_threshold() {
    let mut machine = started(vec![simple("A"), simple("B")]);
    place_player(&mut machine, Vec3::new(5.0001, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 0);
    assert_eq!(machine.level().unwrap().name(), "A");
}

#[test]
fn test_completion_vertical_threshold() {
    let mut machine = started(vec![simple("A"), simple("B")]);
    place_player(&mut machine, Vec3::new(0.0, 1.01, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 0);
}

#[test]
fn test_tall_goal_completes_when_landed_on() {
    let mut tall = goal(0.0, 0.0, -20.0);
    tall.height = Some(3.0);
    let mut machine = started(vec![level("Tower", vec![first(0.0, 0.0, 0.0), tall])]);
    // Resting on top: 1.5 above center plus half the player.
    place_player(&mut machine, Vec3::new(0.0, 2.0, -20.0));

    let mut won = false;
    for _ in 0..10 {
        if machine.tick(DT).unwrap().state == GameState::Win {
            won = true;
            break;
        }
    }
    assert!(won, "never completed, state {:?}", machine.state());
    assert_eq!(machine.session().current_level_index, 1);
}

#[test]
fn test_tall_goal_vertical_boundary() {
    let mut tall = goal(0.0, 0.0, -20.0);
    tall.height = Some(3.0);
    let tower = || level("Tower", vec![first(0.0, 0.0, 0.0), tall.clone()]);

    let mut machine = started(vec![tower(), simple("B")]);
    place_player(&mut machine, Vec3::new(0.0, 2.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 1);

    let mut machine = started(vec![tower(), simple("B")]);
    place_player(&mut machine, Vec3::new(0.0, 2.01, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 0);
}

#[test]
fn test_non_positive_dt_is_a_no_op() {
    let mut machine = started(vec![simple("A")]);
    machine.tick(DT).unwrap();
    let elapsed = machine.session().elapsed_time;
    let tick = machine.session().tick;
    let position = machine.player_pose().position;
    machine.deliver(Outcome::HazardHit);

    for dt in [0.0, -1.0] {
        let report = machine.tick(dt).unwrap();
        assert!(!report.ran);
    }
    assert_eq!(machine.session().elapsed_time, elapsed);
    assert_eq!(machine.session().tick, tick);
    assert_eq!(machine.session().deaths, 0);
    assert_eq!(machine.deferred_count(), 1);
    assert_eq!(machine.player_pose().position, position);
}

#[test]
fn test_duplicate_goal_advances_once() {
    let mut machine = started(vec![simple("A"), simple("B"), simple("C")]);
    place_player(&mut machine, Vec3::new(0.0, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.deliver(Outcome::GoalReached);

    let report = machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 1);
    assert_eq!(
        count_events(&report, |d| matches!(d, GameEventData::LevelCompleted { .. })),
        1
    );
    assert_eq!(machine.deferred_count(), 0);

    machine.tick(DT).unwrap();
    assert_eq!(machine.session().current_level_index, 1);
    assert_eq!(machine.level().unwrap().name(), "B");
}

#[test]
fn test_win_on_tick_after_goal_contact() {
    let mut machine = started(vec![simple("Only")]);
    place_player(&mut machine, Vec3::new(0.0, 1.0, -20.0));

    // Contact is reported by this tick's step and handled at the next tick.
    let first = machine.tick(DT).unwrap();
    assert_eq!(first.state, GameState::Playing);
    assert_eq!(machine.deferred_count(), 1);

    let second = machine.tick(DT).unwrap();
    assert_eq!(second.state, GameState::Win);
    assert_eq!(machine.session().current_level_index, machine.level_count());
    assert_eq!(count_events(&second, |d| matches!(d, GameEventData::SessionWon { .. })), 1);

    // Nothing moves after WIN, not even with the player teleported off the map.
    let summary = machine.summary();
    assert_eq!(summary.current_level_display, 1);
    place_player(&mut machine, Vec3::new(0.0, -500.0, 0.0));
    let third = machine.tick(DT).unwrap();
    assert!(!third.ran);
    assert_eq!(machine.session().deaths, 0);
    assert_eq!(machine.player_pose().position, Vec3::new(0.0, -500.0, 0.0));
    assert_eq!(machine.summary(), summary);
}

#[test]
fn test_hazard_contact_kills_next_tick() {
    let mut hazard = PlatformDesc::at(0.0, 0.0, -10.0, 4.0, 4.0);
    hazard.is_hazard = true;
    let mut machine = started(vec![level("Lava", vec![first(0.0, 0.0, 0.0), hazard, goal(0.0, 0.0, -20.0)])]);
    let spawn = machine.player_pose().position;
    place_player(&mut machine, Vec3::new(0.0, 1.0, -10.0));

    machine.tick(DT).unwrap();
    assert_eq!(machine.session().deaths, 0);

    let report = machine.tick(DT).unwrap();
    assert_eq!(machine.session().deaths, 1);
    assert_eq!(machine.player_pose().position, spawn);
    assert_eq!(
        count_events(&report, |d| matches!(d, GameEventData::PlayerDied { cause: DeathCause::Hazard, .. })),
        1
    );
}

#[test]
fn test_enemy_wakes_chases_and_resets_on_death() {
    let mut trigger = PlatformDesc::at(0.0, 0.0, -10.0, 6.0, 6.0);
    trigger.has_enemy = true;
    let mut machine = started(vec![level("Chase", vec![first(0.0, 0.0, 0.0), trigger, goal(0.0, 0.0, -20.0)])]);
    let bodies_before = machine.world().simulated_count();
    place_player(&mut machine, Vec3::new(0.0, 1.0, -10.0));

    machine.tick(DT).unwrap();
    let report = machine.tick(DT).unwrap();
    assert_eq!(count_events(&report, |d| matches!(d, GameEventData::EnemyActivated { .. })), 1);
    assert_eq!(machine.world().simulated_count(), bodies_before + 1);

    let mut died = false;
    for _ in 0..30 {
        machine.tick(DT).unwrap();
        if machine.session().deaths > 0 {
            died = true;
            break;
        }
    }
    assert!(died, "enemy never reached the player");

    let level = machine.level().unwrap();
    let enemy = level.enemies().values().next().unwrap();
    assert!(!enemy.active);
    assert!(!machine.world().is_simulated(enemy.body));
    assert_eq!(machine.world().position(enemy.body), Some(enemy.spawn));
    assert_eq!(machine.world().simulated_count(), bodies_before);
}

#[test]
fn test_moving_platform_body_and_visual_never_diverge() {
    let mut slider = PlatformDesc::at(0.0, 0.0, -10.0, 4.0, 4.0);
    slider.move_axis = Some("x".into());
    slider.move_range = Some(3.0);
    slider.move_speed = Some(2.0);
    let mut lift = PlatformDesc::at(4.0, 0.0, -10.0, 2.0, 2.0);
    lift.move_axis = Some("y".into());
    lift.move_range = Some(1.5);
    let mut machine = started(vec![level("Moving", vec![first(0.0, 0.0, 0.0), slider, lift, goal(0.0, 0.0, -20.0)])]);

    for _ in 0..240 {
        machine.tick(DT).unwrap();
        let level = machine.level().unwrap();
        for platform in level.platforms().iter().filter(|p| p.is_moving()) {
            let body = machine.world().position(platform.body).unwrap();
            let visual = machine.scene().transform(platform.visual).unwrap().position;
            assert_eq!(body.to_array().map(f32::to_bits), visual.to_array().map(f32::to_bits));
        }
    }
}

#[test]
fn test_level_change_leaks_nothing() {
    let mut trigger = PlatformDesc::at(0.0, 0.0, -10.0, 6.0, 6.0);
    trigger.has_enemy = true;
    let first_level = level("A", vec![first(0.0, 0.0, 0.0), trigger, goal(0.0, 0.0, -20.0)]);
    let mut machine = started(vec![first_level, simple("B")]);

    // Player body + 3 platforms + 1 dormant enemy.
    assert_eq!(machine.world().body_count(), 5);
    assert_eq!(machine.scene().visual_count(), 5);

    place_player(&mut machine, Vec3::new(0.0, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();

    assert_eq!(machine.level().unwrap().name(), "B");
    assert_eq!(machine.world().body_count(), 3);
    assert_eq!(machine.world().simulated_count(), 3);
    assert_eq!(machine.scene().visual_count(), 3);

    machine.restart();
    assert_eq!(machine.state(), GameState::Starting);
    assert_eq!(machine.world().body_count(), 1);
    assert_eq!(machine.scene().visual_count(), 1);
    assert_eq!(machine.session().deaths, 0);

    machine.begin_session().unwrap();
    assert_eq!(machine.level().unwrap().name(), "A");
}

#[test]
fn test_missing_first_platform_blocks_session_start() {
    let broken = level("Broken", vec![goal(0.0, 0.0, -20.0)]);
    let mut machine =
        GameStateMachine::new(ArcadeWorld::default(), HeadlessScene::new(), GameConfig::default(), vec![broken])
            .unwrap();

    let err = machine.begin_session().unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::Level { index: 0, source: LevelFormatError::MissingFirstPlatform }
    ));
    assert_eq!(machine.state(), GameState::Starting);
    assert!(machine.level().is_none());
    assert_eq!(machine.world().body_count(), 1);
}

#[test]
fn test_bad_next_level_halts_in_level_complete() {
    let broken = level("Broken", vec![goal(0.0, 0.0, -20.0)]);
    let mut machine = started(vec![simple("A"), broken]);
    place_player(&mut machine, Vec3::new(0.0, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);

    let err = machine.tick(DT).unwrap_err();
    assert!(matches!(err, ConfigurationError::Level { index: 1, .. }));
    assert_eq!(machine.state(), GameState::LevelComplete);
    assert!(!machine.is_loading_level());
    assert_eq!(machine.level().unwrap().name(), "A");

    let report = machine.tick(DT).unwrap();
    assert!(!report.ran);
}

#[test]
fn test_deaths_and_time_survive_level_change() {
    let mut machine = started(vec![simple("A"), simple("B")]);
    for _ in 0..30 {
        machine.tick(DT).unwrap();
    }
    place_player(&mut machine, Vec3::new(0.0, -30.0, 0.0));
    machine.tick(DT).unwrap();
    let elapsed = machine.session().elapsed_time;
    assert!(elapsed > 0.0);

    place_player(&mut machine, Vec3::new(0.0, 1.0, -20.0));
    machine.deliver(Outcome::GoalReached);
    machine.tick(DT).unwrap();

    let summary = machine.summary();
    assert_eq!(summary.deaths, 1);
    assert_eq!(summary.current_level_display, 2);
    assert!(summary.elapsed_time >= elapsed);
}

#[test]
fn test_input_is_last_write_wins() {
    let mut machine = started(vec![simple("A")]);
    let mut right = skyhop::InputIntent::idle();
    right.move_right = true;
    let mut left = skyhop::InputIntent::idle();
    left.move_left = true;

    machine.set_input_intent(right);
    machine.set_input_intent(left);
    machine.tick(DT).unwrap();
    assert!(machine.player_pose().velocity.x < 0.0);
}
