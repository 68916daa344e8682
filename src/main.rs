//! Skyhop Headless Runner
//!
//! Plays a scripted session against the headless world, then replays the
//! recorded input and checks that the final state hash matches.
//!
//! ```text
//! skyhop [--config game.json] [level.json ...]
//! ```
//!
//! Without level paths the bundled levels are used.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skyhop::{
    ArcadeWorld, GameConfig, GameState, GameStateMachine, HeadlessScene, InputIntent, LevelData,
    TICK_RATE, VERSION,
    game::{events::GameEventData, tick::replay_session},
};

const BUNDLED_LEVELS: [(&str, &str); 3] = [
    ("levels/1.json", include_str!("../levels/1.json")),
    ("levels/2.json", include_str!("../levels/2.json")),
    ("levels/3.json", include_str!("../levels/3.json")),
];

/// Longest scripted run (s).
const DEMO_SECONDS: u32 = 90;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Skyhop v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let (config, levels) = parse_args(std::env::args().skip(1))?;
    demo_session(config, levels)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(GameConfig, Vec<LevelData>)> {
    let mut config = GameConfig::default();
    let mut level_paths = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a path");
                };
                config = GameConfig::load(&path).with_context(|| format!("loading config {}", path))?;
            }
            _ => level_paths.push(arg),
        }
    }

    let levels = if level_paths.is_empty() {
        BUNDLED_LEVELS
            .iter()
            .map(|(name, json)| LevelData::from_json_str(json).with_context(|| format!("bundled {}", name)))
            .collect::<Result<Vec<_>>>()?
    } else {
        level_paths
            .iter()
            .map(|path| LevelData::load(path).with_context(|| format!("loading level {}", path)))
            .collect::<Result<Vec<_>>>()?
    };
    Ok((config, levels))
}

/// Hold forward and hop at a steady rhythm.
fn scripted_intent(tick: u32) -> InputIntent {
    let mut intent = InputIntent::idle().with_jump(tick % 75 < 18);
    intent.move_forward = true;
    intent
}

/// Demo function to exercise the state machine end to end.
fn demo_session(config: GameConfig, levels: Vec<LevelData>) -> Result<()> {
    info!("=== Starting Demo Session ===");
    for (index, level) in levels.iter().enumerate() {
        info!("Level {}: {:?} ({} platforms)", index + 1, level.name, level.platforms.len());
    }

    let dt = config.tick_dt();
    let max_ticks = DEMO_SECONDS * config.tick_rate;
    let world = ArcadeWorld::new(config.gravity);
    let mut machine = GameStateMachine::new(world, HeadlessScene::new(), config.clone(), levels.clone())?;

    machine.start_recording();
    machine.begin_session()?;

    for t in 0..max_ticks {
        machine.set_input_intent(scripted_intent(t));
        let report = match machine.tick(dt) {
            Ok(report) => report,
            Err(err) => {
                warn!("Session halted: {}", err);
                break;
            }
        };

        for event in &report.events {
            match &event.data {
                GameEventData::PlayerDied { cause, deaths, .. } => {
                    info!("Tick {}: player died ({:?}), deaths={}", event.tick, cause, deaths);
                }
                GameEventData::LevelLoaded { index, name } => {
                    info!("Tick {}: level {} loaded ({})", event.tick, index + 1, name);
                }
                GameEventData::EnemyActivated { trigger } => {
                    info!("Tick {}: enemy on platform {} woke up", event.tick, trigger.0);
                }
                _ => {}
            }
        }

        if t % (10 * TICK_RATE) == 0 {
            let pose = machine.player_pose();
            info!(
                "Tick {}: pos=({:.2}, {:.2}, {:.2}) state={:?}",
                t, pose.position.x, pose.position.y, pose.position.z, report.state
            );
        }

        if report.state == GameState::Win {
            break;
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let summary = machine.summary();
    info!("State: {:?}", machine.state());
    info!("Level: {}/{}", summary.current_level_display, machine.level_count());
    info!("Deaths: {}", summary.deaths);
    info!("Time: {}", summary.formatted_time());
    let hash = machine.state_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let Some(recording) = machine.take_recording() else {
        bail!("recording was not captured");
    };
    info!("Recorded {} ticks in {} input changes", recording.end_tick, recording.delta_count());
    info!("Recording Fingerprint: {}", hex::encode(recording.fingerprint()));
    if machine.state() == GameState::LevelComplete {
        warn!("Session halted on a level load; skipping replay");
        return Ok(());
    }

    let replay = replay_session(levels, config, &recording)?;
    info!("Replay State Hash: {}", hex::encode(replay.hash));

    if hash == replay.hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }
    Ok(())
}
