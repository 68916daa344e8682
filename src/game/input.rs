//! Input Intent and Recording
//!
//! The input collaborator writes the latest [`InputIntent`] between ticks
//! (last write wins, nothing is queued). The controller reads it once per tick.
//! [`InputRecording`] keeps a delta-compressed log of those intents for replay.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::core::math::Vec2;
use crate::error::RecordingError;

/// Drag distance (pixels) at which the on-screen joystick is fully deflected.
pub const JOYSTICK_RADIUS: f32 = 50.0;

/// Discrete keys understood by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// -X
    Left,
    /// +X
    Right,
    /// -Z
    Forward,
    /// +Z
    Backward,
    /// Jump
    Jump,
}

/// Movement intent for one tick.
///
/// `joystick`, when present, overrides the four movement flags.
/// `x` maps to world X (right), `y` to world Z (backward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputIntent {
    /// Move toward -X
    pub move_left: bool,
    /// Move toward +X
    pub move_right: bool,
    /// Move toward -Z
    pub move_forward: bool,
    /// Move toward +Z
    pub move_backward: bool,
    /// Jump button held
    pub jump_held: bool,
    /// Continuous override, components in [-1, 1]
    pub joystick: Option<Vec2>,
}

/// Input on one horizontal axis after resolving flags and joystick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisInput {
    /// Signed drive in [-1, 1]
    pub drive: f32,
    /// Whether any input is asserted on this axis
    pub engaged: bool,
}

impl AxisInput {
    fn from_flags(negative: bool, positive: bool) -> Self {
        let drive = (positive as i8 - negative as i8) as f32;
        Self {
            drive,
            engaged: negative || positive,
        }
    }

    fn from_component(value: f32) -> Self {
        let drive = value.clamp(-1.0, 1.0);
        Self {
            drive,
            engaged: drive != 0.0,
        }
    }
}

impl InputIntent {
    /// Intent with nothing pressed.
    pub const fn idle() -> Self {
        Self {
            move_left: false,
            move_right: false,
            move_forward: false,
            move_backward: false,
            jump_held: false,
            joystick: None,
        }
    }

    /// Builder: hold jump.
    pub fn with_jump(mut self, held: bool) -> Self {
        self.jump_held = held;
        self
    }

    /// Builder: set a joystick override.
    pub fn with_joystick(mut self, stick: Vec2) -> Self {
        self.joystick = Some(stick);
        self
    }

    /// Key-down.
    pub fn press(&mut self, key: Key) {
        self.set_key(key, true);
    }

    /// Key-up.
    pub fn release(&mut self, key: Key) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::Left => self.move_left = down,
            Key::Right => self.move_right = down,
            Key::Forward => self.move_forward = down,
            Key::Backward => self.move_backward = down,
            Key::Jump => self.jump_held = down,
        }
    }

    /// Apply an on-screen joystick drag in pixels.
    ///
    /// The drag is scaled by [`JOYSTICK_RADIUS`] and clamped to the unit
    /// circle. A zero drag (finger lifted) clears the override.
    pub fn set_joystick_drag(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            self.joystick = None;
            return;
        }
        self.joystick = Some((Vec2::new(dx, dy) / JOYSTICK_RADIUS).clamp_length_max(1.0));
    }

    /// Resolved input on the X axis.
    pub fn x_axis(&self) -> AxisInput {
        match self.joystick {
            Some(stick) => AxisInput::from_component(stick.x),
            None => AxisInput::from_flags(self.move_left, self.move_right),
        }
    }

    /// Resolved input on the Z axis.
    pub fn z_axis(&self) -> AxisInput {
        match self.joystick {
            Some(stick) => AxisInput::from_component(stick.y),
            None => AxisInput::from_flags(self.move_forward, self.move_backward),
        }
    }

    /// Nothing asserted at all.
    pub fn is_idle(&self) -> bool {
        *self == Self::idle()
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_bool(self.move_left);
        hasher.update_bool(self.move_right);
        hasher.update_bool(self.move_forward);
        hasher.update_bool(self.move_backward);
        hasher.update_bool(self.jump_held);
        match self.joystick {
            Some(stick) => {
                hasher.update_u8(1);
                hasher.update_f32(stick.x);
                hasher.update_f32(stick.y);
            }
            None => hasher.update_u8(0),
        }
    }
}

/// Intent that began at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentDelta {
    /// Tick when this intent began
    pub tick: u64,
    /// The new intent
    pub intent: InputIntent,
}

/// Delta-compressed intent log for one session.
///
/// Only ticks where the intent changed are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// Fixed tick length the session ran at
    pub dt: f32,
    /// Last recorded tick
    pub end_tick: u64,
    deltas: Vec<IntentDelta>,
    #[serde(skip)]
    last_intent: Option<InputIntent>,
}

impl InputRecording {
    /// Create an empty recording for a fixed tick length.
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_intent: None,
        }
    }

    /// Record the intent used on `tick`.
    pub fn record(&mut self, tick: u64, intent: InputIntent) {
        self.end_tick = tick;
        let last = self.last_intent.or_else(|| self.deltas.last().map(|d| d.intent));
        if last != Some(intent) {
            self.deltas.push(IntentDelta { tick, intent });
            self.last_intent = Some(intent);
        }
    }

    /// Intent in effect on `tick`. Idle before the first delta.
    pub fn intent_at(&self, tick: u64) -> InputIntent {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputIntent::idle()
        } else {
            self.deltas[idx - 1].intent
        }
    }

    /// Stored deltas.
    pub fn deltas(&self) -> &[IntentDelta] {
        &self.deltas
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Iterate `(tick, intent)` for every tick from 1 through `end_tick`.
    pub fn replay_iter(&self) -> impl Iterator<Item = (u64, InputIntent)> + '_ {
        (1..=self.end_tick).map(move |tick| (tick, self.intent_at(tick)))
    }

    /// SHA-256 over the tick length and every stored delta.
    pub fn fingerprint(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_recording();
        hasher.update_f32(self.dt);
        hasher.update_u64(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u64(delta.tick);
            delta.intent.hash_into(&mut hasher);
        }
        hasher.finalize()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordingError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordingError> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposing_flags_cancel_but_stay_engaged() {
        let mut intent = InputIntent::idle();
        intent.press(Key::Left);
        intent.press(Key::Right);
        let x = intent.x_axis();
        assert_eq!(x.drive, 0.0);
        assert!(x.engaged);

        let z = intent.z_axis();
        assert_eq!(z.drive, 0.0);
        assert!(!z.engaged);
    }

    #[test]
    fn test_flag_directions() {
        let mut intent = InputIntent::idle();
        intent.press(Key::Right);
        intent.press(Key::Forward);
        assert_eq!(intent.x_axis().drive, 1.0);
        assert_eq!(intent.z_axis().drive, -1.0);

        intent.release(Key::Right);
        intent.press(Key::Left);
        intent.release(Key::Forward);
        intent.press(Key::Backward);
        assert_eq!(intent.x_axis().drive, -1.0);
        assert_eq!(intent.z_axis().drive, 1.0);
    }

    #[test]
    fn test_joystick_overrides_flags() {
        let mut intent = InputIntent::idle();
        intent.press(Key::Left);
        intent.joystick = Some(Vec2::new(0.5, 0.0));

        let x = intent.x_axis();
        assert_eq!(x.drive, 0.5);
        assert!(x.engaged);
        assert!(!intent.z_axis().engaged);
    }

    #[test]
    fn test_joystick_drag_scaling() {
        let mut intent = InputIntent::idle();
        intent.set_joystick_drag(25.0, 0.0);
        assert_eq!(intent.joystick, Some(Vec2::new(0.5, 0.0)));

        intent.set_joystick_drag(300.0, 400.0);
        let stick = intent.joystick.unwrap();
        assert!((stick.length() - 1.0).abs() < 1e-5);

        intent.set_joystick_drag(0.0, 0.0);
        assert!(intent.joystick.is_none());
    }

    #[test]
    fn test_recording_delta_compression() {
        let mut rec = InputRecording::new(1.0 / 60.0);
        let walk = InputIntent { move_right: true, ..InputIntent::idle() };
        for tick in 1..=4 {
            rec.record(tick, walk);
        }
        assert_eq!(rec.delta_count(), 1);

        rec.record(5, walk.with_jump(true));
        assert_eq!(rec.delta_count(), 2);
        assert_eq!(rec.end_tick, 5);
    }

    #[test]
    fn test_recording_lookup_and_replay() {
        let mut rec = InputRecording::new(1.0 / 60.0);
        let walk = InputIntent { move_right: true, ..InputIntent::idle() };
        let jump = InputIntent::idle().with_jump(true);
        rec.record(3, walk);
        rec.record(6, jump);
        rec.record(8, jump);

        assert!(rec.intent_at(1).is_idle());
        assert_eq!(rec.intent_at(3), walk);
        assert_eq!(rec.intent_at(5), walk);
        assert_eq!(rec.intent_at(7), jump);

        let frames: Vec<_> = rec.replay_iter().collect();
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[0], (1, InputIntent::idle()));
        assert_eq!(frames[7], (8, jump));
    }

    #[test]
    fn test_recording_bytes_roundtrip() {
        let mut rec = InputRecording::new(1.0 / 60.0);
        rec.record(1, InputIntent::idle().with_joystick(Vec2::new(0.25, -1.0)));
        rec.record(9, InputIntent::idle());

        let bytes = rec.to_bytes().unwrap();
        let decoded = InputRecording::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.deltas(), rec.deltas());
        assert_eq!(decoded.end_tick, 9);
        assert_eq!(decoded.fingerprint(), rec.fingerprint());
    }

    #[test]
    fn test_fingerprint_sees_joystick() {
        let mut a = InputRecording::new(1.0 / 60.0);
        let mut b = InputRecording::new(1.0 / 60.0);
        a.record(1, InputIntent::idle().with_joystick(Vec2::new(0.5, 0.0)));
        b.record(1, InputIntent::idle().with_joystick(Vec2::new(0.25, 0.0)));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
