#![forbid(unsafe_code)]

//! Keyboard-drag front end.
//!
//! Arrow keys and WASD move the target. Shift is ignored for matching and
//! instead selects the fine rate. Two motion models are available:
//!
//! - **Delta**: a fixed step on every direction key press, then repeated by
//!   a discrete timer while held.
//! - **Speed**: continuous motion scaled by frame time, driven by
//!   [`KeyboardDragListener::advance`] once per frame.
//!
//! The listener attaches non-exclusively to [`PointerId::FOCUS`] while
//! dragging so pointer cooperators can observe keyboard drags.
//!
//! Holding Meta suppresses key-down handling so OS navigation shortcuts are
//! never hijacked. Releases are still handled so a drag never outlives its
//! keys.

use tracing::{debug, trace, warn};
use web_time::Duration;

use crate::error::ConfigError;
use crate::event::{GestureEvent, Key, KeyEventKind, KeyboardEvent, PointerId};
use crate::geometry::Vector2;
use crate::hotkey::{KeyDescriptor, ModifierSpec, PressedKeySet};
use crate::timer::{RepeatTimer, Ticks};

use super::{DragCore, DragEnv, GestureSession};

// ---------------------------------------------------------------------------
// Configuration Constants
// ---------------------------------------------------------------------------

/// Default coarse step in delta mode (view units).
pub const DEFAULT_DRAG_DELTA: f64 = 10.0;

/// Default fine step in delta mode (view units).
pub const DEFAULT_SHIFT_DRAG_DELTA: f64 = 5.0;

/// Default coarse speed in speed mode (view units per second).
pub const DEFAULT_DRAG_SPEED: f64 = 600.0;

/// Default fine speed in speed mode (view units per second).
pub const DEFAULT_SHIFT_DRAG_SPEED: f64 = 300.0;

/// Default wait before a held key starts repeating in delta mode.
pub const DEFAULT_MOVE_ON_HOLD_DELAY_MS: u64 = 500;

/// Default gap between repeats in delta mode.
pub const DEFAULT_MOVE_ON_HOLD_INTERVAL_MS: u64 = 400;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which axes keyboard dragging may move along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyboardDragDirection {
    #[default]
    Both,
    LeftRight,
    UpDown,
}

impl KeyboardDragDirection {
    fn allows(self, dir: Direction) -> bool {
        match self {
            Self::Both => true,
            Self::LeftRight => matches!(dir, Direction::Left | Direction::Right),
            Self::UpDown => matches!(dir, Direction::Up | Direction::Down),
        }
    }
}

/// How held keys translate into motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyboardDragMotion {
    /// Fixed steps, repeated on a delay + interval timer.
    Delta {
        drag_delta: f64,
        shift_drag_delta: f64,
        move_on_hold_delay: Duration,
        move_on_hold_interval: Duration,
    },
    /// Continuous motion in units per second.
    Speed {
        drag_speed: f64,
        shift_drag_speed: f64,
    },
}

impl Default for KeyboardDragMotion {
    fn default() -> Self {
        Self::speed(DEFAULT_DRAG_SPEED, DEFAULT_SHIFT_DRAG_SPEED)
    }
}

impl KeyboardDragMotion {
    /// Delta mode with the default hold timing.
    #[must_use]
    pub fn delta(drag_delta: f64, shift_drag_delta: f64) -> Self {
        Self::Delta {
            drag_delta,
            shift_drag_delta,
            move_on_hold_delay: Duration::from_millis(DEFAULT_MOVE_ON_HOLD_DELAY_MS),
            move_on_hold_interval: Duration::from_millis(DEFAULT_MOVE_ON_HOLD_INTERVAL_MS),
        }
    }

    #[must_use]
    pub fn speed(drag_speed: f64, shift_drag_speed: f64) -> Self {
        Self::Speed {
            drag_speed,
            shift_drag_speed,
        }
    }

    /// Replace the hold timing; no effect in speed mode.
    #[must_use]
    pub fn with_hold_timing(self, delay: Duration, interval: Duration) -> Self {
        match self {
            Self::Delta {
                drag_delta,
                shift_drag_delta,
                ..
            } => Self::Delta {
                drag_delta,
                shift_drag_delta,
                move_on_hold_delay: delay,
                move_on_hold_interval: interval,
            },
            speed @ Self::Speed { .. } => speed,
        }
    }

    /// Check rates are finite, non-negative and `shift <= base`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (base_field, base, shift_field, shift) = match *self {
            Self::Delta {
                drag_delta,
                shift_drag_delta,
                move_on_hold_interval,
                ..
            } => {
                if move_on_hold_interval.is_zero() {
                    return Err(ConfigError::ZeroInterval {
                        field: "move_on_hold_interval",
                    });
                }
                ("drag_delta", drag_delta, "shift_drag_delta", shift_drag_delta)
            }
            Self::Speed {
                drag_speed,
                shift_drag_speed,
            } => ("drag_speed", drag_speed, "shift_drag_speed", shift_drag_speed),
        };

        for (field, value) in [(base_field, base), (shift_field, shift)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if shift > base {
            return Err(ConfigError::ShiftExceedsBase {
                field: shift_field,
                shift_value: shift,
                value: base,
            });
        }
        Ok(())
    }

    fn timer(&self) -> RepeatTimer {
        match *self {
            Self::Delta {
                move_on_hold_delay,
                move_on_hold_interval,
                ..
            } => RepeatTimer::discrete(move_on_hold_delay, move_on_hold_interval),
            Self::Speed { .. } => RepeatTimer::continuous(),
        }
    }

    fn is_delta(&self) -> bool {
        matches!(self, Self::Delta { .. })
    }
}

/// Keyboard-drag settings.
///
/// # Environment Variables
///
/// | Variable | Type | Description |
/// |----------|------|-------------|
/// | `GESTURE_KBD_DRAG_DELTA` | f64 | Coarse step (selects delta mode) |
/// | `GESTURE_KBD_SHIFT_DRAG_DELTA` | f64 | Fine step (selects delta mode) |
/// | `GESTURE_KBD_MOVE_ON_HOLD_DELAY_MS` | u64 | Delta-mode repeat delay |
/// | `GESTURE_KBD_MOVE_ON_HOLD_INTERVAL_MS` | u64 | Delta-mode repeat interval |
/// | `GESTURE_KBD_DRAG_SPEED` | f64 | Coarse speed (selects speed mode) |
/// | `GESTURE_KBD_SHIFT_DRAG_SPEED` | f64 | Fine speed (selects speed mode) |
/// | `GESTURE_UNRELIABLE_MULTI_KEY_KEYUP` | bool | Interrupt when two drag keys are held |
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeyboardDragConfig {
    pub motion: KeyboardDragMotion,
    pub direction: KeyboardDragDirection,
    /// The platform may drop key-ups while several keys are held; interrupt
    /// instead of risking a stuck direction.
    pub unreliable_multi_key_keyup: bool,
}

impl KeyboardDragConfig {
    #[must_use]
    pub fn with_motion(mut self, motion: KeyboardDragMotion) -> Self {
        self.motion = motion;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: KeyboardDragDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_unreliable_multi_key_keyup(mut self, unreliable: bool) -> Self {
        self.unreliable_multi_key_keyup = unreliable;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motion.validate()
    }

    /// Load from environment variables.
    ///
    /// Setting any delta-mode variable selects delta mode; setting any
    /// speed-mode variable selects speed mode; setting both is an error.
    /// Unset values keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let drag_delta = env_f64("GESTURE_KBD_DRAG_DELTA");
        let shift_drag_delta = env_f64("GESTURE_KBD_SHIFT_DRAG_DELTA");
        let delay = env_ms("GESTURE_KBD_MOVE_ON_HOLD_DELAY_MS");
        let interval = env_ms("GESTURE_KBD_MOVE_ON_HOLD_INTERVAL_MS");
        let drag_speed = env_f64("GESTURE_KBD_DRAG_SPEED");
        let shift_drag_speed = env_f64("GESTURE_KBD_SHIFT_DRAG_SPEED");

        let delta_mode = drag_delta.is_some()
            || shift_drag_delta.is_some()
            || delay.is_some()
            || interval.is_some();
        let speed_mode = drag_speed.is_some() || shift_drag_speed.is_some();

        let motion = match (delta_mode, speed_mode) {
            (true, true) => return Err(ConfigError::MixedMotionModes),
            (true, false) => KeyboardDragMotion::delta(
                drag_delta.unwrap_or(DEFAULT_DRAG_DELTA),
                shift_drag_delta.unwrap_or(DEFAULT_SHIFT_DRAG_DELTA),
            )
            .with_hold_timing(
                delay.unwrap_or(Duration::from_millis(DEFAULT_MOVE_ON_HOLD_DELAY_MS)),
                interval.unwrap_or(Duration::from_millis(DEFAULT_MOVE_ON_HOLD_INTERVAL_MS)),
            ),
            (false, _) => KeyboardDragMotion::speed(
                drag_speed.unwrap_or(DEFAULT_DRAG_SPEED),
                shift_drag_speed.unwrap_or(DEFAULT_SHIFT_DRAG_SPEED),
            ),
        };

        let mut config = Self::default().with_motion(motion);
        if let Ok(val) = std::env::var("GESTURE_UNRELIABLE_MULTI_KEY_KEYUP") {
            config.unreliable_multi_key_keyup = val == "1" || val.eq_ignore_ascii_case("true");
        }
        config.validate()?;
        Ok(config)
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok()?.trim().parse::<f64>().ok()
}

fn env_ms(name: &str) -> Option<Duration> {
    let ms = std::env::var(name).ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_millis(ms))
}

// ---------------------------------------------------------------------------
// Tracked keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    fn keys(self) -> [Key; 2] {
        match self {
            Self::Left => [Key::ArrowLeft, Key::Char('a')],
            Self::Right => [Key::ArrowRight, Key::Char('d')],
            Self::Up => [Key::ArrowUp, Key::Char('w')],
            Self::Down => [Key::ArrowDown, Key::Char('s')],
        }
    }

    fn unit(self) -> Vector2 {
        match self {
            Self::Left => Vector2::new(-1.0, 0.0),
            Self::Right => Vector2::new(1.0, 0.0),
            Self::Up => Vector2::new(0.0, -1.0),
            Self::Down => Vector2::new(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Drags a target with direction keys while it has keyboard focus.
#[derive(Debug)]
pub struct KeyboardDragListener {
    core: DragCore,
    config: KeyboardDragConfig,
    timer: RepeatTimer,
    tracked: Vec<(Direction, KeyDescriptor)>,
}

impl KeyboardDragListener {
    /// Wrap a configured core. Fails if the motion settings are invalid
    /// (e.g. a fine rate above its coarse rate).
    pub fn new(core: DragCore, config: KeyboardDragConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shift_ignored = ModifierSpec {
            key: Key::Shift,
            ignorable: true,
        };
        let tracked = Direction::ALL
            .into_iter()
            .filter(|d| config.direction.allows(*d))
            .flat_map(|d| {
                d.keys()
                    .map(|k| (d, KeyDescriptor::single(k).with_modifier(shift_ignored)))
            })
            .collect();
        Ok(Self {
            core,
            timer: config.motion.timer(),
            config,
            tracked,
        })
    }

    #[must_use]
    pub fn core(&self) -> &DragCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DragCore {
        &mut self.core
    }

    #[must_use]
    pub fn config(&self) -> &KeyboardDragConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.core.is_dragging()
    }

    /// True if `key` triggers one of the tracked direction descriptors.
    #[must_use]
    pub fn tracks(&self, key: Key) -> bool {
        self.tracked.iter().any(|(_, d)| d.trigger() == key)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Route one native key event delivered while the target has focus.
    /// `keys` must already reflect `event`. Returns `true` if consumed.
    pub fn handle_key_event(
        &mut self,
        env: &mut DragEnv<'_>,
        keys: &PressedKeySet,
        event: &KeyboardEvent,
    ) -> bool {
        let consumed = self.dispatch(env, keys, event);
        self.sync_timer();
        consumed
    }

    fn dispatch(
        &mut self,
        env: &mut DragEnv<'_>,
        keys: &PressedKeySet,
        event: &KeyboardEvent,
    ) -> bool {
        // Releases always get through so a drag can end while Meta is held.
        if event.kind != KeyEventKind::Release && (event.meta() || keys.is_down(Key::Meta)) {
            trace!(key = %event.key, "meta held, keyboard drag ignores key down");
            return false;
        }
        if self.core.is_disposed() || !self.tracks(event.key) {
            return false;
        }

        let matched = self.matched_count(keys);
        if self.config.unreliable_multi_key_keyup && matched > 1 {
            if self.core.is_dragging() {
                warn!(
                    listener = %self.core.id(),
                    matched,
                    "several drag keys held on a platform with unreliable key-up, interrupting"
                );
                self.core.interrupt(env);
            }
            return true;
        }

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if !self.core.is_dragging() {
                    if self.direction(keys).is_zero() {
                        return false;
                    }
                    if !self.start(env, event) {
                        return false;
                    }
                    if self.config.motion.is_delta() {
                        self.step_delta(env, keys, GestureEvent::Keyboard(*event));
                    }
                } else if event.kind == KeyEventKind::Press && self.config.motion.is_delta() {
                    // A new key press moves at once and restarts the hold countdown.
                    self.timer.stop(false);
                    self.timer.start();
                    self.step_delta(env, keys, GestureEvent::Keyboard(*event));
                }
                true
            }
            KeyEventKind::Release => {
                if self.core.is_dragging() && matched == 0 {
                    self.core
                        .finish(env, Some(GestureEvent::Keyboard(*event)), false, false);
                }
                true
            }
        }
    }

    fn start(&mut self, env: &mut DragEnv<'_>, event: &KeyboardEvent) -> bool {
        if let Err(err) = self.core.check_can_start() {
            debug!(listener = %self.core.id(), %err, "keyboard drag start refused");
            return false;
        }
        let id = self.core.id();
        if let Err(err) = env.pointers.attach(PointerId::FOCUS, id, false) {
            debug!(listener = %id, %err, "focus pointer held exclusively");
            return false;
        }
        self.timer.start();
        self.core.begin(
            env,
            GestureSession::new(Some(PointerId::FOCUS)),
            GestureEvent::Keyboard(*event),
        );
        true
    }

    /// Advance the repeat timer by one frame and apply any motion it yields.
    pub fn advance(&mut self, env: &mut DragEnv<'_>, keys: &PressedKeySet, dt: Duration) {
        if !self.core.is_dragging() || keys.is_down(Key::Meta) {
            return;
        }
        let synthetic = GestureEvent::Synthetic {
            pointer: Some(PointerId::FOCUS),
            current_target: self.core.target(),
        };
        match self.timer.advance(dt) {
            Ticks::None => {}
            Ticks::Steps(n) => {
                for _ in 0..n {
                    if !self.core.is_dragging() {
                        break;
                    }
                    self.step_delta(env, keys, synthetic);
                }
            }
            Ticks::Frame(frame) => {
                if let KeyboardDragMotion::Speed {
                    drag_speed,
                    shift_drag_speed,
                } = self.config.motion
                {
                    let speed = if keys.is_down(Key::Shift) {
                        shift_drag_speed
                    } else {
                        drag_speed
                    };
                    self.step(env, keys, speed * frame.as_secs_f64(), synthetic);
                }
            }
        }
        self.sync_timer();
    }

    fn step_delta(&mut self, env: &mut DragEnv<'_>, keys: &PressedKeySet, event: GestureEvent) {
        if let KeyboardDragMotion::Delta {
            drag_delta,
            shift_drag_delta,
            ..
        } = self.config.motion
        {
            let amount = if keys.is_down(Key::Shift) {
                shift_drag_delta
            } else {
                drag_delta
            };
            self.step(env, keys, amount, event);
        }
    }

    /// One motion step of `amount` view units along the held directions.
    fn step(&mut self, env: &mut DragEnv<'_>, keys: &PressedKeySet, amount: f64, event: GestureEvent) {
        let view_delta = self.direction(keys) * amount;
        if view_delta.is_zero() {
            return;
        }
        let delta = self.core.model_view_transform().inverse_delta(view_delta);
        let proposed = self.core.position() + delta;
        self.core.apply_motion(env, delta, proposed, event);
    }

    /// Sum of unit vectors of held directions.
    fn direction(&self, keys: &PressedKeySet) -> Vector2 {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                self.tracked
                    .iter()
                    .any(|(d, desc)| d == dir && desc.matches_standard(keys))
            })
            .fold(Vector2::ZERO, |acc, dir| acc + dir.unit())
    }

    fn matched_count(&self, keys: &PressedKeySet) -> usize {
        self.tracked
            .iter()
            .filter(|(_, desc)| desc.matches_standard(keys))
            .count()
    }

    fn sync_timer(&mut self) {
        if !self.core.is_dragging() && self.timer.is_running() {
            self.timer.stop(false);
        }
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    /// End the active drag as interrupted. Idempotent.
    pub fn interrupt(&mut self, env: &mut DragEnv<'_>) -> bool {
        let ended = self.core.interrupt(env);
        self.sync_timer();
        ended
    }

    /// Interrupt and roll back to the start snapshot.
    pub fn cancel(&mut self, env: &mut DragEnv<'_>) -> bool {
        let ended = self.core.cancel(env);
        self.sync_timer();
        ended
    }

    /// The key state was wiped (window blur).
    pub fn handle_key_state_cleared(&mut self, env: &mut DragEnv<'_>) {
        self.interrupt(env);
    }

    /// Interrupt and refuse further starts. Idempotent.
    pub fn dispose(&mut self, env: &mut DragEnv<'_>) {
        self.core.dispose(env);
        self.sync_timer();
    }
}
