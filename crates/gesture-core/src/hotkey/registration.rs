#![forbid(unsafe_code)]

//! Hotkey registrations: a descriptor plus lifecycle callbacks and firing
//! policy.

use std::fmt;

use web_time::Duration;

use crate::error::DescriptorError;
use crate::event::{Key, KeyboardEvent};
use crate::scene::NodeId;

use super::descriptor::KeyDescriptor;

// ---------------------------------------------------------------------------
// Configuration Constants
// ---------------------------------------------------------------------------

/// Default delay before the first fire-on-hold repeat.
pub const DEFAULT_HOLD_DELAY_MS: u64 = 400;

/// Default interval between fire-on-hold repeats.
pub const DEFAULT_HOLD_INTERVAL_MS: u64 = 100;

/// Upper bound for the hold delay.
pub const MAX_HOLD_DELAY_MS: u64 = 5_000;

/// Lower bound for the hold interval.
pub const MIN_HOLD_INTERVAL_MS: u64 = 10;

/// Upper bound for the hold interval.
pub const MAX_HOLD_INTERVAL_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Hold timing
// ---------------------------------------------------------------------------

/// Delay and interval for timer-driven fire-on-hold.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `GESTURE_HOLD_DELAY_MS` | u64 | 400 | Wait before the first repeat |
/// | `GESTURE_HOLD_INTERVAL_MS` | u64 | 100 | Gap between repeats |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldTiming {
    pub delay: Duration,
    pub interval: Duration,
}

impl Default for HoldTiming {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_HOLD_DELAY_MS),
            interval: Duration::from_millis(DEFAULT_HOLD_INTERVAL_MS),
        }
    }
}

impl HoldTiming {
    #[must_use]
    pub fn new(delay: Duration, interval: Duration) -> Self {
        Self { delay, interval }
    }

    /// Load from environment variables, clamped to safe ranges.
    #[must_use]
    pub fn from_env() -> Self {
        let mut timing = Self::default();

        if let Ok(val) = std::env::var("GESTURE_HOLD_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            timing.delay = Duration::from_millis(ms);
        }

        if let Ok(val) = std::env::var("GESTURE_HOLD_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            timing.interval = Duration::from_millis(ms);
        }

        timing.validated()
    }

    /// Clamp delay to `0..=5000ms` and interval to `10..=5000ms`.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX);
        self.delay = Duration::from_millis(delay_ms.min(MAX_HOLD_DELAY_MS));

        let interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        self.interval =
            Duration::from_millis(interval_ms.clamp(MIN_HOLD_INTERVAL_MS, MAX_HOLD_INTERVAL_MS));
        self
    }
}

/// How fire-on-hold repeats are paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FireOnHoldTiming {
    /// Fire on each native key-repeat event of the trigger key.
    Browser,
    /// Fire from an internal discrete timer.
    Custom(HoldTiming),
}

impl Default for FireOnHoldTiming {
    fn default() -> Self {
        Self::Custom(HoldTiming::default())
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Where a hotkey is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HotkeyScope {
    /// Always available.
    #[default]
    Always,
    /// Available while `owner` is on the focused trail. More deeply focused
    /// owners dispatch first.
    Local { owner: NodeId },
    /// Available while `target` is displayed, enabled and input-enabled,
    /// regardless of focus.
    Global { target: NodeId },
}

impl HotkeyScope {
    /// Node-scoped hotkeys do not overlap by default; the others do.
    #[must_use]
    pub const fn default_allow_overlap(self) -> bool {
        !matches!(self, Self::Local { .. })
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Handle returned by [`HotkeyManager::register`](super::HotkeyManager::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HotkeyId(pub(crate) u64);

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hotkey#{}", self.0)
    }
}

/// Argument to every hotkey callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyInvocation {
    pub hotkey: HotkeyId,
    pub trigger: Key,
    /// The native event being dispatched, if any (none for timer fires and
    /// availability changes).
    pub event: Option<KeyboardEvent>,
    /// True only during the release call caused by an interruption.
    pub interrupted: bool,
}

pub(crate) type HotkeyCallback = Box<dyn FnMut(&HotkeyInvocation)>;

// ---------------------------------------------------------------------------
// Hotkey
// ---------------------------------------------------------------------------

/// A key combination bound to press/fire/release callbacks.
///
/// ```
/// use gesture_core::hotkey::{Hotkey, HotkeyManager, PressedKeySet};
/// use gesture_core::event::{Key, KeyboardEvent};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let fired = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&fired);
/// let mut manager = HotkeyManager::new();
/// manager.register(Hotkey::new("shift+y").unwrap().on_fire(move |_| counter.set(counter.get() + 1)));
///
/// let mut keys = PressedKeySet::new();
/// for ev in [KeyboardEvent::press(Key::Shift), KeyboardEvent::press(Key::Char('y'))] {
///     keys.apply(&ev);
///     manager.handle_key_event(&keys, &ev);
/// }
/// assert_eq!(fired.get(), 1);
/// ```
pub struct Hotkey {
    pub(crate) descriptor: KeyDescriptor,
    pub(crate) scope: HotkeyScope,
    pub(crate) fire_on_down: bool,
    pub(crate) fire_on_hold: bool,
    pub(crate) hold_timing: FireOnHoldTiming,
    pub(crate) allow_overlap: Option<bool>,
    pub(crate) label: String,
    pub(crate) on_press: Option<HotkeyCallback>,
    pub(crate) on_fire: Option<HotkeyCallback>,
    pub(crate) on_release: Option<HotkeyCallback>,
}

impl fmt::Debug for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotkey")
            .field("descriptor", &self.descriptor.to_string())
            .field("scope", &self.scope)
            .field("fire_on_down", &self.fire_on_down)
            .field("fire_on_hold", &self.fire_on_hold)
            .field("allow_overlap", &self.allows_overlap())
            .finish_non_exhaustive()
    }
}

impl Hotkey {
    /// Parse `keys` and build a hotkey with default policy: always
    /// available, fires on down, no fire-on-hold.
    pub fn new(keys: &str) -> Result<Self, DescriptorError> {
        Ok(Self::from_descriptor(KeyDescriptor::parse(keys)?))
    }

    /// Build from an already parsed descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: KeyDescriptor) -> Self {
        let label = descriptor.to_string();
        Self {
            descriptor,
            scope: HotkeyScope::Always,
            fire_on_down: true,
            fire_on_hold: false,
            hold_timing: FireOnHoldTiming::default(),
            allow_overlap: None,
            label,
            on_press: None,
            on_fire: None,
            on_release: None,
        }
    }

    /// Available while `owner` is on the focused trail.
    #[must_use]
    pub fn local(mut self, owner: NodeId) -> Self {
        self.scope = HotkeyScope::Local { owner };
        self
    }

    /// Available while `target` is displayed and input-enabled.
    #[must_use]
    pub fn global(mut self, target: NodeId) -> Self {
        self.scope = HotkeyScope::Global { target };
        self
    }

    /// Fire on match (`true`, default) or on natural release (`false`).
    #[must_use]
    pub fn fire_on_down(mut self, fire_on_down: bool) -> Self {
        self.fire_on_down = fire_on_down;
        self
    }

    /// Repeat `fire` while held, paced by `timing`.
    #[must_use]
    pub fn fire_on_hold(mut self, timing: FireOnHoldTiming) -> Self {
        self.fire_on_hold = true;
        self.hold_timing = timing;
        self
    }

    /// Override the scope's default overlap policy.
    #[must_use]
    pub fn allow_overlap(mut self, allow: bool) -> Self {
        self.allow_overlap = Some(allow);
        self
    }

    /// Name used by instrumentation; defaults to the descriptor text.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn on_press(mut self, f: impl FnMut(&HotkeyInvocation) + 'static) -> Self {
        self.on_press = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_fire(mut self, f: impl FnMut(&HotkeyInvocation) + 'static) -> Self {
        self.on_fire = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_release(mut self, f: impl FnMut(&HotkeyInvocation) + 'static) -> Self {
        self.on_release = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn descriptor(&self) -> &KeyDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn scope(&self) -> HotkeyScope {
        self.scope
    }

    /// Resolved overlap policy.
    #[must_use]
    pub fn allows_overlap(&self) -> bool {
        self.allow_overlap
            .unwrap_or_else(|| self.scope.default_allow_overlap())
    }
}
