#![forbid(unsafe_code)]

//! Timing engine: repeat timers for held keys and held drags.
//!
//! Two timer kinds are interchangeable through [`RepeatTimer`]:
//!
//! - [`DiscreteTimer`]: after `delay`, fires once, then every `interval`,
//!   until stopped. Used for fixed-step motion and hotkey fire-on-hold.
//! - [`ContinuousTimer`]: yields the elapsed frame time on every advance.
//!   Used for speed-based motion, so distance per second is independent of
//!   frame rate.
//!
//! Timers are driven by the host: call `advance(dt)` once per animation
//! frame. Nothing here reads a clock, which keeps every transition
//! deterministic under test.
//!
//! [`FrameEmitter`] is the host-side per-frame callback list; its callbacks may
//! add or remove listeners (including themselves) while being invoked.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  start()   ┌─────────┐
//! │ Stopped │──────────▶│ Running │──┐ start(): restart delay countdown
//! └─────────┘            └─────────┘◀─┘
//!      ▲                      │
//!      └──── stop(fire?) ─────┘
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use web_time::Duration;

/// Floor for discrete intervals; a zero interval would fire unboundedly.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Run state shared by both timer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

// ---------------------------------------------------------------------------
// DiscreteTimer
// ---------------------------------------------------------------------------

/// Delay-then-interval timer.
#[derive(Debug, Clone)]
pub struct DiscreteTimer {
    delay: Duration,
    interval: Duration,
    state: TimerState,
    until_next: Duration,
}

impl DiscreteTimer {
    /// Create a stopped timer. `interval` is raised to [`MIN_INTERVAL`].
    #[must_use]
    pub fn new(delay: Duration, interval: Duration) -> Self {
        Self {
            delay,
            interval: interval.max(MIN_INTERVAL),
            state: TimerState::Stopped,
            until_next: delay,
        }
    }

    /// Start, or restart the delay countdown if already running.
    pub fn start(&mut self) {
        self.state = TimerState::Running;
        self.until_next = self.delay;
    }

    /// Stop the timer.
    ///
    /// Returns `true` when the caller should perform one final fire, which
    /// happens only if the timer was running and `fire_on_stop` is set.
    pub fn stop(&mut self, fire_on_stop: bool) -> bool {
        let was_running = self.is_running();
        self.state = TimerState::Stopped;
        self.until_next = self.delay;
        was_running && fire_on_stop
    }

    /// Advance by `dt`, returning how many times the timer fired.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.is_running() {
            return 0;
        }
        if dt < self.until_next {
            self.until_next -= dt;
            return 0;
        }

        let remaining = (dt - self.until_next).as_nanos();
        let interval = self.interval.as_nanos();
        let extra = remaining / interval;
        let into_interval = remaining % interval;
        self.until_next =
            Duration::from_nanos(u64::try_from(interval - into_interval).unwrap_or(u64::MAX));

        let fires = u32::try_from(extra.saturating_add(1)).unwrap_or(u32::MAX);
        trace!(fires, ?dt, "discrete timer fired");
        fires
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time remaining until the next fire while running.
    #[must_use]
    pub fn until_next(&self) -> Duration {
        self.until_next
    }
}

// ---------------------------------------------------------------------------
// ContinuousTimer
// ---------------------------------------------------------------------------

/// Per-frame timer yielding elapsed time.
#[derive(Debug, Clone, Default)]
pub struct ContinuousTimer {
    state: TimerState,
    elapsed: Duration,
}

impl ContinuousTimer {
    /// Create a stopped timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start, or reset the elapsed total if already running.
    pub fn start(&mut self) {
        self.state = TimerState::Running;
        self.elapsed = Duration::ZERO;
    }

    /// Stop the timer.
    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Advance by one frame; returns the frame time while running.
    pub fn advance(&mut self, dt: Duration) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        self.elapsed += dt;
        Some(dt)
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Total time advanced since the last start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

// ---------------------------------------------------------------------------
// RepeatTimer
// ---------------------------------------------------------------------------

/// What a [`RepeatTimer`] produced for one advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticks {
    /// Nothing fired.
    None,
    /// A discrete timer fired this many times.
    Steps(u32),
    /// A continuous timer advanced by this frame time.
    Frame(Duration),
}

impl Ticks {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Either timer kind behind one call surface.
#[derive(Debug, Clone)]
pub enum RepeatTimer {
    Discrete(DiscreteTimer),
    Continuous(ContinuousTimer),
}

impl RepeatTimer {
    /// Discrete timer with the given delay and interval.
    #[must_use]
    pub fn discrete(delay: Duration, interval: Duration) -> Self {
        Self::Discrete(DiscreteTimer::new(delay, interval))
    }

    /// Continuous per-frame timer.
    #[must_use]
    pub fn continuous() -> Self {
        Self::Continuous(ContinuousTimer::new())
    }

    pub fn start(&mut self) {
        match self {
            Self::Discrete(t) => t.start(),
            Self::Continuous(t) => t.start(),
        }
    }

    /// Stop; returns `true` if a final discrete fire was requested and due.
    pub fn stop(&mut self, fire_on_stop: bool) -> bool {
        match self {
            Self::Discrete(t) => t.stop(fire_on_stop),
            Self::Continuous(t) => {
                t.stop();
                false
            }
        }
    }

    pub fn advance(&mut self, dt: Duration) -> Ticks {
        match self {
            Self::Discrete(t) => match t.advance(dt) {
                0 => Ticks::None,
                n => Ticks::Steps(n),
            },
            Self::Continuous(t) => t.advance(dt).map_or(Ticks::None, Ticks::Frame),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        match self {
            Self::Discrete(t) => t.is_running(),
            Self::Continuous(t) => t.is_running(),
        }
    }
}

// ---------------------------------------------------------------------------
// FrameEmitter
// ---------------------------------------------------------------------------

/// Handle for a registered frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameListenerId(u64);

type FrameCallback = Rc<RefCell<dyn FnMut(Duration)>>;

#[derive(Default)]
struct EmitterInner {
    next_id: u64,
    listeners: Vec<(FrameListenerId, FrameCallback)>,
}

/// Host animation-frame callback list.
///
/// Cloning yields another handle to the same list, so a callback can hold a
/// handle and remove itself mid-emission. Listeners added during an emission
/// are first called on the next one; listeners removed during an emission
/// are not called again, even later in the same pass.
#[derive(Clone, Default)]
pub struct FrameEmitter {
    inner: Rc<RefCell<EmitterInner>>,
}

impl fmt::Debug for FrameEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameEmitter")
            .field("listeners", &self.len())
            .finish()
    }
}

impl FrameEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with the frame time on every emission.
    pub fn add_listener(&self, callback: impl FnMut(Duration) + 'static) -> FrameListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = FrameListenerId(inner.next_id);
        inner.next_id += 1;
        let callback: FrameCallback = Rc::new(RefCell::new(callback));
        inner.listeners.push((id, callback));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: FrameListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    #[must_use]
    pub fn has_listener(&self, id: FrameListenerId) -> bool {
        self.inner.borrow().listeners.iter().any(|(lid, _)| *lid == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered callback with `dt`.
    pub fn emit(&self, dt: Duration) {
        let snapshot: Vec<(FrameListenerId, FrameCallback)> = self.inner.borrow().listeners.clone();
        for (id, callback) in snapshot {
            if !self.has_listener(id) {
                continue;
            }
            // A callback that emits recursively must not re-enter itself.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(dt);
            }
        }
    }
}
