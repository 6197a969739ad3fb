#![forbid(unsafe_code)]

//! Hotkey dispatch: decides which registrations are pressed and drives their
//! press / fire / release lifecycle.
//!
//! # Dispatch per native key event
//!
//! 1. The caller updates the [`PressedKeySet`] first, then calls
//!    [`HotkeyManager::handle_key_event`].
//! 2. Compatible set: available registrations whose descriptor matches,
//!    minus those blocked by a more specific compatible registration.
//! 3. Active registrations that fell out of the compatible set are released
//!    (a natural release).
//! 4. On a key press, compatible registrations whose trigger is the pressed
//!    key are activated, most local first, subject to the overlap policy.
//! 5. Native repeats of the trigger drive `Browser`-timed fire-on-hold.
//!
//! Custom-timed fire-on-hold is driven by [`HotkeyManager::step`].

use std::rc::Rc;

use tracing::{debug, trace};
use web_time::Duration;

use crate::event::{Key, KeyEventKind, KeyboardEvent};
use crate::instrument::{self, CallbackKind, Instrument};
use crate::scene::NodeId;
use crate::timer::DiscreteTimer;

use super::pressed::PressedKeySet;
use super::registration::{
    FireOnHoldTiming, Hotkey, HotkeyCallback, HotkeyId, HotkeyInvocation, HotkeyScope,
};

// ---------------------------------------------------------------------------
// Target availability
// ---------------------------------------------------------------------------

/// Derived state of a global hotkey's target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStatus {
    pub displayed: bool,
    pub enabled: bool,
    pub input_enabled: bool,
}

impl TargetStatus {
    /// Displayed, enabled and input-enabled.
    pub const AVAILABLE: Self = Self {
        displayed: true,
        enabled: true,
        input_enabled: true,
    };

    /// Not displayed.
    pub const HIDDEN: Self = Self {
        displayed: false,
        enabled: true,
        input_enabled: true,
    };

    #[must_use]
    pub const fn is_available(self) -> bool {
        self.displayed && self.enabled && self.input_enabled
    }
}

impl Default for TargetStatus {
    fn default() -> Self {
        Self::AVAILABLE
    }
}

/// Answers target-status queries; implemented by the host scene.
pub trait TargetStatusSource {
    fn target_status(&self, node: NodeId) -> TargetStatus;
}

impl<F> TargetStatusSource for F
where
    F: Fn(NodeId) -> TargetStatus,
{
    fn target_status(&self, node: NodeId) -> TargetStatus {
        self(node)
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

struct Entry {
    id: HotkeyId,
    hotkey: Hotkey,
    /// Last computed availability from focus trail / target status.
    available: bool,
    active: bool,
    hold_timer: Option<DiscreteTimer>,
}

impl Entry {
    fn call(
        instrument: &dyn Instrument,
        label: &str,
        kind: CallbackKind,
        callback: &mut Option<HotkeyCallback>,
        invocation: &HotkeyInvocation,
    ) {
        instrument.invoke(kind, label, &mut || {
            if let Some(cb) = callback.as_mut() {
                cb(invocation);
            }
        });
    }

    fn invocation(&self, event: Option<KeyboardEvent>, interrupted: bool) -> HotkeyInvocation {
        HotkeyInvocation {
            hotkey: self.id,
            trigger: self.hotkey.descriptor.trigger(),
            event,
            interrupted,
        }
    }

    fn press(&mut self, instrument: &dyn Instrument, event: Option<KeyboardEvent>) {
        let inv = self.invocation(event, false);
        Self::call(
            instrument,
            &self.hotkey.label,
            CallbackKind::Press,
            &mut self.hotkey.on_press,
            &inv,
        );
    }

    fn fire(&mut self, instrument: &dyn Instrument, event: Option<KeyboardEvent>) {
        let inv = self.invocation(event, false);
        Self::call(
            instrument,
            &self.hotkey.label,
            CallbackKind::Fire,
            &mut self.hotkey.on_fire,
            &inv,
        );
    }

    fn release(
        &mut self,
        instrument: &dyn Instrument,
        event: Option<KeyboardEvent>,
        interrupted: bool,
    ) {
        let inv = self.invocation(event, interrupted);
        Self::call(
            instrument,
            &self.hotkey.label,
            CallbackKind::Release,
            &mut self.hotkey.on_release,
            &inv,
        );
    }
}

/// Owns hotkey registrations and dispatches key state to them.
///
/// The [`PressedKeySet`] is injected on every call; the manager never
/// mutates it.
pub struct HotkeyManager {
    entries: Vec<Entry>,
    next_id: u64,
    /// Focused trail, root first; the last node has focus.
    focus_trail: Vec<NodeId>,
    instrument: Rc<dyn Instrument>,
}

impl std::fmt::Debug for HotkeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyManager")
            .field("registrations", &self.entries.len())
            .field("active", &self.active_ids())
            .field("focus_trail", &self.focus_trail)
            .finish()
    }
}

impl Default for HotkeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            focus_trail: Vec::new(),
            instrument: instrument::noop(),
        }
    }

    /// Route callback invocations through `instrument`.
    #[must_use]
    pub fn with_instrument(mut self, instrument: Rc<dyn Instrument>) -> Self {
        self.instrument = instrument;
        self
    }

    /// Add a registration. Global hotkeys are considered available until the
    /// next [`refresh_availability`](Self::refresh_availability).
    pub fn register(&mut self, hotkey: Hotkey) -> HotkeyId {
        let id = HotkeyId(self.next_id);
        self.next_id += 1;
        let available = match hotkey.scope {
            HotkeyScope::Always | HotkeyScope::Global { .. } => true,
            HotkeyScope::Local { owner } => self.focus_trail.contains(&owner),
        };
        debug!(%id, descriptor = %hotkey.descriptor, "hotkey registered");
        self.entries.push(Entry {
            id,
            hotkey,
            available,
            active: false,
            hold_timer: None,
        });
        id
    }

    /// Remove a registration, interrupting it first if pressed.
    pub fn unregister(&mut self, id: HotkeyId) -> Option<Hotkey> {
        self.interrupt(id);
        let idx = self.index_of(id)?;
        let entry = self.entries.remove(idx);
        debug!(%id, "hotkey unregistered");
        Some(entry.hotkey)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: HotkeyId) -> bool {
        self.index_of(id).is_some()
    }

    /// Is the registration currently pressed?
    #[must_use]
    pub fn is_active(&self, id: HotkeyId) -> bool {
        self.index_of(id).is_some_and(|i| self.entries[i].active)
    }

    /// Is the registration currently available?
    #[must_use]
    pub fn is_available(&self, id: HotkeyId) -> bool {
        self.index_of(id).is_some_and(|i| self.entries[i].available)
    }

    /// Pressed registrations in registration order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<HotkeyId> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.id)
            .collect()
    }

    /// Keys acting as modifiers: the standard four plus custom modifiers of
    /// every available registration.
    #[must_use]
    pub fn modifier_keys(&self) -> Vec<Key> {
        let mut keys = Key::STANDARD_MODIFIERS.to_vec();
        for entry in self.entries.iter().filter(|e| e.available) {
            for key in entry.hotkey.descriptor.custom_modifiers() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    /// Replace the focused trail (root first). Local hotkeys whose owner left
    /// the trail are interrupted.
    pub fn set_focus_trail(&mut self, trail: Vec<NodeId>) {
        self.focus_trail = trail;
        for i in 0..self.entries.len() {
            if let HotkeyScope::Local { owner } = self.entries[i].hotkey.scope {
                let available = self.focus_trail.contains(&owner);
                self.set_available(i, available);
            }
        }
    }

    #[must_use]
    pub fn focus_trail(&self) -> &[NodeId] {
        &self.focus_trail
    }

    /// Recompute global hotkey availability. Call whenever displayed trails
    /// or enabled states change.
    pub fn refresh_availability(&mut self, source: &dyn TargetStatusSource) {
        for i in 0..self.entries.len() {
            if let HotkeyScope::Global { target } = self.entries[i].hotkey.scope {
                let available = source.target_status(target).is_available();
                self.set_available(i, available);
            }
        }
    }

    fn set_available(&mut self, idx: usize, available: bool) {
        let entry = &mut self.entries[idx];
        if entry.available == available {
            return;
        }
        entry.available = available;
        trace!(id = %entry.id, available, "hotkey availability changed");
        if !available {
            self.interrupt_at(idx);
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Dispatch one native key event. `keys` must already reflect `event`.
    pub fn handle_key_event(&mut self, keys: &PressedKeySet, event: &KeyboardEvent) {
        let compatible = self.compatible(keys);
        trace!(key = %event.key, kind = ?event.kind, ?compatible, "hotkey match evaluated");

        // Natural releases.
        for i in 0..self.entries.len() {
            if !self.entries[i].active || compatible.contains(&i) {
                continue;
            }
            let entry = &mut self.entries[i];
            entry.active = false;
            if let Some(timer) = entry.hold_timer.as_mut() {
                timer.stop(false);
            }
            let trigger_released = event.kind == KeyEventKind::Release
                && event.key == entry.hotkey.descriptor.trigger();
            if !entry.hotkey.fire_on_down && trigger_released {
                entry.fire(&*self.instrument, Some(*event));
            }
            debug!(id = %entry.id, "hotkey released");
            entry.release(&*self.instrument, Some(*event), false);
        }

        match event.kind {
            KeyEventKind::Press => self.activate(&compatible, event),
            KeyEventKind::Repeat => self.browser_repeat(event),
            KeyEventKind::Release => {}
        }
    }

    /// Advance custom fire-on-hold timers by one frame.
    pub fn step(&mut self, dt: Duration) {
        for entry in self.entries.iter_mut().filter(|e| e.active) {
            let fires = entry.hold_timer.as_mut().map_or(0, |t| t.advance(dt));
            for _ in 0..fires {
                entry.fire(&*self.instrument, None);
            }
        }
    }

    /// Force-release a pressed registration. Returns `false` (and does
    /// nothing) if it was not pressed.
    pub fn interrupt(&mut self, id: HotkeyId) -> bool {
        self.index_of(id).is_some_and(|i| self.interrupt_at(i))
    }

    /// Interrupt every pressed registration.
    pub fn interrupt_all(&mut self) {
        for i in 0..self.entries.len() {
            self.interrupt_at(i);
        }
    }

    /// The key state was wiped (window blur): everything pressed is
    /// interrupted.
    pub fn handle_key_state_cleared(&mut self) {
        debug!("key state cleared, interrupting hotkeys");
        self.interrupt_all();
    }

    fn interrupt_at(&mut self, idx: usize) -> bool {
        let entry = &mut self.entries[idx];
        if !entry.active {
            return false;
        }
        entry.active = false;
        if let Some(timer) = entry.hold_timer.as_mut() {
            timer.stop(false);
        }
        debug!(id = %entry.id, "hotkey interrupted");
        entry.release(&*self.instrument, None, true);
        true
    }

    fn index_of(&self, id: HotkeyId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Indices of registrations that match and are not blocked by a more
    /// specific match.
    fn compatible(&self, keys: &PressedKeySet) -> Vec<usize> {
        let modifier_keys = self.modifier_keys();
        let matching: Vec<usize> = (0..self.entries.len())
            .filter(|&i| {
                let e = &self.entries[i];
                e.available && e.hotkey.descriptor.matches(keys, &modifier_keys)
            })
            .collect();

        matching
            .iter()
            .copied()
            .filter(|&i| {
                let own = &self.entries[i].hotkey.descriptor;
                let own_keys = own.required_keys();
                !matching.iter().any(|&j| {
                    if i == j {
                        return false;
                    }
                    let other = &self.entries[j].hotkey.descriptor;
                    let other_mods: Vec<Key> = other.required_modifiers().collect();
                    // This combination is held entirely inside the other's modifiers.
                    let inside_modifiers = own_keys.iter().all(|k| other_mods.contains(k));
                    // Same trigger, strictly fewer required keys.
                    let other_keys = other.required_keys();
                    let less_specific = own.trigger() == other.trigger()
                        && own_keys.len() < other_keys.len()
                        && own_keys.iter().all(|k| other_keys.contains(k));
                    inside_modifiers || less_specific
                })
            })
            .collect()
    }

    /// Distance of a local owner from the focused end of the trail.
    fn locality(&self, scope: HotkeyScope) -> usize {
        match scope {
            HotkeyScope::Local { owner } => self
                .focus_trail
                .iter()
                .rev()
                .position(|n| *n == owner)
                .unwrap_or(usize::MAX),
            HotkeyScope::Always | HotkeyScope::Global { .. } => usize::MAX,
        }
    }

    fn activate(&mut self, compatible: &[usize], event: &KeyboardEvent) {
        let mut candidates: Vec<usize> = compatible
            .iter()
            .copied()
            .filter(|&i| {
                let e = &self.entries[i];
                !e.active && e.hotkey.descriptor.trigger() == event.key
            })
            .collect();
        candidates.sort_by_key(|&i| (self.locality(self.entries[i].hotkey.scope), i));

        let mut any_active = self.entries.iter().any(|e| e.active);
        if self
            .entries
            .iter()
            .any(|e| e.active && !e.hotkey.allows_overlap())
        {
            trace!("activation blocked by a non-overlapping pressed hotkey");
            return;
        }

        for i in candidates {
            let overlap = self.entries[i].hotkey.allows_overlap();
            if !overlap && any_active {
                continue;
            }
            self.activate_at(i, event);
            any_active = true;
            if !overlap {
                break;
            }
        }
    }

    fn activate_at(&mut self, idx: usize, event: &KeyboardEvent) {
        let entry = &mut self.entries[idx];
        entry.active = true;
        debug!(id = %entry.id, descriptor = %entry.hotkey.descriptor, "hotkey pressed");
        entry.press(&*self.instrument, Some(*event));
        if entry.hotkey.fire_on_down {
            entry.fire(&*self.instrument, Some(*event));
        }
        if entry.hotkey.fire_on_hold
            && let FireOnHoldTiming::Custom(timing) = entry.hotkey.hold_timing
        {
            let timer = entry
                .hold_timer
                .get_or_insert_with(|| DiscreteTimer::new(timing.delay, timing.interval));
            timer.start();
        }
    }

    fn browser_repeat(&mut self, event: &KeyboardEvent) {
        for entry in self.entries.iter_mut().filter(|e| e.active) {
            if entry.hotkey.fire_on_hold
                && entry.hotkey.hold_timing == FireOnHoldTiming::Browser
                && entry.hotkey.descriptor.trigger() == event.key
            {
                entry.fire(&*self.instrument, Some(*event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::HoldTiming;
    use crate::instrument::RecordingInstrument;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logged(keys: &str, log: &Log) -> Hotkey {
        let (p, f, r) = (Rc::clone(log), Rc::clone(log), Rc::clone(log));
        let (kp, kf, kr) = (keys.to_string(), keys.to_string(), keys.to_string());
        Hotkey::new(keys)
            .unwrap()
            .on_press(move |_| p.borrow_mut().push(format!("press {kp}")))
            .on_fire(move |_| f.borrow_mut().push(format!("fire {kf}")))
            .on_release(move |inv| {
                let suffix = if inv.interrupted { " (interrupted)" } else { "" };
                r.borrow_mut().push(format!("release {kr}{suffix}"));
            })
    }

    struct Harness {
        keys: PressedKeySet,
        manager: HotkeyManager,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                keys: PressedKeySet::new(),
                manager: HotkeyManager::new(),
            }
        }

        fn send(&mut self, ev: KeyboardEvent) {
            self.keys.apply(&ev);
            self.manager.handle_key_event(&self.keys, &ev);
        }

        fn down(&mut self, key: Key) {
            self.send(KeyboardEvent::press(key));
        }

        fn up(&mut self, key: Key) {
            self.send(KeyboardEvent::release(key));
        }
    }

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn take(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    // --- Matching & lifecycle ---

    #[test]
    fn plain_hotkey_lifecycle() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log));
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press y", "fire y"]);
        h.up(Key::Char('y'));
        assert_eq!(take(&log), vec!["release y"]);
    }

    #[test]
    fn shift_blocks_plain_key() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log));
        h.manager.register(logged("shift+y", &log));
        h.down(Key::Shift);
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press shift+y", "fire shift+y"]);
    }

    #[test]
    fn ignorable_modifier_fires_either_way() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("shift?+arrowLeft", &log));

        h.down(Key::ArrowLeft);
        h.up(Key::ArrowLeft);
        let plain = take(&log);

        h.down(Key::Shift);
        assert!(take(&log).is_empty(), "shift alone never fires");
        h.down(Key::ArrowLeft);
        h.up(Key::ArrowLeft);
        assert_eq!(take(&log), plain);
    }

    #[test]
    fn activation_requires_trigger_press() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("shift+y", &log));
        h.down(Key::Char('y'));
        h.down(Key::Shift);
        assert!(take(&log).is_empty(), "pressing the modifier last does not activate");
    }

    #[test]
    fn releasing_modifier_releases_combination() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("ctrl+s", &log));
        h.down(Key::Ctrl);
        h.down(Key::Char('s'));
        take(&log);
        h.up(Key::Ctrl);
        assert_eq!(take(&log), vec!["release ctrl+s"]);
    }

    #[test]
    fn custom_modifier_blocks_shorter_combination() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("j", &log));
        h.manager.register(logged("k", &log));
        h.manager.register(logged("j+k", &log));

        h.down(Key::Char('j'));
        assert_eq!(take(&log), vec!["press j", "fire j"]);
        h.down(Key::Char('k'));
        assert_eq!(
            take(&log),
            vec!["release j", "press j+k", "fire j+k"],
            "k alone is blocked while j acts as a modifier"
        );
    }

    #[test]
    fn fire_on_release_fires_before_release() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log).fire_on_down(false));
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press y"]);
        h.up(Key::Char('y'));
        assert_eq!(take(&log), vec!["fire y", "release y"]);
    }

    #[test]
    fn fire_on_release_skipped_when_modifier_breaks_match() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log).fire_on_down(false));
        h.down(Key::Char('y'));
        take(&log);
        h.down(Key::Alt);
        assert_eq!(take(&log), vec!["release y"]);
    }

    // --- Fire on hold ---

    #[test]
    fn custom_hold_timer_repeats_fire() {
        let log = new_log();
        let mut h = Harness::new();
        let timing = HoldTiming::new(Duration::from_millis(400), Duration::from_millis(100));
        h.manager
            .register(logged("y", &log).fire_on_hold(FireOnHoldTiming::Custom(timing)));
        h.down(Key::Char('y'));
        take(&log);
        h.manager.step(Duration::from_millis(399));
        assert!(take(&log).is_empty());
        h.manager.step(Duration::from_millis(201));
        assert_eq!(take(&log), vec!["fire y", "fire y", "fire y"]);
        h.up(Key::Char('y'));
        h.manager.step(Duration::from_secs(1));
        assert_eq!(take(&log), vec!["release y"]);
    }

    #[test]
    fn browser_hold_uses_native_repeat() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager
            .register(logged("y", &log).fire_on_hold(FireOnHoldTiming::Browser));
        h.down(Key::Char('y'));
        take(&log);
        h.manager.step(Duration::from_secs(5));
        assert!(take(&log).is_empty(), "no internal timer");
        h.send(KeyboardEvent::repeat(Key::Char('y')));
        h.send(KeyboardEvent::repeat(Key::Char('y')));
        assert_eq!(take(&log), vec!["fire y", "fire y"]);
    }

    // --- Interruption ---

    #[test]
    fn interrupt_is_idempotent() {
        let log = new_log();
        let mut h = Harness::new();
        let id = h.manager.register(logged("y", &log));
        h.down(Key::Char('y'));
        take(&log);
        assert!(h.manager.interrupt(id));
        assert!(!h.manager.interrupt(id));
        assert_eq!(take(&log), vec!["release y (interrupted)"]);
        h.up(Key::Char('y'));
        assert!(take(&log).is_empty());
    }

    #[test]
    fn key_state_cleared_interrupts_everything() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log));
        h.manager.register(logged("?shift+y", &log).allow_overlap(true));
        h.down(Key::Char('y'));
        take(&log);
        h.keys.clear();
        h.manager.handle_key_state_cleared();
        assert_eq!(take(&log), vec!["release y (interrupted)"]);
        assert!(h.manager.active_ids().is_empty());
    }

    #[test]
    fn unregister_interrupts_active_hotkey() {
        let log = new_log();
        let mut h = Harness::new();
        let id = h.manager.register(logged("y", &log));
        h.down(Key::Char('y'));
        take(&log);
        assert!(h.manager.unregister(id).is_some());
        assert_eq!(take(&log), vec!["release y (interrupted)"]);
        assert!(!h.manager.contains(id));
    }

    // --- Availability & overlap ---

    #[test]
    fn local_hotkey_requires_focus() {
        let log = new_log();
        let mut h = Harness::new();
        let owner = NodeId(7);
        h.manager.register(logged("y", &log).local(owner));
        h.down(Key::Char('y'));
        h.up(Key::Char('y'));
        assert!(take(&log).is_empty());

        h.manager.set_focus_trail(vec![NodeId(1), owner]);
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press y", "fire y"]);

        h.manager.set_focus_trail(vec![NodeId(1)]);
        assert_eq!(take(&log), vec!["release y (interrupted)"]);
    }

    #[test]
    fn most_local_hotkey_wins() {
        let log_outer = new_log();
        let log_inner = new_log();
        let mut h = Harness::new();
        let (outer, inner) = (NodeId(1), NodeId(2));
        h.manager.set_focus_trail(vec![outer, inner]);
        h.manager.register(logged("y", &log_outer).local(outer));
        h.manager.register(logged("y", &log_inner).local(inner));
        h.down(Key::Char('y'));
        assert!(take(&log_outer).is_empty());
        assert_eq!(take(&log_inner), vec!["press y", "fire y"]);
    }

    #[test]
    fn overlapping_globals_coexist() {
        let log = new_log();
        let mut h = Harness::new();
        h.manager.register(logged("y", &log));
        h.manager.register(logged("?y", &log));
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press y", "fire y", "press ?y", "fire ?y"]);
    }

    #[test]
    fn non_overlapping_hotkey_blocks_later_activations() {
        let log = new_log();
        let mut h = Harness::new();
        let owner = NodeId(3);
        h.manager.set_focus_trail(vec![owner]);
        h.manager.register(logged("y", &log).local(owner));
        h.manager.register(logged("?u", &log));
        h.down(Key::Char('y'));
        take(&log);
        h.down(Key::Char('u'));
        assert!(take(&log).is_empty());
    }

    #[test]
    fn global_hotkey_follows_target_status() {
        let log = new_log();
        let mut h = Harness::new();
        let target = NodeId(9);
        let id = h.manager.register(logged("y", &log).global(target));
        h.down(Key::Char('y'));
        take(&log);

        h.manager.refresh_availability(&|_: NodeId| TargetStatus::HIDDEN);
        assert_eq!(take(&log), vec!["release y (interrupted)"]);
        assert!(!h.manager.is_available(id));

        h.up(Key::Char('y'));
        h.down(Key::Char('y'));
        assert!(take(&log).is_empty());

        h.manager.refresh_availability(&|_: NodeId| TargetStatus::AVAILABLE);
        h.up(Key::Char('y'));
        h.down(Key::Char('y'));
        assert_eq!(take(&log), vec!["press y", "fire y"]);
    }

    #[test]
    fn callbacks_go_through_instrument() {
        let rec = Rc::new(RecordingInstrument::new());
        let mut keys = PressedKeySet::new();
        let mut manager = HotkeyManager::new().with_instrument(rec.clone());
        manager.register(Hotkey::new("y").unwrap().label("confirm"));
        let ev = KeyboardEvent::press(Key::Char('y'));
        keys.apply(&ev);
        manager.handle_key_event(&keys, &ev);
        assert_eq!(rec.kinds(), vec![CallbackKind::Press, CallbackKind::Fire]);
        assert_eq!(rec.records()[0].label, "confirm");
    }
}
