#![forbid(unsafe_code)]

//! The set of physical keys currently held down.
//!
//! One [`PressedKeySet`] lives for the whole process and starts empty. Only
//! the native keyboard front end mutates it (through [`apply`],
//! [`press`]/[`release`], [`reconcile_modifiers`] and [`clear`]); hotkey
//! matchers and keyboard drag listeners receive it by shared reference.
//!
//! [`apply`]: PressedKeySet::apply
//! [`press`]: PressedKeySet::press
//! [`release`]: PressedKeySet::release
//! [`reconcile_modifiers`]: PressedKeySet::reconcile_modifiers
//! [`clear`]: PressedKeySet::clear

use ahash::AHashSet;

use crate::event::{Key, KeyEventKind, KeyboardEvent, Modifiers};

/// Keys currently down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressedKeySet {
    down: AHashSet<Key>,
}

impl PressedKeySet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a native key event. Returns `true` if membership changed.
    pub fn apply(&mut self, event: &KeyboardEvent) -> bool {
        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.press(event.key),
            KeyEventKind::Release => self.release(event.key),
        }
    }

    /// Mark `key` down. Returns `true` if it was up.
    pub fn press(&mut self, key: Key) -> bool {
        self.down.insert(key)
    }

    /// Mark `key` up. Returns `true` if it was down.
    pub fn release(&mut self, key: Key) -> bool {
        self.down.remove(&key)
    }

    /// Bring the standard modifiers in line with an event's native flags.
    ///
    /// Recovers from key-ups the platform never delivered (e.g. Shift
    /// released while the window was unfocused).
    pub fn reconcile_modifiers(&mut self, flags: Modifiers) {
        for key in Key::STANDARD_MODIFIERS {
            let Some(flag) = key.modifier_flag() else {
                continue;
            };
            if flags.contains(flag) {
                self.down.insert(key);
            } else {
                self.down.remove(&key);
            }
        }
    }

    /// Forget every key (window blur, focus loss).
    pub fn clear(&mut self) {
        self.down.clear();
    }

    #[inline]
    #[must_use]
    pub fn is_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    /// True if any of `keys` is down.
    #[must_use]
    pub fn any_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_down(*k))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.down.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.down.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.down.iter().copied()
    }
}
