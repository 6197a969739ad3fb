#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! The low-level event source (outside this crate) converts native pointer
//! and keyboard events into these values before handing them to listeners.
//!
//! # Design Notes
//!
//! - Points are in the ambient (global) coordinate frame.
//! - `Key` is a normalized key identity, independent of keyboard layout.
//!   Left and right variants of a modifier collapse into one key.
//! - `Modifiers` mirrors the native modifier flags carried by each event. The
//!   authoritative "what is down" answer comes from
//!   [`PressedKeySet`](crate::hotkey::PressedKeySet), not from these flags.
//! - [`GestureEvent`] is what drag callbacks receive: either the real input
//!   event that caused the transition, or a synthetic one built during
//!   programmatic ends and interruptions.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::DescriptorError;
use crate::geometry::Vector2;
use crate::scene::NodeId;

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

/// Identity of one physical input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

impl PointerId {
    /// The pointer that stands in for keyboard focus.
    ///
    /// Keyboard-driven gestures attach to it so pointer-oriented cooperators
    /// (auto-pan, scroll) can observe them through the same registry.
    pub const FOCUS: Self = Self(u32::MAX);
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::FOCUS {
            f.write_str("pointer#focus")
        } else {
            write!(f, "pointer#{}", self.0)
        }
    }
}

/// What kind of device a pointer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
    /// Keyboard focus, see [`PointerId::FOCUS`].
    Focus,
}

impl PointerKind {
    /// Touch and pen pointers can "snag" a target by sliding onto it while down.
    #[inline]
    #[must_use]
    pub const fn is_touch_like(self) -> bool {
        matches!(self, Self::Touch | Self::Pen)
    }
}

/// Mouse button identifiers. Touch and pen contacts report `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed or contact made.
    Down(MouseButton),
    /// Button released or contact lifted.
    Up(MouseButton),
    /// Pointer moved.
    Move,
    /// The platform cancelled the pointer (e.g. a touch stolen by the OS).
    Cancel,
    /// Pointer slid onto the listener's target.
    Enter,
    /// Pointer slid off the listener's target.
    Exit,
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub pointer_kind: PointerKind,
    pub kind: PointerEventKind,
    /// Position in the global frame.
    pub point: Vector2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a mouse event with no modifiers.
    #[must_use]
    pub const fn new(pointer: PointerId, kind: PointerEventKind, point: Vector2) -> Self {
        Self {
            pointer,
            pointer_kind: PointerKind::Mouse,
            kind,
            point,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the device kind.
    #[must_use]
    pub const fn with_pointer_kind(mut self, pointer_kind: PointerKind) -> Self {
        self.pointer_kind = pointer_kind;
        self
    }

    /// Set the modifier flags.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A normalized key identity.
///
/// Parsed from English key strings such as `"arrowLeft"`, `"shift"` or `"y"`
/// (case-insensitive). Letters are stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Letter, digit, or punctuation key.
    Char(char),
    Shift,
    Alt,
    Ctrl,
    Meta,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key (F1-F24).
    F(u8),
}

impl Key {
    /// The standard modifier keys, in canonical order.
    pub const STANDARD_MODIFIERS: [Key; 4] = [Key::Shift, Key::Alt, Key::Ctrl, Key::Meta];

    /// True for Shift, Alt, Ctrl and Meta.
    #[inline]
    #[must_use]
    pub const fn is_standard_modifier(self) -> bool {
        matches!(self, Self::Shift | Self::Alt | Self::Ctrl | Self::Meta)
    }

    /// The modifier flag corresponding to this key, if any.
    #[must_use]
    pub const fn modifier_flag(self) -> Option<Modifiers> {
        match self {
            Self::Shift => Some(Modifiers::SHIFT),
            Self::Alt => Some(Modifiers::ALT),
            Self::Ctrl => Some(Modifiers::CTRL),
            Self::Meta => Some(Modifiers::META),
            _ => None,
        }
    }
}

impl FromStr for Key {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return if c.is_whitespace() {
                Err(DescriptorError::UnknownKey(s.to_string()))
            } else {
                Ok(Self::Char(c.to_ascii_lowercase()))
            };
        }

        let lower = trimmed.to_ascii_lowercase();
        let key = match lower.as_str() {
            "shift" => Self::Shift,
            "alt" | "option" => Self::Alt,
            "ctrl" | "control" => Self::Ctrl,
            "meta" | "cmd" | "command" | "super" => Self::Meta,
            "arrowleft" => Self::ArrowLeft,
            "arrowright" => Self::ArrowRight,
            "arrowup" => Self::ArrowUp,
            "arrowdown" => Self::ArrowDown,
            "enter" | "return" => Self::Enter,
            "escape" | "esc" => Self::Escape,
            "space" => Self::Space,
            "tab" => Self::Tab,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            "minus" => Self::Char('-'),
            "equals" => Self::Char('='),
            "plus" => Self::Char('+'),
            other => {
                if let Some(n) = other.strip_prefix('f')
                    && let Ok(n) = n.parse::<u8>()
                    && (1..=24).contains(&n)
                {
                    Self::F(n)
                } else {
                    return Err(DescriptorError::UnknownKey(s.to_string()));
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Char('-') => "minus",
            Self::Char('=') => "equals",
            Self::Char('+') => "plus",
            Self::Char(c) => return write!(f, "{c}"),
            Self::F(n) => return write!(f, "f{n}"),
            Self::Shift => "shift",
            Self::Alt => "alt",
            Self::Ctrl => "ctrl",
            Self::Meta => "meta",
            Self::ArrowLeft => "arrowLeft",
            Self::ArrowRight => "arrowRight",
            Self::ArrowUp => "arrowUp",
            Self::ArrowDown => "arrowDown",
            Self::Enter => "enter",
            Self::Escape => "escape",
            Self::Space => "space",
            Self::Tab => "tab",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Home => "home",
            Self::End => "end",
            Self::PageUp => "pageUp",
            Self::PageDown => "pageDown",
        };
        f.write_str(name)
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed.
    #[default]
    Press,
    /// Native auto-repeat while the key is held.
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Native modifier flags carried by an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Meta/Command/Super key.
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: Key,
    pub kind: KeyEventKind,
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    /// A press of `key` with no modifiers.
    #[must_use]
    pub const fn press(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Press,
            modifiers: Modifiers::NONE,
        }
    }

    /// A release of `key` with no modifiers.
    #[must_use]
    pub const fn release(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Release,
            modifiers: Modifiers::NONE,
        }
    }

    /// A native auto-repeat of `key`.
    #[must_use]
    pub const fn repeat(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Repeat,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the modifier flags.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// True if the Meta/Command flag is set.
    #[inline]
    #[must_use]
    pub const fn meta(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }

    /// True if the Shift flag is set.
    #[inline]
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

// ---------------------------------------------------------------------------
// Gesture events
// ---------------------------------------------------------------------------

/// The event handed to drag callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A real pointer event.
    Pointer(PointerEvent),
    /// A real keyboard event.
    Keyboard(KeyboardEvent),
    /// Built by the listener when no real event exists: programmatic ends,
    /// interruption, cancellation, disposal.
    Synthetic {
        pointer: Option<PointerId>,
        current_target: Option<NodeId>,
    },
}

impl GestureEvent {
    /// The pointer involved, if known.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::Pointer(ev) => Some(ev.pointer),
            Self::Keyboard(_) => Some(PointerId::FOCUS),
            Self::Synthetic { pointer, .. } => *pointer,
        }
    }

    /// True for listener-built events.
    #[inline]
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_keys_case_insensitive() {
        assert_eq!("arrowLeft".parse::<Key>().unwrap(), Key::ArrowLeft);
        assert_eq!("ArrowLeft".parse::<Key>().unwrap(), Key::ArrowLeft);
        assert_eq!("SHIFT".parse::<Key>().unwrap(), Key::Shift);
        assert_eq!("control".parse::<Key>().unwrap(), Key::Ctrl);
        assert_eq!("pageDown".parse::<Key>().unwrap(), Key::PageDown);
    }

    #[test]
    fn parse_single_chars_lowercase() {
        assert_eq!("Y".parse::<Key>().unwrap(), Key::Char('y'));
        assert_eq!("7".parse::<Key>().unwrap(), Key::Char('7'));
        assert_eq!("minus".parse::<Key>().unwrap(), Key::Char('-'));
    }

    #[test]
    fn parse_function_keys() {
        assert_eq!("f1".parse::<Key>().unwrap(), Key::F(1));
        assert_eq!("F12".parse::<Key>().unwrap(), Key::F(12));
        assert!("f0".parse::<Key>().is_err());
        assert!("f25".parse::<Key>().is_err());
    }

    #[test]
    fn parse_unknown_key_fails() {
        assert!(matches!(
            "hyper".parse::<Key>(),
            Err(DescriptorError::UnknownKey(name)) if name == "hyper"
        ));
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn display_round_trips_names() {
        for key in [
            Key::ArrowLeft,
            Key::Shift,
            Key::Char('q'),
            Key::Char('+'),
            Key::F(3),
            Key::PageUp,
        ] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);
        }
    }

    #[test]
    fn standard_modifiers() {
        for key in Key::STANDARD_MODIFIERS {
            assert!(key.is_standard_modifier());
            assert!(key.modifier_flag().is_some());
        }
        assert!(!Key::Char('j').is_standard_modifier());
        assert_eq!(Key::Space.modifier_flag(), None);
    }

    #[test]
    fn keyboard_event_flags() {
        let ev = KeyboardEvent::press(Key::Char('s')).with_modifiers(Modifiers::META | Modifiers::SHIFT);
        assert!(ev.meta());
        assert!(ev.shift());
        assert_eq!(ev.kind, KeyEventKind::Press);
        assert_eq!(KeyboardEvent::release(Key::Tab).kind, KeyEventKind::Release);
    }

    #[test]
    fn gesture_event_pointer_identity() {
        let down = PointerEvent::new(
            PointerId(3),
            PointerEventKind::Down(MouseButton::Left),
            Vector2::ZERO,
        );
        assert_eq!(GestureEvent::Pointer(down).pointer(), Some(PointerId(3)));
        assert_eq!(
            GestureEvent::Keyboard(KeyboardEvent::press(Key::ArrowUp)).pointer(),
            Some(PointerId::FOCUS)
        );
        let synthetic = GestureEvent::Synthetic {
            pointer: None,
            current_target: None,
        };
        assert!(synthetic.is_synthetic());
        assert_eq!(synthetic.pointer(), None);
    }

    #[test]
    fn touch_like_pointer_kinds() {
        assert!(PointerKind::Touch.is_touch_like());
        assert!(PointerKind::Pen.is_touch_like());
        assert!(!PointerKind::Mouse.is_touch_like());
        assert!(!PointerKind::Focus.is_touch_like());
    }

    #[test]
    fn focus_pointer_display() {
        assert_eq!(PointerId::FOCUS.to_string(), "pointer#focus");
        assert_eq!(PointerId(4).to_string(), "pointer#4");
    }
}
