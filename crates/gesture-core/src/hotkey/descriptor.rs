#![forbid(unsafe_code)]

//! Parsed key-combination strings.
//!
//! # Grammar
//!
//! ```text
//! descriptor := ["?"] (modifier "+")* trigger
//! modifier   := key ["?"]
//! trigger    := key
//! ```
//!
//! - `"shift+y"`: Shift must be down, Y is the trigger.
//! - `"shift?+y"`: Shift may be up or down.
//! - `"?shift+y"`: Shift must be down; every other standard modifier
//!   (Alt, Ctrl, Meta) may be up or down.
//! - `"j+k"`: custom modifier. J acts as a modifier for this combination,
//!   and while a hotkey using this descriptor is available, holding J blocks
//!   other combinations that do not mention it.
//!
//! A literal plus sign is spelled `"plus"`.

use std::fmt;
use std::str::FromStr;

use crate::error::DescriptorError;
use crate::event::Key;

use super::pressed::PressedKeySet;

/// One modifier slot of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierSpec {
    pub key: Key,
    /// `true` for `key?`: the key's state does not affect matching.
    pub ignorable: bool,
}

/// An immutable parsed key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyDescriptor {
    modifiers: Vec<ModifierSpec>,
    ignore_other_standard: bool,
    trigger: Key,
}

impl KeyDescriptor {
    /// Parse a combination string.
    pub fn parse(s: &str) -> Result<Self, DescriptorError> {
        s.parse()
    }

    /// A bare trigger with no modifiers.
    #[must_use]
    pub fn single(trigger: Key) -> Self {
        Self {
            modifiers: Vec::new(),
            ignore_other_standard: false,
            trigger,
        }
    }

    /// Add (or replace) a modifier slot. The trigger itself is never added.
    #[must_use]
    pub fn with_modifier(mut self, spec: ModifierSpec) -> Self {
        if spec.key == self.trigger {
            return self;
        }
        match self.modifiers.iter_mut().find(|m| m.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.modifiers.push(spec),
        }
        self
    }

    /// The non-modifier key that fires the combination.
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> Key {
        self.trigger
    }

    /// Modifier slots in written order.
    #[must_use]
    pub fn modifiers(&self) -> &[ModifierSpec] {
        &self.modifiers
    }

    /// True when written with a leading `?`.
    #[must_use]
    pub fn ignores_other_standard_modifiers(&self) -> bool {
        self.ignore_other_standard
    }

    /// Modifiers that must be down.
    pub fn required_modifiers(&self) -> impl Iterator<Item = Key> + '_ {
        self.modifiers.iter().filter(|m| !m.ignorable).map(|m| m.key)
    }

    /// Required modifiers plus the trigger: the keys that must all be down.
    #[must_use]
    pub fn required_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.required_modifiers().collect();
        keys.push(self.trigger);
        keys
    }

    /// Non-standard keys used as modifiers (required or ignorable).
    pub fn custom_modifiers(&self) -> impl Iterator<Item = Key> + '_ {
        self.modifiers
            .iter()
            .map(|m| m.key)
            .filter(|k| !k.is_standard_modifier())
    }

    /// True if `key` is named as a required modifier.
    #[must_use]
    pub fn requires(&self, key: Key) -> bool {
        self.modifiers.iter().any(|m| m.key == key && !m.ignorable)
    }

    /// True if `key`'s state is irrelevant to matching.
    #[must_use]
    pub fn ignores(&self, key: Key) -> bool {
        if self.modifiers.iter().any(|m| m.key == key && m.ignorable) {
            return true;
        }
        self.ignore_other_standard && key.is_standard_modifier() && !self.requires(key)
    }

    /// Does the current key state satisfy this combination?
    ///
    /// `modifier_keys` is every key currently acting as a modifier (the
    /// standard four plus custom modifiers of registered combinations).
    /// Any of those that is down must be either required or ignorable here.
    #[must_use]
    pub fn matches(&self, keys: &PressedKeySet, modifier_keys: &[Key]) -> bool {
        if !keys.is_down(self.trigger) {
            return false;
        }
        if !self.required_modifiers().all(|k| keys.is_down(k)) {
            return false;
        }
        modifier_keys.iter().all(|&mk| {
            mk == self.trigger || self.requires(mk) || self.ignores(mk) || !keys.is_down(mk)
        })
    }

    /// [`matches`](Self::matches) against the standard modifiers plus this
    /// descriptor's own custom modifiers.
    #[must_use]
    pub fn matches_standard(&self, keys: &PressedKeySet) -> bool {
        let mut modifier_keys = Key::STANDARD_MODIFIERS.to_vec();
        modifier_keys.extend(self.custom_modifiers());
        self.matches(keys, &modifier_keys)
    }
}

impl FromStr for KeyDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim();
        if source.is_empty() {
            return Err(DescriptorError::Empty);
        }

        let (ignore_other_standard, body) = match source.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, source),
        };

        let tokens: Vec<&str> = body.split('+').map(str::trim).collect();
        let Some((trigger_token, modifier_tokens)) = tokens.split_last() else {
            return Err(DescriptorError::MissingTrigger(source.to_string()));
        };
        if trigger_token.is_empty() {
            return Err(DescriptorError::MissingTrigger(source.to_string()));
        }
        if trigger_token.ends_with('?') {
            return Err(DescriptorError::MisplacedWildcard(source.to_string()));
        }
        let trigger: Key = trigger_token.parse()?;

        let mut modifiers: Vec<ModifierSpec> = Vec::with_capacity(modifier_tokens.len());
        for token in modifier_tokens {
            let (name, ignorable) = match token.strip_suffix('?') {
                Some(name) => (name.trim(), true),
                None => (*token, false),
            };
            if name.is_empty() {
                return Err(DescriptorError::UnknownKey((*token).to_string()));
            }
            let key: Key = name.parse()?;
            if key == trigger || modifiers.iter().any(|m| m.key == key) {
                return Err(DescriptorError::DuplicateKey(key.to_string()));
            }
            modifiers.push(ModifierSpec { key, ignorable });
        }

        Ok(Self {
            modifiers,
            ignore_other_standard,
            trigger,
        })
    }
}

impl fmt::Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_other_standard {
            f.write_str("?")?;
        }
        for m in &self.modifiers {
            write!(f, "{}{}+", m.key, if m.ignorable { "?" } else { "" })?;
        }
        write!(f, "{}", self.trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(down: &[Key]) -> PressedKeySet {
        let mut set = PressedKeySet::new();
        for &k in down {
            set.press(k);
        }
        set
    }

    fn d(s: &str) -> KeyDescriptor {
        KeyDescriptor::parse(s).unwrap()
    }

    // --- parsing ---

    #[test]
    fn parse_plain_and_modified() {
        let plain = d("y");
        assert_eq!(plain.trigger(), Key::Char('y'));
        assert!(plain.modifiers().is_empty());

        let combo = d("ctrl+shift+z");
        assert_eq!(combo.trigger(), Key::Char('z'));
        assert_eq!(
            combo.required_modifiers().collect::<Vec<_>>(),
            vec![Key::Ctrl, Key::Shift]
        );
    }

    #[test]
    fn parse_ignorable_modifier() {
        let desc = d("shift?+arrowLeft");
        assert_eq!(desc.trigger(), Key::ArrowLeft);
        assert!(desc.ignores(Key::Shift));
        assert!(!desc.requires(Key::Shift));
        assert!(!desc.ignores(Key::Alt));
    }

    #[test]
    fn parse_leading_wildcard() {
        let desc = d("?shift+y");
        assert!(desc.ignores_other_standard_modifiers());
        assert!(desc.requires(Key::Shift));
        assert!(!desc.ignores(Key::Shift));
        assert!(desc.ignores(Key::Alt));
        assert!(desc.ignores(Key::Ctrl));
        assert!(desc.ignores(Key::Meta));
        assert!(!desc.ignores(Key::Char('j')), "custom keys are not standard modifiers");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(KeyDescriptor::parse("  "), Err(DescriptorError::Empty));
        assert!(matches!(
            KeyDescriptor::parse("shift+"),
            Err(DescriptorError::MissingTrigger(_))
        ));
        assert!(matches!(
            KeyDescriptor::parse("shift+y?"),
            Err(DescriptorError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            KeyDescriptor::parse("shift+shift+y"),
            Err(DescriptorError::DuplicateKey(_))
        ));
        assert!(matches!(
            KeyDescriptor::parse("y+y"),
            Err(DescriptorError::DuplicateKey(_))
        ));
        assert!(matches!(
            KeyDescriptor::parse("hyper+y"),
            Err(DescriptorError::UnknownKey(_))
        ));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(d("Shift?+ArrowLeft").to_string(), "shift?+arrowLeft");
        assert_eq!(d("?ctrl+plus").to_string(), "?ctrl+plus");
        assert_eq!(d(&d("alt+shift+f5").to_string()), d("alt+shift+f5"));
    }

    // --- matching ---

    #[test]
    fn plain_key_blocked_by_standard_modifier() {
        let y = d("y");
        assert!(y.matches_standard(&keys(&[Key::Char('y')])));
        assert!(!y.matches_standard(&keys(&[Key::Shift, Key::Char('y')])));
    }

    #[test]
    fn required_modifier_must_be_down() {
        let sy = d("shift+y");
        assert!(!sy.matches_standard(&keys(&[Key::Char('y')])));
        assert!(sy.matches_standard(&keys(&[Key::Shift, Key::Char('y')])));
        assert!(!sy.matches_standard(&keys(&[Key::Shift, Key::Ctrl, Key::Char('y')])));
    }

    #[test]
    fn ignorable_modifier_matches_either_way() {
        let desc = d("shift?+arrowLeft");
        assert!(desc.matches_standard(&keys(&[Key::ArrowLeft])));
        assert!(desc.matches_standard(&keys(&[Key::Shift, Key::ArrowLeft])));
        assert!(!desc.matches_standard(&keys(&[Key::Shift])));
        assert!(!desc.matches_standard(&keys(&[Key::Alt, Key::ArrowLeft])));
    }

    #[test]
    fn leading_wildcard_ignores_other_standard_modifiers() {
        let desc = d("?shift+y");
        assert!(desc.matches_standard(&keys(&[Key::Shift, Key::Alt, Key::Meta, Key::Char('y')])));
        assert!(!desc.matches_standard(&keys(&[Key::Alt, Key::Char('y')])));
    }

    #[test]
    fn custom_modifier_blocks_when_listed() {
        let k = d("k");
        let modifier_keys = [Key::Shift, Key::Alt, Key::Ctrl, Key::Meta, Key::Char('j')];
        let pressed = keys(&[Key::Char('j'), Key::Char('k')]);
        assert!(!k.matches(&pressed, &modifier_keys));
        assert!(d("j+k").matches(&pressed, &modifier_keys));
        // Without "j" acting as a modifier, holding it is irrelevant.
        assert!(k.matches_standard(&pressed));
    }

    #[test]
    fn built_descriptor_equals_parsed() {
        let built = KeyDescriptor::single(Key::ArrowLeft).with_modifier(ModifierSpec {
            key: Key::Shift,
            ignorable: true,
        });
        assert_eq!(built, d("shift?+arrowLeft"));
        let same = built.clone().with_modifier(ModifierSpec {
            key: Key::ArrowLeft,
            ignorable: false,
        });
        assert_eq!(same, built, "trigger cannot become its own modifier");
    }

    #[test]
    fn required_keys_include_trigger() {
        assert_eq!(
            d("shift?+ctrl+s").required_keys(),
            vec![Key::Ctrl, Key::Char('s')]
        );
    }
}
