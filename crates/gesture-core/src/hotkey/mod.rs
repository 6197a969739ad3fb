#![forbid(unsafe_code)]

//! Hotkey matching.
//!
//! - [`KeyDescriptor`]: parsed combination strings (`"shift?+arrowLeft"`,
//!   `"?ctrl+s"`, `"j+k"`).
//! - [`PressedKeySet`]: the live set of held keys, owned by the keyboard
//!   front end and lent to everyone else.
//! - [`Hotkey`]: a descriptor plus callbacks and firing policy.
//! - [`HotkeyManager`]: resolves which registrations are pressed and drives
//!   their lifecycle.

mod descriptor;
mod manager;
mod pressed;
mod registration;

pub use descriptor::{KeyDescriptor, ModifierSpec};
pub use manager::{HotkeyManager, TargetStatus, TargetStatusSource};
pub use pressed::PressedKeySet;
pub use registration::{
    DEFAULT_HOLD_DELAY_MS, DEFAULT_HOLD_INTERVAL_MS, FireOnHoldTiming, HoldTiming, Hotkey,
    HotkeyId, HotkeyInvocation, HotkeyScope, MAX_HOLD_DELAY_MS, MAX_HOLD_INTERVAL_MS,
    MIN_HOLD_INTERVAL_MS,
};
