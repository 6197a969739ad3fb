#![forbid(unsafe_code)]

//! Core: input-gesture dispatch for retained-mode scene graphs.
//!
//! # Role
//! `gesture-core` turns raw pointer and keyboard input into drag gestures
//! and hotkey activations. It owns no scene, no renderer and no event loop:
//! the host delivers native events, advances timers once per frame, and
//! exposes its node tree through [`scene::SceneGraph`].
//!
//! # Primary responsibilities
//! - **Pointer attachment** ([`pointer`]): at most one listener drives a
//!   pointer; others can see that and stay out of the way.
//! - **Drag state machine** ([`drag`]): start / move / end / interrupt with
//!   delta accumulation, bounds, and coordinate-frame conversion, shared by
//!   the pointer ([`drag::PointerDragListener`]) and keyboard
//!   ([`drag::KeyboardDragListener`]) front ends.
//! - **Hotkeys** ([`hotkey`]): descriptor matching with ignorable modifiers,
//!   modifier blocking, overlap policy and fire-on-hold.
//! - **Timing** ([`timer`]): discrete (delay + interval) and continuous
//!   (per-frame) repeat timers.
//!
//! # Threading
//! Everything is single-threaded and re-entrancy safe. Shared handles use
//! `Rc`; nothing here is `Send`.
//!
//! # Process-wide state
//! [`hotkey::PressedKeySet`] and [`pointer::PointerRegistry`] are the only
//! shared mutable state. The host creates one of each, mutates them from
//! native input only, and lends them to listeners per dispatch.

pub mod drag;
pub mod error;
pub mod event;
pub mod geometry;
pub mod hotkey;
pub mod instrument;
pub mod pointer;
pub mod scene;
pub mod timer;

pub use drag::{
    DragControl, DragCore, DragEnv, DragEvent, DragPhase, KeyboardDragConfig,
    KeyboardDragListener, KeyboardDragMotion, PointerDragListener, PositionConstraint,
};
pub use error::{AttachmentError, ConfigError, DescriptorError, GestureError};
pub use event::{GestureEvent, Key, KeyboardEvent, Modifiers, PointerEvent, PointerId};
pub use geometry::{Bounds2, Matrix3, Transform, Vector2};
pub use hotkey::{Hotkey, HotkeyManager, KeyDescriptor, PressedKeySet};
pub use pointer::{ListenerId, PointerRegistry};
