#![forbid(unsafe_code)]

//! Error types.
//!
//! Every error here reports a contract violation by the caller. Expected
//! environmental conditions (duplicate moves, debounced touches, platform
//! key-up bugs) are handled by guard clauses and never surface as errors.

use thiserror::Error;

use crate::event::PointerId;
use crate::pointer::ListenerId;

/// Pointer attachment protocol violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("{pointer} is already attached to {holder}, {listener} cannot attach")]
    AlreadyAttached {
        pointer: PointerId,
        holder: ListenerId,
        listener: ListenerId,
    },

    #[error("{pointer} is not attached to {listener}")]
    NotAttached {
        pointer: PointerId,
        listener: ListenerId,
    },

    #[error("{0} is not registered")]
    UnknownPointer(PointerId),
}

/// Failures while parsing a key-combination string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("empty key combination")]
    Empty,

    #[error("key combination has no trigger key: {0}")]
    MissingTrigger(String),

    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    #[error("key listed twice in combination: {0}")]
    DuplicateKey(String),

    #[error("'?' wildcard is not allowed on the trigger key: {0}")]
    MisplacedWildcard(String),
}

/// Invalid drag or hotkey configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} ({shift_value}) must not exceed its coarse counterpart ({value})")]
    ShiftExceedsBase {
        field: &'static str,
        shift_value: f64,
        value: f64,
    },

    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("keyboard drag settings mix delta-mode and speed-mode values")]
    MixedMotionModes,
}

/// Drag-listener contract violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GestureError {
    #[error("{0} already has an active gesture session")]
    SessionActive(ListenerId),

    #[error("{0} has been disposed")]
    Disposed(ListenerId),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Convenience alias for drag-listener results.
pub type Result<T> = std::result::Result<T, GestureError>;
