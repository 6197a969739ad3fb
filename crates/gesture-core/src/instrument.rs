#![forbid(unsafe_code)]

//! Optional instrumentation around consumer callbacks.
//!
//! Every `start`/`drag`/`end`/`press`/`fire`/`release` callback invocation is
//! routed through an [`Instrument`]. Recording tooling can observe the
//! invocations; the gesture machinery behaves identically with the
//! [`NoopInstrument`] stand-in, which is the default.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Which consumer callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Start,
    Drag,
    End,
    Press,
    Fire,
    Release,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Drag => "drag",
            Self::End => "end",
            Self::Press => "press",
            Self::Fire => "fire",
            Self::Release => "release",
        })
    }
}

/// Wraps consumer callback invocations.
///
/// Implementations must call `callback` exactly once.
pub trait Instrument {
    fn invoke(&self, kind: CallbackKind, label: &str, callback: &mut dyn FnMut());
}

/// Pass-through instrument.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstrument;

impl Instrument for NoopInstrument {
    #[inline]
    fn invoke(&self, _kind: CallbackKind, _label: &str, callback: &mut dyn FnMut()) {
        callback();
    }
}

/// Shared handle to the default instrument.
#[must_use]
pub fn noop() -> Rc<dyn Instrument> {
    Rc::new(NoopInstrument)
}

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRecord {
    pub kind: CallbackKind,
    pub label: String,
}

/// Instrument that records every invocation in order.
#[derive(Debug, Default)]
pub struct RecordingInstrument {
    records: RefCell<Vec<InvocationRecord>>,
}

impl RecordingInstrument {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded invocations.
    #[must_use]
    pub fn records(&self) -> Vec<InvocationRecord> {
        self.records.borrow().clone()
    }

    /// Kinds only, in invocation order.
    #[must_use]
    pub fn kinds(&self) -> Vec<CallbackKind> {
        self.records.borrow().iter().map(|r| r.kind).collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Instrument for RecordingInstrument {
    fn invoke(&self, kind: CallbackKind, label: &str, callback: &mut dyn FnMut()) {
        // Record before running so a callback that re-enters is ordered after its parent.
        self.records.borrow_mut().push(InvocationRecord {
            kind,
            label: label.to_string(),
        });
        callback();
    }
}
