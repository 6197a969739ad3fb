#![forbid(unsafe_code)]

//! Pointer attachment registry.
//!
//! Tracks every live pointer and, per pointer, the single listener currently
//! driving it. A listener that wants to drag a pointer attaches
//! *exclusively*, which also marks the pointer as dragging; other listeners
//! check [`PointerRegistry::is_dragging`] before starting a competing
//! gesture. Cooperating listeners (auto-pan, keyboard focus) attach
//! non-exclusively: they record the relation without claiming the drag.
//!
//! # Invariants
//!
//! 1. A pointer has at most one attached listener.
//! 2. `dragging` is true iff the current attachment is exclusive.
//! 3. Only the attached listener can detach; anything else is reported as
//!    [`AttachmentError::NotAttached`] and leaves the registry unchanged.
//! 4. The focus pointer ([`PointerId::FOCUS`]) always exists.
//!
//! Pointer lifecycle belongs to the input front end: it calls
//! [`apply`](PointerRegistry::apply) for every native event and
//! [`remove_pointer`](PointerRegistry::remove_pointer) when a contact ends.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use tracing::{debug, error};

use crate::error::AttachmentError;
use crate::event::{PointerEvent, PointerEventKind, PointerId, PointerKind};
use crate::geometry::Vector2;

// ---------------------------------------------------------------------------
// ListenerId
// ---------------------------------------------------------------------------

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a gesture or hotkey listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl ListenerId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// The relation between a pointer and the listener driving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub listener: ListenerId,
    pub exclusive: bool,
}

/// One physical input source.
#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    id: PointerId,
    kind: PointerKind,
    point: Vector2,
    is_down: bool,
    attachment: Option<Attachment>,
}

impl Pointer {
    fn new(id: PointerId, kind: PointerKind) -> Self {
        Self {
            id,
            kind,
            point: Vector2::ZERO,
            is_down: false,
            attachment: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> PointerId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    /// Last known global position.
    #[must_use]
    pub fn point(&self) -> Vector2 {
        self.point
    }

    /// True between a down and the matching up/cancel.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// True while an exclusive listener is attached.
    #[must_use]
    pub fn dragging(&self) -> bool {
        self.attachment.is_some_and(|a| a.exclusive)
    }

    #[must_use]
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    #[must_use]
    pub fn attached_listener(&self) -> Option<ListenerId> {
        self.attachment.map(|a| a.listener)
    }
}

// ---------------------------------------------------------------------------
// PointerRegistry
// ---------------------------------------------------------------------------

/// Process-wide table of pointers and their attachments.
#[derive(Debug, Clone)]
pub struct PointerRegistry {
    pointers: AHashMap<PointerId, Pointer>,
}

impl Default for PointerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerRegistry {
    /// Create a registry holding only the focus pointer.
    #[must_use]
    pub fn new() -> Self {
        let mut pointers = AHashMap::new();
        pointers.insert(
            PointerId::FOCUS,
            Pointer::new(PointerId::FOCUS, PointerKind::Focus),
        );
        Self { pointers }
    }

    // --- lifecycle (input front end only) ---

    /// Register a pointer if unseen; returns it either way.
    pub fn add_pointer(&mut self, id: PointerId, kind: PointerKind) -> &mut Pointer {
        self.pointers.entry(id).or_insert_with(|| Pointer::new(id, kind))
    }

    /// Forget a pointer whose contact ended. The focus pointer is permanent.
    pub fn remove_pointer(&mut self, id: PointerId) -> Option<Pointer> {
        if id == PointerId::FOCUS {
            return None;
        }
        self.pointers.remove(&id)
    }

    /// Record a native pointer event: position and button state.
    pub fn apply(&mut self, event: &PointerEvent) {
        let pointer = self.add_pointer(event.pointer, event.pointer_kind);
        pointer.point = event.point;
        match event.kind {
            PointerEventKind::Down(_) => pointer.is_down = true,
            PointerEventKind::Up(_) | PointerEventKind::Cancel => pointer.is_down = false,
            PointerEventKind::Move | PointerEventKind::Enter | PointerEventKind::Exit => {}
        }
    }

    // --- queries ---

    #[must_use]
    pub fn get(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// True if `listener` is the pointer's attached listener.
    #[must_use]
    pub fn is_attached_to(&self, pointer: PointerId, listener: ListenerId) -> bool {
        self.pointers
            .get(&pointer)
            .and_then(Pointer::attached_listener)
            == Some(listener)
    }

    /// True if an exclusive listener holds the pointer.
    #[must_use]
    pub fn is_dragging(&self, pointer: PointerId) -> bool {
        self.pointers.get(&pointer).is_some_and(Pointer::dragging)
    }

    #[must_use]
    pub fn attached_listener(&self, pointer: PointerId) -> Option<ListenerId> {
        self.pointers.get(&pointer).and_then(Pointer::attached_listener)
    }

    // --- attachment protocol ---

    /// Attach `listener` to `pointer`.
    ///
    /// Exclusive attachment fails if any listener is attached. Non-exclusive
    /// attachment replaces another non-exclusive attachment but never an
    /// exclusive one.
    pub fn attach(
        &mut self,
        pointer: PointerId,
        listener: ListenerId,
        exclusive: bool,
    ) -> Result<(), AttachmentError> {
        let entry = self
            .pointers
            .get_mut(&pointer)
            .ok_or(AttachmentError::UnknownPointer(pointer))?;

        if let Some(current) = entry.attachment
            && (exclusive || current.exclusive)
        {
            return Err(AttachmentError::AlreadyAttached {
                pointer,
                holder: current.listener,
                listener,
            });
        }

        entry.attachment = Some(Attachment {
            listener,
            exclusive,
        });
        debug!(%pointer, %listener, exclusive, "pointer attached");
        Ok(())
    }

    /// Detach `listener` from `pointer`.
    ///
    /// Detaching a listener that is not attached leaves the registry as it
    /// was and reports [`AttachmentError::NotAttached`].
    pub fn detach(&mut self, pointer: PointerId, listener: ListenerId) -> Result<(), AttachmentError> {
        let Some(entry) = self.pointers.get_mut(&pointer) else {
            // The contact may already have ended and been removed.
            return Err(AttachmentError::UnknownPointer(pointer));
        };
        if entry.attached_listener() != Some(listener) {
            error!(%pointer, %listener, "detach without matching attach");
            return Err(AttachmentError::NotAttached { pointer, listener });
        }
        entry.attachment = None;
        debug!(%pointer, %listener, "pointer detached");
        Ok(())
    }
}
