#![forbid(unsafe_code)]

//! Drag gesture state machine shared by the pointer and keyboard front ends.
//!
//! [`DragCore`] owns the model position, the optional position constraint,
//! the consumer callbacks and at most one [`GestureSession`]. Front ends
//! decide *when* to start, move and end; the core decides *what* that means
//! for position, node matrix, attachment and callbacks.
//!
//! # State Machine
//!
//! ```text
//!              try start (guards pass)
//! ┌──────┐ ─────────────────────────▶ ┌───────┐  start callback  ┌──────────┐
//! │ Idle │                             │ Armed │ ───────────────▶ │ Dragging │◀─┐ move
//! └──────┘ ◀───────────────────────── └───────┘                  └──────────┘──┘
//!     ▲         (guards reject)                                        │
//!     └─────────── end / interrupt / cancel (end callback) ────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one session per listener.
//! 2. `end` runs exactly once per session, whether the session ends
//!    naturally or by interruption. A second `interrupt()` is a no-op.
//! 3. [`DragEvent::interrupted`] is true only inside the end callback of an
//!    interrupted session.
//! 4. Bounds clamp the proposed position, never the delta: an axis already
//!    inside the bounds is passed through unchanged.
//! 5. Callbacks never see the listener mutably. They request interruption
//!    or disposal through [`DragControl`]; requests are applied after the
//!    callback returns, so cleanup always runs once on a consistent state.

pub mod keyboard;
pub mod pointer;

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{GestureError, Result};
use crate::event::{GestureEvent, MouseButton, PointerId};
use crate::geometry::{Bounds2, Matrix3, Transform, Vector2};
use crate::instrument::{self, CallbackKind, Instrument};
use crate::pointer::{ListenerId, PointerRegistry};
use crate::scene::{NodeId, SceneGraph, TransformSubscription};

pub use keyboard::{
    KeyboardDragConfig, KeyboardDragDirection, KeyboardDragListener, KeyboardDragMotion,
};
pub use pointer::PointerDragListener;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// The shared collaborators a drag listener reads and writes.
///
/// Built by the host for each dispatch; listeners never hold on to it.
pub struct DragEnv<'a> {
    pub scene: &'a mut dyn SceneGraph,
    pub pointers: &'a mut PointerRegistry,
}

impl<'a> DragEnv<'a> {
    pub fn new(scene: &'a mut dyn SceneGraph, pointers: &'a mut PointerRegistry) -> Self {
        Self { scene, pointers }
    }
}

// ---------------------------------------------------------------------------
// Position constraint
// ---------------------------------------------------------------------------

/// Restriction applied to every proposed model position.
#[derive(Clone, Default)]
pub enum PositionConstraint {
    #[default]
    None,
    /// Clamp to the nearest point inside a rectangle.
    Bounds(Bounds2),
    /// Arbitrary mapping to the nearest allowed point.
    Map(Rc<dyn Fn(Vector2) -> Vector2>),
}

impl fmt::Debug for PositionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bounds(b) => f.debug_tuple("Bounds").field(b).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
        }
    }
}

impl PositionConstraint {
    /// Build a mapping constraint.
    pub fn map(f: impl Fn(Vector2) -> Vector2 + 'static) -> Self {
        Self::Map(Rc::new(f))
    }

    #[must_use]
    pub fn apply(&self, proposed: Vector2) -> Vector2 {
        match self {
            Self::None => proposed,
            Self::Bounds(bounds) => bounds.closest_point_to(proposed),
            Self::Map(f) => f(proposed),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Session recorded, start callback running.
    Armed,
    Dragging,
}

/// One start-to-end lifetime of a drag.
#[derive(Debug)]
pub struct GestureSession {
    pub(crate) pointer: Option<PointerId>,
    /// Last global point seen (pointer drags only).
    pub(crate) last_point: Option<Vector2>,
    /// Button that started a mouse drag; only its release ends the drag.
    pub(crate) button: Option<MouseButton>,
    pub(crate) start_matrix: Option<Matrix3>,
    pub(crate) start_position: Vector2,
    /// Sum of unclamped model deltas since start.
    pub(crate) accumulated: Vector2,
    /// Cached parent-to-global transform of the target.
    pub(crate) parent_to_global: Transform,
    /// Ancestor transform watch; dropping it unsubscribes.
    pub(crate) subscription: Option<TransformSubscription>,
    pub(crate) started_by_enter: bool,
}

impl GestureSession {
    pub(crate) fn new(pointer: Option<PointerId>) -> Self {
        Self {
            pointer,
            last_point: None,
            button: None,
            start_matrix: None,
            start_position: Vector2::ZERO,
            accumulated: Vector2::ZERO,
            parent_to_global: Transform::IDENTITY,
            subscription: None,
            started_by_enter: false,
        }
    }

    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        self.pointer
    }

    #[must_use]
    pub fn start_position(&self) -> Vector2 {
        self.start_position
    }

    #[must_use]
    pub fn button(&self) -> Option<MouseButton> {
        self.button
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Argument to `start`, `drag` and `end` callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    pub listener: ListenerId,
    /// Real input, or a synthetic event for programmatic ends.
    pub event: GestureEvent,
    /// Model-space delta of this step; zero for start and end.
    pub delta: Vector2,
    /// Model position after this step (constrained).
    pub position: Vector2,
    pub interrupted: bool,
    /// True in the end callback of a cancelled session (rolled back).
    pub cancelled: bool,
}

/// Requests a callback can make of its own listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragControl {
    interrupt: bool,
    dispose: bool,
}

impl DragControl {
    /// End the session as interrupted once the callback returns.
    pub fn request_interrupt(&mut self) {
        self.interrupt = true;
    }

    /// Dispose the listener once the callback returns.
    pub fn request_dispose(&mut self) {
        self.dispose = true;
    }

    #[must_use]
    pub fn interrupt_requested(&self) -> bool {
        self.interrupt
    }

    #[must_use]
    pub fn dispose_requested(&self) -> bool {
        self.dispose
    }
}

type DragCallback = Box<dyn FnMut(&DragEvent, &mut DragControl)>;

// ---------------------------------------------------------------------------
// DragCore
// ---------------------------------------------------------------------------

/// The generalized drag machine.
pub struct DragCore {
    id: ListenerId,
    label: String,
    phase: DragPhase,
    session: Option<GestureSession>,
    interrupted: bool,
    disposed: bool,
    /// Pointer whose enter-started session was just interrupted.
    debounce_pointer: Option<PointerId>,
    position: Vector2,
    constraint: PositionConstraint,
    model_view: Transform,
    translate_node: bool,
    target: Option<NodeId>,
    instrument: Rc<dyn Instrument>,
    on_start: Option<DragCallback>,
    on_drag: Option<DragCallback>,
    on_end: Option<DragCallback>,
}

impl fmt::Debug for DragCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragCore")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("phase", &self.phase)
            .field("session", &self.session)
            .field("disposed", &self.disposed)
            .field("position", &self.position)
            .field("constraint", &self.constraint)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Default for DragCore {
    fn default() -> Self {
        Self::new()
    }
}

impl DragCore {
    /// Idle machine at the origin, no target, no callbacks.
    #[must_use]
    pub fn new() -> Self {
        let id = ListenerId::next();
        Self {
            id,
            label: id.to_string(),
            phase: DragPhase::Idle,
            session: None,
            interrupted: false,
            disposed: false,
            debounce_pointer: None,
            position: Vector2::ZERO,
            constraint: PositionConstraint::None,
            model_view: Transform::IDENTITY,
            translate_node: false,
            target: None,
            instrument: instrument::noop(),
            on_start: None,
            on_drag: None,
            on_end: None,
        }
    }

    // --- builder ---

    /// Node whose matrix is snapshotted, rolled back and optionally
    /// translated.
    #[must_use]
    pub fn with_target(mut self, node: NodeId) -> Self {
        self.target = Some(node);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Vector2) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: PositionConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    #[must_use]
    pub fn with_drag_bounds(self, bounds: Bounds2) -> Self {
        self.with_constraint(PositionConstraint::Bounds(bounds))
    }

    /// Model-to-view transform; view deltas are mapped back through it.
    #[must_use]
    pub fn with_model_view_transform(mut self, transform: Transform) -> Self {
        self.model_view = transform;
        self
    }

    /// Write `model_view(position)` into the target's translation after
    /// each move.
    #[must_use]
    pub fn with_translate_node(mut self, translate: bool) -> Self {
        self.translate_node = translate;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_instrument(mut self, instrument: Rc<dyn Instrument>) -> Self {
        self.instrument = instrument;
        self
    }

    #[must_use]
    pub fn on_start(mut self, f: impl FnMut(&DragEvent, &mut DragControl) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drag(mut self, f: impl FnMut(&DragEvent, &mut DragControl) + 'static) -> Self {
        self.on_drag = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_end(mut self, f: impl FnMut(&DragEvent, &mut DragControl) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    // --- queries ---

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// True only while an interrupted session's end callback runs.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn position(&self) -> Vector2 {
        self.position
    }

    #[must_use]
    pub fn constraint(&self) -> &PositionConstraint {
        &self.constraint
    }

    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    #[must_use]
    pub fn model_view_transform(&self) -> &Transform {
        &self.model_view
    }

    // --- mutation outside a gesture ---

    /// Move the model position without a gesture; the constraint applies.
    pub fn set_position(&mut self, scene: &mut dyn SceneGraph, position: Vector2) {
        self.position = self.constraint.apply(position);
        self.write_node_translation(scene);
    }

    /// Replace the constraint and re-clamp the current position at once,
    /// even mid-drag.
    pub fn set_constraint(&mut self, scene: &mut dyn SceneGraph, constraint: PositionConstraint) {
        self.constraint = constraint;
        let clamped = self.constraint.apply(self.position);
        if clamped != self.position {
            debug!(listener = %self.id, ?clamped, "position re-clamped to new constraint");
            self.position = clamped;
            self.write_node_translation(scene);
        }
    }

    /// [`set_constraint`](Self::set_constraint) with optional bounds.
    pub fn set_drag_bounds(&mut self, scene: &mut dyn SceneGraph, bounds: Option<Bounds2>) {
        let constraint = bounds.map_or(PositionConstraint::None, PositionConstraint::Bounds);
        self.set_constraint(scene, constraint);
    }

    // --- session lifecycle (front ends) ---

    /// Fail if a start would violate the listener contract.
    pub(crate) fn check_can_start(&self) -> Result<()> {
        if self.disposed {
            return Err(GestureError::Disposed(self.id));
        }
        if self.session.is_some() {
            return Err(GestureError::SessionActive(self.id));
        }
        Ok(())
    }

    /// Consume the debounce mark; true if `pointer` must be rejected.
    pub(crate) fn take_debounce(&mut self, pointer: PointerId) -> bool {
        self.debounce_pointer.take() == Some(pointer)
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut GestureSession> {
        self.session.as_mut()
    }

    /// Record the session and run the start callback.
    ///
    /// The caller has already passed [`check_can_start`](Self::check_can_start)
    /// and attached the pointer.
    pub(crate) fn begin(
        &mut self,
        env: &mut DragEnv<'_>,
        mut session: GestureSession,
        event: GestureEvent,
    ) {
        debug_assert!(self.session.is_none(), "begin with an active session");
        self.phase = DragPhase::Armed;
        session.start_matrix = self.target.and_then(|t| env.scene.matrix(t));
        session.start_position = self.position;
        debug!(listener = %self.id, pointer = ?session.pointer, "drag started");
        self.session = Some(session);

        let drag_event = self.drag_event(event, Vector2::ZERO, false);
        let control = self.invoke(CallbackKind::Start, &drag_event);
        if self.session.is_some() {
            self.phase = DragPhase::Dragging;
        }
        self.apply_control(env, control);
    }

    /// One `Dragging` self-loop: constrain `proposed`, store it, update the
    /// node and run the drag callback with `delta`.
    pub(crate) fn apply_motion(
        &mut self,
        env: &mut DragEnv<'_>,
        delta: Vector2,
        proposed: Vector2,
        event: GestureEvent,
    ) {
        if self.session.is_none() {
            return;
        }
        self.position = self.constraint.apply(proposed);
        trace!(listener = %self.id, ?delta, position = ?self.position, "drag step");
        self.write_node_translation(env.scene);

        let drag_event = self.drag_event(event, delta, false);
        let control = self.invoke(CallbackKind::Drag, &drag_event);
        self.apply_control(env, control);
    }

    /// End the session, if any. Returns `false` when there was none.
    ///
    /// Cleanup order: drop the session (unsubscribing its transform watch),
    /// roll back when cancelling, detach the pointer, then run the end
    /// callback with `interrupted` set for its duration.
    pub(crate) fn finish(
        &mut self,
        env: &mut DragEnv<'_>,
        event: Option<GestureEvent>,
        interrupted: bool,
        cancelled: bool,
    ) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.phase = DragPhase::Idle;

        if cancelled {
            self.position = session.start_position;
            if let (Some(target), Some(matrix)) = (self.target, session.start_matrix) {
                env.scene.set_matrix(target, matrix);
            }
        }

        if let Some(pointer) = session.pointer {
            if env.pointers.is_attached_to(pointer, self.id) {
                // Attached above, so this cannot report a contract violation.
                let _ = env.pointers.detach(pointer, self.id);
            } else {
                debug!(listener = %self.id, %pointer, "attachment already released");
            }
            if interrupted && session.started_by_enter {
                self.debounce_pointer = Some(pointer);
            }
        }

        let event = event.unwrap_or(GestureEvent::Synthetic {
            pointer: session.pointer,
            current_target: self.target,
        });
        drop(session);
        debug!(listener = %self.id, interrupted, cancelled, "drag ended");

        self.interrupted = interrupted;
        let mut drag_event = self.drag_event(event, Vector2::ZERO, interrupted);
        drag_event.cancelled = cancelled;
        let control = self.invoke(CallbackKind::End, &drag_event);
        self.interrupted = false;
        self.apply_control(env, control);
        true
    }

    /// End any session as interrupted. Idempotent.
    pub fn interrupt(&mut self, env: &mut DragEnv<'_>) -> bool {
        self.finish(env, None, true, false)
    }

    /// Interrupt and roll back to the session's start snapshot.
    pub fn cancel(&mut self, env: &mut DragEnv<'_>) -> bool {
        self.finish(env, None, true, true)
    }

    /// Interrupt, then refuse all future starts. Idempotent.
    pub fn dispose(&mut self, env: &mut DragEnv<'_>) {
        if self.disposed {
            return;
        }
        self.interrupt(env);
        self.disposed = true;
        debug!(listener = %self.id, "drag listener disposed");
    }

    // --- internals ---

    fn drag_event(&self, event: GestureEvent, delta: Vector2, interrupted: bool) -> DragEvent {
        DragEvent {
            listener: self.id,
            event,
            delta,
            position: self.position,
            interrupted,
            cancelled: false,
        }
    }

    fn invoke(&mut self, kind: CallbackKind, drag_event: &DragEvent) -> DragControl {
        let mut control = DragControl::default();
        let callback = match kind {
            CallbackKind::Start => &mut self.on_start,
            CallbackKind::Drag => &mut self.on_drag,
            _ => &mut self.on_end,
        };
        self.instrument.invoke(kind, &self.label, &mut || {
            if let Some(cb) = callback.as_mut() {
                cb(drag_event, &mut control);
            }
        });
        control
    }

    fn apply_control(&mut self, env: &mut DragEnv<'_>, control: DragControl) {
        if control.dispose {
            self.dispose(env);
        } else if control.interrupt {
            self.interrupt(env);
        }
    }

    /// Re-derive the model position from the target's translation, shifting
    /// the session start by the same amount. No-op unless `translate_node`.
    pub(crate) fn rebase_on_node(&mut self, scene: &dyn SceneGraph) {
        if !self.translate_node {
            return;
        }
        let Some(matrix) = self.target.and_then(|t| scene.matrix(t)) else {
            return;
        };
        let position = self.model_view.inverse_point(matrix.translation_vector());
        let shift = position - self.position;
        if let Some(session) = self.session.as_mut() {
            session.start_position += shift;
        }
        self.position = position;
    }

    fn write_node_translation(&self, scene: &mut dyn SceneGraph) {
        if !self.translate_node {
            return;
        }
        let Some(target) = self.target else {
            return;
        };
        if let Some(matrix) = scene.matrix(target) {
            let translation = self.model_view.transform_point(self.position);
            scene.set_matrix(target, matrix.with_translation(translation));
        }
    }
}
