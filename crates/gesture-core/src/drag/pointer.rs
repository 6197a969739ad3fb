#![forbid(unsafe_code)]

//! Pointer-drag front end.
//!
//! Feeds native pointer events into a [`DragCore`]. The host applies each
//! event to the [`PointerRegistry`] first, then hands it to every listener
//! whose target was hit (or which is already dragging that pointer).
//!
//! Start guards, in order:
//! - the listener is disposed or already dragging (contract violations when
//!   called through [`PointerDragListener::press`]);
//! - wrong mouse button, or an `Enter` that cannot snag;
//! - the pointer is already dragging for another listener;
//! - the pointer just interrupted an enter-started session on this listener
//!   (debounce; consumed by the attempt).

use tracing::{debug, trace};

use crate::error::Result;
use crate::event::{GestureEvent, MouseButton, PointerEvent, PointerEventKind};
use crate::scene::TransformNotifier;

use super::{DragCore, DragEnv, GestureSession};

/// Drags a target with a mouse, touch or pen pointer.
#[derive(Debug)]
pub struct PointerDragListener {
    core: DragCore,
    mouse_button: MouseButton,
    allow_touch_snag: bool,
    notifier: Option<TransformNotifier>,
}

impl PointerDragListener {
    /// Wrap a configured core. Left button, touch snag enabled.
    #[must_use]
    pub fn new(core: DragCore) -> Self {
        Self {
            core,
            mouse_button: MouseButton::Left,
            allow_touch_snag: true,
            notifier: None,
        }
    }

    /// Only this button starts (and its release ends) a mouse drag.
    #[must_use]
    pub fn with_mouse_button(mut self, button: MouseButton) -> Self {
        self.mouse_button = button;
        self
    }

    /// Let a touch or pen pointer that is already down start a drag by
    /// sliding onto the target.
    #[must_use]
    pub fn with_allow_touch_snag(mut self, allow: bool) -> Self {
        self.allow_touch_snag = allow;
        self
    }

    /// Keep the target pinned under the pointer when an ancestor transform
    /// changes mid-drag. Requires a target.
    #[must_use]
    pub fn with_transform_notifier(mut self, notifier: TransformNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn core(&self) -> &DragCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DragCore {
        &mut self.core
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.core.is_dragging()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Route one native event. Returns `true` if the listener consumed it.
    ///
    /// Start failures are logged and reported as `false`; use
    /// [`press`](Self::press) to observe them.
    pub fn handle_event(&mut self, env: &mut DragEnv<'_>, event: &PointerEvent) -> bool {
        self.sync_ancestor_transforms(env);
        match event.kind {
            PointerEventKind::Down(_) | PointerEventKind::Enter => {
                if self.core.is_dragging() {
                    return false;
                }
                match self.press(env, event) {
                    Ok(started) => started,
                    Err(err) => {
                        debug!(listener = %self.core.id(), %err, "drag start refused");
                        false
                    }
                }
            }
            PointerEventKind::Move => self.pointer_move(env, event),
            PointerEventKind::Up(button) => self.pointer_up(env, event, Some(button)),
            PointerEventKind::Cancel => self.pointer_up(env, event, None),
            PointerEventKind::Exit => false,
        }
    }

    /// Try to start a drag from `event`.
    ///
    /// `Ok(false)` means an environmental guard rejected the attempt.
    /// `Err` reports a contract violation: the listener is disposed, already
    /// dragging, or the pointer is held by someone else.
    pub fn press(&mut self, env: &mut DragEnv<'_>, event: &PointerEvent) -> Result<bool> {
        self.core.check_can_start()?;
        let id = self.core.id();

        let started_by_enter = match event.kind {
            PointerEventKind::Down(button) => {
                if !event.pointer_kind.is_touch_like() && button != self.mouse_button {
                    trace!(listener = %id, ?button, "ignoring press with other button");
                    return Ok(false);
                }
                false
            }
            PointerEventKind::Enter => {
                let down = env.pointers.get(event.pointer).is_some_and(|p| p.is_down());
                if !(self.allow_touch_snag && event.pointer_kind.is_touch_like() && down) {
                    return Ok(false);
                }
                true
            }
            _ => return Ok(false),
        };

        if env.pointers.is_dragging(event.pointer) {
            debug!(listener = %id, pointer = %event.pointer, "pointer already dragging");
            return Ok(false);
        }
        if self.core.take_debounce(event.pointer) {
            debug!(listener = %id, pointer = %event.pointer, "start debounced after interruption");
            return Ok(false);
        }

        env.pointers.attach(event.pointer, id, true)?;

        let mut session = GestureSession::new(Some(event.pointer));
        session.last_point = Some(event.point);
        session.started_by_enter = started_by_enter;
        if let PointerEventKind::Down(button) = event.kind
            && !event.pointer_kind.is_touch_like()
        {
            session.button = Some(button);
        }
        if let Some(target) = self.core.target() {
            session.parent_to_global = env.scene.parent_to_global_transform(target);
            if let Some(notifier) = &self.notifier {
                session.subscription = Some(notifier.subscribe(env.scene.ancestors(target)));
            }
        }

        self.core.begin(env, session, GestureEvent::Pointer(*event));
        Ok(true)
    }

    fn pointer_move(&mut self, env: &mut DragEnv<'_>, event: &PointerEvent) -> bool {
        let model_view = *self.core.model_view_transform();
        let Some(session) = self.core.session_mut() else {
            return false;
        };
        if session.pointer != Some(event.pointer) {
            return false;
        }
        let Some(last) = session.last_point else {
            return false;
        };

        let raw = event.point - last;
        if raw.is_zero() {
            trace!(pointer = %event.pointer, "zero-length move ignored");
            return true;
        }
        session.last_point = Some(event.point);

        let delta = model_view.inverse_delta(session.parent_to_global.inverse_delta(raw));
        session.accumulated += delta;
        let proposed = session.start_position + session.accumulated;

        self.core
            .apply_motion(env, delta, proposed, GestureEvent::Pointer(*event));
        true
    }

    fn pointer_up(
        &mut self,
        env: &mut DragEnv<'_>,
        event: &PointerEvent,
        button: Option<MouseButton>,
    ) -> bool {
        let Some(session) = self.core.session() else {
            return false;
        };
        if session.pointer != Some(event.pointer) {
            return false;
        }
        // Cancel always ends; a release must match the starting button.
        if let (Some(released), Some(started)) = (button, session.button)
            && released != started
        {
            return false;
        }
        self.core
            .finish(env, Some(GestureEvent::Pointer(*event)), false, false)
    }

    // -----------------------------------------------------------------------
    // Ancestor tracking
    // -----------------------------------------------------------------------

    /// Compensate for ancestor transform changes since the last check.
    ///
    /// Prepends `new⁻¹ · old` to the target's matrix so it stays put in the
    /// global frame, then caches the new ancestor transform for later deltas.
    /// With `translate_node` set, the model position follows the pinned
    /// translation so the next move continues from where the node now is.
    /// Called at the start of every dispatched event; hosts that move
    /// ancestors between events may call it directly.
    pub fn sync_ancestor_transforms(&mut self, env: &mut DragEnv<'_>) {
        let Some(target) = self.core.target() else {
            return;
        };
        let Some(session) = self.core.session_mut() else {
            return;
        };
        let changed = session
            .subscription
            .as_mut()
            .is_some_and(|sub| sub.take_changed());
        if !changed {
            return;
        }

        let new_transform = env.scene.parent_to_global_transform(target);
        let old = *session.parent_to_global.matrix();
        let correction = new_transform.inverse().multiply(&old);
        session.parent_to_global = new_transform;

        let Some(matrix) = env.scene.matrix(target) else {
            return;
        };
        let pinned = correction.multiply(&matrix);
        env.scene.set_matrix(target, pinned);
        self.core.rebase_on_node(env.scene);
        debug!(node = %target, "target pinned after ancestor transform change");
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    /// End the active drag as interrupted. Idempotent.
    pub fn interrupt(&mut self, env: &mut DragEnv<'_>) -> bool {
        self.core.interrupt(env)
    }

    /// Interrupt and roll back to the start snapshot.
    pub fn cancel(&mut self, env: &mut DragEnv<'_>) -> bool {
        self.core.cancel(env)
    }

    /// Interrupt and refuse further starts. Idempotent.
    pub fn dispose(&mut self, env: &mut DragEnv<'_>) {
        self.core.dispose(env);
        self.notifier = None;
    }
}
