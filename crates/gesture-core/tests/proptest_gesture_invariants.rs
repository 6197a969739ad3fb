//! Property-based invariant tests for drag gestures, hotkeys and timers.
//!
//! These tests verify behavioral invariants over arbitrary input sequences:
//!
//! 1. Two exclusive listeners never drive the same pointer at once
//! 2. Repeated identical move points produce no extra drag callbacks
//! 3. Bounds clamp only the axis that left them
//! 4. Interrupting any number of times ends a gesture exactly once
//! 5. Modifier blocking: "y" and "shift+y" never both fire
//! 6. Ignorable modifiers: "shift?+arrowLeft" fires with or without Shift
//! 7. Timer fire counts do not depend on how time is sliced into frames

use std::cell::Cell;
use std::rc::Rc;

use gesture_core::drag::{DragCore, DragEnv, PointerDragListener};
use gesture_core::event::{Key, KeyboardEvent, MouseButton, PointerEvent, PointerEventKind, PointerId};
use gesture_core::geometry::{Bounds2, Vector2};
use gesture_core::hotkey::{Hotkey, HotkeyManager, PressedKeySet};
use gesture_core::pointer::PointerRegistry;
use gesture_core::scene::SceneTree;
use gesture_core::timer::{ContinuousTimer, DiscreteTimer};
use proptest::prelude::*;
use web_time::Duration;

// ── Strategies ──────────────────────────────────────────────────────────

/// Pointer input addressed to one of two listeners sharing a pointer.
#[derive(Debug, Clone)]
enum Op {
    Down(usize),
    Move(i32, i32),
    Up,
    Interrupt(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..2).prop_map(Op::Down),
        (-20i32..20, -20i32..20).prop_map(|(x, y)| Op::Move(x, y)),
        Just(Op::Up),
        (0usize..2).prop_map(Op::Interrupt),
    ]
}

/// Small integer grid so consecutive duplicates are common.
fn grid_point() -> impl Strategy<Value = (i32, i32)> {
    (0i32..3, 0i32..3)
}

fn durations(max_ms: u64, len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..=max_ms, 1..len)
}

/// Any subset of Shift, Ctrl, Alt held before the trigger.
fn modifier_subset() -> impl Strategy<Value = Vec<Key>> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(shift, ctrl, alt)| {
        [(shift, Key::Shift), (ctrl, Key::Ctrl), (alt, Key::Alt)]
            .into_iter()
            .filter_map(|(held, key)| held.then_some(key))
            .collect()
    })
}

// ── Helpers ─────────────────────────────────────────────────────────────

const POINTER: PointerId = PointerId(1);

fn pointer_event(kind: PointerEventKind, x: f64, y: f64) -> PointerEvent {
    PointerEvent::new(POINTER, kind, Vector2::new(x, y))
}

fn counting_core(ends: &Rc<Cell<u32>>) -> DragCore {
    let e = Rc::clone(ends);
    DragCore::new().on_end(move |_, _| e.set(e.get() + 1))
}

fn send_keys(manager: &mut HotkeyManager, keys: &mut PressedKeySet, ev: KeyboardEvent) {
    keys.apply(&ev);
    manager.handle_key_event(keys, &ev);
}

fn counted(descriptor: &str, fires: &Rc<Cell<u32>>) -> Hotkey {
    let f = Rc::clone(fires);
    Hotkey::new(descriptor)
        .expect("valid descriptor")
        .on_fire(move |_| f.set(f.get() + 1))
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Exclusivity
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn exclusive_listeners_never_share_a_pointer(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut scene = SceneTree::new();
        let mut pointers = PointerRegistry::new();
        let mut listeners = [
            PointerDragListener::new(DragCore::new()),
            PointerDragListener::new(DragCore::new()),
        ];
        let mut last = (0.0, 0.0);

        for op in &ops {
            let mut env = DragEnv::new(&mut scene, &mut pointers);
            match *op {
                Op::Down(i) => {
                    let ev = pointer_event(PointerEventKind::Down(MouseButton::Left), last.0, last.1);
                    env.pointers.apply(&ev);
                    listeners[i].handle_event(&mut env, &ev);
                }
                Op::Move(x, y) => {
                    last = (f64::from(x), f64::from(y));
                    let ev = pointer_event(PointerEventKind::Move, last.0, last.1);
                    env.pointers.apply(&ev);
                    for l in &mut listeners {
                        l.handle_event(&mut env, &ev);
                    }
                }
                Op::Up => {
                    let ev = pointer_event(PointerEventKind::Up(MouseButton::Left), last.0, last.1);
                    env.pointers.apply(&ev);
                    for l in &mut listeners {
                        l.handle_event(&mut env, &ev);
                    }
                }
                Op::Interrupt(i) => {
                    listeners[i].interrupt(&mut env);
                }
            }

            let dragging: Vec<usize> = (0..2).filter(|&i| listeners[i].is_dragging()).collect();
            prop_assert!(dragging.len() <= 1, "both listeners dragging after {:?}", op);
            if let [i] = dragging[..] {
                prop_assert_eq!(
                    pointers.attached_listener(POINTER),
                    Some(listeners[i].core().id())
                );
                prop_assert!(pointers.is_dragging(POINTER));
            } else {
                prop_assert!(!pointers.is_dragging(POINTER));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Zero-delta moves are suppressed
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn duplicate_points_produce_no_drag(
        moves in prop::collection::vec(grid_point(), 1..40),
    ) {
        let drags = Rc::new(Cell::new(0u32));
        let d = Rc::clone(&drags);
        let core = DragCore::new().on_drag(move |_, _| d.set(d.get() + 1));
        let mut listener = PointerDragListener::new(core);
        let mut scene = SceneTree::new();
        let mut pointers = PointerRegistry::new();
        let mut env = DragEnv::new(&mut scene, &mut pointers);

        let down = pointer_event(PointerEventKind::Down(MouseButton::Left), 0.0, 0.0);
        env.pointers.apply(&down);
        prop_assert!(listener.handle_event(&mut env, &down));

        let mut expected = 0;
        let mut previous = (0, 0);
        for &(x, y) in &moves {
            if (x, y) != previous {
                expected += 1;
            }
            previous = (x, y);
            let ev = pointer_event(PointerEventKind::Move, f64::from(x), f64::from(y));
            env.pointers.apply(&ev);
            listener.handle_event(&mut env, &ev);
        }
        prop_assert_eq!(drags.get(), expected);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Bounds clamp position, not direction
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bounds_alter_only_the_offending_axis(
        x in -500i32..500,
        y in 0i32..=100,
        swap in any::<bool>(),
    ) {
        let (tx, ty) = if swap { (y, x) } else { (x, y) };
        let (tx, ty) = (f64::from(tx), f64::from(ty));
        let core = DragCore::new()
            .with_position(Vector2::new(50.0, 50.0))
            .with_drag_bounds(Bounds2::new(0.0, 0.0, 100.0, 100.0));
        let mut listener = PointerDragListener::new(core);
        let mut scene = SceneTree::new();
        let mut pointers = PointerRegistry::new();
        let mut env = DragEnv::new(&mut scene, &mut pointers);

        let down = pointer_event(PointerEventKind::Down(MouseButton::Left), 50.0, 50.0);
        env.pointers.apply(&down);
        listener.handle_event(&mut env, &down);
        let ev = pointer_event(PointerEventKind::Move, tx, ty);
        env.pointers.apply(&ev);
        listener.handle_event(&mut env, &ev);

        let unclamped = Vector2::new(50.0 + (tx - 50.0), 50.0 + (ty - 50.0));
        let pos = listener.core().position();
        if swap {
            prop_assert_eq!(pos.x, unclamped.x);
            prop_assert_eq!(pos.y, unclamped.y.clamp(0.0, 100.0));
        } else {
            prop_assert_eq!(pos.y, unclamped.y);
            prop_assert_eq!(pos.x, unclamped.x.clamp(0.0, 100.0));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Interrupt idempotence
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn drag_interrupts_end_once(repeats in 1usize..8) {
        let ends = Rc::new(Cell::new(0u32));
        let mut listener = PointerDragListener::new(counting_core(&ends));
        let mut scene = SceneTree::new();
        let mut pointers = PointerRegistry::new();
        let mut env = DragEnv::new(&mut scene, &mut pointers);

        let down = pointer_event(PointerEventKind::Down(MouseButton::Left), 0.0, 0.0);
        env.pointers.apply(&down);
        listener.handle_event(&mut env, &down);

        let ended: Vec<bool> = (0..repeats).map(|_| listener.interrupt(&mut env)).collect();
        prop_assert_eq!(ends.get(), 1);
        prop_assert!(ended[0]);
        prop_assert!(ended[1..].iter().all(|e| !e));
        prop_assert!(!env.pointers.is_dragging(POINTER));
    }

    #[test]
    fn hotkey_interrupts_release_once(repeats in 1usize..8) {
        let releases = Rc::new(Cell::new(0u32));
        let r = Rc::clone(&releases);
        let hotkey = Hotkey::new("ctrl+k")
            .expect("valid descriptor")
            .on_release(move |_| r.set(r.get() + 1));
        let mut manager = HotkeyManager::new();
        let mut keys = PressedKeySet::new();
        let id = manager.register(hotkey);

        send_keys(&mut manager, &mut keys, KeyboardEvent::press(Key::Ctrl));
        send_keys(&mut manager, &mut keys, KeyboardEvent::press(Key::Char('k')));
        prop_assert!(manager.is_active(id));

        for _ in 0..repeats {
            manager.interrupt(id);
        }
        send_keys(&mut manager, &mut keys, KeyboardEvent::release(Key::Char('k')));
        prop_assert_eq!(releases.get(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Modifier blocking
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn plain_and_shifted_hotkeys_are_exclusive(held in modifier_subset()) {
        let plain = Rc::new(Cell::new(0u32));
        let shifted = Rc::new(Cell::new(0u32));
        let mut manager = HotkeyManager::new();
        let mut keys = PressedKeySet::new();
        manager.register(counted("y", &plain));
        manager.register(counted("shift+y", &shifted));

        for key in &held {
            send_keys(&mut manager, &mut keys, KeyboardEvent::press(*key));
        }
        send_keys(&mut manager, &mut keys, KeyboardEvent::press(Key::Char('y')));

        prop_assert!(plain.get() + shifted.get() <= 1);
        prop_assert_eq!(plain.get(), u32::from(held.is_empty()));
        prop_assert_eq!(shifted.get(), u32::from(held == [Key::Shift]));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Ignorable modifier wildcard
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wildcard_shift_fires_either_way(shift in any::<bool>(), presses in 1usize..5) {
        let fires = Rc::new(Cell::new(0u32));
        let mut manager = HotkeyManager::new();
        let mut keys = PressedKeySet::new();
        manager.register(counted("shift?+arrowLeft", &fires));

        if shift {
            send_keys(&mut manager, &mut keys, KeyboardEvent::press(Key::Shift));
            prop_assert_eq!(fires.get(), 0, "shift alone must not fire");
        }
        for _ in 0..presses {
            send_keys(&mut manager, &mut keys, KeyboardEvent::press(Key::ArrowLeft));
            send_keys(&mut manager, &mut keys, KeyboardEvent::release(Key::ArrowLeft));
        }
        prop_assert_eq!(fires.get(), u32::try_from(presses).unwrap());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Timers are frame-slicing independent
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn discrete_fires_match_closed_form(
        delay in 0u64..1000,
        interval in 1u64..500,
        frames in durations(300, 50),
    ) {
        let mut timer = DiscreteTimer::new(
            Duration::from_millis(delay),
            Duration::from_millis(interval),
        );
        timer.start();
        let fired: u64 = frames
            .iter()
            .map(|&ms| u64::from(timer.advance(Duration::from_millis(ms))))
            .sum();

        let total: u64 = frames.iter().sum();
        let expected = if total < delay { 0 } else { 1 + (total - delay) / interval };
        prop_assert_eq!(fired, expected);
        prop_assert!(timer.until_next() > Duration::ZERO || total < delay);
    }

    #[test]
    fn stopped_discrete_timer_never_fires(
        frames in durations(1000, 20),
    ) {
        let mut timer = DiscreteTimer::new(Duration::ZERO, Duration::from_millis(10));
        timer.start();
        prop_assert!(!timer.stop(false));
        for ms in frames {
            prop_assert_eq!(timer.advance(Duration::from_millis(ms)), 0);
        }
    }

    #[test]
    fn continuous_elapsed_is_sum_of_frames(frames in durations(100, 50)) {
        let mut timer = ContinuousTimer::new();
        timer.start();
        let mut yielded = Duration::ZERO;
        for &ms in &frames {
            if let Some(dt) = timer.advance(Duration::from_millis(ms)) {
                yielded += dt;
            }
        }
        let total = Duration::from_millis(frames.iter().sum());
        prop_assert_eq!(yielded, total);
        prop_assert_eq!(timer.elapsed(), total);
    }
}
