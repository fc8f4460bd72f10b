#![forbid(unsafe_code)]

//! Rotation gating and serial queue behavior seen from the container.
//!
//! Run:
//!   cargo test -p ftui-nav --test rotation_gating

use std::rc::Rc;
use std::time::Duration;

use ftui_nav::{
    Animator, NavigationConfig, NavigationContainer, OperationState, Rect, ScreenHandle,
    Transition, TransitionOption,
};

const FULL: Duration = Duration::from_millis(300);

fn nav_with_root() -> NavigationContainer {
    let nav =
        NavigationContainer::with_screens(NavigationConfig::default(), [ScreenHandle::named("root")]);
    nav.set_bounds(Rect::from_size(80, 24));
    nav
}

#[test]
fn queued_transition_waits_for_rotation() {
    let nav = nav_with_root();
    nav.push(ScreenHandle::named("b"), TransitionOption::Animated);
    nav.push(ScreenHandle::named("c"), TransitionOption::Animated);
    assert_eq!(nav.pending_transitions(), 1);
    assert!(!nav.can_auto_rotate());

    let rotation = nav.begin_rotation();
    assert_eq!(rotation.state(), OperationState::Executing);

    // The running transition is not interrupted.
    nav.tick(FULL);
    assert!(nav.can_auto_rotate());
    assert_eq!(nav.pending_transitions(), 1, "c is gated on the rotation");

    rotation.finish();
    assert!(rotation.is_finished());
    assert_eq!(nav.pending_transitions(), 0);
    assert!(!nav.can_auto_rotate());

    nav.tick(FULL);
    assert!(!nav.is_transitioning());
}

#[test]
fn transition_enqueued_during_rotation_waits() {
    let nav = nav_with_root();
    let rotation = nav.begin_rotation();

    let b = ScreenHandle::named("b");
    nav.push(b.clone(), TransitionOption::Animated);
    assert_eq!(nav.top(), Some(b), "stack mutates before the animation");
    assert_eq!(nav.pending_transitions(), 1);
    assert!(nav.can_auto_rotate());

    nav.tick(FULL);
    assert_eq!(nav.pending_transitions(), 1);

    rotation.finish();
    assert_eq!(nav.pending_transitions(), 0);
    nav.tick(FULL);
    assert!(!nav.is_transitioning());
}

#[test]
fn immediate_transitions_bypass_the_gate() {
    let nav = nav_with_root();
    let _rotation = nav.begin_rotation();
    nav.push(ScreenHandle::named("b"), TransitionOption::Immediate);
    assert!(!nav.is_transitioning());
    assert_eq!(nav.len(), 2);
}

#[test]
fn every_outstanding_rotation_must_finish() {
    let nav = nav_with_root();
    let first = nav.begin_rotation();
    let second = nav.begin_rotation();
    nav.push(ScreenHandle::named("b"), TransitionOption::Animated);

    first.finish();
    assert_eq!(nav.pending_transitions(), 1);
    second.finish();
    assert_eq!(nav.pending_transitions(), 0);
}

#[test]
fn rotation_with_idle_queue_is_harmless() {
    let nav = nav_with_root();
    let rotation = nav.begin_rotation();
    rotation.finish();
    rotation.finish();
    nav.push(ScreenHandle::named("b"), TransitionOption::Animated);
    assert_eq!(nav.pending_transitions(), 0);
}

/// Never calls `complete`.
struct Stalled {
    transition: Transition,
}

impl Animator for Stalled {
    fn transition(&self) -> &Transition {
        &self.transition
    }

    fn animate(&self) {}
}

#[test]
fn stalled_animator_holds_the_slot() {
    let nav = nav_with_root();
    let stall = |t: &Transition| -> Option<Rc<dyn Animator>> {
        Some(Rc::new(Stalled {
            transition: t.clone(),
        }))
    };
    nav.push_with(ScreenHandle::named("b"), TransitionOption::Animated, &stall);
    nav.push(ScreenHandle::named("c"), TransitionOption::Animated);

    for _ in 0..10 {
        nav.tick(FULL);
    }
    assert_eq!(nav.pending_transitions(), 1);
    assert!(!nav.can_auto_rotate());
    assert_eq!(nav.len(), 3);
}
