#![forbid(unsafe_code)]

//! Gesture-driven transitions through the container: deferred mutation,
//! forward and reversed resolution, queue hand-off, and requests that race
//! an unresolved gesture.
//!
//! Run:
//!   cargo test -p ftui-nav --test interactive_gestures

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use ftui_nav::{
    NavError, NavigationConfig, NavigationContainer, Offset, PanEvent, PanPhase, Rect, Screen,
    ScreenHandle, TransitionOption,
};

const WIDTH: u16 = 80;

fn setup(names: &[&str]) -> (NavigationContainer, Vec<ScreenHandle>, Rc<Cell<u32>>) {
    let screens: Vec<_> = names.iter().map(|n| ScreenHandle::named(*n)).collect();
    let nav = NavigationContainer::with_screens(NavigationConfig::default(), screens.clone());
    nav.set_bounds(Rect::from_size(WIDTH, 24));
    let events = Rc::new(Cell::new(0u32));
    (nav, screens, events)
}

fn count_events(nav: &NavigationContainer, events: &Rc<Cell<u32>>) -> ftui_nav::Subscription {
    let e = Rc::clone(events);
    nav.subscribe(move |_| e.set(e.get() + 1))
}

fn pan(phase: PanPhase, dx: f64, vx: f64) -> PanEvent {
    PanEvent::new(phase, Offset::new(dx, 0.0), Offset::new(vx, 0.0))
}

/// Counts `did_detach` calls.
struct Departures {
    name: String,
    detached: Rc<Cell<u32>>,
}

impl Screen for Departures {
    fn name(&self) -> &str {
        &self.name
    }

    fn did_detach(&self) {
        self.detached.set(self.detached.get() + 1);
    }
}

fn departing(name: &str) -> (ScreenHandle, Rc<Cell<u32>>) {
    let detached = Rc::new(Cell::new(0));
    let screen = ScreenHandle::new(Departures {
        name: name.to_owned(),
        detached: Rc::clone(&detached),
    });
    (screen, detached)
}

fn drag(nav: &NavigationContainer, screen: &ScreenHandle, dx: f64, release_vx: f64) {
    let surface = nav.surface();
    assert!(surface.dispatch_pan(screen.id(), &pan(PanPhase::Began, 0.0, 0.0)));
    surface.dispatch_pan(screen.id(), &pan(PanPhase::Changed, dx / 2.0, 0.0));
    surface.dispatch_pan(screen.id(), &pan(PanPhase::Changed, dx, 0.0));
    surface.dispatch_pan(screen.id(), &pan(PanPhase::Ended, dx, release_vx));
}

#[test]
fn interactive_push_defers_mutation_until_confirmed() {
    let (nav, s, events) = setup(&["a"]);
    let _sub = count_events(&nav, &events);
    let b = ScreenHandle::named("b");

    nav.push(b.clone(), TransitionOption::Interactive);
    assert_eq!(nav.stack(), s, "stack untouched while the gesture runs");
    assert_eq!(events.get(), 0);
    assert!(nav.surface().has_gesture(b.id()), "gesture on the pushed screen");

    // Ticks alone never finish an interactive transition.
    nav.tick(Duration::from_secs(2));
    assert!(nav.is_transitioning());

    drag(&nav, &b, -60.0, 0.0);
    assert!(!nav.surface().has_gesture(b.id()));
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![s[0].clone(), b.clone()]);
    assert_eq!(events.get(), 2);
    assert!(!nav.is_transitioning());
    assert_eq!(nav.surface().front(), Some(b.id()));
    assert!(!nav.surface().is_mounted(s[0].id()));
}

#[test]
fn short_drag_reverses_and_keeps_stack() {
    let (nav, s, events) = setup(&["a"]);
    let _sub = count_events(&nav, &events);
    let b = ScreenHandle::named("b");

    nav.push(b.clone(), TransitionOption::Interactive);
    drag(&nav, &b, -10.0, 0.0);
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), s);
    assert_eq!(events.get(), 0);
    assert!(!nav.is_transitioning());
    assert!(!nav.surface().is_mounted(b.id()));
    assert_eq!(nav.surface().offset(s[0].id()), Some(Offset::ZERO));

    // The same screen can be pushed again after a reversed attempt.
    nav.push(b.clone(), TransitionOption::Immediate);
    assert_eq!(nav.top(), Some(b));
}

#[test]
fn interactive_pop_attaches_to_revealed_screen() {
    let (nav, s, events) = setup(&["a", "b"]);
    let _sub = count_events(&nav, &events);

    let popped = nav.pop(TransitionOption::Interactive);
    assert_eq!(popped, Some(s[1].clone()), "returns the intended result");
    assert_eq!(nav.stack(), s);
    assert!(nav.surface().has_gesture(s[0].id()));

    // A quick flick rightward completes despite the small displacement.
    drag(&nav, &s[0], 8.0, 120.0);
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![s[0].clone()]);
    assert_eq!(events.get(), 2);
    assert_eq!(nav.surface().front(), Some(s[0].id()));
}

#[test]
fn cancelled_pop_restores_top() {
    let (nav, s, events) = setup(&["a", "b"]);
    let _sub = count_events(&nav, &events);

    nav.pop(TransitionOption::Interactive);
    let surface = nav.surface();
    surface.dispatch_pan(s[0].id(), &pan(PanPhase::Began, 0.0, 0.0));
    surface.dispatch_pan(s[0].id(), &pan(PanPhase::Changed, 70.0, 0.0));
    surface.dispatch_pan(s[0].id(), &pan(PanPhase::Cancelled, 70.0, 0.0));
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), s);
    assert_eq!(events.get(), 0);
    assert_eq!(nav.surface().front(), Some(s[1].id()));
    assert!(!nav.surface().is_mounted(s[0].id()));
}

#[test]
fn later_transitions_wait_for_the_gesture() {
    let (nav, _s, _events) = setup(&["a"]);
    let b = ScreenHandle::named("b");
    nav.push(b.clone(), TransitionOption::Interactive);
    nav.push(ScreenHandle::named("c"), TransitionOption::Animated);
    assert_eq!(nav.pending_transitions(), 1);
    assert!(!nav.can_auto_rotate());

    nav.tick(Duration::from_secs(1));
    assert_eq!(nav.pending_transitions(), 1);

    drag(&nav, &b, -70.0, 0.0);
    nav.tick(Duration::from_millis(300));
    assert_eq!(nav.pending_transitions(), 0);
    nav.tick(Duration::from_millis(300));
    assert!(!nav.is_transitioning());
}

#[test]
fn pan_without_target_is_rejected() {
    let (nav, s, _events) = setup(&["a"]);
    assert!(!nav.surface().dispatch_pan(s[0].id(), &pan(PanPhase::Began, 0.0, 0.0)));
}

// =============================================================================
// Requests racing an unresolved gesture
// =============================================================================

#[test]
fn second_pop_of_a_leaving_top_is_ignored() {
    let (nav, s, events) = setup(&["a", "b"]);
    let _sub = count_events(&nav, &events);

    assert_eq!(nav.pop(TransitionOption::Interactive), Some(s[1].clone()));
    assert_eq!(nav.pop(TransitionOption::Interactive), None);
    assert_eq!(nav.pop(TransitionOption::Animated), None);
    assert_eq!(nav.pop_to_root(TransitionOption::Animated), None);
    assert_eq!(nav.pending_transitions(), 0, "nothing queued behind the gesture");

    drag(&nav, &s[0], 60.0, 0.0);
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![s[0].clone()], "root survives");
    assert_eq!(events.get(), 2);
    assert!(!nav.is_transitioning());
}

#[test]
fn confirmed_pop_removes_its_screen_after_a_later_push() {
    let (b, b_detached) = departing("b");
    let (c, c_detached) = departing("c");
    let a = ScreenHandle::named("a");
    let nav = NavigationContainer::with_screens(NavigationConfig::default(), [a.clone(), b.clone()]);
    nav.set_bounds(Rect::from_size(WIDTH, 24));
    let events = Rc::new(Cell::new(0u32));
    let _sub = count_events(&nav, &events);

    assert_eq!(nav.pop(TransitionOption::Interactive), Some(b.clone()));
    nav.push(c.clone(), TransitionOption::Animated);
    assert_eq!(nav.stack(), vec![a.clone(), b.clone(), c.clone()]);

    drag(&nav, &a, 60.0, 0.0);
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![a, c.clone()], "b leaves, c stays on top");
    assert_eq!(b_detached.get(), 1);
    assert_eq!(c_detached.get(), 0);
    assert_eq!(events.get(), 4);

    nav.tick(Duration::from_millis(300));
    assert!(!nav.is_transitioning());
    assert_eq!(nav.top(), Some(c));
}

#[test]
fn pending_push_blocks_a_second_push_of_the_same_screen() {
    let (nav, s, events) = setup(&["a"]);
    let _sub = count_events(&nav, &events);
    let b = ScreenHandle::named("b");
    let duplicate = Err(NavError::DuplicateScreen { screen: b.id() });

    nav.push(b.clone(), TransitionOption::Interactive);
    assert_eq!(nav.try_push(b.clone(), TransitionOption::Interactive), duplicate);
    assert_eq!(nav.try_push(b.clone(), TransitionOption::Immediate), duplicate);
    assert_eq!(
        nav.try_set_screens(vec![s[0].clone(), b.clone()], TransitionOption::Immediate),
        duplicate
    );

    drag(&nav, &b, -60.0, 0.0);
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![s[0].clone(), b.clone()]);
    assert_eq!(events.get(), 2);
    assert!(!nav.is_transitioning());
}

#[test]
#[should_panic(expected = "already contains")]
fn plain_push_of_a_pending_screen_panics() {
    let (nav, _s, _events) = setup(&["a"]);
    let b = ScreenHandle::named("b");
    nav.push(b.clone(), TransitionOption::Interactive);
    nav.push(b, TransitionOption::Animated);
}

#[test]
fn confirmed_pop_is_skipped_when_its_screens_are_gone() {
    let (c, c_detached) = departing("c");
    let a = ScreenHandle::named("a");
    let b = ScreenHandle::named("b");
    let nav = NavigationContainer::with_screens(
        NavigationConfig::default(),
        [a.clone(), b.clone(), c.clone()],
    );
    nav.set_bounds(Rect::from_size(WIDTH, 24));
    let events = Rc::new(Cell::new(0u32));
    let _sub = count_events(&nav, &events);

    assert_eq!(nav.pop(TransitionOption::Interactive), Some(c.clone()));
    nav.set_screens(vec![a.clone()], TransitionOption::Animated);
    assert_eq!(nav.stack(), vec![a.clone()]);

    drag(&nav, &b, 60.0, 0.0);
    nav.tick(Duration::from_millis(300));
    nav.tick(Duration::from_millis(300));

    assert_eq!(nav.stack(), vec![a]);
    assert_eq!(events.get(), 2, "only the set emits");
    assert_eq!(c_detached.get(), 1, "detached once, by the set");
    assert!(!nav.is_transitioning());
}
