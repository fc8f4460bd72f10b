#![forbid(unsafe_code)]

//! Gesture-driven transitions.
//!
//! An [`InteractiveAnimator`] lays out the same slide as
//! [`SlideAnimator`](crate::slide::SlideAnimator) but parks its tween paused
//! and hands control to an [`InteractionController`] attached to the
//! destination screen. Pan input scrubs the tween; release decides the
//! direction and the tween runs out to its natural end.
//!
//! # State Machine
//!
//! ```text
//!            Began            Ended (forward)
//!   Idle ──────────▶ Tracking ───────────────▶ Resolved ──tick──▶ End
//!                      │  ▲                       ▲
//!               Changed└──┘   Ended (back) ───────┤
//!                             Cancelled ──────────┘       ──tick──▶ Start
//! ```
//!
//! # Invariants
//!
//! 1. The tween never advances on ticks before the gesture resolves.
//! 2. Progress is the pan translation projected on the slide axis, divided
//!    by the surface extent, clamped to [0, 1].
//! 3. A cancelled gesture always reverses.
//! 4. After resolution the controller ignores further input and is detached
//!    from the surface.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::animation::Tween;
use crate::animator::Animator;
use crate::event::EventPosition;
use crate::geometry::{Axis, Offset};
use crate::screen::ScreenId;
use crate::slide::{SlideDirection, SlideGeometry, start_slide_tween};
use crate::surface::{ContainerSurface, PanTarget};
use crate::transition::Transition;

/// Phase of a pan gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One pan gesture update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    pub phase: PanPhase,
    /// Displacement since the gesture began, in cells.
    pub translation: Offset,
    /// Current velocity in cells per second.
    pub velocity: Offset,
}

impl PanEvent {
    #[must_use]
    pub const fn new(phase: PanPhase, translation: Offset, velocity: Offset) -> Self {
        Self {
            phase,
            translation,
            velocity,
        }
    }
}

/// Maps pan input onto a paused transition tween.
pub struct InteractionController {
    tween: Tween,
    surface: ContainerSurface,
    attached_to: ScreenId,
    axis: Axis,
    sign: f64,
    completion_threshold: f64,
    velocity_threshold: f64,
    resolved: Cell<Option<bool>>,
}

impl InteractionController {
    fn new(transition: &Transition, tween: Tween, direction: SlideDirection) -> Self {
        let context = transition.context();
        let config = context.config();
        Self {
            tween,
            surface: context.surface().clone(),
            attached_to: context.to().id(),
            axis: direction.axis(),
            sign: direction.sign(),
            completion_threshold: config.completion_threshold,
            velocity_threshold: config.velocity_threshold,
            resolved: Cell::new(None),
        }
    }

    /// Transition fraction for a cumulative pan translation.
    #[must_use]
    pub fn fraction_for(&self, translation: Offset) -> f64 {
        let extent = self.surface.bounds().extent(self.axis);
        if extent <= 0.0 {
            return 0.0;
        }
        let along = -self.sign * translation.component(self.axis);
        (along / extent).clamp(0.0, 1.0)
    }

    /// Whether a release at `fraction` with `velocity` should run forward.
    #[must_use]
    pub fn should_complete(&self, fraction: f64, velocity: Offset) -> bool {
        let v = -self.sign * velocity.component(self.axis);
        v > self.velocity_threshold
            || (v >= -self.velocity_threshold && fraction >= self.completion_threshold)
    }

    /// `Some(true)` once resolved forward, `Some(false)` once reversed.
    #[must_use]
    pub fn resolution(&self) -> Option<bool> {
        self.resolved.get()
    }

    /// The tween being scrubbed.
    #[must_use]
    pub fn tween(&self) -> &Tween {
        &self.tween
    }

    fn resolve(&self, forward: bool) {
        self.resolved.set(Some(forward));
        self.tween.set_reversed(!forward);
        self.tween.resume();
        self.surface.detach_gesture(self.attached_to);
        debug!(
            target: "ftui.nav",
            forward,
            fraction = self.tween.fraction(),
            "interactive transition resolved"
        );
    }
}

impl PanTarget for InteractionController {
    fn handle_pan(&self, event: &PanEvent) {
        if self.resolved.get().is_some() {
            return;
        }
        match event.phase {
            PanPhase::Began => self.tween.pause(),
            PanPhase::Changed => self.tween.set_fraction(self.fraction_for(event.translation)),
            PanPhase::Ended => {
                let fraction = self.fraction_for(event.translation);
                self.tween.set_fraction(fraction);
                self.resolve(self.should_complete(fraction, event.velocity));
            }
            PanPhase::Cancelled => self.resolve(false),
        }
    }
}

impl fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionController")
            .field("attached_to", &self.attached_to)
            .field("axis", &self.axis)
            .field("fraction", &self.tween.fraction())
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// Default animator for [`TransitionOption::Interactive`](crate::TransitionOption::Interactive).
///
/// The gesture attaches to the destination screen: the pushed screen on
/// push, the revealed screen on pop.
pub struct InteractiveAnimator {
    transition: Transition,
    direction: SlideDirection,
    controller: RefCell<Option<Rc<InteractionController>>>,
}

impl InteractiveAnimator {
    #[must_use]
    pub fn new(transition: Transition, direction: SlideDirection) -> Self {
        Self {
            transition,
            direction,
            controller: RefCell::new(None),
        }
    }

    /// The controller, once `animate` has attached it.
    #[must_use]
    pub fn controller(&self) -> Option<Rc<InteractionController>> {
        self.controller.borrow().clone()
    }
}

impl Animator for InteractiveAnimator {
    fn transition(&self) -> &Transition {
        &self.transition
    }

    fn animate(&self) {
        let context = self.transition.context();
        if context.is_degenerate() {
            self.transition.complete(EventPosition::End);
            return;
        }

        let surface = context.surface();
        let geometry = SlideGeometry::new(context, self.direction);
        geometry.mount(surface);

        if !context.is_animated() {
            geometry.apply(surface, 1.0);
            geometry.settle(surface, EventPosition::End);
            self.transition.complete(EventPosition::End);
            return;
        }

        geometry.apply(surface, 0.0);
        let tween = start_slide_tween(&self.transition, geometry);
        tween.pause();

        let controller = Rc::new(InteractionController::new(
            &self.transition,
            tween,
            self.direction,
        ));
        surface.attach_gesture(context.to().id(), Rc::clone(&controller) as Rc<dyn PanTarget>);
        *self.controller.borrow_mut() = Some(controller);
        debug!(
            target: "ftui.nav",
            screen = %context.to().id(),
            "interactive transition waiting for gesture"
        );
    }
}

impl fmt::Debug for InteractiveAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveAnimator")
            .field("transition", &self.transition)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Easing;
    use crate::option::TransitionOption;
    use crate::transition::{TransitionKind, detached_transition};
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn pan(phase: PanPhase, dx: f64, vx: f64) -> PanEvent {
        PanEvent::new(phase, Offset::new(dx, 0.0), Offset::new(vx, 0.0))
    }

    fn started(kind: TransitionKind, direction: SlideDirection) -> (Transition, InteractiveAnimator) {
        let t = detached_transition(kind, TransitionOption::Interactive);
        let animator = InteractiveAnimator::new(t.clone(), direction);
        animator.animate();
        (t, animator)
    }

    #[test]
    fn tween_waits_for_gesture() {
        let (t, animator) = started(TransitionKind::Push, SlideDirection::Left);
        t.context().animations().tick(Duration::from_secs(5));
        assert!(!t.is_completed());
        let controller = animator.controller().expect("controller attached");
        assert!(controller.tween().is_paused());
        assert!(t.context().surface().has_gesture(t.context().to().id()));
    }

    #[test]
    fn fraction_projects_on_slide_axis() {
        let (_t, animator) = started(TransitionKind::Push, SlideDirection::Left);
        let c = animator.controller().expect("controller");
        assert!((c.fraction_for(Offset::new(-40.0, 9.0)) - 0.5).abs() < EPS);
        assert_eq!(c.fraction_for(Offset::new(40.0, 0.0)), 0.0);
        assert_eq!(c.fraction_for(Offset::new(-400.0, 0.0)), 1.0);

        let (_t, animator) = started(TransitionKind::Pop, SlideDirection::Right);
        let c = animator.controller().expect("controller");
        assert!((c.fraction_for(Offset::new(20.0, 0.0)) - 0.25).abs() < EPS);
    }

    #[test]
    fn release_rules() {
        let (_t, animator) = started(TransitionKind::Push, SlideDirection::Left);
        let c = animator.controller().expect("controller");
        let v = |vx: f64| Offset::new(vx, 0.0);
        assert!(c.should_complete(0.6, v(0.0)));
        assert!(!c.should_complete(0.4, v(0.0)));
        assert!(c.should_complete(0.1, v(-50.0)), "fast fling forward");
        assert!(!c.should_complete(0.9, v(50.0)), "fast fling back");
        assert!(c.should_complete(0.5, v(40.0)), "at the velocity bound");
    }

    #[test]
    fn release_past_threshold_completes_forward() {
        let (t, _animator) = started(TransitionKind::Push, SlideDirection::Left);
        let to = t.context().to().id();
        let surface = t.context().surface().clone();
        assert!(surface.dispatch_pan(to, &pan(PanPhase::Began, 0.0, 0.0)));
        surface.dispatch_pan(to, &pan(PanPhase::Changed, -50.0, -5.0));
        let expected = 80.0 * (1.0 - Easing::EaseIn.apply(0.625));
        assert!((surface.offset(to).expect("mounted").dx - expected).abs() < EPS);
        surface.dispatch_pan(to, &pan(PanPhase::Ended, -50.0, -5.0));
        assert!(!surface.has_gesture(to));

        let settled = Rc::new(Cell::new(None));
        let s = Rc::clone(&settled);
        t.set_completion(Box::new(move |pos| s.set(Some(pos))));
        t.context().animations().tick(Duration::from_secs(1));
        assert_eq!(settled.get(), Some(EventPosition::End));
        assert!(!surface.is_mounted(t.context().from().id()));
    }

    #[test]
    fn cancel_reverses_to_start() {
        let (t, _animator) = started(TransitionKind::Push, SlideDirection::Left);
        let to = t.context().to().id();
        let from = t.context().from().id();
        let surface = t.context().surface().clone();
        surface.dispatch_pan(to, &pan(PanPhase::Changed, -70.0, 0.0));
        surface.dispatch_pan(to, &pan(PanPhase::Cancelled, -70.0, 0.0));

        let settled = Rc::new(Cell::new(None));
        let s = Rc::clone(&settled);
        t.set_completion(Box::new(move |pos| s.set(Some(pos))));
        t.context().animations().tick(Duration::from_secs(1));
        assert_eq!(settled.get(), Some(EventPosition::Start));
        assert!(!surface.is_mounted(to));
        assert_eq!(surface.offset(from), Some(Offset::ZERO));
    }

    #[test]
    fn input_after_resolution_is_ignored() {
        let (t, animator) = started(TransitionKind::Pop, SlideDirection::Right);
        let c = animator.controller().expect("controller");
        c.handle_pan(&pan(PanPhase::Ended, 10.0, 0.0));
        assert_eq!(c.resolution(), Some(false));
        let before = c.tween().fraction();
        c.handle_pan(&pan(PanPhase::Changed, 80.0, 0.0));
        assert_eq!(c.tween().fraction(), before);
        assert!(!t.is_completed());
    }
}
