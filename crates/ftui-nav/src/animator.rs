#![forbid(unsafe_code)]

//! The pluggable visual-behavior contract for transitions.
//!
//! The container never depends on a concrete animator. For every transition
//! it asks exactly one provider for an [`Animator`]: the per-call factory if
//! one was passed, otherwise the container's [`NavigationDelegate`]. When the
//! provider returns `None`, [`default_animator`] picks a built-in one from the
//! transition's option.
//!
//! # Contract
//!
//! [`Animator::animate`] must, on every path, eventually call
//! [`Transition::complete`] exactly once. An animator that never completes
//! holds the serial queue slot and stalls every later transition.

use std::rc::{Rc, Weak};

use crate::event::EventPosition;
use crate::interactive::InteractiveAnimator;
use crate::option::TransitionOption;
use crate::queue::TransitionOperation;
use crate::slide::{ImmediateAnimator, SlideAnimator, SlideDirection};
use crate::transition::{Transition, TransitionKind};

/// Strategy that performs the visual part of one transition.
pub trait Animator {
    /// The transition this animator is bound to.
    fn transition(&self) -> &Transition;

    /// Run the transition. Must eventually complete the transition.
    fn animate(&self);

    /// Called after the container has processed completion. `completed` is
    /// false when the transition was reversed.
    fn transition_did_complete(&self, _completed: bool) {}
}

/// Container-wide animator provider.
///
/// The container holds its delegate weakly; the caller keeps it alive.
pub trait NavigationDelegate {
    /// Animator for `transition`, or `None` for the built-in default.
    fn animator_for(&self, transition: &Transition) -> Option<Rc<dyn Animator>>;
}

/// Per-call animator provider accepted by the `*_with` container methods.
pub type AnimatorFactory<'a> = &'a dyn Fn(&Transition) -> Option<Rc<dyn Animator>>;

/// The built-in animator for a transition's option.
///
/// Pushes slide left, pops slide right.
pub fn default_animator(transition: &Transition) -> Rc<dyn Animator> {
    let context = transition.context();
    let direction = match context.kind() {
        TransitionKind::Push => SlideDirection::Left,
        TransitionKind::Pop => SlideDirection::Right,
    };
    match context.option() {
        TransitionOption::Interactive => {
            Rc::new(InteractiveAnimator::new(transition.clone(), direction))
        }
        TransitionOption::Immediate => Rc::new(ImmediateAnimator::new(transition.clone())),
        TransitionOption::Animated => Rc::new(SlideAnimator::new(transition.clone(), direction)),
    }
}

/// Install the container's completion on `animator`'s transition.
///
/// `on_settle` runs first with `true` for `End` and `false` for a reversed
/// transition; the container releases claims either way and runs its deferred
/// stack work only on `End`. Then the
/// animator hears about the outcome and the queue unit, if any, finishes.
/// Only weak references are kept, so a dropped animator or unit is skipped.
pub(crate) fn attach_completion(
    animator: &Rc<dyn Animator>,
    operation: Option<&Rc<TransitionOperation>>,
    on_settle: Box<dyn FnOnce(bool)>,
) {
    let weak_animator: Weak<dyn Animator> = Rc::downgrade(animator);
    let weak_operation = operation.map(Rc::downgrade);
    animator
        .transition()
        .set_completion(Box::new(move |position| {
            let completed = position == EventPosition::End;
            on_settle(completed);
            if let Some(animator) = weak_animator.upgrade() {
                animator.transition_did_complete(completed);
            }
            if let Some(operation) = weak_operation.and_then(|w| w.upgrade()) {
                operation.finish();
            }
        }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::detached_transition;
    use std::cell::Cell;

    struct Recording {
        transition: Transition,
        outcome: Cell<Option<bool>>,
    }

    impl Animator for Recording {
        fn transition(&self) -> &Transition {
            &self.transition
        }

        fn animate(&self) {
            self.transition.complete(EventPosition::Start);
        }

        fn transition_did_complete(&self, completed: bool) {
            self.outcome.set(Some(completed));
        }
    }

    #[test]
    fn reversed_completion_reports_false() {
        let recording = Rc::new(Recording {
            transition: detached_transition(TransitionKind::Push, TransitionOption::Interactive),
            outcome: Cell::new(None),
        });
        let animator: Rc<dyn Animator> = Rc::clone(&recording) as Rc<dyn Animator>;
        let settled = Rc::new(Cell::new(None));
        let s = Rc::clone(&settled);
        attach_completion(&animator, None, Box::new(move |completed| s.set(Some(completed))));

        animator.animate();
        assert_eq!(settled.get(), Some(false));
        assert_eq!(recording.outcome.get(), Some(false));
    }

    #[test]
    fn default_animator_follows_option() {
        let immediate = detached_transition(TransitionKind::Pop, TransitionOption::Immediate);
        let animator = default_animator(&immediate);
        animator.animate();
        assert!(immediate.is_completed(), "immediate animator completes synchronously");

        let animated = detached_transition(TransitionKind::Push, TransitionOption::Animated);
        let animator = default_animator(&animated);
        animator.animate();
        assert!(!animated.is_completed(), "slide waits for ticks");
    }
}
