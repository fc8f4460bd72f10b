#![forbid(unsafe_code)]

//! One in-flight change from a visible screen to another.
//!
//! A [`TransitionContext`] is fixed at creation: endpoints, kind, request
//! option, the containing surface, and the animation clock. A [`Transition`]
//! wraps the context with its completion plumbing and is shared between the
//! container, the chosen animator, and whatever animation callbacks the
//! animator schedules.
//!
//! # Invariants
//!
//! 1. [`Transition::complete`] has effect once. A second call is an animator
//!    bug: it fails a debug assertion and is logged and ignored in release.
//! 2. The orchestrator's completion slot and the alongside slot are each
//!    written at most once; a second write panics.
//! 3. On completion the alongside completion runs before the orchestrator's
//!    bookkeeping.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::error;

use crate::animation::{AnimationDriver, Easing};
use crate::config::NavigationConfig;
use crate::container::{ContainerInner, NavigationContainer};
use crate::event::EventPosition;
use crate::option::TransitionOption;
use crate::screen::ScreenHandle;
use crate::surface::ContainerSurface;

/// Visual direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Moving deeper: the destination was not on the stack.
    Push,
    /// Moving back: the destination was already on the stack.
    Pop,
}

impl TransitionKind {
    /// Short lowercase label used in logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pop => "pop",
        }
    }
}

/// Selects one endpoint of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    From,
    To,
}

/// Immutable description of a transition's endpoints and environment.
#[derive(Clone)]
pub struct TransitionContext {
    kind: TransitionKind,
    from: ScreenHandle,
    to: ScreenHandle,
    option: TransitionOption,
    surface: ContainerSurface,
    animations: AnimationDriver,
    config: Rc<NavigationConfig>,
}

impl TransitionContext {
    pub(crate) fn new(
        kind: TransitionKind,
        from: ScreenHandle,
        to: ScreenHandle,
        option: TransitionOption,
        surface: ContainerSurface,
        animations: AnimationDriver,
        config: Rc<NavigationConfig>,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            option,
            surface,
            animations,
            config,
        }
    }

    #[inline]
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// The screen visible when the transition starts.
    #[inline]
    pub fn from(&self) -> &ScreenHandle {
        &self.from
    }

    /// The screen visible when the transition ends.
    #[inline]
    pub fn to(&self) -> &ScreenHandle {
        &self.to
    }

    /// Endpoint lookup by key.
    pub fn screen(&self, endpoint: Endpoint) -> &ScreenHandle {
        match endpoint {
            Endpoint::From => &self.from,
            Endpoint::To => &self.to,
        }
    }

    #[inline]
    pub fn option(&self) -> TransitionOption {
        self.option
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.option.is_animated()
    }

    #[inline]
    pub fn is_interactive(&self) -> bool {
        self.option.is_interactive()
    }

    /// Whether both endpoints are the same screen.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }

    /// The surface screens are mounted on.
    #[inline]
    pub fn surface(&self) -> &ContainerSurface {
        &self.surface
    }

    /// The container's animation clock.
    #[inline]
    pub fn animations(&self) -> &AnimationDriver {
        &self.animations
    }

    /// The container's navigation config.
    #[inline]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Configured transition duration.
    pub fn duration(&self) -> Duration {
        self.config.transition_duration()
    }

    /// Configured easing curve.
    pub fn easing(&self) -> Easing {
        self.config.easing
    }
}

impl fmt::Debug for TransitionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionContext")
            .field("kind", &self.kind)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("option", &self.option)
            .finish_non_exhaustive()
    }
}

/// Frame callback run alongside the animator, with eased progress.
pub type AlongsideAnimation = Box<dyn FnMut(&TransitionContext, f64)>;
/// Callback run when the transition settles, before the container's.
pub type AlongsideCompletion = Box<dyn FnOnce(&TransitionContext, EventPosition)>;
pub(crate) type CompletionFn = Box<dyn FnOnce(EventPosition)>;

struct TransitionInner {
    context: TransitionContext,
    container: Weak<ContainerInner>,
    completed: Cell<bool>,
    alongside_set: Cell<bool>,
    alongside_animation: RefCell<Option<AlongsideAnimation>>,
    alongside_completion: RefCell<Option<AlongsideCompletion>>,
    completion: RefCell<Option<CompletionFn>>,
}

/// Shared handle to one in-flight transition.
#[derive(Clone)]
pub struct Transition {
    inner: Rc<TransitionInner>,
}

impl Transition {
    pub(crate) fn new(context: TransitionContext, container: Weak<ContainerInner>) -> Self {
        Self {
            inner: Rc::new(TransitionInner {
                context,
                container,
                completed: Cell::new(false),
                alongside_set: Cell::new(false),
                alongside_animation: RefCell::new(None),
                alongside_completion: RefCell::new(None),
                completion: RefCell::new(None),
            }),
        }
    }

    /// The immutable transition description.
    #[inline]
    pub fn context(&self) -> &TransitionContext {
        &self.inner.context
    }

    /// The container that started this transition, if it is still alive.
    pub fn container(&self) -> Option<NavigationContainer> {
        self.inner
            .container
            .upgrade()
            .map(NavigationContainer::from_inner)
    }

    /// Whether [`complete`](Self::complete) has been called.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.inner.completed.get()
    }

    /// Register work to run alongside the animation and on completion.
    ///
    /// # Panics
    ///
    /// Panics if alongside work was already registered.
    pub fn animate_alongside(
        &self,
        animation: Option<AlongsideAnimation>,
        completion: Option<AlongsideCompletion>,
    ) {
        assert!(
            !self.inner.alongside_set.replace(true),
            "alongside animation already registered for this transition"
        );
        *self.inner.alongside_animation.borrow_mut() = animation;
        *self.inner.alongside_completion.borrow_mut() = completion;
    }

    /// Run the alongside animation for one frame. Animators call this with
    /// the same eased progress they apply to their own layers.
    pub fn drive_alongside(&self, progress: f64) {
        let animation = self.inner.alongside_animation.borrow_mut().take();
        if let Some(mut animation) = animation {
            animation(&self.inner.context, progress);
            let mut slot = self.inner.alongside_animation.borrow_mut();
            if slot.is_none() && !self.inner.completed.get() {
                *slot = Some(animation);
            }
        }
    }

    /// Report that the transition settled at `position`.
    ///
    /// `End` means it ran forward; `Start` means it was reversed and the
    /// stack must stay as it was.
    pub fn complete(&self, position: EventPosition) {
        let already = self.inner.completed.replace(true);
        debug_assert!(!already, "transition completed more than once");
        if already {
            error!(
                target: "ftui.nav",
                kind = self.inner.context.kind.label(),
                ?position,
                "transition completed more than once; ignoring"
            );
            return;
        }
        self.inner.alongside_animation.borrow_mut().take();
        let alongside = self.inner.alongside_completion.borrow_mut().take();
        if let Some(alongside) = alongside {
            alongside(&self.inner.context, position);
        }
        let completion = self.inner.completion.borrow_mut().take();
        if let Some(completion) = completion {
            completion(position);
        }
    }

    /// Install the orchestrator's completion.
    ///
    /// # Panics
    ///
    /// Panics if a completion was already installed.
    pub(crate) fn set_completion(&self, completion: CompletionFn) {
        let mut slot = self.inner.completion.borrow_mut();
        assert!(slot.is_none(), "transition completion already attached");
        *slot = Some(completion);
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("context", &self.inner.context)
            .field("completed", &self.inner.completed.get())
            .finish_non_exhaustive()
    }
}

/// A transition with no owning container, for animator unit tests.
#[cfg(test)]
pub(crate) fn detached_transition(kind: TransitionKind, option: TransitionOption) -> Transition {
    let context = TransitionContext::new(
        kind,
        ScreenHandle::named("from"),
        ScreenHandle::named("to"),
        option,
        ContainerSurface::new(crate::geometry::Rect::from_size(80, 24)),
        AnimationDriver::new(),
        Rc::new(NavigationConfig::default()),
    );
    Transition::new(context, Weak::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_runs_once_with_position() {
        let t = detached_transition(TransitionKind::Push, TransitionOption::Animated);
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);
        t.set_completion(Box::new(move |pos| s.set(Some(pos))));
        t.complete(EventPosition::End);
        assert_eq!(seen.get(), Some(EventPosition::End));
        assert!(t.is_completed());
    }

    #[test]
    #[should_panic(expected = "transition completed more than once")]
    fn double_completion_is_a_bug() {
        let t = detached_transition(TransitionKind::Pop, TransitionOption::Animated);
        t.complete(EventPosition::End);
        t.complete(EventPosition::End);
    }

    #[test]
    #[should_panic(expected = "transition completion already attached")]
    fn completion_slot_is_write_once() {
        let t = detached_transition(TransitionKind::Push, TransitionOption::Immediate);
        t.set_completion(Box::new(|_| {}));
        t.set_completion(Box::new(|_| {}));
    }

    #[test]
    #[should_panic(expected = "alongside animation already registered")]
    fn alongside_slot_is_write_once() {
        let t = detached_transition(TransitionKind::Push, TransitionOption::Animated);
        t.animate_alongside(None, None);
        t.animate_alongside(None, None);
    }

    #[test]
    fn alongside_completion_runs_before_orchestrator() {
        let t = detached_transition(TransitionKind::Push, TransitionOption::Animated);
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        let frames = Rc::new(RefCell::new(Vec::new()));
        let fr = Rc::clone(&frames);
        t.animate_alongside(
            Some(Box::new(move |_, p| fr.borrow_mut().push(p))),
            Some(Box::new(move |_, _| o1.borrow_mut().push("alongside"))),
        );
        t.set_completion(Box::new(move |_| o2.borrow_mut().push("container")));

        t.drive_alongside(0.5);
        t.drive_alongside(1.0);
        t.complete(EventPosition::End);
        t.drive_alongside(0.7);

        assert_eq!(*order.borrow(), vec!["alongside", "container"]);
        assert_eq!(*frames.borrow(), vec![0.5, 1.0], "no frames after completion");
    }

    #[test]
    fn context_accessors() {
        let t = detached_transition(TransitionKind::Pop, TransitionOption::Interactive);
        let ctx = t.context();
        assert_eq!(ctx.kind(), TransitionKind::Pop);
        assert!(ctx.is_animated());
        assert!(ctx.is_interactive());
        assert!(!ctx.is_degenerate());
        assert_eq!(ctx.screen(Endpoint::From), ctx.from());
        assert_eq!(ctx.screen(Endpoint::To), ctx.to());
        assert_eq!(ctx.duration(), Duration::from_millis(300));
        assert!(t.container().is_none());
    }
}
