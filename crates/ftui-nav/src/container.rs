#![forbid(unsafe_code)]

//! The navigation stack orchestrator.
//!
//! [`NavigationContainer`] owns the screen stack, the container surface, the
//! serial transition queue, and the event stream. Every mutation goes through
//! the same pipeline:
//!
//! ```text
//!   request ──▶ precondition checks ──▶ build Transition ──▶ pick Animator
//!                                                                │
//!            ┌── non-interactive: events + mutate now ◀──────────┤
//!            │                                                   ▼
//!            │                           animated? ──yes──▶ TransitionQueue (serial)
//!            │                               │no                 │
//!            │                               ▼                   ▼
//!            │                          animate() now       animate() when slot frees
//!            │                                   \             /
//!            └── interactive: re-check, events + mutate ◀── complete(End)
//! ```
//!
//! # Invariants
//!
//! 1. The stack never holds the same screen twice.
//! 2. At most one animated transition runs at a time.
//! 3. Every non-degenerate mutation emits a `Start`/`End` event pair; the
//!    stack is pre-mutation during `Start` and post-mutation during `End`.
//! 4. Non-interactive requests mutate the stack before their animation
//!    starts. Interactive requests mutate only when the gesture confirms;
//!    a reversed gesture leaves the stack untouched.
//! 5. Screens kept across a `set` get no lifecycle hooks.
//! 6. Until its gesture resolves, an interactive transition claims the
//!    screens it will attach or detach. A claimed arrival cannot be pushed
//!    or set again; a claimed departure cannot be popped again.
//! 7. Deferred removals go by screen identity, never by position. A
//!    deferred mutation whose screens no longer match the stack is skipped
//!    with a warning: no events, no hooks.
//!
//! # Failure Modes
//!
//! - Pushing a duplicate, popping to an absent screen, or installing an empty
//!   stack is caller misuse: the plain methods panic, the `try_` methods
//!   return [`NavError`].
//! - Popping the root, or popping to root on an empty stack, is a no-op
//!   returning `None`. So is popping a screen that an unresolved interactive
//!   pop is already removing.
//! - An animator that never completes stalls every later animated
//!   transition (see [`Animator`]).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, debug_span, warn};

use crate::animation::AnimationDriver;
use crate::animator::{Animator, AnimatorFactory, NavigationDelegate, attach_completion, default_animator};
use crate::config::NavigationConfig;
use crate::error::NavError;
use crate::event::{EventPosition, EventStream, NavEvent, Subscription};
use crate::geometry::Rect;
use crate::operation::{OperationKind, StackOperation};
use crate::option::TransitionOption;
use crate::queue::{RotationOperation, RotationQueue, TransitionOperation, TransitionQueue};
use crate::screen::{ScreenHandle, ScreenId};
use crate::surface::ContainerSurface;
use crate::transition::{Transition, TransitionContext, TransitionKind};

type Deferred = Box<dyn FnOnce()>;

/// Emits the events and applies a stack change, returning the did-hooks to
/// run on completion. `None` when the change no longer applies.
type Mutation = Box<dyn FnOnce() -> Option<Deferred>>;

/// Screens held by unresolved interactive transitions, counted per id.
#[derive(Debug, Default)]
struct Claims(AHashMap<ScreenId, u32>);

impl Claims {
    fn contains(&self, id: ScreenId) -> bool {
        self.0.contains_key(&id)
    }

    fn claim(&mut self, ids: &[ScreenId]) {
        for id in ids {
            *self.0.entry(*id).or_default() += 1;
        }
    }

    fn release(&mut self, ids: &[ScreenId]) {
        for id in ids {
            if let Some(count) = self.0.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    self.0.remove(id);
                }
            }
        }
    }
}

#[derive(Default)]
struct Reservation {
    attach: Vec<ScreenId>,
    detach: Vec<ScreenId>,
}

pub(crate) struct ContainerInner {
    stack: RefCell<Vec<ScreenHandle>>,
    attaching: RefCell<Claims>,
    detaching: RefCell<Claims>,
    surface: ContainerSurface,
    events: EventStream,
    transitions: TransitionQueue,
    rotations: RotationQueue,
    animations: AnimationDriver,
    config: Rc<NavigationConfig>,
    delegate: RefCell<Option<Weak<dyn NavigationDelegate>>>,
}

/// Shared handle to a navigation stack.
///
/// Cloning is cheap and every clone drives the same container.
#[derive(Clone)]
pub struct NavigationContainer {
    inner: Rc<ContainerInner>,
}

impl NavigationContainer {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an empty container with zero-sized bounds.
    #[must_use]
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                stack: RefCell::new(Vec::new()),
                attaching: RefCell::new(Claims::default()),
                detaching: RefCell::new(Claims::default()),
                surface: ContainerSurface::new(Rect::default()),
                events: EventStream::new(),
                transitions: TransitionQueue::serial(),
                rotations: RotationQueue::default(),
                animations: AnimationDriver::new(),
                config: Rc::new(config),
                delegate: RefCell::new(None),
            }),
        }
    }

    /// Create a container and install `screens` as its initial stack.
    ///
    /// # Panics
    ///
    /// Panics if `screens` is empty or holds a screen twice.
    #[track_caller]
    #[must_use]
    pub fn with_screens(
        config: NavigationConfig,
        screens: impl IntoIterator<Item = ScreenHandle>,
    ) -> Self {
        match Self::try_with_screens(config, screens) {
            Ok(container) => container,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`with_screens`](Self::with_screens).
    pub fn try_with_screens(
        config: NavigationConfig,
        screens: impl IntoIterator<Item = ScreenHandle>,
    ) -> Result<Self, NavError> {
        let container = Self::new(config);
        container.install(screens.into_iter().collect())?;
        Ok(container)
    }

    pub(crate) fn from_inner(inner: Rc<ContainerInner>) -> Self {
        Self { inner }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Screens root to top.
    #[must_use]
    pub fn stack(&self) -> Vec<ScreenHandle> {
        self.inner.stack.borrow().clone()
    }

    #[must_use]
    pub fn root(&self) -> Option<ScreenHandle> {
        self.inner.stack.borrow().first().cloned()
    }

    #[must_use]
    pub fn top(&self) -> Option<ScreenHandle> {
        self.inner.stack.borrow().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.stack.borrow().is_empty()
    }

    /// Whether `screen` is on the stack.
    #[must_use]
    pub fn contains(&self, screen: &ScreenHandle) -> bool {
        self.inner.stack.borrow().contains(screen)
    }

    /// The surface screens are mounted on.
    #[must_use]
    pub fn surface(&self) -> &ContainerSurface {
        &self.inner.surface
    }

    /// Resize the surface.
    pub fn set_bounds(&self, bounds: Rect) {
        self.inner.surface.set_bounds(bounds);
    }

    /// The stream of start/end events.
    #[must_use]
    pub fn events(&self) -> &EventStream {
        &self.inner.events
    }

    /// Shorthand for `events().subscribe(listener)`.
    pub fn subscribe(&self, listener: impl Fn(&NavEvent) + 'static) -> Subscription {
        self.inner.events.subscribe(listener)
    }

    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.inner.config
    }

    /// The animation clock shared by this container's animators.
    #[must_use]
    pub fn animations(&self) -> &AnimationDriver {
        &self.inner.animations
    }

    /// Advance running animations by `dt`. Returns how many tweens settled.
    pub fn tick(&self, dt: Duration) -> usize {
        self.inner.animations.tick(dt)
    }

    /// Whether both handles drive the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Delegate
    // ========================================================================

    /// Use `delegate` to provide animators. Held weakly.
    pub fn set_delegate(&self, delegate: &Rc<dyn NavigationDelegate>) {
        *self.inner.delegate.borrow_mut() = Some(Rc::downgrade(delegate));
    }

    pub fn clear_delegate(&self) {
        self.inner.delegate.borrow_mut().take();
    }

    fn delegate(&self) -> Option<Rc<dyn NavigationDelegate>> {
        self.inner.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    // ========================================================================
    // Transition state
    // ========================================================================

    /// Whether a mutation would run a transition rather than install.
    #[must_use]
    pub fn can_animate_transition(&self) -> bool {
        !self.is_empty()
    }

    /// Whether the host may rotate now: false while a transition executes.
    #[must_use]
    pub fn can_auto_rotate(&self) -> bool {
        !self.inner.transitions.has_executing()
    }

    /// Animated transitions waiting for the queue slot.
    #[must_use]
    pub fn pending_transitions(&self) -> usize {
        self.inner.transitions.pending_len()
    }

    /// Whether an animated transition is running or waiting.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.inner.transitions.has_executing() || self.inner.transitions.pending_len() > 0
    }

    /// Announce that the host started rotating.
    ///
    /// Transitions waiting in the queue, and any enqueued before the returned
    /// unit finishes, hold until the host calls [`RotationOperation::finish`].
    pub fn begin_rotation(&self) -> Rc<RotationOperation> {
        let rotation = Rc::new(RotationOperation::new());
        let waiting = self.inner.transitions.pending_operations();
        for operation in &waiting {
            operation.add_dependency(Rc::clone(&rotation));
        }
        self.inner.transitions.pump_after(&rotation);
        self.inner.rotations.add(Rc::clone(&rotation));
        debug!(
            target: "ftui.nav",
            rotation = rotation.id(),
            gated = waiting.len(),
            "rotation began"
        );
        rotation
    }

    // ========================================================================
    // Push
    // ========================================================================

    /// Push `screen`. On an empty stack it becomes the root without a
    /// transition.
    ///
    /// # Panics
    ///
    /// Panics if `screen` is already on the stack.
    #[track_caller]
    pub fn push(&self, screen: ScreenHandle, option: TransitionOption) {
        if let Err(err) = self.push_inner(screen, option, None) {
            panic!("{err}");
        }
    }

    /// Fallible form of [`push`](Self::push).
    pub fn try_push(&self, screen: ScreenHandle, option: TransitionOption) -> Result<(), NavError> {
        self.push_inner(screen, option, None)
    }

    /// [`push`](Self::push) with a per-call animator provider.
    #[track_caller]
    pub fn push_with(
        &self,
        screen: ScreenHandle,
        option: TransitionOption,
        factory: AnimatorFactory<'_>,
    ) {
        if let Err(err) = self.push_inner(screen, option, Some(factory)) {
            panic!("{err}");
        }
    }

    /// Push animated when animations are enabled, immediately otherwise.
    #[track_caller]
    pub fn show(&self, screen: ScreenHandle) {
        let option = if self.inner.config.animations_enabled {
            TransitionOption::Animated
        } else {
            TransitionOption::Immediate
        };
        self.push(screen, option);
    }

    fn push_inner(
        &self,
        screen: ScreenHandle,
        option: TransitionOption,
        factory: Option<AnimatorFactory<'_>>,
    ) -> Result<(), NavError> {
        let Some(from) = self.top() else {
            return self.install(vec![screen]);
        };
        if self.contains(&screen) || self.is_attaching(&screen) {
            return Err(NavError::DuplicateScreen {
                screen: screen.id(),
            });
        }

        let operation = StackOperation::new(OperationKind::Push(screen.clone()), option.is_animated());
        let weak = Rc::downgrade(&self.inner);
        let pushed = screen.clone();
        let mutation: Mutation = Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return None;
            };
            let container = Self::from_inner(inner);
            if container.contains(&pushed) {
                warn!(target: "ftui.nav", screen = %pushed.id(), "push skipped: screen already on the stack");
                return None;
            }
            let appended = pushed.clone();
            container.send_events(operation, move |stack| stack.push(appended));
            pushed.will_attach();
            let finish: Deferred = Box::new(move || pushed.did_attach());
            Some(finish)
        });
        let reservation = Reservation {
            attach: vec![screen.id()],
            detach: Vec::new(),
        };

        self.run_transition(TransitionKind::Push, from, screen, option, factory, reservation, mutation);
        Ok(())
    }

    // ========================================================================
    // Pop
    // ========================================================================

    /// Pop the top screen. Returns it, or `None` when only the root is left or
    /// the top is already leaving through an unresolved interactive pop.
    ///
    /// For interactive pops the returned screen is the intended result; it
    /// leaves the stack only if the gesture confirms.
    pub fn pop(&self, option: TransitionOption) -> Option<ScreenHandle> {
        self.pop_inner(option, None)
    }

    /// [`pop`](Self::pop) with a per-call animator provider.
    pub fn pop_with(
        &self,
        option: TransitionOption,
        factory: AnimatorFactory<'_>,
    ) -> Option<ScreenHandle> {
        self.pop_inner(option, Some(factory))
    }

    fn pop_inner(
        &self,
        option: TransitionOption,
        factory: Option<AnimatorFactory<'_>>,
    ) -> Option<ScreenHandle> {
        let (from, to) = {
            let stack = self.inner.stack.borrow();
            match stack.as_slice() {
                [.., below, top] => (top.clone(), below.clone()),
                _ => {
                    warn!(target: "ftui.nav", depth = stack.len(), "pop ignored: nothing above the root");
                    return None;
                }
            }
        };

        if self.is_detaching(&from) {
            warn!(target: "ftui.nav", screen = %from.id(), "pop ignored: top is already leaving");
            return None;
        }

        let operation = StackOperation::new(OperationKind::Pop(from.clone()), option.is_animated());
        let mutation = self.removal(operation, vec![from.clone()], to.clone());
        let reservation = Reservation {
            attach: Vec::new(),
            detach: vec![from.id()],
        };

        self.run_transition(TransitionKind::Pop, from.clone(), to, option, factory, reservation, mutation);
        Some(from)
    }

    /// Pop every screen above `target`. Returns the dropped screens bottom to
    /// top, or `None` when `target` is already the top or an unresolved
    /// interactive pop is already removing one of them.
    ///
    /// # Panics
    ///
    /// Panics if `target` is not on the stack.
    #[track_caller]
    pub fn pop_to(
        &self,
        target: &ScreenHandle,
        option: TransitionOption,
    ) -> Option<Vec<ScreenHandle>> {
        match self.pop_to_inner(target, option, None) {
            Ok(dropped) => dropped,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`pop_to`](Self::pop_to).
    pub fn try_pop_to(
        &self,
        target: &ScreenHandle,
        option: TransitionOption,
    ) -> Result<Option<Vec<ScreenHandle>>, NavError> {
        self.pop_to_inner(target, option, None)
    }

    /// [`pop_to`](Self::pop_to) with a per-call animator provider.
    #[track_caller]
    pub fn pop_to_with(
        &self,
        target: &ScreenHandle,
        option: TransitionOption,
        factory: AnimatorFactory<'_>,
    ) -> Option<Vec<ScreenHandle>> {
        match self.pop_to_inner(target, option, Some(factory)) {
            Ok(dropped) => dropped,
            Err(err) => panic!("{err}"),
        }
    }

    /// Pop to the root. `None` when the stack is empty or only has a root.
    pub fn pop_to_root(&self, option: TransitionOption) -> Option<Vec<ScreenHandle>> {
        let root = self.root()?;
        match self.pop_to_inner(&root, option, None) {
            Ok(dropped) => dropped,
            Err(err) => {
                debug_assert!(false, "root left its own stack: {err}");
                warn!(target: "ftui.nav", %err, "pop to root failed");
                None
            }
        }
    }

    fn pop_to_inner(
        &self,
        target: &ScreenHandle,
        option: TransitionOption,
        factory: Option<AnimatorFactory<'_>>,
    ) -> Result<Option<Vec<ScreenHandle>>, NavError> {
        let (from, dropped) = {
            let stack = self.inner.stack.borrow();
            let Some(position) = stack.iter().position(|s| s == target) else {
                return Err(NavError::ScreenNotInStack {
                    screen: target.id(),
                });
            };
            let Some(top) = stack.last() else {
                return Err(NavError::ScreenNotInStack {
                    screen: target.id(),
                });
            };
            if top == target {
                return Ok(None);
            }
            (top.clone(), stack[position + 1..].to_vec())
        };

        if let Some(leaving) = dropped.iter().find(|s| self.is_detaching(s)) {
            warn!(
                target: "ftui.nav",
                screen = %leaving.id(),
                "pop ignored: a screen above the target is already leaving"
            );
            return Ok(None);
        }

        let operation = StackOperation::new(OperationKind::Pop(from.clone()), option.is_animated());
        let mutation = self.removal(operation, dropped.clone(), target.clone());
        let reservation = Reservation {
            attach: Vec::new(),
            detach: dropped.iter().map(ScreenHandle::id).collect(),
        };

        self.run_transition(
            TransitionKind::Pop,
            from,
            target.clone(),
            option,
            factory,
            reservation,
            mutation,
        );
        Ok(Some(dropped))
    }

    // ========================================================================
    // Set
    // ========================================================================

    /// Replace the stack with `screens`.
    ///
    /// Screens on both stacks keep their place without lifecycle hooks. The
    /// transition is a pop when the new top was already on the stack, a push
    /// otherwise. An empty `screens` is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `screens` holds a screen twice, or a screen an unresolved
    /// interactive transition is about to attach.
    #[track_caller]
    pub fn set_screens(&self, screens: Vec<ScreenHandle>, option: TransitionOption) {
        if let Err(err) = self.set_inner(screens, option, None) {
            panic!("{err}");
        }
    }

    /// Fallible form of [`set_screens`](Self::set_screens).
    pub fn try_set_screens(
        &self,
        screens: Vec<ScreenHandle>,
        option: TransitionOption,
    ) -> Result<(), NavError> {
        self.set_inner(screens, option, None)
    }

    /// [`set_screens`](Self::set_screens) with a per-call animator provider.
    #[track_caller]
    pub fn set_screens_with(
        &self,
        screens: Vec<ScreenHandle>,
        option: TransitionOption,
        factory: AnimatorFactory<'_>,
    ) {
        if let Err(err) = self.set_inner(screens, option, Some(factory)) {
            panic!("{err}");
        }
    }

    /// Replace the stack without animation.
    #[track_caller]
    pub fn set_stack(&self, screens: Vec<ScreenHandle>) {
        self.set_screens(screens, TransitionOption::Immediate);
    }

    fn set_inner(
        &self,
        screens: Vec<ScreenHandle>,
        option: TransitionOption,
        factory: Option<AnimatorFactory<'_>>,
    ) -> Result<(), NavError> {
        if screens.is_empty() {
            warn!(target: "ftui.nav", "set ignored: new stack is empty");
            return Ok(());
        }
        if let Some(screen) = first_duplicate(&screens) {
            return Err(NavError::DuplicateScreen { screen });
        }
        if let Some(screen) = screens.iter().find(|s| self.is_attaching(s)) {
            return Err(NavError::DuplicateScreen {
                screen: screen.id(),
            });
        }
        let old = self.stack();
        let (Some(from), Some(to)) = (old.last().cloned(), screens.last().cloned()) else {
            return self.install(screens);
        };

        let kind = if old.contains(&to) {
            TransitionKind::Pop
        } else {
            TransitionKind::Push
        };
        let (removed, added) = stack_diff(&old, &screens);
        let reservation = Reservation {
            attach: added.iter().map(ScreenHandle::id).collect(),
            detach: removed.iter().map(ScreenHandle::id).collect(),
        };

        let operation = StackOperation::new(OperationKind::Set(screens.clone()), option.is_animated());
        let weak = Rc::downgrade(&self.inner);
        let mutation: Mutation = Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return None;
            };
            let container = Self::from_inner(inner);
            // Diff against the stack as it is now; an interactive set may
            // have waited behind other changes.
            let (removed, added) = stack_diff(&container.stack(), &screens);
            container.send_events(operation, move |stack| *stack = screens);
            removed.iter().for_each(ScreenHandle::will_detach);
            added.iter().for_each(ScreenHandle::will_attach);
            let finish: Deferred = Box::new(move || {
                removed.iter().for_each(ScreenHandle::did_detach);
                added.iter().for_each(ScreenHandle::did_attach);
            });
            Some(finish)
        });

        self.run_transition(kind, from, to, option, factory, reservation, mutation);
        Ok(())
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Install `screens` directly: no transition, no events.
    fn install(&self, screens: Vec<ScreenHandle>) -> Result<(), NavError> {
        let Some(top) = screens.last().map(ScreenHandle::id) else {
            return Err(NavError::EmptyStack);
        };
        if let Some(screen) = first_duplicate(&screens) {
            return Err(NavError::DuplicateScreen { screen });
        }
        *self.inner.stack.borrow_mut() = screens.clone();
        screens.iter().for_each(ScreenHandle::will_attach);
        self.inner.surface.mount(top);
        screens.iter().for_each(ScreenHandle::did_attach);
        debug!(target: "ftui.nav", depth = screens.len(), %top, "stack installed");
        Ok(())
    }

    fn is_attaching(&self, screen: &ScreenHandle) -> bool {
        self.inner.attaching.borrow().contains(screen.id())
    }

    fn is_detaching(&self, screen: &ScreenHandle) -> bool {
        self.inner.detaching.borrow().contains(screen.id())
    }

    fn claim(&self, reservation: &Reservation) {
        self.inner.attaching.borrow_mut().claim(&reservation.attach);
        self.inner.detaching.borrow_mut().claim(&reservation.detach);
    }

    fn release(&self, reservation: &Reservation) {
        self.inner.attaching.borrow_mut().release(&reservation.attach);
        self.inner.detaching.borrow_mut().release(&reservation.detach);
    }

    /// Remove `leaving` by identity while `keep` stays. Skipped if `keep` or
    /// any of `leaving` is gone by the time it runs.
    fn removal(
        &self,
        operation: StackOperation,
        leaving: Vec<ScreenHandle>,
        keep: ScreenHandle,
    ) -> Mutation {
        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return None;
            };
            let container = Self::from_inner(inner);
            if !container.contains(&keep) || !leaving.iter().all(|s| container.contains(s)) {
                warn!(
                    target: "ftui.nav",
                    keep = %keep.id(),
                    leaving = leaving.len(),
                    "pop skipped: stack changed while the gesture was pending"
                );
                return None;
            }
            let gone: AHashSet<ScreenId> = leaving.iter().map(ScreenHandle::id).collect();
            container.send_events(operation, move |stack| stack.retain(|s| !gone.contains(&s.id())));
            leaving.iter().rev().for_each(ScreenHandle::will_detach);
            let finish: Deferred =
                Box::new(move || leaving.iter().rev().for_each(ScreenHandle::did_detach));
            Some(finish)
        })
    }

    /// Emit `Start`, apply `mutate`, emit `End`.
    fn send_events(&self, operation: StackOperation, mutate: impl FnOnce(&mut Vec<ScreenHandle>)) {
        let mut event = NavEvent::new(operation, EventPosition::Start, self.clone());
        self.inner.events.emit(&event);
        {
            let mut stack = self.inner.stack.borrow_mut();
            mutate(&mut *stack);
        }
        event.advance_to_end();
        self.inner.events.emit(&event);
    }

    fn animator_for(
        &self,
        transition: &Transition,
        factory: Option<AnimatorFactory<'_>>,
    ) -> Rc<dyn Animator> {
        let provided = match factory {
            Some(factory) => factory(transition),
            None => self
                .delegate()
                .and_then(|delegate| delegate.animator_for(transition)),
        };
        provided.unwrap_or_else(|| default_animator(transition))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_transition(
        &self,
        kind: TransitionKind,
        from: ScreenHandle,
        to: ScreenHandle,
        option: TransitionOption,
        factory: Option<AnimatorFactory<'_>>,
        reservation: Reservation,
        mutation: Mutation,
    ) {
        let _span = debug_span!(
            target: "ftui.nav",
            "nav.transition",
            kind = kind.label(),
            option = option.label(),
            from = %from.id(),
            to = %to.id()
        )
        .entered();

        let interactive = option.is_interactive();
        let (deferred, applied) = if interactive {
            self.claim(&reservation);
            (Some(mutation), None)
        } else {
            (None, mutation())
        };
        let weak = Rc::downgrade(&self.inner);
        let on_settle: Box<dyn FnOnce(bool)> = Box::new(move |completed| {
            if interactive && let Some(inner) = weak.upgrade() {
                Self::from_inner(inner).release(&reservation);
            }
            if !completed {
                return;
            }
            let finish = match deferred {
                Some(mutation) => mutation(),
                None => applied,
            };
            if let Some(finish) = finish {
                finish();
            }
        });

        let context = TransitionContext::new(
            kind,
            from,
            to,
            option,
            self.inner.surface.clone(),
            self.inner.animations.clone(),
            Rc::clone(&self.inner.config),
        );
        let transition = Transition::new(context, Rc::downgrade(&self.inner));
        let animator = self.animator_for(&transition, factory);

        if option.is_animated() {
            let operation = Rc::new(TransitionOperation::new(Rc::clone(&animator)));
            attach_completion(&animator, Some(&operation), on_settle);
            for rotation in self.inner.rotations.outstanding() {
                operation.add_dependency(rotation);
            }
            self.inner.transitions.enqueue(operation);
        } else {
            attach_completion(&animator, None, on_settle);
            animator.animate();
        }
    }
}

/// Screens leaving (top first) and arriving (bottom first) when `old` is
/// replaced by `new`.
fn stack_diff(old: &[ScreenHandle], new: &[ScreenHandle]) -> (Vec<ScreenHandle>, Vec<ScreenHandle>) {
    let old_ids: AHashSet<ScreenId> = old.iter().map(ScreenHandle::id).collect();
    let new_ids: AHashSet<ScreenId> = new.iter().map(ScreenHandle::id).collect();
    let removed = old
        .iter()
        .rev()
        .filter(|s| !new_ids.contains(&s.id()))
        .cloned()
        .collect();
    let added = new
        .iter()
        .filter(|s| !old_ids.contains(&s.id()))
        .cloned()
        .collect();
    (removed, added)
}

fn first_duplicate(screens: &[ScreenHandle]) -> Option<ScreenId> {
    let mut seen = AHashSet::with_capacity(screens.len());
    screens
        .iter()
        .map(ScreenHandle::id)
        .find(|id| !seen.insert(*id))
}

impl fmt::Debug for NavigationContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContainer")
            .field("stack", &*self.inner.stack.borrow())
            .field("transitions", &self.inner.transitions)
            .field("rotations", &self.inner.rotations)
            .finish_non_exhaustive()
    }
}
