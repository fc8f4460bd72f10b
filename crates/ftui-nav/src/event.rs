#![forbid(unsafe_code)]

//! Start/end notifications around every stack mutation.
//!
//! # Design
//!
//! [`EventStream`] is a hot broadcast: listeners registered before an
//! emission receive it, late listeners get nothing replayed. Listeners are
//! held weakly; the strong reference lives in the [`Subscription`] guard
//! returned by [`EventStream::subscribe`], so dropping the guard
//! unsubscribes.
//!
//! # Invariants
//!
//! 1. Every non-degenerate mutation emits exactly two events, `Start` then
//!    `End`, carrying the same [`StackOperation`].
//! 2. During `Start` the container's stack still holds the pre-mutation
//!    screens; during `End` it holds the post-mutation screens.
//! 3. Listeners are notified in registration order.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards stored forever keep callbacks alive. Dead
//!   weak references are pruned lazily on emission.
//! - **Re-entrant mutation**: a listener may call back into the container.
//!   The nested mutation emits its own pair while the outer pair is still
//!   open; listeners that care must tolerate interleaving.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{info_span, trace};
use web_time::Instant;

use crate::container::NavigationContainer;
use crate::operation::StackOperation;

/// Where an event sits relative to its stack mutation.
///
/// Also used as the completion position of a transition: `End` means the
/// transition ran forward, `Start` means it was reversed back to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPosition {
    Start,
    End,
}

/// Snapshot broadcast before and after a stack mutation.
#[derive(Clone)]
pub struct NavEvent {
    operation: StackOperation,
    position: EventPosition,
    container: NavigationContainer,
}

impl NavEvent {
    pub(crate) fn new(
        operation: StackOperation,
        position: EventPosition,
        container: NavigationContainer,
    ) -> Self {
        Self {
            operation,
            position,
            container,
        }
    }

    /// The mutation this event brackets.
    #[inline]
    pub fn operation(&self) -> &StackOperation {
        &self.operation
    }

    /// Whether the mutation is about to happen or has happened.
    #[inline]
    pub fn position(&self) -> EventPosition {
        self.position
    }

    /// The container whose stack is being mutated.
    #[inline]
    pub fn container(&self) -> &NavigationContainer {
        &self.container
    }

    pub(crate) fn advance_to_end(&mut self) {
        debug_assert_eq!(
            self.position,
            EventPosition::Start,
            "event advanced to end twice"
        );
        self.position = EventPosition::End;
    }
}

impl fmt::Debug for NavEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavEvent")
            .field("operation", &self.operation)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

type ListenerRc = Rc<dyn Fn(&NavEvent)>;
type ListenerWeak = Weak<dyn Fn(&NavEvent)>;

#[derive(Default)]
struct StreamInner {
    listeners: Vec<ListenerWeak>,
    emitted: u64,
}

/// Hot, publish-only stream of [`NavEvent`]s.
///
/// Cloning shares the same listener list.
#[derive(Clone, Default)]
pub struct EventStream {
    inner: Rc<RefCell<StreamInner>>,
}

impl EventStream {
    /// Create a stream with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&NavEvent) + 'static) -> Subscription {
        let strong: ListenerRc = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Number of registered listeners, including dead ones not yet pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Total number of events emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.borrow().emitted
    }

    /// Deliver `event` to every live listener.
    pub(crate) fn emit(&self, event: &NavEvent) {
        // Collect live callbacks first so listeners may subscribe or emit.
        let listeners: Vec<ListenerRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.emitted += 1;
            inner.listeners.retain(|w| w.strong_count() > 0);
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };

        let start = Instant::now();
        let _span = info_span!(
            target: "ftui.nav",
            "nav.event",
            kind = event.operation().kind().label(),
            position = ?event.position(),
            listeners = listeners.len() as u64,
            duration_us = tracing::field::Empty
        )
        .entered();

        for listener in &listeners {
            listener(event);
        }

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        trace!(target: "ftui.nav", duration_us, "event delivered");
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventStream")
            .field("listeners", &inner.listeners.len())
            .field("emitted", &inner.emitted)
            .finish()
    }
}

/// RAII guard for an event listener.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
