#![forbid(unsafe_code)]

//! Screens: the opaque units of UI content managed by the navigation stack.
//!
//! A [`Screen`] only has to answer lifecycle notifications; rendering is the
//! host's business. Screens enter the stack wrapped in a [`ScreenHandle`],
//! which pairs the shared screen with a process-unique [`ScreenId`]. Stack
//! identity is handle identity: two handles compare equal only when they were
//! cloned from the same [`ScreenHandle::new`] call.
//!
//! # Lifecycle order
//!
//! For every screen entering the stack the container calls `will_attach`
//! when the stack is mutated and `did_attach` once the transition completes.
//! Leaving screens get `will_detach` / `did_detach` at the same points.
//! Screens that survive a stack replacement receive nothing.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for unique screen IDs.
static SCREEN_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_screen_id() -> ScreenId {
    ScreenId(SCREEN_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Stable identity of a screen on the navigation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(u64);

impl ScreenId {
    /// Build an id from a raw value. Intended for tests and diagnostics.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen#{}", self.0)
    }
}

/// Content that can live on a navigation stack.
///
/// All hooks default to no-ops. Hooks take `&self` because the container and
/// any in-flight transition share the screen; use `Cell`/`RefCell` for state.
pub trait Screen {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "screen"
    }

    /// The screen is about to become a child of the container.
    fn will_attach(&self) {}

    /// The transition that attached the screen has finished.
    fn did_attach(&self) {}

    /// The screen is about to be removed from the container.
    fn will_detach(&self) {}

    /// The transition that removed the screen has finished.
    fn did_detach(&self) {}
}

/// Shared, identity-carrying handle to a [`Screen`].
#[derive(Clone)]
pub struct ScreenHandle {
    id: ScreenId,
    screen: Rc<dyn Screen>,
}

impl ScreenHandle {
    /// Wrap a screen, assigning it a fresh id.
    pub fn new(screen: impl Screen + 'static) -> Self {
        Self::from_rc(Rc::new(screen))
    }

    /// Wrap an already shared screen, assigning it a fresh id.
    ///
    /// Wrapping the same `Rc` twice yields two distinct stack identities.
    pub fn from_rc(screen: Rc<dyn Screen>) -> Self {
        Self {
            id: next_screen_id(),
            screen,
        }
    }

    /// Shorthand for a [`PlainScreen`] with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(PlainScreen::new(name))
    }

    /// The stack identity of this screen.
    #[inline]
    pub fn id(&self) -> ScreenId {
        self.id
    }

    /// The wrapped screen.
    #[inline]
    pub fn screen(&self) -> &Rc<dyn Screen> {
        &self.screen
    }

    /// The screen's log name.
    pub fn name(&self) -> &str {
        self.screen.name()
    }

    pub(crate) fn will_attach(&self) {
        self.screen.will_attach();
    }

    pub(crate) fn did_attach(&self) {
        self.screen.did_attach();
    }

    pub(crate) fn will_detach(&self) {
        self.screen.will_detach();
    }

    pub(crate) fn did_detach(&self) {
        self.screen.did_detach();
    }
}

impl PartialEq for ScreenHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScreenHandle {}

impl std::hash::Hash for ScreenHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ScreenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenHandle")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

/// A screen with a name and no behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainScreen {
    name: String,
}

impl PlainScreen {
    /// Create a named screen.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Screen for PlainScreen {
    fn name(&self) -> &str {
        &self.name
    }
}
