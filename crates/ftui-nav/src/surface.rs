#![forbid(unsafe_code)]

//! The passive surface screens are mounted on while they are visible.
//!
//! The container and its animators mount, unmount, and translate layers; the
//! host reads [`ContainerSurface::layers`] to know what to draw and where.
//! Gesture targets attach per screen: the host routes pan input for a screen
//! through [`ContainerSurface::dispatch_pan`].
//!
//! # Invariants
//!
//! - A screen is mounted at most once; mounting again moves it to the front.
//! - Every layer's frame equals the surface bounds.
//! - At most one gesture target is attached per screen.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::geometry::{Offset, Rect};
use crate::interactive::PanEvent;
use crate::screen::ScreenId;

/// Receiver of pan gesture input for one screen.
pub trait PanTarget {
    /// Handle one pan update.
    fn handle_pan(&self, event: &PanEvent);
}

/// One mounted screen, as the host should render it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub screen: ScreenId,
    pub frame: Rect,
    pub offset: Offset,
}

#[derive(Default)]
struct SurfaceInner {
    bounds: Rect,
    /// Back to front.
    layers: Vec<Layer>,
    gestures: Vec<(ScreenId, Rc<dyn PanTarget>)>,
}

/// Shared handle to the container's drawing surface.
///
/// Cloning shares the same layers.
#[derive(Clone, Default)]
pub struct ContainerSurface {
    inner: Rc<RefCell<SurfaceInner>>,
}

impl ContainerSurface {
    /// Create an empty surface with the given bounds.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SurfaceInner {
                bounds,
                ..SurfaceInner::default()
            })),
        }
    }

    /// Current bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.inner.borrow().bounds
    }

    /// Resize the surface, re-framing every layer.
    pub fn set_bounds(&self, bounds: Rect) {
        let mut inner = self.inner.borrow_mut();
        inner.bounds = bounds;
        for layer in &mut inner.layers {
            layer.frame = bounds;
        }
    }

    /// Mount `screen` in front of every other layer with no translation.
    pub fn mount(&self, screen: ScreenId) {
        let mut inner = self.inner.borrow_mut();
        inner.layers.retain(|l| l.screen != screen);
        let frame = inner.bounds;
        inner.layers.push(Layer {
            screen,
            frame,
            offset: Offset::ZERO,
        });
    }

    /// Remove the layer for `screen`. Returns whether it was mounted.
    pub fn unmount(&self, screen: ScreenId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.layers.len();
        inner.layers.retain(|l| l.screen != screen);
        before != inner.layers.len()
    }

    /// Whether `screen` has a layer.
    #[must_use]
    pub fn is_mounted(&self, screen: ScreenId) -> bool {
        self.inner.borrow().layers.iter().any(|l| l.screen == screen)
    }

    /// Layers back to front.
    #[must_use]
    pub fn layers(&self) -> Vec<Layer> {
        self.inner.borrow().layers.clone()
    }

    /// The front-most layer's screen.
    #[must_use]
    pub fn front(&self) -> Option<ScreenId> {
        self.inner.borrow().layers.last().map(|l| l.screen)
    }

    /// Translate the layer for `screen`. Unmounted screens are ignored.
    pub fn set_offset(&self, screen: ScreenId, offset: Offset) {
        let mut inner = self.inner.borrow_mut();
        if let Some(layer) = inner.layers.iter_mut().find(|l| l.screen == screen) {
            layer.offset = offset;
        }
    }

    /// Translation of the layer for `screen`, if mounted.
    #[must_use]
    pub fn offset(&self, screen: ScreenId) -> Option<Offset> {
        self.inner
            .borrow()
            .layers
            .iter()
            .find(|l| l.screen == screen)
            .map(|l| l.offset)
    }

    /// Attach a gesture target to `screen`, replacing any previous one.
    pub fn attach_gesture(&self, screen: ScreenId, target: Rc<dyn PanTarget>) {
        let mut inner = self.inner.borrow_mut();
        inner.gestures.retain(|(id, _)| *id != screen);
        inner.gestures.push((screen, target));
        debug!(target: "ftui.nav", %screen, "gesture attached");
    }

    /// Detach the gesture target from `screen`. Returns whether one existed.
    pub fn detach_gesture(&self, screen: ScreenId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.gestures.len();
        inner.gestures.retain(|(id, _)| *id != screen);
        before != inner.gestures.len()
    }

    /// Whether a gesture target is attached to `screen`.
    #[must_use]
    pub fn has_gesture(&self, screen: ScreenId) -> bool {
        self.inner
            .borrow()
            .gestures
            .iter()
            .any(|(id, _)| *id == screen)
    }

    /// Route pan input to the target attached to `screen`.
    ///
    /// Returns `false` when nothing is attached.
    pub fn dispatch_pan(&self, screen: ScreenId, event: &PanEvent) -> bool {
        let target = self
            .inner
            .borrow()
            .gestures
            .iter()
            .find(|(id, _)| *id == screen)
            .map(|(_, t)| Rc::clone(t));
        match target {
            Some(target) => {
                target.handle_pan(event);
                true
            }
            None => {
                warn!(target: "ftui.nav", %screen, phase = ?event.phase, "pan event with no gesture target");
                false
            }
        }
    }
}

impl fmt::Debug for ContainerSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ContainerSurface")
            .field("bounds", &inner.bounds)
            .field("layers", &inner.layers)
            .field("gestures", &inner.gestures.len())
            .finish()
    }
}
