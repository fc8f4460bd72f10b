#![forbid(unsafe_code)]

//! Built-in slide and immediate animators.
//!
//! A push slides the incoming screen over the outgoing one from the trailing
//! edge while the outgoing screen drifts by the parallax factor. A pop runs
//! the mirror image: the outgoing screen slides fully away and the revealed
//! screen comes back from its parallax offset.
//!
//! ```text
//!   push, Left           progress 0          progress 1
//!   from  [####]         x = 0               x = -0.3 w
//!   to          [####]   x = +w              x = 0
//! ```
//!
//! Vertical directions have no parallax: only the incoming screen moves.

use std::cell::RefCell;
use std::fmt;

use tracing::trace;

use crate::animation::Tween;
use crate::animator::Animator;
use crate::event::EventPosition;
use crate::geometry::{Axis, Offset};
use crate::screen::ScreenId;
use crate::surface::ContainerSurface;
use crate::transition::{Transition, TransitionContext, TransitionKind};

/// Direction content moves in during a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    /// Axis the slide moves along.
    pub const fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Up | Self::Down => Axis::Vertical,
        }
    }

    /// +1 when content moves toward the origin, -1 otherwise.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left | Self::Up => 1.0,
            Self::Right | Self::Down => -1.0,
        }
    }
}

/// Start and end layer positions for one slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SlideGeometry {
    kind: TransitionKind,
    from: ScreenId,
    to: ScreenId,
    to_start: Offset,
    from_end: Offset,
}

impl SlideGeometry {
    pub(crate) fn new(context: &TransitionContext, direction: SlideDirection) -> Self {
        let axis = direction.axis();
        let sign = direction.sign();
        let extent = context.surface().bounds().extent(axis);
        let factor = context.config().parallax_factor;
        let push = context.kind() == TransitionKind::Push;

        let (to_start, from_end) = match axis {
            Axis::Horizontal => {
                let to_share = if push { 1.0 } else { factor };
                let from_share = if push { factor } else { 1.0 };
                (
                    Offset::along(axis, sign * extent * to_share),
                    Offset::along(axis, -(sign * extent * from_share)),
                )
            }
            Axis::Vertical => (Offset::along(axis, sign * extent), Offset::ZERO),
        };

        Self {
            kind: context.kind(),
            from: context.from().id(),
            to: context.to().id(),
            to_start,
            from_end,
        }
    }

    /// Mount both endpoints with the moving screen in front.
    pub(crate) fn mount(&self, surface: &ContainerSurface) {
        match self.kind {
            TransitionKind::Push => {
                surface.mount(self.from);
                surface.mount(self.to);
            }
            TransitionKind::Pop => {
                surface.mount(self.to);
                surface.mount(self.from);
            }
        }
    }

    /// Place both layers at eased `progress`.
    pub(crate) fn apply(&self, surface: &ContainerSurface, progress: f64) {
        surface.set_offset(self.to, self.to_start.lerp(Offset::ZERO, progress));
        surface.set_offset(self.from, Offset::ZERO.lerp(self.from_end, progress));
    }

    /// Leave only the screen that ends up visible.
    pub(crate) fn settle(&self, surface: &ContainerSurface, position: EventPosition) {
        match position {
            EventPosition::End => {
                surface.unmount(self.from);
                surface.set_offset(self.to, Offset::ZERO);
            }
            EventPosition::Start => {
                surface.unmount(self.to);
                surface.set_offset(self.from, Offset::ZERO);
            }
        }
    }
}

/// Run `geometry` on a fresh tween that drives `transition`'s alongside work
/// and completes it when the tween settles.
pub(crate) fn start_slide_tween(transition: &Transition, geometry: SlideGeometry) -> Tween {
    let context = transition.context();
    let frame_surface = context.surface().clone();
    let finish_surface = context.surface().clone();
    let frame_transition = transition.clone();
    let finish_transition = transition.clone();

    context.animations().animate(
        context.duration(),
        context.easing(),
        Box::new(move |progress| {
            geometry.apply(&frame_surface, progress);
            frame_transition.drive_alongside(progress);
        }),
        Box::new(move |position| {
            geometry.settle(&finish_surface, position);
            trace!(target: "ftui.nav", ?position, "slide settled");
            finish_transition.complete(position);
        }),
    )
}

/// Default animator for [`TransitionOption::Animated`](crate::TransitionOption::Animated).
pub struct SlideAnimator {
    transition: Transition,
    direction: SlideDirection,
    tween: RefCell<Option<Tween>>,
}

impl SlideAnimator {
    #[must_use]
    pub fn new(transition: Transition, direction: SlideDirection) -> Self {
        Self {
            transition,
            direction,
            tween: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn direction(&self) -> SlideDirection {
        self.direction
    }

    /// The running tween, once `animate` has started one.
    #[must_use]
    pub fn tween(&self) -> Option<Tween> {
        self.tween.borrow().clone()
    }
}

impl Animator for SlideAnimator {
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
            self.transition.drive_alongside(1.0);
            geometry.settle(surface, EventPosition::End);
            self.transition.complete(EventPosition::End);
            return;
        }

        geometry.apply(surface, 0.0);
        let tween = start_slide_tween(&self.transition, geometry);
        *self.tween.borrow_mut() = Some(tween);
    }
}

impl fmt::Debug for SlideAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlideAnimator")
            .field("transition", &self.transition)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// Swaps layers and completes at once.
pub struct ImmediateAnimator {
    transition: Transition,
}

impl ImmediateAnimator {
    #[must_use]
    pub fn new(transition: Transition) -> Self {
        Self { transition }
    }
}

impl Animator for ImmediateAnimator {
    fn transition(&self) -> &Transition {
        &self.transition
    }

    fn animate(&self) {
        let context = self.transition.context();
        if !context.is_degenerate() {
            let surface = context.surface();
            surface.unmount(context.from().id());
            surface.mount(context.to().id());
            self.transition.drive_alongside(1.0);
        }
        self.transition.complete(EventPosition::End);
    }
}

impl fmt::Debug for ImmediateAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmediateAnimator")
            .field("transition", &self.transition)
            .finish()
    }
}
