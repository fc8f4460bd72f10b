#![forbid(unsafe_code)]

//! FrankenTUI Navigation
//!
//! A navigation stack container: an ordered stack of screens with push, pop,
//! pop-to, and set transitions, a serial transition queue, rotation gating,
//! and start/end events around every stack mutation.
//!
//! # Key Components
//!
//! - [`NavigationContainer`] - Stack owner and transition orchestrator
//! - [`Screen`] / [`ScreenHandle`] - Stack entries and their lifecycle hooks
//! - [`Animator`] - Pluggable visual strategy for one [`Transition`]
//! - [`EventStream`] - Hot broadcast of [`NavEvent`] start/end pairs
//! - [`AnimationDriver`] - Tick-driven tween clock the animators run on
//! - [`NavigationConfig`] - Durations, easing, and gesture thresholds
//!
//! # Role in FrankenTUI
//! `ftui-nav` orchestrates which screen is visible. It does not draw: the
//! host reads [`ContainerSurface::layers`] to render, forwards frame time
//! through [`NavigationContainer::tick`], and routes pan input through
//! [`ContainerSurface::dispatch_pan`].
//!
//! # Example
//!
//! ```
//! use ftui_nav::{NavigationConfig, NavigationContainer, ScreenHandle, TransitionOption};
//! use std::time::Duration;
//!
//! let home = ScreenHandle::named("home");
//! let nav = NavigationContainer::with_screens(NavigationConfig::default(), [home.clone()]);
//!
//! let detail = ScreenHandle::named("detail");
//! nav.push(detail.clone(), TransitionOption::Animated);
//! assert_eq!(nav.top(), Some(detail));
//!
//! nav.tick(Duration::from_millis(300));
//! assert!(!nav.is_transitioning());
//!
//! nav.pop(TransitionOption::Immediate);
//! assert_eq!(nav.top(), Some(home));
//! ```

pub mod animation;
pub mod animator;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interactive;
pub mod operation;
pub mod option;
pub mod queue;
pub mod screen;
pub mod slide;
pub mod surface;
pub mod transition;

pub use animation::{AnimationDriver, Easing, Tween};
pub use animator::{Animator, AnimatorFactory, NavigationDelegate, default_animator};
pub use config::NavigationConfig;
pub use container::NavigationContainer;
pub use error::{NavConfigError, NavError};
pub use event::{EventPosition, EventStream, NavEvent, Subscription};
pub use geometry::{Axis, Offset, Rect};
pub use interactive::{InteractionController, InteractiveAnimator, PanEvent, PanPhase};
pub use operation::{OperationKind, StackOperation};
pub use option::TransitionOption;
pub use queue::{OperationState, RotationOperation, TransitionOperation};
pub use screen::{PlainScreen, Screen, ScreenHandle, ScreenId};
pub use slide::{ImmediateAnimator, SlideAnimator, SlideDirection};
pub use surface::{ContainerSurface, Layer, PanTarget};
pub use transition::{
    AlongsideAnimation, AlongsideCompletion, Endpoint, Transition, TransitionContext,
    TransitionKind,
};
