#![forbid(unsafe_code)]

//! Tick-driven, interruptible tweens for transition animators.
//!
//! The navigation container does not own a frame clock. The host calls
//! [`AnimationDriver::tick`] (usually through
//! [`NavigationContainer::tick`](crate::container::NavigationContainer::tick))
//! once per frame with the elapsed time, and every running [`Tween`] advances,
//! reports its eased progress, and fires its finish callback when it settles.
//!
//! # Example
//!
//! ```
//! use ftui_nav::animation::{AnimationDriver, Easing};
//! use std::time::Duration;
//!
//! let driver = AnimationDriver::new();
//! let tween = driver.animate(
//!     Duration::from_millis(200),
//!     Easing::Linear,
//!     Box::new(|_progress| {}),
//!     Box::new(|_position| {}),
//! );
//! driver.tick(Duration::from_millis(100));
//! assert!((tween.fraction() - 0.5).abs() < 1e-9);
//! driver.tick(Duration::from_millis(100));
//! assert!(tween.is_finished());
//! ```
//!
//! # Invariants
//!
//! - A tween's fraction is always in [0.0, 1.0].
//! - The finish callback fires exactly once: at `End` when a forward tween
//!   reaches 1.0, at `Start` when a reversed tween reaches 0.0.
//! - Paused tweens do not advance and never settle on their own.
//!
//! # Failure Modes
//!
//! - Zero-duration tweens settle on the next tick.
//! - Controls issued from inside a frame or finish callback are honored; the
//!   callback slot is vacated while it runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::event::EventPosition;

// ============================================================================
// Easing Functions
// ============================================================================

/// Easing curve applied to a tween's linear fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Easing {
    /// Linear interpolation.
    Linear,
    /// Accelerating from rest.
    #[default]
    EaseIn,
    /// Decelerating to rest.
    EaseOut,
    /// Smooth S-curve.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

// ============================================================================
// Tween State
// ============================================================================

/// Per-frame callback receiving eased progress in [0.0, 1.0].
pub type FrameFn = Box<dyn FnMut(f64)>;
/// Settle callback receiving the end the tween came to rest at.
pub type FinishFn = Box<dyn FnOnce(EventPosition)>;

struct TweenState {
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    paused: bool,
    reversed: bool,
    finished: bool,
    on_frame: Option<FrameFn>,
    on_finish: Option<FinishFn>,
}

impl TweenState {
    fn fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return if self.reversed { 0.0 } else { 1.0 };
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Advance by `dt`. Returns the settle position once an end is reached.
    fn advance(&mut self, dt: Duration) -> Option<EventPosition> {
        if self.reversed {
            self.elapsed = self.elapsed.saturating_sub(dt);
            self.elapsed.is_zero().then_some(EventPosition::Start)
        } else {
            self.elapsed = (self.elapsed + dt).min(self.duration);
            (self.elapsed >= self.duration).then_some(EventPosition::End)
        }
    }
}

/// Shared handle to one running animation.
///
/// Modeled after interruptible property animators: the tween can be paused,
/// scrubbed, reversed, and resumed while it runs.
#[derive(Clone)]
pub struct Tween {
    state: Rc<RefCell<TweenState>>,
}

impl Tween {
    /// Linear (un-eased) fraction complete.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.state.borrow().fraction()
    }

    /// Eased progress, as last reported to the frame callback.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let state = self.state.borrow();
        state.easing.apply(state.fraction())
    }

    /// Stop advancing on ticks.
    pub fn pause(&self) {
        self.state.borrow_mut().paused = true;
    }

    /// Continue advancing on ticks from the current fraction.
    pub fn resume(&self) {
        self.state.borrow_mut().paused = false;
    }

    /// Whether the tween is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Play backward toward 0.0 (`true`) or forward toward 1.0 (`false`).
    pub fn set_reversed(&self, reversed: bool) {
        self.state.borrow_mut().reversed = reversed;
    }

    /// Whether the tween is playing backward.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.state.borrow().reversed
    }

    /// Whether the finish callback has fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    /// Jump to `fraction` and render that frame immediately.
    ///
    /// Scrubbing never settles the tween; it only settles by ticking.
    pub fn set_fraction(&self, fraction: f64) {
        let eased = {
            let mut state = self.state.borrow_mut();
            if state.finished {
                return;
            }
            let f = if fraction.is_finite() {
                fraction.clamp(0.0, 1.0)
            } else {
                0.0
            };
            state.elapsed = state.duration.mul_f64(f);
            state.easing.apply(f)
        };
        run_frame(&self.state, eased);
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Tween")
            .field("duration", &state.duration)
            .field("fraction", &state.fraction())
            .field("paused", &state.paused)
            .field("reversed", &state.reversed)
            .field("finished", &state.finished)
            .finish()
    }
}

fn run_frame(state: &Rc<RefCell<TweenState>>, eased: f64) {
    let frame = state.borrow_mut().on_frame.take();
    if let Some(mut frame) = frame {
        frame(eased);
        let mut st = state.borrow_mut();
        if st.on_frame.is_none() && !st.finished {
            st.on_frame = Some(frame);
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Frame clock shared by every animator of a container.
///
/// Cloning shares the same set of tweens.
#[derive(Clone, Default)]
pub struct AnimationDriver {
    tweens: Rc<RefCell<Vec<Rc<RefCell<TweenState>>>>>,
}

impl AnimationDriver {
    /// Create an idle driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween. It advances from the next [`tick`](Self::tick).
    pub fn animate(
        &self,
        duration: Duration,
        easing: Easing,
        on_frame: FrameFn,
        on_finish: FinishFn,
    ) -> Tween {
        let state = Rc::new(RefCell::new(TweenState {
            duration,
            elapsed: Duration::ZERO,
            easing,
            paused: false,
            reversed: false,
            finished: false,
            on_frame: Some(on_frame),
            on_finish: Some(on_finish),
        }));
        self.tweens.borrow_mut().push(Rc::clone(&state));
        Tween { state }
    }

    /// Advance every running tween by `dt`. Returns how many settled.
    pub fn tick(&self, dt: Duration) -> usize {
        // Snapshot so callbacks may start new tweens.
        let tweens: Vec<_> = self.tweens.borrow().clone();
        let mut settled = 0;

        for tween in &tweens {
            let (eased, done) = {
                let mut state = tween.borrow_mut();
                if state.finished || state.paused {
                    continue;
                }
                let done = state.advance(dt);
                (state.easing.apply(state.fraction()), done)
            };
            run_frame(tween, eased);

            if let Some(position) = done {
                let finish = {
                    let mut state = tween.borrow_mut();
                    // A frame callback may have reversed or scrubbed the tween.
                    if state.finished || state.paused {
                        continue;
                    }
                    state.finished = true;
                    state.on_frame = None;
                    state.on_finish.take()
                };
                settled += 1;
                if let Some(finish) = finish {
                    finish(position);
                }
            }
        }

        self.tweens.borrow_mut().retain(|t| !t.borrow().finished);
        settled
    }

    /// Number of tweens that have not settled.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tweens
            .borrow()
            .iter()
            .filter(|t| !t.borrow().finished)
            .count()
    }

    /// Whether no tween is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }
}

impl fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("active", &self.active_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
