#![forbid(unsafe_code)]

//! Request modes for stack mutations.

/// How a push, pop, or set should be carried out.
///
/// `Interactive` implies animated. Only `Interactive` defers the stack
/// mutation (and its events) until the gesture confirms the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionOption {
    /// Mutate now, then animate on the transition queue.
    #[default]
    Animated,
    /// Animate on the transition queue, driven by a gesture; mutate on
    /// confirmation only.
    Interactive,
    /// Mutate now and run the animator synchronously without animation.
    Immediate,
}

impl TransitionOption {
    /// Whether the transition goes through the animated queue.
    #[inline]
    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Animated | Self::Interactive)
    }

    /// Whether the stack mutation waits for gesture confirmation.
    #[inline]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// Short lowercase label used in logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Animated => "animated",
            Self::Interactive => "interactive",
            Self::Immediate => "immediate",
        }
    }
}
