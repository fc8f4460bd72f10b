#![forbid(unsafe_code)]

//! Immutable descriptions of requested stack mutations.
//!
//! Not to be confused with the queue units in [`crate::queue`]: a
//! [`StackOperation`] is the payload carried by [`crate::event::NavEvent`].

use crate::screen::ScreenHandle;

/// What kind of mutation was requested, with its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// A screen is appended on top.
    Push(ScreenHandle),
    /// The given screen (the top at request time) is removed, possibly
    /// together with everything down to a pop target.
    Pop(ScreenHandle),
    /// The whole stack is replaced.
    Set(Vec<ScreenHandle>),
}

impl OperationKind {
    /// Short lowercase label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Pop(_) => "pop",
            Self::Set(_) => "set",
        }
    }
}

/// One stack mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOperation {
    kind: OperationKind,
    is_animated: bool,
}

impl StackOperation {
    pub(crate) fn new(kind: OperationKind, is_animated: bool) -> Self {
        Self { kind, is_animated }
    }

    /// The requested mutation.
    #[inline]
    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Whether the mutation is visualised with an animation.
    #[inline]
    pub fn is_animated(&self) -> bool {
        self.is_animated
    }
}
