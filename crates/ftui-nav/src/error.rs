#![forbid(unsafe_code)]

//! Error types for stack preconditions and configuration loading.
//!
//! Stack errors describe caller misuse. The non-`try_` container methods turn
//! them into panics; the `try_` forms hand them back untouched so embedders
//! can surface them however they like.

use std::fmt;

use crate::screen::ScreenId;

/// A violated navigation stack precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavError {
    /// The screen is already on the stack.
    DuplicateScreen { screen: ScreenId },
    /// The pop target is not on the stack.
    ScreenNotInStack { screen: ScreenId },
    /// A stack replacement was requested with no screens.
    EmptyStack,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateScreen { screen } => {
                write!(f, "navigation stack already contains {screen}")
            }
            Self::ScreenNotInStack { screen } => {
                write!(f, "cannot pop to {screen}: it is not on the navigation stack")
            }
            Self::EmptyStack => write!(f, "new navigation stack cannot be empty"),
        }
    }
}

impl std::error::Error for NavError {}

/// Errors that can occur when loading or validating a [`NavigationConfig`].
///
/// [`NavigationConfig`]: crate::config::NavigationConfig
#[derive(Debug)]
pub enum NavConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for NavConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for NavConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
