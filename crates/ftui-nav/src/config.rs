#![forbid(unsafe_code)]

//! Navigation container configuration.
//!
//! Every tunable of the container and its built-in animators lives in
//! [`NavigationConfig`]. With the `policy-config` feature it can be loaded
//! from TOML or JSON at startup:
//!
//! ```toml
//! # ftui-nav.toml
//! transition_duration_ms = 250
//! easing = "ease_out"
//! parallax_factor = 0.3
//! completion_threshold = 0.5
//! velocity_threshold = 40.0
//! animations_enabled = true
//! ```
//!
//! ```rust,ignore
//! let config = NavigationConfig::from_toml_file("ftui-nav.toml")?;
//! ```
//!
//! Loaded configs are validated; out-of-range values are rejected rather
//! than clamped.

#[cfg(feature = "policy-config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

use crate::animation::Easing;
use crate::error::NavConfigError;

/// Default transition duration in milliseconds.
const DEFAULT_DURATION_MS: u64 = 300;

/// Default share of the surface the outgoing screen drifts by.
const DEFAULT_PARALLAX: f64 = 0.3;

/// Tunables for a [`NavigationContainer`](crate::container::NavigationContainer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct NavigationConfig {
    /// Length of an animated transition. Default: 300.
    pub transition_duration_ms: u64,

    /// Curve for animated transitions. Default: ease-in.
    pub easing: Easing,

    /// Fraction of the surface extent the background screen moves by during
    /// a slide. Must be in `[0, 1]`. Default: 0.3.
    pub parallax_factor: f64,

    /// Gesture progress past which a released interactive transition
    /// completes. Must be in `[0, 1]`. Default: 0.5.
    pub completion_threshold: f64,

    /// Release velocity (cells/s along the slide axis) that decides an
    /// interactive transition regardless of progress. Default: 40.0.
    pub velocity_threshold: f64,

    /// When false, `show` pushes without animation. Default: true.
    pub animations_enabled: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: DEFAULT_DURATION_MS,
            easing: Easing::default(),
            parallax_factor: DEFAULT_PARALLAX,
            completion_threshold: 0.5,
            velocity_threshold: 40.0,
            animations_enabled: true,
        }
    }
}

impl NavigationConfig {
    /// Transition length as a [`Duration`].
    #[must_use]
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    /// Set the transition duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.transition_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the parallax factor.
    #[must_use]
    pub fn with_parallax_factor(mut self, factor: f64) -> Self {
        self.parallax_factor = factor;
        self
    }

    /// Set the interactive completion threshold.
    #[must_use]
    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold;
        self
    }

    /// Set the interactive velocity threshold.
    #[must_use]
    pub fn with_velocity_threshold(mut self, velocity: f64) -> Self {
        self.velocity_threshold = velocity;
        self
    }

    /// Enable or disable animation for `show`.
    #[must_use]
    pub fn with_animations_enabled(mut self, enabled: bool) -> Self {
        self.animations_enabled = enabled;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), NavConfigError> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.parallax_factor) {
            errors.push(format!(
                "parallax_factor must be in [0, 1], got {}",
                self.parallax_factor
            ));
        }
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            errors.push(format!(
                "completion_threshold must be in [0, 1], got {}",
                self.completion_threshold
            ));
        }
        if !self.velocity_threshold.is_finite() || self.velocity_threshold < 0.0 {
            errors.push(format!(
                "velocity_threshold must be finite and >= 0, got {}",
                self.velocity_threshold
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NavConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, NavConfigError> {
        let config: Self = toml::from_str(s).map_err(NavConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NavConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NavConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, NavConfigError> {
        let config: Self = serde_json::from_str(s).map_err(NavConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NavConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NavConfigError::Io)?;
        Self::from_json_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = NavigationConfig::default();
        assert_eq!(c.transition_duration(), Duration::from_millis(300));
        assert_eq!(c.easing, Easing::EaseIn);
        assert_eq!(c.parallax_factor, 0.3);
        assert!(c.animations_enabled);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builders_chain() {
        let c = NavigationConfig::default()
            .with_duration(Duration::from_millis(120))
            .with_easing(Easing::Linear)
            .with_parallax_factor(0.5)
            .with_completion_threshold(0.25)
            .with_velocity_threshold(10.0)
            .with_animations_enabled(false);
        assert_eq!(c.transition_duration_ms, 120);
        assert_eq!(c.easing, Easing::Linear);
        assert_eq!(c.parallax_factor, 0.5);
        assert_eq!(c.completion_threshold, 0.25);
        assert_eq!(c.velocity_threshold, 10.0);
        assert!(!c.animations_enabled);
    }

    #[test]
    fn validation_collects_every_problem() {
        let c = NavigationConfig::default()
            .with_parallax_factor(1.5)
            .with_completion_threshold(-0.1)
            .with_velocity_threshold(f64::NAN);
        match c.validate() {
            Err(NavConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_partial_uses_defaults() {
        let c = NavigationConfig::from_toml_str("transition_duration_ms = 150\neasing = \"ease_out\"\n")
            .expect("valid toml");
        assert_eq!(c.transition_duration_ms, 150);
        assert_eq!(c.easing, Easing::EaseOut);
        assert_eq!(c.parallax_factor, 0.3);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_out_of_range_is_rejected() {
        let err = NavigationConfig::from_json_str(r#"{"parallax_factor": 2.0}"#)
            .expect_err("parallax out of range");
        assert!(matches!(err, NavConfigError::Validation(_)));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_file_roundtrip() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "animations_enabled = false").expect("write");
        let c = NavigationConfig::from_toml_file(file.path()).expect("load");
        assert!(!c.animations_enabled);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn missing_file_is_io_error() {
        let err = NavigationConfig::from_json_file("/nonexistent/ftui-nav.json")
            .expect_err("missing file");
        assert!(matches!(err, NavConfigError::Io(_)));
    }
}
