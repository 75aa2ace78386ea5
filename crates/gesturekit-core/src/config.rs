#![forbid(unsafe_code)]

//! System-wide gesture thresholds.
//!
//! [`GestureConfig`] plays the role of a platform view configuration: every
//! recognizer seeds its tunables from it, and hosts may load a different set
//! from TOML or JSON at startup (feature `config`).
//!
//! # Loading
//!
//! ```toml
//! # gestures.toml
//! touch_slop = 12.0
//! double_tap_timeout_ms = 250
//! ```
//!
//! ```rust,ignore
//! let config = GestureConfig::from_toml_file("gestures.toml")?;
//! let tap = Tap::with_config(&config);
//! ```
//!
//! Durations are written as integer milliseconds, with an `_ms` suffix on
//! the key. Missing keys keep their defaults.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use web_time::Duration;

// ---------------------------------------------------------------------------
// GestureConfig
// ---------------------------------------------------------------------------

/// Thresholds and timeouts shared by all recognizers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GestureConfig {
    /// Movement (px) below which a contact is still "in place" (default: 8).
    pub touch_slop: f32,
    /// Max distance (px) between consecutive taps of a multi-tap (default: 100).
    pub double_tap_slop: f32,
    /// Longest a tap may be held down (default: 100ms).
    #[cfg_attr(feature = "config", serde(rename = "tap_timeout_ms", with = "millis"))]
    pub tap_timeout: Duration,
    /// Longest gap between the taps of a multi-tap (default: 300ms).
    #[cfg_attr(
        feature = "config",
        serde(rename = "double_tap_timeout_ms", with = "millis")
    )]
    pub double_tap_timeout: Duration,
    /// Hold time before a long press begins (default: 500ms).
    #[cfg_attr(
        feature = "config",
        serde(rename = "long_press_timeout_ms", with = "millis")
    )]
    pub long_press_timeout: Duration,
    /// Grace added to timeouts so a release landing exactly on the
    /// deadline still counts (default: 5ms).
    #[cfg_attr(feature = "config", serde(rename = "timeout_grace_ms", with = "millis"))]
    pub timeout_grace: Duration,
    /// Speed (px/s) above which a release is a fling (default: 50).
    pub minimum_fling_velocity: f32,
    /// Velocity estimates are clamped to this (px/s, default: 8000).
    pub maximum_fling_velocity: f32,
    /// Smallest span (px) at which a pinch may begin (default: 27).
    pub min_scaling_span: f32,
    /// Width (px) of the band along a surface edge for edge pans (default: 20).
    pub screen_edge_limit: f32,
    /// Rotation (radians) needed before a rotate begins (default: 0.008).
    pub rotation_threshold: f32,
    /// Time allowed to leave the slop region for a swipe (default: 150ms).
    #[cfg_attr(
        feature = "config",
        serde(rename = "swipe_max_slop_time_ms", with = "millis")
    )]
    pub swipe_max_slop_time: Duration,
    /// Time allowed to complete a swipe (default: 300ms).
    #[cfg_attr(
        feature = "config",
        serde(rename = "swipe_max_fling_time_ms", with = "millis")
    )]
    pub swipe_max_fling_time: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: 8.0,
            double_tap_slop: 100.0,
            tap_timeout: Duration::from_millis(100),
            double_tap_timeout: Duration::from_millis(300),
            long_press_timeout: Duration::from_millis(500),
            timeout_grace: Duration::from_millis(5),
            minimum_fling_velocity: 50.0,
            maximum_fling_velocity: 8000.0,
            min_scaling_span: 27.0,
            screen_edge_limit: 20.0,
            rotation_threshold: 0.008,
            swipe_max_slop_time: Duration::from_millis(150),
            swipe_max_fling_time: Duration::from_millis(300),
        }
    }
}

impl GestureConfig {
    /// Span slop for pinches: twice the touch slop.
    #[inline]
    #[must_use]
    pub fn span_slop(&self) -> f32 {
        self.touch_slop * 2.0
    }

    /// Minimum travel for a swipe: three times the touch slop.
    #[inline]
    #[must_use]
    pub fn minimum_swipe_distance(&self) -> f32 {
        self.touch_slop * 3.0
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    #[cfg(feature = "config")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let positive = [
            ("touch_slop", self.touch_slop),
            ("double_tap_slop", self.double_tap_slop),
            ("minimum_fling_velocity", self.minimum_fling_velocity),
            ("maximum_fling_velocity", self.maximum_fling_velocity),
            ("min_scaling_span", self.min_scaling_span),
            ("screen_edge_limit", self.screen_edge_limit),
            ("rotation_threshold", self.rotation_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} must be a positive number, got {value}"));
            }
        }

        if self.double_tap_slop < self.touch_slop {
            errors.push(format!(
                "double_tap_slop ({}) must be >= touch_slop ({})",
                self.double_tap_slop, self.touch_slop
            ));
        }
        if self.maximum_fling_velocity <= self.minimum_fling_velocity {
            errors.push(format!(
                "maximum_fling_velocity ({}) must exceed minimum_fling_velocity ({})",
                self.maximum_fling_velocity, self.minimum_fling_velocity
            ));
        }

        let durations = [
            ("tap_timeout", self.tap_timeout),
            ("double_tap_timeout", self.double_tap_timeout),
            ("long_press_timeout", self.long_press_timeout),
            ("swipe_max_slop_time", self.swipe_max_slop_time),
            ("swipe_max_fling_time", self.swipe_max_fling_time),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                errors.push(format!("{name} must be > 0"));
            }
        }
        if self.swipe_max_fling_time < self.swipe_max_slop_time {
            errors.push("swipe_max_fling_time must be >= swipe_max_slop_time".to_string());
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a gesture configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config")]
    TomlSer(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::TomlSer(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::TomlSer(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for durations
// ---------------------------------------------------------------------------

#[cfg(feature = "config")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
