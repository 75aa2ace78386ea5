#![forbid(unsafe_code)]

//! Recognizer states and kinds.

use std::fmt;

/// Where a recognizer is in its current gesture cycle.
///
/// Continuous recognizers move `Possible → Began → Changed* → Ended`.
/// Discrete recognizers only ever go `Possible → Ended`. Any recognizer may
/// drop to `Failed` or `Cancelled`. `Ended`, `Failed` and `Cancelled` hold
/// until the recognizer resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    #[default]
    Possible,
    Began,
    Changed,
    Ended,
    Failed,
    Cancelled,
}

impl State {
    /// `Ended`, `Failed` or `Cancelled`.
    #[inline]
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Ended | Self::Failed | Self::Cancelled)
    }

    /// `Began` or `Changed`.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Began | Self::Changed)
    }

    /// A state that makes dependents give up: the recognizer claimed the
    /// gesture.
    #[inline]
    #[must_use]
    pub const fn is_recognized(self) -> bool {
        matches!(self, Self::Began | Self::Changed | Self::Ended)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Possible => "possible",
            Self::Began => "began",
            Self::Changed => "changed",
            Self::Ended => "ended",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// The seven recognizer algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    LongPress,
    Pan,
    Pinch,
    Rotate,
    Swipe,
    ScreenEdgePan,
}

impl GestureKind {
    /// Whether the kind reports `Began`/`Changed` progress.
    #[inline]
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        !matches!(self, Self::Tap | Self::Swipe)
    }

    /// The state in which the kind reaches its trigger and consults
    /// failure requirements.
    #[inline]
    #[must_use]
    pub const fn trigger_state(self) -> State {
        if self.is_continuous() {
            State::Began
        } else {
            State::Ended
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::LongPress => "long_press",
            Self::Pan => "pan",
            Self::Pinch => "pinch",
            Self::Rotate => "rotate",
            Self::Swipe => "swipe",
            Self::ScreenEdgePan => "screen_edge_pan",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_possible() {
        assert_eq!(State::default(), State::Possible);
    }

    #[test]
    fn state_groups() {
        assert!(State::Ended.is_finished());
        assert!(State::Cancelled.is_finished());
        assert!(!State::Changed.is_finished());
        assert!(State::Changed.is_active());
        assert!(!State::Possible.is_active());
        assert!(State::Ended.is_recognized());
        assert!(!State::Failed.is_recognized());
    }

    #[test]
    fn discrete_kinds() {
        assert!(!GestureKind::Tap.is_continuous());
        assert!(!GestureKind::Swipe.is_continuous());
        assert!(GestureKind::LongPress.is_continuous());
        assert_eq!(GestureKind::Tap.trigger_state(), State::Ended);
        assert_eq!(GestureKind::Pinch.trigger_state(), State::Began);
    }

    #[test]
    fn display_names() {
        assert_eq!(State::Changed.to_string(), "changed");
        assert_eq!(GestureKind::ScreenEdgePan.to_string(), "screen_edge_pan");
    }
}
