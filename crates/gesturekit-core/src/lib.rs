#![forbid(unsafe_code)]

//! Core: pointer samples, deferred timers, velocity estimation, and tunables.
//!
//! # Role in gesturekit
//! `gesturekit-core` is the input layer. It owns the normalized multi-touch
//! sample type, the virtual-clock timer queue recognizers schedule their
//! timeouts on, the velocity estimator, and the system-wide gesture
//! thresholds.
//!
//! # How it fits in the system
//! The recognizer crate (`gesturekit`) consumes [`PointerSample`] values and
//! drives every registered recognizer. Nothing in this crate knows about
//! recognizer state; it can be tested and reused on its own.

pub mod config;
pub mod event;
pub mod geometry;
pub mod timer;
pub mod velocity;

pub use config::{ConfigError, GestureConfig};
pub use event::{Contact, Focus, Phase, PointerId, PointerSample};
pub use geometry::{Point, normalize_degrees, shortest_angle};
pub use timer::{Due, TimerHandle, TimerQueue, TimerService};
pub use velocity::{Velocity, VelocityTracker};

pub use web_time::{Duration, Instant};
