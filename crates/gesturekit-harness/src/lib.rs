#![forbid(unsafe_code)]

//! Test harness for gesturekit.
//!
//! - [`TouchScript`] - Builds deterministic multi-touch streams on a virtual
//!   clock
//! - [`GestureLab`] - Replays scripts through an [`Arbiter`](gesturekit::Arbiter)
//!   and records every action and transition
//! - [`capture`] - Collects the `tracing` output of a closure

pub mod capture;
pub mod lab;
pub mod script;

pub use capture::{CaptureHandle, CapturedEvent, CapturedSpan, TraceCapture, capture};
pub use lab::{GestureLab, LabEvent};
pub use script::{DEFAULT_STEP, ScriptStep, TouchScript};
