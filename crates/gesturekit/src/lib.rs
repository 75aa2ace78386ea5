#![forbid(unsafe_code)]

//! Gesture recognizers and the arbiter that runs them.
//!
//! # Key Components
//!
//! - [`Arbiter`] - Owns every recognizer, feeds them samples and timers, and
//!   settles failure dependencies
//! - [`Recognizer`] - A gesture plus its listeners and shared bookkeeping
//! - [`State`] - The lifecycle every recognizer moves through
//! - [`Tap`], [`LongPress`], [`Pan`], [`Pinch`], [`Rotate`], [`Swipe`],
//!   [`ScreenEdgePan`] - The concrete recognizers
//!
//! # Role in gesturekit
//! `gesturekit` sits on top of `gesturekit-core`. The host normalizes its
//! platform touch events into [`PointerSample`] values and hands them to
//! [`Arbiter::dispatch`]; between samples it calls [`Arbiter::advance_to`] so
//! long-press and multi-tap timeouts fire on time.
//!
//! ```rust,ignore
//! let mut arbiter = Arbiter::new();
//! let double = arbiter.add(Recognizer::new(Tap::new().with_taps_required(2)));
//! let single = arbiter.add(Recognizer::new(Tap::new()).on_action(|view| {
//!     println!("tap at {:?}", view.current_location());
//! }));
//! arbiter.require_failure_of(single, Some(double))?;
//! arbiter.dispatch(&sample);
//! ```
//!
//! # Threading
//! Everything runs on the caller's thread. Listeners are invoked
//! synchronously from inside `dispatch` and `advance_to`; use
//! [`Arbiter::handle`] to add or remove recognizers from a listener.

pub mod arbiter;
pub(crate) mod context;
pub(crate) mod failure;
pub mod gestures;
pub mod recognizer;
pub(crate) mod registry;
pub mod state;

pub use arbiter::{Arbiter, ArbiterError, ArbiterHandle};
pub use gestures::{
    LongPress, Pan, Pinch, RectEdge, Rotate, ScaleDetector, ScaleUpdate, ScreenEdgePan,
    SurfaceSize, Swipe, SwipeDirection, Tap,
};
pub use recognizer::{
    ActionListener, Gesture, GestureRef, GestureView, Message, Recognizer, RecognizerBase,
    RecognizerId, StateListener,
};
pub use state::{GestureKind, State};

pub use gesturekit_core::{
    Contact, Duration, GestureConfig, Instant, Phase, Point, PointerId, PointerSample, Velocity,
};
