#![forbid(unsafe_code)]

//! Continuous drag recognizer.
//!
//! Begins when the focal point of the contacts travels farther than the
//! touch slop from where the current set of contacts went down, provided
//! the number of contacts lies in `[minimum, maximum]`.
//!
//! # Invariants
//!
//! 1. `translation` is the focal-point displacement since the gesture's
//!    `Down`, measured from the point where the slop was crossed onward.
//! 2. Adding or lifting a contact re-bases the focal point, so the focus
//!    jump is never reported as motion.
//!
//! # Failure Modes
//!
//! - Too many contacts before the slop is crossed: `Failed`.
//! - Fewer than the minimum contacts after a pointer-up, before the slop is
//!   crossed: `Failed`.
//! - Fewer than the minimum contacts when the slop is crossed: the drag is
//!   ignored and the recognizer stays `Possible`.

use gesturekit_core::{GestureConfig, Phase, Point, PointerSample, Velocity, VelocityTracker};

use crate::context::GestureContext;
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

// ---------------------------------------------------------------------------
// Shared motion bookkeeping
// ---------------------------------------------------------------------------

/// Focal-point motion shared by the drag-style recognizers.
#[derive(Debug, Clone, Default)]
pub(crate) struct PanMotion {
    pub(crate) last_focus: Point,
    pub(crate) down_focus: Point,
    pub(crate) start_location: Point,
    /// `last - current` on the latest applied move.
    pub(crate) scroll: Point,
    pub(crate) translation: Point,
    pub(crate) velocity: Velocity,
    pub(crate) tracker: VelocityTracker,
}

impl PanMotion {
    pub(crate) fn start(&mut self, focus: Point, sample: &PointerSample) {
        self.last_focus = focus;
        self.down_focus = focus;
        self.start_location = focus;
        self.scroll = Point::ZERO;
        self.translation = Point::ZERO;
        self.velocity = Velocity::ZERO;
        self.tracker.clear();
        self.tracker.add_sample(sample);
    }

    pub(crate) fn rebase(&mut self, focus: Point) {
        self.last_focus = focus;
        self.down_focus = focus;
    }

    pub(crate) fn record(&mut self, sample: &PointerSample) {
        self.tracker.add_sample(sample);
    }

    /// Drop the velocity history when the lifting contact moved against any
    /// remaining one; the estimate would otherwise mix opposite motions.
    pub(crate) fn split(&mut self, sample: &PointerSample, max_velocity: f32) {
        self.tracker.compute_current_velocity(max_velocity);
        let Some(lifted) = sample.action_index() else {
            return;
        };
        let Some(lifted_id) = sample.contacts.get(lifted).map(|c| c.id) else {
            return;
        };
        let lifted_velocity = self.tracker.velocity(lifted_id);
        let opposed = sample
            .contacts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lifted)
            .any(|(_, c)| lifted_velocity.dot(self.tracker.velocity(c.id)) < 0.0);
        if opposed {
            self.tracker.clear();
        }
    }

    /// Apply a move to `focus`.
    pub(crate) fn advance(&mut self, focus: Point, max_velocity: f32) {
        self.scroll = self.last_focus - focus;
        self.translation = self.translation - self.scroll;
        self.last_focus = focus;
        self.tracker.compute_current_velocity(max_velocity);
        self.velocity = self.tracker.primary_velocity();
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Pan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Pan {
    pub minimum_number_of_touches: usize,
    pub maximum_number_of_touches: usize,
    pub touch_slop: f32,
    /// Speed above which a release counts as a fling.
    pub minimum_fling_velocity: f32,
    /// Per-axis velocity clamp.
    pub maximum_fling_velocity: f32,
    started: bool,
    finished: bool,
    motion: PanMotion,
}

impl Default for Pan {
    fn default() -> Self {
        Self::new()
    }
}

impl Pan {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            minimum_number_of_touches: 1,
            maximum_number_of_touches: usize::MAX,
            touch_slop: config.touch_slop,
            minimum_fling_velocity: config.minimum_fling_velocity,
            maximum_fling_velocity: config.maximum_fling_velocity,
            started: false,
            finished: false,
            motion: PanMotion::default(),
        }
    }

    /// Accept only `min..=max` contacts.
    #[must_use]
    pub fn with_touches(mut self, min: usize, max: usize) -> Self {
        self.minimum_number_of_touches = min;
        self.maximum_number_of_touches = max;
        self
    }

    /// Displacement of the focal point since the drag began.
    #[inline]
    #[must_use]
    pub fn translation(&self) -> Point {
        self.motion.translation
    }

    /// `previous - current` focal point of the latest move.
    #[inline]
    #[must_use]
    pub fn scroll(&self) -> Point {
        self.motion.scroll
    }

    /// `current - previous` focal point of the latest move.
    #[inline]
    #[must_use]
    pub fn relative_scroll(&self) -> Point {
        Point::ZERO - self.motion.scroll
    }

    /// Velocity of the primary contact, in pixels per second.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.motion.velocity
    }

    /// Focal point at the `Down` that started the stream.
    #[inline]
    #[must_use]
    pub fn start_location(&self) -> Point {
        self.motion.start_location
    }

    /// Whether the drag ended fast enough to count as a fling.
    #[must_use]
    pub fn is_fling(&self) -> bool {
        let v = self.motion.velocity;
        self.finished
            && (v.x.abs() > self.minimum_fling_velocity || v.y.abs() > self.minimum_fling_velocity)
    }

    fn in_range(&self, count: usize) -> bool {
        (self.minimum_number_of_touches..=self.maximum_number_of_touches).contains(&count)
    }
}

/// End an active drag-style recognizer, firing if it was delivering events.
pub(crate) fn end_drag<G: GestureBehavior>(gesture: &G, cx: &mut GestureContext<'_>) {
    let was_firing = cx.has_began_firing_events();
    cx.set_state(gesture, State::Ended);
    if was_firing {
        cx.fire_action(gesture);
    }
}

impl GestureBehavior for Pan {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::Pan(self)
    }

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        let focus = cx.base.current_location;
        let count = cx.base.number_of_touches;
        let state = cx.state();
        match sample.phase {
            Phase::Down => {
                cx.cancel(&[Message::Reset]);
                cx.stop_listening();
                self.started = false;
                self.finished = false;
                self.motion.start(focus, sample);
                cx.base.began_firing = false;
                cx.set_state(&*self, State::Possible);
            }
            Phase::PointerDown { .. } => {
                self.motion.rebase(focus);
                self.motion.record(sample);
                if state == State::Possible && count > self.maximum_number_of_touches {
                    tracing::debug!(target: "gesturekit::pan", id = %cx.id, count, "too many touches");
                    cx.cancel(&[Message::Reset]);
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::PointerUp { .. } => {
                self.motion.rebase(focus);
                self.motion.split(sample, self.maximum_fling_velocity);
                if state == State::Possible && count < self.minimum_number_of_touches {
                    tracing::debug!(target: "gesturekit::pan", id = %cx.id, count, "too few touches");
                    cx.cancel(&[Message::Reset]);
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::Move => {
                self.motion.record(sample);
                if state == State::Possible && !self.started {
                    let distance = focus.distance(self.motion.down_focus);
                    if distance <= self.touch_slop {
                        return;
                    }
                    if count < self.minimum_number_of_touches {
                        tracing::trace!(target: "gesturekit::pan", id = %cx.id, count, "drag below minimum touches ignored");
                        return;
                    }
                    self.motion.advance(focus, self.maximum_fling_velocity);
                    self.started = true;
                    if self.in_range(count) && cx.should_begin(&*self) {
                        cx.set_state(&*self, State::Began);
                        cx.resolve_trigger(&*self);
                    } else {
                        cx.set_state(&*self, State::Failed);
                    }
                } else if state.is_active() {
                    self.motion.advance(focus, self.maximum_fling_velocity);
                    if cx.has_began_firing_events() {
                        cx.set_state(&*self, State::Changed);
                        cx.fire_action(&*self);
                    }
                }
            }
            Phase::Up => {
                if state.is_active() {
                    self.finished = true;
                    end_drag(&*self, cx);
                }
                if state == State::Possible || !self.started {
                    self.motion.velocity = Velocity::ZERO;
                }
                self.started = false;
                self.motion.tracker.clear();
                cx.post_reset();
            }
            Phase::Cancel => {
                self.started = false;
                cx.cancel_stream(&*self);
            }
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, _payload: Option<i64>) {
        if message == Message::Reset && !cx.state().is_active() {
            self.started = false;
            self.finished = false;
            cx.soft_reset(&*self);
        }
    }

    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>) {
        cx.fire_if_allowed(&*self);
    }

    fn on_required_recognized(&mut self, _cx: &mut GestureContext<'_>) {
        self.started = false;
    }

    fn reset(&mut self) {
        self.started = false;
        self.finished = false;
        self.motion.clear();
    }
}
