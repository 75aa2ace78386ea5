#![forbid(unsafe_code)]

//! Discrete tap recognizer: `taps_required` taps with `touches_required`
//! fingers each.
//!
//! # Invariants
//!
//! 1. Reaches `Ended` only on the release that completes the last tap, with
//!    exactly `touches_required` touches counted.
//! 2. A finger held past `tap_timeout` (plus grace), a gap between taps
//!    longer than `double_tap_timeout`, or movement beyond the slop fails
//!    the recognizer.
//!
//! # Failure Modes
//!
//! - The touch count after a pointer-up is only trusted once it has held for
//!   `tap_timeout`; a release in between compares against the count before
//!   the lift.

use gesturekit_core::{Duration, GestureConfig, Phase, Point, PointerSample};

use crate::context::{GestureContext, Resolution};
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

#[derive(Debug, Clone)]
pub struct Tap {
    /// Fingers per tap.
    pub touches_required: usize,
    /// Consecutive taps.
    pub taps_required: usize,
    /// Longest a tap may be held.
    pub tap_timeout: Duration,
    /// Longest gap between two taps.
    pub double_tap_timeout: Duration,
    pub touch_slop: f32,
    /// Farthest a follow-up tap may land from the previous one.
    pub double_tap_slop: f32,
    /// Slack added to `tap_timeout` before a held finger fails.
    pub timeout_grace: Duration,
    touches: usize,
    taps: usize,
    started: bool,
    in_tap_region: bool,
    down_focus: Point,
    previous_tap_location: Point,
}

impl Default for Tap {
    fn default() -> Self {
        Self::new()
    }
}

impl Tap {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            touches_required: 1,
            taps_required: 1,
            tap_timeout: config.tap_timeout,
            double_tap_timeout: config.double_tap_timeout,
            touch_slop: config.touch_slop,
            double_tap_slop: config.double_tap_slop,
            timeout_grace: config.timeout_grace,
            touches: 0,
            taps: 0,
            started: false,
            in_tap_region: false,
            down_focus: Point::ZERO,
            previous_tap_location: Point::ZERO,
        }
    }

    #[must_use]
    pub fn with_taps_required(mut self, taps: usize) -> Self {
        self.taps_required = taps;
        self
    }

    #[must_use]
    pub fn with_touches_required(mut self, touches: usize) -> Self {
        self.touches_required = touches;
        self
    }

    /// Taps counted in the current sequence.
    #[inline]
    #[must_use]
    pub fn taps(&self) -> usize {
        self.taps
    }

    fn slop(&self) -> f32 {
        if self.touches_required > 1 && self.taps_required > 1 {
            self.double_tap_slop
        } else {
            self.touch_slop
        }
    }

    fn fail(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel_all();
        cx.base.began_firing = false;
        self.started = false;
        cx.set_state(&*self, State::Failed);
    }

    fn finish_cycle(&mut self, cx: &mut GestureContext<'_>) {
        self.started = false;
        cx.soft_reset(&*self);
    }

    fn on_down(&mut self, cx: &mut GestureContext<'_>, count: usize) {
        cx.cancel_all();
        self.in_tap_region = true;
        self.touches = count;
        cx.set_state(&*self, State::Possible);
        cx.base.began_firing = false;
        if !self.started {
            cx.stop_listening();
            self.taps = 0;
            self.started = true;
        } else if self.touches_required == 1 && self.taps_required > 1 {
            let gap = cx.base.down_location.distance(cx.base.previous_down_location);
            if gap > self.double_tap_slop {
                tracing::debug!(target: "gesturekit::tap", id = %cx.id, gap, "follow-up tap too far");
                self.fail(cx);
                return;
            }
        }
        cx.schedule(self.tap_timeout + self.timeout_grace, Message::LongPress);
        self.taps += 1;
        self.down_focus = cx.base.current_location;
    }

    fn on_pointer_down(&mut self, cx: &mut GestureContext<'_>, count: usize) {
        cx.cancel(&[Message::PointerUpSettled]);
        self.touches = count;
        if self.touches > 1 {
            if self.touches > self.touches_required {
                tracing::debug!(target: "gesturekit::tap", id = %cx.id, touches = self.touches, "too many touches");
                cx.set_state(&*self, State::Failed);
            } else if self.touches == self.touches_required && self.taps_required > 1 {
                let location = cx.base.current_location;
                if self.taps < self.taps_required {
                    self.previous_tap_location = location;
                } else if self.taps == self.taps_required
                    && location.distance(self.previous_tap_location) > self.double_tap_slop
                {
                    self.fail(cx);
                    return;
                }
            }
        }
        self.down_focus = cx.base.current_location;
    }

    fn on_up(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel(&[Message::Reset, Message::PointerUpSettled, Message::LongPress]);
        if !(cx.state() == State::Possible && self.started) {
            self.finish_cycle(cx);
            return;
        }
        if self.touches != self.touches_required {
            tracing::debug!(target: "gesturekit::tap", id = %cx.id, touches = self.touches, "wrong touch count on release");
            self.fail(cx);
        } else if self.taps < self.taps_required {
            cx.schedule(self.double_tap_timeout, Message::Failed);
        } else {
            if cx.should_begin(&*self) {
                cx.set_state(&*self, State::Ended);
                if cx.resolve_trigger(&*self) == Resolution::Proceed {
                    cx.post_reset();
                }
            } else {
                cx.set_state(&*self, State::Failed);
            }
            self.started = false;
        }
    }
}

impl GestureBehavior for Tap {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::Tap(self)
    }

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        let count = sample.pointer_count();
        let tracking = self.started && cx.state() == State::Possible;
        match sample.phase {
            Phase::Down => self.on_down(cx, count),
            Phase::PointerDown { .. } if tracking => self.on_pointer_down(cx, count),
            Phase::PointerUp { .. } if tracking => {
                cx.cancel(&[Message::Failed, Message::Reset, Message::PointerUpSettled]);
                self.down_focus = cx.base.current_location;
                let remaining = i64::try_from(self.touches.saturating_sub(1)).unwrap_or(0);
                cx.schedule_with(self.tap_timeout, Message::PointerUpSettled, Some(remaining));
            }
            Phase::Move if tracking && self.in_tap_region => {
                let distance = self.down_focus.distance(cx.base.current_location);
                if distance > self.slop() {
                    tracing::debug!(target: "gesturekit::tap", id = %cx.id, distance, "slop exceeded");
                    self.in_tap_region = false;
                    cx.cancel_all();
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::Up => self.on_up(cx),
            Phase::Cancel => {
                self.started = false;
                cx.cancel_stream(&*self);
            }
            Phase::PointerDown { .. } | Phase::PointerUp { .. } | Phase::Move => {}
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, payload: Option<i64>) {
        match message {
            Message::Reset => {
                if cx.state().is_finished() {
                    self.finish_cycle(cx);
                }
            }
            Message::Failed | Message::LongPress => {
                if self.started && cx.state() == State::Possible {
                    tracing::debug!(target: "gesturekit::tap", id = %cx.id, ?message, "tap window elapsed");
                    self.fail(cx);
                }
            }
            Message::PointerUpSettled => {
                if self.started {
                    self.touches = payload.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
                }
            }
        }
    }

    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>) {
        cx.fire_if_allowed(&*self);
        cx.post_reset();
    }

    fn on_required_recognized(&mut self, _cx: &mut GestureContext<'_>) {
        self.started = false;
    }

    fn reset(&mut self) {
        self.touches = 0;
        self.taps = 0;
        self.started = false;
        self.in_tap_region = false;
        self.down_focus = Point::ZERO;
        self.previous_tap_location = Point::ZERO;
    }

    fn continues_sequence(&self) -> bool {
        self.started
    }

    fn sync(&self, cx: &mut GestureContext<'_>) {
        cx.base.number_of_touches = self.touches;
        cx.base.touch_active = self.started;
    }
}
