#![forbid(unsafe_code)]

//! Continuous press-and-hold recognizer.
//!
//! Begins once the required fingers have been held still for
//! `minimum_press_duration`. After that, the first movement beyond the touch
//! slop reports `Changed`, and so does every later move. Release ends it.
//! With `taps_required > 1` the hold must follow that many quick taps.

use gesturekit_core::{Duration, GestureConfig, Phase, Point, PointerSample};

use crate::context::{GestureContext, Resolution};
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

#[derive(Debug, Clone)]
pub struct LongPress {
    pub touches_required: usize,
    pub taps_required: usize,
    /// Farthest the fingers may drift before the hold elapses.
    pub allowable_movement: f32,
    pub touch_slop: f32,
    pub double_tap_slop: f32,
    /// Settle delay for the touch count after a pointer-up.
    pub tap_timeout: Duration,
    minimum_press_duration: Duration,
    double_tap_timeout: Duration,
    timeout_grace: Duration,
    touches: usize,
    taps: usize,
    started: bool,
    in_tap_region: bool,
    moved: bool,
    down_focus: Point,
    start_location: Point,
}

impl Default for LongPress {
    fn default() -> Self {
        Self::new()
    }
}

impl LongPress {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        let mut press = Self {
            touches_required: 1,
            taps_required: 1,
            allowable_movement: config.touch_slop,
            touch_slop: config.touch_slop,
            double_tap_slop: config.double_tap_slop,
            tap_timeout: config.tap_timeout,
            minimum_press_duration: config.long_press_timeout,
            double_tap_timeout: config.double_tap_timeout,
            timeout_grace: config.timeout_grace,
            touches: 0,
            taps: 1,
            started: false,
            in_tap_region: false,
            moved: false,
            down_focus: Point::ZERO,
            start_location: Point::ZERO,
        };
        press.set_double_tap_timeout(config.double_tap_timeout);
        press
    }

    #[must_use]
    pub fn with_minimum_press_duration(mut self, duration: Duration) -> Self {
        self.set_minimum_press_duration(duration);
        self
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

    #[inline]
    #[must_use]
    pub fn minimum_press_duration(&self) -> Duration {
        self.minimum_press_duration
    }

    /// Set the hold duration. It never drops below the double-tap gap.
    pub fn set_minimum_press_duration(&mut self, duration: Duration) {
        self.minimum_press_duration = duration;
        self.set_double_tap_timeout(self.double_tap_timeout);
    }

    #[inline]
    #[must_use]
    pub fn double_tap_timeout(&self) -> Duration {
        self.double_tap_timeout
    }

    /// Set the gap allowed between taps. A hold shorter than the gap is
    /// raised to the gap plus grace.
    pub fn set_double_tap_timeout(&mut self, timeout: Duration) {
        self.double_tap_timeout = timeout;
        if timeout > self.minimum_press_duration {
            self.minimum_press_duration = timeout + self.timeout_grace;
        }
    }

    /// Focal point where the hold started.
    #[inline]
    #[must_use]
    pub fn start_location(&self) -> Point {
        self.start_location
    }

    fn fail(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel_all();
        cx.base.began_firing = false;
        self.started = false;
        self.taps = 1;
        cx.set_state(&*self, State::Failed);
    }

    /// End an active press, firing if it was delivering events.
    fn end(&mut self, cx: &mut GestureContext<'_>) {
        let was_firing = cx.has_began_firing_events();
        cx.set_state(&*self, State::Ended);
        if was_firing {
            cx.fire_action(&*self);
        }
        cx.base.began_firing = false;
    }

    fn on_down(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        cx.cancel_all();
        self.in_tap_region = true;
        self.touches = sample.pointer_count();
        self.moved = false;
        if !self.started {
            cx.stop_listening();
            cx.set_state(&*self, State::Possible);
            cx.base.began_firing = false;
            self.taps = 1;
            self.started = true;
        } else {
            self.taps += 1;
            let gap = cx.base.down_location.distance(cx.base.previous_down_location);
            if gap > self.double_tap_slop {
                tracing::debug!(target: "gesturekit::long_press", id = %cx.id, gap, "follow-up tap too far");
                self.fail(cx);
                return;
            }
        }
        if self.taps == self.taps_required {
            cx.schedule_at(sample.timestamp + self.minimum_press_duration, Message::LongPress);
        } else {
            cx.schedule(self.double_tap_timeout, Message::Failed);
        }
        self.down_focus = cx.base.current_location;
        self.start_location = self.down_focus;
    }

    fn on_up(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel(&[Message::Reset, Message::PointerUpSettled, Message::LongPress]);
        if cx.state() == State::Possible && self.started {
            if self.touches != self.touches_required {
                tracing::debug!(target: "gesturekit::long_press", id = %cx.id, touches = self.touches, "wrong touch count on release");
                self.fail(cx);
                cx.post_reset();
            } else if self.taps < self.taps_required {
                cx.cancel(&[Message::Failed]);
                cx.schedule(self.double_tap_timeout, Message::Failed);
            } else {
                tracing::debug!(target: "gesturekit::long_press", id = %cx.id, "released before hold elapsed");
                self.fail(cx);
            }
        } else if cx.state().is_active() {
            self.taps = 1;
            self.started = false;
            self.end(cx);
            cx.post_reset();
        } else {
            self.started = false;
            cx.post_reset();
        }
    }

    fn on_hold_elapsed(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel(&[Message::Failed]);
        if !(cx.state() == State::Possible && self.started) {
            return;
        }
        if self.touches == self.touches_required && cx.should_begin(&*self) {
            cx.set_state(&*self, State::Began);
            if cx.resolve_trigger(&*self) == Resolution::Failed {
                self.started = false;
                self.taps = 1;
            }
        } else {
            self.fail(cx);
        }
    }
}

impl GestureBehavior for LongPress {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::LongPress(self)
    }

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        let state = cx.state();
        let tracking = self.started && state == State::Possible;
        let location = cx.base.current_location;
        match sample.phase {
            Phase::Down => self.on_down(cx, sample),
            Phase::PointerDown { .. } if tracking => {
                cx.cancel(&[Message::PointerUpSettled]);
                self.touches = sample.pointer_count();
                if self.touches > self.touches_required {
                    tracing::debug!(target: "gesturekit::long_press", id = %cx.id, touches = self.touches, "too many touches");
                    self.fail(cx);
                }
                self.down_focus = location;
                self.start_location = location;
            }
            Phase::PointerDown { .. } if state.is_active() => {
                self.touches = sample.pointer_count();
            }
            Phase::PointerUp { .. } if tracking => {
                cx.cancel(&[Message::PointerUpSettled]);
                self.down_focus = location;
                self.start_location = location;
                let remaining = i64::try_from(self.touches.saturating_sub(1)).unwrap_or(0);
                cx.schedule_with(self.tap_timeout, Message::PointerUpSettled, Some(remaining));
            }
            Phase::PointerUp { .. } if state.is_active() => {
                self.touches = self.touches.saturating_sub(1);
                if self.touches < self.touches_required {
                    self.end(cx);
                }
            }
            Phase::Move if tracking && self.in_tap_region => {
                let distance = location.distance(self.down_focus);
                if distance > self.allowable_movement {
                    tracing::debug!(target: "gesturekit::long_press", id = %cx.id, distance, "moved before hold elapsed");
                    self.in_tap_region = false;
                    self.fail(cx);
                }
            }
            Phase::Move if state == State::Began => {
                if !self.moved && location.distance(self.down_focus) > self.touch_slop {
                    self.moved = true;
                    if cx.has_began_firing_events() {
                        cx.set_state(&*self, State::Changed);
                        cx.fire_action(&*self);
                    }
                }
            }
            Phase::Move if state == State::Changed => {
                cx.set_state(&*self, State::Changed);
                cx.fire_action(&*self);
            }
            Phase::Up => self.on_up(cx),
            Phase::Cancel => {
                self.started = false;
                self.taps = 1;
                cx.cancel_stream(&*self);
            }
            Phase::PointerDown { .. } | Phase::PointerUp { .. } | Phase::Move => {}
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, payload: Option<i64>) {
        match message {
            Message::Reset => {
                if !cx.state().is_active() {
                    self.started = false;
                    cx.soft_reset(&*self);
                }
            }
            Message::Failed => {
                if self.started && cx.state() == State::Possible {
                    self.fail(cx);
                }
            }
            Message::PointerUpSettled => {
                if self.started {
                    self.touches = payload.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
                }
            }
            Message::LongPress => self.on_hold_elapsed(cx),
        }
    }

    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>) {
        cx.fire_if_allowed(&*self);
        if self.moved && cx.has_began_firing_events() {
            cx.set_state(&*self, State::Changed);
        }
    }

    fn on_required_recognized(&mut self, _cx: &mut GestureContext<'_>) {
        self.started = false;
        self.taps = 1;
    }

    fn reset(&mut self) {
        self.touches = 0;
        self.taps = 1;
        self.started = false;
        self.in_tap_region = false;
        self.moved = false;
        self.down_focus = Point::ZERO;
        self.start_location = Point::ZERO;
    }

    fn continues_sequence(&self) -> bool {
        self.started
    }

    fn sync(&self, cx: &mut GestureContext<'_>) {
        cx.base.number_of_touches = self.touches;
        cx.base.touch_active = self.started || cx.base.state.is_active();
    }
}
