#![forbid(unsafe_code)]

//! Two-finger pinch recognizer built on [`ScaleDetector`].
//!
//! The recognizer only arbitrates: the detector decides when a scale begins,
//! advances and ends, and the recognizer maps those updates onto states.
//! `scale` is the running product of every applied scale factor and returns
//! to `1.0` only on an explicit reset.

use gesturekit_core::{Duration, GestureConfig, Phase, PointerSample};

use crate::context::GestureContext;
use crate::gestures::pan::end_drag;
use crate::gestures::scale::{ScaleDetector, ScaleUpdate};
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

#[derive(Debug, Clone)]
pub struct Pinch {
    detector: ScaleDetector,
    scale: f32,
}

impl Default for Pinch {
    fn default() -> Self {
        Self::new()
    }
}

impl Pinch {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            detector: ScaleDetector::with_config(config),
            scale: 1.0,
        }
    }

    /// Scale around a double-tap anchor by dragging the held finger.
    #[must_use]
    pub fn with_quick_scale(mut self, enabled: bool) -> Self {
        self.detector.quick_scale = enabled;
        self
    }

    pub fn set_quick_scale_enabled(&mut self, enabled: bool) {
        self.detector.quick_scale = enabled;
    }

    #[inline]
    #[must_use]
    pub fn detector(&self) -> &ScaleDetector {
        &self.detector
    }

    /// Tunables of the underlying detector.
    #[inline]
    pub fn detector_mut(&mut self) -> &mut ScaleDetector {
        &mut self.detector
    }

    /// Accumulated scale since the last reset.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.detector.scale_factor()
    }

    #[inline]
    #[must_use]
    pub fn current_span(&self) -> f32 {
        self.detector.current_span()
    }

    #[inline]
    #[must_use]
    pub fn current_span_x(&self) -> f32 {
        self.detector.current_span_x()
    }

    #[inline]
    #[must_use]
    pub fn current_span_y(&self) -> f32 {
        self.detector.current_span_y()
    }

    #[inline]
    #[must_use]
    pub fn previous_span(&self) -> f32 {
        self.detector.previous_span()
    }

    #[inline]
    #[must_use]
    pub fn previous_span_x(&self) -> f32 {
        self.detector.previous_span_x()
    }

    #[inline]
    #[must_use]
    pub fn previous_span_y(&self) -> f32 {
        self.detector.previous_span_y()
    }

    #[inline]
    #[must_use]
    pub fn time_delta(&self) -> Duration {
        self.detector.time_delta()
    }

    fn begin(&mut self, cx: &mut GestureContext<'_>) {
        if cx.state() != State::Possible {
            return;
        }
        cx.cancel(&[Message::Reset]);
        if cx.should_begin(&*self) {
            cx.set_state(&*self, State::Began);
            cx.resolve_trigger(&*self);
        } else {
            cx.set_state(&*self, State::Failed);
        }
    }

    fn apply_scale(&mut self, cx: &mut GestureContext<'_>) {
        let state = cx.state();
        if !state.is_active() {
            return;
        }
        self.scale *= self.detector.scale_factor();
        tracing::trace!(
            target: "gesturekit::pinch",
            id = %cx.id,
            scale = self.scale,
            factor = self.detector.scale_factor(),
            "scale"
        );
        if state == State::Changed || cx.has_began_firing_events() {
            cx.set_state(&*self, State::Changed);
            cx.fire_action(&*self);
        }
    }
}

impl GestureBehavior for Pinch {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::Pinch(self)
    }

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        if sample.phase == Phase::Down && cx.state().is_finished() {
            cx.cancel(&[Message::Reset]);
            cx.soft_reset(&*self);
        }

        let ScaleUpdate {
            ended,
            began,
            scaled,
        } = self.detector.on_sample(sample);

        if sample.phase == Phase::Cancel {
            cx.cancel_stream(&*self);
            return;
        }

        // A contact change interrupts and resumes the detector in one sample;
        // an active pinch carries straight through it.
        let continuation = ended && began && cx.state().is_active();
        if ended && !continuation && cx.state().is_active() {
            end_drag(&*self, cx);
            cx.post_reset();
        }
        if began && !continuation {
            self.begin(cx);
        }
        if scaled {
            self.apply_scale(cx);
        }
        if sample.phase == Phase::Up {
            cx.post_reset();
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, _payload: Option<i64>) {
        if message == Message::Reset && !cx.state().is_active() {
            cx.soft_reset(&*self);
        }
    }

    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>) {
        cx.fire_if_allowed(&*self);
    }

    fn reset(&mut self) {
        self.detector.clear();
        self.scale = 1.0;
    }

    fn sync(&self, cx: &mut GestureContext<'_>) {
        cx.base.number_of_touches = self.detector.number_of_touches();
        if self.detector.number_of_touches() > 0 {
            cx.base.current_location = self.detector.focus();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arbiter, Recognizer};
    use gesturekit_core::{Contact, Instant};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn two(phase: Phase, a: f32, b: f32, t: Instant) -> PointerSample {
        PointerSample::new(
            phase,
            vec![Contact::new(0, a, 100.0), Contact::new(1, b, 100.0)],
            t,
        )
    }

    fn one(phase: Phase, x: f32, t: Instant) -> PointerSample {
        PointerSample::new(phase, vec![Contact::new(0, x, 100.0)], t)
    }

    fn spread(arbiter: &mut Arbiter, t0: Instant) {
        arbiter.dispatch(&one(Phase::Down, 100.0, t0));
        arbiter.dispatch(&two(Phase::PointerDown { index: 1 }, 100.0, 140.0, at(t0, 10)));
        arbiter.dispatch(&two(Phase::Move, 90.0, 150.0, at(t0, 20)));
        arbiter.dispatch(&two(Phase::Move, 80.0, 160.0, at(t0, 30)));
    }

    #[test]
    fn spread_scales_and_ends_on_lift() {
        let mut arbiter = Arbiter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = arbiter.add(Recognizer::new(Pinch::new()).on_action(move |view| {
            let scale = view.gesture().as_pinch().map_or(0.0, Pinch::scale);
            sink.borrow_mut().push((view.state(), scale));
        }));
        let t0 = Instant::now();
        spread(&mut arbiter, t0);
        assert_eq!(arbiter.state(id), Some(State::Changed));
        {
            let log = log.borrow();
            assert_eq!(log[0], (State::Began, 1.0));
            assert_eq!(log[1], (State::Changed, 1.0));
            let (state, scale) = log[2];
            assert_eq!(state, State::Changed);
            assert!((scale - 80.0 / 60.0).abs() < 1e-5);
        }

        arbiter.dispatch(&two(Phase::PointerUp { index: 1 }, 80.0, 160.0, at(t0, 40)));
        assert_eq!(arbiter.state(id), Some(State::Ended));
        assert_eq!(log.borrow().last().map(|e| e.0), Some(State::Ended));
        arbiter.dispatch(&one(Phase::Up, 80.0, at(t0, 50)));
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }

    #[test]
    fn scale_accumulates_across_streams() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Pinch::new()));
        let t0 = Instant::now();
        spread(&mut arbiter, t0);
        arbiter.dispatch(&two(Phase::Up, 80.0, 160.0, at(t0, 40)));
        let first = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_pinch())
            .map_or(0.0, Pinch::scale);
        assert!(first > 1.0);

        let t1 = at(t0, 100);
        spread(&mut arbiter, t1);
        let second = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_pinch())
            .map_or(0.0, Pinch::scale);
        assert!(second > first);

        assert!(arbiter.reset_recognizer(id));
        let reset = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_pinch())
            .map_or(0.0, Pinch::scale);
        assert_eq!(reset, 1.0);
    }

    #[test]
    fn third_finger_continues_the_pinch() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Pinch::new()));
        let t0 = Instant::now();
        spread(&mut arbiter, t0);
        let three = PointerSample::new(
            Phase::PointerDown { index: 2 },
            vec![
                Contact::new(0, 80.0, 100.0),
                Contact::new(1, 160.0, 100.0),
                Contact::new(2, 120.0, 180.0),
            ],
            at(t0, 40),
        );
        arbiter.dispatch(&three);
        assert_eq!(arbiter.state(id), Some(State::Changed));
        assert_eq!(arbiter.get(id).map(|r| r.base().number_of_touches()), Some(3));
    }

    #[test]
    fn vetoed_pinch_fails() {
        let mut arbiter = Arbiter::new();
        arbiter.set_should_begin(|view| view.kind() != crate::GestureKind::Pinch);
        let id = arbiter.add(Recognizer::new(Pinch::new()));
        let t0 = Instant::now();
        spread(&mut arbiter, t0);
        assert_eq!(arbiter.state(id), Some(State::Failed));
        arbiter.dispatch(&two(Phase::Up, 80.0, 160.0, at(t0, 40)));
        arbiter.advance_to(at(t0, 41));
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }

    #[test]
    fn cancel_while_pinching() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Pinch::new()));
        let t0 = Instant::now();
        spread(&mut arbiter, t0);
        arbiter.dispatch(&two(Phase::Cancel, 80.0, 160.0, at(t0, 40)));
        assert_eq!(arbiter.state(id), Some(State::Cancelled));
        arbiter.advance_to(at(t0, 41));
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }
}
