#![forbid(unsafe_code)]

//! Discrete swipe recognizer.
//!
//! A swipe is a quick, straight flick: the contacts must leave the touch
//! slop within `maximum_touch_slop_time` of the `Down`, heading in one of the
//! allowed directions, and cover `minimum_swipe_distance` at fling speed
//! within `maximum_touch_fling_time`.
//!
//! # Failure Modes
//!
//! - Wrong number of contacts: `Failed`.
//! - Slop left too late, or the swipe not completed in time: `Failed`.
//! - Moving fast in a direction outside the mask: `Failed`.
//!
//! A contact that creeps out of the slop with no measurable velocity is not
//! a failure; the slop region is re-centred on it instead.

use bitflags::bitflags;
use gesturekit_core::{
    Duration, GestureConfig, Instant, Phase, Point, PointerSample, Velocity, VelocityTracker,
};

use crate::context::GestureContext;
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

bitflags! {
    /// Directions a swipe may travel in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SwipeDirection: u8 {
        const RIGHT = 1 << 1;
        const LEFT  = 1 << 2;
        const UP    = 1 << 3;
        const DOWN  = 1 << 4;
    }
}

impl Default for SwipeDirection {
    fn default() -> Self {
        Self::RIGHT
    }
}

impl SwipeDirection {
    /// Direction of `delta` along its dominant axis, when both the distance
    /// and the speed along that axis exceed their thresholds.
    #[must_use]
    pub fn of(delta: Point, velocity: Velocity, min_distance: f32, min_velocity: f32) -> Option<Self> {
        if delta.x.abs() > delta.y.abs() {
            if delta.x.abs() > min_distance && velocity.x.abs() > min_velocity {
                return Some(if delta.x > 0.0 { Self::RIGHT } else { Self::LEFT });
            }
        } else if delta.y.abs() > min_distance && velocity.y.abs() > min_velocity {
            return Some(if delta.y > 0.0 { Self::DOWN } else { Self::UP });
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct Swipe {
    pub direction: SwipeDirection,
    pub number_of_touches_required: usize,
    pub touch_slop: f32,
    pub minimum_swipe_distance: f32,
    pub minimum_fling_velocity: f32,
    pub maximum_fling_velocity: f32,
    pub maximum_touch_slop_time: Duration,
    pub maximum_touch_fling_time: Duration,
    started: bool,
    down: bool,
    down_time: Option<Instant>,
    start_focus: Point,
    down_focus: Point,
    translation: Point,
    velocity: Velocity,
    recognized: Option<SwipeDirection>,
    tracker: VelocityTracker,
}

impl Default for Swipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Swipe {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            direction: SwipeDirection::default(),
            number_of_touches_required: 1,
            touch_slop: config.touch_slop,
            minimum_swipe_distance: config.minimum_swipe_distance(),
            minimum_fling_velocity: config.minimum_fling_velocity,
            maximum_fling_velocity: config.maximum_fling_velocity,
            maximum_touch_slop_time: config.swipe_max_slop_time,
            maximum_touch_fling_time: config.swipe_max_fling_time,
            started: false,
            down: false,
            down_time: None,
            start_focus: Point::ZERO,
            down_focus: Point::ZERO,
            translation: Point::ZERO,
            velocity: Velocity::ZERO,
            recognized: None,
            tracker: VelocityTracker::new(),
        }
    }

    #[must_use]
    pub fn with_direction(mut self, direction: SwipeDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_touches_required(mut self, touches: usize) -> Self {
        self.number_of_touches_required = touches;
        self
    }

    /// Net focal-point displacement since the `Down`.
    #[inline]
    #[must_use]
    pub fn translation(&self) -> Point {
        self.translation
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Direction of the last recognized swipe.
    #[inline]
    #[must_use]
    pub fn recognized_direction(&self) -> Option<SwipeDirection> {
        self.recognized
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.down_time
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t))
    }

    fn fail(&mut self, cx: &mut GestureContext<'_>, reason: &'static str) {
        tracing::debug!(target: "gesturekit::swipe", id = %cx.id, reason, "swipe failed");
        self.started = false;
        cx.set_state(&*self, State::Failed);
    }

    /// Leaving the slop: decide whether this can still become a swipe.
    fn leave_slop(&mut self, cx: &mut GestureContext<'_>, focus: Point, now: Instant) -> bool {
        let count = cx.base.number_of_touches;
        if count != self.number_of_touches_required {
            self.fail(cx, "touch count");
            return false;
        }
        if self.elapsed(now) > self.maximum_touch_slop_time {
            self.fail(cx, "slop time exceeded");
            return false;
        }
        if !self.velocity.is_moving() {
            self.down_focus = focus;
            return false;
        }
        let delta = focus - self.down_focus;
        match SwipeDirection::of(delta, self.velocity, 0.0, self.minimum_fling_velocity) {
            Some(direction) if self.direction.contains(direction) => {
                self.started = true;
                true
            }
            _ => {
                self.fail(cx, "direction");
                false
            }
        }
    }

    fn fling(&mut self, cx: &mut GestureContext<'_>, focus: Point, now: Instant) {
        if self.elapsed(now) > self.maximum_touch_fling_time {
            self.fail(cx, "fling time exceeded");
            return;
        }
        let delta = focus - self.down_focus;
        let Some(direction) = SwipeDirection::of(
            delta,
            self.velocity,
            self.minimum_swipe_distance,
            self.minimum_fling_velocity,
        ) else {
            return;
        };
        if !self.direction.contains(direction) {
            self.fail(cx, "direction");
            return;
        }
        self.started = false;
        self.recognized = Some(direction);
        if cx.should_begin(&*self) {
            // The reset waits for the release.
            cx.set_state(&*self, State::Ended);
            cx.resolve_trigger(&*self);
        } else {
            cx.set_state(&*self, State::Failed);
        }
    }
}

impl GestureBehavior for Swipe {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::Swipe(self)
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
                self.down = true;
                self.down_time = Some(sample.timestamp);
                self.start_focus = focus;
                self.down_focus = focus;
                self.translation = Point::ZERO;
                self.velocity = Velocity::ZERO;
                self.recognized = None;
                self.tracker.clear();
                self.tracker.add_sample(sample);
                cx.base.began_firing = false;
                cx.set_state(&*self, State::Possible);
            }
            Phase::PointerDown { .. } => {
                self.down_focus = focus;
                self.tracker.add_sample(sample);
                if state == State::Possible
                    && !self.started
                    && count > self.number_of_touches_required
                {
                    self.fail(cx, "too many touches");
                }
            }
            Phase::PointerUp { .. } => {
                self.down_focus = focus;
                if state == State::Possible && count < self.number_of_touches_required {
                    self.fail(cx, "too few touches");
                }
            }
            Phase::Move => {
                if state != State::Possible {
                    return;
                }
                self.tracker.add_sample(sample);
                self.tracker
                    .compute_current_velocity(self.maximum_fling_velocity);
                self.velocity = self.tracker.primary_velocity();
                self.translation = focus - self.start_focus;
                if !self.started {
                    if focus.distance(self.down_focus) <= self.touch_slop {
                        return;
                    }
                    if !self.leave_slop(cx, focus, sample.timestamp) {
                        return;
                    }
                }
                self.fling(cx, focus, sample.timestamp);
            }
            Phase::Up => {
                self.down = false;
                self.started = false;
                if !cx.is_listening() {
                    cx.post_reset();
                }
            }
            Phase::Cancel => {
                self.down = false;
                self.started = false;
                cx.cancel_stream(&*self);
            }
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, _payload: Option<i64>) {
        if message == Message::Reset && cx.state().is_finished() && !cx.is_listening() {
            cx.soft_reset(&*self);
        }
    }

    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>) {
        cx.fire_if_allowed(&*self);
        if !self.down {
            cx.soft_reset(&*self);
        }
    }

    fn reset(&mut self) {
        self.started = false;
        self.down = false;
        self.down_time = None;
        self.start_focus = Point::ZERO;
        self.down_focus = Point::ZERO;
        self.translation = Point::ZERO;
        self.velocity = Velocity::ZERO;
        self.recognized = None;
        self.tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arbiter, Recognizer};
    use gesturekit_core::Contact;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn one(phase: Phase, x: f32, y: f32, t: Instant) -> PointerSample {
        PointerSample::new(phase, vec![Contact::new(0, x, y)], t)
    }

    /// A straight flick from (100, 100) by `(dx, dy)` per 10 ms step.
    fn flick(arbiter: &mut Arbiter, t0: Instant, dx: f32, dy: f32, steps: u64) {
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        for i in 1..=steps {
            let k = i as f32;
            arbiter.dispatch(&one(Phase::Move, 100.0 + dx * k, 100.0 + dy * k, at(t0, i * 10)));
        }
        let k = steps as f32;
        arbiter.dispatch(&one(Phase::Up, 100.0 + dx * k, 100.0 + dy * k, at(t0, steps * 10 + 5)));
    }

    #[test]
    fn direction_of_uses_dominant_axis() {
        let v = Velocity::new(500.0, 500.0);
        assert_eq!(
            SwipeDirection::of(Point::new(30.0, 5.0), v, 24.0, 50.0),
            Some(SwipeDirection::RIGHT)
        );
        assert_eq!(
            SwipeDirection::of(Point::new(-3.0, -30.0), v, 24.0, 50.0),
            Some(SwipeDirection::UP)
        );
        assert_eq!(SwipeDirection::of(Point::new(10.0, 0.0), v, 24.0, 50.0), None);
        assert_eq!(
            SwipeDirection::of(Point::new(30.0, 0.0), Velocity::new(10.0, 0.0), 24.0, 50.0),
            None
        );
    }

    #[test]
    fn right_flick_is_recognized() {
        let mut arbiter = Arbiter::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let id = arbiter.add(Recognizer::new(Swipe::new()).on_action(move |view| {
            let direction = view.gesture().as_swipe().and_then(Swipe::recognized_direction);
            sink.borrow_mut().push(direction);
        }));
        let t0 = Instant::now();
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        arbiter.dispatch(&one(Phase::Move, 110.0, 100.0, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Possible));
        arbiter.dispatch(&one(Phase::Move, 130.0, 101.0, at(t0, 20)));
        arbiter.dispatch(&one(Phase::Move, 150.0, 101.0, at(t0, 30)));
        assert_eq!(arbiter.state(id), Some(State::Ended));
        assert_eq!(*fired.borrow(), vec![Some(SwipeDirection::RIGHT)]);

        arbiter.dispatch(&one(Phase::Up, 150.0, 101.0, at(t0, 35)));
        arbiter.advance_to(at(t0, 40));
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }

    #[test]
    fn direction_outside_mask_fails() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Swipe::new()));
        let t0 = Instant::now();
        flick(&mut arbiter, t0, -10.0, 0.0, 4);
        assert_eq!(arbiter.state(id), Some(State::Failed));
    }

    #[test]
    fn mask_accepts_several_directions() {
        let mut arbiter = Arbiter::new();
        let swipe = Swipe::new().with_direction(SwipeDirection::UP | SwipeDirection::DOWN);
        let id = arbiter.add(Recognizer::new(swipe));
        let t0 = Instant::now();
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        for i in 1..=4u64 {
            arbiter.dispatch(&one(Phase::Move, 100.0, 100.0 + 12.0 * i as f32, at(t0, i * 10)));
        }
        assert_eq!(arbiter.state(id), Some(State::Ended));
        let direction = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_swipe())
            .and_then(Swipe::recognized_direction);
        assert_eq!(direction, Some(SwipeDirection::DOWN));
    }

    #[test]
    fn slow_start_fails() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Swipe::new()));
        let t0 = Instant::now();
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        arbiter.dispatch(&one(Phase::Move, 102.0, 100.0, at(t0, 90)));
        arbiter.dispatch(&one(Phase::Move, 120.0, 100.0, at(t0, 160)));
        assert_eq!(arbiter.state(id), Some(State::Failed));
    }

    #[test]
    fn slow_fling_fails() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Swipe::new()));
        let t0 = Instant::now();
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        arbiter.dispatch(&one(Phase::Move, 110.0, 100.0, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Possible));
        arbiter.dispatch(&one(Phase::Move, 112.0, 100.0, at(t0, 200)));
        arbiter.dispatch(&one(Phase::Move, 160.0, 100.0, at(t0, 320)));
        assert_eq!(arbiter.state(id), Some(State::Failed));
    }

    #[test]
    fn extra_finger_fails() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Swipe::new()));
        let t0 = Instant::now();
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        arbiter.dispatch(&PointerSample::new(
            Phase::PointerDown { index: 1 },
            vec![Contact::new(0, 100.0, 100.0), Contact::new(1, 150.0, 100.0)],
            at(t0, 5),
        ));
        assert_eq!(arbiter.state(id), Some(State::Failed));
    }

    #[test]
    fn two_finger_swipe() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Swipe::new().with_touches_required(2)));
        let t0 = Instant::now();
        let both = |phase, x: f32, t| {
            PointerSample::new(
                phase,
                vec![Contact::new(0, x, 100.0), Contact::new(1, x, 160.0)],
                t,
            )
        };
        arbiter.dispatch(&one(Phase::Down, 100.0, 100.0, t0));
        arbiter.dispatch(&both(Phase::PointerDown { index: 1 }, 100.0, at(t0, 5)));
        for i in 1..=4u64 {
            arbiter.dispatch(&both(Phase::Move, 100.0 + 12.0 * i as f32, at(t0, 5 + i * 10)));
        }
        assert_eq!(arbiter.state(id), Some(State::Ended));
    }

    #[test]
    fn swipe_waits_for_required_failure() {
        let mut arbiter = Arbiter::new();
        let fired = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&fired);
        // Added first, so it reaches its trigger state while `other` is
        // still undecided.
        let id = arbiter.add(Recognizer::new(Swipe::new()).on_action(move |_| {
            *sink.borrow_mut() += 1;
        }));
        let other = arbiter.add(Recognizer::new(Swipe::new()));
        // `other` vetoes itself, so its failure releases `id`.
        arbiter.set_should_begin(move |view| view.id() != other);
        assert!(arbiter.require_failure_of(id, Some(other)).is_ok());
        let t0 = Instant::now();
        flick(&mut arbiter, t0, 12.0, 0.0, 4);
        assert_eq!(arbiter.state(other), Some(State::Failed));
        assert_eq!(arbiter.state(id), Some(State::Ended));
        assert_eq!(*fired.borrow(), 1);
    }
}
