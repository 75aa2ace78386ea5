#![forbid(unsafe_code)]

//! Two-finger rotation recognizer.
//!
//! Tracks the line between exactly two contacts, identified by pointer id,
//! and accumulates the shortest signed angle between consecutive positions
//! of that line. The gesture begins once the accumulated rotation exceeds
//! `rotation_threshold`.
//!
//! # Invariants
//!
//! 1. Rotation only accumulates while exactly two contacts are down.
//! 2. Whenever the contact set returns to two, the tracked pair is resolved
//!    again and the reference angle re-based, so swapping a finger never
//!    reads as a rotation. An active gesture keeps its accumulated rotation.
//!
//! # Failure Modes
//!
//! - `should_begin` vetoes the gesture when the threshold is crossed:
//!   `Failed`.

use gesturekit_core::{
    GestureConfig, Instant, Phase, PointerId, PointerSample, normalize_degrees, shortest_angle,
};

use crate::context::GestureContext;
use crate::gestures::pan::end_drag;
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

#[derive(Debug, Clone)]
pub struct Rotate {
    /// Radians of rotation needed before the gesture begins.
    pub rotation_threshold: f32,
    pair: Option<(PointerId, PointerId)>,
    last_angle: f32,
    last_time: Option<Instant>,
    rotation: f32,
    velocity: f32,
    started: bool,
}

impl Default for Rotate {
    fn default() -> Self {
        Self::new()
    }
}

impl Rotate {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            rotation_threshold: config.rotation_threshold,
            pair: None,
            last_angle: 0.0,
            last_time: None,
            rotation: 0.0,
            velocity: 0.0,
            started: false,
        }
    }

    /// Accumulated rotation in radians; positive is clockwise on screen.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Accumulated rotation in degrees, normalized to `[-180, 180]`.
    #[must_use]
    pub fn rotation_degrees(&self) -> f32 {
        normalize_degrees(self.rotation.to_degrees())
    }

    /// Angular speed of the latest move, in radians per second.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Re-resolve the tracked pair after the contact set changed.
    fn resolve_pair(&mut self, sample: &PointerSample, state: State) {
        let mut remaining = sample.remaining();
        self.pair = match (remaining.next(), remaining.next(), remaining.next()) {
            (Some(a), Some(b), None) => {
                self.last_angle = a.position.angle_to(b.position);
                self.last_time = Some(sample.timestamp);
                if state == State::Possible {
                    self.rotation = 0.0;
                }
                Some((a.id, b.id))
            }
            _ => None,
        };
    }

    /// Advance the tracked line; returns the angle swept by this move.
    fn track(&mut self, sample: &PointerSample) -> Option<f32> {
        let (a, b) = self.pair?;
        let p1 = sample.position_of(a)?;
        let p2 = sample.position_of(b)?;
        let angle = p1.angle_to(p2);
        let delta = shortest_angle(self.last_angle, angle);
        self.last_angle = angle;
        self.rotation += delta;
        if let Some(last) = self.last_time {
            let dt = sample.timestamp.saturating_duration_since(last).as_secs_f32();
            if dt > 0.0 {
                self.velocity = delta.abs() / dt;
            }
        }
        self.last_time = Some(sample.timestamp);
        Some(delta)
    }
}

impl GestureBehavior for Rotate {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::Rotate(self)
    }

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample) {
        let state = cx.state();
        match sample.phase {
            Phase::Down => {
                cx.cancel(&[Message::Reset]);
                cx.stop_listening();
                self.started = false;
                self.pair = None;
                self.rotation = 0.0;
                self.velocity = 0.0;
                self.last_time = Some(sample.timestamp);
                cx.base.began_firing = false;
                cx.set_state(&*self, State::Possible);
            }
            Phase::PointerDown { .. } | Phase::PointerUp { .. } => {
                self.resolve_pair(sample, state);
                tracing::trace!(
                    target: "gesturekit::rotate",
                    id = %cx.id,
                    tracking = self.pair.is_some(),
                    "contact set changed"
                );
            }
            Phase::Move => {
                if self.track(sample).is_none() {
                    return;
                }
                if state == State::Possible && !self.started {
                    if self.rotation.abs() <= self.rotation_threshold {
                        return;
                    }
                    self.started = true;
                    if cx.should_begin(&*self) {
                        cx.set_state(&*self, State::Began);
                        cx.resolve_trigger(&*self);
                    } else {
                        cx.set_state(&*self, State::Failed);
                    }
                } else if state.is_active() && cx.has_began_firing_events() {
                    cx.set_state(&*self, State::Changed);
                    cx.fire_action(&*self);
                }
            }
            Phase::Up => {
                if state.is_active() {
                    end_drag(&*self, cx);
                }
                self.started = false;
                self.pair = None;
                cx.post_reset();
            }
            Phase::Cancel => {
                self.started = false;
                self.pair = None;
                cx.cancel_stream(&*self);
            }
        }
    }

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, _payload: Option<i64>) {
        if message == Message::Reset && !cx.state().is_active() {
            self.started = false;
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
        self.pair = None;
        self.last_angle = 0.0;
        self.last_time = None;
        self.rotation = 0.0;
        self.velocity = 0.0;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arbiter, Recognizer};
    use gesturekit_core::{Contact, Duration};
    use std::f32::consts::FRAC_PI_2;

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    /// Two contacts on a circle of radius 50 around (200, 200).
    fn pair(phase: Phase, angle: f32, t: Instant) -> PointerSample {
        let (dx, dy) = (50.0 * angle.cos(), 50.0 * angle.sin());
        PointerSample::new(
            phase,
            vec![
                Contact::new(0, 200.0 - dx, 200.0 - dy),
                Contact::new(1, 200.0 + dx, 200.0 + dy),
            ],
            t,
        )
    }

    fn rotation_of(arbiter: &Arbiter, id: crate::RecognizerId) -> f32 {
        arbiter
            .get(id)
            .and_then(|r| r.gesture().as_rotate())
            .map_or(f32::NAN, Rotate::rotation)
    }

    fn start(arbiter: &mut Arbiter, t0: Instant) {
        arbiter.dispatch(&PointerSample::new(
            Phase::Down,
            vec![Contact::new(0, 150.0, 200.0)],
            t0,
        ));
        arbiter.dispatch(&pair(Phase::PointerDown { index: 1 }, 0.0, at(t0, 5)));
    }

    #[test]
    fn twist_begins_and_accumulates() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Rotate::new()));
        let t0 = Instant::now();
        start(&mut arbiter, t0);

        arbiter.dispatch(&pair(Phase::Move, 0.005, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Possible));

        arbiter.dispatch(&pair(Phase::Move, 0.1, at(t0, 20)));
        assert_eq!(arbiter.state(id), Some(State::Began));

        arbiter.dispatch(&pair(Phase::Move, 0.6, at(t0, 120)));
        assert_eq!(arbiter.state(id), Some(State::Changed));
        assert!((rotation_of(&arbiter, id) - 0.6).abs() < 1e-4);
        let velocity = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_rotate())
            .map_or(0.0, Rotate::velocity);
        assert!((velocity - 5.0).abs() < 1e-2);

        arbiter.dispatch(&pair(Phase::Up, 0.6, at(t0, 130)));
        assert_eq!(arbiter.state(id), Some(State::Ended));
    }

    #[test]
    fn rotation_crosses_the_half_turn() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Rotate::new()));
        let t0 = Instant::now();
        start(&mut arbiter, t0);
        let mut angle = 0.0;
        for step in 1..=8u64 {
            angle += FRAC_PI_2 / 2.0;
            arbiter.dispatch(&pair(Phase::Move, angle, at(t0, 5 + step * 10)));
        }
        // A full turn of the line is accumulated, not wrapped.
        assert!((rotation_of(&arbiter, id) - 2.0 * std::f32::consts::PI).abs() < 1e-3);
        let degrees = arbiter
            .get(id)
            .and_then(|r| r.gesture().as_rotate())
            .map_or(f32::NAN, Rotate::rotation_degrees);
        assert!(degrees.abs() < 1e-2);
    }

    #[test]
    fn single_finger_never_rotates() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Rotate::new()));
        let t0 = Instant::now();
        arbiter.dispatch(&PointerSample::new(
            Phase::Down,
            vec![Contact::new(0, 150.0, 200.0)],
            t0,
        ));
        arbiter.dispatch(&PointerSample::new(
            Phase::Move,
            vec![Contact::new(0, 150.0, 260.0)],
            at(t0, 10),
        ));
        assert_eq!(arbiter.state(id), Some(State::Possible));
        assert_eq!(rotation_of(&arbiter, id), 0.0);
    }

    #[test]
    fn third_finger_pauses_tracking() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Rotate::new()));
        let t0 = Instant::now();
        start(&mut arbiter, t0);
        arbiter.dispatch(&pair(Phase::Move, 0.2, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Began));

        let mut three = pair(Phase::PointerDown { index: 2 }, 0.2, at(t0, 20));
        three.contacts.push(Contact::new(2, 300.0, 300.0));
        arbiter.dispatch(&three);
        let mut moved = pair(Phase::Move, 0.9, at(t0, 30));
        moved.contacts.push(Contact::new(2, 300.0, 300.0));
        arbiter.dispatch(&moved);
        assert!((rotation_of(&arbiter, id) - 0.2).abs() < 1e-4);

        // Back to two: re-based, no jump, still active.
        let mut lifted = pair(Phase::PointerUp { index: 2 }, 0.9, at(t0, 40));
        lifted.contacts.push(Contact::new(2, 300.0, 300.0));
        arbiter.dispatch(&lifted);
        arbiter.dispatch(&pair(Phase::Move, 1.0, at(t0, 50)));
        assert!((rotation_of(&arbiter, id) - 0.3).abs() < 1e-4);
        assert_eq!(arbiter.state(id), Some(State::Changed));
    }

    #[test]
    fn vetoed_rotation_fails_then_recovers() {
        let mut arbiter = Arbiter::new();
        arbiter.set_should_begin(|_| false);
        let id = arbiter.add(Recognizer::new(Rotate::new()));
        let t0 = Instant::now();
        start(&mut arbiter, t0);
        arbiter.dispatch(&pair(Phase::Move, 0.2, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Failed));
        arbiter.dispatch(&pair(Phase::Up, 0.2, at(t0, 20)));
        arbiter.advance_to(at(t0, 21));
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }
}
