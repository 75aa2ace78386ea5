#![forbid(unsafe_code)]

//! Per-pointer velocity estimation.
//!
//! Each contact keeps a short ring of timestamped positions per axis. The
//! estimate uses the impulse strategy: consecutive segment velocities are
//! folded into an accumulated kinetic energy, which weights recent motion
//! without the overshoot of a least-squares fit.
//!
//! Only samples within [`HORIZON_MS`] of the newest one count, and a gap of
//! more than [`ASSUME_STOPPED_MS`] between two samples cuts the history: the
//! pointer is assumed to have stopped there.

use ahash::AHashMap;
use web_time::Instant;

use crate::event::{Phase, PointerId, PointerSample};
use crate::geometry::Point;

/// Ring size per axis.
const HISTORY_SIZE: usize = 20;

/// Samples older than this (relative to the newest) are ignored.
pub const HORIZON_MS: f32 = 100.0;

/// A gap this long between samples means the pointer stopped.
pub const ASSUME_STOPPED_MS: f32 = 40.0;

/// Velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Speed regardless of direction.
    #[inline]
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Dot product; negative when the two pointers move apart in direction.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Velocity) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Whether either axis is nonzero.
    #[inline]
    #[must_use]
    pub fn is_moving(self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    time_ms: f32,
    position: Point,
}

/// Ring of recent positions for one pointer.
#[derive(Debug, Clone)]
struct Track {
    ring: [Option<Sample>; HISTORY_SIZE],
    head: usize,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            ring: [None; HISTORY_SIZE],
            head: 0,
        }
    }
}

impl Track {
    fn push(&mut self, time_ms: f32, position: Point) {
        self.head = (self.head + 1) % HISTORY_SIZE;
        self.ring[self.head] = Some(Sample { time_ms, position });
    }

    /// Samples inside the horizon, oldest first.
    fn window(&self) -> Vec<Sample> {
        let Some(newest) = self.ring[self.head] else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(HISTORY_SIZE);
        let mut previous = newest;
        let mut index = self.head;
        for _ in 0..HISTORY_SIZE {
            let Some(sample) = self.ring[index] else {
                break;
            };
            let age = newest.time_ms - sample.time_ms;
            let gap = previous.time_ms - sample.time_ms;
            if age > HORIZON_MS || gap > ASSUME_STOPPED_MS {
                break;
            }
            out.push(sample);
            previous = sample;
            index = (index + HISTORY_SIZE - 1) % HISTORY_SIZE;
        }
        out.reverse();
        out
    }

    fn velocity(&self) -> Velocity {
        let window = self.window();
        if window.len() < 2 {
            return Velocity::ZERO;
        }
        let xs: Vec<(f32, f32)> = window.iter().map(|s| (s.time_ms, s.position.x)).collect();
        let ys: Vec<(f32, f32)> = window.iter().map(|s| (s.time_ms, s.position.y)).collect();
        Velocity::new(
            impulse_velocity(&xs) * 1000.0,
            impulse_velocity(&ys) * 1000.0,
        )
    }
}

/// Impulse estimate over `(time_ms, position)` pairs, oldest first.
/// Returns units per millisecond.
fn impulse_velocity(points: &[(f32, f32)]) -> f32 {
    let mut work = 0.0f32;
    for i in 1..points.len() {
        let dt = points[i].0 - points[i - 1].0;
        if dt == 0.0 {
            continue;
        }
        let v_curr = (points[i].1 - points[i - 1].1) / dt;
        let v_prev = kinetic_energy_to_velocity(work);
        work += (v_curr - v_prev) * v_curr.abs();
        if i == 1 {
            work *= 0.5;
        }
    }
    kinetic_energy_to_velocity(work)
}

/// `E = v^2 / 2` with unit mass, keeping the sign.
#[inline]
fn kinetic_energy_to_velocity(kinetic_energy: f32) -> f32 {
    kinetic_energy.signum() * (2.0 * kinetic_energy.abs()).sqrt()
}

/// Tracks every contact of a stream and estimates their velocities.
///
/// Usage mirrors a platform tracker: feed every sample, then call
/// [`compute_current_velocity`](Self::compute_current_velocity) before
/// reading per-pointer results.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    origin: Option<Instant>,
    tracks: AHashMap<PointerId, Track>,
    primary: Option<PointerId>,
    computed: AHashMap<PointerId, Velocity>,
}

impl VelocityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the positions of every contact in `sample`.
    ///
    /// A `Down` sample starts a fresh history.
    pub fn add_sample(&mut self, sample: &PointerSample) {
        if sample.phase == Phase::Down {
            self.clear();
        }
        self.primary = sample.contacts.first().map(|c| c.id);
        for contact in &sample.contacts {
            self.add_point(contact.id, contact.position, sample.timestamp);
        }
    }

    /// Record one position for one pointer.
    pub fn add_point(&mut self, id: PointerId, position: Point, at: Instant) {
        let origin = *self.origin.get_or_insert(at);
        let time_ms = at.saturating_duration_since(origin).as_secs_f32() * 1000.0;
        self.tracks.entry(id).or_default().push(time_ms, position);
        if self.primary.is_none() {
            self.primary = Some(id);
        }
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.origin = None;
        self.tracks.clear();
        self.primary = None;
        self.computed.clear();
    }

    /// Estimate every pointer's velocity, clamped per axis to `max_velocity`.
    pub fn compute_current_velocity(&mut self, max_velocity: f32) {
        let limit = if max_velocity.is_finite() && max_velocity > 0.0 {
            max_velocity
        } else {
            f32::MAX
        };
        self.computed.clear();
        for (id, track) in &self.tracks {
            let v = track.velocity();
            let clamp = |axis: f32| {
                if axis.is_nan() {
                    0.0
                } else {
                    axis.clamp(-limit, limit)
                }
            };
            self.computed.insert(*id, Velocity::new(clamp(v.x), clamp(v.y)));
        }
    }

    /// Last computed velocity of `id`; zero if unknown.
    #[must_use]
    pub fn velocity(&self, id: PointerId) -> Velocity {
        self.computed.get(&id).copied().unwrap_or(Velocity::ZERO)
    }

    /// Last computed velocity of the primary (first listed) contact.
    #[must_use]
    pub fn primary_velocity(&self) -> Velocity {
        self.primary.map_or(Velocity::ZERO, |id| self.velocity(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Contact;
    use web_time::Duration;

    const MS_10: Duration = Duration::from_millis(10);

    fn feed_line(tracker: &mut VelocityTracker, start: Instant, steps: u32, dx: f32, dy: f32) {
        for i in 0..steps {
            let phase = if i == 0 { Phase::Down } else { Phase::Move };
            let p = Contact::new(0, 100.0 + dx * i as f32, 100.0 + dy * i as f32);
            tracker.add_sample(&PointerSample::new(phase, vec![p], start + MS_10 * i));
        }
    }

    #[test]
    fn constant_motion_is_estimated() {
        let mut tracker = VelocityTracker::new();
        // 5 px per 10 ms = 500 px/s.
        feed_line(&mut tracker, Instant::now(), 8, 5.0, 0.0);
        tracker.compute_current_velocity(8000.0);
        let v = tracker.primary_velocity();
        assert!((v.x - 500.0).abs() < 1.0, "vx = {}", v.x);
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn negative_direction_keeps_sign() {
        let mut tracker = VelocityTracker::new();
        feed_line(&mut tracker, Instant::now(), 6, 0.0, -3.0);
        tracker.compute_current_velocity(8000.0);
        assert!(tracker.velocity(PointerId(0)).y < -200.0);
    }

    #[test]
    fn clamps_to_max() {
        let mut tracker = VelocityTracker::new();
        feed_line(&mut tracker, Instant::now(), 6, 200.0, 0.0);
        tracker.compute_current_velocity(1000.0);
        assert_eq!(tracker.primary_velocity().x, 1000.0);
    }

    #[test]
    fn single_sample_is_zero() {
        let mut tracker = VelocityTracker::new();
        feed_line(&mut tracker, Instant::now(), 1, 5.0, 5.0);
        tracker.compute_current_velocity(8000.0);
        assert_eq!(tracker.primary_velocity(), Velocity::ZERO);
    }

    #[test]
    fn long_pause_cuts_history() {
        let mut tracker = VelocityTracker::new();
        let t = Instant::now();
        tracker.add_point(PointerId(0), Point::new(0.0, 0.0), t);
        tracker.add_point(PointerId(0), Point::new(50.0, 0.0), t + MS_10);
        // Stationary sample after a long pause: only it survives.
        tracker.add_point(PointerId(0), Point::new(50.0, 0.0), t + Duration::from_millis(200));
        tracker.compute_current_velocity(8000.0);
        assert_eq!(tracker.velocity(PointerId(0)), Velocity::ZERO);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut tracker = VelocityTracker::new();
        feed_line(&mut tracker, Instant::now(), 6, 5.0, 0.0);
        tracker.clear();
        tracker.compute_current_velocity(8000.0);
        assert_eq!(tracker.primary_velocity(), Velocity::ZERO);
    }

    #[test]
    fn unknown_pointer_is_zero() {
        let tracker = VelocityTracker::new();
        assert_eq!(tracker.velocity(PointerId(9)), Velocity::ZERO);
    }

    #[test]
    fn velocity_helpers() {
        let a = Velocity::new(3.0, 4.0);
        assert!((a.magnitude() - 5.0).abs() < 1e-6);
        assert!(a.dot(Velocity::new(-3.0, -4.0)) < 0.0);
        assert!(a.is_moving());
        assert!(!Velocity::ZERO.is_moving());
    }
}
