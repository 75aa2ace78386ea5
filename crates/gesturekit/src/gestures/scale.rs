#![forbid(unsafe_code)]

//! Span-based scale estimation over a multi-contact stream.
//!
//! [`ScaleDetector`] turns pointer samples into begin/scale/end updates. The
//! span is the diameter of the circle whose radius is the average distance
//! of the remaining contacts from their focal point, so it grows as fingers
//! spread apart and shrinks as they pinch together.
//!
//! # Invariants
//!
//! 1. Any change to the contact set ends an in-progress scale and re-bases
//!    the initial span, so adding a finger never reads as a jump in scale.
//! 2. A scale begins only once the span reaches `min_span` and either
//!    continues a scale that the contact change interrupted, or has moved
//!    more than `span_slop` away from the span at the last contact change.
//! 3. `scale_factor` is `current / previous` for the latest move while in
//!    progress; `previous` tracks `current` after every move.
//!
//! # Quick scale
//!
//! With `quick_scale` on, a double tap anchors the focal point where the
//! second tap went down; dragging the held finger then scales around that
//! anchor using only the vertical span.

use gesturekit_core::{Duration, GestureConfig, Instant, Phase, Point, PointerSample};

/// Weight of the span change in quick-scale mode.
const QUICK_SCALE_FACTOR: f32 = 0.5;

/// What one sample did to the scale gesture. A single sample may end the
/// previous scale and begin a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleUpdate {
    pub ended: bool,
    pub began: bool,
    pub scaled: bool,
}

/// Single-contact tap bookkeeping for quick-scale detection.
#[derive(Debug, Clone, Copy, Default)]
struct TapTrace {
    down: Option<(Instant, Point)>,
    /// Stayed a single contact within the touch slop.
    clean: bool,
    last_tap: Option<(Instant, Point)>,
}

#[derive(Debug, Clone)]
pub struct ScaleDetector {
    /// Smallest span at which a scale may begin.
    pub min_span: f32,
    /// Span change needed before a scale begins.
    pub span_slop: f32,
    pub quick_scale: bool,
    pub touch_slop: f32,
    pub double_tap_timeout: Duration,
    pub double_tap_slop: f32,
    focus: Point,
    count: usize,
    current_span: f32,
    current_span_x: f32,
    current_span_y: f32,
    previous_span: f32,
    previous_span_x: f32,
    previous_span_y: f32,
    initial_span: f32,
    event_time: Option<Instant>,
    prev_time: Option<Instant>,
    factor: f32,
    time_delta: Duration,
    in_progress: bool,
    anchor: Option<Point>,
    anchored_above: bool,
    taps: TapTrace,
}

impl Default for ScaleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            min_span: config.min_scaling_span,
            span_slop: config.span_slop(),
            quick_scale: false,
            touch_slop: config.touch_slop,
            double_tap_timeout: config.double_tap_timeout,
            double_tap_slop: config.double_tap_slop,
            focus: Point::ZERO,
            count: 0,
            current_span: 0.0,
            current_span_x: 0.0,
            current_span_y: 0.0,
            previous_span: 0.0,
            previous_span_x: 0.0,
            previous_span_y: 0.0,
            initial_span: 0.0,
            event_time: None,
            prev_time: None,
            factor: 1.0,
            time_delta: Duration::ZERO,
            in_progress: false,
            anchor: None,
            anchored_above: false,
            taps: TapTrace::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Whether a double tap anchored the current scale.
    #[inline]
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Focal point: the contacts' mean, or the quick-scale anchor.
    #[inline]
    #[must_use]
    pub fn focus(&self) -> Point {
        self.focus
    }

    #[inline]
    #[must_use]
    pub fn number_of_touches(&self) -> usize {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn current_span(&self) -> f32 {
        self.current_span
    }

    #[inline]
    #[must_use]
    pub fn current_span_x(&self) -> f32 {
        self.current_span_x
    }

    #[inline]
    #[must_use]
    pub fn current_span_y(&self) -> f32 {
        self.current_span_y
    }

    #[inline]
    #[must_use]
    pub fn previous_span(&self) -> f32 {
        self.previous_span
    }

    #[inline]
    #[must_use]
    pub fn previous_span_x(&self) -> f32 {
        self.previous_span_x
    }

    #[inline]
    #[must_use]
    pub fn previous_span_y(&self) -> f32 {
        self.previous_span_y
    }

    /// Scale between the previous and the latest applied move.
    #[inline]
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.factor
    }

    /// Time between the previous and the latest applied move.
    #[inline]
    #[must_use]
    pub fn time_delta(&self) -> Duration {
        self.time_delta
    }

    /// Forget the stream, keeping configuration.
    pub fn clear(&mut self) {
        let config = (
            self.min_span,
            self.span_slop,
            self.quick_scale,
            self.touch_slop,
            self.double_tap_timeout,
            self.double_tap_slop,
        );
        *self = Self {
            min_span: config.0,
            span_slop: config.1,
            quick_scale: config.2,
            touch_slop: config.3,
            double_tap_timeout: config.4,
            double_tap_slop: config.5,
            ..Self::new()
        };
    }

    pub fn on_sample(&mut self, sample: &PointerSample) -> ScaleUpdate {
        let mut update = ScaleUpdate::default();
        self.event_time = Some(sample.timestamp);
        if self.quick_scale {
            self.trace_taps(sample);
        }

        let phase = sample.phase;
        let stream_complete = phase.ends_stream();
        if phase == Phase::Down || stream_complete {
            if self.in_progress {
                update.ended = true;
                self.in_progress = false;
                self.initial_span = 0.0;
                self.anchor = None;
            } else if self.anchor.is_some() && stream_complete {
                self.initial_span = 0.0;
                self.anchor = None;
            }
            if stream_complete {
                self.count = 0;
                return update;
            }
        }

        let config_changed = phase.changes_contacts();
        let remaining = sample.focus();
        self.count = remaining.count;
        if remaining.count == 0 {
            return update;
        }

        let focus = match self.anchor {
            Some(anchor) => {
                let primary = sample.contacts.first().map_or(anchor, |c| c.position);
                self.anchored_above = primary.y < anchor.y;
                anchor
            }
            None => remaining.point,
        };

        let (mut dev_x, mut dev_y) = (0.0_f32, 0.0_f32);
        for contact in sample.remaining() {
            dev_x += (contact.position.x - focus.x).abs();
            dev_y += (contact.position.y - focus.y).abs();
        }
        let div = remaining.count as f32;
        let span_x = dev_x / div * 2.0;
        let span_y = dev_y / div * 2.0;
        let span = if self.anchor.is_some() {
            span_y
        } else {
            span_x.hypot(span_y)
        };

        let was_in_progress = self.in_progress;
        self.focus = focus;
        if self.anchor.is_none() && self.in_progress && config_changed {
            update.ended = true;
            self.in_progress = false;
            self.initial_span = span;
        }
        if config_changed {
            self.set_spans(span, span_x, span_y);
            self.initial_span = span;
        }

        let min_span = if self.anchor.is_some() {
            self.span_slop
        } else {
            self.min_span
        };
        if !self.in_progress
            && span >= min_span
            && (was_in_progress || (span - self.initial_span).abs() > self.span_slop)
        {
            self.set_spans(span, span_x, span_y);
            self.prev_time = self.event_time;
            self.factor = 1.0;
            self.time_delta = Duration::ZERO;
            self.in_progress = true;
            update.began = true;
        }

        if phase == Phase::Move {
            self.current_span = span;
            self.current_span_x = span_x;
            self.current_span_y = span_y;
            if self.in_progress {
                self.factor = self.compute_factor();
                self.time_delta = match (self.event_time, self.prev_time) {
                    (Some(now), Some(prev)) => now.saturating_duration_since(prev),
                    _ => Duration::ZERO,
                };
                update.scaled = true;
            }
            self.previous_span = self.current_span;
            self.previous_span_x = self.current_span_x;
            self.previous_span_y = self.current_span_y;
            self.prev_time = self.event_time;
        }
        update
    }

    fn set_spans(&mut self, span: f32, span_x: f32, span_y: f32) {
        self.current_span = span;
        self.previous_span = span;
        self.current_span_x = span_x;
        self.previous_span_x = span_x;
        self.current_span_y = span_y;
        self.previous_span_y = span_y;
    }

    fn compute_factor(&self) -> f32 {
        if self.previous_span <= 0.0 {
            return 1.0;
        }
        let ratio = self.current_span / self.previous_span;
        if self.anchor.is_none() {
            return ratio;
        }
        // Dragging away from the anchor downward zooms in, upward zooms out.
        let grows = (self.anchored_above && self.current_span < self.previous_span)
            || (!self.anchored_above && self.current_span > self.previous_span);
        let diff = (1.0 - ratio).abs() * QUICK_SCALE_FACTOR;
        if grows { 1.0 + diff } else { 1.0 - diff }
    }

    fn trace_taps(&mut self, sample: &PointerSample) {
        let primary = sample.contacts.first().map_or(Point::ZERO, |c| c.position);
        match sample.phase {
            Phase::Down => {
                let double = self.taps.last_tap.is_some_and(|(up_at, first_down)| {
                    sample.timestamp.saturating_duration_since(up_at) <= self.double_tap_timeout
                        && first_down.distance(primary) < self.double_tap_slop
                });
                if double {
                    self.anchor = Some(primary);
                    self.taps.last_tap = None;
                }
                self.taps.down = Some((sample.timestamp, primary));
                self.taps.clean = true;
            }
            Phase::PointerDown { .. } | Phase::Cancel => {
                self.taps.clean = false;
                self.taps.last_tap = None;
            }
            Phase::Move => {
                if let Some((_, at)) = self.taps.down
                    && at.distance(primary) > self.touch_slop
                {
                    self.taps.clean = false;
                }
            }
            Phase::PointerUp { .. } => {}
            Phase::Up => {
                self.taps.last_tap = match self.taps.down {
                    Some((_, at)) if self.taps.clean && self.anchor.is_none() => {
                        Some((sample.timestamp, at))
                    }
                    _ => None,
                };
                self.taps.down = None;
            }
        }
    }
}
