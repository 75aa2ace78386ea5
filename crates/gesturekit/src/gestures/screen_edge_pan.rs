#![forbid(unsafe_code)]

//! Drag that starts at one edge of the host surface.
//!
//! Behaves like [`Pan`](super::Pan), with two extra conditions: the stream
//! must touch down within `edge_limit` pixels of `edge`, and the drag must
//! head away from that edge when the slop is crossed.

use gesturekit_core::{GestureConfig, Phase, Point, PointerSample, Velocity};

use crate::context::GestureContext;
use crate::gestures::pan::{PanMotion, end_drag};
use crate::recognizer::{GestureBehavior, GestureRef, Message};
use crate::state::State;

/// An edge of the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RectEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl RectEdge {
    /// The edge a drag along `delta` moves away from, by dominant axis.
    #[must_use]
    pub fn leaving(delta: Point) -> Option<Self> {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 {
                Some(Self::Left)
            } else {
                Some(Self::Right)
            }
        } else if delta.y > 0.0 {
            Some(Self::Top)
        } else if delta.y < 0.0 {
            Some(Self::Bottom)
        } else {
            None
        }
    }
}

/// Size of the host surface, for the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenEdgePan {
    pub edge: RectEdge,
    /// Width of the band along `edge` where a stream may start.
    pub edge_limit: f32,
    pub bounds: SurfaceSize,
    pub minimum_number_of_touches: usize,
    pub maximum_number_of_touches: usize,
    pub touch_slop: f32,
    pub maximum_fling_velocity: f32,
    started: bool,
    motion: PanMotion,
}

impl ScreenEdgePan {
    #[must_use]
    pub fn new(edge: RectEdge, bounds: SurfaceSize) -> Self {
        Self::with_config(edge, bounds, &GestureConfig::default())
    }

    #[must_use]
    pub fn with_config(edge: RectEdge, bounds: SurfaceSize, config: &GestureConfig) -> Self {
        Self {
            edge,
            edge_limit: config.screen_edge_limit,
            bounds,
            minimum_number_of_touches: 1,
            maximum_number_of_touches: usize::MAX,
            touch_slop: config.touch_slop,
            maximum_fling_velocity: f32::MAX,
            started: false,
            motion: PanMotion::default(),
        }
    }

    /// Whether a surface-absolute point lies in the band along `edge`.
    #[must_use]
    pub fn in_edge_band(&self, raw: Point) -> bool {
        match self.edge {
            RectEdge::Left => raw.x <= self.edge_limit,
            RectEdge::Right => raw.x >= self.bounds.width - self.edge_limit,
            RectEdge::Top => raw.y <= self.edge_limit,
            RectEdge::Bottom => raw.y >= self.bounds.height - self.edge_limit,
        }
    }

    #[inline]
    #[must_use]
    pub fn translation(&self) -> Point {
        self.motion.translation
    }

    #[inline]
    #[must_use]
    pub fn scroll(&self) -> Point {
        self.motion.scroll
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.motion.velocity
    }

    #[inline]
    #[must_use]
    pub fn start_location(&self) -> Point {
        self.motion.start_location
    }

    fn in_range(&self, count: usize) -> bool {
        (self.minimum_number_of_touches..=self.maximum_number_of_touches).contains(&count)
    }
}

impl GestureBehavior for ScreenEdgePan {
    fn gesture_ref(&self) -> GestureRef<'_> {
        GestureRef::ScreenEdgePan(self)
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
                self.motion.start(focus, sample);
                cx.base.began_firing = false;
                if self.in_edge_band(sample.raw) {
                    cx.set_state(&*self, State::Possible);
                } else {
                    tracing::debug!(
                        target: "gesturekit::screen_edge_pan",
                        id = %cx.id,
                        edge = ?self.edge,
                        x = sample.raw.x,
                        y = sample.raw.y,
                        "down outside edge band"
                    );
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::PointerDown { .. } => {
                self.motion.rebase(focus);
                self.motion.record(sample);
                if state == State::Possible && count > self.maximum_number_of_touches {
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::PointerUp { .. } => {
                self.motion.rebase(focus);
                self.motion.split(sample, self.maximum_fling_velocity);
                if state == State::Possible && count < self.minimum_number_of_touches {
                    cx.set_state(&*self, State::Failed);
                }
            }
            Phase::Move => {
                self.motion.record(sample);
                if state == State::Possible && !self.started {
                    let delta = focus - self.motion.down_focus;
                    if delta.length() <= self.touch_slop || count < self.minimum_number_of_touches {
                        return;
                    }
                    self.motion.advance(focus, self.maximum_fling_velocity);
                    self.started = true;
                    let heading = RectEdge::leaving(delta);
                    if self.in_range(count)
                        && heading == Some(self.edge)
                        && cx.should_begin(&*self)
                    {
                        cx.set_state(&*self, State::Began);
                        cx.resolve_trigger(&*self);
                    } else {
                        tracing::debug!(
                            target: "gesturekit::screen_edge_pan",
                            id = %cx.id,
                            ?heading,
                            count,
                            "drag does not leave the edge"
                        );
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
        self.motion.clear();
    }
}
