#![forbid(unsafe_code)]

//! The recognizer record: shared bookkeeping, the kind-specific algorithm,
//! and the two listener slots.
//!
//! A [`Recognizer`] is built by the host, configured, and handed to an
//! [`Arbiter`](crate::Arbiter), which owns it from then on and returns a
//! [`RecognizerId`]. Listeners observe it through a borrowed
//! [`GestureView`].
//!
//! # Invariants
//!
//! 1. Setting the state always overwrites it, but listeners and dependents
//!    are only notified when the value changes or the new value is
//!    [`State::Changed`].
//! 2. The action listener only runs while the began-firing flag is set.
//! 3. Configuration can only be edited while the recognizer is idle: in
//!    [`State::Possible`] with no contact sequence in progress.

use std::any::Any;
use std::fmt;

use gesturekit_core::{Instant, Phase, Point, PointerSample};

use crate::context::{GestureContext, Requirement};
use crate::gestures::{LongPress, Pan, Pinch, Rotate, ScreenEdgePan, Swipe, Tap};
use crate::state::{GestureKind, State};

/// Generational handle of a recognizer inside an arbiter.
///
/// A handle outlives its recognizer harmlessly: once the slot is reused the
/// generation differs and lookups miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecognizerId {
    index: u32,
    generation: u32,
}

impl RecognizerId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RecognizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}v{}", self.index, self.generation)
    }
}

/// Deferred messages a recognizer can schedule for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    /// Return to `Possible` after a finished cycle.
    Reset,
    /// Give up: a wait window elapsed.
    Failed,
    /// The touch count after a pointer-up has settled; payload is the count.
    PointerUpSettled,
    /// A hold duration elapsed.
    LongPress,
}

/// Called when the recognizer fires its action.
pub type ActionListener = Box<dyn FnMut(&GestureView<'_>)>;

/// Called with `(view, old, new)` on every notified transition.
pub type StateListener = Box<dyn FnMut(&GestureView<'_>, State, State)>;

#[derive(Default)]
pub(crate) struct Listeners {
    pub(crate) action: Option<ActionListener>,
    pub(crate) state: Option<StateListener>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("action", &self.action.is_some())
            .field("state", &self.state.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Shared bookkeeping
// ---------------------------------------------------------------------------

/// Fields every recognizer kind carries.
pub struct RecognizerBase {
    pub(crate) kind: GestureKind,
    pub(crate) state: State,
    pub(crate) enabled: bool,
    pub(crate) cancels_touches_in_view: bool,
    pub(crate) tag: Option<Box<dyn Any>>,
    pub(crate) require_failure_of: Option<RecognizerId>,
    pub(crate) began_firing: bool,
    /// A contact sequence (or a multi-tap sequence) is in progress.
    pub(crate) touch_active: bool,
    /// `should_receive` refused the current contact sequence.
    pub(crate) declined: bool,
    pub(crate) number_of_touches: usize,
    pub(crate) down_location: Point,
    pub(crate) previous_down_location: Point,
    pub(crate) down_time: Option<Instant>,
    pub(crate) previous_down_time: Option<Instant>,
    pub(crate) current_location: Point,
}

impl RecognizerBase {
    fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            state: State::Possible,
            enabled: true,
            cancels_touches_in_view: true,
            tag: None,
            require_failure_of: None,
            began_firing: false,
            touch_active: false,
            declined: false,
            number_of_touches: 0,
            down_location: Point::ZERO,
            previous_down_location: Point::ZERO,
            down_time: None,
            previous_down_time: None,
            current_location: Point::ZERO,
        }
    }

    /// Pre-processing shared by every kind.
    pub(crate) fn track(&mut self, sample: &PointerSample) {
        if sample.phase == Phase::Down {
            self.previous_down_location = self.down_location;
            self.previous_down_time = self.down_time;
            self.down_location = sample.contacts.first().map_or(Point::ZERO, |c| c.position);
            self.down_time = Some(sample.timestamp);
            self.touch_active = true;
            self.declined = false;
        }
        let focus = sample.focus();
        self.current_location = focus.point;
        self.number_of_touches = focus.count;
        if sample.phase.ends_stream() {
            self.touch_active = false;
        }
    }

    pub(crate) fn clear_transient(&mut self) {
        self.began_firing = false;
        self.touch_active = false;
        self.declined = false;
        self.number_of_touches = 0;
        self.down_location = Point::ZERO;
        self.previous_down_location = Point::ZERO;
        self.down_time = None;
        self.previous_down_time = None;
        self.current_location = Point::ZERO;
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn in_state(&self, states: &[State]) -> bool {
        states.contains(&self.state)
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn cancels_touches_in_view(&self) -> bool {
        self.cancels_touches_in_view
    }

    #[inline]
    #[must_use]
    pub fn require_failure_of(&self) -> Option<RecognizerId> {
        self.require_failure_of
    }

    /// Whether this recognizer is currently delivering its gesture.
    ///
    /// Discrete kinds count only once `Ended`; continuous kinds while
    /// `Began` or `Changed`.
    #[must_use]
    pub fn has_began_firing_events(&self) -> bool {
        if !self.began_firing {
            return false;
        }
        if self.kind.is_continuous() {
            self.state.is_active()
        } else {
            self.state == State::Ended
        }
    }

    /// Whether a contact sequence is in progress.
    #[inline]
    #[must_use]
    pub fn touch_active(&self) -> bool {
        self.touch_active
    }

    #[inline]
    #[must_use]
    pub fn number_of_touches(&self) -> usize {
        self.number_of_touches
    }

    #[inline]
    #[must_use]
    pub fn down_location(&self) -> Point {
        self.down_location
    }

    #[inline]
    #[must_use]
    pub fn previous_down_location(&self) -> Point {
        self.previous_down_location
    }

    #[inline]
    #[must_use]
    pub fn down_time(&self) -> Option<Instant> {
        self.down_time
    }

    #[inline]
    #[must_use]
    pub fn previous_down_time(&self) -> Option<Instant> {
        self.previous_down_time
    }

    /// Focal point of the contacts that remain down.
    #[inline]
    #[must_use]
    pub fn current_location(&self) -> Point {
        self.current_location
    }

    /// The host's tag, if it has type `T`.
    #[must_use]
    pub fn tag<T: Any>(&self) -> Option<&T> {
        self.tag.as_deref().and_then(|tag| tag.downcast_ref())
    }
}

impl fmt::Debug for RecognizerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognizerBase")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("tagged", &self.tag.is_some())
            .field("require_failure_of", &self.require_failure_of)
            .field("began_firing", &self.began_firing)
            .field("touch_active", &self.touch_active)
            .field("number_of_touches", &self.number_of_touches)
            .field("current_location", &self.current_location)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Kind dispatch
// ---------------------------------------------------------------------------

/// The algorithm of a recognizer, with its configuration and transient
/// measurements.
#[derive(Debug, Clone)]
pub enum Gesture {
    Tap(Tap),
    LongPress(LongPress),
    Pan(Pan),
    Pinch(Pinch),
    Rotate(Rotate),
    Swipe(Swipe),
    ScreenEdgePan(ScreenEdgePan),
}

/// Borrowed form of [`Gesture`] handed to listeners.
#[derive(Debug, Clone, Copy)]
pub enum GestureRef<'a> {
    Tap(&'a Tap),
    LongPress(&'a LongPress),
    Pan(&'a Pan),
    Pinch(&'a Pinch),
    Rotate(&'a Rotate),
    Swipe(&'a Swipe),
    ScreenEdgePan(&'a ScreenEdgePan),
}

macro_rules! with_gesture {
    ($gesture:expr, $g:ident => $body:expr) => {
        match $gesture {
            Gesture::Tap($g) => $body,
            Gesture::LongPress($g) => $body,
            Gesture::Pan($g) => $body,
            Gesture::Pinch($g) => $body,
            Gesture::Rotate($g) => $body,
            Gesture::Swipe($g) => $body,
            Gesture::ScreenEdgePan($g) => $body,
        }
    };
}

macro_rules! gesture_accessors {
    ($($variant:ident => $as_ref:ident, $as_mut:ident;)*) => {
        impl Gesture {
            $(
                #[must_use]
                pub fn $as_ref(&self) -> Option<&$variant> {
                    match self {
                        Self::$variant(g) => Some(g),
                        _ => None,
                    }
                }

                pub fn $as_mut(&mut self) -> Option<&mut $variant> {
                    match self {
                        Self::$variant(g) => Some(g),
                        _ => None,
                    }
                }
            )*
        }

        impl<'a> GestureRef<'a> {
            $(
                #[must_use]
                pub fn $as_ref(self) -> Option<&'a $variant> {
                    match self {
                        Self::$variant(g) => Some(g),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$variant> for Gesture {
                fn from(g: $variant) -> Self {
                    Self::$variant(g)
                }
            }
        )*
    };
}

gesture_accessors! {
    Tap => as_tap, as_tap_mut;
    LongPress => as_long_press, as_long_press_mut;
    Pan => as_pan, as_pan_mut;
    Pinch => as_pinch, as_pinch_mut;
    Rotate => as_rotate, as_rotate_mut;
    Swipe => as_swipe, as_swipe_mut;
    ScreenEdgePan => as_screen_edge_pan, as_screen_edge_pan_mut;
}

impl Gesture {
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.as_gesture_ref().kind()
    }

    #[must_use]
    pub fn as_gesture_ref(&self) -> GestureRef<'_> {
        with_gesture!(self, g => g.gesture_ref())
    }

    /// Deliver one sample. Returns whether the sample was consumed.
    pub(crate) fn handle_event(
        &mut self,
        cx: &mut GestureContext<'_>,
        sample: &PointerSample,
    ) -> bool {
        if !cx.base.enabled {
            return false;
        }
        cx.base.track(sample);
        with_gesture!(self, g => {
            if sample.phase == Phase::Down && !g.continues_sequence() && !cx.should_receive(&*g) {
                cx.base.declined = true;
                tracing::debug!(
                    target: "gesturekit::recognizer",
                    id = %cx.id,
                    kind = %cx.base.kind,
                    "should_receive vetoed contact sequence"
                );
            }
            if !cx.base.declined {
                g.on_event(cx, sample);
                g.sync(cx);
            }
        });
        // A stream that ended with nothing claimed settles the requirement
        // of every dependent that deferred on this one.
        if sample.phase.ends_stream() && cx.base.state == State::Possible && !cx.base.touch_active {
            cx.notify_idle();
        }
        !cx.base.declined && cx.base.cancels_touches_in_view
    }

    pub(crate) fn handle_timer(
        &mut self,
        cx: &mut GestureContext<'_>,
        message: Message,
        payload: Option<i64>,
    ) {
        if !cx.base.enabled {
            return;
        }
        with_gesture!(self, g => {
            g.on_timer(cx, message, payload);
            g.sync(cx);
        });
    }

    /// React to a transition of the recognizer this one waits on.
    pub(crate) fn handle_required_state(&mut self, cx: &mut GestureContext<'_>, required: State) {
        if !cx.is_listening() {
            return;
        }
        let trigger = cx.base.kind.trigger_state();
        let released = match required {
            State::Failed => true,
            State::Possible => cx.requirement() == Requirement::Satisfied,
            _ => false,
        };
        with_gesture!(self, g => {
            if released {
                if cx.base.state == trigger {
                    cx.stop_listening();
                    g.on_required_failed(cx);
                }
            } else if required.is_recognized()
                && cx.base.in_state(&[State::Possible, trigger])
            {
                cx.stop_listening();
                cx.cancel_all();
                cx.base.began_firing = false;
                cx.set_state(&*g, State::Failed);
                g.on_required_recognized(cx);
            }
            g.sync(cx);
        });
    }

    /// Return to a pristine `Possible` recognizer.
    pub(crate) fn reset(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel_all();
        cx.stop_listening();
        cx.base.clear_transient();
        with_gesture!(self, g => {
            g.reset();
            cx.set_state(&*g, State::Possible);
        });
    }
}

impl<'a> GestureRef<'a> {
    #[must_use]
    pub fn kind(self) -> GestureKind {
        match self {
            Self::Tap(_) => GestureKind::Tap,
            Self::LongPress(_) => GestureKind::LongPress,
            Self::Pan(_) => GestureKind::Pan,
            Self::Pinch(_) => GestureKind::Pinch,
            Self::Rotate(_) => GestureKind::Rotate,
            Self::Swipe(_) => GestureKind::Swipe,
            Self::ScreenEdgePan(_) => GestureKind::ScreenEdgePan,
        }
    }
}

/// What each kind implements. The shared wrappers on [`Gesture`] handle
/// enablement, `should_receive`, dependency bookkeeping and full resets.
pub(crate) trait GestureBehavior {
    fn gesture_ref(&self) -> GestureRef<'_>;

    fn on_event(&mut self, cx: &mut GestureContext<'_>, sample: &PointerSample);

    fn on_timer(&mut self, cx: &mut GestureContext<'_>, message: Message, payload: Option<i64>);

    /// The required recognizer failed while this one sat in its trigger state.
    fn on_required_failed(&mut self, cx: &mut GestureContext<'_>);

    /// The required recognizer claimed the gesture; the shared wrapper has
    /// already moved this one to `Failed`.
    fn on_required_recognized(&mut self, _cx: &mut GestureContext<'_>) {}

    /// Zero every transient measurement.
    fn reset(&mut self);

    /// A new `Down` continues a multi-tap sequence instead of starting one.
    fn continues_sequence(&self) -> bool {
        false
    }

    /// Mirror kind-owned bookkeeping into the base after every callback.
    fn sync(&self, _cx: &mut GestureContext<'_>) {}
}

// ---------------------------------------------------------------------------
// Recognizer
// ---------------------------------------------------------------------------

/// A recognizer ready to be added to an arbiter.
pub struct Recognizer {
    pub(crate) base: RecognizerBase,
    pub(crate) gesture: Gesture,
    pub(crate) listeners: Listeners,
}

impl Recognizer {
    #[must_use]
    pub fn new(gesture: impl Into<Gesture>) -> Self {
        let gesture = gesture.into();
        Self {
            base: RecognizerBase::new(gesture.kind()),
            gesture,
            listeners: Listeners::default(),
        }
    }

    /// Attach an arbitrary host value.
    #[must_use]
    pub fn with_tag<T: Any>(mut self, tag: T) -> Self {
        self.set_tag(tag);
        self
    }

    /// Start enabled or disabled. Once added, toggle through the arbiter.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.base.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_cancels_touches_in_view(mut self, cancels: bool) -> Self {
        self.base.cancels_touches_in_view = cancels;
        self
    }

    #[must_use]
    pub fn on_action(mut self, listener: impl FnMut(&GestureView<'_>) + 'static) -> Self {
        self.set_action_listener(listener);
        self
    }

    #[must_use]
    pub fn on_state_change(
        mut self,
        listener: impl FnMut(&GestureView<'_>, State, State) + 'static,
    ) -> Self {
        self.set_state_listener(listener);
        self
    }

    /// Replace the action listener.
    pub fn set_action_listener(&mut self, listener: impl FnMut(&GestureView<'_>) + 'static) {
        self.listeners.action = Some(Box::new(listener));
    }

    /// Replace the state listener.
    pub fn set_state_listener(
        &mut self,
        listener: impl FnMut(&GestureView<'_>, State, State) + 'static,
    ) {
        self.listeners.state = Some(Box::new(listener));
    }

    pub fn clear_listeners(&mut self) {
        self.listeners = Listeners::default();
    }

    pub fn set_tag<T: Any>(&mut self, tag: T) {
        self.base.tag = Some(Box::new(tag));
    }

    pub fn clear_tag(&mut self) {
        self.base.tag = None;
    }

    pub fn set_cancels_touches_in_view(&mut self, cancels: bool) {
        self.base.cancels_touches_in_view = cancels;
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &RecognizerBase {
        &self.base
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        self.base.state
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.base.kind
    }

    #[must_use]
    pub fn tag<T: Any>(&self) -> Option<&T> {
        self.base.tag()
    }

    #[inline]
    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Whether configuration may be edited.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.base.state == State::Possible && !self.base.touch_active
    }

    /// Mutable access to the algorithm's configuration, only while idle.
    pub fn gesture_mut(&mut self) -> Option<&mut Gesture> {
        if self.is_idle() {
            Some(&mut self.gesture)
        } else {
            None
        }
    }

    pub(crate) fn view(&self, id: RecognizerId) -> GestureView<'_> {
        GestureView {
            id,
            base: &self.base,
            gesture: self.gesture.as_gesture_ref(),
        }
    }
}

impl fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recognizer")
            .field("base", &self.base)
            .field("gesture", &self.gesture)
            .field("listeners", &self.listeners)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Read-only snapshot of a recognizer, passed to listeners and policies.
#[derive(Debug, Clone, Copy)]
pub struct GestureView<'a> {
    pub(crate) id: RecognizerId,
    pub(crate) base: &'a RecognizerBase,
    pub(crate) gesture: GestureRef<'a>,
}

impl<'a> GestureView<'a> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecognizerId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.base.kind
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        self.base.state
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &'a RecognizerBase {
        self.base
    }

    #[inline]
    #[must_use]
    pub fn gesture(&self) -> GestureRef<'a> {
        self.gesture
    }

    #[must_use]
    pub fn tag<T: Any>(&self) -> Option<&'a T> {
        self.base.tag()
    }

    #[inline]
    #[must_use]
    pub fn number_of_touches(&self) -> usize {
        self.base.number_of_touches
    }

    #[inline]
    #[must_use]
    pub fn current_location(&self) -> Point {
        self.base.current_location
    }

    #[inline]
    #[must_use]
    pub fn has_began_firing_events(&self) -> bool {
        self.base.has_began_firing_events()
    }
}
