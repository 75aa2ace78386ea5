#![forbid(unsafe_code)]

//! The surface a running recognizer sees.
//!
//! The arbiter moves the running recognizer out of its slot and lends it a
//! [`GestureContext`]: its own base and listeners, the timer queue, the
//! failure graph, and read access to every peer. State transitions queue
//! notifications for waiting dependents; the arbiter delivers them once the
//! current callback returns.

use std::collections::VecDeque;

use gesturekit_core::{Duration, Instant, TimerQueue, TimerService};

use crate::arbiter::Policy;
use crate::failure::FailureGraph;
use crate::recognizer::{GestureBehavior, GestureView, Listeners, Message, RecognizerBase, RecognizerId};
use crate::registry::Registry;
use crate::state::State;

/// A notified transition, queued for the recognizer's dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StateChange {
    pub(crate) id: RecognizerId,
    pub(crate) state: State,
}

/// Where the recognizer this one waits on stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requirement {
    /// No requirement, or the required recognizer failed, vanished, or is
    /// idle with no contact sequence in progress.
    Satisfied,
    /// The required recognizer claimed the gesture.
    Blocked,
    /// The required recognizer may still go either way.
    Pending,
}

/// Outcome of reaching the trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The recognizer may proceed; its action fired if the arbiter allowed.
    Proceed,
    /// The required recognizer won; this one is now `Failed`.
    Failed,
    /// Waiting for the required recognizer to settle.
    Deferred,
}

pub(crate) struct GestureContext<'a> {
    pub(crate) id: RecognizerId,
    pub(crate) now: Instant,
    pub(crate) base: &'a mut RecognizerBase,
    pub(crate) listeners: &'a mut Listeners,
    pub(crate) timers: &'a mut TimerQueue<RecognizerId, Message>,
    pub(crate) failures: &'a mut FailureGraph,
    pub(crate) peers: &'a Registry,
    pub(crate) policy: &'a Policy,
    pub(crate) changes: &'a mut VecDeque<StateChange>,
}

impl GestureContext<'_> {
    pub(crate) fn view<'v, G: GestureBehavior>(&'v self, gesture: &'v G) -> GestureView<'v> {
        GestureView {
            id: self.id,
            base: &*self.base,
            gesture: gesture.gesture_ref(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> State {
        self.base.state
    }

    #[inline]
    pub(crate) fn in_state(&self, states: &[State]) -> bool {
        self.base.in_state(states)
    }

    #[inline]
    pub(crate) fn has_began_firing_events(&self) -> bool {
        self.base.has_began_firing_events()
    }

    /// Overwrite the state. Listeners and dependents hear about it when the
    /// value changed or the new value is `Changed`.
    pub(crate) fn set_state<G: GestureBehavior>(&mut self, gesture: &G, new: State) {
        let old = self.base.state;
        self.base.state = new;
        if old == new && new != State::Changed {
            return;
        }
        if old != new {
            tracing::debug!(
                target: "gesturekit::recognizer",
                id = %self.id,
                kind = %self.base.kind,
                from = %old,
                to = %new,
                "state transition"
            );
        }
        if let Some(listener) = self.listeners.state.as_mut() {
            let view = GestureView {
                id: self.id,
                base: &*self.base,
                gesture: gesture.gesture_ref(),
            };
            listener(&view, old, new);
        }
        self.changes.push_back(StateChange {
            id: self.id,
            state: new,
        });
    }

    /// Deliver the action, if began-firing was granted.
    pub(crate) fn fire_action<G: GestureBehavior>(&mut self, gesture: &G) {
        if !self.base.began_firing {
            return;
        }
        tracing::trace!(
            target: "gesturekit::recognizer",
            id = %self.id,
            kind = %self.base.kind,
            state = %self.base.state,
            "action"
        );
        if let Some(listener) = self.listeners.action.as_mut() {
            let view = GestureView {
                id: self.id,
                base: &*self.base,
                gesture: gesture.gesture_ref(),
            };
            listener(&view);
        }
    }

    /// Grant began-firing and fire, unless the arbiter says the gesture
    /// cannot run next to the peers already firing.
    ///
    /// A continuous recognizer already past `Began` keeps firing regardless.
    pub(crate) fn fire_if_allowed<G: GestureBehavior>(&mut self, gesture: &G) {
        let established = self.base.kind.is_continuous()
            && self.in_state(&[State::Changed, State::Ended]);
        if established || self.recognize_simultaneously(gesture) {
            self.base.began_firing = true;
            self.fire_action(gesture);
        } else {
            tracing::debug!(
                target: "gesturekit::recognizer",
                id = %self.id,
                kind = %self.base.kind,
                "simultaneous recognition refused"
            );
        }
    }

    /// AND of the pairwise policy over every peer that is firing.
    pub(crate) fn recognize_simultaneously<G: GestureBehavior>(&self, gesture: &G) -> bool {
        // The running recognizer is out of the registry but still counted.
        if self.peers.len() <= 1 {
            return true;
        }
        let candidate = self.view(gesture);
        let mut allowed = true;
        for (id, peer) in self.peers.iter() {
            if id == self.id || !peer.base.has_began_firing_events() {
                continue;
            }
            allowed &= (self.policy.simultaneous)(&candidate, &peer.view(id));
        }
        allowed
    }

    pub(crate) fn should_begin<G: GestureBehavior>(&self, gesture: &G) -> bool {
        let allowed = (self.policy.should_begin)(&self.view(gesture));
        if !allowed {
            tracing::debug!(
                target: "gesturekit::recognizer",
                id = %self.id,
                kind = %self.base.kind,
                "should_begin vetoed"
            );
        }
        allowed
    }

    pub(crate) fn should_receive<G: GestureBehavior>(&self, gesture: &G) -> bool {
        (self.policy.should_receive)(&self.view(gesture))
    }

    // -----------------------------------------------------------------------
    // Failure requirements
    // -----------------------------------------------------------------------

    pub(crate) fn requirement(&self) -> Requirement {
        let Some(required) = self.failures.required(self.id) else {
            return Requirement::Satisfied;
        };
        let Some(other) = self.peers.get(required) else {
            return Requirement::Satisfied;
        };
        match other.base.state {
            State::Failed => Requirement::Satisfied,
            State::Possible if !other.base.touch_active => Requirement::Satisfied,
            state if state.is_recognized() => Requirement::Blocked,
            _ => Requirement::Pending,
        }
    }

    /// Called right after the recognizer entered its trigger state.
    pub(crate) fn resolve_trigger<G: GestureBehavior>(&mut self, gesture: &G) -> Resolution {
        match self.requirement() {
            Requirement::Satisfied => {
                self.fire_if_allowed(gesture);
                Resolution::Proceed
            }
            Requirement::Blocked => {
                tracing::debug!(
                    target: "gesturekit::recognizer",
                    id = %self.id,
                    kind = %self.base.kind,
                    "required recognizer already recognized"
                );
                self.base.began_firing = false;
                self.set_state(gesture, State::Failed);
                Resolution::Failed
            }
            Requirement::Pending => {
                self.base.began_firing = false;
                self.listen();
                Resolution::Deferred
            }
        }
    }

    /// Tell waiting dependents this recognizer went idle without claiming
    /// anything: `Possible` with no contact sequence in progress.
    pub(crate) fn notify_idle(&mut self) {
        if self.failures.listeners_of(self.id).is_empty() {
            return;
        }
        tracing::trace!(target: "gesturekit::recognizer", id = %self.id, "idle with dependents waiting");
        self.changes.push_back(StateChange {
            id: self.id,
            state: State::Possible,
        });
    }

    pub(crate) fn listen(&mut self) {
        if self.failures.listen(self.id) {
            tracing::trace!(target: "gesturekit::recognizer", id = %self.id, "waiting on required recognizer");
        }
    }

    pub(crate) fn stop_listening(&mut self) {
        self.failures.stop_listening(self.id);
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.failures.is_listening(self.id)
    }

    /// Shared "cycle finished" handling: back to `Possible`.
    pub(crate) fn soft_reset<G: GestureBehavior>(&mut self, gesture: &G) {
        self.stop_listening();
        self.base.began_firing = false;
        self.set_state(gesture, State::Possible);
    }

    /// The host cancelled the stream. Only a recognizer still in play moves
    /// to `Cancelled`; a finished one keeps its state until the reset.
    pub(crate) fn cancel_stream<G: GestureBehavior>(&mut self, gesture: &G) {
        self.cancel_all();
        self.stop_listening();
        self.base.began_firing = false;
        if self.in_state(&[State::Possible, State::Began, State::Changed]) {
            self.set_state(gesture, State::Cancelled);
        }
        self.post_reset();
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    pub(crate) fn schedule(&mut self, after: Duration, message: Message) {
        self.schedule_with(after, message, None);
    }

    pub(crate) fn schedule_with(&mut self, after: Duration, message: Message, payload: Option<i64>) {
        self.timers
            .schedule_at(self.id, self.now + after, message, payload);
    }

    pub(crate) fn schedule_at(&mut self, deadline: Instant, message: Message) {
        self.timers.schedule_at(self.id, deadline, message, None);
    }

    pub(crate) fn cancel(&mut self, messages: &[Message]) {
        self.timers.cancel(self.id, messages);
    }

    pub(crate) fn cancel_all(&mut self) {
        self.timers.cancel_all(self.id);
    }

    /// Return to `Possible` once the current dispatch settles.
    pub(crate) fn post_reset(&mut self) {
        self.cancel(&[Message::Reset]);
        self.schedule(Duration::ZERO, Message::Reset);
    }
}
