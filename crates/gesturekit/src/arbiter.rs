#![forbid(unsafe_code)]

//! The arbiter: owner of every recognizer on one surface.
//!
//! [`Arbiter::dispatch`] fans each pointer sample out to the registered
//! recognizers in insertion order, after first delivering every timer that
//! fell due at or before the sample's timestamp. Three policy hooks decide
//! who may receive a contact sequence, who may begin, and which recognizers
//! may fire side by side.
//!
//! # Invariants
//!
//! 1. Recognizers run one at a time, in insertion order, over a snapshot of
//!    ids taken when the dispatch starts.
//! 2. Timers due before a sample are delivered before that sample.
//! 3. Dependents hear about a transition before the next recognizer runs.
//! 4. Structural requests made from listeners (through [`ArbiterHandle`])
//!    are applied between recognizers, never in the middle of one.
//!
//! # Failure Modes
//!
//! - Unknown or stale ids are ignored by the lookup and mutation methods,
//!   which report it through their return value.
//! - Requests sent through a handle after the arbiter was dropped are lost.

use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use gesturekit_core::{Instant, PointerSample, TimerQueue, TimerService};

use crate::context::{GestureContext, StateChange};
use crate::failure::FailureGraph;
use crate::recognizer::{Gesture, GestureView, Message, Recognizer, RecognizerId};
use crate::registry::Registry;
use crate::state::State;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Misuse of the arbiter API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterError {
    /// The id does not name a live recognizer of this arbiter.
    UnknownRecognizer(RecognizerId),
    /// A recognizer cannot wait for its own failure.
    SelfDependency(RecognizerId),
    /// The new edge would close a loop of failure requirements.
    DependencyCycle {
        dependent: RecognizerId,
        required: RecognizerId,
    },
}

impl fmt::Display for ArbiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRecognizer(id) => write!(f, "unknown recognizer {id}"),
            Self::SelfDependency(id) => {
                write!(f, "recognizer {id} cannot require its own failure")
            }
            Self::DependencyCycle {
                dependent,
                required,
            } => write!(
                f,
                "requiring failure of {required} from {dependent} would form a cycle"
            ),
        }
    }
}

impl std::error::Error for ArbiterError {}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

type ViewPredicate = Box<dyn Fn(&GestureView<'_>) -> bool>;
type PairPredicate = Box<dyn Fn(&GestureView<'_>, &GestureView<'_>) -> bool>;

/// The delegate hooks. All default to permissive.
pub(crate) struct Policy {
    pub(crate) should_begin: ViewPredicate,
    pub(crate) should_receive: ViewPredicate,
    pub(crate) simultaneous: PairPredicate,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            should_begin: Box::new(|_| true),
            should_receive: Box::new(|_| true),
            simultaneous: Box::new(|_, _| true),
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Remove(RecognizerId),
    Reset(RecognizerId),
    SetEnabled(RecognizerId, bool),
}

/// Cloneable request channel into an arbiter.
///
/// Listeners cannot borrow the arbiter while it dispatches. They capture a
/// handle instead; requests are applied as soon as the running recognizer
/// returns, or at the start of the next dispatch when sent from outside.
#[derive(Debug, Clone)]
pub struct ArbiterHandle {
    tx: Sender<Command>,
}

impl ArbiterHandle {
    /// Request removal. Returns false if the arbiter is gone.
    pub fn remove(&self, id: RecognizerId) -> bool {
        self.tx.send(Command::Remove(id)).is_ok()
    }

    /// Request a full reset of one recognizer.
    pub fn reset(&self, id: RecognizerId) -> bool {
        self.tx.send(Command::Reset(id)).is_ok()
    }

    /// Request enabling or disabling one recognizer.
    pub fn set_enabled(&self, id: RecognizerId, enabled: bool) -> bool {
        self.tx.send(Command::SetEnabled(id, enabled)).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Owns recognizers, their timers, and their failure requirements.
pub struct Arbiter {
    registry: Registry,
    failures: FailureGraph,
    timers: TimerQueue<RecognizerId, Message>,
    policy: Policy,
    enabled: bool,
    clock: Instant,
    changes: VecDeque<StateChange>,
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arbiter")
            .field("members", &self.registry.len())
            .field("enabled", &self.enabled)
            .field("pending_timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl Arbiter {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            registry: Registry::default(),
            failures: FailureGraph::default(),
            timers: TimerQueue::new(),
            policy: Policy::default(),
            enabled: true,
            clock: Instant::now(),
            changes: VecDeque::new(),
            tx,
            rx,
        }
    }

    /// A request channel listeners can capture.
    #[must_use]
    pub fn handle(&self) -> ArbiterHandle {
        ArbiterHandle {
            tx: self.tx.clone(),
        }
    }

    // -- policy -------------------------------------------------------------

    /// Decide whether a recognizer may leave `Possible` at its trigger.
    pub fn set_should_begin(&mut self, policy: impl Fn(&GestureView<'_>) -> bool + 'static) {
        self.policy.should_begin = Box::new(policy);
    }

    /// Decide whether a recognizer may track a new contact sequence.
    pub fn set_should_receive(&mut self, policy: impl Fn(&GestureView<'_>) -> bool + 'static) {
        self.policy.should_receive = Box::new(policy);
    }

    /// Decide whether `candidate` may fire while `other` is firing.
    pub fn set_should_recognize_simultaneously(
        &mut self,
        policy: impl Fn(&GestureView<'_>, &GestureView<'_>) -> bool + 'static,
    ) {
        self.policy.simultaneous = Box::new(policy);
    }

    // -- membership ---------------------------------------------------------

    /// Take ownership of `recognizer`.
    pub fn add(&mut self, recognizer: Recognizer) -> RecognizerId {
        let kind = recognizer.kind();
        let id = self.registry.insert(recognizer);
        tracing::debug!(target: "gesturekit::arbiter", %id, %kind, "recognizer added");
        id
    }

    /// Detach and drop a recognizer. Dependents waiting on it proceed as if
    /// it had failed.
    pub fn remove(&mut self, id: RecognizerId) -> bool {
        let removed = self.remove_inner(id);
        self.settle(self.clock);
        removed
    }

    /// Remove every recognizer.
    pub fn clear(&mut self) {
        let ids = self.registry.ids().to_vec();
        for id in ids {
            self.remove_inner(id);
        }
        self.changes.clear();
        self.failures.clear();
        self.timers.clear();
    }

    #[must_use]
    pub fn get(&self, id: RecognizerId) -> Option<&Recognizer> {
        self.registry.get(id)
    }

    pub fn get_mut(&mut self, id: RecognizerId) -> Option<&mut Recognizer> {
        self.registry.get_mut(id)
    }

    /// Borrowed view of a recognizer, as listeners see it.
    #[must_use]
    pub fn view(&self, id: RecognizerId) -> Option<GestureView<'_>> {
        self.registry.get(id).map(|recognizer| recognizer.view(id))
    }

    /// State of a recognizer, if it exists.
    #[must_use]
    pub fn state(&self, id: RecognizerId) -> Option<State> {
        self.registry.get(id).map(Recognizer::state)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Live ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<RecognizerId> {
        self.registry.ids().to_vec()
    }

    // -- enablement ---------------------------------------------------------

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the arbiter and every member. Disabling resets.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        let ids = self.registry.ids().to_vec();
        for id in ids {
            self.set_recognizer_enabled_inner(id, enabled);
        }
        self.settle(self.clock);
    }

    /// Enable or disable one recognizer. Disabling resets it.
    pub fn set_recognizer_enabled(&mut self, id: RecognizerId, enabled: bool) -> bool {
        let found = self.set_recognizer_enabled_inner(id, enabled);
        self.settle(self.clock);
        found
    }

    /// Return a recognizer to a pristine `Possible`.
    pub fn reset_recognizer(&mut self, id: RecognizerId) -> bool {
        let found = self.reset_inner(id);
        self.settle(self.clock);
        found
    }

    // -- failure requirements -----------------------------------------------

    /// Make `dependent` wait for `required` to fail before it may claim its
    /// gesture. `None` clears the requirement.
    pub fn require_failure_of(
        &mut self,
        dependent: RecognizerId,
        required: Option<RecognizerId>,
    ) -> Result<(), ArbiterError> {
        if !self.registry.contains(dependent) {
            return Err(ArbiterError::UnknownRecognizer(dependent));
        }
        if let Some(required) = required {
            if required == dependent {
                return Err(ArbiterError::SelfDependency(dependent));
            }
            if !self.registry.contains(required) {
                return Err(ArbiterError::UnknownRecognizer(required));
            }
            let mut cursor = self.failures.required(required);
            while let Some(next) = cursor {
                if next == dependent {
                    return Err(ArbiterError::DependencyCycle {
                        dependent,
                        required,
                    });
                }
                cursor = self.failures.required(next);
            }
        }
        self.failures.set(dependent, required);
        if let Some(recognizer) = self.registry.get_mut(dependent) {
            recognizer.base.require_failure_of = required;
        }
        tracing::debug!(
            target: "gesturekit::arbiter",
            %dependent,
            required = ?required,
            "failure requirement set"
        );
        Ok(())
    }

    /// Whether `candidate` may fire next to every member currently firing.
    #[must_use]
    pub fn should_recognize_simultaneously(&self, candidate: RecognizerId) -> bool {
        let Some(recognizer) = self.registry.get(candidate) else {
            return false;
        };
        if self.registry.len() <= 1 {
            return true;
        }
        let view = recognizer.view(candidate);
        let mut allowed = true;
        for (id, other) in self.registry.iter() {
            if id == candidate || !other.base.has_began_firing_events() {
                continue;
            }
            allowed &= (self.policy.simultaneous)(&view, &other.view(id));
        }
        allowed
    }

    // -- time ---------------------------------------------------------------

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Pending timers of one recognizer, in firing order.
    #[must_use]
    pub fn pending_timers(&self, id: RecognizerId) -> Vec<(Message, Instant)> {
        self.timers.pending_for(id).collect()
    }

    /// Deliver every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Instant) {
        self.settle(self.clock);
        while let Some(due) = self.timers.pop_due(now) {
            let _span = tracing::trace_span!(
                target: "gesturekit::arbiter",
                "gesture.timer",
                id = %due.owner,
                message = ?due.message,
            )
            .entered();
            let deadline = due.deadline();
            self.clock = self.clock.max(deadline);
            self.run(due.owner, deadline, |gesture, cx| {
                gesture.handle_timer(cx, due.message, due.payload);
            });
            self.settle(deadline);
        }
        self.clock = self.clock.max(now);
    }

    // -- dispatch -----------------------------------------------------------

    /// Feed one sample to every member. Returns whether any consumed it.
    pub fn dispatch(&mut self, sample: &PointerSample) -> bool {
        if !self.enabled {
            return false;
        }
        let now = sample.timestamp;
        self.advance_to(now);
        let _span = tracing::trace_span!(
            target: "gesturekit::arbiter",
            "gesture.dispatch",
            phase = ?sample.phase,
            contacts = sample.contacts.len(),
        )
        .entered();
        let snapshot = self.registry.ids().to_vec();
        let mut handled = false;
        for id in snapshot {
            let consumed = self
                .run(id, now, |gesture, cx| gesture.handle_event(cx, sample))
                .unwrap_or(false);
            handled |= consumed;
            self.settle(now);
        }
        tracing::trace!(target: "gesturekit::arbiter", handled, "dispatched");
        handled
    }

    // -- internals ----------------------------------------------------------

    /// Run `f` against one recognizer with the rest of the arbiter as context.
    fn run<R>(
        &mut self,
        id: RecognizerId,
        now: Instant,
        f: impl FnOnce(&mut Gesture, &mut GestureContext<'_>) -> R,
    ) -> Option<R> {
        let mut recognizer = self.registry.take(id)?;
        let result = {
            let Recognizer {
                base,
                gesture,
                listeners,
            } = &mut *recognizer;
            let mut cx = GestureContext {
                id,
                now,
                base,
                listeners,
                timers: &mut self.timers,
                failures: &mut self.failures,
                peers: &self.registry,
                policy: &self.policy,
                changes: &mut self.changes,
            };
            f(gesture, &mut cx)
        };
        self.registry.restore(id, recognizer);
        Some(result)
    }

    /// Deliver queued transitions to waiting dependents, then apply handle
    /// requests, until both queues are empty.
    fn settle(&mut self, now: Instant) {
        loop {
            if let Some(change) = self.changes.pop_front() {
                for dependent in self.waiting_on(change.id) {
                    self.run(dependent, now, |gesture, cx| {
                        gesture.handle_required_state(cx, change.state);
                    });
                }
                continue;
            }
            match self.rx.try_recv() {
                Ok(command) => self.apply(command),
                Err(_) => break,
            }
        }
    }

    /// Dependents waiting on `required`, in insertion order.
    fn waiting_on(&self, required: RecognizerId) -> Vec<RecognizerId> {
        let waiting = self.failures.listeners_of(required);
        if waiting.is_empty() {
            return waiting;
        }
        self.registry
            .ids()
            .iter()
            .copied()
            .filter(|id| waiting.contains(id))
            .collect()
    }

    fn apply(&mut self, command: Command) {
        tracing::trace!(target: "gesturekit::arbiter", ?command, "applying request");
        match command {
            Command::Remove(id) => {
                self.remove_inner(id);
            }
            Command::Reset(id) => {
                self.reset_inner(id);
            }
            Command::SetEnabled(id, enabled) => {
                self.set_recognizer_enabled_inner(id, enabled);
            }
        }
    }

    fn remove_inner(&mut self, id: RecognizerId) -> bool {
        let Some(mut removed) = self.registry.remove(id) else {
            return false;
        };
        self.timers.cancel_all(id);
        removed.clear_listeners();
        let now = self.clock;
        for dependent in self.waiting_on(id) {
            self.run(dependent, now, |gesture, cx| {
                gesture.handle_required_state(cx, State::Failed);
            });
        }
        for orphan in self.failures.forget(id) {
            if let Some(recognizer) = self.registry.get_mut(orphan) {
                recognizer.base.require_failure_of = None;
            }
        }
        tracing::debug!(target: "gesturekit::arbiter", %id, "recognizer removed");
        true
    }

    fn reset_inner(&mut self, id: RecognizerId) -> bool {
        let now = self.clock;
        self.run(id, now, |gesture, cx| gesture.reset(cx)).is_some()
    }

    fn set_recognizer_enabled_inner(&mut self, id: RecognizerId, enabled: bool) -> bool {
        let Some(current) = self.registry.get(id).map(|r| r.base.enabled) else {
            return false;
        };
        if current == enabled {
            return true;
        }
        if !enabled {
            self.reset_inner(id);
        }
        if let Some(recognizer) = self.registry.get_mut(id) {
            recognizer.base.enabled = enabled;
        }
        tracing::debug!(target: "gesturekit::arbiter", %id, enabled, "recognizer enablement changed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::{Pan, Tap};
    use gesturekit_core::{Contact, Duration, Phase};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn sample(phase: Phase, x: f32, y: f32, t: Instant) -> PointerSample {
        PointerSample::new(phase, vec![Contact::new(0, x, y)], t)
    }

    fn tap(arbiter: &mut Arbiter, t0: Instant, x: f32, y: f32) {
        arbiter.dispatch(&sample(Phase::Down, x, y, t0));
        arbiter.dispatch(&sample(Phase::Up, x, y, at(t0, 30)));
    }

    #[test]
    fn empty_arbiter_consumes_nothing() {
        let mut arbiter = Arbiter::new();
        assert!(arbiter.is_empty());
        assert!(!arbiter.dispatch(&sample(Phase::Down, 0.0, 0.0, Instant::now())));
    }

    #[test]
    fn disabled_arbiter_returns_false_and_resets_members() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Pan::new()));
        let t0 = Instant::now();
        arbiter.dispatch(&sample(Phase::Down, 0.0, 0.0, t0));
        arbiter.dispatch(&sample(Phase::Move, 40.0, 0.0, at(t0, 10)));
        assert_eq!(arbiter.state(id), Some(State::Began));
        arbiter.set_enabled(false);
        assert_eq!(arbiter.state(id), Some(State::Possible));
        assert!(!arbiter.dispatch(&sample(Phase::Move, 80.0, 0.0, at(t0, 20))));
        assert!(!arbiter.get(id).is_some_and(|r| r.base().is_enabled()));
    }

    #[test]
    fn dispatch_reports_consumption() {
        let mut arbiter = Arbiter::new();
        arbiter.add(Recognizer::new(Tap::new()).with_cancels_touches_in_view(false));
        assert!(!arbiter.dispatch(&sample(Phase::Down, 0.0, 0.0, Instant::now())));
        arbiter.add(Recognizer::new(Tap::new()));
        assert!(arbiter.dispatch(&sample(Phase::Down, 0.0, 0.0, Instant::now())));
    }

    #[test]
    fn remove_unknown_is_false() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Tap::new()));
        assert!(arbiter.remove(id));
        assert!(!arbiter.remove(id));
        assert!(arbiter.get(id).is_none());
    }

    #[test]
    fn require_failure_rejects_misuse() {
        let mut arbiter = Arbiter::new();
        let a = arbiter.add(Recognizer::new(Tap::new()));
        let b = arbiter.add(Recognizer::new(Tap::new()));
        assert_eq!(
            arbiter.require_failure_of(a, Some(a)),
            Err(ArbiterError::SelfDependency(a))
        );
        assert!(arbiter.require_failure_of(a, Some(b)).is_ok());
        assert_eq!(
            arbiter.require_failure_of(b, Some(a)),
            Err(ArbiterError::DependencyCycle {
                dependent: b,
                required: a
            })
        );
        arbiter.remove(b);
        assert_eq!(
            arbiter.require_failure_of(a, Some(b)),
            Err(ArbiterError::UnknownRecognizer(b))
        );
        assert_eq!(arbiter.get(a).and_then(|r| r.base().require_failure_of()), None);
    }

    #[test]
    fn error_messages_name_the_ids() {
        let id = RecognizerId::new(3, 1);
        assert_eq!(
            ArbiterError::UnknownRecognizer(id).to_string(),
            "unknown recognizer r3v1"
        );
    }

    #[test]
    fn should_receive_veto_ignores_sequence() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Tap::new()));
        arbiter.set_should_receive(|_| false);
        let t0 = Instant::now();
        tap(&mut arbiter, t0, 10.0, 10.0);
        assert_eq!(arbiter.state(id), Some(State::Possible));
    }

    #[test]
    fn should_begin_veto_fails_tap() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Tap::new()));
        arbiter.set_should_begin(|_| false);
        tap(&mut arbiter, Instant::now(), 10.0, 10.0);
        assert_eq!(arbiter.state(id), Some(State::Failed));
    }

    #[test]
    fn vetoing_policy_allows_single_winner() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut arbiter = Arbiter::new();
        arbiter.set_should_recognize_simultaneously(|_, _| false);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let log = Rc::clone(&fired);
            ids.push(arbiter.add(
                Recognizer::new(Tap::new()).on_action(move |view| log.borrow_mut().push(view.id())),
            ));
        }
        tap(&mut arbiter, Instant::now(), 5.0, 5.0);
        assert_eq!(*fired.borrow(), vec![ids[0]]);
        assert!(!arbiter.should_recognize_simultaneously(ids[1]));
    }

    #[test]
    fn single_member_always_simultaneous() {
        let mut arbiter = Arbiter::new();
        arbiter.set_should_recognize_simultaneously(|_, _| false);
        let id = arbiter.add(Recognizer::new(Tap::new()));
        assert!(arbiter.should_recognize_simultaneously(id));
    }

    #[test]
    fn reset_posts_once_timers_advance() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Tap::new()));
        let t0 = Instant::now();
        tap(&mut arbiter, t0, 1.0, 1.0);
        assert_eq!(arbiter.state(id), Some(State::Ended));
        assert_eq!(arbiter.next_deadline(), Some(at(t0, 30)));
        arbiter.advance_to(at(t0, 30));
        assert_eq!(arbiter.state(id), Some(State::Possible));
        assert!(arbiter.next_deadline().is_none());
    }

    #[test]
    fn listener_can_remove_itself_through_handle() {
        let mut arbiter = Arbiter::new();
        let handle = arbiter.handle();
        let id = arbiter.add(Recognizer::new(Tap::new()).on_action(move |view| {
            handle.remove(view.id());
        }));
        let other = arbiter.add(Recognizer::new(Tap::new()));
        tap(&mut arbiter, Instant::now(), 1.0, 1.0);
        assert!(arbiter.get(id).is_none());
        assert_eq!(arbiter.ids(), vec![other]);
        assert_eq!(arbiter.state(other), Some(State::Ended));
    }

    #[test]
    fn handle_requests_from_outside_apply_on_next_dispatch() {
        let mut arbiter = Arbiter::new();
        let id = arbiter.add(Recognizer::new(Tap::new()));
        let handle = arbiter.handle();
        assert!(handle.set_enabled(id, false));
        arbiter.advance_to(Instant::now());
        assert!(!arbiter.get(id).is_some_and(|r| r.base().is_enabled()));
    }

    #[test]
    fn removing_required_releases_waiting_dependent() {
        let fired = Rc::new(RefCell::new(0));
        let mut arbiter = Arbiter::new();
        let log = Rc::clone(&fired);
        let single = arbiter.add(
            Recognizer::new(Tap::new()).on_action(move |_| *log.borrow_mut() += 1),
        );
        let double = arbiter.add(Recognizer::new(Tap::new().with_taps_required(2)));
        arbiter.require_failure_of(single, Some(double)).expect("valid edge");
        let t0 = Instant::now();
        tap(&mut arbiter, t0, 1.0, 1.0);
        assert_eq!(arbiter.state(single), Some(State::Ended));
        assert_eq!(*fired.borrow(), 0);
        arbiter.remove(double);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(arbiter.get(single).and_then(|r| r.base().require_failure_of()), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut arbiter = Arbiter::new();
        arbiter.add(Recognizer::new(Tap::new()));
        arbiter.add(Recognizer::new(Pan::new()));
        tap(&mut arbiter, Instant::now(), 1.0, 1.0);
        arbiter.clear();
        assert!(arbiter.is_empty());
        assert!(arbiter.next_deadline().is_none());
    }
}
