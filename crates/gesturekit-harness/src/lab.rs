#![forbid(unsafe_code)]

//! A recording driver around [`Arbiter`].
//!
//! [`GestureLab`] registers recognizers under a short name, wires their
//! listeners into a shared log, and replays [`TouchScript`]s. Tests then
//! assert on the recorded actions and transitions instead of wiring
//! `Rc<RefCell<..>>` sinks by hand.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"transition","name":"tap","from":"possible","to":"ended","at_ms":120}
//! {"event":"action","name":"tap","state":"ended","at_ms":120}
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use gesturekit::{Arbiter, ArbiterError, Recognizer, RecognizerId, State};
use gesturekit_core::Instant;

use crate::script::{ScriptStep, TouchScript};

/// Something a recognizer reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabEvent {
    Action {
        name: &'static str,
        state: State,
        at_ms: u64,
    },
    Transition {
        name: &'static str,
        from: State,
        to: State,
        at_ms: u64,
    },
}

impl LabEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Action { name, .. } | Self::Transition { name, .. } => name,
        }
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let value = match self {
            Self::Action { name, state, at_ms } => serde_json::json!({
                "event": "action",
                "name": name,
                "state": state.to_string(),
                "at_ms": at_ms,
            }),
            Self::Transition {
                name,
                from,
                to,
                at_ms,
            } => serde_json::json!({
                "event": "transition",
                "name": name,
                "from": from.to_string(),
                "to": to.to_string(),
                "at_ms": at_ms,
            }),
        };
        value.to_string()
    }
}

/// Shared virtual clock, read by listeners to stamp their records.
#[derive(Debug, Clone)]
struct LabClock {
    origin: Instant,
    now: Rc<RefCell<Instant>>,
}

impl LabClock {
    fn elapsed_ms(&self) -> u64 {
        let now = *self.now.borrow();
        let elapsed = now.saturating_duration_since(self.origin);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

pub struct GestureLab {
    arbiter: Arbiter,
    names: AHashMap<&'static str, RecognizerId>,
    log: Rc<RefCell<Vec<LabEvent>>>,
    clock: LabClock,
    consumed: usize,
}

impl GestureLab {
    #[must_use]
    pub fn new(origin: Instant) -> Self {
        Self {
            arbiter: Arbiter::new(),
            names: AHashMap::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            clock: LabClock {
                origin,
                now: Rc::new(RefCell::new(origin)),
            },
            consumed: 0,
        }
    }

    /// Register `recognizer` under `name`, replacing its listeners with
    /// recording ones.
    pub fn add(&mut self, name: &'static str, mut recognizer: Recognizer) -> RecognizerId {
        let log = Rc::clone(&self.log);
        let clock = self.clock.clone();
        recognizer.set_action_listener(move |view| {
            log.borrow_mut().push(LabEvent::Action {
                name,
                state: view.state(),
                at_ms: clock.elapsed_ms(),
            });
        });
        let log = Rc::clone(&self.log);
        let clock = self.clock.clone();
        recognizer.set_state_listener(move |_, from, to| {
            log.borrow_mut().push(LabEvent::Transition {
                name,
                from,
                to,
                at_ms: clock.elapsed_ms(),
            });
        });
        let id = self.arbiter.add(recognizer);
        self.names.insert(name, id);
        id
    }

    /// `dependent` waits for `required` to fail.
    pub fn require_failure_of(
        &mut self,
        dependent: &'static str,
        required: &'static str,
    ) -> Result<(), ArbiterError> {
        let dependent = self.id(dependent);
        let required = self.id(required);
        match (dependent, required) {
            (Some(dependent), Some(required)) => {
                self.arbiter.require_failure_of(dependent, Some(required))
            }
            (None, _) | (_, None) => Ok(()),
        }
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<RecognizerId> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut Arbiter {
        &mut self.arbiter
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<State> {
        self.id(name).and_then(|id| self.arbiter.state(id))
    }

    /// Replay every step of `script`. Returns how many samples were consumed.
    pub fn run(&mut self, script: &TouchScript) -> usize {
        script
            .steps()
            .iter()
            .filter(|step| self.step(step))
            .count()
    }

    /// Replay a single step. Returns whether a sample was consumed.
    pub fn step(&mut self, step: &ScriptStep) -> bool {
        *self.clock.now.borrow_mut() = step.at();
        let consumed = match step {
            ScriptStep::Sample(sample) => self.arbiter.dispatch(sample),
            ScriptStep::Advance(at) => {
                self.arbiter.advance_to(*at);
                false
            }
        };
        if consumed {
            self.consumed += 1;
        }
        consumed
    }

    /// Let every timer due by `at` fire.
    pub fn advance_to(&mut self, at: Instant) {
        *self.clock.now.borrow_mut() = at;
        self.arbiter.advance_to(at);
    }

    /// Samples consumed over the lab's lifetime.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    #[must_use]
    pub fn events(&self) -> Vec<LabEvent> {
        self.log.borrow().clone()
    }

    /// States at which `name` delivered its action, in order.
    #[must_use]
    pub fn actions(&self, name: &str) -> Vec<State> {
        self.log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                LabEvent::Action { name: n, state, .. } if *n == name => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// `(from, to)` of every notified transition of `name`, in order.
    #[must_use]
    pub fn transitions(&self, name: &str) -> Vec<(State, State)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                LabEvent::Transition {
                    name: n, from, to, ..
                } if *n == name => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.borrow_mut().clear();
    }

    #[must_use]
    pub fn to_jsonl(&self) -> Vec<String> {
        self.log.borrow().iter().map(LabEvent::to_jsonl).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesturekit::{Duration, Tap};

    #[test]
    fn records_tap_action_and_transitions() {
        let t0 = Instant::now();
        let mut lab = GestureLab::new(t0);
        lab.add("tap", Recognizer::new(Tap::new()));
        let script = TouchScript::new(t0).tap(0, 50.0, 50.0).idle_ms(20);
        lab.run(&script);
        assert_eq!(lab.actions("tap"), vec![State::Ended]);
        assert_eq!(
            lab.transitions("tap"),
            vec![(State::Possible, State::Ended), (State::Ended, State::Possible)]
        );
        assert_eq!(lab.state("tap"), Some(State::Possible));
    }

    #[test]
    fn jsonl_lines_parse() {
        let t0 = Instant::now();
        let mut lab = GestureLab::new(t0);
        lab.add("tap", Recognizer::new(Tap::new()));
        lab.run(&TouchScript::new(t0).tap(0, 50.0, 50.0));
        let lines = lab.to_jsonl();
        assert!(!lines.is_empty());
        for line in lines {
            let value: serde_json::Value =
                serde_json::from_str(&line).unwrap_or(serde_json::Value::Null);
            assert_eq!(value["name"], "tap");
        }
    }

    #[test]
    fn clock_reports_whole_milliseconds_since_origin() {
        let t0 = Instant::now();
        let clock = LabClock {
            origin: t0,
            now: Rc::new(RefCell::new(t0 + Duration::from_micros(2_750))),
        };
        assert_eq!(clock.elapsed_ms(), 2);

        // A timestamp before the origin saturates instead of wrapping.
        let early = LabClock {
            origin: t0 + Duration::from_millis(10),
            now: Rc::new(RefCell::new(t0)),
        };
        assert_eq!(early.elapsed_ms(), 0);
    }

    #[test]
    fn names_resolve_to_their_own_recognizer() {
        let mut lab = GestureLab::new(Instant::now());
        lab.add("one", Recognizer::new(Tap::new()));
        lab.add("two", Recognizer::new(Tap::new().with_taps_required(2)));
        let (one, two) = (lab.id("one"), lab.id("two"));
        assert!(one.is_some() && two.is_some());
        assert_ne!(one, two);
        assert_eq!(lab.id("three"), None);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut lab = GestureLab::new(Instant::now());
        assert!(lab.require_failure_of("a", "b").is_ok());
        assert_eq!(lab.state("a"), None);
    }
}
