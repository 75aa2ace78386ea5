#![forbid(unsafe_code)]

//! Structured logging emitted while recognizing gestures.
//!
//! Run:
//!   cargo test -p gesturekit-harness --test gesture_tracing

use gesturekit::{Arbiter, Instant, Pan, Recognizer, State, Tap};
use gesturekit_harness::{GestureLab, ScriptStep, TouchScript, capture};

#[test]
fn dispatch_and_timer_spans() {
    let t0 = Instant::now();
    let ((), handle) = capture(|| {
        let mut lab = GestureLab::new(t0);
        lab.add("tap", Recognizer::new(Tap::new()));
        lab.run(&TouchScript::new(t0).tap(0, 10.0, 10.0).idle_ms(5));
    });
    assert!(handle.has_span("gesture.dispatch"));
    assert!(handle.has_span("gesture.timer"));
}

#[test]
fn transitions_are_logged_inside_dispatch() {
    let t0 = Instant::now();
    let ((), handle) = capture(|| {
        let mut lab = GestureLab::new(t0);
        lab.add("tap", Recognizer::new(Tap::new()));
        lab.run(&TouchScript::new(t0).tap(0, 10.0, 10.0));
    });
    let transitions: Vec<_> = handle
        .events_for("gesturekit::recognizer")
        .into_iter()
        .filter(|e| e.message == "state transition")
        .collect();
    assert_eq!(transitions.len(), 1);
    let ended = &transitions[0];
    assert_eq!(ended.field("from"), Some("possible"));
    assert_eq!(ended.field("to"), Some("ended"));
    assert_eq!(ended.field("kind"), Some("tap"));
    assert_eq!(ended.span.as_deref(), Some("gesture.dispatch"));
}

#[test]
fn veto_is_logged() {
    let t0 = Instant::now();
    let ((), handle) = capture(|| {
        let mut arbiter = Arbiter::new();
        arbiter.set_should_begin(|_| false);
        let id = arbiter.add(Recognizer::new(Pan::new()));
        let script = TouchScript::new(t0).down(0, 0.0, 0.0).drag_by(40.0, 0.0, 4);
        for step in script {
            if let ScriptStep::Sample(sample) = step {
                arbiter.dispatch(&sample);
            }
        }
        assert_eq!(arbiter.state(id), Some(State::Failed));
    });
    assert!(
        handle
            .events_for("gesturekit::recognizer")
            .iter()
            .any(|e| e.message == "should_begin vetoed")
    );
}
