#![forbid(unsafe_code)]

//! Failure-dependency edges between recognizers.
//!
//! An edge `dependent → required` says the dependent may only claim its
//! gesture once the required recognizer has failed. The edge is static
//! configuration; whether the dependent is currently *waiting* on it is
//! tracked separately, because only waiting dependents are told about the
//! required recognizer's transitions.
//!
//! # Invariants
//!
//! 1. A recognizer has at most one required recognizer.
//! 2. No self edges.
//! 3. A waiting dependent always has an edge.

use ahash::{AHashMap, AHashSet};

use crate::recognizer::RecognizerId;

#[derive(Debug, Default)]
pub(crate) struct FailureGraph {
    required_by: AHashMap<RecognizerId, RecognizerId>,
    waiting: AHashSet<RecognizerId>,
}

impl FailureGraph {
    /// Set or clear the requirement of `dependent`. Clearing or replacing an
    /// edge also stops the dependent from waiting.
    pub(crate) fn set(&mut self, dependent: RecognizerId, required: Option<RecognizerId>) {
        debug_assert_ne!(Some(dependent), required);
        self.waiting.remove(&dependent);
        match required {
            Some(required) => {
                self.required_by.insert(dependent, required);
            }
            None => {
                self.required_by.remove(&dependent);
            }
        }
    }

    pub(crate) fn required(&self, dependent: RecognizerId) -> Option<RecognizerId> {
        self.required_by.get(&dependent).copied()
    }

    /// Start delivering the required recognizer's transitions to `dependent`.
    /// Returns false when the dependent has nothing to wait for.
    pub(crate) fn listen(&mut self, dependent: RecognizerId) -> bool {
        if self.required_by.contains_key(&dependent) {
            self.waiting.insert(dependent)
        } else {
            false
        }
    }

    pub(crate) fn stop_listening(&mut self, dependent: RecognizerId) -> bool {
        self.waiting.remove(&dependent)
    }

    pub(crate) fn is_listening(&self, dependent: RecognizerId) -> bool {
        self.waiting.contains(&dependent)
    }

    /// Waiting dependents of `required`, in no particular order.
    pub(crate) fn listeners_of(&self, required: RecognizerId) -> Vec<RecognizerId> {
        self.waiting
            .iter()
            .copied()
            .filter(|dependent| self.required_by.get(dependent) == Some(&required))
            .collect()
    }

    /// Drop every edge that names `id` on either side. Returns the dependents
    /// that lost their requirement.
    pub(crate) fn forget(&mut self, id: RecognizerId) -> Vec<RecognizerId> {
        self.required_by.remove(&id);
        self.waiting.remove(&id);
        let orphans: Vec<RecognizerId> = self
            .required_by
            .iter()
            .filter(|(_, required)| **required == id)
            .map(|(dependent, _)| *dependent)
            .collect();
        for dependent in &orphans {
            self.required_by.remove(dependent);
            self.waiting.remove(dependent);
        }
        orphans
    }

    pub(crate) fn clear(&mut self) {
        self.required_by.clear();
        self.waiting.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> RecognizerId {
        RecognizerId::new(index, 0)
    }

    #[test]
    fn listen_requires_an_edge() {
        let mut graph = FailureGraph::default();
        assert!(!graph.listen(id(1)));
        graph.set(id(1), Some(id(2)));
        assert!(graph.listen(id(1)));
        assert!(graph.is_listening(id(1)));
        assert_eq!(graph.listeners_of(id(2)), vec![id(1)]);
    }

    #[test]
    fn replacing_edge_stops_waiting() {
        let mut graph = FailureGraph::default();
        graph.set(id(1), Some(id(2)));
        graph.listen(id(1));
        graph.set(id(1), Some(id(3)));
        assert!(!graph.is_listening(id(1)));
        assert_eq!(graph.required(id(1)), Some(id(3)));
        assert!(graph.listeners_of(id(2)).is_empty());
    }

    #[test]
    fn forget_drops_both_directions() {
        let mut graph = FailureGraph::default();
        graph.set(id(1), Some(id(2)));
        graph.set(id(2), Some(id(3)));
        graph.set(id(4), Some(id(2)));
        graph.listen(id(1));
        let mut orphans = graph.forget(id(2));
        orphans.sort();
        assert_eq!(orphans, vec![id(1), id(4)]);
        assert_eq!(graph.required(id(2)), None);
        assert_eq!(graph.required(id(1)), None);
        assert!(!graph.is_listening(id(1)));
    }

    #[test]
    fn only_waiting_dependents_are_listeners() {
        let mut graph = FailureGraph::default();
        graph.set(id(1), Some(id(9)));
        graph.set(id(2), Some(id(9)));
        graph.listen(id(2));
        assert_eq!(graph.listeners_of(id(9)), vec![id(2)]);
        graph.stop_listening(id(2));
        assert!(graph.listeners_of(id(9)).is_empty());
    }
}
