#![forbid(unsafe_code)]

//! Generational arena of recognizers with a stable insertion order.
//!
//! While a recognizer runs, its slot is marked as running and the record is
//! moved out, so the running recognizer can read every peer through the
//! registry without aliasing itself.

use crate::recognizer::{Recognizer, RecognizerId};

#[derive(Debug)]
enum SlotState {
    Vacant,
    Occupied(Box<Recognizer>),
    Running,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    state: SlotState,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: Vec<Slot>,
    order: Vec<RecognizerId>,
    free: Vec<u32>,
}

impl Registry {
    pub(crate) fn insert(&mut self, recognizer: Recognizer) -> RecognizerId {
        let boxed = Box::new(recognizer);
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.state = SlotState::Occupied(boxed);
                RecognizerId::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Occupied(boxed),
                });
                RecognizerId::new(index, 0)
            }
        };
        self.order.push(id);
        id
    }

    fn slot(&self, id: RecognizerId) -> Option<&Slot> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
    }

    fn slot_mut(&mut self, id: RecognizerId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
    }

    /// Whether `id` names a live recognizer, running or not.
    pub(crate) fn contains(&self, id: RecognizerId) -> bool {
        self.slot(id)
            .is_some_and(|slot| !matches!(slot.state, SlotState::Vacant))
    }

    pub(crate) fn get(&self, id: RecognizerId) -> Option<&Recognizer> {
        match &self.slot(id)?.state {
            SlotState::Occupied(recognizer) => Some(recognizer),
            SlotState::Vacant | SlotState::Running => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: RecognizerId) -> Option<&mut Recognizer> {
        match &mut self.slot_mut(id)?.state {
            SlotState::Occupied(recognizer) => Some(recognizer),
            SlotState::Vacant | SlotState::Running => None,
        }
    }

    /// Move a recognizer out so it can run against the rest of the registry.
    pub(crate) fn take(&mut self, id: RecognizerId) -> Option<Box<Recognizer>> {
        let slot = self.slot_mut(id)?;
        match std::mem::replace(&mut slot.state, SlotState::Running) {
            SlotState::Occupied(recognizer) => Some(recognizer),
            other => {
                slot.state = other;
                None
            }
        }
    }

    /// Put back a recognizer taken with [`take`](Self::take).
    pub(crate) fn restore(&mut self, id: RecognizerId, recognizer: Box<Recognizer>) {
        if let Some(slot) = self.slot_mut(id) {
            debug_assert!(matches!(slot.state, SlotState::Running));
            slot.state = SlotState::Occupied(recognizer);
        }
    }

    pub(crate) fn remove(&mut self, id: RecognizerId) -> Option<Box<Recognizer>> {
        let slot = self.slot_mut(id)?;
        let recognizer = match std::mem::replace(&mut slot.state, SlotState::Vacant) {
            SlotState::Occupied(recognizer) => recognizer,
            other => {
                slot.state = other;
                return None;
            }
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.order.retain(|member| *member != id);
        Some(recognizer)
    }

    /// Live ids in insertion order.
    pub(crate) fn ids(&self) -> &[RecognizerId] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Every non-running recognizer in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (RecognizerId, &Recognizer)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.get(*id).map(|recognizer| (*id, recognizer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::{Pan, Tap};

    #[test]
    fn insert_keeps_order() {
        let mut registry = Registry::default();
        let a = registry.insert(Recognizer::new(Tap::new()));
        let b = registry.insert(Recognizer::new(Pan::new()));
        assert_eq!(registry.ids(), &[a, b]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn removed_slot_is_reused_with_new_generation() {
        let mut registry = Registry::default();
        let a = registry.insert(Recognizer::new(Tap::new()));
        assert!(registry.remove(a).is_some());
        assert!(!registry.contains(a));
        let b = registry.insert(Recognizer::new(Pan::new()));
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn running_recognizer_is_hidden_but_alive() {
        let mut registry = Registry::default();
        let a = registry.insert(Recognizer::new(Tap::new()));
        let b = registry.insert(Recognizer::new(Pan::new()));
        let taken = registry.take(a).expect("present");
        assert!(registry.contains(a));
        assert!(registry.get(a).is_none());
        assert_eq!(registry.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![b]);
        assert!(registry.take(a).is_none());
        registry.restore(a, taken);
        assert!(registry.get(a).is_some());
    }

    #[test]
    fn removing_twice_misses() {
        let mut registry = Registry::default();
        let a = registry.insert(Recognizer::new(Tap::new()));
        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.len(), 0);
    }
}
