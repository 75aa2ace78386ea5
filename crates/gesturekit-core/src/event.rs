#![forbid(unsafe_code)]

//! Normalized multi-touch pointer samples.
//!
//! A [`PointerSample`] is one step of a contact stream: the ordered list of
//! contacts on the surface, the [`Phase`] that produced the sample, and a
//! monotonic timestamp.
//!
//! # Stream shape
//!
//! A well-formed stream looks like
//! `Down (Move | PointerDown | PointerUp)* (Up | Cancel)`.
//!
//! - `Down` carries exactly the first contact.
//! - `PointerDown { index }` already lists the new contact at `index`.
//! - `PointerUp { index }` still lists the lifting contact at `index`; it is
//!   excluded from the [`focus`](PointerSample::focus).
//! - `Up` lists the last contact as it lifts.
//!
//! # Failure Modes
//!
//! Samples with no contacts are tolerated: the focus degenerates to the
//! origin with a count of zero and recognizers treat it as a wrong count.

use web_time::Instant;

use crate::geometry::Point;

/// Stable identity of one finger for the lifetime of its contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// One active contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: PointerId,
    pub position: Point,
}

impl Contact {
    #[inline]
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id: PointerId(id),
            position: Point::new(x, y),
        }
    }
}

/// What happened to produce a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First contact touched down; starts a new stream.
    Down,
    /// An additional contact touched down at `index`.
    PointerDown { index: usize },
    /// One or more contacts moved.
    Move,
    /// A non-final contact at `index` lifted.
    PointerUp { index: usize },
    /// The last contact lifted; ends the stream.
    Up,
    /// The host aborted the stream.
    Cancel,
}

impl Phase {
    /// Whether this phase closes the contact stream.
    #[inline]
    #[must_use]
    pub const fn ends_stream(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }

    /// Whether the set of contacts changes with this phase.
    #[inline]
    #[must_use]
    pub const fn changes_contacts(self) -> bool {
        matches!(
            self,
            Self::Down | Self::PointerDown { .. } | Self::PointerUp { .. }
        )
    }
}

/// Mean location of the contacts that remain down after a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub point: Point,
    pub count: usize,
}

/// A normalized pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerSample {
    pub contacts: Vec<Contact>,
    pub phase: Phase,
    pub timestamp: Instant,
    /// Surface-absolute location of the primary contact, used for edge tests.
    pub raw: Point,
}

impl PointerSample {
    /// Create a sample whose raw location is the primary contact's position.
    pub fn new(phase: Phase, contacts: Vec<Contact>, timestamp: Instant) -> Self {
        let raw = contacts.first().map_or(Point::ZERO, |c| c.position);
        Self {
            contacts,
            phase,
            timestamp,
            raw,
        }
    }

    /// Override the surface-absolute location.
    #[must_use]
    pub fn with_raw(mut self, raw: Point) -> Self {
        self.raw = raw;
        self
    }

    /// Number of contacts listed in the sample, including a lifting one.
    #[inline]
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.contacts.len()
    }

    /// Index of the contact that went down or up, if any.
    #[inline]
    #[must_use]
    pub fn action_index(&self) -> Option<usize> {
        match self.phase {
            Phase::PointerDown { index } | Phase::PointerUp { index } => Some(index),
            Phase::Down | Phase::Up => Some(0),
            Phase::Move | Phase::Cancel => None,
        }
    }

    /// Index of the contact with `id`.
    #[must_use]
    pub fn index_of(&self, id: PointerId) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    /// Position of the contact with `id`.
    #[must_use]
    pub fn position_of(&self, id: PointerId) -> Option<Point> {
        self.contacts
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.position)
    }

    /// Contacts that remain down after this sample.
    pub fn remaining(&self) -> impl Iterator<Item = &Contact> {
        let skip = match self.phase {
            Phase::PointerUp { index } => Some(index),
            _ => None,
        };
        self.contacts
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != skip)
            .map(|(_, c)| c)
    }

    /// Mean location of the remaining contacts and how many there are.
    #[must_use]
    pub fn focus(&self) -> Focus {
        let mut sum = Point::ZERO;
        let mut count = 0usize;
        for contact in self.remaining() {
            sum = sum + contact.position;
            count += 1;
        }
        if count == 0 {
            return Focus {
                point: Point::ZERO,
                count: 0,
            };
        }
        let div = count as f32;
        Focus {
            point: Point::new(sum.x / div, sum.y / div),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_fingers(phase: Phase) -> PointerSample {
        PointerSample::new(
            phase,
            vec![Contact::new(0, 10.0, 10.0), Contact::new(1, 30.0, 50.0)],
            Instant::now(),
        )
    }

    #[test]
    fn focus_is_mean_of_contacts() {
        let focus = two_fingers(Phase::Move).focus();
        assert_eq!(focus.count, 2);
        assert_eq!(focus.point, Point::new(20.0, 30.0));
    }

    #[test]
    fn focus_excludes_lifting_contact() {
        let focus = two_fingers(Phase::PointerUp { index: 1 }).focus();
        assert_eq!(focus.count, 1);
        assert_eq!(focus.point, Point::new(10.0, 10.0));
    }

    #[test]
    fn empty_sample_has_zero_focus() {
        let sample = PointerSample::new(Phase::Cancel, Vec::new(), Instant::now());
        let focus = sample.focus();
        assert_eq!(focus.count, 0);
        assert_eq!(focus.point, Point::ZERO);
    }

    #[test]
    fn raw_defaults_to_primary_contact() {
        let sample = two_fingers(Phase::Move);
        assert_eq!(sample.raw, Point::new(10.0, 10.0));
        let moved = sample.with_raw(Point::new(1.0, 2.0));
        assert_eq!(moved.raw, Point::new(1.0, 2.0));
    }

    #[test]
    fn lookup_by_id() {
        let sample = two_fingers(Phase::Move);
        assert_eq!(sample.index_of(PointerId(1)), Some(1));
        assert_eq!(sample.position_of(PointerId(1)), Some(Point::new(30.0, 50.0)));
        assert_eq!(sample.index_of(PointerId(7)), None);
    }

    #[test]
    fn phase_classification() {
        assert!(Phase::Up.ends_stream());
        assert!(Phase::Cancel.ends_stream());
        assert!(!Phase::Move.ends_stream());
        assert!(Phase::PointerDown { index: 1 }.changes_contacts());
        assert!(!Phase::Move.changes_contacts());
    }
}
