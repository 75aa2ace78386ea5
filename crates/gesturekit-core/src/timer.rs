#![forbid(unsafe_code)]

//! Deferred messages keyed by owner and kind.
//!
//! Recognizers never block. A recognizer that needs to wait (double-tap gap,
//! long-press hold, pointer settle delay) schedules a message and returns;
//! the event loop later pops the message and hands it back to its owner.
//!
//! [`TimerService`] is the seam the host scheduler implements. [`TimerQueue`]
//! is the shipped implementation: a virtual clock that only moves when the
//! caller asks for due messages, which keeps tests deterministic.
//!
//! # Invariants
//!
//! 1. Due messages pop in deadline order; equal deadlines pop in the order
//!    they were scheduled.
//! 2. A cancelled message never pops, even if its deadline already passed.
//! 3. Sequence numbers are never reused, so a stale [`TimerHandle`] cannot
//!    cancel a newer message.

use std::collections::BTreeMap;

use web_time::Instant;

/// Identifies one scheduled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    deadline: Instant,
    seq: u64,
}

impl TimerHandle {
    /// When the message is due.
    #[inline]
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// A message whose deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Due<O, M> {
    pub owner: O,
    pub message: M,
    pub payload: Option<i64>,
    pub handle: TimerHandle,
}

impl<O, M> Due<O, M> {
    #[inline]
    pub const fn deadline(&self) -> Instant {
        self.handle.deadline
    }
}

/// Schedule and cancel deferred messages for many owners.
pub trait TimerService<O, M> {
    /// Schedule `message` for `owner` at an absolute deadline.
    fn schedule_at(
        &mut self,
        owner: O,
        deadline: Instant,
        message: M,
        payload: Option<i64>,
    ) -> TimerHandle;

    /// Cancel every pending message of the given kinds for `owner`.
    /// Returns how many were removed.
    fn cancel(&mut self, owner: O, messages: &[M]) -> usize;

    /// Cancel one message. Returns whether it was still pending.
    fn cancel_handle(&mut self, handle: TimerHandle) -> bool;

    /// Cancel everything pending for `owner`.
    fn cancel_all(&mut self, owner: O) -> usize;

    /// Whether `owner` has a pending message of this kind.
    fn has_pending(&self, owner: O, message: M) -> bool;

    /// Earliest pending deadline.
    fn next_deadline(&self) -> Option<Instant>;

    /// Remove and return the earliest message due at or before `now`.
    fn pop_due(&mut self, now: Instant) -> Option<Due<O, M>>;
}

#[derive(Debug, Clone)]
struct Entry<O, M> {
    owner: O,
    message: M,
    payload: Option<i64>,
}

/// Virtual-clock timer queue.
#[derive(Debug, Clone)]
pub struct TimerQueue<O, M> {
    entries: BTreeMap<(Instant, u64), Entry<O, M>>,
    next_seq: u64,
}

impl<O, M> Default for TimerQueue<O, M> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<O, M> TimerQueue<O, M> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending message.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<O, M> TimerQueue<O, M>
where
    O: Copy + Eq + std::fmt::Debug,
    M: Copy + Eq + std::fmt::Debug,
{
    /// Pending messages for `owner`, in firing order.
    pub fn pending_for(&self, owner: O) -> impl Iterator<Item = (M, Instant)> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| e.owner == owner)
            .map(|((deadline, _), e)| (e.message, *deadline))
    }
}

impl<O, M> TimerService<O, M> for TimerQueue<O, M>
where
    O: Copy + Eq + std::fmt::Debug,
    M: Copy + Eq + std::fmt::Debug,
{
    fn schedule_at(
        &mut self,
        owner: O,
        deadline: Instant,
        message: M,
        payload: Option<i64>,
    ) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!(?owner, ?message, ?payload, seq, "timer scheduled");
        self.entries.insert(
            (deadline, seq),
            Entry {
                owner,
                message,
                payload,
            },
        );
        TimerHandle { deadline, seq }
    }

    fn cancel(&mut self, owner: O, messages: &[M]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| !(e.owner == owner && messages.contains(&e.message)));
        before - self.entries.len()
    }

    fn cancel_handle(&mut self, handle: TimerHandle) -> bool {
        self.entries
            .remove(&(handle.deadline, handle.seq))
            .is_some()
    }

    fn cancel_all(&mut self, owner: O) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.owner != owner);
        let removed = before - self.entries.len();
        #[cfg(feature = "tracing")]
        if removed > 0 {
            tracing::trace!(?owner, removed, "timers cancelled");
        }
        removed
    }

    fn has_pending(&self, owner: O, message: M) -> bool {
        self.entries
            .values()
            .any(|e| e.owner == owner && e.message == message)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&mut self, now: Instant) -> Option<Due<O, M>> {
        let (&(deadline, seq), _) = self.entries.first_key_value()?;
        if deadline > now {
            return None;
        }
        let entry = self.entries.remove(&(deadline, seq))?;
        Some(Due {
            owner: entry.owner,
            message: entry.message,
            payload: entry.payload,
            handle: TimerHandle { deadline, seq },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web_time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Msg {
        Reset,
        Fail,
        Settle,
    }

    const MS_10: Duration = Duration::from_millis(10);
    const MS_20: Duration = Duration::from_millis(20);

    fn drain(q: &mut TimerQueue<u8, Msg>, now: Instant) -> Vec<(u8, Msg)> {
        let mut out = Vec::new();
        while let Some(due) = q.pop_due(now) {
            out.push((due.owner, due.message));
        }
        out
    }

    #[test]
    fn pops_in_deadline_order() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(1, t + MS_20, Msg::Fail, None);
        q.schedule_at(2, t + MS_10, Msg::Reset, None);
        assert_eq!(drain(&mut q, t + MS_20), vec![(2, Msg::Reset), (1, Msg::Fail)]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_pop_in_schedule_order() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(3, t, Msg::Settle, Some(1));
        q.schedule_at(1, t, Msg::Reset, None);
        q.schedule_at(2, t, Msg::Fail, None);
        assert_eq!(
            drain(&mut q, t),
            vec![(3, Msg::Settle), (1, Msg::Reset), (2, Msg::Fail)]
        );
    }

    #[test]
    fn nothing_pops_before_deadline() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(1, t + MS_10, Msg::Reset, None);
        assert!(q.pop_due(t).is_none());
        assert_eq!(q.next_deadline(), Some(t + MS_10));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancel_by_kind_only_touches_owner() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(1, t, Msg::Reset, None);
        q.schedule_at(1, t, Msg::Fail, None);
        q.schedule_at(2, t, Msg::Reset, None);
        assert_eq!(q.cancel(1, &[Msg::Reset, Msg::Settle]), 1);
        assert!(q.has_pending(1, Msg::Fail));
        assert!(!q.has_pending(1, Msg::Reset));
        assert!(q.has_pending(2, Msg::Reset));
    }

    #[test]
    fn cancel_all_for_owner() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(1, t, Msg::Reset, None);
        q.schedule_at(1, t + MS_10, Msg::Fail, None);
        q.schedule_at(2, t, Msg::Reset, None);
        assert_eq!(q.cancel_all(1), 2);
        assert_eq!(drain(&mut q, t + MS_20), vec![(2, Msg::Reset)]);
    }

    #[test]
    fn stale_handle_cannot_cancel_newer_message() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        let first = q.schedule_at(1, t, Msg::Settle, Some(2));
        assert!(q.cancel_handle(first));
        let _second = q.schedule_at(1, t, Msg::Settle, Some(1));
        assert!(!q.cancel_handle(first));
        let due = q.pop_due(t).expect("second message pending");
        assert_eq!(due.payload, Some(1));
    }

    #[test]
    fn pending_for_lists_owner_messages() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_at(1, t + MS_20, Msg::Fail, None);
        q.schedule_at(1, t + MS_10, Msg::Reset, None);
        q.schedule_at(2, t, Msg::Settle, None);
        let pending: Vec<_> = q.pending_for(1).map(|(m, _)| m).collect();
        assert_eq!(pending, vec![Msg::Reset, Msg::Fail]);
    }
}
