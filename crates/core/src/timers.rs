//! Cancelable scheduled work keyed by stage.
//!
//! The queue never sleeps; the host asks for [`TimerQueue::next_deadline`] and
//! hands the current instant back to [`TimerQueue::take_due`].

use chrono::{DateTime, Utc};

use crate::model::StageId;
use crate::time::after_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Move on to the next stage.
    AutoAdvance,
    /// Restore the puzzle's starting board after a wrong move.
    PuzzleReset,
}

/// Opaque handle returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub token: TimerToken,
    pub stage: StageId,
    pub kind: TimerKind,
    /// Session epoch at scheduling time.
    pub epoch: u64,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next_token: u64,
    pending: Vec<ScheduledTimer>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` for `stage`, `delay_ms` after `now`. An earlier timer of
    /// the same kind for the same stage is replaced.
    pub fn schedule(
        &mut self,
        stage: StageId,
        kind: TimerKind,
        epoch: u64,
        now: DateTime<Utc>,
        delay_ms: u64,
    ) -> TimerToken {
        self.pending
            .retain(|timer| !(timer.stage == stage && timer.kind == kind));
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending.push(ScheduledTimer {
            token,
            stage,
            kind,
            epoch,
            due_at: after_millis(now, delay_ms),
        });
        token
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.token != token);
        self.pending.len() != before
    }

    /// Cancel everything scheduled for `stage`; returns how many were dropped.
    pub fn cancel_stage(&mut self, stage: StageId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.stage != stage);
        before - self.pending.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledTimer> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|timer| timer.due_at <= now);
        self.pending = pending;
        due.sort_by_key(|timer| (timer.due_at, timer.token));
        due
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(|timer| timer.due_at).min()
    }

    #[must_use]
    pub fn is_scheduled(&self, stage: StageId, kind: TimerKind) -> bool {
        self.pending
            .iter()
            .any(|timer| timer.stage == stage && timer.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn due_timers_are_taken_in_order() {
        let now = fixed_now();
        let mut queue = TimerQueue::new();
        queue.schedule(StageId::new(2), TimerKind::AutoAdvance, 0, now, 1500);
        queue.schedule(StageId::new(1), TimerKind::PuzzleReset, 0, now, 1000);

        assert_eq!(queue.next_deadline(), Some(now + Duration::milliseconds(1000)));
        assert!(queue.take_due(now).is_empty());

        let due = queue.take_due(now + Duration::milliseconds(2000));
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, TimerKind::PuzzleReset);
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn rescheduling_replaces_the_same_kind() {
        let now = fixed_now();
        let mut queue = TimerQueue::new();
        let first = queue.schedule(StageId::new(1), TimerKind::PuzzleReset, 0, now, 1000);
        queue.schedule(StageId::new(1), TimerKind::PuzzleReset, 0, now, 3000);
        queue.schedule(StageId::new(1), TimerKind::AutoAdvance, 0, now, 3000);

        assert_eq!(queue.len(), 2);
        assert!(!queue.cancel(first));
    }

    #[test]
    fn canceling_a_stage_leaves_others() {
        let now = fixed_now();
        let mut queue = TimerQueue::new();
        queue.schedule(StageId::new(1), TimerKind::PuzzleReset, 0, now, 10);
        queue.schedule(StageId::new(1), TimerKind::AutoAdvance, 0, now, 10);
        let other = queue.schedule(StageId::new(2), TimerKind::AutoAdvance, 1, now, 10);

        assert_eq!(queue.cancel_stage(StageId::new(1)), 2);
        assert!(queue.is_scheduled(StageId::new(2), TimerKind::AutoAdvance));
        assert!(queue.cancel(other));
        assert_eq!(queue.cancel_all(), 0);
    }
}
