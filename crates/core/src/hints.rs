//! Hint Policy bookkeeping: per-stage reveal index and accumulated penalty.

use std::collections::HashMap;

use crate::model::StageId;

/// Whether a reveal was asked for or triggered by a wrong puzzle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSource {
    Manual,
    AutoReveal,
}

/// A hint that was shown, with what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealedHint {
    pub stage: StageId,
    pub index: usize,
    pub text: String,
    pub source: HintSource,
    pub penalty: f64,
}

/// Tracks how far into each stage's hints the player is, and the total
/// penalty charged against the running lesson score.
#[derive(Debug, Clone, PartialEq)]
pub struct HintLedger {
    penalty_per_hint: f64,
    next_index: HashMap<StageId, usize>,
    penalty_total: f64,
    revealed: usize,
}

impl HintLedger {
    #[must_use]
    pub fn new(penalty_per_hint: f64) -> Self {
        Self {
            penalty_per_hint: penalty_per_hint.max(0.0),
            next_index: HashMap::new(),
            penalty_total: 0.0,
            revealed: 0,
        }
    }

    /// Index of the next hint to reveal for `stage`.
    #[must_use]
    pub fn next_index(&self, stage: StageId) -> usize {
        self.next_index.get(&stage).copied().unwrap_or(0)
    }

    /// Record a hint the player asked for; charges the penalty.
    ///
    /// At most `available` is charged, so a hint never takes the running
    /// score below zero and never leaves a debt for later gains to repay.
    /// `next_index` is where the provider says to continue; it never moves
    /// the ledger backwards.
    pub fn record_manual(
        &mut self,
        stage: StageId,
        text: impl Into<String>,
        next_index: Option<usize>,
        available: f64,
    ) -> RevealedHint {
        let penalty = self.penalty_per_hint.min(available.max(0.0));
        self.penalty_total += penalty;
        self.record(stage, text.into(), next_index, HintSource::Manual, penalty)
    }

    /// Record a hint revealed after a wrong puzzle attempt; free.
    pub fn record_auto(&mut self, stage: StageId, text: impl Into<String>) -> RevealedHint {
        self.record(stage, text.into(), None, HintSource::AutoReveal, 0.0)
    }

    fn record(
        &mut self,
        stage: StageId,
        text: String,
        next_index: Option<usize>,
        source: HintSource,
        penalty: f64,
    ) -> RevealedHint {
        let index = self.next_index(stage);
        let following = next_index.unwrap_or(index + 1).max(index + 1);
        self.next_index.insert(stage, following);
        self.revealed += 1;
        RevealedHint {
            stage,
            index,
            text,
            source,
            penalty,
        }
    }

    #[must_use]
    pub fn penalty_total(&self) -> f64 {
        self.penalty_total
    }

    #[must_use]
    pub fn penalty_per_hint(&self) -> f64 {
        self.penalty_per_hint
    }

    /// Hints shown so far, manual and automatic.
    #[must_use]
    pub fn revealed(&self) -> usize {
        self.revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_hints_accumulate_penalty() {
        let mut ledger = HintLedger::new(5.0);
        let stage = StageId::new(1);

        let first = ledger.record_manual(stage, "Look at the knight", None, 50.0);
        assert_eq!(first.index, 0);
        assert_eq!(first.penalty, 5.0);
        ledger.record_manual(stage, "Check the f7 square", None, 45.0);

        assert_eq!(ledger.penalty_total(), 10.0);
        assert_eq!(ledger.next_index(stage), 2);
    }

    #[test]
    fn auto_reveal_is_free_and_shares_the_index() {
        let mut ledger = HintLedger::new(5.0);
        let stage = StageId::new(4);

        let auto = ledger.record_auto(stage, "first");
        assert_eq!(auto.source, HintSource::AutoReveal);
        assert_eq!(ledger.penalty_total(), 0.0);

        let manual = ledger.record_manual(stage, "second", None, 20.0);
        assert_eq!(manual.index, 1);
        assert_eq!(ledger.penalty_total(), 5.0);
        assert_eq!(ledger.revealed(), 2);
    }

    #[test]
    fn indices_are_tracked_per_stage() {
        let mut ledger = HintLedger::new(5.0);
        ledger.record_manual(StageId::new(1), "a", Some(3), 0.0);
        assert_eq!(ledger.next_index(StageId::new(1)), 3);
        assert_eq!(ledger.next_index(StageId::new(2)), 0);
    }

    #[test]
    fn penalty_is_limited_to_what_the_score_can_absorb() {
        let mut ledger = HintLedger::new(5.0);
        let stage = StageId::new(2);

        let free = ledger.record_manual(stage, "nothing to lose yet", None, 0.0);
        assert_eq!(free.penalty, 0.0);
        let partial = ledger.record_manual(stage, "almost nothing", None, 2.5);
        assert_eq!(partial.penalty, 2.5);

        assert_eq!(ledger.penalty_total(), 2.5);
        assert_eq!(ledger.next_index(stage), 2);
    }
}
