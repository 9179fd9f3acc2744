use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use lesson_core::board::{LoadedPosition, PositionNotice, load_position};
use lesson_core::completion::{ScoreBasis, build_report, submitted_attempts};
use lesson_core::guard::InFlight;
use lesson_core::hints::{HintLedger, RevealedHint};
use lesson_core::model::{
    CompletionReport, EngineSettings, Feedback, FeedbackKind, Lesson, LessonId, LessonKind,
    QuestionKey, RewardMetadata, SessionId, Stage, StageId, StageProgress,
};
use lesson_core::quiz::{QuizAnswer, QuizScorer};
use lesson_core::rules::{BoardPosition, MoveRequest, RulesEngine};
use lesson_core::scoring::{StagePolicy, StageTransition, is_graded_stage, lesson_score, round2};
use lesson_core::time::elapsed_seconds;
use lesson_core::timers::{TimerKind, TimerQueue};
use storage::repository::StageProgressRecord;

use super::outcome::{
    Advance, HintOutcome, HintRequest, MoveOutcome, MoveRejection, MoveStep, PendingMove,
    TimerEvent,
};
use crate::error::{RemoteError, SessionError};
use crate::remote::{HintResponse, Verdict};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One player working through one lesson.
///
/// Owns every piece of mutable lesson state. Calls that wait on a
/// collaborator are split in two (`begin_*` / `complete_*`); results that
/// arrive after the stage changed are discarded by comparing epochs.
pub struct LessonSession {
    id: SessionId,
    lesson: Lesson,
    settings: EngineSettings,
    rules: Arc<dyn RulesEngine>,
    policy: StagePolicy,
    progress: Vec<StageProgress>,
    dirty: BTreeSet<usize>,
    current: usize,
    board: BoardPosition,
    notice: Option<PositionNotice>,
    feedback: Option<Feedback>,
    current_hint: Option<RevealedHint>,
    move_guard: InFlight,
    move_ticket: u64,
    hint_guard: InFlight,
    completion_guard: InFlight,
    hints: HintLedger,
    quiz: QuizScorer,
    timers: TimerQueue,
    epoch: u64,
    started_at: DateTime<Utc>,
    stage_entered_at: DateTime<Utc>,
    report: Option<CompletionReport>,
    reward: Option<RewardMetadata>,
}

impl std::fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonSession")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl LessonSession {
    /// Start a session, hydrating any progress saved for this lesson.
    ///
    /// The first stage that is not completed becomes current; when every stage
    /// is already complete the lesson starts over at stage 0.
    #[must_use]
    pub fn start(
        lesson: Lesson,
        prior: &[StageProgressRecord],
        settings: EngineSettings,
        rules: Arc<dyn RulesEngine>,
        now: DateTime<Utc>,
    ) -> Self {
        let policy = StagePolicy::new(lesson.total_stages(), settings.max_attempts());
        let progress: Vec<StageProgress> = lesson
            .stages()
            .iter()
            .map(|stage| {
                prior
                    .iter()
                    .find(|r| r.lesson_id == lesson.id() && r.stage_id == stage.id)
                    .map_or_else(StageProgress::default, |r| {
                        policy.hydrate(r.attempts, r.best_score, r.is_completed, r.is_locked)
                    })
            })
            .collect();
        let first = progress
            .iter()
            .position(|p| !p.is_completed())
            .unwrap_or(0);

        let mut session = Self {
            id: SessionId::generate(),
            quiz: QuizScorer::new(lesson.total_quiz_questions(), &settings),
            hints: HintLedger::new(settings.hint_penalty()),
            board: rules.starting_position(),
            lesson,
            settings,
            rules,
            policy,
            progress,
            dirty: BTreeSet::new(),
            current: first,
            notice: None,
            feedback: None,
            current_hint: None,
            move_guard: InFlight::new(),
            move_ticket: 0,
            hint_guard: InFlight::new(),
            completion_guard: InFlight::new(),
            timers: TimerQueue::new(),
            epoch: 0,
            started_at: now,
            stage_entered_at: now,
            report: None,
            reward: None,
        };
        session.enter_stage(first, now);
        session
    }

    //
    // ─── MOVES ─────────────────────────────────────────────────────────────────
    //

    /// First phase of a move: guard checks and the local legality check.
    ///
    /// # Errors
    ///
    /// Returns `MoveRejection` when the move is refused outright. Rejections
    /// never touch attempts or scores.
    pub fn begin_move(
        &mut self,
        request: &MoveRequest,
        now: DateTime<Utc>,
    ) -> Result<MoveStep, MoveRejection> {
        if self.report.is_some() {
            return Err(MoveRejection::NoActiveStage);
        }
        if self.move_guard.is_busy() {
            return Err(MoveRejection::Busy);
        }
        let stage_id = self.current_stage().id;
        let progress = self.progress[self.current];
        if progress.is_locked() {
            self.feedback = Some(Feedback::stage_locked());
            return Err(MoveRejection::StageLocked);
        }
        let graded = self.is_current_graded();
        if graded && progress.is_completed() {
            return Err(MoveRejection::StageCompleted);
        }
        if self.timers.is_scheduled(stage_id, TimerKind::PuzzleReset) {
            return Err(MoveRejection::ResetPending);
        }
        if !self.move_guard.try_acquire() {
            return Err(MoveRejection::Busy);
        }

        let free = self.lesson.flags().allow_all_moves || self.board.is_custom();
        let played = if free {
            self.rules.relocate(&self.board, request)
        } else {
            self.rules.play(&self.board, request)
        };
        let Ok(played) = played else {
            self.move_guard.release();
            let feedback = Feedback::invalid_move();
            self.feedback = Some(feedback.clone());
            return Ok(MoveStep::Settled(MoveOutcome::Invalid { feedback }));
        };

        if !graded {
            self.move_guard.release();
            self.board = played.position.clone();
            return Ok(MoveStep::Settled(MoveOutcome::Played {
                notation: played.notation,
                position: played.position,
            }));
        }

        self.move_ticket += 1;
        Ok(MoveStep::Pending(PendingMove {
            lesson_id: self.lesson.id(),
            stage_id,
            epoch: self.epoch,
            notation: played.notation,
            position: played.position,
            elapsed_seconds: elapsed_seconds(self.stage_entered_at, now),
            ticket: self.move_ticket,
        }))
    }

    /// Second phase of a graded move: apply the validator's verdict.
    ///
    /// Only the outstanding move is settled. A move settled before, or one
    /// that is not the latest, is discarded and leaves the guard alone.
    pub fn complete_move(
        &mut self,
        pending: PendingMove,
        verdict: Result<Verdict, RemoteError>,
        now: DateTime<Utc>,
    ) -> MoveOutcome {
        if !self.move_guard.is_busy() || pending.ticket != self.move_ticket {
            return MoveOutcome::Discarded;
        }
        self.move_guard.release();
        if self.is_stale(pending.stage_id, pending.epoch) {
            return MoveOutcome::Discarded;
        }
        let Ok(verdict) = verdict else {
            let feedback = Feedback::try_again();
            self.feedback = Some(feedback.clone());
            return MoveOutcome::Unjudged { feedback };
        };

        let index = self.current;
        let stage_id = pending.stage_id;
        let kind = FeedbackKind::from_remote(&verdict.feedback_type, verdict.success);

        let outcome = if verdict.success {
            let score = match self.policy.apply_success(&mut self.progress[index]) {
                StageTransition::Solved { score } => score,
                StageTransition::Retry { .. } | StageTransition::Locked => 0.0,
            };
            self.board = pending.position;
            let auto_advance = self.current_stage().auto_advance;
            if let Some(auto) = auto_advance {
                let delay = auto
                    .delay_ms
                    .unwrap_or(self.settings.auto_advance_delay_ms());
                self.timers
                    .schedule(stage_id, TimerKind::AutoAdvance, self.epoch, now, delay);
            }
            MoveOutcome::Solved {
                score,
                feedback: Feedback::new(kind, message_or(verdict.feedback_message, "correct")),
            }
        } else {
            let transition = self.policy.apply_failure(&mut self.progress[index]);
            if let StageTransition::Retry { remaining } = transition {
                let feedback = Feedback::new(kind, message_or(verdict.feedback_message, "incorrect"))
                    .with_remaining(remaining);
                let revealed_hint = if self.lesson.kind() == LessonKind::Puzzle {
                    self.board = pending.position;
                    self.timers.schedule(
                        stage_id,
                        TimerKind::PuzzleReset,
                        self.epoch,
                        now,
                        self.settings.puzzle_reset_delay_ms(),
                    );
                    self.auto_reveal_hint()
                } else {
                    None
                };
                MoveOutcome::Failed {
                    remaining,
                    feedback,
                    revealed_hint,
                }
            } else {
                self.timers.cancel_stage(stage_id);
                self.timers.schedule(
                    stage_id,
                    TimerKind::AutoAdvance,
                    self.epoch,
                    now,
                    self.settings.auto_advance_delay_ms(),
                );
                MoveOutcome::Locked {
                    feedback: Feedback::locked_out(self.policy.max_attempts()),
                }
            }
        };

        self.dirty.insert(index);
        self.feedback = outcome.feedback().cloned();
        outcome
    }

    fn auto_reveal_hint(&mut self) -> Option<RevealedHint> {
        if !self.lesson.flags().hints_enabled {
            return None;
        }
        let stage = self.current_stage();
        let stage_id = stage.id;
        let text = stage
            .hints()
            .get(self.hints.next_index(stage_id))?
            .clone();
        let hint = self.hints.record_auto(stage_id, text);
        self.current_hint = Some(hint.clone());
        Some(hint)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next stage, or finish the lesson from the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AdvanceBlocked` until the current stage allows
    /// moving on, and `SessionError::Finished` once the lesson is over.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if self.report.is_some() {
            return Err(SessionError::Finished);
        }
        if !self.can_advance() {
            return Err(SessionError::AdvanceBlocked);
        }

        let index = self.current;
        if !self.is_current_graded() && !self.progress[index].is_completed() {
            self.policy.apply_visit(&mut self.progress[index]);
            self.dirty.insert(index);
        }

        if index + 1 >= self.lesson.total_stages() {
            let basis = self.default_basis();
            return Ok(Advance::Finished(self.finish(basis, now)));
        }
        let notice = self.enter_stage(index + 1, now);
        Ok(Advance::Stage {
            index: index + 1,
            notice,
        })
    }

    /// Go back one stage. Progress of the stage left is untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstStage` on stage 0 and
    /// `SessionError::Finished` once the lesson is over.
    pub fn retreat(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if self.report.is_some() {
            return Err(SessionError::Finished);
        }
        if self.current == 0 {
            return Err(SessionError::AtFirstStage);
        }
        let index = self.current - 1;
        let notice = self.enter_stage(index, now);
        Ok(Advance::Stage { index, notice })
    }

    /// Put the current stage's board back to its starting position.
    ///
    /// On graded stages this costs an attempt; the reset that uses up the last
    /// one locks the stage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` while a move is being judged,
    /// `SessionError::StageLocked` on locked stages and
    /// `SessionError::Finished` once the lesson is over.
    pub fn reset_current_stage(&mut self) -> Result<Option<PositionNotice>, SessionError> {
        if self.report.is_some() {
            return Err(SessionError::Finished);
        }
        if self.move_guard.is_busy() {
            return Err(SessionError::Busy);
        }
        let index = self.current;
        if self.progress[index].is_locked() {
            return Err(SessionError::StageLocked);
        }

        self.timers.cancel_stage(self.current_stage().id);
        let mut locked = false;
        if self.is_current_graded() {
            let transition = self.policy.apply_reset(&mut self.progress[index]);
            locked = transition == StageTransition::Locked;
            self.dirty.insert(index);
        }
        let loaded = self.load_stage_board();
        self.board = loaded.board;
        self.notice.clone_from(&loaded.notice);
        self.feedback = locked.then(|| Feedback::locked_out(self.policy.max_attempts()));
        Ok(loaded.notice)
    }

    fn enter_stage(&mut self, index: usize, now: DateTime<Utc>) -> Option<PositionNotice> {
        self.timers.cancel_all();
        self.epoch += 1;
        self.current = index;
        self.stage_entered_at = now;
        self.feedback = None;
        self.current_hint = None;
        self.quiz.clear_selections();

        let loaded = self.load_stage_board();
        self.board = loaded.board;
        self.notice.clone_from(&loaded.notice);

        if self.current_stage().is_demonstration {
            self.policy.apply_demonstration(&mut self.progress[index]);
            self.dirty.insert(index);
        }
        loaded.notice
    }

    fn load_stage_board(&self) -> LoadedPosition {
        let description = self.current_stage().position().unwrap_or_default();
        load_position(
            self.rules.as_ref(),
            description,
            self.lesson.flags().allow_invalid_position,
        )
    }

    /// Whether the player may move on from the current stage right now.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        if self.report.is_some() {
            return false;
        }
        if self.is_current_graded() {
            return self.progress[self.current].state().is_terminal();
        }
        let questions = self.current_stage().quiz().len();
        (0..questions).all(|q| self.quiz.is_answered(QuestionKey::new(self.current, q)))
    }

    //
    // ─── HINTS ─────────────────────────────────────────────────────────────────
    //

    /// First phase of a manual hint. `None` when hints are off, a request is
    /// already outstanding, or the lesson is over.
    pub fn begin_hint(&mut self) -> Option<HintRequest> {
        if self.report.is_some() || !self.lesson.flags().hints_enabled {
            return None;
        }
        if !self.hint_guard.try_acquire() {
            return None;
        }
        let stage_id = self.current_stage().id;
        Some(HintRequest {
            lesson_id: self.lesson.id(),
            stage_id,
            index: self.hints.next_index(stage_id),
            epoch: self.epoch,
        })
    }

    /// Second phase of a manual hint. Charges the hint penalty when a hint is
    /// actually revealed.
    pub fn complete_hint(
        &mut self,
        request: HintRequest,
        result: Result<Option<HintResponse>, RemoteError>,
    ) -> HintOutcome {
        if !self.hint_guard.is_busy() {
            return HintOutcome::Discarded;
        }
        self.hint_guard.release();
        if self.is_stale(request.stage_id, request.epoch) {
            return HintOutcome::Discarded;
        }
        match result {
            Err(_) => {
                let feedback = Feedback::try_again();
                self.feedback = Some(feedback.clone());
                HintOutcome::Unavailable { feedback }
            }
            Ok(None) => HintOutcome::Exhausted,
            Ok(Some(response)) => {
                let available = self.running_score();
                let hint = self.hints.record_manual(
                    request.stage_id,
                    response.text,
                    response.next_index,
                    available,
                );
                if self.is_quiz_scored() {
                    self.quiz.charge(hint.penalty);
                }
                self.current_hint = Some(hint.clone());
                HintOutcome::Revealed(hint)
            }
        }
    }

    //
    // ─── QUIZ ──────────────────────────────────────────────────────────────────
    //

    /// Select `option` for quiz question `question` of the current slide.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSuchQuestion` for an unknown question and
    /// `SessionError::Quiz` when the quiz policy refuses the selection.
    pub fn answer_quiz(
        &mut self,
        question: usize,
        option: usize,
    ) -> Result<QuizAnswer, SessionError> {
        if self.report.is_some() {
            return Err(SessionError::Finished);
        }
        let item = self
            .current_stage()
            .quiz()
            .get(question)
            .cloned()
            .ok_or(SessionError::NoSuchQuestion(question))?;
        let answer = self
            .quiz
            .answer(QuestionKey::new(self.current, question), option, &item)?;
        self.feedback = Some(if answer.correct {
            Feedback::new(FeedbackKind::Success, "correct")
        } else {
            Feedback::new(FeedbackKind::Failure, "not quite, try another answer")
        });
        Ok(answer)
    }

    //
    // ─── TIMERS ────────────────────────────────────────────────────────────────
    //

    /// Run every timer due at `now`. Timers scheduled for a stage that is no
    /// longer current are dropped.
    pub fn fire_due_timers(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let due = self.timers.take_due(now);
        let mut events = Vec::with_capacity(due.len());
        for timer in due {
            if self.is_stale(timer.stage, timer.epoch) {
                events.push(TimerEvent::Stale { stage: timer.stage });
                continue;
            }
            match timer.kind {
                TimerKind::AutoAdvance => match self.advance(now) {
                    Ok(advance) => events.push(TimerEvent::Advanced(advance)),
                    Err(_) => events.push(TimerEvent::Stale { stage: timer.stage }),
                },
                TimerKind::PuzzleReset => {
                    let loaded = self.load_stage_board();
                    self.board = loaded.board;
                    self.feedback = None;
                    events.push(TimerEvent::PuzzleReset { stage: timer.stage });
                }
            }
        }
        events
    }

    #[must_use]
    pub fn next_timer_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.next_deadline()
    }

    /// Cancel every pending timer; returns how many were canceled.
    pub fn teardown(&mut self) -> usize {
        self.epoch += 1;
        self.timers.cancel_all()
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// End a practice lesson with the score its session reported (100 when
    /// none was given). The stage the player is on counts as visited.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPractice` for other lesson kinds and
    /// `SessionError::Finished` when already finished.
    pub fn finish_practice(
        &mut self,
        score: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<CompletionReport, SessionError> {
        if self.lesson.kind() != LessonKind::Practice {
            return Err(SessionError::NotPractice);
        }
        if self.report.is_some() {
            return Err(SessionError::Finished);
        }
        let index = self.current;
        if !self.is_current_graded() && !self.progress[index].is_completed() {
            self.policy.apply_visit(&mut self.progress[index]);
            self.dirty.insert(index);
        }
        let basis = ScoreBasis::Practice {
            score: score.unwrap_or(100.0),
        };
        Ok(self.finish(basis, now))
    }

    fn default_basis(&self) -> ScoreBasis {
        match self.lesson.kind() {
            LessonKind::Puzzle | LessonKind::Interactive => ScoreBasis::Graded {
                aggregate: self.lesson_score(),
            },
            LessonKind::Theory if self.quiz.total_questions() > 0 => ScoreBasis::Quiz {
                correct: self.quiz.correct_answers(),
                total: self.quiz.total_questions(),
            },
            LessonKind::Theory => ScoreBasis::Timed {
                expected_secs: self.lesson.expected_duration_secs(),
            },
            LessonKind::Practice => ScoreBasis::Practice { score: 100.0 },
        }
    }

    fn finish(&mut self, basis: ScoreBasis, now: DateTime<Utc>) -> CompletionReport {
        self.teardown();
        let report = build_report(
            basis,
            elapsed_seconds(self.started_at, now),
            submitted_attempts(&self.progress),
            self.settings.time_score_floor(),
        );
        self.report = Some(report);
        report
    }

    /// Claim the completion report for submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the lesson ends and
    /// `SessionError::Busy` while another submission is outstanding.
    pub fn begin_completion(&mut self) -> Result<CompletionReport, SessionError> {
        let report = self.report.ok_or(SessionError::NotFinished)?;
        if !self.completion_guard.try_acquire() {
            return Err(SessionError::Busy);
        }
        Ok(report)
    }

    /// Release the submission guard; `reward` is `None` when it failed.
    pub fn complete_completion(&mut self, reward: Option<RewardMetadata>) {
        self.completion_guard.release();
        if reward.is_some() {
            self.reward = reward;
        }
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    /// Stage progress changed since the last call, ready to be saved.
    pub fn take_dirty(&mut self) -> Vec<StageProgressRecord> {
        let lesson_id = self.lesson.id();
        std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|index| {
                let stage = self.lesson.stage(index)?;
                Some(StageProgressRecord::from_progress(
                    lesson_id,
                    stage.id,
                    &self.progress[index],
                ))
            })
            .collect()
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    fn is_stale(&self, stage: StageId, epoch: u64) -> bool {
        self.report.is_some() || epoch != self.epoch || stage != self.current_stage().id
    }

    fn is_current_graded(&self) -> bool {
        is_graded_stage(self.lesson.kind(), self.current_stage())
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson.id()
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_stage(&self) -> &Stage {
        &self.lesson.stages()[self.current]
    }

    #[must_use]
    pub fn current_progress(&self) -> StageProgress {
        self.progress[self.current]
    }

    #[must_use]
    pub fn stage_progress(&self, index: usize) -> Option<StageProgress> {
        self.progress.get(index).copied()
    }

    #[must_use]
    pub fn progress(&self) -> &[StageProgress] {
        &self.progress
    }

    #[must_use]
    pub fn board(&self) -> &BoardPosition {
        &self.board
    }

    /// Loader notice for the current board, if it needed a fallback.
    #[must_use]
    pub fn notice(&self) -> Option<&PositionNotice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn current_hint(&self) -> Option<&RevealedHint> {
        self.current_hint.as_ref()
    }

    #[must_use]
    pub fn hint_penalty_total(&self) -> f64 {
        self.hints.penalty_total()
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizScorer {
        &self.quiz
    }

    #[must_use]
    pub fn is_move_in_flight(&self) -> bool {
        self.move_guard.is_busy()
    }

    #[must_use]
    pub fn is_hint_in_flight(&self) -> bool {
        self.hint_guard.is_busy()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Lesson aggregate: best scores capped at 100, hint penalties applied.
    #[must_use]
    pub fn lesson_score(&self) -> f64 {
        round2(lesson_score(&self.progress, self.hints.penalty_total()))
    }

    /// The score shown while playing. Quiz lessons count quiz points instead
    /// of stage scores.
    #[must_use]
    pub fn running_score(&self) -> f64 {
        if self.is_quiz_scored() {
            round2(self.quiz.running_score())
        } else {
            self.lesson_score()
        }
    }

    fn is_quiz_scored(&self) -> bool {
        self.lesson.kind() == LessonKind::Theory && self.quiz.total_questions() > 0
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }

    #[must_use]
    pub fn report(&self) -> Option<CompletionReport> {
        self.report
    }

    /// Reward returned by the persistence side, once submission succeeded.
    #[must_use]
    pub fn reward(&self) -> Option<RewardMetadata> {
        self.reward
    }
}

impl Drop for LessonSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn message_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}
