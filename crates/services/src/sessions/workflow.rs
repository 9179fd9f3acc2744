use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use lesson_core::board::{NoticeSeverity, PositionNotice};
use lesson_core::model::{CompletionReport, EngineSettings, LessonId, RewardMetadata};
use lesson_core::quiz::QuizAnswer;
use lesson_core::rules::{MoveRequest, RulesEngine, ShakmatyRules};
use storage::repository::{LessonRepository, ProgressRepository};

use super::outcome::{Advance, HintOutcome, MoveOutcome, MoveStep, TimerEvent};
use super::service::LessonSession;
use crate::Clock;
use crate::error::SessionError;
use crate::remote::{HintProvider, MoveValidator};

/// Orchestrates a lesson session against storage and the remote collaborators.
///
/// Owns no session state; every call takes the session it acts on. Progress
/// is saved after each call that changed it, and a failed save never blocks
/// the player.
#[derive(Clone)]
pub struct LessonLoopService {
    clock: Clock,
    settings: EngineSettings,
    rules: Arc<dyn RulesEngine>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    validator: Arc<dyn MoveValidator>,
    hints: Arc<dyn HintProvider>,
}

impl LessonLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        validator: Arc<dyn MoveValidator>,
        hints: Arc<dyn HintProvider>,
    ) -> Self {
        Self {
            clock,
            settings: EngineSettings::default(),
            rules: Arc::new(ShakmatyRules::new()),
            lessons,
            progress,
            validator,
            hints,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Arc<dyn RulesEngine>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Load a lesson and its saved progress and start a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ContentLoad` if the lesson does not exist and
    /// `SessionError::Storage` if it cannot be read.
    #[instrument(skip(self))]
    pub async fn start_lesson(&self, lesson_id: LessonId) -> Result<LessonSession, SessionError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(SessionError::ContentLoad(lesson_id))?;

        let prior = match self.progress.load_progress(lesson_id).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(error = %e, "could not load saved progress, starting fresh");
                Vec::new()
            }
        };

        let now = self.clock.now();
        let mut session = LessonSession::start(
            lesson,
            &prior,
            self.settings,
            Arc::clone(&self.rules),
            now,
        );
        info!(
            session = %session.id(),
            stage = session.current_index(),
            total = session.lesson().total_stages(),
            "lesson started"
        );
        if let Some(notice) = session.notice() {
            log_notice(notice);
        }

        if let Err(e) = self.progress.record_start(lesson_id, session.id(), now).await {
            warn!(error = %e, "could not record lesson start");
        }
        self.persist(&mut session).await;
        Ok(session)
    }

    /// Check and judge a move on the current stage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Move` when the move is refused before judging.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn submit_move(
        &self,
        session: &mut LessonSession,
        request: &MoveRequest,
    ) -> Result<MoveOutcome, SessionError> {
        let step = session.begin_move(request, self.clock.now()).map_err(|rejection| {
            debug!(%rejection, "move rejected");
            rejection
        })?;

        let outcome = match step {
            MoveStep::Settled(outcome) => outcome,
            MoveStep::Pending(pending) => {
                let verdict = self.validator.validate(&pending.request()).await;
                if let Err(e) = &verdict {
                    warn!(error = %e, notation = %pending.notation, "move validation failed");
                }
                session.complete_move(pending, verdict, self.clock.now())
            }
        };
        debug!(?outcome, "move settled");

        self.persist(session).await;
        Ok(outcome)
    }

    /// Ask for the next hint. `None` when hints are unavailable right now.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn request_hint(&self, session: &mut LessonSession) -> Option<HintOutcome> {
        let Some(request) = session.begin_hint() else {
            debug!("hint request ignored");
            return None;
        };
        let result = self
            .hints
            .next_hint(request.lesson_id, request.stage_id, request.index)
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "hint request failed");
        }
        Some(session.complete_hint(request, result))
    }

    /// Select a quiz answer on the current slide.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the selection is refused.
    pub fn answer_quiz(
        &self,
        session: &mut LessonSession,
        question: usize,
        option: usize,
    ) -> Result<QuizAnswer, SessionError> {
        session.answer_quiz(question, option)
    }

    /// Move to the next stage, finishing the lesson from the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AdvanceBlocked` while the stage is unfinished.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn advance(&self, session: &mut LessonSession) -> Result<Advance, SessionError> {
        let advance = session.advance(self.clock.now())?;
        log_advance(&advance);
        self.persist(session).await;
        Ok(advance)
    }

    /// Go back one stage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstStage` on the first stage.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn retreat(&self, session: &mut LessonSession) -> Result<Advance, SessionError> {
        let advance = session.retreat(self.clock.now())?;
        log_advance(&advance);
        self.persist(session).await;
        Ok(advance)
    }

    /// Reset the current stage's board.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the reset is refused.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn reset_stage(&self, session: &mut LessonSession) -> Result<(), SessionError> {
        if let Some(notice) = session.reset_current_stage()? {
            log_notice(&notice);
        }
        self.persist(session).await;
        Ok(())
    }

    /// Fire the session's due timers at the current clock time.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn tick(&self, session: &mut LessonSession) -> Vec<TimerEvent> {
        let events = session.fire_due_timers(self.clock.now());
        for event in &events {
            match event {
                TimerEvent::Advanced(advance) => log_advance(advance),
                TimerEvent::PuzzleReset { stage } => debug!(%stage, "puzzle board reset"),
                TimerEvent::Stale { stage } => debug!(%stage, "stale timer dropped"),
            }
        }
        if !events.is_empty() {
            self.persist(session).await;
        }
        events
    }

    /// End a practice lesson with the score it reported and save the
    /// progress it changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPractice` for other lesson kinds.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn finish_practice(
        &self,
        session: &mut LessonSession,
        score: Option<f64>,
    ) -> Result<CompletionReport, SessionError> {
        let report = session.finish_practice(score, self.clock.now())?;
        info!(score = report.score, "practice finished");
        self.persist(session).await;
        Ok(report)
    }

    /// Hand the completion report to persistence. Safe to call again after a
    /// failure; once it succeeded the stored reward is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the lesson ends and
    /// `SessionError::CompletionSubmit` when persistence fails.
    #[instrument(skip(self, session), fields(session = %session.id(), lesson = %session.lesson_id()))]
    pub async fn submit_completion(
        &self,
        session: &mut LessonSession,
    ) -> Result<RewardMetadata, SessionError> {
        if let Some(reward) = session.reward() {
            return Ok(reward);
        }
        let report = session.begin_completion()?;
        let result = self
            .progress
            .record_completion(session.lesson_id(), &report, self.clock.now())
            .await;
        session.complete_completion(result.as_ref().ok().copied());

        match result {
            Ok(reward) => {
                info!(
                    score = report.score,
                    attempts = report.attempts,
                    seconds = report.time_spent_seconds,
                    xp = reward.experience_points,
                    "completion recorded"
                );
                Ok(reward)
            }
            Err(e) => {
                error!(error = %e, "completion submission failed");
                Err(SessionError::CompletionSubmit(e))
            }
        }
    }

    async fn persist(&self, session: &mut LessonSession) {
        for record in session.take_dirty() {
            if let Err(e) = self.progress.save_stage_progress(&record).await {
                warn!(error = %e, stage = %record.stage_id, "could not save stage progress");
            }
        }
    }
}

fn log_advance(advance: &Advance) {
    match advance {
        Advance::Stage { index, notice } => {
            info!(stage = index, "stage entered");
            if let Some(notice) = notice {
                log_notice(notice);
            }
        }
        Advance::Finished(report) => info!(score = report.score, "lesson finished"),
    }
}

fn log_notice(notice: &PositionNotice) {
    match notice.severity() {
        NoticeSeverity::Info => info!("{}", notice.message()),
        NoticeSeverity::Error => error!(?notice, "{}", notice.message()),
    }
}
