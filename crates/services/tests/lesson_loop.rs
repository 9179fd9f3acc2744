use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use lesson_core::model::{
    CompletionReport, Lesson, LessonDraft, LessonFlags, LessonId, LessonKind, RewardMetadata,
    SessionId, Stage, StageContent, StageId, StageState,
};
use lesson_core::rules::MoveRequest;
use lesson_core::time::fixed_now;
use services::error::{RemoteError, SessionError};
use services::remote::{MoveValidator, OfflineJudge, ValidationRequest, Verdict};
use services::session::{Advance, HintOutcome, LessonLoopService, MoveOutcome, TimerEvent};
use services::Clock;
use storage::repository::{
    InMemoryRepository, LessonRepository, ProgressRepository, StageProgressRecord, StorageError,
};

// ─── fixtures ───────────────────────────────────────────────────────────────

const LESSON: LessonId = LessonId::new(11);

fn board(id: u64, solution: &str, hints: &[&str]) -> Stage {
    Stage {
        id: StageId::new(id),
        content: StageContent::Board {
            position: String::new(),
            solution: Some(solution.to_owned()),
            hints: hints.iter().map(|h| (*h).to_owned()).collect(),
            visual_aids: Vec::new(),
        },
        is_demonstration: false,
        auto_advance: None,
    }
}

fn lesson(kind: LessonKind) -> Lesson {
    LessonDraft {
        id: LESSON,
        title: "King pawn openings".into(),
        kind,
        flags: LessonFlags::default(),
        expected_duration_secs: None,
        stages: vec![
            board(1, "e2e4", &["claim the centre", "use the king pawn"]),
            board(2, "g1f3", &[]),
        ],
    }
    .validate()
    .expect("valid lesson")
}

fn at(millis: i64) -> DateTime<Utc> {
    fixed_now() + Duration::milliseconds(millis)
}

fn mv(notation: &str) -> MoveRequest {
    MoveRequest::parse(notation).expect("move notation")
}

/// Progress store whose next completion submission fails once.
struct FlakyProgress {
    inner: InMemoryRepository,
    fail_next_completion: AtomicBool,
}

#[async_trait]
impl ProgressRepository for FlakyProgress {
    async fn record_start(
        &self,
        lesson_id: LessonId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.inner.record_start(lesson_id, session_id, started_at).await
    }

    async fn save_stage_progress(&self, record: &StageProgressRecord) -> Result<(), StorageError> {
        self.inner.save_stage_progress(record).await
    }

    async fn load_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<StageProgressRecord>, StorageError> {
        self.inner.load_progress(lesson_id).await
    }

    async fn record_completion(
        &self,
        lesson_id: LessonId,
        report: &CompletionReport,
        completed_at: DateTime<Utc>,
    ) -> Result<RewardMetadata, StorageError> {
        if self.fail_next_completion.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.record_completion(lesson_id, report, completed_at).await
    }
}

struct Unreachable;

#[async_trait]
impl MoveValidator for Unreachable {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Verdict, RemoteError> {
        Err(RemoteError::Unavailable("connection refused".into()))
    }
}

async fn setup(kind: LessonKind, clock: Clock) -> (LessonLoopService, InMemoryRepository) {
    let repo = InMemoryRepository::new();
    repo.upsert_lesson(&lesson(kind)).await.unwrap();
    (service(&repo, clock), repo)
}

fn service(repo: &InMemoryRepository, clock: Clock) -> LessonLoopService {
    let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
    let judge = Arc::new(OfflineJudge::new(Arc::clone(&lessons)));
    LessonLoopService::new(
        clock,
        lessons,
        Arc::new(repo.clone()),
        judge.clone(),
        judge,
    )
}

// ─── tests ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_lesson_is_judged_saved_and_rewarded() {
    let (service, repo) = setup(LessonKind::Interactive, Clock::fixed(fixed_now())).await;
    let mut session = service.start_lesson(LESSON).await.unwrap();
    assert_eq!(repo.start_count(LESSON).unwrap(), 1);

    let outcome = service.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::Solved { score, .. } if score == 50.0));
    service.advance(&mut session).await.unwrap();

    let outcome = service.submit_move(&mut session, &mv("d2d4")).await.unwrap();
    match outcome {
        MoveOutcome::Failed { feedback, .. } => {
            assert_eq!(feedback.message, "Not the best move (2 attempts remaining)");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    service.submit_move(&mut session, &mv("g1f3")).await.unwrap();

    let saved = repo.load_progress(LESSON).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|record| record.is_completed));

    let Advance::Finished(report) = service.advance(&mut session).await.unwrap() else {
        panic!("last stage should finish the lesson");
    };
    assert_eq!(report.score, 75);
    assert_eq!(report.attempts, 3);

    let reward = service.submit_completion(&mut session).await.unwrap();
    assert_eq!(reward.experience_points, 75);
    assert!(reward.module_completed);
    assert_eq!(repo.completions(LESSON).unwrap(), vec![report]);
}

#[tokio::test]
async fn failed_completion_can_be_retried_once() {
    let repo = InMemoryRepository::new();
    repo.upsert_lesson(&lesson(LessonKind::Interactive)).await.unwrap();
    let flaky = Arc::new(FlakyProgress {
        inner: repo.clone(),
        fail_next_completion: AtomicBool::new(true),
    });
    let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
    let judge = Arc::new(OfflineJudge::new(Arc::clone(&lessons)));
    let service = LessonLoopService::new(
        Clock::fixed(fixed_now()),
        lessons,
        flaky,
        judge.clone(),
        judge,
    );

    let mut session = service.start_lesson(LESSON).await.unwrap();
    service.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    service.advance(&mut session).await.unwrap();
    service.submit_move(&mut session, &mv("g1f3")).await.unwrap();
    service.advance(&mut session).await.unwrap();

    let err = service.submit_completion(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::CompletionSubmit(_)));
    assert!(session.is_finished());
    assert!(repo.completions(LESSON).unwrap().is_empty());

    let reward = service.submit_completion(&mut session).await.unwrap();
    assert_eq!(reward.experience_points, 100);
    let again = service.submit_completion(&mut session).await.unwrap();
    assert_eq!(again, reward);
    assert_eq!(repo.completions(LESSON).unwrap().len(), 1);
}

#[tokio::test]
async fn replaying_a_lesson_only_rewards_the_improvement() {
    let (service, repo) = setup(LessonKind::Interactive, Clock::fixed(fixed_now())).await;
    repo.record_completion(
        LESSON,
        &CompletionReport {
            score: 60,
            time_spent_seconds: 120,
            attempts: 4,
        },
        fixed_now(),
    )
    .await
    .unwrap();

    let mut session = service.start_lesson(LESSON).await.unwrap();
    service.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    service.advance(&mut session).await.unwrap();
    service.submit_move(&mut session, &mv("g1f3")).await.unwrap();
    service.advance(&mut session).await.unwrap();

    let reward = service.submit_completion(&mut session).await.unwrap();
    assert_eq!(reward.experience_points, 40);
    assert!(!reward.module_completed);
}

#[tokio::test]
async fn unknown_lesson_fails_to_load() {
    let (service, _repo) = setup(LessonKind::Interactive, Clock::fixed(fixed_now())).await;
    let err = service.start_lesson(LessonId::new(404)).await.unwrap_err();
    assert!(matches!(err, SessionError::ContentLoad(id) if id == LessonId::new(404)));
}

#[tokio::test]
async fn saved_progress_is_resumed_by_the_next_session() {
    let (service, _repo) = setup(LessonKind::Interactive, Clock::fixed(fixed_now())).await;
    let mut first = service.start_lesson(LESSON).await.unwrap();
    service.submit_move(&mut first, &mv("e2e4")).await.unwrap();
    drop(first);

    let second = service.start_lesson(LESSON).await.unwrap();
    assert_eq!(second.current_index(), 1);
    assert_eq!(second.stage_progress(0).unwrap().state(), StageState::Completed);
}

#[tokio::test]
async fn hints_come_from_lesson_content_and_cost_points() {
    let (service, _repo) = setup(LessonKind::Interactive, Clock::fixed(fixed_now())).await;
    let mut session = service.start_lesson(LESSON).await.unwrap();

    match service.request_hint(&mut session).await {
        Some(HintOutcome::Revealed(hint)) => {
            assert_eq!(hint.text, "claim the centre");
            assert_eq!(hint.penalty, 0.0);
        }
        other => panic!("expected a hint, got {other:?}"),
    }

    service.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    assert_eq!(session.lesson_score(), 50.0);

    match service.request_hint(&mut session).await {
        Some(HintOutcome::Revealed(hint)) => {
            assert_eq!(hint.index, 1);
            assert_eq!(hint.penalty, 5.0);
        }
        other => panic!("expected a hint, got {other:?}"),
    }
    assert_eq!(
        service.request_hint(&mut session).await,
        Some(HintOutcome::Exhausted)
    );
    assert_eq!(session.hint_penalty_total(), 5.0);
    assert_eq!(session.lesson_score(), 45.0);
    assert_eq!(session.current_progress().best_score(), 50.0);
}

#[tokio::test]
async fn finishing_practice_saves_the_stage_in_play() {
    let (service, repo) = setup(LessonKind::Practice, Clock::fixed(fixed_now())).await;
    let mut session = service.start_lesson(LESSON).await.unwrap();
    assert!(repo.load_progress(LESSON).await.unwrap().is_empty());

    let outcome = service.submit_move(&mut session, &mv("d2d4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::Played { .. }));
    let report = service.finish_practice(&mut session, Some(80.0)).await.unwrap();
    assert_eq!(report.score, 80);

    let saved = repo.load_progress(LESSON).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].stage_id, StageId::new(1));
    assert!(saved[0].is_completed);
}

#[tokio::test]
async fn unreachable_validator_leaves_the_stage_untouched() {
    let repo = InMemoryRepository::new();
    repo.upsert_lesson(&lesson(LessonKind::Interactive)).await.unwrap();
    let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
    let judge = Arc::new(OfflineJudge::new(Arc::clone(&lessons)));
    let service = LessonLoopService::new(
        Clock::fixed(fixed_now()),
        lessons,
        Arc::new(repo.clone()),
        Arc::new(Unreachable),
        judge,
    );

    let mut session = service.start_lesson(LESSON).await.unwrap();
    let outcome = service.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::Unjudged { .. }));
    assert_eq!(session.current_progress().attempts(), 0);
    assert!(repo.load_progress(LESSON).await.unwrap().is_empty());
}

#[tokio::test]
async fn puzzle_board_resets_when_the_clock_catches_up() {
    let (service, repo) = setup(LessonKind::Puzzle, Clock::fixed(fixed_now())).await;
    let mut session = service.start_lesson(LESSON).await.unwrap();

    let outcome = service.submit_move(&mut session, &mv("d2d4")).await.unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Failed { revealed_hint: Some(_), .. }
    ));
    assert!(service.tick(&mut session).await.is_empty());
    assert!(matches!(
        service.submit_move(&mut session, &mv("e2e4")).await,
        Err(SessionError::Move(_))
    ));

    let later = service_at(&repo, at(1_000));
    let events = later.tick(&mut session).await;
    assert!(matches!(events.as_slice(), [TimerEvent::PuzzleReset { .. }]));

    let outcome = later.submit_move(&mut session, &mv("e2e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::Solved { score, .. } if score == 25.0));
}

fn service_at(repo: &InMemoryRepository, now: DateTime<Utc>) -> LessonLoopService {
    service(repo, Clock::fixed(now))
}
