//! Plays one lesson on stdin/stdout.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use lesson_core::model::{LessonId, LessonKind};
use lesson_core::rules::MoveRequest;
use services::{
    Advance, HintOutcome, LessonLoopService, LessonSession, MoveOutcome, SessionError,
    SessionView, TimerEvent,
};

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Move(MoveRequest),
    Hint,
    Next,
    Back,
    Reset,
    Answer { question: usize, option: usize },
    Finish(Option<f64>),
    Submit,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputError {
    Empty,
    Unknown(String),
    BadMove(String),
    BadNumber(String),
    MissingArgument(&'static str),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "type `help` for commands"),
            InputError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            InputError::BadMove(raw) => write!(f, "cannot read move `{raw}`, use e.g. e2e4"),
            InputError::BadNumber(raw) => write!(f, "not a number: {raw}"),
            InputError::MissingArgument(what) => write!(f, "missing {what}"),
        }
    }
}

fn number<T: std::str::FromStr>(raw: Option<&str>, what: &'static str) -> Result<T, InputError> {
    let raw = raw.ok_or(InputError::MissingArgument(what))?;
    raw.parse()
        .map_err(|_| InputError::BadNumber(raw.to_owned()))
}

fn looks_like_move(word: &str) -> bool {
    let bytes = word.as_bytes();
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    (4..=5).contains(&bytes.len()) && square(bytes[0], bytes[1]) && square(bytes[2], bytes[3])
}

impl Input {
    fn parse(line: &str) -> Result<Self, InputError> {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Err(InputError::Empty);
        };
        let cmd = cmd.to_ascii_lowercase();
        Ok(match cmd.as_str() {
            "move" | "m" => {
                let raw = words.next().ok_or(InputError::MissingArgument("move"))?;
                Self::Move(MoveRequest::parse(raw).ok_or_else(|| InputError::BadMove(raw.into()))?)
            }
            "hint" | "h" => Self::Hint,
            "next" | "n" => Self::Next,
            "back" | "b" => Self::Back,
            "reset" => Self::Reset,
            "answer" | "a" => Self::Answer {
                question: number(words.next(), "question number")?,
                option: number(words.next(), "option number")?,
            },
            "finish" => Self::Finish(match words.next() {
                Some(raw) => Some(number(Some(raw), "score")?),
                None => None,
            }),
            "submit" => Self::Submit,
            "show" | "s" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            // A bare move is the common case.
            other if looks_like_move(other) => match MoveRequest::parse(other) {
                Some(request) => Self::Move(request),
                None => return Err(InputError::BadMove(other.to_owned())),
            },
            other => return Err(InputError::Unknown(other.to_owned())),
        })
    }
}

fn print_help() {
    println!("commands:");
    println!("  e2e4 | move e2e4   play a move (promotion: e7e8q)");
    println!("  hint               reveal the next hint");
    println!("  next / back        change stage");
    println!("  reset              reset the board (costs an attempt on graded stages)");
    println!("  answer Q O         pick option O for quiz question Q (0-based)");
    println!("  finish [score]     end a practice lesson");
    println!("  submit             retry a failed completion submission");
    println!("  show / quit");
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn render(view: &SessionView) {
    let progress = view.progress;
    println!();
    println!(
        "== {} [{}] stage {}/{} ({} done, {} locked)",
        view.title,
        view.kind.as_str(),
        progress.current + 1,
        progress.total,
        progress.completed,
        progress.locked,
    );
    if let Some(body) = &view.slide_body {
        println!("{body}");
    }
    for (index, prompt) in view.quiz_prompts.iter().enumerate() {
        println!("  Q{index}: {prompt}");
    }
    println!("board: {}", view.board);
    if view.kind.is_graded() {
        println!(
            "stage: {:?}, attempts {}, best {:.2}",
            view.stage_state, view.attempts, view.best_score
        );
    }
    println!("score: {:.2}", view.running_score);
    if let Some(hint) = &view.hint {
        println!("hint: {hint}");
    }
    if let Some(feedback) = &view.feedback {
        println!("> {feedback}");
    }
    if view.can_advance {
        println!("(type `next` to continue)");
    }
}

fn print_move(outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Played { notation, .. } => println!("played {notation}"),
        MoveOutcome::Solved { score, feedback } => println!("{feedback} (+{score:.2})"),
        MoveOutcome::Failed {
            feedback,
            revealed_hint,
            ..
        } => {
            println!("{feedback}");
            if let Some(hint) = revealed_hint {
                println!("hint: {}", hint.text);
            }
        }
        MoveOutcome::Invalid { feedback }
        | MoveOutcome::Locked { feedback }
        | MoveOutcome::Unjudged { feedback } => println!("{feedback}"),
        MoveOutcome::Discarded => {}
    }
}

fn print_advance(advance: &Advance) {
    match advance {
        Advance::Stage { notice, .. } => {
            if let Some(notice) = notice {
                println!("note: {}", notice.message());
            }
        }
        Advance::Finished(report) => println!(
            "lesson finished: score {}, {} attempt(s), {}s",
            report.score, report.attempts, report.time_spent_seconds
        ),
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// What the loop should do after a command.
enum Flow {
    Continue,
    Quit,
}

async fn apply(
    service: &LessonLoopService,
    session: &mut LessonSession,
    input: Input,
) -> Result<Flow, SessionError> {
    match input {
        Input::Move(request) => {
            let outcome = service.submit_move(session, &request).await?;
            print_move(&outcome);
        }
        Input::Hint => match service.request_hint(session).await {
            Some(HintOutcome::Revealed(hint)) => {
                println!("hint: {} (-{:.2})", hint.text, hint.penalty);
            }
            Some(HintOutcome::Exhausted) => println!("no more hints for this stage"),
            Some(HintOutcome::Unavailable { feedback }) => println!("{feedback}"),
            Some(HintOutcome::Discarded) | None => println!("no hint available right now"),
        },
        Input::Next => print_advance(&service.advance(session).await?),
        Input::Back => print_advance(&service.retreat(session).await?),
        Input::Reset => service.reset_stage(session).await?,
        Input::Answer { question, option } => {
            let answer = service.answer_quiz(session, question, option)?;
            let verdict = if answer.correct { "correct" } else { "not quite" };
            println!("{verdict} ({:+.2}, score {:.2})", answer.delta, answer.running);
        }
        Input::Finish(score) => {
            let report = service.finish_practice(session, score).await?;
            print_advance(&Advance::Finished(report));
        }
        Input::Submit => submit(service, session).await?,
        Input::Show => {}
        Input::Help => {
            print_help();
            return Ok(Flow::Continue);
        }
        Input::Quit => return Ok(Flow::Quit),
    }
    render(&session.view());
    Ok(Flow::Continue)
}

async fn submit(service: &LessonLoopService, session: &mut LessonSession) -> Result<(), SessionError> {
    let reward = service.submit_completion(session).await?;
    println!(
        "progress saved: +{} xp{}",
        reward.experience_points,
        if reward.module_completed { ", lesson completed for the first time" } else { "" }
    );
    Ok(())
}

fn time_until_next_timer(session: &LessonSession) -> Option<Duration> {
    let due = session.next_timer_deadline()?;
    Some((due - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

/// Run an interactive session until the lesson is saved or the player quits.
///
/// # Errors
///
/// Returns an error if the lesson cannot be started or stdin fails.
pub async fn run(
    service: &LessonLoopService,
    lesson_id: LessonId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = service.start_lesson(lesson_id).await?;
    if session.lesson().kind() == LessonKind::Practice {
        println!("practice lesson: play freely, `finish [score]` when done");
    }
    print_help();
    render(&session.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut submitted = false;
    loop {
        let wait = time_until_next_timer(&session);
        tokio::select! {
            () = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                let events = service.tick(&mut session).await;
                for event in &events {
                    if let TimerEvent::Advanced(advance) = event {
                        print_advance(advance);
                    }
                }
                if !events.is_empty() {
                    render(&session.view());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let flow = match Input::parse(&line) {
                    Ok(input) => apply(service, &mut session, input).await,
                    Err(e) => {
                        println!("{e}");
                        Ok(Flow::Continue)
                    }
                };
                match flow {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }

        if session.is_finished() && !submitted {
            submitted = true;
            if let Err(e) = submit(service, &mut session).await {
                warn!(error = %e, "completion not saved");
                println!("{e}; type `submit` to retry");
            }
        }
        if session.reward().is_some() {
            break;
        }
    }

    if session.is_finished() && session.reward().is_none() {
        println!("lesson result was not saved");
    }
    Ok(())
}
