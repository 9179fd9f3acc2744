use std::fmt;
use std::sync::Arc;

use lesson_core::model::{EngineSettings, LessonId};
use services::remote::{HintProvider, HttpLessonApi, MoveValidator, OfflineJudge, RemoteConfig};
use services::{Clock, LessonLoopService};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod import;
mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidEnv { name: &'static str, raw: String },
    MissingFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidEnv { name, raw } => write!(f, "invalid {name} value: {raw}"),
            ArgsError::MissingFile => write!(f, "import requires --file <path>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lessons play   [--db <sqlite_url>] [--lesson-id <id>]");
    eprintln!("  lessons import --file <lessons.json> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lessons.sqlite3");
    eprintln!("  --lesson-id 1");
    eprintln!();
    eprintln!("Environment (a .env file is honored):");
    eprintln!("  LESSONS_DB_URL, LESSONS_LESSON_ID, LESSONS_MAX_ATTEMPTS, LESSONS_HINT_PENALTY");
    eprintln!("  LESSONS_API_URL, LESSONS_API_TOKEN  # judge moves remotely instead of offline");
    eprintln!("  RUST_LOG                            # log filter, default info");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    lesson_id: LessonId,
    file: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LESSONS_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lessons.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_id = match std::env::var("LESSONS_LESSON_ID") {
            Ok(raw) => parse_lesson_id(&raw)?,
            Err(_) => LessonId::new(1),
        };
        let mut file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson-id" => {
                    let value = require_value(args, "--lesson-id")?;
                    lesson_id = parse_lesson_id(&value)?;
                }
                "--file" => file = Some(require_value(args, "--file")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            lesson_id,
            file,
        })
    }
}

fn parse_lesson_id(raw: &str) -> Result<LessonId, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(LessonId::new)
        .map_err(|_| ArgsError::InvalidLessonId { raw: raw.to_owned() })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Engine defaults, overridden by `LESSONS_MAX_ATTEMPTS` and
/// `LESSONS_HINT_PENALTY` when set.
fn engine_settings_from_env() -> Result<EngineSettings, Box<dyn std::error::Error>> {
    let mut settings = EngineSettings::default();
    if let Ok(raw) = std::env::var("LESSONS_MAX_ATTEMPTS") {
        let max_attempts = raw.trim().parse::<u32>().map_err(|_| ArgsError::InvalidEnv {
            name: "LESSONS_MAX_ATTEMPTS",
            raw: raw.clone(),
        })?;
        settings = settings.with_max_attempts(max_attempts)?;
    }
    if let Ok(raw) = std::env::var("LESSONS_HINT_PENALTY") {
        let penalty = raw.trim().parse::<f64>().map_err(|_| ArgsError::InvalidEnv {
            name: "LESSONS_HINT_PENALTY",
            raw: raw.clone(),
        })?;
        settings = settings.with_hint_penalty(penalty)?;
    }
    Ok(settings)
}

fn build_service(storage: &Storage, settings: EngineSettings) -> LessonLoopService {
    let (validator, hints) = if let Some(config) = RemoteConfig::from_env() {
        info!(base_url = %config.base_url, "judging moves with the remote lesson api");
        let api = Arc::new(HttpLessonApi::new(Some(config)));
        let validator: Arc<dyn MoveValidator> = api.clone();
        let hints: Arc<dyn HintProvider> = api;
        (validator, hints)
    } else {
        info!("judging moves offline from lesson content");
        let judge = Arc::new(OfflineJudge::new(Arc::clone(&storage.lessons)));
        let validator: Arc<dyn MoveValidator> = judge.clone();
        let hints: Arc<dyn HintProvider> = judge;
        (validator, hints)
    };

    LessonLoopService::new(
        Clock::system(),
        Arc::clone(&storage.lessons),
        Arc::clone(&storage.progress),
        validator,
        hints,
    )
    .with_settings(settings)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Import => {
            let file = parsed.file.ok_or(ArgsError::MissingFile)?;
            let imported = import::import_file(storage.lessons.as_ref(), &file).await?;
            println!("imported {imported} lesson(s) from {file}");
            Ok(())
        }
        Command::Play => {
            let service = build_service(&storage, engine_settings_from_env()?);
            play::run(&service, parsed.lesson_id).await
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut list.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn parses_lesson_and_file_flags() {
        let parsed = args(&["--lesson-id", "3", "--file", "lessons.json", "--db", "sqlite::memory:"])
            .unwrap();
        assert_eq!(parsed.lesson_id, LessonId::new(3));
        assert_eq!(parsed.file.as_deref(), Some("lessons.json"));
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            args(&["--lesson-id", "three"]),
            Err(ArgsError::InvalidLessonId { .. })
        ));
        assert!(matches!(
            args(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(args(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/lessons.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/lessons.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
