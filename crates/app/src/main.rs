use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use services::{AppServices, BankSource, DEFAULT_IO_TIMEOUT, ImportReport, ServiceOptions};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    InvalidTimeout { raw: String },
    MissingImportFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout-ms value: {raw}"),
            ArgsError::MissingImportFile => write!(f, "import requires --file <path>"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
struct ImportFailed(ImportReport);

impl fmt::Display for ImportFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import completed with {} error(s)", self.0.errors.len())
    }
}

impl std::error::Error for ImportFailed {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
    Reset,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            "reset" => Some(Self::Reset),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    bank: Option<PathBuf>,
    seed: Option<u64>,
    io_timeout: Duration,
    file: Option<PathBuf>,
    json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed {
    Run(Args),
    Help,
}

impl Args {
    /// Parse flags, with defaults taken from `env` (`QUIZ_*` variables).
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL")
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut bank = env("QUIZ_BANK_PATH").map(PathBuf::from);
        let mut seed = env("QUIZ_SEED").and_then(|value| value.parse::<u64>().ok());
        let mut io_timeout = env("QUIZ_IO_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(DEFAULT_IO_TIMEOUT, Duration::from_millis);
        let mut file = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => {
                    bank = Some(PathBuf::from(require_value(args, "--bank")?));
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--timeout-ms" => {
                    let value = require_value(args, "--timeout-ms")?;
                    let parsed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidTimeout { raw: value.clone() })?;
                    io_timeout = Duration::from_millis(parsed);
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--json" => json = true,
                "--help" | "-h" => return Ok(Parsed::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            db_url,
            bank,
            seed,
            io_timeout,
            file,
            json,
        }))
    }

    fn service_options(&self, cmd: Command) -> ServiceOptions {
        // Import writes into the store, so it never needs a bank file.
        let bank = match (&self.bank, cmd) {
            (Some(path), Command::Play | Command::Stats) => BankSource::File(path.clone()),
            _ => BankSource::Store,
        };
        ServiceOptions {
            bank,
            io_timeout: self.io_timeout,
            seed: self.seed,
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play]  [--db <sqlite_url>] [--bank <path>] [--seed <n>]");
    eprintln!("  quiz stats   [--db <sqlite_url>] [--bank <path>] [--json]");
    eprintln!("  quiz reset   [--db <sqlite_url>]");
    eprintln!("  quiz import  --file <path> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite://quiz.sqlite3)");
    eprintln!("  --bank <path>         JSON question bank (default: imported questions)");
    eprintln!("  --seed <n>            Fixed seed for question selection");
    eprintln!("  --timeout-ms <n>      Storage timeout in milliseconds (default: 5000)");
    eprintln!("  --file <path>         Questions to import");
    eprintln!("  --json                Print stats as JSON");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH, QUIZ_SEED, QUIZ_IO_TIMEOUT_MS, QUIZ_LOG");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        // In-memory and shared-cache URLs need no file.
        return Ok(());
    };
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

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report: &ImportReport) {
    println!("Imported: {} questions", report.imported);
    if !report.errors.is_empty() {
        println!("Errors:");
        for error in &report.errors {
            println!("- {error}");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
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

    let mut iter = argv.into_iter();
    let parsed = match Args::parse(&mut iter, |key| std::env::var(key).ok()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, parsed.service_options(cmd)).await?;

    match cmd {
        Command::Play => {
            let quiz = app.quiz();
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let mut out = std::io::stdout();
            play::run_quiz(&quiz, &mut input, &mut out).await
        }
        Command::Stats => {
            let stats = app.quiz().stats().await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Answered:  {}/{}", stats.answered, stats.bank_size);
                println!("Correct:   {}", stats.correct);
                println!("Accuracy:  {}%", stats.accuracy);
                println!("Remaining: {}", stats.remaining);
            }
            Ok(())
        }
        Command::Reset => {
            app.progress().reset().await?;
            println!("Progress reset.");
            Ok(())
        }
        Command::Import => {
            let path = parsed.file.as_ref().ok_or(ArgsError::MissingImportFile)?;
            tracing::info!(path = %path.display(), "reading questions");
            let json = std::fs::read_to_string(path)?;
            let report = app.import().import_json(&json).await?;
            print_report(&report);
            if report.success() {
                Ok(())
            } else {
                Err(ImportFailed(report).into())
            }
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
