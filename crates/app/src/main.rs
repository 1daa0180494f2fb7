use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::QuestionId;
use quiz_core::{Clock, QuizConfig};
use services::{QuizContext, SessionStore};
use storage::{JsonFileStore, QuizStateRepository};

mod catalog;
mod driver;
mod logging;

use driver::Command;

const DEFAULT_STORE_PATH: &str = "quiz-state.json";
const DEFAULT_DURATION_SECS: u64 = 30 * 60;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingArgument { command: &'static str, name: &'static str },
    InvalidNumber { name: &'static str, raw: String },
    InvalidDuration { raw: String },
    InvalidStorePath { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid {name}: {raw}"),
            ArgsError::InvalidDuration { raw } => {
                write!(f, "invalid --duration-secs value: {raw}")
            }
            ArgsError::InvalidStorePath { raw } => write!(f, "invalid --store value: {raw}"),
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
    eprintln!("  cargo run -p app -- [--store <path>] [--duration-secs <n>] <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                     show the current attempt (default)");
    eprintln!("  start                      begin or resume the attempt");
    eprintln!("  answer <question-id> <n>   select choice n");
    eprintln!("  clear <question-id>        clear the selected choice");
    eprintln!("  goto <index>               jump to a question (0-based)");
    eprintln!("  next | prev | skip         move between questions");
    eprintln!("  tick                       update the countdown from the start time");
    eprintln!("  submit                     finish the attempt");
    eprintln!("  reset                      discard the attempt and the user");
    eprintln!("  user <name> [email]        set the quiz taker");
    eprintln!("  score | unanswered         queries");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --store {DEFAULT_STORE_PATH}");
    eprintln!("  --duration-secs {DEFAULT_DURATION_SECS}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_STORE_PATH, QUIZ_DURATION_SECS, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    store_path: PathBuf,
    duration: Duration,
    command: Command,
}

impl Args {
    /// Flags override the environment, which overrides the defaults.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut store_path = std::env::var("QUIZ_STORE_PATH")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let mut duration_secs = std::env::var("QUIZ_DURATION_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DURATION_SECS);

        let mut positional = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => {
                    let value = require_value(&mut args, "--store")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidStorePath { raw: value });
                    }
                    store_path = PathBuf::from(value);
                }
                "--duration-secs" => {
                    let value = require_value(&mut args, "--duration-secs")?;
                    duration_secs = value
                        .parse()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ArgsError::InvalidDuration { raw: value.clone() })?;
                }
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        Ok(Some(Self {
            store_path,
            duration: Duration::from_secs(duration_secs),
            command: parse_command(positional)?,
        }))
    }
}

fn parse_command(positional: Vec<String>) -> Result<Command, ArgsError> {
    let mut words = positional.into_iter();
    let Some(name) = words.next() else {
        return Ok(Command::Status);
    };

    let command = match name.as_str() {
        "status" => Command::Status,
        "start" => Command::Start,
        "answer" => Command::Answer {
            question_id: parse_question_id(words.next(), "answer")?,
            choice: parse_number(words.next(), "answer", "choice")?,
        },
        "clear" => Command::Clear {
            question_id: parse_question_id(words.next(), "clear")?,
        },
        "goto" => Command::Goto {
            index: parse_number(words.next(), "goto", "index")?,
        },
        "next" => Command::Next,
        "prev" => Command::Prev,
        "skip" => Command::Skip,
        "tick" => Command::Tick,
        "submit" => Command::Submit,
        "reset" => Command::Reset,
        "user" => Command::User {
            name: words.next().ok_or(ArgsError::MissingArgument {
                command: "user",
                name: "name",
            })?,
            email: words.next(),
        },
        "score" => Command::Score,
        "unanswered" => Command::Unanswered,
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = words.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

fn parse_question_id(raw: Option<String>, command: &'static str) -> Result<QuestionId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument {
        command,
        name: "question-id",
    })?;
    raw.parse().map_err(|_| ArgsError::InvalidNumber {
        name: "question-id",
        raw,
    })
}

fn parse_number(
    raw: Option<String>,
    command: &'static str,
    name: &'static str,
) -> Result<usize, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { command, name })?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { name, raw })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let Some(args) = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    // The file store stands in for browser local storage; keep it in the binary glue.
    let kv = JsonFileStore::open(&args.store_path)?;
    let repository = QuizStateRepository::new(Arc::new(kv));
    let clock = Clock::default_clock();
    let store = SessionStore::new(
        catalog::builtin_catalog()?,
        repository,
        clock,
        QuizConfig::new(args.duration),
    );

    let context = QuizContext::provide(store);
    driver::execute(&context, args.command, &clock)?;
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
