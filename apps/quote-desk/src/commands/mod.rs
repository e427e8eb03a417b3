//! # Commands
//!
//! The command-line front end of the desk.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (argument parsing, one-shot commands)
//! ├── shell.rs    ◄─── Interactive shell over stdin
//! └── view.rs     ◄─── Plain-text order rendering
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  quote-desk --pin 1234 print 6f1c… --html                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  parse_args() ──► Cli { config, pin, command: Command::Print {..} }    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  lib::run: load config, open store, QuoteDesk::open, elevate(pin)      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  execute(&mut desk, command) ──► Output { stdout, notes }              │
//! │                                                                         │
//! │  stdout ──► command result (JSON, text, HTML)                          │
//! │  notes  ──► stderr (warnings, confirmations)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod shell;
pub mod view;

use chrono::Datelike;
use std::path::{Path, PathBuf};
use tracing::debug;

use quote_core::validation::parse_month;
use quote_core::{today, Confirmation, Order};

use crate::desk::QuoteDesk;
use crate::error::{AppError, AppResult, ErrorCode};

pub use view::{render_order, warning_notes};

/// Usage text printed by `help` and on usage errors.
pub const USAGE: &str = "\
Usage: quote-desk [--config PATH] [--pin PIN] <command>

Commands:
  new                                  Print a blank order as JSON
  recalc <file>                        Recalculate an order file, print it as JSON
  save <file>                          Save an order file into the history
  show <id>                            Show a saved quote
  list [--search KW]                   List saved quotes, most recent first
  duplicate <id>                       Save a draft copy of a saved quote
  share <id>                           Print the chat summary of a saved quote
  print <id> [--confirm-underpriced] [--html]
                                       Print the printable quote
  export [--out PATH]                  Export the history as JSON ('-' for stdout)
  clear                                Delete the whole history (owner)
  stats [--month YYYY-MM]              Monthly revenue summary
  logout                               Switch back to staff
  shell                                Interactive session on stdin
  help                                 Show this text

Owner features need --pin. The first PIN ever entered becomes the owner PIN.";

// =============================================================================
// Parsing
// =============================================================================

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub pin: Option<String>,
    pub command: Command,
}

/// One-shot commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New,
    Recalc { file: PathBuf },
    Save { file: PathBuf },
    Show { id: String },
    List { search: Option<String> },
    Duplicate { id: String },
    Share { id: String },
    Print { id: String, confirmation: Confirmation, html: bool },
    Export { out: Option<PathBuf> },
    Clear,
    Stats { month: Option<(i32, u32)> },
    Logout,
    Shell,
    Help,
}

fn flag_value(args: &[String], i: &mut usize, flag: &str) -> AppResult<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| AppError::usage(format!("{} needs a value", flag)))
}

fn positional(args: &[String], i: &mut usize, what: &str, command: &str) -> AppResult<String> {
    *i += 1;
    match args.get(*i) {
        Some(value) if !value.starts_with("--") => Ok(value.clone()),
        _ => Err(AppError::usage(format!("{} needs <{}>", command, what))),
    }
}

/// Parses the arguments after the program name.
pub fn parse_args(args: &[String]) -> AppResult<Cli> {
    let mut config = None;
    let mut pin = None;
    let mut i = 0;

    // Global flags come first.
    while let Some(arg) = args.get(i) {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(flag_value(args, &mut i, "--config")?)),
            "--pin" => pin = Some(flag_value(args, &mut i, "--pin")?),
            "-h" | "--help" => {
                return Ok(Cli {
                    config,
                    pin,
                    command: Command::Help,
                })
            }
            _ => break,
        }
        i += 1;
    }

    let Some(name) = args.get(i).cloned() else {
        return Err(AppError::usage("missing command"));
    };

    let command = match name.as_str() {
        "new" => Command::New,
        "recalc" => Command::Recalc {
            file: positional(args, &mut i, "file", "recalc")?.into(),
        },
        "save" => Command::Save {
            file: positional(args, &mut i, "file", "save")?.into(),
        },
        "show" => Command::Show {
            id: positional(args, &mut i, "id", "show")?,
        },
        "list" => Command::List { search: None },
        "duplicate" => Command::Duplicate {
            id: positional(args, &mut i, "id", "duplicate")?,
        },
        "share" => Command::Share {
            id: positional(args, &mut i, "id", "share")?,
        },
        "print" => Command::Print {
            id: positional(args, &mut i, "id", "print")?,
            confirmation: Confirmation::NotConfirmed,
            html: false,
        },
        "export" => Command::Export { out: None },
        "clear" => Command::Clear,
        "stats" => Command::Stats { month: None },
        "logout" => Command::Logout,
        "shell" => Command::Shell,
        "help" => Command::Help,
        other => return Err(AppError::usage(format!("unknown command '{}'", other))),
    };

    let mut command = command;
    i += 1;
    while let Some(arg) = args.get(i) {
        match (&mut command, arg.as_str()) {
            (Command::List { search }, "--search") => {
                *search = Some(flag_value(args, &mut i, "--search")?)
            }
            (Command::Print { confirmation, .. }, "--confirm-underpriced") => {
                *confirmation = Confirmation::Confirmed
            }
            (Command::Print { html, .. }, "--html") => *html = true,
            (Command::Export { out }, "--out") => {
                *out = Some(flag_value(args, &mut i, "--out")?.into())
            }
            (Command::Stats { month }, "--month") => {
                *month = Some(parse_month(&flag_value(args, &mut i, "--month")?)?)
            }
            // Global flags are also accepted after the command.
            (_, "--config") => config = Some(PathBuf::from(flag_value(args, &mut i, "--config")?)),
            (_, "--pin") => pin = Some(flag_value(args, &mut i, "--pin")?),
            _ => return Err(AppError::usage(format!("unexpected argument '{}'", arg))),
        }
        i += 1;
    }

    Ok(Cli {
        config,
        pin,
        command,
    })
}

// =============================================================================
// Execution
// =============================================================================

/// What a command produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    /// The result proper.
    pub stdout: String,
    /// Warnings and confirmations.
    pub notes: Vec<String>,
}

impl Output {
    pub fn text(stdout: impl Into<String>) -> Self {
        Output {
            stdout: stdout.into(),
            notes: Vec::new(),
        }
    }

    pub fn note(note: impl Into<String>) -> Self {
        Output {
            stdout: String::new(),
            notes: vec![note.into()],
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes.extend(notes);
        self
    }
}

async fn read_order(path: &Path) -> AppResult<Order> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::new(
            ErrorCode::ValidationError,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Runs a one-shot command. `Shell` is handled by the caller.
pub async fn execute(desk: &mut QuoteDesk, command: Command) -> AppResult<Output> {
    debug!(?command, role = %desk.role(), "Executing command");

    match command {
        Command::New => {
            desk.new_order();
            Ok(Output::text(serde_json::to_string_pretty(desk.current())?))
        }

        Command::Recalc { file } => {
            let warnings = desk.import_order(read_order(&file).await?)?;
            Ok(Output::text(serde_json::to_string_pretty(desk.current())?)
                .with_notes(warning_notes(&warnings)))
        }

        Command::Save { file } => {
            desk.import_order(read_order(&file).await?)?;
            let warnings = desk.save().await?;
            Ok(Output::text(desk.current().id.clone())
                .with_notes(warning_notes(&warnings))
                .with_notes(vec![format!(
                    "saved ({} quotes in history)",
                    desk.history().len()
                )]))
        }

        Command::Show { id } => {
            let order = desk.history_entry(&id).ok_or_else(|| AppError::not_found(&id))?;
            Ok(Output::text(render_order(order, desk.role())))
        }

        Command::List { search } => {
            let hits: Vec<Order> = desk
                .search(search.as_deref().unwrap_or(""))
                .into_iter()
                .cloned()
                .collect();
            if hits.is_empty() {
                return Ok(Output::note("no saved quotes"));
            }
            let rows: Vec<String> = desk
                .history_rows(&hits)
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(Output::text(rows.join("\n")))
        }

        Command::Duplicate { id } => {
            if !desk.duplicate_from_history(&id) {
                return Ok(Output::note(format!("no saved quote #{}; nothing copied", id)));
            }
            let warnings = desk.save().await?;
            Ok(Output::text(desk.current().id.clone())
                .with_notes(warning_notes(&warnings))
                .with_notes(vec![format!("saved draft copy of {}", id)]))
        }

        Command::Share { id } => desk
            .share_history_entry(&id)?
            .map(Output::text)
            .ok_or_else(|| AppError::not_found(&id)),

        Command::Print {
            id,
            confirmation,
            html,
        } => {
            let doc = desk
                .print_history_entry(&id, confirmation)?
                .ok_or_else(|| AppError::not_found(&id))?;
            Ok(Output::text(if html { doc.to_html() } else { doc.to_string() }))
        }

        Command::Export { out } => {
            let json = desk.export_all()?;
            match out {
                Some(path) if path.as_os_str() == "-" => Ok(Output::text(json)),
                out => {
                    let path =
                        out.unwrap_or_else(|| PathBuf::from(QuoteDesk::export_file_name(today())));
                    tokio::fs::write(&path, json).await?;
                    Ok(Output::note(format!(
                        "exported {} quotes to {}",
                        desk.history().len(),
                        path.display()
                    )))
                }
            }
        }

        Command::Clear => {
            if desk.clear_all().await? {
                Ok(Output::note("history cleared"))
            } else {
                Err(AppError::new(
                    ErrorCode::PermissionDenied,
                    "Only the owner can clear the history (use --pin)",
                ))
            }
        }

        Command::Stats { month } => {
            let (year, month) = month.unwrap_or_else(|| {
                let now = today();
                (now.year(), now.month())
            });
            Ok(Output::text(desk.monthly_stats(year, month).to_string()))
        }

        Command::Logout => {
            desk.logout();
            Ok(Output::note("switched to staff"))
        }

        Command::Help => Ok(Output::text(USAGE)),

        Command::Shell => Err(AppError::internal("shell must be started by the caller")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
