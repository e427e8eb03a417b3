//! # Quote Desk Library
//!
//! Controller and command-line front end of the print-shop quote desk.
//!
//! ## Module Organization
//! ```text
//! quote_desk/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── desk.rs         ◄─── QuoteDesk: current order + history
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── DeskConfig (TOML + environment)
//! │   ├── session.rs  ◄─── Shared session gate, idle watcher
//! │   └── store.rs    ◄─── Opens the configured store
//! ├── commands/
//! │   ├── mod.rs      ◄─── Argument parsing, one-shot commands
//! │   ├── shell.rs    ◄─── Interactive shell
//! │   └── view.rs     ◄─── Plain-text order view
//! └── error.rs        ◄─── AppError for every operation
//! ```

pub mod commands;
pub mod desk;
pub mod error;
pub mod state;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{execute, parse_args, shell, Command, Output, USAGE};
use desk::QuoteDesk;
use error::{AppError, AppResult, ErrorCode};
use state::{open_store, DeskConfig, SessionState};

/// Runs the desk with the arguments after the program name.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  1. Parse arguments ─────────► usage errors stop here                  │
/// │  2. Load configuration ──────► defaults, TOML file, QUOTE_* env        │
/// │  3. Open the store ──────────► json / sqlite / memory                  │
/// │  4. QuoteDesk::open ─────────► history loaded (empty if unreadable)    │
/// │  5. --pin ───────────────────► elevate (first PIN is enrolled)         │
/// │  6. Run the command or the shell                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: Vec<String>) -> AppResult<()> {
    let cli = parse_args(&args)?;
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = DeskConfig::load(cli.config.as_deref())?;
    let store = open_store(&config).await?;
    let session = SessionState::new(config.idle_limit());
    let mut desk = QuoteDesk::open(store, session)
        .await
        .with_shop_name(config.shop.name.clone());

    if let Some(pin) = &cli.pin {
        desk.elevate(pin).await?;
    }

    if cli.command == Command::Shell {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        return shell::run_shell(&mut desk, stdin, &mut stdout, config.idle_poll()).await;
    }

    let output = execute(&mut desk, cli.command).await?;
    print_output(&output);
    Ok(())
}

fn print_output(output: &Output) {
    if !output.stdout.is_empty() {
        println!("{}", output.stdout.trim_end());
    }
    for note in &output.notes {
        eprintln!("{}", note);
    }
}

/// Exit status for a failed run: 2 for bad usage, 1 otherwise.
pub fn exit_code(err: &AppError) -> u8 {
    match err.code {
        ErrorCode::Usage => 2,
        _ => 1,
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=quote_store=trace` - Show trace for the store only
/// - Default: `info,quote=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quote=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Quote desk starting");
}
