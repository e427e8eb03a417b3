//! # Interactive Shell
//!
//! Line-oriented session over stdin for editing the current order.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  run_shell(desk, stdin, stdout, poll)                                  │
//! │       │                                                                 │
//! │       ├── IdleWatcher::spawn(session, poll)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  loop over lines:                                                       │
//! │       1. owner demoted since last line? tell the operator              │
//! │       2. session.touch()          (every line counts as activity)      │
//! │       3. parse_line() ──► ShellCommand                                 │
//! │       4. run() ──► Output written, or "error[CODE]: ..." and go on     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quit / EOF ──► watcher.shutdown()                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use quote_core::pricing::LineWarnings;
use quote_core::session::PinOutcome;
use quote_core::validation::parse_month;
use quote_core::{Confirmation, Role, Vnd};

use super::{execute, render_order, warning_notes, Command, Output};
use crate::desk::QuoteDesk;
use crate::error::{AppError, AppResult};
use crate::state::IdleWatcher;

pub const PROMPT: &str = "> ";

pub const HELP: &str = "\
Current order:
  new | show | save | dup
  customer|phone|address|orderno|status <text>
  date <YYYY-MM-DD>
  ship|transport <amount>    discount <percent>
  add | rm <n>
  name <n> <text> | dims <n> <width> <length> | qty <n> <q>
  unit <n> <text> | sell <n> <price> | cost <n> <price>
  share [id] | print [id] [--confirm-underpriced] [--html]
History:
  list [keyword] | open <id> | copy <id> | export [path] | clear
  stats [YYYY-MM]
Session:
  login <pin> | logout | help | quit
Numbers use a decimal point: 1.2, 50000.";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Empty,
    Help,
    Quit,
    New,
    Show,
    Save,
    Duplicate,
    Customer(String),
    Phone(String),
    Address(String),
    OrderNo(String),
    Status(String),
    Date(NaiveDate),
    Shipping(f64),
    Transport(f64),
    Discount(f64),
    AddItem,
    RemoveItem(usize),
    ItemName(usize, String),
    ItemDimensions(usize, f64, f64),
    ItemQty(usize, f64),
    ItemUnit(usize, String),
    ItemSell(usize, f64),
    ItemCost(usize, f64),
    Share(Option<String>),
    Print {
        id: Option<String>,
        confirmation: Confirmation,
        html: bool,
    },
    List(Option<String>),
    Open(String),
    Copy(String),
    Export(Option<String>),
    Clear,
    Stats(Option<(i32, u32)>),
    Login(String),
    Logout,
}

fn number(value: Option<&str>, field: &str) -> AppResult<f64> {
    let value = value.ok_or_else(|| AppError::usage(format!("missing {}", field)))?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::validation(format!("{} must be a number, got '{}'", field, value)))
}

fn line_no(value: Option<&str>) -> AppResult<usize> {
    let value = value.ok_or_else(|| AppError::usage("missing line number"))?;
    value
        .parse::<usize>()
        .map_err(|_| AppError::validation(format!("'{}' is not a line number", value)))
}

/// Text after the first `skip` words, as typed.
fn rest_after(line: &str, skip: usize) -> String {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        rest = rest
            .split_once(char::is_whitespace)
            .map_or("", |(_, tail)| tail)
            .trim_start();
    }
    rest.trim_end().to_string()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Parses one input line.
pub fn parse_line(line: &str) -> AppResult<ShellCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = words.first() else {
        return Ok(ShellCommand::Empty);
    };
    let arg = |n: usize| words.get(n).copied();

    let command = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "new" => ShellCommand::New,
        "show" => ShellCommand::Show,
        "save" => ShellCommand::Save,
        "dup" => ShellCommand::Duplicate,

        "customer" => ShellCommand::Customer(rest_after(line, 1)),
        "phone" => ShellCommand::Phone(rest_after(line, 1)),
        "address" => ShellCommand::Address(rest_after(line, 1)),
        "orderno" => ShellCommand::OrderNo(rest_after(line, 1)),
        "status" => ShellCommand::Status(rest_after(line, 1)),
        "date" => {
            let value = arg(1).ok_or_else(|| AppError::usage("date needs YYYY-MM-DD"))?;
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                AppError::validation(format!("'{}' is not a date (YYYY-MM-DD)", value))
            })?;
            ShellCommand::Date(date)
        }

        "ship" => ShellCommand::Shipping(number(arg(1), "shipping fee")?),
        "transport" => ShellCommand::Transport(number(arg(1), "transport fee")?),
        "discount" => ShellCommand::Discount(number(arg(1), "discount")?),

        "add" => ShellCommand::AddItem,
        "rm" => ShellCommand::RemoveItem(line_no(arg(1))?),
        "name" => ShellCommand::ItemName(line_no(arg(1))?, rest_after(line, 2)),
        "dims" => ShellCommand::ItemDimensions(
            line_no(arg(1))?,
            number(arg(2), "width")?,
            number(arg(3), "length")?,
        ),
        "qty" => ShellCommand::ItemQty(line_no(arg(1))?, number(arg(2), "quantity")?),
        "unit" => ShellCommand::ItemUnit(line_no(arg(1))?, rest_after(line, 2)),
        "sell" => ShellCommand::ItemSell(line_no(arg(1))?, number(arg(2), "sell price")?),
        "cost" => ShellCommand::ItemCost(line_no(arg(1))?, number(arg(2), "cost price")?),

        "share" => ShellCommand::Share(arg(1).map(String::from)),
        "print" => {
            let mut id = None;
            let mut confirmation = Confirmation::NotConfirmed;
            let mut html = false;
            for word in &words[1..] {
                match *word {
                    "--confirm-underpriced" => confirmation = Confirmation::Confirmed,
                    "--html" => html = true,
                    flag if flag.starts_with("--") => {
                        return Err(AppError::usage(format!("unknown option '{}'", flag)))
                    }
                    value => id = Some(value.to_string()),
                }
            }
            ShellCommand::Print {
                id,
                confirmation,
                html,
            }
        }

        "list" => ShellCommand::List(non_empty(rest_after(line, 1))),
        "open" => ShellCommand::Open(
            arg(1)
                .ok_or_else(|| AppError::usage("open needs <id>"))?
                .to_string(),
        ),
        "copy" => ShellCommand::Copy(
            arg(1)
                .ok_or_else(|| AppError::usage("copy needs <id>"))?
                .to_string(),
        ),
        "export" => ShellCommand::Export(arg(1).map(String::from)),
        "clear" => ShellCommand::Clear,
        "stats" => ShellCommand::Stats(arg(1).map(parse_month).transpose()?),
        "login" => ShellCommand::Login(
            arg(1)
                .ok_or_else(|| AppError::usage("login needs <pin>"))?
                .to_string(),
        ),
        "logout" => ShellCommand::Logout,

        other => {
            return Err(AppError::usage(format!(
                "unknown command '{}' (type 'help')",
                other
            )))
        }
    };
    Ok(command)
}

/// Short status after an edit: the new total plus any warnings.
fn edited(desk: &QuoteDesk, warnings: Vec<LineWarnings>) -> Output {
    Output::text(format!(
        "Tổng thanh toán: {}",
        Vnd(desk.current().totals.customer_total)
    ))
    .with_notes(warning_notes(&warnings))
}

/// Whether the shell should keep reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue(Output),
    Quit,
}

/// Runs one shell command against the desk.
pub async fn run(desk: &mut QuoteDesk, command: ShellCommand) -> AppResult<Step> {
    let output = match command {
        ShellCommand::Empty => Output::default(),
        ShellCommand::Help => Output::text(HELP),
        ShellCommand::Quit => return Ok(Step::Quit),

        ShellCommand::New => {
            desk.new_order();
            Output::note(format!("new draft #{}", desk.current().id))
        }
        ShellCommand::Show => Output::text(render_order(desk.current(), desk.role())),
        ShellCommand::Save => {
            let warnings = desk.save().await?;
            Output::note(format!("saved #{}", desk.current().id))
                .with_notes(warning_notes(&warnings))
        }
        ShellCommand::Duplicate => {
            let id = desk.duplicate().await?.id.clone();
            Output::note(format!("saved; now editing copy #{}", id))
        }

        ShellCommand::Customer(v) => {
            desk.set_customer(&v);
            Output::default()
        }
        ShellCommand::Phone(v) => {
            desk.set_phone(&v);
            Output::default()
        }
        ShellCommand::Address(v) => {
            desk.set_address(&v);
            Output::default()
        }
        ShellCommand::OrderNo(v) => {
            desk.set_order_no(&v);
            Output::default()
        }
        ShellCommand::Status(v) => {
            desk.set_status(&v)?;
            Output::default()
        }
        ShellCommand::Date(date) => {
            desk.set_date(date);
            Output::default()
        }

        ShellCommand::Shipping(fee) => {
            let warnings = desk.set_shipping_fee(fee)?;
            edited(desk, warnings)
        }
        ShellCommand::Transport(fee) => {
            let warnings = desk.set_transport_fee(fee)?;
            edited(desk, warnings)
        }
        ShellCommand::Discount(percent) => {
            let warnings = desk.set_discount(percent)?;
            edited(desk, warnings)
        }

        ShellCommand::AddItem => {
            let line = desk.add_item();
            Output::note(format!("line {} added", line))
        }
        ShellCommand::RemoveItem(n) => {
            let warnings = desk.remove_item(n)?;
            edited(desk, warnings)
        }
        ShellCommand::ItemName(n, name) => {
            let warnings = desk.set_item_name(n, &name)?;
            edited(desk, warnings)
        }
        ShellCommand::ItemDimensions(n, width, length) => {
            let warnings = desk.set_item_dimensions(n, width, length)?;
            edited(desk, warnings)
        }
        ShellCommand::ItemQty(n, qty) => {
            let warnings = desk.set_item_qty(n, qty)?;
            edited(desk, warnings)
        }
        ShellCommand::ItemUnit(n, unit) => {
            desk.set_item_unit(n, &unit)?;
            Output::default()
        }
        ShellCommand::ItemSell(n, price) => {
            let warnings = desk.set_item_sell_price(n, price)?;
            edited(desk, warnings)
        }
        ShellCommand::ItemCost(n, price) => {
            let warnings = desk.set_item_cost_price(n, price)?;
            edited(desk, warnings)
        }

        ShellCommand::Share(None) => Output::text(desk.share_current()?),
        ShellCommand::Share(Some(id)) => execute(desk, Command::Share { id }).await?,
        ShellCommand::Print {
            id: None,
            confirmation,
            html,
        } => {
            let doc = desk.print_current(confirmation)?;
            Output::text(if html { doc.to_html() } else { doc.to_string() })
        }
        ShellCommand::Print {
            id: Some(id),
            confirmation,
            html,
        } => {
            execute(
                desk,
                Command::Print {
                    id,
                    confirmation,
                    html,
                },
            )
            .await?
        }

        ShellCommand::List(search) => execute(desk, Command::List { search }).await?,
        // Unknown ids leave the current order untouched.
        ShellCommand::Open(id) => {
            if desk.open_from_history(&id) {
                Output::note(format!("editing #{}", id))
            } else {
                Output::note(format!("no saved quote #{}; nothing opened", id))
            }
        }
        ShellCommand::Copy(id) => {
            if desk.duplicate_from_history(&id) {
                Output::note(format!("editing copy #{} (not saved yet)", desk.current().id))
            } else {
                Output::note(format!("no saved quote #{}; nothing copied", id))
            }
        }
        ShellCommand::Export(path) => {
            execute(desk, Command::Export { out: path.map(Into::into) }).await?
        }
        ShellCommand::Clear => execute(desk, Command::Clear).await?,
        ShellCommand::Stats(month) => execute(desk, Command::Stats { month }).await?,

        ShellCommand::Login(pin) => match desk.elevate(&pin).await? {
            PinOutcome::Enrolled(_) => Output::note("owner PIN set; owner session started"),
            PinOutcome::Verified => Output::note("owner session started"),
        },
        ShellCommand::Logout => execute(desk, Command::Logout).await?,
    };
    Ok(Step::Continue(output))
}

async fn write_output<W>(writer: &mut W, output: &Output) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !output.stdout.is_empty() {
        writer.write_all(output.stdout.as_bytes()).await?;
        if !output.stdout.ends_with('\n') {
            writer.write_all(b"\n").await?;
        }
    }
    for note in &output.notes {
        writer.write_all(format!("  {}\n", note).as_bytes()).await?;
    }
    Ok(())
}

/// Reads commands from `reader` until `quit` or end of input.
///
/// Errors from a command are printed and the session goes on; only I/O
/// errors on the streams end it.
pub async fn run_shell<R, W>(
    desk: &mut QuoteDesk,
    reader: R,
    writer: &mut W,
    poll: Duration,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let watcher = IdleWatcher::spawn(desk.session().clone(), poll);
    info!("Shell started");

    writer.write_all(b"Quote desk. Type 'help' for commands.\n").await?;
    let mut lines = reader.lines();
    let mut last_role = desk.role();

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if last_role == Role::Owner && desk.role() == Role::Staff {
            writer
                .write_all(b"  owner session timed out; back to staff\n")
                .await?;
        }
        desk.session().touch();

        let result = match parse_line(&line) {
            Ok(command) => run(desk, command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(Step::Continue(output)) => write_output(writer, &output).await?,
            Ok(Step::Quit) => break,
            Err(e) => {
                debug!(error = %e, "Shell command failed");
                writer.write_all(format!("{}\n", e).as_bytes()).await?;
            }
        }
        last_role = desk.role();
    }

    writer.flush().await?;
    watcher.shutdown().await;
    info!("Shell closed");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use quote_store::MemoryStore;
    use std::sync::Arc;

    async fn desk_with_limit(limit: chrono::Duration) -> QuoteDesk {
        QuoteDesk::open(Arc::new(MemoryStore::new()), SessionState::new(limit)).await
    }

    async fn session_output(desk: &mut QuoteDesk, input: &str) -> String {
        let mut out: Vec<u8> = Vec::new();
        run_shell(desk, input.as_bytes(), &mut out, Duration::from_millis(10))
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   ").unwrap(), ShellCommand::Empty);
        assert_eq!(
            parse_line("customer  Cô Lan  ").unwrap(),
            ShellCommand::Customer("Cô Lan".to_string())
        );
        assert_eq!(
            parse_line("name 2 Giấy in decal").unwrap(),
            ShellCommand::ItemName(2, "Giấy in decal".to_string())
        );
        assert_eq!(
            parse_line("dims 1 1.2 0.8").unwrap(),
            ShellCommand::ItemDimensions(1, 1.2, 0.8)
        );
        assert_eq!(
            parse_line("print --html abc --confirm-underpriced").unwrap(),
            ShellCommand::Print {
                id: Some("abc".to_string()),
                confirmation: Confirmation::Confirmed,
                html: true
            }
        );
        assert_eq!(parse_line("list").unwrap(), ShellCommand::List(None));
        assert_eq!(parse_line("stats 2024-05").unwrap(), ShellCommand::Stats(Some((2024, 5))));
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("qty x 2").is_err());
        assert!(parse_line("sell 1 abc").is_err());
        assert!(parse_line("sell 1 NaN").is_err());
        assert!(parse_line("date 2024-02-30").is_err());
        assert!(parse_line("print --pdf").is_err());
    }

    #[tokio::test]
    async fn test_edit_save_share_session() {
        let mut desk = desk_with_limit(chrono::Duration::minutes(10)).await;
        let out = session_output(
            &mut desk,
            "customer Anh Minh\n\
             name 1 Giấy in\n\
             dims 1 1.2 0.8\n\
             qty 1 2\n\
             sell 1 50000\n\
             save\n\
             share\n\
             quit\n\
             customer ignored after quit\n",
        )
        .await;

        assert!(out.contains("Tổng thanh toán: 96.000đ"));
        assert!(out.contains("- Giấy in: 1.920 m² × 50.000đ = 96.000đ"));
        assert_eq!(desk.history().len(), 1);
        assert_eq!(desk.current().customer, "Anh Minh");
    }

    #[tokio::test]
    async fn test_errors_do_not_end_the_session() {
        let mut desk = desk_with_limit(chrono::Duration::minutes(10)).await;
        let out = session_output(
            &mut desk,
            "cost 1 1000\nshare\nbogus\nlogin 1234\ncost 1 1000\n",
        )
        .await;

        assert!(out.contains("error[PERMISSION_DENIED]"));
        assert!(out.contains("error[GATE_BLOCKED]"));
        assert!(out.contains("error[USAGE]"));
        assert!(out.contains("owner PIN set"));
        assert_eq!(desk.current().items[0].cost_price, 1000.0);
    }

    #[tokio::test]
    async fn test_open_and_copy_unknown_id_keep_current_order() {
        let mut desk = desk_with_limit(chrono::Duration::minutes(10)).await;
        let out = session_output(&mut desk, "customer Cô Lan
open nope
copy nope
").await;

        assert!(!out.contains("error["));
        assert!(out.contains("no saved quote #nope; nothing opened"));
        assert!(out.contains("no saved quote #nope; nothing copied"));
        assert_eq!(desk.current().customer, "Cô Lan");
        assert!(desk.history().is_empty());
    }

    #[tokio::test]
    async fn test_idle_owner_is_demoted_during_shell() {
        let mut desk = desk_with_limit(chrono::Duration::milliseconds(30)).await;
        desk.elevate("1234").await.unwrap();

        // Stream with a pause between lines.
        let (client, server) = tokio::io::duplex(1024);
        let (read_half, _) = tokio::io::split(server);
        let feeder = tokio::spawn(async move {
            let mut client = client;
            client.write_all(b"show\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            client.write_all(b"show\nquit\n").await.unwrap();
            client
        });

        let mut out: Vec<u8> = Vec::new();
        run_shell(
            &mut desk,
            tokio::io::BufReader::new(read_half),
            &mut out,
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        drop(feeder.await.unwrap());

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("owner session timed out"));
        assert_eq!(desk.role(), Role::Staff);
    }
}
