//! # Quote Desk Entry Point
//!
//! ```text
//! quote-desk --pin 1234 stats --month 2024-05
//!      │
//!      ▼
//! main ──► init_tracing ──► quote_desk::run(args)
//!                                  │
//!                    Ok  ──► exit 0
//!                    Err ──► "error[CODE]: message" on stderr, exit 1 (2 for usage)
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    quote_desk::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match quote_desk::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            if err.code == quote_desk::error::ErrorCode::Usage {
                eprintln!("\n{}", quote_desk::commands::USAGE);
            }
            ExitCode::from(quote_desk::exit_code(&err))
        }
    }
}
