//! # xlog - Main Entry Point
//!
//! Copies standard input into an xlog logger, one record per input line.
//! Each record's call site is `stdin:<line number>`.
//!
//! ## Operation
//!
//! 1. **Initialize diagnostics**: xlog's own events go to stderr through tracing
//! 2. **Parse arguments**: flags, optionally layered over a JSON options file
//! 3. **Open the logger**: a rotating file logger with `--file`, stdout otherwise
//! 4. **Pump stdin**: every line becomes a record at the `--as` level
//! 5. **Close**: drain the queue and stop the background threads
//!
//! ## Examples
//!
//! ```text
//! some-service 2>&1 | xlog --file /var/log/some-service.log --as info
//! RUST_LOG=xlog=debug xlog -f app.log -t "child: %s" < input.txt
//! ```
//!
//! A logger that cannot open its file ends the process with status 1.

use anyhow::Result;
use clap::Parser;
use std::borrow::Cow;
use std::io::{self, BufRead};
use tracing::debug;
use xlog::{args, cli::Args, logging::DiagnosticFormatter, CallSite, Logger};

fn main() -> Result<()> {
    // Diagnostics are controlled via RUST_LOG, e.g. RUST_LOG=xlog=debug
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .event_format(DiagnosticFormatter)
        .init();

    let cli = Args::parse();
    debug!("Configuration: {:?}", cli);

    let options = cli.options()?;
    let logger = match &cli.file {
        Some(base) => Logger::from_file_name_or_exit(base, options),
        None => Logger::new(io::stdout(), options)?,
    };

    for (index, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        let call_site = CallSite::new("stdin", u32::try_from(index + 1).unwrap_or(u32::MAX));
        let template = cli.template.clone().map(Cow::Owned);
        logger.output_at(cli.as_level, call_site, template, args![line]);
    }

    logger.close()?;
    Ok(())
}
