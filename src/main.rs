// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

#![warn(
  bad_style,
  future_incompatible,
  nonstandard_style,
  rust_2018_compatibility,
  rust_2018_idioms,
  unused,
  unused_qualifications,
  unused_results
)]

//! The `apca` command line tool, issuing a single request against the
//! Alpaca API per invocation.
//!
//! The process exit code reflects the outcome: 0 for success, 2 for
//! usage errors, and a distinct code per error kind otherwise.

mod args;

use std::error::Error as _;
use std::io::stdout;
use std::io::Write as _;
use std::process::ExitCode;

use apca_cli::api::LIVE_BASE_URL;
use apca_cli::ApiInfo;
use apca_cli::Body;
use apca_cli::Client;
use apca_cli::Error;
use apca_cli::Response;

use clap::Parser as _;

use tokio::runtime::Builder as RuntimeBuilder;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::args::Args;


/// The exit code used for failures outside of the error taxonomy, e.g.,
/// when the runtime cannot be set up.
const EXIT_INTERNAL: u8 = 1;


/// Install a `tracing` subscriber logging to stderr.
///
/// `RUST_LOG` directives take precedence over the level derived from
/// the verbosity.
fn init_tracing(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::WARN,
    1 => LevelFilter::INFO,
    2 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  };
  let filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _result = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}


async fn run(args: Args) -> Result<Response, Error> {
  let base_url = if args.live {
    Some(LIVE_BASE_URL)
  } else {
    args.base_url.as_deref()
  };
  let api_info = ApiInfo::from_env_with(base_url)?;
  info!(base_url = %api_info.base_url(), "using trading API");

  let request = args.command.request()?;
  let client = Client::builder().timeout(args.timeout).build(api_info);
  client.issue(&request).await
}


/// Print a response body to stdout.
fn print(body: &Body) -> std::io::Result<()> {
  let mut stdout = stdout().lock();
  match body {
    Body::Empty => (),
    Body::Json(value) => {
      let json = serde_json::to_string_pretty(value)?;
      writeln!(stdout, "{json}")?
    },
    Body::Text(text) => writeln!(stdout, "{text}")?,
  }
  stdout.flush()
}


/// Report an error on stderr and map it to the process exit code.
fn report(err: &Error) -> ExitCode {
  let kind = err.kind();
  let mut message = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    message = format!("{message}: {cause}");
    source = cause.source();
  }

  eprintln!("{kind}: {message}");
  if let Some(body) = err.body() {
    if !body.is_empty() {
      eprintln!("{body}");
    }
  }
  ExitCode::from(kind.exit_code())
}


fn main() -> ExitCode {
  // Variables already set in the environment take precedence over the
  // ones in the file.
  let dotenv = dotenvy::dotenv();
  let args = Args::parse();
  let () = init_tracing(args.verbosity);

  match dotenv {
    Ok(path) => debug!(path = %path.display(), "loaded environment file"),
    Err(err) if err.not_found() => (),
    Err(err) => warn!("failed to load environment file: {err}"),
  }

  let runtime = match RuntimeBuilder::new_current_thread().enable_all().build() {
    Ok(runtime) => runtime,
    Err(err) => {
      error!("failed to create runtime: {err}");
      return ExitCode::from(EXIT_INTERNAL)
    },
  };

  match runtime.block_on(run(args)) {
    Ok(response) => {
      debug!(status = %response.status, request_id = ?response.request_id, "request succeeded");
      match print(&response.body) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
          eprintln!("failed to write response: {err}");
          ExitCode::from(EXIT_INTERNAL)
        },
      }
    },
    Err(err) => report(&err),
  }
}
