//! Inspect a KCP registration result.
//!
//! Run with: cargo run -p kcp-demos --bin kcp_viewer -- --solution solution.json

use clap::Parser;
use kcp_demos::{init_logging, run, Args};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
