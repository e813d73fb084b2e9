use clap::Parser;
use preflight::{execute, Args};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match execute(&args, &mut out) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
