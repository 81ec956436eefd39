use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use promise_lines::{lines, task, Error};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Count the lines of a file synchronously, then again through a chained
/// promise.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// File to count. Defaults to this program's own source.
    #[arg(default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/src/main.rs"))]
    path: PathBuf,

    /// Chain by spawning a waiter thread instead of registering a callback.
    #[arg(long)]
    waiter: bool,
}

fn run(cli: &Cli) -> Result<(), Error> {
    println!("sync call: lineCount={}", lines::count_lines_sync(&cli.path)?);

    let count = lines::count_lines_async(cli.path.clone());
    let print_count = |count: usize| println!("async call: lineCount={count}");
    let done = if cli.waiter {
        debug!("chaining with a waiter thread");
        task::then(count, print_count)
    } else {
        count.then(print_count)
    };
    done.wait()
}

/// `err` followed by each of its sources, `: `-separated.
fn report(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("exception: {}", report(&err));
            ExitCode::FAILURE
        }
    }
}
