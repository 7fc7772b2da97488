//! CLI module for confcentral
//!
//! Seeds an in-memory store from a JSON file and runs one query command,
//! printing a single JSON object to stdout. Logs go to stderr.

mod args;
mod commands;
mod errors;
mod io;
mod seed;

pub use args::{parse_clause, Cli, Command};
pub use commands::{execute, load_config, run_command};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
pub use seed::{SeedFile, SeedIndex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Parses arguments, runs the command and prints the outcome
pub fn run() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse_args();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    match runtime.block_on(execute(&cli)) {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code(), &err.to_string())?;
            Err(err)
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the `info` default
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
