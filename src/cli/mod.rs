//! CLI module for idxmeta
//!
//! Provides command-line access to remote metadata blobs:
//! - inspect: decode and print as a document
//! - verify: check the checksum frame only
//! - transcode: print the binary encoding for a peer version

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{inspect, run, run_command, transcode, verify};
pub use errors::{CliError, CliErrorCode, CliResult};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber, honouring `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
