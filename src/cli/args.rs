//! CLI argument definitions using clap
//!
//! Commands:
//! - idxmeta inspect --blob <path> [--config <path>]
//! - idxmeta verify --blob <path> [--config <path>]
//! - idxmeta transcode --blob <path> --wire-version <x.y.z> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// idxmeta - inspect and transcode index metadata blobs
#[derive(Parser, Debug)]
#[command(name = "idxmeta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a framed remote blob and print it as a metadata document
    Inspect {
        /// Path to the framed blob
        #[arg(long)]
        blob: PathBuf,

        /// Path to codec configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate the checksum frame only
    Verify {
        /// Path to the framed blob
        #[arg(long)]
        blob: PathBuf,

        /// Path to codec configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Decode a framed blob and print its binary encoding as hex
    Transcode {
        /// Path to the framed blob
        #[arg(long)]
        blob: PathBuf,

        /// Peer version to encode for, e.g. 2.17.0
        #[arg(long)]
        wire_version: String,

        /// Path to codec configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
