//! CLI command implementations
//!
//! Every command loads the codec configuration first (defaults when no
//! `--config` is given), then works on a single framed blob.

use std::path::Path;

use serde_json::json;
use tracing::info;

use crate::config::CodecConfig;
use crate::index::{DocumentExtensions, IndexMetadata, WireExtensions};
use crate::remote::ChecksumValidator;
use crate::version::WireVersion;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{open_blob, read_blob, to_hex, write_json, write_line};

/// Parse arguments, initialise logging and run the selected command
pub fn run() -> CliResult<()> {
    super::init_tracing();
    let cli = super::Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Inspect { blob, config } => inspect(&blob, config.as_deref()),
        Command::Verify { blob, config } => verify(&blob, config.as_deref()),
        Command::Transcode {
            blob,
            wire_version,
            config,
        } => transcode(&blob, &wire_version, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CodecConfig> {
    match path {
        Some(path) => CodecConfig::load(path).map_err(CliError::from),
        None => Ok(CodecConfig::default()),
    }
}

fn decode_blob(blob: &Path, config: &CodecConfig) -> CliResult<IndexMetadata> {
    let reader = config.remote_reader(DocumentExtensions::none())?;
    Ok(reader.deserialize(open_blob(blob)?)?)
}

/// Print the decoded record as a document in the configured shape
pub fn inspect(blob: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let metadata = decode_blob(blob, &config)?;
    info!(index = metadata.index(), mode = %config.context_mode, "inspecting blob");

    let document = metadata.to_document(&config.document_params(), &DocumentExtensions::none())?;
    write_json(&document)
}

/// Validate the frame and report the content bounds
pub fn verify(blob: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data = read_blob(blob)?;

    let bounds = ChecksumValidator::new().content_bounds(
        &data,
        &config.codec_name,
        config.min_codec_version,
        config.max_codec_version,
    )?;
    let compressed = config.compressor()?.is_compressed(&data[bounds.clone()]);

    write_json(&json!({
        "status": "ok",
        "codec": config.codec_name,
        "content_start": bounds.start,
        "content_end": bounds.end,
        "content_length": bounds.len(),
        "compressed": compressed,
    }))
}

/// Print the binary encoding of the decoded record for a peer version
pub fn transcode(blob: &Path, wire_version: &str, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let version: WireVersion = wire_version.parse()?;
    let metadata = decode_blob(blob, &config)?;

    let bytes = metadata.to_bytes(version, &WireExtensions::none())?;
    info!(index = metadata.index(), %version, len = bytes.len(), "transcoded blob");
    write_line(&to_hex(&bytes))
}
