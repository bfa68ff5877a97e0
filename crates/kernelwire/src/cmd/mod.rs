use clap::{Args, Subcommand};
use kernelwire_message::{JsonObject, WireConfig};
use std::path::PathBuf;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod demo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a request and print its wire frames.
    Encode(EncodeArgs),
    /// Decode and verify wire frames read from a file or stdin.
    Decode(DecodeArgs),
    /// Run an in-process request/reply exchange.
    Demo(DemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: &WireConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, config, format),
        Command::Decode(args) => decode::run(args, config, format),
        Command::Demo(args) => demo::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message type, e.g. execute_request.
    #[arg(long, short = 't')]
    pub msg_type: String,
    /// Content object (JSON).
    #[arg(long, default_value = "{}")]
    pub content: String,
    /// Metadata object (JSON).
    #[arg(long, default_value = "{}")]
    pub metadata: String,
    /// Session id. Default: derived from the process id.
    #[arg(long)]
    pub session: Option<String>,
    /// Username stamped in the header.
    #[arg(long, env = "USER", default_value = "kernelwire")]
    pub username: String,
    /// Routing identity frame to prepend (repeatable).
    #[arg(long = "ident", value_name = "IDENT")]
    pub idents: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read frames (JSON array) from file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Request message type.
    #[arg(long, short = 't', default_value = "kernel_info_request")]
    pub msg_type: String,
    /// Request content object (JSON).
    #[arg(long, default_value = "{}")]
    pub content: String,
    /// Reply message type. Default: request type with `_request` replaced by `_reply`.
    #[arg(long)]
    pub reply_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a command-line JSON object argument.
pub fn parse_object(flag: &str, text: &str) -> CliResult<JsonObject> {
    serde_json::from_str(text)
        .map_err(|err| CliError::new(USAGE, format!("{flag} is not a JSON object: {err}")))
}
