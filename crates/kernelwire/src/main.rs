mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use kernelwire_message::{SignatureScheme, WireConfig};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "kernelwire", version, about = "Kernel messaging codec CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log dropped messages at warn instead of debug.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Shared signing key. Empty disables signing.
    #[arg(
        long,
        env = "KERNELWIRE_KEY",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    key: String,

    /// Signature scheme (hmac-sha256, hmac-sha384, hmac-sha512).
    #[arg(
        long,
        env = "KERNELWIRE_SCHEME",
        default_value = "hmac-sha256",
        global = true
    )]
    scheme: SignatureScheme,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn wire_config(&self) -> WireConfig {
        WireConfig {
            scheme: self.scheme,
            key: self.key.as_bytes().to_vec(),
            verbose: self.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let config = cli.wire_config();
    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &config, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
