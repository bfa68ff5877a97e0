use std::fs;
use std::io::{self, Read};

use bytes::Bytes;
use kernelwire_message::{DecodeAbort, Decoded, Message, WireConfig};

use crate::cmd::DecodeArgs;
use crate::exit::{decode_abort, io_error, wire_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, FrameRepr, OutputFormat};

pub fn run(args: DecodeArgs, config: &WireConfig, format: OutputFormat) -> CliResult<i32> {
    let input = match &args.file {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    let frames = parse_frames(&input)?;
    match Message::decode(&frames, config).map_err(|err| wire_error("decode failed", err))? {
        Decoded::Message(message) => {
            print_message(&message, format);
            Ok(SUCCESS)
        }
        Decoded::Rejected(message) => {
            print_message(&message, format);
            Err(decode_abort(DecodeAbort::SignatureMismatch))
        }
        Decoded::Aborted(reason) => Err(decode_abort(reason)),
    }
}

fn parse_frames(input: &str) -> CliResult<Vec<Bytes>> {
    let reprs: Vec<FrameRepr> = serde_json::from_str(input).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("frames must be a JSON array of strings or {{\"hex\": ...}}: {err}"),
        )
    })?;
    reprs
        .into_iter()
        .map(|repr| {
            repr.into_frame()
                .map_err(|message| CliError::new(DATA_INVALID, message))
        })
        .collect()
}
