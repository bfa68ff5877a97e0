use bytes::Bytes;
use kernelwire_message::{Message, WireConfig};

use crate::cmd::{parse_object, EncodeArgs};
use crate::exit::{wire_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: EncodeArgs, config: &WireConfig, format: OutputFormat) -> CliResult<i32> {
    let content = parse_object("--content", &args.content)?;
    let metadata = parse_object("--metadata", &args.metadata)?;
    let session = args
        .session
        .unwrap_or_else(|| format!("kernelwire-{}", std::process::id()));

    let mut message = Message::request(&session, &args.username, &args.msg_type, content)
        .with_idents(args.idents.into_iter().map(Bytes::from));
    message.metadata = metadata;

    let frames = message
        .encode(config)
        .map_err(|err| wire_error("encode failed", err))?;
    tracing::debug!(
        frames = frames.len(),
        signed = config.is_signing(),
        "encoded request"
    );
    print_frames(&frames, format);
    Ok(SUCCESS)
}
