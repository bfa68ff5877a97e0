use std::sync::mpsc;
use std::sync::Arc;

use kernelwire_message::{JsonObject, Message, WireConfig};
use kernelwire_socket::MessageSocket;
use kernelwire_transport::{SendFlags, SocketKind};
use serde_json::Value;
use tracing::{error, info};

use crate::cmd::{parse_object, DemoArgs};
use crate::exit::{socket_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DemoArgs, config: &WireConfig, format: OutputFormat) -> CliResult<i32> {
    let content = parse_object("--content", &args.content)?;
    let reply_type = args
        .reply_type
        .unwrap_or_else(|| reply_type_for(&args.msg_type));

    let (shell, client) =
        MessageSocket::local_pair(SocketKind::Router, SocketKind::Dealer, config.clone());
    let shell = Arc::new(shell);

    let responder = Arc::clone(&shell);
    shell.on_message(Arc::new(move |request: Message| {
        info!(
            msg_type = request.msg_type().unwrap_or(""),
            idents = request.idents.len(),
            "shell received request"
        );
        let mut content = JsonObject::new();
        content.insert("status".into(), Value::from("ok"));
        if let Err(err) = request.respond(responder.as_ref(), &reply_type, Some(content), None, None)
        {
            error!(%err, "reply failed");
        }
    }));

    let (tx, rx) = mpsc::channel();
    client.once_message(Arc::new(move |reply: Message| {
        let _ = tx.send(reply);
    }));

    let session = format!("kernelwire-demo-{}", std::process::id());
    let request = Message::request(&session, "kernelwire", &args.msg_type, content);
    let sent = client.send(request, SendFlags::NONE);

    // The shell handler holds a handle to the shell; drop it to break the cycle.
    shell.remove_all_listeners(None);
    sent.map_err(|err| socket_error("send failed", err))?;

    let reply = rx
        .try_recv()
        .map_err(|_| CliError::new(FAILURE, "no reply received"))?;
    print_message(&reply, format);
    Ok(SUCCESS)
}

fn reply_type_for(msg_type: &str) -> String {
    match msg_type.strip_suffix("_request") {
        Some(base) => format!("{base}_reply"),
        None => format!("{msg_type}_reply"),
    }
}
