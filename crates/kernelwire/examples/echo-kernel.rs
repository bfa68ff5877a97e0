//! Minimal kernel that answers execute requests over an in-process router/dealer pair.
//!
//! Run with:
//!   cargo run --example echo-kernel

use std::sync::{Arc, Mutex};

use kernelwire::message::JsonObject;
use kernelwire::transport::{SendFlags, SocketKind};
use kernelwire::{Message, MessageSocket, WireConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WireConfig::signed("example-key");
    let (shell, client) =
        MessageSocket::local_pair(SocketKind::Router, SocketKind::Dealer, config);
    let shell = Arc::new(shell);

    // Kernel side: echo the code back as the reply payload.
    let responder = Arc::clone(&shell);
    shell.on_message(Arc::new(move |request: Message| {
        eprintln!(
            "Kernel received {} from session {}",
            request.msg_type().unwrap_or("?"),
            request.session().unwrap_or("?")
        );
        let mut content = JsonObject::new();
        content.insert("status".into(), "ok".into());
        if let Some(code) = request.content.get("code") {
            content.insert("echo".into(), code.clone());
        }
        let sent = request.respond(
            responder.as_ref(),
            "execute_reply",
            Some(content),
            None,
            None,
        );
        if let Err(e) = sent {
            eprintln!("Reply failed: {e}");
        }
    }));

    let replies = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&replies);
    client.on_message(Arc::new(move |reply: Message| {
        if let Ok(mut replies) = sink.lock() {
            replies.push(reply);
        }
    }));

    let mut content = JsonObject::new();
    content.insert("code".into(), "print('hello')".into());
    let sent = client.send(
        Message::request("example-session", "example", "execute_request", content),
        SendFlags::NONE,
    );

    // The kernel handler holds a handle to the shell socket; drop it to break the cycle.
    shell.remove_all_listeners(None);
    sent?;

    for reply in replies.lock().map_err(|e| e.to_string())?.iter() {
        println!(
            "{} -> {}",
            reply.msg_type().unwrap_or("?"),
            serde_json::Value::Object(reply.content.clone())
        );
    }

    Ok(())
}
