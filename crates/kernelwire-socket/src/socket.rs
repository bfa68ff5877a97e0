use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use kernelwire_message::{Decoded, Message, MessageSender, WireConfig};
use kernelwire_transport::{
    FrameHandler, LocalSocket, MultipartSocket, SendFlags, SocketKind, MESSAGE_EVENT,
};
use tracing::{debug, error, trace};

use crate::error::{Result, SocketError};
use crate::listener::{Entry, ListenerRef, ListenerTable, ListenerToken, MessageHandler};

/// Payload accepted by [`MessageSocket::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Encoded with the socket's [`WireConfig`] before sending.
    Message(Message),
    /// Sent to the transport as-is.
    Frames(Vec<Bytes>),
}

impl From<Message> for Outgoing {
    fn from(message: Message) -> Self {
        Outgoing::Message(message)
    }
}

impl From<Vec<Bytes>> for Outgoing {
    fn from(frames: Vec<Bytes>) -> Self {
        Outgoing::Frames(frames)
    }
}

/// A multipart socket that speaks signed messages.
///
/// Holds the transport endpoint and the wire configuration used for every
/// send and receive on it. Only the `"message"` event is intercepted; other
/// events and raw frame handlers pass straight through to the transport.
pub struct MessageSocket<T> {
    inner: T,
    config: Arc<WireConfig>,
    listeners: Arc<ListenerTable>,
}

impl<T: MultipartSocket> MessageSocket<T> {
    /// Wrap a transport endpoint.
    pub fn new(inner: T, config: WireConfig) -> Self {
        debug!(kind = %inner.kind(), signed = config.is_signing(), "message socket created");
        Self {
            inner,
            config: Arc::new(config),
            listeners: Arc::new(ListenerTable::default()),
        }
    }

    /// The wrapped transport endpoint.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    pub fn kind(&self) -> SocketKind {
        self.inner.kind()
    }

    /// Send a message or raw frames.
    pub fn send(&self, payload: impl Into<Outgoing>, flags: SendFlags) -> Result<()> {
        let frames = match payload.into() {
            Outgoing::Message(message) => message.encode(&self.config)?,
            Outgoing::Frames(frames) => frames,
        };
        self.inner.send(frames, flags)?;
        Ok(())
    }

    /// Call `handler` with every message received that decodes and verifies.
    ///
    /// Frames that fail to decode are dropped without calling the handler.
    pub fn on_message(&self, handler: MessageHandler) -> ListenerToken {
        let token = self.listeners.next_token();
        let wrapper = self.wrap(Arc::clone(&handler), None);
        self.listeners.insert(
            token,
            Entry {
                handler,
                wrapper: Arc::clone(&wrapper),
                once: false,
            },
        );
        self.inner.on(MESSAGE_EVENT, wrapper);
        trace!(%token, "message listener added");
        token
    }

    /// Like [`MessageSocket::on_message`], for the next received message only.
    ///
    /// The registration is consumed by the next receive even when that
    /// receive fails to decode. Until then it can be removed like any other.
    pub fn once_message(&self, handler: MessageHandler) -> ListenerToken {
        let token = self.listeners.next_token();
        let wrapper = self.wrap(Arc::clone(&handler), Some(token));
        self.listeners.insert(
            token,
            Entry {
                handler,
                wrapper: Arc::clone(&wrapper),
                once: true,
            },
        );
        self.inner.once(MESSAGE_EVENT, wrapper);
        trace!(%token, "one-shot message listener added");
        token
    }

    /// Remove a message listener by token or by the handler it was registered with.
    ///
    /// Returns false if nothing matched.
    pub fn remove_message_listener(&self, listener: impl Into<ListenerRef>) -> bool {
        let removed = match listener.into() {
            ListenerRef::Token(token) => self.listeners.remove(token).map(|entry| (token, entry)),
            ListenerRef::Handler(handler) => self.listeners.remove_handler(&handler),
        };

        match removed {
            Some((token, entry)) => {
                self.inner.remove_listener(MESSAGE_EVENT, &entry.wrapper);
                trace!(%token, once = entry.once, "message listener removed");
                true
            }
            None => false,
        }
    }

    /// Returns true while the registration behind `token` is live.
    pub fn is_registered(&self, token: ListenerToken) -> bool {
        self.listeners.contains(token)
    }

    /// Number of live message listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a raw frame handler for `event` on the transport.
    pub fn on(&self, event: &str, handler: FrameHandler) {
        self.inner.on(event, handler);
    }

    /// Register a one-shot raw frame handler for `event` on the transport.
    pub fn once(&self, event: &str, handler: FrameHandler) {
        self.inner.once(event, handler);
    }

    /// Remove a raw frame handler from the transport.
    pub fn remove_listener(&self, event: &str, handler: &FrameHandler) {
        self.inner.remove_listener(event, handler);
    }

    /// Remove every listener for `event`, or for all events when `None`.
    ///
    /// Clearing `"message"` (or everything) also forgets all tracked
    /// message listeners.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        if event.is_none_or(|event| event == MESSAGE_EVENT) {
            let cleared = self.listeners.clear();
            trace!(cleared, "message listeners cleared");
        }
        self.inner.remove_all_listeners(event);
    }

    fn wrap(&self, handler: MessageHandler, once: Option<ListenerToken>) -> FrameHandler {
        let config = Arc::clone(&self.config);
        let listeners: Weak<ListenerTable> = Arc::downgrade(&self.listeners);
        Arc::new(move |frames: &[Bytes]| {
            if let (Some(token), Some(listeners)) = (once, listeners.upgrade()) {
                listeners.remove(token);
            }
            dispatch(&config, frames, &handler);
        })
    }
}

impl MessageSocket<LocalSocket> {
    /// Two connected in-process message sockets sharing one configuration.
    pub fn local_pair(left: SocketKind, right: SocketKind, config: WireConfig) -> (Self, Self) {
        let (a, b) = LocalSocket::pair(left, right);
        (Self::new(a, config.clone()), Self::new(b, config))
    }
}

impl<T: MultipartSocket> MessageSender for MessageSocket<T> {
    type Error = SocketError;

    fn send_message(&self, message: Message) -> Result<()> {
        self.send(message, SendFlags::NONE)
    }
}

impl<T: fmt::Debug> fmt::Debug for MessageSocket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSocket")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn dispatch(config: &WireConfig, frames: &[Bytes], handler: &MessageHandler) {
    match Message::decode(frames, config) {
        Ok(Decoded::Message(message)) => handler(message),
        Ok(Decoded::Rejected(_) | Decoded::Aborted(_)) => {}
        // A verified body that is not valid JSON has no caller to return to here.
        Err(err) => error!(%err, frames = frames.len(), "dropping malformed message"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use kernelwire_message::{JsonObject, DELIMITER};
    use serde_json::json;

    use super::*;

    fn object(value: serde_json::Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn recorder() -> (MessageHandler, Arc<Mutex<Vec<Message>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: MessageHandler = Arc::new(move |message: Message| {
            sink.lock().unwrap().push(message);
        });
        (handler, seen)
    }

    fn request() -> Message {
        Message::request("s", "u", "execute_request", object(json!({ "code": "1" })))
    }

    fn signed_pair() -> (MessageSocket<LocalSocket>, MessageSocket<LocalSocket>) {
        MessageSocket::local_pair(
            SocketKind::Dealer,
            SocketKind::Dealer,
            WireConfig::signed("secret"),
        )
    }

    #[test]
    fn send_encodes_and_handler_receives_decoded() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        server.on_message(handler);

        let sent = request();
        client.send(sent.clone(), SendFlags::NONE).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].header, sent.header);
        assert_eq!(seen[0].content, sent.content);
        assert_eq!(seen[0].signature_ok, Some(true));
    }

    #[test]
    fn raw_frames_pass_through_unencoded() {
        let (client, server) = signed_pair();
        let raw = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&raw);
        server.on(
            MESSAGE_EVENT,
            Arc::new(move |frames: &[Bytes]| sink.lock().unwrap().push(frames.to_vec())),
        );

        client
            .send(vec![Bytes::from_static(b"plain")], SendFlags::NONE)
            .unwrap();
        assert_eq!(raw.lock().unwrap()[0], vec![Bytes::from_static(b"plain")]);
    }

    #[test]
    fn aborted_decodes_are_not_dispatched() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        server.on_message(handler);

        // No delimiter.
        client
            .send(vec![Bytes::from_static(b"junk")], SendFlags::NONE)
            .unwrap();
        // Too few frames.
        client
            .send(
                vec![Bytes::from_static(DELIMITER), Bytes::from_static(b"")],
                SendFlags::NONE,
            )
            .unwrap();
        // Wrong key.
        let frames = request().encode(&WireConfig::signed("wrong")).unwrap();
        client.send(frames, SendFlags::NONE).unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_dropped_not_dispatched() {
        let (client, server) = MessageSocket::local_pair(
            SocketKind::Pair,
            SocketKind::Pair,
            WireConfig::unsigned(),
        );
        let (handler, seen) = recorder();
        server.on_message(handler);

        let frames = vec![
            Bytes::from_static(DELIMITER),
            Bytes::new(),
            Bytes::from_static(b"{"),
            Bytes::from_static(b"{}"),
            Bytes::from_static(b"{}"),
            Bytes::from_static(b"{}"),
        ];
        client.send(frames, SendFlags::NONE).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn remove_by_token() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        let token = server.on_message(handler);

        assert!(server.remove_message_listener(token));
        assert!(!server.remove_message_listener(token));
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 0);

        client.send(request(), SendFlags::NONE).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn remove_by_original_handler() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        let (other, other_seen) = recorder();
        server.on_message(Arc::clone(&handler));
        server.on_message(other);

        assert!(server.remove_message_listener(&handler));
        assert_eq!(server.listener_count(), 1);
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 1);

        client.send(request(), SendFlags::NONE).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(other_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn removing_unknown_handler_is_a_no_op() {
        let (_client, server) = signed_pair();
        let (registered, _) = recorder();
        let (stranger, _) = recorder();
        server.on_message(registered);

        assert!(!server.remove_message_listener(stranger));
        assert_eq!(server.listener_count(), 1);
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 1);
    }

    #[test]
    fn once_fires_once_and_untracks_itself() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        let token = server.once_message(handler);
        assert!(server.is_registered(token));

        client.send(request(), SendFlags::NONE).unwrap();
        client.send(request(), SendFlags::NONE).unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(!server.is_registered(token));
        assert_eq!(server.listener_count(), 0);
    }

    #[test]
    fn once_can_be_removed_by_handler_before_firing() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        server.once_message(Arc::clone(&handler));

        assert!(server.remove_message_listener(&handler));
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 0);

        client.send(request(), SendFlags::NONE).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn once_is_consumed_by_undecodable_frames() {
        let (client, server) = signed_pair();
        let (handler, seen) = recorder();
        let token = server.once_message(handler);

        client
            .send(vec![Bytes::from_static(b"junk")], SendFlags::NONE)
            .unwrap();
        client.send(request(), SendFlags::NONE).unwrap();

        assert!(seen.lock().unwrap().is_empty());
        assert!(!server.is_registered(token));
    }

    #[test]
    fn remove_all_message_listeners_clears_table() {
        let (client, server) = signed_pair();
        let (a, seen_a) = recorder();
        let (b, seen_b) = recorder();
        server.on_message(a);
        server.once_message(b);

        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        server.on(
            "close",
            Arc::new(move |_: &[Bytes]| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        server.remove_all_listeners(Some(MESSAGE_EVENT));
        assert_eq!(server.listener_count(), 0);

        client.send(request(), SendFlags::NONE).unwrap();
        assert!(seen_a.lock().unwrap().is_empty());
        assert!(seen_b.lock().unwrap().is_empty());

        // Other events are untouched.
        server.inner().emit("close", &[]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        server.remove_all_listeners(None);
        assert_eq!(server.inner().listener_count("close"), 0);
    }

    #[test]
    fn remove_all_for_other_event_keeps_message_table() {
        let (_client, server) = signed_pair();
        let (handler, _) = recorder();
        server.on_message(handler);

        server.remove_all_listeners(Some("close"));
        assert_eq!(server.listener_count(), 1);
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 1);
    }

    #[test]
    fn raw_once_and_remove_pass_through() {
        let (_client, server) = signed_pair();
        let handler: FrameHandler = Arc::new(|_: &[Bytes]| {});
        server.once("error", Arc::clone(&handler));
        assert_eq!(server.inner().listener_count("error"), 1);

        server.remove_listener("error", &handler);
        assert_eq!(server.inner().listener_count("error"), 0);
    }

    #[test]
    fn router_reply_reaches_requester() {
        let (router, dealer) = MessageSocket::local_pair(
            SocketKind::Router,
            SocketKind::Dealer,
            WireConfig::signed("secret"),
        );
        let router = Arc::new(router);

        let responder = Arc::clone(&router);
        router.on_message(Arc::new(move |message: Message| {
            message
                .respond(
                    responder.as_ref(),
                    "execute_reply",
                    Some(object(json!({ "status": "ok" }))),
                    None,
                    None,
                )
                .unwrap();
        }));

        let (handler, replies) = recorder();
        dealer.on_message(handler);

        let sent = request();
        dealer.send(sent.clone(), SendFlags::NONE).unwrap();

        let replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        let reply = &replies[0];
        assert_eq!(reply.parent_header, sent.header);
        assert_eq!(reply.msg_type(), Some("execute_reply"));
        assert_eq!(reply.content, object(json!({ "status": "ok" })));
        assert_eq!(reply.signature_ok, Some(true));
        assert!(reply.idents.is_empty());
    }

    #[test]
    fn router_sees_requester_identity_in_idents() {
        let (router, dealer) = MessageSocket::local_pair(
            SocketKind::Router,
            SocketKind::Dealer,
            WireConfig::unsigned(),
        );
        let (handler, seen) = recorder();
        router.on_message(handler);

        dealer.send(request(), SendFlags::NONE).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].idents, vec![dealer.inner().identity().clone()]);
    }

    #[test]
    fn clearing_listeners_releases_captured_socket() {
        let (router, _dealer) = MessageSocket::local_pair(
            SocketKind::Router,
            SocketKind::Dealer,
            WireConfig::unsigned(),
        );
        let router = Arc::new(router);
        let captured = Arc::clone(&router);
        router.on_message(Arc::new(move |_: Message| {
            let _ = captured.listener_count();
        }));
        assert_eq!(Arc::strong_count(&router), 2);

        router.remove_all_listeners(None);
        assert_eq!(Arc::strong_count(&router), 1);
    }

    #[test]
    fn registration_from_many_threads() {
        let (_client, server) = signed_pair();
        let server = Arc::new(server);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let server = Arc::clone(&server);
                std::thread::spawn(move || {
                    let (handler, _) = recorder();
                    let token = server.on_message(Arc::clone(&handler));
                    server.once_message(handler);
                    token
                })
            })
            .collect();

        let tokens: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert_eq!(server.listener_count(), 16);

        for token in tokens {
            assert!(server.remove_message_listener(token));
        }
        assert_eq!(server.listener_count(), 8);
        assert_eq!(server.inner().listener_count(MESSAGE_EVENT), 8);
    }

    #[test]
    fn send_surfaces_transport_errors() {
        let socket = MessageSocket::new(LocalSocket::new(SocketKind::Dealer), WireConfig::default());
        let err = socket.send(request(), SendFlags::NONE).unwrap_err();
        assert!(matches!(
            err,
            SocketError::Transport(kernelwire_transport::TransportError::NoPeer)
        ));
    }
}
