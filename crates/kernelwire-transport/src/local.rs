use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::kind::SocketKind;
use crate::traits::{FrameHandler, MultipartSocket, SendFlags, MESSAGE_EVENT};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// In-process multipart endpoint.
///
/// Endpoints are created in connected pairs. A send on one side delivers the
/// frames synchronously to the other side's `"message"` listeners, on the
/// calling thread. Routing endpoints see the sender identity as the first
/// frame and must address replies with it.
///
/// `LocalSocket` is a cheap handle; clones refer to the same endpoint.
#[derive(Clone)]
pub struct LocalSocket {
    inner: Arc<Endpoint>,
}

struct Endpoint {
    kind: SocketKind,
    identity: Bytes,
    listeners: Mutex<Vec<Registration>>,
    peer: Mutex<Weak<Endpoint>>,
    closed: AtomicBool,
}

struct Registration {
    event: String,
    handler: FrameHandler,
    once: bool,
}

impl LocalSocket {
    /// Create an unconnected endpoint.
    pub fn new(kind: SocketKind) -> Self {
        let id = NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed);
        Self::with_identity(kind, format!("local-{id}"))
    }

    /// Create an unconnected endpoint with an explicit routing identity.
    pub fn with_identity(kind: SocketKind, identity: impl Into<Bytes>) -> Self {
        Self {
            inner: Arc::new(Endpoint {
                kind,
                identity: identity.into(),
                listeners: Mutex::new(Vec::new()),
                peer: Mutex::new(Weak::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Create two endpoints connected to each other.
    pub fn pair(left: SocketKind, right: SocketKind) -> (Self, Self) {
        let left = Self::new(left);
        let right = Self::new(right);
        left.connect(&right);
        (left, right)
    }

    /// Connect this endpoint and `other` to each other, replacing any previous peer.
    pub fn connect(&self, other: &LocalSocket) {
        *lock(&self.inner.peer) = Arc::downgrade(&other.inner);
        *lock(&other.inner.peer) = Arc::downgrade(&self.inner);
        debug!(
            left = %self.inner.kind,
            right = %other.inner.kind,
            "connected local sockets"
        );
    }

    /// Routing identity this endpoint presents to routing peers.
    pub fn identity(&self) -> &Bytes {
        &self.inner.identity
    }

    /// Deliver `frames` to local handlers registered for `event`.
    ///
    /// Returns the number of handlers invoked. Handlers run after the
    /// listener lock is released, so they may register or send freely.
    pub fn emit(&self, event: &str, frames: &[Bytes]) -> usize {
        let handlers: Vec<FrameHandler> = {
            let mut listeners = lock(&self.inner.listeners);
            let matched = listeners
                .iter()
                .filter(|reg| reg.event == event)
                .map(|reg| Arc::clone(&reg.handler))
                .collect();
            listeners.retain(|reg| !(reg.once && reg.event == event));
            matched
        };

        trace!(event, frames = frames.len(), handlers = handlers.len(), "emit");
        for handler in &handlers {
            handler(frames);
        }
        handlers.len()
    }

    /// Number of handlers registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.inner.listeners)
            .iter()
            .filter(|reg| reg.event == event)
            .count()
    }

    /// Close the endpoint. Subsequent sends fail and all listeners are dropped.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        lock(&self.inner.listeners).clear();
        debug!(kind = %self.inner.kind, "closed local socket");
    }

    /// Returns true once [`LocalSocket::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn register(&self, event: &str, handler: FrameHandler, once: bool) {
        lock(&self.inner.listeners).push(Registration {
            event: event.to_string(),
            handler,
            once,
        });
    }
}

impl MultipartSocket for LocalSocket {
    fn kind(&self) -> SocketKind {
        self.inner.kind
    }

    /// Deliver `frames` to the peer synchronously.
    ///
    /// `flags` are ignored in-process: delivery never blocks and each call
    /// is one complete message, so `DONT_WAIT` and `SEND_MORE` have no effect.
    fn send(&self, mut frames: Vec<Bytes>, flags: SendFlags) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let peer = lock(&self.inner.peer)
            .upgrade()
            .map(|inner| LocalSocket { inner })
            .ok_or(TransportError::NoPeer)?;
        if peer.is_closed() {
            return Err(TransportError::Closed);
        }

        if self.inner.kind.is_routing() {
            if frames.is_empty() {
                return Err(TransportError::MissingIdentity);
            }
            let identity = frames.remove(0);
            if identity != peer.inner.identity {
                return Err(TransportError::UnknownIdentity(identity.len()));
            }
        }
        if peer.inner.kind.is_routing() {
            frames.insert(0, self.inner.identity.clone());
        }

        trace!(
            kind = %self.inner.kind,
            frames = frames.len(),
            flags = flags.bits(),
            "local send"
        );
        peer.emit(MESSAGE_EVENT, &frames);
        Ok(())
    }

    fn on(&self, event: &str, handler: FrameHandler) {
        self.register(event, handler, false);
    }

    fn once(&self, event: &str, handler: FrameHandler) {
        self.register(event, handler, true);
    }

    fn remove_listener(&self, event: &str, handler: &FrameHandler) {
        let mut listeners = lock(&self.inner.listeners);
        if let Some(pos) = listeners
            .iter()
            .position(|reg| reg.event == event && Arc::ptr_eq(&reg.handler, handler))
        {
            listeners.remove(pos);
        }
    }

    fn remove_all_listeners(&self, event: Option<&str>) {
        let mut listeners = lock(&self.inner.listeners);
        match event {
            Some(event) => listeners.retain(|reg| reg.event != event),
            None => listeners.clear(),
        }
    }
}

impl fmt::Debug for LocalSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSocket")
            .field("kind", &self.inner.kind)
            .field("identity", &String::from_utf8_lossy(&self.inner.identity))
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
