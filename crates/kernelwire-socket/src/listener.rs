use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kernelwire_message::Message;
use kernelwire_transport::FrameHandler;

/// Handler invoked with each successfully decoded message.
pub type MessageHandler = Arc<dyn Fn(Message) + Send + Sync>;

/// Token identifying one message listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

impl ListenerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Selects a message listener to remove.
#[derive(Clone)]
pub enum ListenerRef {
    /// The token returned at registration.
    Token(ListenerToken),
    /// The handler originally registered, matched by `Arc` identity.
    Handler(MessageHandler),
}

impl From<ListenerToken> for ListenerRef {
    fn from(token: ListenerToken) -> Self {
        ListenerRef::Token(token)
    }
}

impl From<MessageHandler> for ListenerRef {
    fn from(handler: MessageHandler) -> Self {
        ListenerRef::Handler(handler)
    }
}

impl From<&MessageHandler> for ListenerRef {
    fn from(handler: &MessageHandler) -> Self {
        ListenerRef::Handler(Arc::clone(handler))
    }
}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerRef::Token(token) => f.debug_tuple("Token").field(token).finish(),
            ListenerRef::Handler(handler) => f
                .debug_tuple("Handler")
                .field(&Arc::as_ptr(handler).cast::<()>())
                .finish(),
        }
    }
}

/// One tracked registration: the caller's handler and the frame-level
/// wrapper actually registered on the transport.
pub(crate) struct Entry {
    pub(crate) handler: MessageHandler,
    pub(crate) wrapper: FrameHandler,
    pub(crate) once: bool,
}

/// Token -> registration table shared between the adapter and its
/// one-shot wrappers.
#[derive(Default)]
pub(crate) struct ListenerTable {
    next: AtomicU64,
    entries: Mutex<BTreeMap<ListenerToken, Entry>>,
}

impl ListenerTable {
    pub(crate) fn next_token(&self) -> ListenerToken {
        ListenerToken(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn insert(&self, token: ListenerToken, entry: Entry) {
        self.entries().insert(token, entry);
    }

    pub(crate) fn remove(&self, token: ListenerToken) -> Option<Entry> {
        self.entries().remove(&token)
    }

    /// Remove the oldest registration of `handler`.
    pub(crate) fn remove_handler(&self, handler: &MessageHandler) -> Option<(ListenerToken, Entry)> {
        let mut entries = self.entries();
        let token = entries
            .iter()
            .find(|(_, entry)| Arc::ptr_eq(&entry.handler, handler))
            .map(|(token, _)| *token)?;
        entries.remove(&token).map(|entry| (token, entry))
    }

    pub(crate) fn clear(&self) -> usize {
        let mut entries = self.entries();
        let count = entries.len();
        entries.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    pub(crate) fn contains(&self, token: ListenerToken) -> bool {
        self.entries().contains_key(&token)
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<ListenerToken, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
