use std::ops::BitOr;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::kind::SocketKind;

/// Event name under which received frame sequences are delivered.
pub const MESSAGE_EVENT: &str = "message";

/// Handler invoked with the frames carried by a transport event.
///
/// Handlers are compared by `Arc` pointer identity when removed, so keep a
/// clone of the `Arc` you registered.
pub type FrameHandler = Arc<dyn Fn(&[Bytes]) + Send + Sync>;

/// Flags forwarded to the transport with each send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SendFlags(u32);

impl SendFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Fail instead of blocking when the message cannot be queued.
    pub const DONT_WAIT: Self = Self(1);
    /// More frames follow in a later send.
    pub const SEND_MORE: Self = Self(2);

    /// Raw flag bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Build flags from raw bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns true if every bit in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SendFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An endpoint that exchanges multipart messages.
///
/// Implementations own connection mechanics (bind, connect, polling).
/// Everything above this trait treats frames as opaque bytes.
pub trait MultipartSocket: Send + Sync {
    /// The kind this endpoint was constructed as.
    fn kind(&self) -> SocketKind;

    /// Send one multipart message.
    fn send(&self, frames: Vec<Bytes>, flags: SendFlags) -> Result<()>;

    /// Register a handler for every occurrence of `event`.
    fn on(&self, event: &str, handler: FrameHandler);

    /// Register a handler for the next occurrence of `event` only.
    fn once(&self, event: &str, handler: FrameHandler);

    /// Unregister one registration of `handler` for `event`.
    ///
    /// Removing a handler that is not registered is a no-op.
    fn remove_listener(&self, event: &str, handler: &FrameHandler);

    /// Unregister every handler for `event`, or for all events when `None`.
    fn remove_all_listeners(&self, event: Option<&str>);
}
