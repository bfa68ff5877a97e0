//! Message-aware socket adapter.
//!
//! [`MessageSocket`] wraps a [`kernelwire_transport::MultipartSocket`] and
//! applies the message codec on the way in and out: handlers registered
//! with [`MessageSocket::on_message`] receive decoded, verified messages,
//! and [`MessageSocket::send`] encodes messages before handing frames to
//! the transport.

pub mod error;
pub mod listener;
pub mod socket;

pub use error::{Result, SocketError};
pub use listener::{ListenerRef, ListenerToken, MessageHandler};
pub use socket::{MessageSocket, Outgoing};
